//! BrowserDriver - abstract browser capability.
//!
//! The interaction, grid and window layers are written once against this
//! trait. Backends:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  BrowserDriver (async trait)                                     │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌────────────────┐  │
//! │  │  CdpDriver       │  │  WebDriverAdapter│  │  MockDriver    │  │
//! │  │  (browser)       │  │  (webdriver)     │  │  (always)      │  │
//! │  │  chromiumoxide   │  │  thirtyfour      │  │  in-memory DOM │  │
//! │  └──────────────────┘  └──────────────────┘  └────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Methods take `&self`; backends keep their session state behind their own
//! locks. A locator that matches nothing is reported as
//! [`PagewrightError::ElementNotFound`](crate::PagewrightError::ElementNotFound).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Viewport;
use crate::locator::Locator;
use crate::result::PagewrightResult;

/// Element handle for DOM interactions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Backend-specific identifier
    pub id: String,
    /// Lowercase tag name
    pub tag_name: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into().to_lowercase(),
        }
    }

    /// Whether this is an `<input>` element
    #[must_use]
    pub fn is_input(&self) -> bool {
        self.tag_name == "input"
    }
}

/// Open browser window or tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowHandle {
    /// Backend-specific identifier
    pub id: String,
    /// Document title when enumerated
    pub title: String,
    /// URL when enumerated
    pub url: String,
}

impl WindowHandle {
    /// Create a new window handle
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Abstract driver trait for browser automation
///
/// # Implementations
///
/// - `CdpDriver` - Chromium over CDP (feature `browser`)
/// - `WebDriverAdapter` - any W3C endpoint (feature `webdriver`)
/// - [`MockDriver`](crate::MockDriver) - in-memory DOM for tests
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate the current window
    async fn navigate(&self, url: &str) -> PagewrightResult<()>;

    /// First element matching `locator`
    async fn find_element(&self, locator: &Locator) -> PagewrightResult<ElementHandle>;

    /// All elements matching `locator`, possibly none
    async fn find_elements(&self, locator: &Locator) -> PagewrightResult<Vec<ElementHandle>>;

    /// First match of `locator` inside `parent`
    async fn find_within(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> PagewrightResult<ElementHandle>;

    /// All matches of `locator` inside `parent`
    async fn find_all_within(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> PagewrightResult<Vec<ElementHandle>>;

    /// Replace the element's value
    async fn fill(&self, element: &ElementHandle, text: &str) -> PagewrightResult<()>;

    /// Click the element
    async fn click(&self, element: &ElementHandle) -> PagewrightResult<()>;

    /// Attribute value, `None` when absent. `value` reads the live property.
    async fn attribute(&self, element: &ElementHandle, name: &str)
        -> PagewrightResult<Option<String>>;

    /// Lowercase tag name
    async fn tag_name(&self, element: &ElementHandle) -> PagewrightResult<String> {
        Ok(element.tag_name.clone())
    }

    /// Rendered inner text
    async fn text(&self, element: &ElementHandle) -> PagewrightResult<String>;

    /// Whether the element is rendered and visible
    async fn is_visible(&self, element: &ElementHandle) -> PagewrightResult<bool>;

    /// Whether the element accepts input
    async fn is_enabled(&self, element: &ElementHandle) -> PagewrightResult<bool>;

    /// Checked state of a checkbox or radio input
    async fn is_checked(&self, element: &ElementHandle) -> PagewrightResult<bool>;

    /// Select a `<select>` option by visible text
    async fn select_option(&self, element: &ElementHandle, text: &str) -> PagewrightResult<()>;

    /// Visible text of the selected `<select>` option
    async fn selected_option_text(&self, element: &ElementHandle)
        -> PagewrightResult<Option<String>>;

    /// Press a named key ("Escape", "Enter", "Tab", ...) with focus on the element
    async fn press_key(&self, element: &ElementHandle, key: &str) -> PagewrightResult<()>;

    /// Run a function `el => ...` against the element and return its JSON result
    async fn evaluate_on(
        &self,
        element: &ElementHandle,
        function: &str,
    ) -> PagewrightResult<serde_json::Value>;

    /// Run a script in the page and return its JSON result
    async fn evaluate(
        &self,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> PagewrightResult<serde_json::Value>;

    /// Wait until `locator` matches a visible element
    async fn wait_until_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> PagewrightResult<ElementHandle>;

    /// Wait until `locator` matches nothing visible
    async fn wait_until_hidden(&self, locator: &Locator, timeout: Duration)
        -> PagewrightResult<()>;

    /// Enumerate open windows and tabs
    async fn windows(&self) -> PagewrightResult<Vec<WindowHandle>>;

    /// Window that currently has focus
    async fn current_window(&self) -> PagewrightResult<WindowHandle>;

    /// Focus a window
    async fn switch_to_window(&self, window: &WindowHandle) -> PagewrightResult<()>;

    /// Close a window
    async fn close_window(&self, window: &WindowHandle) -> PagewrightResult<()>;

    /// Title of the focused window
    async fn title(&self) -> PagewrightResult<String>;

    /// URL of the focused window
    async fn current_url(&self) -> PagewrightResult<String>;

    /// Reload the focused window
    async fn reload(&self) -> PagewrightResult<()>;

    /// Go back in history
    async fn go_back(&self) -> PagewrightResult<()>;

    /// Resize the viewport
    async fn set_viewport(&self, viewport: Viewport) -> PagewrightResult<()>;

    /// End the browser session
    async fn quit(&self) -> PagewrightResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_element_handle_lowercases_tag() {
        let handle = ElementHandle::new("e1", "INPUT");
        assert_eq!(handle.tag_name, "input");
        assert!(handle.is_input());
        assert!(!ElementHandle::new("e2", "mat-checkbox").is_input());
    }

    #[test]
    fn test_window_handle_serializes() {
        let window = WindowHandle::new("w1", "Reports", "https://app.test/reports");
        let json = serde_json::to_string(&window).unwrap();
        let back: WindowHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, window);
    }
}
