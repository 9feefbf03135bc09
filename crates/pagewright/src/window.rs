//! Window and tab switching.
//!
//! New windows open asynchronously, so switching polls: every attempt waits
//! the configured interval, enumerates the windows again and focuses the first
//! match.

use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::PagewrightConfig;
use crate::driver::{BrowserDriver, WindowHandle};
use crate::result::{PagewrightError, PagewrightResult};

/// How a window is identified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMatch {
    /// By document title
    Title,
    /// By URL substring
    Url,
}

impl WindowMatch {
    /// Whether `window` is a search hit for `value`. Both kinds match substrings.
    #[must_use]
    pub fn finds(self, window: &WindowHandle, value: &str) -> bool {
        match self {
            Self::Title => window.title.contains(value),
            Self::Url => window.url.contains(value),
        }
    }

    /// Whether the focused window is the one to close. Titles must be equal.
    #[must_use]
    pub fn is_focused(self, title: &str, url: &str, value: &str) -> bool {
        match self {
            Self::Title => title == value,
            Self::Url => url.contains(value),
        }
    }
}

impl fmt::Display for WindowMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("TITLE_MATCH"),
            Self::Url => f.write_str("URL_SUBSTRING"),
        }
    }
}

impl FromStr for WindowMatch {
    type Err = PagewrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" | "title_match" => Ok(Self::Title),
            "url" | "url_substring" => Ok(Self::Url),
            other => Err(PagewrightError::InvalidArgument {
                argument: "window match".to_string(),
                value: other.to_string(),
                accepted: vec!["title".to_string(), "url".to_string()],
            }),
        }
    }
}

/// Window operations with bounded retry
#[derive(Debug)]
pub struct WindowSwitcher<'a, D: ?Sized> {
    driver: &'a D,
    clock: &'a dyn Clock,
    config: &'a PagewrightConfig,
}

impl<'a, D> WindowSwitcher<'a, D>
where
    D: BrowserDriver + ?Sized,
{
    /// Create a switcher
    #[must_use]
    pub fn new(driver: &'a D, clock: &'a dyn Clock, config: &'a PagewrightConfig) -> Self {
        Self {
            driver,
            clock,
            config,
        }
    }

    /// Focus the first window matching `value`
    pub async fn switch_to_window(
        &self,
        by: WindowMatch,
        value: &str,
    ) -> PagewrightResult<WindowHandle> {
        let search = self.config.window_search;
        for attempt in 1..=search.attempts {
            self.clock.sleep(search.interval()).await;
            let windows = self.driver.windows().await?;
            if let Some(window) = windows.iter().find(|w| by.finds(w, value)) {
                self.driver.switch_to_window(window).await?;
                info!(title = %window.title, url = %window.url, attempt, "switched window");
                return Ok(window.clone());
            }
            warn!(attempt, match_type = %by, value, "window not found yet");
        }
        Err(PagewrightError::WindowNotFound {
            match_type: by.to_string(),
            value: value.to_string(),
        })
    }

    /// Close the window matching `value`, focusing it first when needed
    pub async fn close_window(&self, by: WindowMatch, value: &str) -> PagewrightResult<()> {
        let title = self.driver.title().await?;
        let url = self.driver.current_url().await?;
        if !by.is_focused(&title, &url, value) {
            let _ = self.switch_to_window(by, value).await?;
        }
        let target = self.driver.current_window().await?;
        info!(title = %target.title, url = %target.url, "closing window");
        self.driver.close_window(&target).await
    }

    /// Number of open windows, after the settle delay
    pub async fn window_count(&self) -> PagewrightResult<usize> {
        self.clock.sleep(self.config.window_settle()).await;
        Ok(self.driver.windows().await?.len())
    }
}
