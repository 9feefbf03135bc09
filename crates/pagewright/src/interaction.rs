//! Field Interaction Engine.
//!
//! Reads and writes typed fields through a [`BrowserDriver`]. Every write waits
//! for the element to be visible first, bounded by the configured element
//! timeout.

use std::fmt;
use std::str::FromStr;

use chrono::{Offset, Utc};
use tracing::{debug, info};

use crate::config::PagewrightConfig;
use crate::driver::{BrowserDriver, ElementHandle};
use crate::field::FieldType;
use crate::locator::Locator;
use crate::result::{PagewrightError, PagewrightResult};
use crate::state;
use crate::temporal::detect_date_format;

/// Listbox an Angular Material select opens
pub const ANGULAR_LISTBOX: &str = "div[role='listbox']";

/// Option labels inside an open Angular Material listbox
pub const ANGULAR_OPTION: &str = "mat-option[role='option'] span";

/// Page scroll targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Towards the bottom of the page
    Down,
    /// Back up to the middle of the page
    Up,
}

impl ScrollDirection {
    /// Script that performs the scroll
    #[must_use]
    pub const fn script(self) -> &'static str {
        match self {
            Self::Down => "window.scrollTo(0, 360)",
            Self::Up => "window.scrollTo(0, 180)",
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => f.write_str("down"),
            Self::Up => f.write_str("up"),
        }
    }
}

impl FromStr for ScrollDirection {
    type Err = PagewrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "down" | "bottom" => Ok(Self::Down),
            "up" | "middle" => Ok(Self::Up),
            other => Err(PagewrightError::InvalidArgument {
                argument: "scroll direction".to_string(),
                value: other.to_string(),
                accepted: vec!["down".to_string(), "up".to_string()],
            }),
        }
    }
}

/// Desired checkbox state, parsed from "checked"/"unchecked"
fn desired_checkbox_state(value: &str) -> PagewrightResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "checked" => Ok(true),
        "unchecked" => Ok(false),
        _ => Err(PagewrightError::InvalidArgument {
            argument: "checkbox state".to_string(),
            value: value.to_string(),
            accepted: vec!["checked".to_string(), "unchecked".to_string()],
        }),
    }
}

/// Separator a date editor is expected to keep, derived from the first format
/// that parses `value`
fn date_separator(value: &str) -> &'static str {
    let Some((format, date)) = detect_date_format(value) else {
        return "";
    };
    let rendered = format.format_date(date, Utc.fix());
    if rendered.contains('/') {
        "/"
    } else if rendered.contains('-') {
        "-"
    } else {
        ""
    }
}

/// Typed field reads and writes over a borrowed driver
#[derive(Debug)]
pub struct FieldEngine<'a, D: ?Sized> {
    driver: &'a D,
    config: &'a PagewrightConfig,
}

impl<'a, D> FieldEngine<'a, D>
where
    D: BrowserDriver + ?Sized,
{
    /// Create an engine
    #[must_use]
    pub const fn new(driver: &'a D, config: &'a PagewrightConfig) -> Self {
        Self { driver, config }
    }

    /// Wait until `locator` is visible and return it
    pub async fn wait_ready(&self, locator: &Locator) -> PagewrightResult<ElementHandle> {
        state::wait_for_visibility(self.driver, locator, self.config.element_timeout()).await
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read a field as text, according to its type
    pub async fn read(&self, locator: &Locator, field_type: FieldType) -> PagewrightResult<String> {
        let element = self.driver.find_element(locator).await?;
        self.read_element(&element, field_type).await
    }

    /// Read an already located field
    pub async fn read_element(
        &self,
        element: &ElementHandle,
        field_type: FieldType,
    ) -> PagewrightResult<String> {
        let value = match field_type {
            FieldType::TextField | FieldType::TextArea | FieldType::DateField => self
                .driver
                .attribute(element, "value")
                .await?
                .unwrap_or_default(),
            FieldType::Label | FieldType::DateLabel => self.value_or_text(element).await?,
            FieldType::Dropdown => match self.driver.selected_option_text(element).await? {
                Some(text) => text,
                None => self
                    .driver
                    .attribute(element, "value")
                    .await?
                    .unwrap_or_default(),
            },
            FieldType::Radio => {
                if self.driver.is_checked(element).await? {
                    "Selected".to_string()
                } else {
                    "Unselected".to_string()
                }
            }
            FieldType::Checkbox => {
                if state::checkbox_is_checked(self.driver, element).await? {
                    "Checked".to_string()
                } else {
                    "Unchecked".to_string()
                }
            }
        };
        Ok(value)
    }

    async fn value_or_text(&self, element: &ElementHandle) -> PagewrightResult<String> {
        match self.driver.attribute(element, "value").await? {
            Some(value) => Ok(value),
            None => self.driver.text(element).await,
        }
    }

    /// Value attribute of the element, or its text when it has none
    pub async fn read_value(&self, locator: &Locator) -> PagewrightResult<String> {
        let element = self.driver.find_element(locator).await?;
        self.value_or_text(&element).await
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Write a field according to its type
    pub async fn write(
        &self,
        locator: &Locator,
        field_type: FieldType,
        value: &str,
    ) -> PagewrightResult<()> {
        match field_type {
            FieldType::TextField | FieldType::TextArea => self.fill_text(locator, value).await,
            FieldType::DateField => self.write_date(locator, value).await,
            FieldType::Dropdown => self.select_dropdown(locator, value).await,
            FieldType::Checkbox => self.set_checkbox(locator, value).await,
            FieldType::Radio => self.select_radio(locator, value).await,
            FieldType::Label | FieldType::DateLabel => Err(PagewrightError::UnsupportedFieldType {
                field_type: field_type.to_string(),
            }),
        }
    }

    /// Replace the text of a field
    pub async fn fill_text(&self, locator: &Locator, value: &str) -> PagewrightResult<()> {
        let element = self.wait_ready(locator).await?;
        debug!(%locator, value, "fill");
        self.driver.fill(&element, value).await
    }

    /// Type a date into a date editor.
    ///
    /// The raw value is typed and the editor is closed with Escape. Editors
    /// that reject typed input leave a value without the expected separator;
    /// for those the field is cleared and filled as plain text.
    pub async fn write_date(&self, locator: &Locator, value: &str) -> PagewrightResult<()> {
        let element = self.wait_ready(locator).await?;
        self.driver.fill(&element, "").await?;

        let separator = date_separator(value);
        debug!(%locator, value, separator, "fill date");
        self.driver.fill(&element, value).await?;
        self.driver.press_key(&element, "Escape").await?;

        let entered = self.value_or_text(&element).await?;
        if !entered.contains(separator) {
            debug!(%locator, %entered, "date editor dropped the value, filling as text");
            self.driver.fill(&element, "").await?;
            self.fill_text(locator, value).await?;
        }
        Ok(())
    }

    /// Select a native `<select>` option by visible text
    pub async fn select_dropdown(&self, locator: &Locator, value: &str) -> PagewrightResult<()> {
        let element = self.wait_ready(locator).await?;
        debug!(%locator, value, "select option");
        self.driver.select_option(&element, value).await
    }

    /// Set a checkbox to "checked" or "unchecked". Clicks only when the state differs.
    pub async fn set_checkbox(&self, locator: &Locator, value: &str) -> PagewrightResult<()> {
        let desired = desired_checkbox_state(value)?;
        let element = self.wait_ready(locator).await?;
        self.set_checkbox_element(&element, desired).await
    }

    /// Set an already located checkbox
    pub async fn set_checkbox_element(
        &self,
        element: &ElementHandle,
        desired: bool,
    ) -> PagewrightResult<()> {
        let current = state::checkbox_is_checked(self.driver, element).await?;
        if current == desired {
            debug!(element = %element.id, checked = desired, "checkbox already in requested state");
            return Ok(());
        }
        self.driver.click(element).await
    }

    /// Parse a checkbox value without acting on it
    pub fn checkbox_value(value: &str) -> PagewrightResult<bool> {
        desired_checkbox_state(value)
    }

    /// Select a radio button
    pub async fn select_radio(&self, locator: &Locator, value: &str) -> PagewrightResult<()> {
        if !value.trim().eq_ignore_ascii_case("selected") {
            return Err(PagewrightError::InvalidArgument {
                argument: "radio state".to_string(),
                value: value.to_string(),
                accepted: vec!["selected".to_string()],
            });
        }
        let element = self.wait_ready(locator).await?;
        if self.driver.is_checked(&element).await? {
            debug!(%locator, "radio already selected");
            return Ok(());
        }
        self.driver.click(&element).await
    }

    /// Open an Angular Material select and pick an option by text
    pub async fn select_angular_option(&self, locator: &Locator, value: &str) -> PagewrightResult<()> {
        let dropdown = self.wait_ready(locator).await?;
        self.driver.click(&dropdown).await?;
        let _ = self
            .driver
            .wait_until_visible(&Locator::css(ANGULAR_LISTBOX), self.config.element_timeout())
            .await?;
        let wanted = value.trim();
        let options = self.driver.find_elements(&Locator::css(ANGULAR_OPTION)).await?;
        for option in options {
            let text = self.driver.text(&option).await?;
            if text.trim().eq_ignore_ascii_case(wanted) {
                debug!(%locator, value, "angular option");
                return self.driver.click(&option).await;
            }
        }
        Err(PagewrightError::OptionNotFound {
            value: value.to_string(),
            locator: locator.to_string(),
        })
    }

    // ========================================================================
    // Other actions
    // ========================================================================

    /// Click an element
    pub async fn click(&self, locator: &Locator) -> PagewrightResult<()> {
        let element = self.wait_ready(locator).await?;
        debug!(%locator, "click");
        self.driver.click(&element).await
    }

    /// Press a named key on an element
    pub async fn send_key(&self, locator: &Locator, key: &str) -> PagewrightResult<()> {
        let element = self.wait_ready(locator).await?;
        debug!(%locator, key, "press key");
        self.driver.press_key(&element, key).await
    }

    /// Attribute of the first match
    pub async fn attribute(&self, locator: &Locator, name: &str) -> PagewrightResult<Option<String>> {
        let element = self.driver.find_element(locator).await?;
        self.driver.attribute(&element, name).await
    }

    /// Number of elements matching `locator`
    pub async fn element_count(&self, locator: &Locator) -> PagewrightResult<usize> {
        Ok(self.driver.find_elements(locator).await?.len())
    }

    /// Scroll the page
    pub async fn scroll(&self, direction: ScrollDirection) -> PagewrightResult<()> {
        info!(%direction, "scroll");
        let _ = self.driver.evaluate(direction.script(), Vec::new()).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{ClickEffect, MockDriver, MockElement};

    fn config() -> PagewrightConfig {
        PagewrightConfig::for_tests()
    }

    mod read_tests {
        use super::*;

        #[tokio::test]
        async fn test_read_by_type() {
            let driver = MockDriver::new();
            let _ = driver.add(MockElement::input("#name").with_value("Ada"));
            let _ = driver.add(MockElement::label("#greeting", "Hello"));
            let _ = driver.add(MockElement::select("#state", &["Ohio", "Texas"]).with_selected("Texas"));
            let _ = driver.add(MockElement::radio("#yes").checked());
            let _ = driver.add(MockElement::checkbox("#terms"));
            let config = config();
            let engine = FieldEngine::new(&driver, &config);

            assert_eq!(engine.read(&"#name".into(), FieldType::TextField).await.unwrap(), "Ada");
            assert_eq!(engine.read(&"#greeting".into(), FieldType::Label).await.unwrap(), "Hello");
            assert_eq!(engine.read(&"#state".into(), FieldType::Dropdown).await.unwrap(), "Texas");
            assert_eq!(engine.read(&"#yes".into(), FieldType::Radio).await.unwrap(), "Selected");
            assert_eq!(
                engine.read(&"#terms".into(), FieldType::Checkbox).await.unwrap(),
                "Unchecked"
            );
        }

        #[tokio::test]
        async fn test_label_prefers_value_attribute() {
            let driver = MockDriver::new();
            let _ = driver.add(MockElement::label("#total", "ignored").with_value("42.00"));
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            assert_eq!(engine.read(&"#total".into(), FieldType::DateLabel).await.unwrap(), "42.00");
        }

        #[tokio::test]
        async fn test_read_missing_element() {
            let driver = MockDriver::new();
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            let err = engine.read(&"#nope".into(), FieldType::TextField).await.unwrap_err();
            assert!(err.is_element_not_found());
        }
    }

    mod write_tests {
        use super::*;

        #[tokio::test]
        async fn test_text_fill_replaces() {
            let driver = MockDriver::new();
            let _ = driver.add(MockElement::input("#email").with_value("old"));
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            engine.write(&"#email".into(), FieldType::TextField, "new@x.test").await.unwrap();
            assert_eq!(driver.value_of("#email").as_deref(), Some("new@x.test"));
        }

        #[tokio::test]
        async fn test_labels_are_not_writable() {
            let driver = MockDriver::new();
            let _ = driver.add(MockElement::label("#l", "x"));
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            let err = engine.write(&"#l".into(), FieldType::Label, "y").await.unwrap_err();
            assert!(matches!(err, PagewrightError::UnsupportedFieldType { .. }));
        }

        #[tokio::test]
        async fn test_hidden_field_times_out() {
            let driver = MockDriver::new();
            let _ = driver.add(MockElement::input("#later").hidden());
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            let err = engine.write(&"#later".into(), FieldType::TextField, "x").await.unwrap_err();
            assert!(matches!(err, PagewrightError::Timeout { .. }));
        }

        #[tokio::test]
        async fn test_dropdown_select() {
            let driver = MockDriver::new();
            let _ = driver.add(MockElement::select("#state", &["Ohio", "Texas"]));
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            engine.write(&"#state".into(), FieldType::Dropdown, "Ohio").await.unwrap();
            assert_eq!(engine.read(&"#state".into(), FieldType::Dropdown).await.unwrap(), "Ohio");
        }
    }

    mod date_tests {
        use super::*;

        #[test]
        fn test_separator_detection() {
            assert_eq!(date_separator("03/14/2024"), "/");
            assert_eq!(date_separator("03-14-24"), "-");
            assert_eq!(date_separator("March 14, 2024"), "");
            assert_eq!(date_separator("not a date"), "");
        }

        #[tokio::test]
        async fn test_date_typed_once_then_escape() {
            let driver = MockDriver::new();
            let _ = driver.add(MockElement::input("#dob"));
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            engine.write(&"#dob".into(), FieldType::DateField, "03/14/2024").await.unwrap();
            assert_eq!(driver.value_of("#dob").as_deref(), Some("03/14/2024"));
            assert_eq!(
                driver.history(),
                vec![
                    "fill:#dob:".to_string(),
                    "fill:#dob:03/14/2024".to_string(),
                    "press:#dob:Escape".to_string(),
                ]
            );
        }

        #[tokio::test]
        async fn test_date_falls_back_when_editor_clears() {
            let driver = MockDriver::new();
            let _ = driver.add(MockElement::input("#start").clearing_on_escape());
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            engine.write(&"#start".into(), FieldType::DateField, "03/14/2024").await.unwrap();
            assert_eq!(driver.value_of("#start").as_deref(), Some("03/14/2024"));
            assert_eq!(driver.call_count("fill:#start:03/14/2024"), 2);
        }

        #[tokio::test]
        async fn test_unparsed_date_never_falls_back() {
            let driver = MockDriver::new();
            let _ = driver.add(MockElement::input("#free").clearing_on_escape());
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            engine.write(&"#free".into(), FieldType::DateField, "next week").await.unwrap();
            assert_eq!(driver.value_of("#free").as_deref(), Some(""));
            assert_eq!(driver.call_count("fill:#free:next week"), 1);
        }
    }

    mod checkbox_tests {
        use super::*;

        #[tokio::test]
        async fn test_set_checkbox_is_idempotent() {
            let driver = MockDriver::new();
            let id = driver.add(MockElement::checkbox("#agree"));
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            engine.set_checkbox(&"#agree".into(), "Checked").await.unwrap();
            engine.set_checkbox(&"#agree".into(), "CHECKED").await.unwrap();
            assert!(driver.element(&id).unwrap().checked);
            assert_eq!(driver.call_count("click:#agree"), 1);
            engine.set_checkbox(&"#agree".into(), "unchecked").await.unwrap();
            assert!(!driver.element(&id).unwrap().checked);
        }

        #[tokio::test]
        async fn test_invalid_checkbox_value_never_clicks() {
            let driver = MockDriver::new();
            let _ = driver.add(MockElement::checkbox("#agree"));
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            let err = engine.set_checkbox(&"#agree".into(), "maybe").await.unwrap_err();
            assert!(matches!(err, PagewrightError::InvalidArgument { .. }));
            assert!(!driver.was_called("click"));
        }

        #[tokio::test]
        async fn test_angular_checkbox_toggles_aria() {
            let driver = MockDriver::new();
            let host = driver.add(MockElement::new("mat-checkbox", "#remember"));
            let inner = driver.add_child(
                &host,
                MockElement::new("input", state::MAT_CHECKBOX_INPUT)
                    .with_attribute("aria-checked", "false"),
            );
            driver.set_click(&host, ClickEffect::ToggleAria { target: inner.clone() });
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            engine.set_checkbox(&"#remember".into(), "checked").await.unwrap();
            engine.set_checkbox(&"#remember".into(), "checked").await.unwrap();
            assert_eq!(
                driver.element(&inner).unwrap().attributes.get("aria-checked").map(String::as_str),
                Some("true")
            );
            assert_eq!(driver.call_count("click:#remember"), 1);
        }
    }

    mod radio_tests {
        use super::*;

        #[tokio::test]
        async fn test_select_radio() {
            let driver = MockDriver::new();
            let id = driver.add(MockElement::radio("#plan-basic"));
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            engine.write(&"#plan-basic".into(), FieldType::Radio, "Selected").await.unwrap();
            assert!(driver.element(&id).unwrap().checked);
            let err = engine
                .write(&"#plan-basic".into(), FieldType::Radio, "unselected")
                .await
                .unwrap_err();
            assert!(matches!(err, PagewrightError::InvalidArgument { .. }));
        }
    }

    mod angular_tests {
        use super::*;

        fn angular_driver() -> (MockDriver, String) {
            let driver = MockDriver::new();
            let listbox = driver.add(MockElement::new("div", ANGULAR_LISTBOX).hidden());
            let dropdown = driver.add(
                MockElement::new("mat-select", "#country")
                    .with_click(ClickEffect::Reveal { target: listbox }),
            );
            for name in ["Canada", "Mexico"] {
                let _ = driver.add(
                    MockElement::new("span", ANGULAR_OPTION)
                        .with_text(&format!(" {name} "))
                        .with_click(ClickEffect::Choose {
                            target: dropdown.clone(),
                        }),
                );
            }
            (driver, dropdown)
        }

        #[tokio::test]
        async fn test_angular_option_case_insensitive() {
            let (driver, dropdown) = angular_driver();
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            engine.select_angular_option(&"#country".into(), "mexico").await.unwrap();
            assert_eq!(driver.element(&dropdown).unwrap().text, " Mexico ");
        }

        #[tokio::test]
        async fn test_angular_option_missing() {
            let (driver, _) = angular_driver();
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            let err = engine.select_angular_option(&"#country".into(), "Peru").await.unwrap_err();
            assert!(matches!(err, PagewrightError::OptionNotFound { .. }));
        }
    }

    mod action_tests {
        use super::*;

        #[tokio::test]
        async fn test_scroll_scripts() {
            let driver = MockDriver::new();
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            engine.scroll("bottom".parse().unwrap()).await.unwrap();
            engine.scroll(ScrollDirection::Up).await.unwrap();
            assert_eq!(
                driver.history(),
                vec![
                    "evaluate:window.scrollTo(0, 360)".to_string(),
                    "evaluate:window.scrollTo(0, 180)".to_string(),
                ]
            );
        }

        #[tokio::test]
        async fn test_count_attribute_and_key() {
            let driver = MockDriver::new();
            let _ = driver.add(MockElement::new("li", "li.item"));
            let _ = driver.add(MockElement::new("li", "li.item"));
            let _ = driver.add(MockElement::input("#q").with_attribute("placeholder", "Search"));
            let config = config();
            let engine = FieldEngine::new(&driver, &config);
            assert_eq!(engine.element_count(&"li.item".into()).await.unwrap(), 2);
            assert_eq!(
                engine.attribute(&"#q".into(), "placeholder").await.unwrap().as_deref(),
                Some("Search")
            );
            engine.send_key(&"#q".into(), "Enter").await.unwrap();
            assert!(driver.was_called("press:#q:Enter"));
        }
    }
}
