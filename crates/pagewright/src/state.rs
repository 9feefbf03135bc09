//! Field state checks.
//!
//! State checks degrade instead of failing: an element that is not in the document
//! reports as not visible.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::driver::{BrowserDriver, ElementHandle};
use crate::locator::Locator;
use crate::result::{PagewrightError, PagewrightResult};

/// Function evaluated against an element to test full containment in the viewport
pub const IN_VIEWPORT_FUNCTION: &str = "el => { \
    const rect = el.getBoundingClientRect(); \
    return rect.top >= 0 && rect.left >= 0 && \
        rect.bottom <= (window.innerHeight || document.documentElement.clientHeight) && \
        rect.right <= (window.innerWidth || document.documentElement.clientWidth); }";

/// Nested input Angular Material checkboxes keep their state on
pub const MAT_CHECKBOX_INPUT: &str = ".mat-checkbox-input";

/// Observed state of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldState {
    /// Rendered and visible
    pub visible: bool,
    /// Does not accept input
    pub readonly: bool,
    /// Checked (checkbox, radio)
    pub selected: bool,
}

impl FieldState {
    /// State reported for an element that is not in the document
    pub const NOT_VISIBLE: Self = Self {
        visible: false,
        readonly: false,
        selected: false,
    };
}

/// State names accepted by field state steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCheck {
    /// "visible"
    Visible,
    /// "not visible"
    NotVisible,
    /// "readonly"
    Readonly,
    /// "not readonly" or "editable"
    Editable,
    /// "selected"
    Selected,
    /// "not selected"
    NotSelected,
    /// "in viewport"
    InViewport,
}

impl StateCheck {
    const ACCEPTED: [&'static str; 8] = [
        "visible",
        "not visible",
        "readonly",
        "not readonly",
        "editable",
        "selected",
        "not selected",
        "in viewport",
    ];

    /// Whether `state` satisfies this check. `InViewport` needs a script and is
    /// answered by [`check_state`] instead.
    #[must_use]
    pub const fn holds_for(self, state: FieldState) -> bool {
        match self {
            Self::Visible => state.visible,
            Self::NotVisible => !state.visible,
            Self::Readonly => state.readonly,
            Self::Editable => !state.readonly,
            Self::Selected => state.selected,
            Self::NotSelected => !state.selected,
            Self::InViewport => false,
        }
    }
}

impl fmt::Display for StateCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Visible => "visible",
            Self::NotVisible => "not visible",
            Self::Readonly => "readonly",
            Self::Editable => "editable",
            Self::Selected => "selected",
            Self::NotSelected => "not selected",
            Self::InViewport => "in viewport",
        };
        f.write_str(name)
    }
}

impl FromStr for StateCheck {
    type Err = PagewrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "visible" => Ok(Self::Visible),
            "not visible" => Ok(Self::NotVisible),
            "readonly" => Ok(Self::Readonly),
            "not readonly" | "editable" => Ok(Self::Editable),
            "selected" => Ok(Self::Selected),
            "not selected" => Ok(Self::NotSelected),
            "in viewport" => Ok(Self::InViewport),
            _ => Err(PagewrightError::InvalidArgument {
                argument: "field state".to_string(),
                value: s.to_string(),
                accepted: Self::ACCEPTED.iter().map(|a| (*a).to_string()).collect(),
            }),
        }
    }
}

/// Read the state of the first element matching `locator`
pub async fn field_state<D>(driver: &D, locator: &Locator) -> PagewrightResult<FieldState>
where
    D: BrowserDriver + ?Sized,
{
    let element = match driver.find_element(locator).await {
        Ok(element) => element,
        Err(err) if err.is_element_not_found() => {
            debug!(%locator, "element absent, reporting not visible");
            return Ok(FieldState::NOT_VISIBLE);
        }
        Err(err) => return Err(err),
    };
    Ok(FieldState {
        visible: driver.is_visible(&element).await?,
        readonly: !driver.is_enabled(&element).await?,
        selected: driver.is_checked(&element).await?,
    })
}

/// Whether the element matching `locator` is in the named state
pub async fn check_state<D>(driver: &D, locator: &Locator, state: &str) -> PagewrightResult<bool>
where
    D: BrowserDriver + ?Sized,
{
    let check: StateCheck = state.parse()?;
    if check == StateCheck::InViewport {
        return in_viewport(driver, locator).await;
    }
    Ok(check.holds_for(field_state(driver, locator).await?))
}

/// Whether the element matching `locator` lies fully inside the viewport
pub async fn in_viewport<D>(driver: &D, locator: &Locator) -> PagewrightResult<bool>
where
    D: BrowserDriver + ?Sized,
{
    let element = driver.find_element(locator).await?;
    let result = driver.evaluate_on(&element, IN_VIEWPORT_FUNCTION).await?;
    Ok(result.as_bool().unwrap_or(false))
}

/// Checked state of a native or Angular Material checkbox
pub async fn checkbox_is_checked<D>(driver: &D, checkbox: &ElementHandle) -> PagewrightResult<bool>
where
    D: BrowserDriver + ?Sized,
{
    if driver.tag_name(checkbox).await?.contains("input") {
        return driver.is_checked(checkbox).await;
    }
    let inner = driver
        .find_within(checkbox, &Locator::css(MAT_CHECKBOX_INPUT))
        .await?;
    Ok(driver.attribute(&inner, "aria-checked").await?.as_deref() == Some("true"))
}

/// Wait until `locator` is visible
pub async fn wait_for_visibility<D>(
    driver: &D,
    locator: &Locator,
    timeout: Duration,
) -> PagewrightResult<ElementHandle>
where
    D: BrowserDriver + ?Sized,
{
    driver.wait_until_visible(locator, timeout).await.map_err(|err| {
        warn!(%locator, error = %err, "element never became visible");
        err
    })
}

/// Wait until `locator` is hidden or absent
pub async fn wait_for_invisibility<D>(
    driver: &D,
    locator: &Locator,
    timeout: Duration,
) -> PagewrightResult<()>
where
    D: BrowserDriver + ?Sized,
{
    driver.wait_until_hidden(locator, timeout).await
}
