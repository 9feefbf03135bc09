//! Suite configuration.
//!
//! Loaded from YAML. Every field has a default, so an empty document (or no
//! file at all) yields a usable configuration.
//!
//! ```yaml
//! browser: firefox
//! headless: false
//! viewport: { width: 1280, height: 720 }
//! home_page: https://app.test/
//! window_search:
//!   attempts: 10
//!   interval_ms: 500
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::page_object::DEFAULT_NAMESPACE;
use crate::result::{PagewrightError, PagewrightResult};

/// Environment variable naming a YAML config file
pub const CONFIG_ENV_VAR: &str = "PAGEWRIGHT_CONFIG";

/// Supported browsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Google Chrome
    #[default]
    Chrome,
    /// Chromium
    Chromium,
    /// Mozilla Firefox
    Firefox,
    /// Microsoft Edge
    Edge,
}

impl BrowserKind {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Edge => "edge",
        }
    }

    /// Whether the browser speaks CDP
    #[must_use]
    pub const fn is_chromium_based(self) -> bool {
        !matches!(self, Self::Firefox)
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = PagewrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chrome" => Ok(Self::Chrome),
            "chromium" => Ok(Self::Chromium),
            "firefox" => Ok(Self::Firefox),
            "edge" | "msedge" => Ok(Self::Edge),
            other => Err(PagewrightError::InvalidArgument {
                argument: "browser".to_string(),
                value: other.to_string(),
                accepted: ["chrome", "chromium", "firefox", "edge"]
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect(),
            }),
        }
    }
}

/// Browser viewport size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Retry budget for window switching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSearch {
    /// Attempts before giving up
    pub attempts: u32,
    /// Delay before each attempt
    pub interval_ms: u64,
}

impl Default for WindowSearch {
    fn default() -> Self {
        Self {
            attempts: 20,
            interval_ms: 2000,
        }
    }
}

impl WindowSearch {
    /// Delay as a duration
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Configuration shared by every scenario in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagewrightConfig {
    /// Browser to launch
    pub browser: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Viewport applied to every new page
    pub viewport: Viewport,
    /// Namespace page-object paths start from
    pub page_namespace: String,
    /// How long element waits may take
    pub element_timeout_ms: u64,
    /// Window switching retry budget
    pub window_search: WindowSearch,
    /// Delay before counting windows, so new tabs can open
    pub window_settle_ms: u64,
    /// URL opened by "navigate to the application" steps
    pub home_page: Option<String>,
    /// Explicit Chrome/Chromium binary
    pub chrome_executable: Option<PathBuf>,
    /// W3C WebDriver endpoint
    pub webdriver_url: String,
}

impl Default for PagewrightConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::default(),
            headless: true,
            viewport: Viewport::default(),
            page_namespace: DEFAULT_NAMESPACE.to_string(),
            element_timeout_ms: 30_000,
            window_search: WindowSearch::default(),
            window_settle_ms: 2000,
            home_page: None,
            chrome_executable: None,
            webdriver_url: "http://localhost:4444".to_string(),
        }
    }
}

impl PagewrightConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> PagewrightResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> PagewrightResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&yaml)?;
        info!(path = %path.display(), browser = %config.browser, "loaded configuration");
        Ok(config)
    }

    /// Load the file named by `PAGEWRIGHT_CONFIG`, or the defaults when unset
    pub fn from_env() -> PagewrightResult<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    /// Element wait timeout
    #[must_use]
    pub const fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    /// Delay before counting windows
    #[must_use]
    pub const fn window_settle(&self) -> Duration {
        Duration::from_millis(self.window_settle_ms)
    }

    /// Config with zero delays, for mocked drivers
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            element_timeout_ms: 1000,
            window_search: WindowSearch {
                attempts: 20,
                interval_ms: 0,
            },
            window_settle_ms: 0,
            ..Self::default()
        }
    }

    fn validate(&self) -> PagewrightResult<()> {
        if self.window_search.attempts == 0 {
            return Err(PagewrightError::Config {
                message: "window_search.attempts must be at least 1".to_string(),
            });
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(PagewrightError::Config {
                message: format!(
                    "viewport must be non-empty, got {}x{}",
                    self.viewport.width, self.viewport.height
                ),
            });
        }
        Ok(())
    }
}
