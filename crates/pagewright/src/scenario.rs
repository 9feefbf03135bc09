//! Per-scenario world.
//!
//! A [`Scenario`] exclusively owns one browser session and one
//! [`SessionContext`]. Page objects, configuration, the clock and the fake-data
//! source are shared read-only between scenarios.
//!
//! ```
//! use std::sync::Arc;
//! use pagewright::{MockDriver, PageObjectRegistry, PagewrightConfig, Scenario};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut scenario = Scenario::new(MockDriver::new(), Arc::new(PageObjectRegistry::new()))
//!     .with_config(PagewrightConfig::for_tests());
//! scenario.teardown().await.unwrap();
//! assert!(scenario.driver().is_quit());
//! # }
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::PagewrightConfig;
use crate::driver::BrowserDriver;
use crate::fake_data::{FakeDataSource, FakerSource};
use crate::grid::GridNavigator;
use crate::interaction::FieldEngine;
use crate::page_object::{PageObjectDescriptor, PageObjectRegistry};
use crate::result::{PagewrightError, PagewrightResult};
use crate::session::SessionContext;
use crate::tokens::DataTransformer;
use crate::window::WindowSwitcher;

/// One scenario's browser session and state
#[derive(Debug)]
pub struct Scenario<D: BrowserDriver> {
    driver: D,
    registry: Arc<PageObjectRegistry>,
    context: SessionContext,
    config: Arc<PagewrightConfig>,
    clock: Arc<dyn Clock>,
    fakes: Arc<dyn FakeDataSource>,
    torn_down: bool,
}

impl<D: BrowserDriver> Scenario<D> {
    /// Start a scenario with default config, the system clock and a fresh fake-data source
    pub fn new(driver: D, registry: Arc<PageObjectRegistry>) -> Self {
        debug!(page_objects = registry.len(), "scenario started");
        Self {
            driver,
            registry,
            context: SessionContext::new(),
            config: Arc::new(PagewrightConfig::default()),
            clock: Arc::new(SystemClock),
            fakes: Arc::new(FakerSource::new()),
            torn_down: false,
        }
    }

    /// Use `config`
    #[must_use]
    pub fn with_config(mut self, config: impl Into<Arc<PagewrightConfig>>) -> Self {
        self.config = config.into();
        self
    }

    /// Use `clock` for "now" and for every wait
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `fakes` for `$FAKE_DATA$` tokens
    #[must_use]
    pub fn with_fake_data(mut self, fakes: Arc<dyn FakeDataSource>) -> Self {
        self.fakes = fakes;
        self
    }

    /// The browser session
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Registered page objects
    #[must_use]
    pub fn registry(&self) -> &PageObjectRegistry {
        &self.registry
    }

    /// Session state
    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Mutable session state
    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &PagewrightConfig {
        &self.config
    }

    /// Clock in use
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Field engine over this scenario's driver
    #[must_use]
    pub fn engine(&self) -> FieldEngine<'_, D> {
        FieldEngine::new(&self.driver, &self.config)
    }

    /// Grid navigator over this scenario's driver
    #[must_use]
    pub const fn grid(&self) -> GridNavigator<'_, D> {
        GridNavigator::new(&self.driver)
    }

    /// Window switcher over this scenario's driver
    #[must_use]
    pub fn windows(&self) -> WindowSwitcher<'_, D> {
        WindowSwitcher::new(&self.driver, self.clock.as_ref(), &self.config)
    }

    /// Token expander bound to this scenario's session
    pub fn transformer(&mut self) -> DataTransformer<'_> {
        DataTransformer::new(&mut self.context, self.fakes.as_ref(), self.clock.as_ref())
    }

    /// Page object most recently confirmed by a page state step
    pub fn current_page(&self) -> PagewrightResult<Arc<PageObjectDescriptor>> {
        self.context
            .current_page()
            .cloned()
            .ok_or(PagewrightError::NoCurrentPage)
    }

    /// Whether [`teardown`](Self::teardown) has run
    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Discard session state and end the browser session. Safe to call more than once.
    pub async fn teardown(&mut self) -> PagewrightResult<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        self.context.clear();
        info!("scenario teardown");
        self.driver.quit().await
    }
}

impl<D: BrowserDriver> Drop for Scenario<D> {
    fn drop(&mut self) {
        if !self.torn_down {
            warn!("scenario dropped without teardown; the browser session may be left open");
        }
    }
}
