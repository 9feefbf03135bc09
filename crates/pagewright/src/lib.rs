//! Pagewright: page-object driven browser steps for BDD suites
//!
//! Step text names pages, fields and values in plain language. Pagewright turns
//! those names into locators on registered page objects, reads and writes
//! typed fields through a browser driver, navigates data grids and expands
//! date expressions and `$TOKEN$` placeholders in step arguments.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PAGEWRIGHT Architecture                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Step text  │    │ Scenario   │    │ Browser    │            │
//! │   │ (cucumber) │───►│ steps +    │───►│ Driver     │            │
//! │   │            │    │ registry   │    │ (CDP / W3C)│            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │                          │                                      │
//! │          ┌───────────────┼────────────────┐                     │
//! │          ▼               ▼                ▼                     │
//! │   ┌────────────┐  ┌────────────┐  ┌──────────────┐              │
//! │   │ Field      │  │ Grid       │  │ Tokens and   │              │
//! │   │ Engine     │  │ Navigator  │  │ Date Exprs   │              │
//! │   └────────────┘  └────────────┘  └──────────────┘              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Naming conventions from step text to field and page object names
pub mod naming;

/// CSS, XPath, test-id and role locators
pub mod locator;

/// Page object descriptors and the registry that resolves them
pub mod page_object;

/// Field type tags
pub mod field;

/// Browser driver abstraction
pub mod driver;

/// In-memory driver for tests
pub mod mock;

/// Typed field reads and writes
pub mod interaction;

/// Visibility, read-only and selection checks
pub mod state;

/// Window and tab switching
pub mod window;

/// Grid and table navigation
pub mod grid;

/// Date and time expressions
pub mod temporal;

/// `$TOKEN$` expansion in step arguments
pub mod tokens;

/// Synthetic data for `$FAKE_DATA$` tokens
pub mod fake_data;

/// Per-scenario variables and the page in focus
pub mod session;

/// Step data tables
pub mod data_table;

/// Injectable time source
pub mod clock;

/// Suite configuration
pub mod config;

/// Tracing subscriber setup
pub mod logging;

/// Per-scenario world
pub mod scenario;

/// Step surface
pub mod steps;

mod result;

/// Chromium over CDP
#[cfg(feature = "browser")]
pub mod cdp;

/// W3C WebDriver backend
#[cfg(feature = "webdriver")]
pub mod webdriver;

#[cfg(feature = "browser")]
pub use cdp::CdpDriver;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BrowserKind, PagewrightConfig, Viewport, WindowSearch};
pub use data_table::DataTable;
pub use driver::{BrowserDriver, ElementHandle, WindowHandle};
pub use fake_data::{FakeDataSource, FakerSource};
pub use field::FieldType;
pub use grid::GridNavigator;
pub use interaction::{FieldEngine, ScrollDirection};
pub use locator::Locator;
pub use mock::{ClickEffect, MockDriver, MockElement, MockTable};
pub use page_object::{
    PageObject, PageObjectBuilder, PageObjectDescriptor, PageObjectKind, PageObjectRegistry,
    ResolvedLocator, Visibility,
};
pub use result::{PagewrightError, PagewrightResult};
pub use scenario::Scenario;
pub use session::{SessionContext, SessionValue};
pub use state::{FieldState, StateCheck};
pub use temporal::{DateExpression, DateTimeFormat, TimeExpression};
pub use tokens::DataTransformer;
#[cfg(feature = "webdriver")]
pub use webdriver::WebDriverAdapter;
pub use window::{WindowMatch, WindowSwitcher};
