//! Result and error types for pagewright.
//!
//! Every variant is fatal to the step that raised it. Messages are written for
//! the person maintaining page objects: they name the path, field or value that
//! has to be created or fixed.

use thiserror::Error;

/// Result type for pagewright operations
pub type PagewrightResult<T> = Result<T, PagewrightError>;

/// Errors that can occur while resolving and driving page objects
#[derive(Debug, Error)]
pub enum PagewrightError {
    /// No page object registered at the conventional path
    #[error("Unable to find {kind} class under package: {path}. Perhaps class not created or inaccessible.")]
    DescriptorNotFound {
        /// Kind label (Page, Section, Grid, Dialog, Tab)
        kind: String,
        /// Fully qualified path that was looked up
        path: String,
    },

    /// Page object exists but declares no such locator
    #[error("Unable to find {field} field in the class: {path}. Perhaps element does not exist.")]
    LocatorNotFound {
        /// Canonical field name
        field: String,
        /// Path of the owning page object
        path: String,
    },

    /// Locator is declared but not exported
    #[error("Unable to find {field} field in the class: {path}. Perhaps access is not allowed.")]
    LocatorAccess {
        /// Canonical field name
        field: String,
        /// Path of the owning page object
        path: String,
    },

    /// Field type tag outside the supported set
    #[error("Unsupported field type: {field_type}")]
    UnsupportedFieldType {
        /// The tag as written
        field_type: String,
    },

    /// Argument outside a fixed vocabulary
    #[error("Invalid value '{value}' for {argument}. Accepted values: {}", accepted.join(", "))]
    InvalidArgument {
        /// What the argument controls
        argument: String,
        /// Value supplied
        value: String,
        /// Values that would have been accepted
        accepted: Vec<String>,
    },

    /// Locator matched nothing in the current document
    #[error("No element found for locator: {locator}")]
    ElementNotFound {
        /// Rendered locator
        locator: String,
    },

    /// Window search exhausted its attempts
    #[error("Unable to find window with type: {match_type} and value: {value}")]
    WindowNotFound {
        /// TITLE_MATCH or URL_SUBSTRING
        match_type: String,
        /// Substring searched for
        value: String,
    },

    /// Step data table has the wrong header row
    #[error("Data table headers must be exactly [{}], found [{}]", expected.join(", "), found.join(", "))]
    DataTableShape {
        /// Required headers
        expected: Vec<String>,
        /// Headers supplied
        found: Vec<String>,
    },

    /// Session variable holds a different type than requested
    #[error("Session variable '{name}' is {actual}, not {expected}")]
    TypeMismatch {
        /// Variable name
        name: String,
        /// Requested type
        expected: &'static str,
        /// Stored type
        actual: &'static str,
    },

    /// Session variable was never set
    #[error("Session variable '{name}' is not set")]
    VariableNotFound {
        /// Variable name
        name: String,
    },

    /// Date or time expression does not follow the grammar
    #[error("Invalid date expression '{expression}': {reason}")]
    InvalidDateExpression {
        /// Expression as written
        expression: String,
        /// What is wrong with it
        reason: String,
    },

    /// Unknown named date/time format
    #[error("Unsupported DTF value: {name}")]
    UnsupportedFormat {
        /// Format name as written
        name: String,
    },

    /// Dropdown option missing
    #[error("Unable to find option '{value}' in dropdown {locator}")]
    OptionNotFound {
        /// Requested option text
        value: String,
        /// Dropdown locator
        locator: String,
    },

    /// Grid header missing
    #[error("Column '{column}' not found in grid headers [{}]", headers.join(", "))]
    ColumnNotFound {
        /// Requested column
        column: String,
        /// Headers present
        headers: Vec<String>,
    },

    /// No grid row matched
    #[error("Unable to find row in the grid table where '{column}' is '{value}'.")]
    RowNotFound {
        /// Column searched
        column: String,
        /// Value searched for
        value: String,
    },

    /// Fake data key not supported by the generator
    #[error("No fake data generator for key: {key}")]
    UnknownFakeDataKey {
        /// Requested key
        key: String,
    },

    /// Page object has no default URL to navigate to
    #[error("Page object {path} declares no default URL")]
    MissingDefaultUrl {
        /// Page object path
        path: String,
    },

    /// A field step ran before any page state step
    #[error("No page is in focus. Start the scenario with a page, section, grid, dialog or tab state step.")]
    NoCurrentPage,

    /// Operation timed out
    #[error("Operation timed out after {ms}ms: {message}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was being waited for
        message: String,
    },

    /// Browser backend failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Configuration is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PagewrightError {
    /// Wrap a backend error
    pub fn driver(err: impl std::fmt::Display) -> Self {
        Self::Driver {
            message: err.to_string(),
        }
    }

    /// Build an assertion failure
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Whether this error means the locator matched nothing
    #[must_use]
    pub const fn is_element_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }
}
