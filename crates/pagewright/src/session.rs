//! Per-scenario session state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::page_object::PageObjectDescriptor;
use crate::result::{PagewrightError, PagewrightResult};

/// Typed session variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionValue {
    /// Whole number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Anything else
    Text(String),
}

impl SessionValue {
    /// Type a raw step argument: integer, then float, then text
    #[must_use]
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            Self::Integer(n)
        } else if let Some(f) = trimmed.parse::<f64>().ok().filter(|f| f.is_finite()) {
            Self::Float(f)
        } else {
            Self::Text(raw.to_string())
        }
    }

    /// Name of the stored type
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }
}

impl fmt::Display for SessionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for SessionValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SessionValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for SessionValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for SessionValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

/// State carried between the steps of one scenario
#[derive(Debug, Default, Clone)]
pub struct SessionContext {
    current_page: Option<Arc<PageObjectDescriptor>>,
    variables: HashMap<String, SessionValue>,
}

impl SessionContext {
    /// Create an empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the page the browser is known to be on. Replaces any previous one.
    pub fn set_current_page(&mut self, page: Arc<PageObjectDescriptor>) {
        debug!(page = page.name(), "current page set");
        self.current_page = Some(page);
    }

    /// Page recorded by the last successful page-state step
    #[must_use]
    pub fn current_page(&self) -> Option<&Arc<PageObjectDescriptor>> {
        self.current_page.as_ref()
    }

    /// Store a variable, replacing any previous value
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<SessionValue>) {
        let name = name.into();
        let value = value.into();
        debug!(name = %name, kind = value.type_name(), "session variable set");
        let _ = self.variables.insert(name, value);
    }

    /// Look up a variable
    pub fn variable(&self, name: &str) -> PagewrightResult<&SessionValue> {
        self.variables
            .get(name)
            .ok_or_else(|| PagewrightError::VariableNotFound {
                name: name.to_string(),
            })
    }

    /// Whether a variable is set
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Text variable
    pub fn text(&self, name: &str) -> PagewrightResult<&str> {
        match self.variable(name)? {
            SessionValue::Text(s) => Ok(s),
            other => Err(mismatch(name, "text", other)),
        }
    }

    /// Integer variable
    pub fn integer(&self, name: &str) -> PagewrightResult<i64> {
        match self.variable(name)? {
            SessionValue::Integer(n) => Ok(*n),
            other => Err(mismatch(name, "integer", other)),
        }
    }

    /// Float variable. Integers widen.
    pub fn float(&self, name: &str) -> PagewrightResult<f64> {
        match self.variable(name)? {
            SessionValue::Float(x) => Ok(*x),
            SessionValue::Integer(n) => Ok(*n as f64),
            other @ SessionValue::Text(_) => Err(mismatch(name, "float", other)),
        }
    }

    /// Sum of two whole-number variables. Text operands are parsed as `i64`.
    pub fn add_integers(&self, first: &str, second: &str) -> PagewrightResult<i64> {
        let a = self.whole_number(first)?;
        let b = self.whole_number(second)?;
        a.checked_add(b).ok_or_else(|| PagewrightError::InvalidArgument {
            argument: format!("sum of {first} and {second}"),
            value: format!("{a} + {b}"),
            accepted: vec!["values whose sum fits in 64 bits".to_string()],
        })
    }

    fn whole_number(&self, name: &str) -> PagewrightResult<i64> {
        let value = self.variable(name)?;
        match value {
            SessionValue::Integer(n) => Ok(*n),
            SessionValue::Text(s) => s.parse().map_err(|_| mismatch(name, "integer", value)),
            SessionValue::Float(_) => Err(mismatch(name, "integer", value)),
        }
    }

    /// Drop all variables and the current page
    pub fn clear(&mut self) {
        self.current_page = None;
        self.variables.clear();
    }
}

fn mismatch(name: &str, expected: &'static str, actual: &SessionValue) -> PagewrightError {
    PagewrightError::TypeMismatch {
        name: name.to_string(),
        expected,
        actual: actual.type_name(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::page_object::PageObjectKind;

    mod value_tests {
        use super::*;

        #[test]
        fn test_infer_order() {
            assert_eq!(SessionValue::infer("42"), SessionValue::Integer(42));
            assert_eq!(SessionValue::infer("9000000000"), SessionValue::Integer(9_000_000_000));
            assert_eq!(SessionValue::infer("2.5"), SessionValue::Float(2.5));
            assert_eq!(SessionValue::infer("abc"), SessionValue::Text("abc".into()));
            assert_eq!(SessionValue::infer("NaN"), SessionValue::Text("NaN".into()));
        }

        #[test]
        fn test_display() {
            assert_eq!(SessionValue::Integer(7).to_string(), "7");
            assert_eq!(SessionValue::Float(1.5).to_string(), "1.5");
            assert_eq!(SessionValue::from("x").to_string(), "x");
        }
    }

    mod context_tests {
        use super::*;

        #[test]
        fn test_typed_getters() {
            let mut ctx = SessionContext::new();
            ctx.set_variable("count", 3_i64);
            ctx.set_variable("ratio", 0.5_f64);
            ctx.set_variable("name", "Ada");
            assert_eq!(ctx.integer("count").unwrap(), 3);
            assert_eq!(ctx.float("ratio").unwrap(), 0.5);
            assert_eq!(ctx.float("count").unwrap(), 3.0);
            assert_eq!(ctx.text("name").unwrap(), "Ada");
        }

        #[test]
        fn test_type_mismatch() {
            let mut ctx = SessionContext::new();
            ctx.set_variable("name", "Ada");
            let err = ctx.integer("name").unwrap_err();
            assert!(matches!(
                err,
                PagewrightError::TypeMismatch {
                    expected: "integer",
                    actual: "text",
                    ..
                }
            ));
        }

        #[test]
        fn test_missing_variable() {
            let ctx = SessionContext::new();
            assert!(matches!(
                ctx.variable("nope").unwrap_err(),
                PagewrightError::VariableNotFound { .. }
            ));
        }

        #[test]
        fn test_add_integers() {
            let mut ctx = SessionContext::new();
            ctx.set_variable("a", SessionValue::infer("40"));
            ctx.set_variable("b", SessionValue::infer("2"));
            assert_eq!(ctx.add_integers("a", "b").unwrap(), 42);
        }

        #[test]
        fn test_add_integers_parses_text() {
            let mut ctx = SessionContext::new();
            ctx.set_variable("zip", "02134");
            ctx.set_variable("offset", "+6");
            assert_eq!(ctx.add_integers("zip", "offset").unwrap(), 2140);
            assert_eq!(ctx.text("zip").unwrap(), "02134");
        }

        #[test]
        fn test_add_integers_rejects_non_numbers() {
            let mut ctx = SessionContext::new();
            ctx.set_variable("count", "3");
            ctx.set_variable("price", "1.50");
            ctx.set_variable("ratio", 0.5_f64);
            for bad in ["price", "ratio"] {
                let err = ctx.add_integers("count", bad).unwrap_err();
                assert!(matches!(
                    err,
                    PagewrightError::TypeMismatch { expected: "integer", .. }
                ));
            }
        }

        #[test]
        fn test_current_page_overwritten() {
            let mut ctx = SessionContext::new();
            let home = Arc::new(PageObjectDescriptor::builder(PageObjectKind::Page, "Home").build());
            let about = Arc::new(PageObjectDescriptor::builder(PageObjectKind::Page, "About").build());
            ctx.set_current_page(home);
            ctx.set_current_page(Arc::clone(&about));
            assert!(Arc::ptr_eq(ctx.current_page().unwrap(), &about));
        }

        #[test]
        fn test_clear() {
            let mut ctx = SessionContext::new();
            ctx.set_variable("a", 1_i64);
            ctx.clear();
            assert!(!ctx.contains("a"));
            assert!(ctx.current_page().is_none());
        }
    }
}
