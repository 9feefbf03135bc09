//! Locator abstraction for element selection.
//!
//! Page objects author locators as plain strings in either CSS or XPath style.
//! [`Locator::parse`] decides which, and the rest of the crate works on the
//! typed value. Browser backends that script the page use [`Locator::to_query`]
//! and friends to turn a locator into a JavaScript expression.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector for zero or more elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locator {
    /// CSS selector (e.g., "table.results")
    Css(String),
    /// XPath expression
    XPath(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// Accessible role with an optional accessible name
    Role {
        /// ARIA role
        role: String,
        /// Accessible name filter
        name: Option<String>,
    },
}

impl Locator {
    /// Create a CSS locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a test-id locator
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a role locator
    #[must_use]
    pub fn role(role: impl Into<String>, name: Option<&str>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.map(str::to_string),
        }
    }

    /// Parse an authored locator string.
    ///
    /// Strings starting with `//`, `(/` or `xpath=` are XPath; `data-testid=`
    /// is a test id; anything else is CSS.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix("xpath=") {
            Self::XPath(rest.to_string())
        } else if trimmed.starts_with("//") || trimmed.starts_with("(/") {
            Self::XPath(trimmed.to_string())
        } else if let Some(rest) = trimmed.strip_prefix("data-testid=") {
            Self::TestId(rest.to_string())
        } else {
            Self::Css(trimmed.to_string())
        }
    }

    /// Whether this locator uses path-style addressing
    #[must_use]
    pub const fn is_xpath(&self) -> bool {
        matches!(self, Self::XPath(_))
    }

    /// Locator for the n-th (1-based) body row of a table addressed by `self`.
    ///
    /// Path-style tables get `/tbody/tr[n]`, flat selectors get
    /// ` >tbody tr:nth-child(n)`. Test-id and role tables are treated as CSS.
    #[must_use]
    pub fn row(&self, index: usize) -> Self {
        match self {
            Self::XPath(expr) => Self::XPath(format!("{expr}/tbody/tr[{index}]")),
            other => Self::Css(format!("{} >tbody tr:nth-child({index})", other.as_css())),
        }
    }

    /// CSS rendering of a non-XPath locator
    pub(crate) fn as_css(&self) -> String {
        match self {
            Self::Css(s) => s.clone(),
            Self::XPath(s) => s.clone(),
            Self::TestId(id) => format!("[data-testid={id:?}]"),
            Self::Role { role, name: None } => format!("[role={role:?}]"),
            Self::Role {
                role,
                name: Some(name),
            } => format!("[role={role:?}][aria-label={name:?}]"),
        }
    }

    /// JavaScript expression yielding the first match or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        self.to_query_in("document")
    }

    /// JavaScript expression yielding the first match under `scope`
    #[must_use]
    pub fn to_query_in(&self, scope: &str) -> String {
        match self {
            Self::XPath(s) => format!(
                "document.evaluate({s:?}, {scope}, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
            ),
            other => format!("{scope}.querySelector({:?})", other.as_css()),
        }
    }

    /// JavaScript expression yielding an array of all matches under `scope`
    #[must_use]
    pub fn to_all_query_in(&self, scope: &str) -> String {
        match self {
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({s:?}, {scope}, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 return Array.from({{ length: r.snapshotLength }}, (_, i) => r.snapshotItem(i)); }})()"
            ),
            other => format!("Array.from({scope}.querySelectorAll({:?}))", other.as_css()),
        }
    }

    /// JavaScript expression counting matches in the document
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("{}.length", self.to_all_query_in("document"))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) | Self::XPath(s) => write!(f, "{s}"),
            Self::TestId(id) => write!(f, "data-testid={id}"),
            Self::Role { role, name: None } => write!(f, "role={role}"),
            Self::Role {
                role,
                name: Some(name),
            } => write!(f, "role={role}[name={name}]"),
        }
    }
}

impl From<&str> for Locator {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_css() {
            assert_eq!(Locator::parse("#email"), Locator::css("#email"));
        }

        #[test]
        fn test_parse_xpath_forms() {
            assert!(Locator::parse("//table[@id='a']").is_xpath());
            assert!(Locator::parse("(//td)[2]").is_xpath());
            assert_eq!(Locator::parse("xpath=/html/body"), Locator::xpath("/html/body"));
        }

        #[test]
        fn test_parse_test_id() {
            assert_eq!(Locator::parse("data-testid=submit"), Locator::test_id("submit"));
        }

        #[test]
        fn test_parse_trims() {
            assert_eq!(Locator::parse("  .row  "), Locator::css(".row"));
        }
    }

    mod row_tests {
        use super::*;

        #[test]
        fn test_xpath_row() {
            let table = Locator::xpath("//table[@id='orders']");
            assert_eq!(
                table.row(3),
                Locator::xpath("//table[@id='orders']/tbody/tr[3]")
            );
        }

        #[test]
        fn test_css_row() {
            let table = Locator::css("#orders");
            assert_eq!(table.row(1), Locator::css("#orders >tbody tr:nth-child(1)"));
        }

        #[test]
        fn test_test_id_row_is_css() {
            let row = Locator::test_id("orders").row(2);
            assert!(!row.is_xpath());
            assert!(row.to_string().ends_with(">tbody tr:nth-child(2)"));
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn test_css_query() {
            assert_eq!(
                Locator::css("#a").to_query(),
                "document.querySelector(\"#a\")"
            );
        }

        #[test]
        fn test_xpath_query_scoped() {
            let q = Locator::xpath(".//td").to_query_in("el");
            assert!(q.contains("document.evaluate(\".//td\", el"));
        }

        #[test]
        fn test_count_query() {
            let q = Locator::css("tr").to_count_query();
            assert!(q.starts_with("Array.from(document.querySelectorAll(\"tr\"))"));
            assert!(q.ends_with(".length"));
        }

        #[test]
        fn test_role_with_name() {
            let q = Locator::role("button", Some("Save")).to_query();
            assert!(q.contains("[role=\\\"button\\\"][aria-label=\\\"Save\\\"]"));
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn test_display_round_trips_authored_string() {
            assert_eq!(Locator::parse("//div").to_string(), "//div");
            assert_eq!(Locator::parse("div > span").to_string(), "div > span");
        }
    }
}
