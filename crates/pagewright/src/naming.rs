//! Step-text to identifier normalization.
//!
//! Two separate rule sets: field names become SCREAMING_SNAKE locator keys,
//! page-object names become compact PascalCase keys. They are deliberately
//! different and must stay that way; page-object names have to match a
//! registered name exactly while field keys only have to match themselves.

/// Substitutions applied to field names, in order.
const FIELD_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("?", "_"),
    ("/", "_"),
    ("+", "_"),
    (">", "_"),
    (".", "_"),
    ("<", "_"),
    ("&", "AND"),
    ("-", "_"),
    ("(", "_"),
    (") ", "_"),
    (")", "_"),
    ("#", "NUMBER"),
    (" ", "_"),
    ("__", ""),
];

/// Normalize step text into a locator field name.
///
/// Total over any input. Characters without a mapping pass through and are
/// uppercased. A single trailing underscore is dropped.
///
/// ```
/// use pagewright::naming::field_name;
///
/// assert_eq!(field_name("First Name"), "FIRST_NAME");
/// assert_eq!(field_name("Terms & Conditions"), "TERMS_AND_CONDITIONS");
/// assert_eq!(field_name("Zip/Postal Code"), "ZIP_POSTAL_CODE");
/// ```
#[must_use]
pub fn field_name(text: &str) -> String {
    let mut name = FIELD_SUBSTITUTIONS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
        .to_uppercase();
    if name.ends_with('_') {
        name.pop();
    }
    name
}

/// Normalize step text into a page-object name.
///
/// ```
/// use pagewright::naming::page_object_name;
///
/// assert_eq!(page_object_name("User Details"), "UserDetails");
/// assert_eq!(page_object_name("Search & Filter"), "SearchAndFilter");
/// ```
#[must_use]
pub fn page_object_name(text: &str) -> String {
    text.replace([' ', '-', '(', ')'], "").replace('&', "And")
}
