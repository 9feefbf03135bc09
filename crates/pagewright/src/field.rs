//! Field type tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::result::PagewrightError;

/// Classification that picks the read/write algorithm for a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Single-line text input
    TextField,
    /// Multi-line text input
    TextArea,
    /// Date input, usually backed by a date picker
    DateField,
    /// Read-only text
    Label,
    /// Read-only date text
    DateLabel,
    /// Native `<select>`
    Dropdown,
    /// Radio button
    Radio,
    /// Checkbox, native or Angular Material
    Checkbox,
}

impl FieldType {
    /// Every supported tag
    pub const ALL: [Self; 8] = [
        Self::TextField,
        Self::TextArea,
        Self::DateField,
        Self::Label,
        Self::DateLabel,
        Self::Dropdown,
        Self::Radio,
        Self::Checkbox,
    ];

    /// Step-text spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextField => "text field",
            Self::TextArea => "textarea",
            Self::DateField => "date field",
            Self::Label => "label",
            Self::DateLabel => "date label",
            Self::Dropdown => "dropdown",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
        }
    }

    /// Whether values of this type are dates that may be written as expressions
    #[must_use]
    pub const fn is_date(self) -> bool {
        matches!(self, Self::DateField | Self::DateLabel)
    }

    /// Whether the field only supports reads
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::Label | Self::DateLabel)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = PagewrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or(PagewrightError::UnsupportedFieldType {
                field_type: s.to_string(),
            })
    }
}
