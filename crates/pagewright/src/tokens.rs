//! `$TOKEN$` expansion for step arguments.
//!
//! A step argument is split on `$`; segments naming a token are replaced and
//! everything else is kept verbatim. Tokens that need an argument take it
//! inline (`$SESSION_VARIABLE:orderId$`) or from the following segment
//! (`$SESSION_VARIABLE$orderId$`), and the argument segment is consumed.
//!
//! Writing `` `$ `` or `` $` `` anywhere in the text disables expansion for the
//! whole argument; the backticks are dropped.

use chrono::{Days, NaiveDateTime};
use rand::Rng;
use tracing::debug;

use crate::clock::Clock;
use crate::data_table::DataTable;
use crate::fake_data::FakeDataSource;
use crate::result::{PagewrightError, PagewrightResult};
use crate::session::SessionContext;

const TOKEN_DELIMITER: char = '$';
const MOBILE_RANGE: std::ops::Range<u64> = 1_000_000_000..10_000_000_000;

/// Date layouts shared by the `CURRENT_DATE*` and `PREVIOUS_DATE*` families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateLayout {
    Slashed,
    Hyphenated,
    ForName,
    WithTime,
    ShortYear,
}

impl DateLayout {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" => Some(Self::Slashed),
            "_WITH_HYPHEN" => Some(Self::Hyphenated),
            "_FOR_NAME" => Some(Self::ForName),
            "_TIME" => Some(Self::WithTime),
            "_WITH_SHORT_YEAR" => Some(Self::ShortYear),
            _ => None,
        }
    }

    const fn pattern(self) -> &'static str {
        match self {
            Self::Slashed => "%m/%d/%Y",
            Self::Hyphenated => "%m-%d-%y",
            Self::ForName => "%m%d%Y",
            Self::WithTime => "%m/%d/%Y %I:%M",
            Self::ShortYear => "%m/%d/%y",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    CurrentDate(DateLayout),
    PreviousDate(DateLayout),
    RandomMobileNumber,
    SessionVariable,
    FakeData,
    CurrentMonthNumber,
    CurrentMonthName,
}

impl Token {
    fn parse(segment: &str) -> Option<Self> {
        if let Some(suffix) = segment.strip_prefix("CURRENT_DATE") {
            return DateLayout::from_suffix(suffix).map(Self::CurrentDate);
        }
        if let Some(suffix) = segment.strip_prefix("PREVIOUS_DATE") {
            return DateLayout::from_suffix(suffix).map(Self::PreviousDate);
        }
        match segment {
            "RANDOM_MOBILE_NUMBER" => Some(Self::RandomMobileNumber),
            "SESSION_VARIABLE" => Some(Self::SessionVariable),
            "FAKE_DATA" => Some(Self::FakeData),
            "CURRENT_MONTH_NUMBER" => Some(Self::CurrentMonthNumber),
            "CURRENT_MONTH_NAME" => Some(Self::CurrentMonthName),
            _ => None,
        }
    }

    const fn takes_argument(self) -> bool {
        matches!(self, Self::SessionVariable | Self::FakeData)
    }
}

/// Whether `text` opts out of expansion
#[must_use]
pub fn is_escaped(text: &str) -> bool {
    text.contains("`$") || text.contains("$`")
}

/// Expands tokens against one scenario's session, fake-data source and clock
#[derive(Debug)]
pub struct DataTransformer<'a> {
    session: &'a mut SessionContext,
    fakes: &'a dyn FakeDataSource,
    clock: &'a dyn Clock,
}

impl<'a> DataTransformer<'a> {
    /// Create a transformer
    pub fn new(
        session: &'a mut SessionContext,
        fakes: &'a dyn FakeDataSource,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            session,
            fakes,
            clock,
        }
    }

    /// Expand every token in `text`
    pub fn transform(&mut self, text: &str) -> PagewrightResult<String> {
        if is_escaped(text) {
            return Ok(text.replace("`$", "$").replace("$`", "$"));
        }
        if !text.contains(TOKEN_DELIMITER) {
            return Ok(text.to_string());
        }

        let segments: Vec<&str> = text.split(TOKEN_DELIMITER).collect();
        let mut expanded = String::with_capacity(text.len());
        let mut index = 0;
        while index < segments.len() {
            let segment = segments[index];
            let (token, inline_argument) = match segment.split_once(':') {
                Some((name, argument)) if Token::parse(name).is_some() => {
                    (Token::parse(name), Some(argument))
                }
                _ => (Token::parse(segment), None),
            };
            match token {
                None => expanded.push_str(segment),
                Some(token) if token.takes_argument() => {
                    let argument = match inline_argument {
                        Some(argument) => argument,
                        None => {
                            index += 1;
                            segments.get(index).copied().unwrap_or_default()
                        }
                    };
                    expanded.push_str(&self.expand_with(token, argument.trim())?);
                }
                Some(token) => expanded.push_str(&self.expand(token)?),
            }
            index += 1;
        }
        debug!(input = text, output = %expanded, "tokens expanded");
        Ok(expanded)
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now().naive_local()
    }

    fn expand(&self, token: Token) -> PagewrightResult<String> {
        let now = self.now();
        let value = match token {
            Token::CurrentDate(layout) => now.format(layout.pattern()).to_string(),
            Token::PreviousDate(layout) => {
                let yesterday = now.checked_sub_days(Days::new(1)).ok_or_else(|| {
                    PagewrightError::InvalidDateExpression {
                        expression: "PREVIOUS_DATE".to_string(),
                        reason: "date out of range".to_string(),
                    }
                })?;
                yesterday.format(layout.pattern()).to_string()
            }
            Token::RandomMobileNumber => rand::thread_rng().gen_range(MOBILE_RANGE).to_string(),
            Token::CurrentMonthNumber => now.format("%m").to_string(),
            Token::CurrentMonthName => now.format("%B").to_string(),
            Token::SessionVariable | Token::FakeData => String::new(),
        };
        Ok(value)
    }

    fn expand_with(&mut self, token: Token, argument: &str) -> PagewrightResult<String> {
        match token {
            Token::SessionVariable => Ok(self.session.variable(argument)?.to_string()),
            Token::FakeData => {
                let value = self.fakes.generate(argument, self.now().date())?;
                self.session.set_variable(argument, value.clone());
                Ok(value)
            }
            other => self.expand(other),
        }
    }

    /// Copy of `table` with every cell containing `$` expanded
    pub fn transform_data_table(&mut self, table: &DataTable) -> PagewrightResult<DataTable> {
        table.transform_cells(|cell| {
            if cell.contains(TOKEN_DELIMITER) {
                self.transform(cell)
            } else {
                Ok(cell.to_string())
            }
        })
    }

    /// Expanded table flattened to one string per row
    pub fn transform_list(&mut self, table: &DataTable) -> PagewrightResult<Vec<String>> {
        Ok(self.transform_data_table(table)?.flatten_rows())
    }
}
