//! Relative date/time expressions and named output formats.
//!
//! # Date grammar
//!
//! ```text
//! expr   := base ('&dtf=' format-name)?
//! base   := 't' offset?                      today, shifted
//!         | 'w' weeks? ('/' 't' days?)?      Monday of a week, shifted
//! offset := ('+'|'-') digits ('m'|'y')?      days unless a unit is given
//! weeks  := ('+'|'-') digits
//! days   := ('+'|'-') digits
//! ```
//!
//! # Time grammar
//!
//! ```text
//! expr := 'n' (('+'|'-') digits ('m'|'h'))? ('&dtf=' format-name)?
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc,
};
use regex::Regex;

use crate::clock::Clock;
use crate::result::{PagewrightError, PagewrightResult};

const DTF_MARKER: &str = "&dtf=";

/// Named output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeFormat {
    /// `MM/dd/yyyy`
    UiDate,
    /// `MMddyyyy`
    NameDate,
    /// `MMMM d, yyyy`
    MonthDate,
    /// `d MMMM yyyy`
    DateMonth,
    /// `MMM yyyy`
    MonthYearCaps,
    /// `MM-dd-yy`
    HyphenDate,
    /// `MMM dd`
    MonthWithPaddedDate,
    /// `dd,yyyy`
    PaddedDateAndYearCaps,
    /// `yyyy-MM-ddTHH:mm:ss.SSSZ`, always in UTC
    Api,
    /// `MM/dd/yy`
    ShortYear,
    /// `hh:mm a`
    UiTime,
    /// `h:mm a`
    NonPaddedUiTime,
    /// `HH:mm:ss`
    HourMinuteSeconds,
}

impl DateTimeFormat {
    /// Every format in the order date parsing tries them
    pub const ALL: [Self; 13] = [
        Self::UiDate,
        Self::NameDate,
        Self::MonthDate,
        Self::DateMonth,
        Self::MonthYearCaps,
        Self::HyphenDate,
        Self::MonthWithPaddedDate,
        Self::PaddedDateAndYearCaps,
        Self::Api,
        Self::ShortYear,
        Self::UiTime,
        Self::NonPaddedUiTime,
        Self::HourMinuteSeconds,
    ];

    /// Name used after `&dtf=`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UiDate => "ui_dtf",
            Self::NameDate => "name_dtf",
            Self::MonthDate => "month_date",
            Self::DateMonth => "date_month",
            Self::MonthYearCaps => "month_year_caps",
            Self::HyphenDate => "hyphen_dtf",
            Self::MonthWithPaddedDate => "month_with_padded_date",
            Self::PaddedDateAndYearCaps => "padded_date_and_year_caps",
            Self::Api => "api_dtf",
            Self::ShortYear => "short_year_dtf",
            Self::UiTime => "ui_time_dtf",
            Self::NonPaddedUiTime => "non_padded_ui_time_dtf",
            Self::HourMinuteSeconds => "hour_minute_seconds_dtf",
        }
    }

    /// chrono format string
    #[must_use]
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::UiDate => "%m/%d/%Y",
            Self::NameDate => "%m%d%Y",
            Self::MonthDate => "%B %-d, %Y",
            Self::DateMonth => "%-d %B %Y",
            Self::MonthYearCaps => "%b %Y",
            Self::HyphenDate => "%m-%d-%y",
            Self::MonthWithPaddedDate => "%b %d",
            Self::PaddedDateAndYearCaps => "%d,%Y",
            Self::Api => "%Y-%m-%dT%H:%M:%S%.3fZ",
            Self::ShortYear => "%m/%d/%y",
            Self::UiTime => "%I:%M %p",
            Self::NonPaddedUiTime => "%-I:%M %p",
            Self::HourMinuteSeconds => "%H:%M:%S",
        }
    }

    /// Render an instant. The API format converts to UTC first.
    #[must_use]
    pub fn format(self, instant: &DateTime<FixedOffset>) -> String {
        match self {
            Self::Api => instant.with_timezone(&Utc).format(self.pattern()).to_string(),
            other => instant.naive_local().format(other.pattern()).to_string(),
        }
    }

    /// Render a calendar date at local midnight in `offset`
    #[must_use]
    pub fn format_date(self, date: NaiveDate, offset: FixedOffset) -> String {
        let midnight = date.and_time(NaiveTime::MIN);
        match offset.from_local_datetime(&midnight).single() {
            Some(instant) => self.format(&instant),
            None => midnight.format(self.pattern()).to_string(),
        }
    }

    /// Parse a full calendar date. Formats without day, month and year never match.
    #[must_use]
    pub fn parse_date(self, text: &str) -> Option<NaiveDate> {
        match self {
            Self::Api => NaiveDateTime::parse_from_str(text, self.pattern())
                .ok()
                .map(|dt| dt.date()),
            other => NaiveDate::parse_from_str(text, other.pattern()).ok(),
        }
    }
}

impl fmt::Display for DateTimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DateTimeFormat {
    type Err = PagewrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| PagewrightError::UnsupportedFormat {
                name: s.to_string(),
            })
    }
}

/// First format that parses `text` as a full date, with the date it produced
#[must_use]
pub fn detect_date_format(text: &str) -> Option<(DateTimeFormat, NaiveDate)> {
    DateTimeFormat::ALL
        .into_iter()
        .find_map(|f| f.parse_date(text).map(|d| (f, d)))
}

/// Unit of a `t` offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    /// Calendar days
    Days,
    /// Calendar months, clamped to the last day of the target month
    Months,
    /// Calendar years
    Years,
}

/// Anchor of a date expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBase {
    /// Today
    Today,
    /// Monday of the current week, or of a week `n` weeks away
    WeekStart {
        /// Signed week offset
        weeks: i64,
    },
}

/// Parsed date expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateExpression {
    /// Anchor
    pub base: DateBase,
    /// Signed offset applied to the anchor
    pub offset: i64,
    /// Unit of `offset`
    pub unit: DateUnit,
    /// Explicit output format
    pub format: Option<DateTimeFormat>,
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:t(?:(?P<tsign>[+-])(?P<tn>\d+)(?P<unit>[mMyY])?)?|w(?:(?P<wsign>[+-])(?P<wn>\d+))?(?:/t(?:(?P<dsign>[+-])(?P<dn>\d+))?)?)$")
            .expect("date expression pattern compiles")
    })
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^n(?:(?P<sign>[+-])(?P<n>\d+)(?P<unit>[mMhH])?)?$")
            .expect("time expression pattern compiles")
    })
}

fn split_format(expression: &str) -> PagewrightResult<(&str, Option<DateTimeFormat>)> {
    match expression.split_once(DTF_MARKER) {
        Some((body, name)) => Ok((body.trim(), Some(name.parse()?))),
        None => Ok((expression.trim(), None)),
    }
}

fn signed(
    expression: &str,
    sign: Option<regex::Match<'_>>,
    digits: Option<regex::Match<'_>>,
) -> PagewrightResult<i64> {
    let (Some(sign), Some(digits)) = (sign, digits) else {
        return Ok(0);
    };
    let n: i64 = digits
        .as_str()
        .parse()
        .map_err(|_| invalid(expression, "offset does not fit in 64 bits"))?;
    Ok(if sign.as_str() == "-" { -n } else { n })
}

fn invalid(expression: &str, reason: &str) -> PagewrightError {
    PagewrightError::InvalidDateExpression {
        expression: expression.to_string(),
        reason: reason.to_string(),
    }
}

/// Monday on or before `date`
#[must_use]
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

impl DateExpression {
    /// Parse an expression such as `t`, `t-1`, `t+2m`, `w+1/t-2&dtf=month_date`
    pub fn parse(expression: &str) -> PagewrightResult<Self> {
        let (body, format) = split_format(expression)?;
        let caps = date_pattern()
            .captures(body)
            .ok_or_else(|| invalid(expression, "expected t, t+N, t-Nm, t+Ny, w, w+N or w+N/t-N"))?;

        if body.starts_with('t') {
            let unit = match caps.name("unit").map(|m| m.as_str().to_ascii_lowercase()) {
                Some(u) if u == "m" => DateUnit::Months,
                Some(u) if u == "y" => DateUnit::Years,
                _ => DateUnit::Days,
            };
            Ok(Self {
                base: DateBase::Today,
                offset: signed(expression, caps.name("tsign"), caps.name("tn"))?,
                unit,
                format,
            })
        } else {
            Ok(Self {
                base: DateBase::WeekStart {
                    weeks: signed(expression, caps.name("wsign"), caps.name("wn"))?,
                },
                offset: signed(expression, caps.name("dsign"), caps.name("dn"))?,
                unit: DateUnit::Days,
                format,
            })
        }
    }

    /// Date this expression denotes when today is `today`
    pub fn resolve(&self, today: NaiveDate) -> PagewrightResult<NaiveDate> {
        let out_of_range = || PagewrightError::InvalidDateExpression {
            expression: format!("{self:?}"),
            reason: "date out of range".to_string(),
        };
        let anchor = match self.base {
            DateBase::Today => today,
            DateBase::WeekStart { weeks } => {
                let shifted = Duration::try_weeks(weeks)
                    .and_then(|d| today.checked_add_signed(d))
                    .ok_or_else(out_of_range)?;
                monday_of(shifted)
            }
        };
        match self.unit {
            DateUnit::Days => Duration::try_days(self.offset)
                .and_then(|d| anchor.checked_add_signed(d)),
            DateUnit::Months => shift_months(anchor, self.offset),
            DateUnit::Years => self
                .offset
                .checked_mul(12)
                .and_then(|m| shift_months(anchor, m)),
        }
        .ok_or_else(out_of_range)
    }

    /// Output format, defaulting to `MM/dd/yyyy`
    #[must_use]
    pub fn output_format(&self) -> DateTimeFormat {
        self.format.unwrap_or(DateTimeFormat::UiDate)
    }
}

/// Parsed time expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeExpression {
    /// Signed offset in minutes
    pub offset_minutes: i64,
    /// Explicit output format
    pub format: Option<DateTimeFormat>,
}

impl TimeExpression {
    /// Parse an expression such as `n`, `n+15m`, `n-2h&dtf=hour_minute_seconds_dtf`
    pub fn parse(expression: &str) -> PagewrightResult<Self> {
        let (body, format) = split_format(expression)?;
        let caps = time_pattern()
            .captures(body)
            .ok_or_else(|| invalid(expression, "expected n, n+Nm or n-Nh"))?;
        let amount = signed(expression, caps.name("sign"), caps.name("n"))?;
        let offset_minutes = match caps.name("unit").map(|m| m.as_str().to_ascii_lowercase()) {
            Some(u) if u == "h" => amount
                .checked_mul(60)
                .ok_or_else(|| invalid(expression, "offset too large"))?,
            Some(_) => amount,
            None if caps.name("n").is_some() => {
                return Err(invalid(expression, "time offset needs a unit, m or h"));
            }
            None => 0,
        };
        Ok(Self {
            offset_minutes,
            format,
        })
    }

    /// Instant this expression denotes relative to `now`
    pub fn resolve(&self, now: DateTime<FixedOffset>) -> PagewrightResult<DateTime<FixedOffset>> {
        Duration::try_minutes(self.offset_minutes)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| PagewrightError::InvalidDateExpression {
                expression: format!("{self:?}"),
                reason: "time out of range".to_string(),
            })
    }

    /// Output format, defaulting to `hh:mm a`
    #[must_use]
    pub fn output_format(&self) -> DateTimeFormat {
        self.format.unwrap_or(DateTimeFormat::UiTime)
    }
}

/// Whether `text` is a date expression rather than a literal date
#[must_use]
pub fn is_date_expression(text: &str) -> bool {
    DateExpression::parse(text).is_ok()
}

/// Whether `text` is shaped like a date expression, valid or not.
/// Literal dates do not start with `t` or `w` followed by an offset.
#[must_use]
pub fn looks_like_date_expression(text: &str) -> bool {
    let text = text.trim();
    if text.contains(DTF_MARKER) {
        return true;
    }
    let mut chars = text.chars();
    match chars.next() {
        Some('t' | 'w') => matches!(chars.next(), None | Some('+' | '-' | '/')),
        _ => false,
    }
}

/// Evaluate a date expression against the clock
pub fn evaluate_date(expression: &str, clock: &dyn Clock) -> PagewrightResult<NaiveDate> {
    DateExpression::parse(expression)?.resolve(clock.now().date_naive())
}

/// Evaluate a time expression against the clock
pub fn evaluate_time(expression: &str, clock: &dyn Clock) -> PagewrightResult<NaiveDateTime> {
    Ok(TimeExpression::parse(expression)?
        .resolve(clock.now())?
        .naive_local())
}

/// Evaluate and render a date expression in its `&dtf=` format, or `MM/dd/yyyy`
pub fn format_date(expression: &str, clock: &dyn Clock) -> PagewrightResult<String> {
    let parsed = DateExpression::parse(expression)?;
    let now = clock.now();
    let date = parsed.resolve(now.date_naive())?;
    Ok(parsed.output_format().format_date(date, *now.offset()))
}

/// Evaluate a date expression and render it in an explicit format
pub fn format_date_as(
    expression: &str,
    format: DateTimeFormat,
    clock: &dyn Clock,
) -> PagewrightResult<String> {
    let now = clock.now();
    let date = DateExpression::parse(expression)?.resolve(now.date_naive())?;
    Ok(format.format_date(date, *now.offset()))
}

/// Evaluate and render a time expression in its `&dtf=` format, or `hh:mm a`
pub fn format_time(expression: &str, clock: &dyn Clock) -> PagewrightResult<String> {
    let parsed = TimeExpression::parse(expression)?;
    let instant = parsed.resolve(clock.now())?;
    Ok(parsed.output_format().format(&instant))
}
