//! Conversion of table cells into sink wire values.

use std::fmt::{self, Write};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::tag::FlagEncoding;

/// Date layouts accepted for `date` columns.
const DATE_INPUT_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

/// Date-time layouts accepted for `date_time` columns.
const DATE_TIME_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Semantic type of a source column, used to pick its wire conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Passed through unchanged.
    #[default]
    Text,
    /// Narrow integers are range-checked at their width, then widened to i64.
    Int8,
    Int16,
    Int32,
    Int64,
    Real,
    /// Category flag in either flag encoding, bound as 0/1.
    Flag,
    /// Calendar date, formatted with the target's date format.
    Date,
    /// Date and time, formatted with the target's date format.
    DateTime,
}

/// A value ready to bind to a parameterized statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SinkValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ValueKind {
    /// Convert one cell. Empty cells become `Null` for every kind but `Text`.
    ///
    /// Returns a human-readable reason on failure.
    pub fn coerce(self, raw: &str, date_format: &str) -> Result<SinkValue, String> {
        if self == ValueKind::Text {
            return Ok(SinkValue::Text(raw.to_string()));
        }

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(SinkValue::Null);
        }

        match self {
            ValueKind::Text => Ok(SinkValue::Text(raw.to_string())),
            ValueKind::Int8 => widen::<i8>(trimmed, "int8"),
            ValueKind::Int16 => widen::<i16>(trimmed, "int16"),
            ValueKind::Int32 => widen::<i32>(trimmed, "int32"),
            ValueKind::Int64 => widen::<i64>(trimmed, "int64"),
            ValueKind::Real => trimmed
                .parse::<f64>()
                .map(SinkValue::Real)
                .map_err(|_| format!("'{}' is not a valid real", trimmed)),
            ValueKind::Flag => FlagEncoding::decode(trimmed)
                .map(|flag| SinkValue::Integer(i64::from(flag)))
                .ok_or_else(|| format!("'{}' is not a flag value", trimmed)),
            ValueKind::Date => parse_date(trimmed)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .ok_or_else(|| format!("'{}' is not a recognised date", trimmed))
                .and_then(|dt| render_date(dt.format(date_format), date_format))
                .map(SinkValue::Text),
            ValueKind::DateTime => parse_date_time(trimmed)
                .ok_or_else(|| format!("'{}' is not a recognised date-time", trimmed))
                .and_then(|dt| render_date(dt.format(date_format), date_format))
                .map(SinkValue::Text),
        }
    }
}

/// Fail if `format` holds a specifier chrono cannot render.
pub fn check_date_format(format: &str) -> Result<(), String> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        Err(format!("'{}' is not a valid date format", format))
    } else {
        Ok(())
    }
}

/// Render a chrono `format(..)` result. `ToString` panics when the pattern
/// cannot be rendered; this returns the failure instead.
pub(crate) fn render_date(formatted: impl fmt::Display, format: &str) -> Result<String, String> {
    check_date_format(format)?;
    let mut out = String::new();
    write!(out, "{}", formatted)
        .map_err(|_| format!("'{}' cannot be rendered for this value", format))?;
    Ok(out)
}

fn widen<T>(value: &str, name: &str) -> Result<SinkValue, String>
where
    T: std::str::FromStr + Into<i64>,
{
    value
        .parse::<T>()
        .map(|v| SinkValue::Integer(v.into()))
        .map_err(|_| format!("'{}' is not a valid {}", value, name))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| parse_date_time(value).map(|dt| dt.date()))
}

fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    DATE_TIME_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            DATE_INPUT_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
