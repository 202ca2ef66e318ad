//! Value literals for INSERT statements.
//!
//! Formatting is chosen by the column's portable type, not by the runtime
//! value. A value that cannot be written in its column's literal form is a
//! [`FormatError`]; the generator replaces it with `NULL`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::core::{PortableType, SqlValue};

/// SQL NULL literal.
pub const NULL: &str = "NULL";

/// Why a single cell could not be rendered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// The value's kind has no literal form in the column's type.
    #[error("{kind} value cannot be written to a {data_type} column")]
    Incompatible {
        kind: &'static str,
        data_type: PortableType,
    },

    /// Text that does not parse as the column's type.
    #[error("text {text:?} is not a valid {data_type} literal")]
    Unparseable { text: String, data_type: PortableType },

    /// NaN or infinite floating point value.
    #[error("non-finite number {0}")]
    NonFinite(f64),

    /// The row set has no cell for the column.
    #[error("column {0} is missing from the fetched rows")]
    MissingColumn(String),
}

/// Text layouts accepted for DATETIME columns, tried in order.
const DATE_TIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];
const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Render `value` as a literal for a column of type `data_type`.
pub fn format_value(value: &SqlValue, data_type: PortableType) -> Result<String, FormatError> {
    if value.is_null() {
        return Ok(NULL.to_string());
    }
    match data_type {
        PortableType::Integer
        | PortableType::Decimal
        | PortableType::Double
        | PortableType::Boolean => format_numeric(value, data_type),
        PortableType::DateTime => format_date(value),
        PortableType::String | PortableType::Blob => Ok(format_quoted(value)),
    }
}

/// Unquoted numeric literal; empty text becomes NULL.
fn format_numeric(value: &SqlValue, data_type: PortableType) -> Result<String, FormatError> {
    match value {
        SqlValue::Null => Ok(NULL.to_string()),
        SqlValue::Bool(v) => Ok(if *v { "1" } else { "0" }.to_string()),
        SqlValue::Int(v) => Ok(v.to_string()),
        SqlValue::Decimal(v) => Ok(v.to_string()),
        SqlValue::Float(v) if v.is_finite() => Ok(v.to_string()),
        SqlValue::Float(v) => Err(FormatError::NonFinite(*v)),
        SqlValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(NULL.to_string());
            }
            if data_type == PortableType::Boolean {
                if let Some(b) = value.as_bool() {
                    return Ok(if b { "1" } else { "0" }.to_string());
                }
            }
            if is_numeric_text(trimmed) {
                Ok(trimmed.to_string())
            } else {
                Err(FormatError::Unparseable {
                    text: text.clone(),
                    data_type,
                })
            }
        }
        other => Err(FormatError::Incompatible {
            kind: kind_name(other),
            data_type,
        }),
    }
}

/// SQL numeric literal: optional sign, digits with at most one decimal
/// point, optional exponent. Digit separators, `inf`, `NaN` and hex are
/// rejected.
fn is_numeric_text(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(idx) => (&unsigned[..idx], Some(&unsigned[idx + 1..])),
        None => (unsigned, None),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !digits.is_empty()
                && all_digits(digits)
                && text.parse::<f64>().is_ok_and(f64::is_finite)
        }
    }
}

/// Date-only literal `'YYYY-MM-DD'`; time of day is dropped.
fn format_date(value: &SqlValue) -> Result<String, FormatError> {
    let date = match value {
        SqlValue::Date(d) => *d,
        SqlValue::DateTime(dt) => dt.date(),
        SqlValue::DateTimeOffset(dt) => dt.date_naive(),
        SqlValue::Text(text) if text.trim().is_empty() => return Ok(NULL.to_string()),
        SqlValue::Text(text) => parse_date(text.trim()).ok_or_else(|| FormatError::Unparseable {
            text: text.clone(),
            data_type: PortableType::DateTime,
        })?,
        other => {
            return Err(FormatError::Incompatible {
                kind: kind_name(other),
                data_type: PortableType::DateTime,
            })
        }
    };
    Ok(format!("'{}'", date.format("%Y-%m-%d")))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
        .or_else(|| {
            DATE_TIME_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Double-quoted string form. Embedded quotes are not escaped.
fn format_quoted(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => NULL.to_string(),
        SqlValue::Bytes(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
            format!("X'{}'", hex)
        }
        other => format!("\"{}\"", other),
    }
}

fn kind_name(value: &SqlValue) -> &'static str {
    match value {
        SqlValue::Null => "null",
        SqlValue::Bool(_) => "boolean",
        SqlValue::Int(_) => "integer",
        SqlValue::Float(_) => "float",
        SqlValue::Decimal(_) => "decimal",
        SqlValue::Text(_) => "text",
        SqlValue::Bytes(_) => "binary",
        SqlValue::Uuid(_) => "uuid",
        SqlValue::Date(_) => "date",
        SqlValue::DateTime(_) => "datetime",
        SqlValue::DateTimeOffset(_) => "datetimeoffset",
        SqlValue::Time(_) => "time",
    }
}
