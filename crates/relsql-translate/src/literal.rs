//! Literal rendering, including type-preserving NULLs

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use relsql_ir::{ScalarKind, Value};

use crate::error::TranslateError;
use crate::sql::{quote_string, SqlExpr};

const TIMESTAMP_INPUT_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// NULL cast to the literal's declared kind; never a bare NULL.
pub fn typed_null(kind: ScalarKind) -> SqlExpr {
    SqlExpr::cast(SqlExpr::Null, kind.sql_type())
}

/// Render a literal value according to its declared kind.
///
/// `Int32`, `Int64`, `Float64`, `Bool` and text render bare; every other
/// kind is wrapped in a cast so the backend sees the declared type.
pub fn render_literal(value: &Value, kind: ScalarKind) -> Result<SqlExpr, TranslateError> {
    match value {
        Value::Null => Ok(typed_null(kind)),
        Value::Bool(b) => match kind {
            ScalarKind::Bool => Ok(SqlExpr::Literal(if *b { "TRUE" } else { "FALSE" }.to_string())),
            _ => Err(TranslateError::literal(kind, "boolean value")),
        },
        Value::Int(i) => render_integer(*i, kind),
        Value::Float(f) => render_float(*f, kind),
        Value::String(s) => render_text(s, kind),
        Value::Bytes(bytes) => match kind {
            ScalarKind::Blob => {
                let escaped: String = bytes.iter().map(|b| format!("\\x{:02X}", b)).collect();
                Ok(SqlExpr::cast(SqlExpr::Literal(quote_string(&escaped)), kind.sql_type()))
            }
            _ => Err(TranslateError::literal(kind, "byte string value")),
        },
    }
}

fn render_integer(value: i64, kind: ScalarKind) -> Result<SqlExpr, TranslateError> {
    let text = SqlExpr::Literal(value.to_string());

    if let Some((min, max)) = kind.integer_bounds() {
        let wide = value as i128;
        if wide < min || wide > max {
            return Err(TranslateError::literal(kind, format!("{} is out of range", value)));
        }
        return Ok(match kind {
            ScalarKind::Int32 | ScalarKind::Int64 => text,
            _ => SqlExpr::cast(text, kind.sql_type()),
        });
    }

    match kind {
        ScalarKind::Decimal { precision, scale } => {
            if let Some(limit) = decimal_integer_limit(precision, scale) {
                if (value as i128).abs() >= limit {
                    return Err(TranslateError::literal(kind, format!("{} is out of range", value)));
                }
            }
            Ok(SqlExpr::cast(text, kind.sql_type()))
        }
        ScalarKind::Float32 | ScalarKind::Float64 => Ok(SqlExpr::cast(text, kind.sql_type())),
        _ => Err(TranslateError::literal(kind, "integer value")),
    }
}

/// Exclusive bound on the integer part a DECIMAL(p, s) can hold; `None`
/// when the bound does not fit an i128.
fn decimal_integer_limit(precision: u8, scale: u8) -> Option<i128> {
    10i128.checked_pow(u32::from(precision.saturating_sub(scale)))
}

fn render_float(value: f64, kind: ScalarKind) -> Result<SqlExpr, TranslateError> {
    match kind {
        ScalarKind::Float32 | ScalarKind::Float64 => {}
        ScalarKind::Decimal { .. } if value.is_finite() => {}
        ScalarKind::Decimal { .. } => {
            return Err(TranslateError::literal(kind, "non-finite value"));
        }
        _ => return Err(TranslateError::literal(kind, "floating-point value")),
    }

    if let Some(special) = Value::non_finite_name(value) {
        return Ok(SqlExpr::cast(SqlExpr::Literal(quote_string(special)), kind.sql_type()));
    }

    let out_of_range = match kind {
        ScalarKind::Float32 => value.abs() > f64::from(f32::MAX),
        ScalarKind::Decimal { precision, scale } => {
            value.abs() >= 10f64.powi(i32::from(precision.saturating_sub(scale)))
        }
        _ => false,
    };
    if out_of_range {
        return Err(TranslateError::literal(kind, format!("{} is out of range", value)));
    }

    // Debug formatting keeps a decimal point or exponent on every value.
    let text = SqlExpr::Literal(format!("{:?}", value));
    Ok(match kind {
        ScalarKind::Float64 => text,
        _ => SqlExpr::cast(text, kind.sql_type()),
    })
}

fn render_text(value: &str, kind: ScalarKind) -> Result<SqlExpr, TranslateError> {
    let canonical = match kind {
        ScalarKind::String => return Ok(SqlExpr::Literal(quote_string(value))),
        // Non-finite floats arrive spelled out, since JSON cannot carry them.
        ScalarKind::Float32 | ScalarKind::Float64 => {
            return match Value::parse_non_finite(value) {
                Some(special) => render_float(special, kind),
                None => Err(TranslateError::literal(kind, "string value")),
            };
        }
        ScalarKind::Varchar(limit) => {
            if let Some(limit) = limit {
                let len = value.chars().count();
                if len > limit as usize {
                    return Err(TranslateError::literal(
                        kind,
                        format!("{} characters exceed the limit", len),
                    ));
                }
            }
            return Ok(SqlExpr::Literal(quote_string(value)));
        }
        ScalarKind::Json => serde_json::from_str::<serde_json::Value>(value)
            .map_err(|e| TranslateError::literal(kind, e.to_string()))?
            .to_string(),
        ScalarKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|e| TranslateError::literal(kind, e.to_string()))?
            .format("%Y-%m-%d")
            .to_string(),
        ScalarKind::Time => NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
            .map_err(|e| TranslateError::literal(kind, e.to_string()))?
            .format("%H:%M:%S%.f")
            .to_string(),
        ScalarKind::Timestamp => parse_timestamp(value)
            .ok_or_else(|| TranslateError::literal(kind, format!("unrecognized timestamp '{}'", value)))?
            .format("%Y-%m-%d %H:%M:%S%.f")
            .to_string(),
        ScalarKind::TimestampTz => DateTime::parse_from_rfc3339(value)
            .map_err(|e| TranslateError::literal(kind, e.to_string()))?
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S%.f+00:00")
            .to_string(),
        ScalarKind::Uuid => uuid::Uuid::parse_str(value)
            .map_err(|e| TranslateError::literal(kind, e.to_string()))?
            .hyphenated()
            .to_string(),
        ScalarKind::Interval if !value.trim().is_empty() => value.to_string(),
        _ => return Err(TranslateError::literal(kind, "string value")),
    };

    Ok(SqlExpr::cast(SqlExpr::Literal(quote_string(&canonical)), kind.sql_type()))
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}
