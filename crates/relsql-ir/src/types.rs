//! Scalar type system for relsql IR

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive type of one scalar value or output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    // Primitives
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Decimal { precision: u8, scale: u8 },

    // Text
    String,
    Varchar(Option<u32>),
    Json,

    // Binary
    Blob,

    // Temporal
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Interval,

    // Identifiers
    Uuid,
}

/// Scalar kinds the default result-materialization path reads incorrectly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultTypeOverride {
    /// Read as a signed 8-bit integer instead of an unsigned byte.
    SignedByte,
    /// Read as an offset-aware timestamp instead of a local one.
    TimestampWithTimeZone,
}

impl ScalarKind {
    /// Backend type name, as used in `CAST(... AS <type>)`.
    pub fn sql_type(&self) -> String {
        match self {
            ScalarKind::Bool => "BOOLEAN".to_string(),
            ScalarKind::Int8 => "TINYINT".to_string(),
            ScalarKind::Int16 => "SMALLINT".to_string(),
            ScalarKind::Int32 => "INTEGER".to_string(),
            ScalarKind::Int64 => "BIGINT".to_string(),
            ScalarKind::UInt8 => "UTINYINT".to_string(),
            ScalarKind::UInt16 => "USMALLINT".to_string(),
            ScalarKind::UInt32 => "UINTEGER".to_string(),
            ScalarKind::UInt64 => "UBIGINT".to_string(),
            ScalarKind::Float32 => "REAL".to_string(),
            ScalarKind::Float64 => "DOUBLE".to_string(),
            ScalarKind::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
            ScalarKind::String => "VARCHAR".to_string(),
            ScalarKind::Varchar(Some(len)) => format!("VARCHAR({})", len),
            ScalarKind::Varchar(None) => "VARCHAR".to_string(),
            ScalarKind::Json => "JSON".to_string(),
            ScalarKind::Blob => "BLOB".to_string(),
            ScalarKind::Date => "DATE".to_string(),
            ScalarKind::Time => "TIME".to_string(),
            ScalarKind::Timestamp => "TIMESTAMP".to_string(),
            ScalarKind::TimestampTz => "TIMESTAMPTZ".to_string(),
            ScalarKind::Interval => "INTERVAL".to_string(),
            ScalarKind::Uuid => "UUID".to_string(),
        }
    }

    /// String-like kinds that the execution layer should fetch as raw text.
    pub fn is_textual(&self) -> bool {
        matches!(self, ScalarKind::String | ScalarKind::Varchar(_) | ScalarKind::Json)
    }

    pub fn is_integer(&self) -> bool {
        self.integer_rank().is_some()
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(
                self,
                ScalarKind::Float32 | ScalarKind::Float64 | ScalarKind::Decimal { .. }
            )
    }

    /// Override tag for kinds the default materializer gets wrong
    pub fn result_override(&self) -> Option<ResultTypeOverride> {
        match self {
            ScalarKind::Int8 => Some(ResultTypeOverride::SignedByte),
            ScalarKind::TimestampTz => Some(ResultTypeOverride::TimestampWithTimeZone),
            _ => None,
        }
    }

    /// Inclusive value range for integer kinds.
    pub fn integer_bounds(&self) -> Option<(i128, i128)> {
        match self {
            ScalarKind::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            ScalarKind::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            ScalarKind::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            ScalarKind::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            ScalarKind::UInt8 => Some((0, u8::MAX as i128)),
            ScalarKind::UInt16 => Some((0, u16::MAX as i128)),
            ScalarKind::UInt32 => Some((0, u32::MAX as i128)),
            ScalarKind::UInt64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    // Width ordering used for arithmetic promotion; signed kinds sort above
    // unsigned ones of the same width.
    fn integer_rank(&self) -> Option<u8> {
        match self {
            ScalarKind::UInt8 => Some(0),
            ScalarKind::Int8 => Some(1),
            ScalarKind::UInt16 => Some(2),
            ScalarKind::Int16 => Some(3),
            ScalarKind::UInt32 => Some(4),
            ScalarKind::Int32 => Some(5),
            ScalarKind::UInt64 => Some(6),
            ScalarKind::Int64 => Some(7),
            _ => None,
        }
    }

    /// Result kind of an arithmetic operation over two numeric kinds.
    ///
    /// Integers widen to the larger of the two; any float yields `Float64`;
    /// decimals widen precision and scale. Returns `None` when either side
    /// is not numeric.
    pub fn promote(self, other: ScalarKind) -> Option<ScalarKind> {
        if self == other && self.is_numeric() {
            return Some(self);
        }
        match (self, other) {
            (ScalarKind::Float32 | ScalarKind::Float64, o) if o.is_numeric() => Some(ScalarKind::Float64),
            (s, ScalarKind::Float32 | ScalarKind::Float64) if s.is_numeric() => Some(ScalarKind::Float64),
            (
                ScalarKind::Decimal { precision: p1, scale: s1 },
                ScalarKind::Decimal { precision: p2, scale: s2 },
            ) => Some(ScalarKind::Decimal {
                precision: p1.max(p2),
                scale: s1.max(s2),
            }),
            (d @ ScalarKind::Decimal { .. }, o) if o.is_integer() => Some(d),
            (s, d @ ScalarKind::Decimal { .. }) if s.is_integer() => Some(d),
            (a, b) => {
                let (ra, rb) = (a.integer_rank()?, b.integer_rank()?);
                Some(if ra >= rb { a } else { b })
            }
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql_type())
    }
}

/// Declared column of a relational source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ScalarKind,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}
