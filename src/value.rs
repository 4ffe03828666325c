//! Row cell values.
//!
//! The adapter yields heterogeneous cells; `Value` is the tagged variant the
//! encoders dispatch on, together with the column's declared OID.

use std::fmt;

use rust_decimal::Decimal;

use crate::protocol::types::{Oid, oid};

/// Arbitrary-precision decimal with PostgreSQL's special states.
///
/// `rust_decimal::Decimal` carries the sign, coefficient and base-10
/// exponent of a finite value; the extra variants cover the states NUMERIC
/// can express on the wire. NaN has a binary encoding; the infinities are
/// representable here but rejected by the binary encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeric {
    /// Not-a-number
    NaN,
    /// Positive infinity
    Infinity,
    /// Negative infinity
    NegInfinity,
    /// A finite decimal value
    Finite(Decimal),
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::NaN => f.write_str("NaN"),
            Numeric::Infinity => f.write_str("Infinity"),
            Numeric::NegInfinity => f.write_str("-Infinity"),
            Numeric::Finite(d) => d.fmt(f),
        }
    }
}

impl From<Decimal> for Numeric {
    fn from(value: Decimal) -> Self {
        Numeric::Finite(value)
    }
}

/// A single cell of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL, emitted as the -1 length sentinel
    Null,
    /// 16-bit integer
    I16(i16),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 64-bit IEEE-754 float
    F64(f64),
    /// Arbitrary-precision decimal
    Numeric(Numeric),
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
}

impl Value {
    /// Short kind name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::I16(_) | Value::I32(_) | Value::I64(_) => "integer",
            Value::F64(_) => "float",
            Value::Numeric(_) => "decimal",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Whether this value can be encoded under a column with the given OID.
    ///
    /// Integer-family OIDs accept integer kinds, `float8`/`float4` accept
    /// floats, `numeric` accepts decimals, `bytea` accepts bytes, and the
    /// text-like OIDs accept anything via its canonical textual form. NULL
    /// is compatible with every column.
    pub fn compatible_with(&self, type_oid: Oid) -> bool {
        match type_oid {
            oid::INT2 | oid::INT4 | oid::INT8 => {
                matches!(self, Value::Null | Value::I16(_) | Value::I32(_) | Value::I64(_))
            }
            oid::FLOAT4 | oid::FLOAT8 => matches!(self, Value::Null | Value::F64(_)),
            oid::NUMERIC => matches!(self, Value::Null | Value::Numeric(_)),
            oid::BYTEA => matches!(self, Value::Null | Value::Bytes(_)),
            _ => true,
        }
    }

    /// Canonical textual form of a non-NULL value: integers in decimal,
    /// floats with PostgreSQL's special-value spellings, decimals in fixed
    /// point, text unchanged, bytes in `\x` hex.
    pub fn render_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::I16(v) => Some(v.to_string()),
            Value::I32(v) => Some(v.to_string()),
            Value::I64(v) => Some(v.to_string()),
            Value::F64(v) => Some(render_float(*v)),
            Value::Numeric(n) => Some(n.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Bytes(b) => Some(render_hex(b)),
        }
    }
}

fn render_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "Infinity".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        v.to_string()
    }
}

fn render_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::I16(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Numeric(Numeric::Finite(value))
    }
}

impl From<Numeric> for Value {
    fn from(value: Numeric) -> Self {
        Value::Numeric(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
