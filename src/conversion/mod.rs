//! Value encoding for the PostgreSQL wire protocol.
//!
//! Each DataRow cell is a 4-byte big-endian length followed by the value
//! bytes (-1 length for NULL). Columns declared with binary format use the
//! typed representations for `int2`/`int4`/`int8`/`float8`/`numeric`;
//! every other OID, and every text-format column, carries the canonical
//! textual form of the value as UTF-8 without a terminator.

mod numeric;

pub use numeric::encode_numeric;

use crate::error::{Error, Result};
use crate::protocol::types::{FieldDescription, FormatCode, Oid, oid};
use crate::value::Value;

/// Encode one cell of a DataRow under its column descriptor.
pub fn encode_cell(buf: &mut Vec<u8>, value: &Value, field: &FieldDescription) -> Result<()> {
    if matches!(value, Value::Null) {
        buf.extend_from_slice(&(-1_i32).to_be_bytes());
        return Ok(());
    }
    match field.format {
        FormatCode::Text => encode_text(buf, value),
        FormatCode::Binary => encode_binary(buf, value, field.type_oid),
    }
}

fn encode_text(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value.render_text() {
        Some(text) => {
            let bytes = text.as_bytes();
            buf.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
            buf.extend_from_slice(bytes);
        }
        None => buf.extend_from_slice(&(-1_i32).to_be_bytes()),
    }
    Ok(())
}

fn encode_binary(buf: &mut Vec<u8>, value: &Value, type_oid: Oid) -> Result<()> {
    match type_oid {
        oid::INT2 => {
            let v = i16::try_from(integer_value(value, type_oid)?)
                .map_err(|_| overflow(value, "INT2"))?;
            buf.extend_from_slice(&2_i32.to_be_bytes());
            buf.extend_from_slice(&v.to_be_bytes());
        }
        oid::INT4 => {
            let v = i32::try_from(integer_value(value, type_oid)?)
                .map_err(|_| overflow(value, "INT4"))?;
            buf.extend_from_slice(&4_i32.to_be_bytes());
            buf.extend_from_slice(&v.to_be_bytes());
        }
        oid::INT8 => {
            let v = integer_value(value, type_oid)?;
            buf.extend_from_slice(&8_i32.to_be_bytes());
            buf.extend_from_slice(&v.to_be_bytes());
        }
        oid::FLOAT8 => match value {
            Value::F64(v) => {
                buf.extend_from_slice(&8_i32.to_be_bytes());
                buf.extend_from_slice(&v.to_bits().to_be_bytes());
            }
            _ => return Err(type_mismatch(value, type_oid)),
        },
        oid::NUMERIC => match value {
            Value::Numeric(n) => encode_numeric(buf, n)?,
            _ => return Err(type_mismatch(value, type_oid)),
        },
        // Everything else is its canonical text, binary or not.
        _ => encode_text(buf, value)?,
    }
    Ok(())
}

fn integer_value(value: &Value, type_oid: Oid) -> Result<i64> {
    match value {
        Value::I16(v) => Ok(i64::from(*v)),
        Value::I32(v) => Ok(i64::from(*v)),
        Value::I64(v) => Ok(*v),
        _ => Err(type_mismatch(value, type_oid)),
    }
}

fn type_mismatch(value: &Value, type_oid: Oid) -> Error {
    Error::Encode(format!(
        "cannot encode {} value under oid {}",
        value.kind(),
        type_oid
    ))
}

fn overflow(value: &Value, target: &str) -> Error {
    Error::Encode(format!("{} value overflows {target}", value.kind()))
}
