//! Common PostgreSQL wire protocol types.

pub(crate) use zerocopy::byteorder::big_endian::I32 as I32BE;

/// PostgreSQL Object Identifier (OID)
pub type Oid = u32;

/// Data format code in PostgreSQL protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum FormatCode {
    /// Text format (human-readable)
    #[default]
    Text = 0,
    /// Binary format (type-specific packed representation)
    Binary = 1,
}

impl FormatCode {
    /// Create a FormatCode from a raw u16 value.
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => FormatCode::Binary,
            _ => FormatCode::Text,
        }
    }
}

impl From<u16> for FormatCode {
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

/// Transaction status reported in ReadyForQuery.
///
/// This server never opens transaction blocks, so `Idle` is reported for
/// every successful cycle and `Failed` after an in-cycle error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TransactionStatus {
    /// Idle (not in transaction block)
    #[default]
    Idle = b'I',
    /// In transaction block
    InTransaction = b'T',
    /// In failed transaction block
    Failed = b'E',
}

/// Well-known PostgreSQL type OIDs recognised by this server.
pub mod oid {
    use super::Oid;

    /// boolean, format 't'/'f'
    pub const BOOL: Oid = 16;
    /// variable-length byte string
    pub const BYTEA: Oid = 17;
    /// ~18 digit integer, 8-byte storage
    pub const INT8: Oid = 20;
    /// -32 thousand to 32 thousand, 2-byte storage
    pub const INT2: Oid = 21;
    /// -2 billion to 2 billion integer, 4-byte storage
    pub const INT4: Oid = 23;
    /// variable-length string, no limit specified
    pub const TEXT: Oid = 25;
    /// single-precision floating point number, 4-byte storage
    pub const FLOAT4: Oid = 700;
    /// double-precision floating point number, 8-byte storage
    pub const FLOAT8: Oid = 701;
    /// pseudo-type representing an undetermined type
    pub const UNKNOWN: Oid = 705;
    /// 'varchar(length)' non-blank-padded string, variable storage length
    pub const VARCHAR: Oid = 1043;
    /// 'numeric(precision, scale)' arbitrary precision number
    pub const NUMERIC: Oid = 1700;
}

/// Returns the fixed wire size of a type, or -1 for variable-length types.
pub fn type_size(type_oid: Oid) -> i16 {
    match type_oid {
        oid::BOOL => 1,
        oid::INT2 => 2,
        oid::INT4 | oid::FLOAT4 => 4,
        oid::INT8 | oid::FLOAT8 => 8,
        _ => -1,
    }
}

/// Column metadata for one field of the virtual table.
///
/// Plain data, no behaviour: encoders dispatch on `type_oid` and the
/// RowDescription writer serialises the record as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    /// Field name
    pub name: String,
    /// Table OID (0 for a synthetic column)
    pub table_oid: Oid,
    /// Column attribute number (0 for a synthetic column)
    pub column_attr: i16,
    /// Data type OID
    pub type_oid: Oid,
    /// Type size (-1 for variable)
    pub type_size: i16,
    /// Type modifier (-1 for none)
    pub type_mod: i32,
    /// Format code for values in this column
    pub format: FormatCode,
}

impl FieldDescription {
    /// Create a synthetic column with the given type and format.
    pub fn new(name: impl Into<String>, type_oid: Oid, format: FormatCode) -> Self {
        Self {
            name: name.into(),
            table_oid: 0,
            column_attr: 0,
            type_oid,
            type_size: type_size(type_oid),
            type_mod: -1,
            format,
        }
    }

    /// A text column (OID 25, text format) — the default when nothing is
    /// known about the underlying value.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, oid::TEXT, FormatCode::Text)
    }

    /// A column carrying its binary wire representation.
    pub fn binary(name: impl Into<String>, type_oid: Oid) -> Self {
        Self::new(name, type_oid, FormatCode::Binary)
    }
}
