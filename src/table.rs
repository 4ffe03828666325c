//! Row/column adapters.
//!
//! The codec never looks at data directly; it asks an adapter what columns
//! the virtual table exposes and which rows to serialise for a query.

use crate::error::{Error, Result};
use crate::protocol::types::FieldDescription;
use crate::value::Value;

/// A row of cell values, positionally matching the adapter's columns.
pub type Row = Vec<Value>;

/// Contract between the codec and a row source.
pub trait Table: Send + Sync {
    /// The table name this adapter answers to. When declared, the `FROM`
    /// target of incoming queries is checked against it.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Column descriptors, fixed for the life of the connection. Every row
    /// must match these positionally.
    fn columns(&self) -> &[FieldDescription];

    /// Rows to serialise for the given SQL text. Implementations may ignore
    /// the text; the built-in [`MemoryTable`] does.
    fn rows(&self, sql: Option<&str>) -> Result<Vec<Row>>;
}

/// An adapter over a fixed in-memory row set.
///
/// Row arity and value kinds are validated once at construction against the
/// declared columns, so serialisation cannot hit a kind/OID mismatch later.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    name: Option<String>,
    fields: Vec<FieldDescription>,
    rows: Vec<Row>,
}

impl MemoryTable {
    /// Create a table from column descriptors and rows.
    pub fn new(fields: Vec<FieldDescription>, rows: Vec<Row>) -> Result<Self> {
        for (index, row) in rows.iter().enumerate() {
            if row.len() != fields.len() {
                return Err(Error::InvalidUsage(format!(
                    "row {index} has {} values, table has {} columns",
                    row.len(),
                    fields.len()
                )));
            }
            for (value, field) in row.iter().zip(&fields) {
                if !value.compatible_with(field.type_oid) {
                    return Err(Error::InvalidUsage(format!(
                        "row {index}: {} value is not encodable in column '{}' (oid {})",
                        value.kind(),
                        field.name,
                        field.type_oid
                    )));
                }
            }
        }
        Ok(Self {
            name: None,
            fields,
            rows,
        })
    }

    /// Declare the table name this adapter answers to.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Table for MemoryTable {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn columns(&self) -> &[FieldDescription] {
        &self.fields
    }

    fn rows(&self, _sql: Option<&str>) -> Result<Vec<Row>> {
        Ok(self.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::oid;

    fn user_fields() -> Vec<FieldDescription> {
        vec![
            FieldDescription::binary("id", oid::INT4),
            FieldDescription::text("name"),
        ]
    }

    #[test]
    fn test_valid_rows() {
        let table = MemoryTable::new(
            user_fields(),
            vec![
                vec![Value::I32(1), Value::from("John")],
                vec![Value::Null, Value::Null],
            ],
        )
        .unwrap()
        .with_name("users");

        assert_eq!(table.name(), Some("users"));
        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.rows(None).unwrap().len(), 2);
        // The SQL text is ignored.
        assert_eq!(table.rows(Some("SELECT 1")).unwrap().len(), 2);
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let result = MemoryTable::new(user_fields(), vec![vec![Value::I32(1)]]);
        assert!(matches!(result, Err(Error::InvalidUsage(_))));
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let result = MemoryTable::new(
            user_fields(),
            vec![vec![Value::from("not an int"), Value::from("John")]],
        );
        assert!(matches!(result, Err(Error::InvalidUsage(_))));
    }

    #[test]
    fn test_empty_table_allowed() {
        let table = MemoryTable::new(user_fields(), vec![]).unwrap();
        assert!(table.rows(None).unwrap().is_empty());
    }
}
