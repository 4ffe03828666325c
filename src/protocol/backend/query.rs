//! Query-result backend messages.

use crate::conversion::encode_cell;
use crate::error::Result;
use crate::protocol::codec::MessageBuilder;
use crate::protocol::types::FieldDescription;
use crate::value::Value;

/// Write a RowDescription message for the given columns.
pub fn write_row_description(buf: &mut Vec<u8>, fields: &[FieldDescription]) {
    let mut msg = MessageBuilder::new(buf, super::msg_type::ROW_DESCRIPTION);
    msg.write_u16(fields.len() as u16);
    for field in fields {
        msg.write_cstr(&field.name);
        msg.write_u32(field.table_oid);
        msg.write_i16(field.column_attr);
        msg.write_u32(field.type_oid);
        msg.write_i16(field.type_size);
        msg.write_i32(field.type_mod);
        msg.write_i16(field.format as i16);
    }
    msg.finish();
}

/// Write a DataRow message.
///
/// Each cell is encoded under its column's OID and format code; `values`
/// must have the same length as `fields`. A kind/OID mismatch is an
/// encoder precondition violation and aborts the row.
pub fn write_data_row(
    buf: &mut Vec<u8>,
    fields: &[FieldDescription],
    values: &[Value],
) -> Result<()> {
    let mut msg = MessageBuilder::new(buf, super::msg_type::DATA_ROW);
    msg.write_u16(values.len() as u16);
    for (value, field) in values.iter().zip(fields) {
        encode_cell(msg.buf(), value, field)?;
    }
    msg.finish();
    Ok(())
}

/// Write a CommandComplete message with the given tag, e.g. `"SELECT 3"`.
pub fn write_command_complete(buf: &mut Vec<u8>, tag: &str) {
    let mut msg = MessageBuilder::new(buf, super::msg_type::COMMAND_COMPLETE);
    msg.write_cstr(tag);
    msg.finish();
}

/// Write an EmptyQueryResponse message.
pub fn write_empty_query_response(buf: &mut Vec<u8>) {
    MessageBuilder::new(buf, super::msg_type::EMPTY_QUERY_RESPONSE).finish();
}
