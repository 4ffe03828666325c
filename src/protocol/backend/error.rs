//! ErrorResponse encoding.

use crate::protocol::codec::MessageBuilder;

/// Error field type codes from the PostgreSQL protocol.
pub mod field_type {
    /// Severity (localized)
    pub const SEVERITY: u8 = b'S';
    /// SQLSTATE code
    pub const CODE: u8 = b'C';
    /// Primary message
    pub const MESSAGE: u8 = b'M';
}

/// Write an ErrorResponse message.
///
/// The payload is a list of (field code, cstring) pairs terminated by a
/// single NUL. Only the always-present fields are emitted: severity,
/// SQLSTATE, message.
pub fn write_error_response(buf: &mut Vec<u8>, severity: &str, code: &str, message: &str) {
    let mut msg = MessageBuilder::new(buf, super::msg_type::ERROR_RESPONSE);
    for (field, value) in [
        (field_type::SEVERITY, severity),
        (field_type::CODE, code),
        (field_type::MESSAGE, message),
    ] {
        msg.write_u8(field);
        msg.write_cstr(value);
    }
    msg.write_u8(0);
    msg.finish();
}
