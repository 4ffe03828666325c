//! Startup-phase backend messages.

use crate::protocol::codec::MessageBuilder;
use crate::protocol::types::TransactionStatus;

/// Write the single refusal byte sent in answer to an SSLRequest.
///
/// This is the only backend reply without a tag/length frame; the client
/// continues in cleartext with a real StartupMessage.
pub fn write_ssl_refusal(buf: &mut Vec<u8>) {
    buf.push(b'N');
}

/// Write an AuthenticationOk message.
pub fn write_authentication_ok(buf: &mut Vec<u8>) {
    let mut msg = MessageBuilder::new(buf, super::msg_type::AUTHENTICATION);
    msg.write_u32(0);
    msg.finish();
}

/// Write a ParameterStatus message.
pub fn write_parameter_status(buf: &mut Vec<u8>, name: &str, value: &str) {
    let mut msg = MessageBuilder::new(buf, super::msg_type::PARAMETER_STATUS);
    msg.write_cstr(name);
    msg.write_cstr(value);
    msg.finish();
}

/// Write a BackendKeyData message with this connection's cancellation key.
pub fn write_backend_key_data(buf: &mut Vec<u8>, pid: u32, secret_key: u32) {
    let mut msg = MessageBuilder::new(buf, super::msg_type::BACKEND_KEY_DATA);
    msg.write_u32(pid);
    msg.write_u32(secret_key);
    msg.finish();
}

/// Write a ReadyForQuery message.
///
/// Clients use this as the fence ending a request/response cycle.
pub fn write_ready_for_query(buf: &mut Vec<u8>, status: TransactionStatus) {
    let mut msg = MessageBuilder::new(buf, super::msg_type::READY_FOR_QUERY);
    msg.write_u8(status as u8);
    msg.finish();
}
