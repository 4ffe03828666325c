//! PostgreSQL backend (server → client) messages.
//!
//! Every message is a 1-byte type tag followed by a 4-byte big-endian
//! length that includes itself but not the tag. The single exception is the
//! pre-startup SSL refusal, which is the bare byte `'N'`.

pub mod error;
pub mod extended;
pub mod query;
pub mod startup;

pub use error::write_error_response;
pub use extended::{write_bind_complete, write_parameter_description, write_parse_complete};
pub use query::{
    write_command_complete, write_data_row, write_empty_query_response, write_row_description,
};
pub use startup::{
    write_authentication_ok, write_backend_key_data, write_parameter_status,
    write_ready_for_query, write_ssl_refusal,
};

/// Backend message type bytes.
pub mod msg_type {
    /// Authentication message
    pub const AUTHENTICATION: u8 = b'R';
    /// BackendKeyData
    pub const BACKEND_KEY_DATA: u8 = b'K';
    /// ParameterStatus
    pub const PARAMETER_STATUS: u8 = b'S';
    /// ReadyForQuery
    pub const READY_FOR_QUERY: u8 = b'Z';
    /// RowDescription
    pub const ROW_DESCRIPTION: u8 = b'T';
    /// DataRow
    pub const DATA_ROW: u8 = b'D';
    /// CommandComplete
    pub const COMMAND_COMPLETE: u8 = b'C';
    /// EmptyQueryResponse
    pub const EMPTY_QUERY_RESPONSE: u8 = b'I';
    /// ErrorResponse
    pub const ERROR_RESPONSE: u8 = b'E';
    /// ParseComplete
    pub const PARSE_COMPLETE: u8 = b'1';
    /// BindComplete
    pub const BIND_COMPLETE: u8 = b'2';
    /// ParameterDescription
    pub const PARAMETER_DESCRIPTION: u8 = b't';
}
