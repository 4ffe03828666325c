//! Error types for wiretable.

use thiserror::Error;

/// Result type for wiretable operations.
pub type Result<T> = core::result::Result<T, Error>;

/// SQLSTATE codes this server reports to clients.
pub mod sqlstate {
    /// feature_not_supported
    pub const FEATURE_NOT_SUPPORTED: &str = "0A000";
    /// syntax_error
    pub const SYNTAX_ERROR: &str = "42601";
    /// undefined_table
    pub const UNDEFINED_TABLE: &str = "42P01";
    /// protocol_violation
    pub const PROTOCOL_VIOLATION: &str = "08P01";
}

/// Error type for wiretable.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol error (malformed frame, bad length, truncated cstring, etc.)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Unsupported protocol feature (cancel request, TLS upgrade, ...)
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Value encode error (value kind incompatible with the column OID)
    #[error("Encode error: {0}")]
    Encode(String),

    /// Invalid usage (bad adapter configuration, mismatched row shape)
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),

    /// A rejected request the client must be told about, carrying a SQLSTATE.
    #[error("{message} (SQLSTATE {code})")]
    Rejected {
        /// 5-character SQLSTATE code
        code: &'static str,
        /// Primary error message
        message: String,
    },
}

impl Error {
    /// Create a query rejection with a SQLSTATE code.
    pub fn rejected(code: &'static str, message: impl Into<String>) -> Self {
        Error::Rejected {
            code,
            message: message.into(),
        }
    }

    /// The SQLSTATE and message to report inside an ErrorResponse, if this
    /// error is recoverable. `None` means the error is fatal and the
    /// transport must be closed instead.
    ///
    /// Only [`Error::Rejected`] is ever reported back. Decoder failures
    /// (malformed frames, the unimplemented CancelRequest) never reach the
    /// session; they propagate out of the connection task and close the
    /// transport with nothing written.
    pub fn client_report(&self) -> Option<(&'static str, String)> {
        match self {
            Error::Rejected { code, message } => Some((code, message.clone())),
            _ => None,
        }
    }
}

impl<Src: std::fmt::Debug, Dst: std::fmt::Debug + ?Sized> From<zerocopy::error::CastError<Src, Dst>>
    for Error
{
    fn from(err: zerocopy::error::CastError<Src, Dst>) -> Self {
        Error::Protocol(format!("zerocopy cast error: {err:?}"))
    }
}
