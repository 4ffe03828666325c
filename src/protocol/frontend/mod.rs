//! PostgreSQL frontend (client → server) messages.
//!
//! The decoder is a streaming parser over an append-only byte buffer: each
//! call either reports that more bytes are needed or yields one message plus
//! the number of bytes it consumed. The caller owns the backing buffer and
//! compacts it after each successful decode.

pub mod startup;

use crate::error::{Error, Result};

use super::codec::{read_cstr, read_i32, read_u8};
use startup::{CANCEL_REQUEST_CODE, PROTOCOL_VERSION_3_0, SSL_REQUEST_CODE, StartupMessage};

/// Frontend message type bytes.
pub mod msg_type {
    /// Query (simple query protocol)
    pub const QUERY: u8 = b'Q';
    /// Parse (extended query protocol)
    pub const PARSE: u8 = b'P';
    /// Bind (extended query protocol)
    pub const BIND: u8 = b'B';
    /// Describe (extended query protocol)
    pub const DESCRIBE: u8 = b'D';
    /// Execute (extended query protocol)
    pub const EXECUTE: u8 = b'E';
    /// Flush
    pub const FLUSH: u8 = b'H';
    /// Sync (extended query protocol)
    pub const SYNC: u8 = b'S';
    /// Terminate
    pub const TERMINATE: u8 = b'X';
}

/// A decoded frontend message.
///
/// Payloads borrow from the inbound buffer; nothing is copied during
/// decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendMessage<'a> {
    /// Request for TLS; answered with a single `'N'` byte, after which the
    /// client sends a real StartupMessage.
    SslRequest,
    /// Protocol 3.0 startup with key/value parameters.
    Startup(StartupMessage<'a>),
    /// Simple query.
    Query(&'a str),
    /// Parse; only the query text is retained, parameter type OIDs are
    /// ignored because this server binds no parameters.
    Parse {
        /// SQL text of the prepared statement
        query: &'a str,
    },
    /// Bind; the payload is opaque to this server.
    Bind,
    /// Describe a statement (`'S'`) or portal (`'P'`).
    Describe {
        /// `b'S'` or `b'P'`
        kind: u8,
        /// Statement or portal name
        name: &'a str,
    },
    /// Execute; the payload (portal name, row limit) is opaque.
    Execute,
    /// Flush transport buffers.
    Flush,
    /// End of an extended-query pipeline.
    Sync,
    /// Close the connection.
    Terminate,
}

/// Result of one decoder call.
#[derive(Debug)]
pub enum Decode<'a> {
    /// The buffer holds no complete frame yet; read more bytes.
    Incomplete,
    /// A complete frame with an unrecognised tag was skipped.
    Skipped {
        /// Bytes to drop from the front of the buffer
        consumed: usize,
    },
    /// A complete message.
    Message {
        /// The decoded message
        message: FrontendMessage<'a>,
        /// Bytes to drop from the front of the buffer
        consumed: usize,
    },
}

/// Streaming decoder for frontend messages.
///
/// The decoder has two phases. Before the StartupMessage, frames carry no
/// type byte and the protocol field selects the variant; afterwards every
/// frame is `tag, length, payload`. An SSLRequest does not end the
/// pre-startup phase: the client sends its real StartupMessage after the
/// `'N'` refusal.
#[derive(Debug, Default)]
pub struct FrontendDecoder {
    startup_seen: bool,
}

impl FrontendDecoder {
    /// Create a decoder in the pre-startup phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a StartupMessage has been decoded on this connection.
    pub fn startup_seen(&self) -> bool {
        self.startup_seen
    }

    /// Try to decode one message from the front of `data`.
    ///
    /// Underflow is not an error: [`Decode::Incomplete`] is returned and no
    /// state changes. A malformed frame (bad protocol number, bad length,
    /// truncated cstring) is a fatal [`Error::Protocol`].
    pub fn decode<'a>(&mut self, data: &'a [u8]) -> Result<Decode<'a>> {
        if self.startup_seen {
            self.decode_message(data)
        } else {
            self.decode_startup(data)
        }
    }

    fn decode_startup<'a>(&mut self, data: &'a [u8]) -> Result<Decode<'a>> {
        let Some(header) = data.get(..4) else {
            return Ok(Decode::Incomplete);
        };
        let (length, _) = read_i32(header)?;
        if length < 8 {
            return Err(Error::Protocol(format!(
                "startup frame length too small: {length}"
            )));
        }
        let length = length as usize;
        let Some(frame) = data.get(..length) else {
            return Ok(Decode::Incomplete);
        };

        let (protocol, payload) = read_i32(&frame[4..])?;
        match protocol {
            SSL_REQUEST_CODE => Ok(Decode::Message {
                message: FrontendMessage::SslRequest,
                consumed: length,
            }),
            PROTOCOL_VERSION_3_0 => {
                let startup = StartupMessage::parse(protocol, payload)?;
                self.startup_seen = true;
                Ok(Decode::Message {
                    message: FrontendMessage::Startup(startup),
                    consumed: length,
                })
            }
            CANCEL_REQUEST_CODE => Err(Error::Unsupported("cancel request".into())),
            _ => Err(Error::Protocol(format!(
                "unknown startup protocol: {protocol}"
            ))),
        }
    }

    fn decode_message<'a>(&mut self, data: &'a [u8]) -> Result<Decode<'a>> {
        let Some(header) = data.get(..5) else {
            return Ok(Decode::Incomplete);
        };
        let (tag, rest) = read_u8(header)?;
        let (length, _) = read_i32(rest)?;
        if length < 4 {
            return Err(Error::Protocol(format!(
                "message length too small: {length}"
            )));
        }
        let total = 1 + length as usize;
        let Some(frame) = data.get(..total) else {
            return Ok(Decode::Incomplete);
        };
        let payload = &frame[5..];

        let message = match tag {
            msg_type::QUERY => {
                let (query, _) = read_cstr(payload)?;
                FrontendMessage::Query(query)
            }
            msg_type::PARSE => {
                let (_name, rest) = read_cstr(payload)?;
                let (query, _) = read_cstr(rest)?;
                FrontendMessage::Parse { query }
            }
            msg_type::BIND => FrontendMessage::Bind,
            msg_type::DESCRIBE => {
                let (kind, rest) = read_u8(payload)?;
                let (name, _) = read_cstr(rest)?;
                FrontendMessage::Describe { kind, name }
            }
            msg_type::EXECUTE => FrontendMessage::Execute,
            msg_type::FLUSH => FrontendMessage::Flush,
            msg_type::SYNC => FrontendMessage::Sync,
            msg_type::TERMINATE => FrontendMessage::Terminate,
            _ => {
                tracing::debug!(tag = %(tag as char), "skipping unrecognised frontend message");
                return Ok(Decode::Skipped { consumed: total });
            }
        };

        Ok(Decode::Message {
            message,
            consumed: total,
        })
    }
}
