//! Pre-startup frame parsing.
//!
//! Before the StartupMessage arrives, frames have no type byte: the layout
//! is `int32 length, int32 protocol, payload`, and the protocol field is
//! overloaded to select SSL/cancel pseudo-versions.

use crate::error::Result;
use crate::protocol::codec::read_cstr;

/// Protocol version 3.0 (0x00030000)
pub const PROTOCOL_VERSION_3_0: i32 = 196608;

/// SSL request code
pub const SSL_REQUEST_CODE: i32 = 80877103;

/// Cancel request code
pub const CANCEL_REQUEST_CODE: i32 = 80877102;

/// StartupMessage parameters: alternating key/value cstrings terminated by
/// an empty key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupMessage<'a> {
    /// Protocol version requested by the client
    pub protocol: i32,
    /// Startup parameters ("user", "database", ...)
    pub parameters: Vec<(&'a str, &'a str)>,
}

impl<'a> StartupMessage<'a> {
    /// Parse the parameter list from the payload after the protocol field.
    ///
    /// An empty payload is accepted: minimal clients send an 8-byte startup
    /// frame with no parameters at all, not even the terminating NUL.
    pub fn parse(protocol: i32, payload: &'a [u8]) -> Result<Self> {
        let mut parameters = Vec::new();
        let mut data = payload;

        while !data.is_empty() {
            let (key, rest) = read_cstr(data)?;
            if key.is_empty() {
                break;
            }
            let (value, rest) = read_cstr(rest)?;
            parameters.push((key, value));
            data = rest;
        }

        Ok(Self {
            protocol,
            parameters,
        })
    }

    /// Look up a startup parameter by name.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.parameters
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}
