//! Byte-level framing primitives.
//!
//! Inbound frames are parsed with cursor-style readers that return the
//! decoded value together with the unread remainder of the slice; the
//! decoder owns the backing buffer and only calls them once a whole frame
//! is known to be present. Outbound messages are framed by
//! [`MessageBuilder`], which reserves the 4-byte length field and patches
//! it once the payload is complete. All integers are big-endian.

use zerocopy::FromBytes;

use crate::error::{Error, Result};

use super::types::I32BE;

/// Read a single octet, e.g. a message tag or a Describe kind.
#[inline]
pub fn read_u8(data: &[u8]) -> Result<(u8, &[u8])> {
    match data.split_first() {
        Some((&byte, rest)) => Ok((byte, rest)),
        None => Err(Error::Protocol("unexpected end of frame".into())),
    }
}

/// Read a 4-byte big-endian signed integer (length and protocol fields).
#[inline]
pub fn read_i32(data: &[u8]) -> Result<(i32, &[u8])> {
    let Some((head, rest)) = data.split_at_checked(4) else {
        return Err(Error::Protocol(format!(
            "need 4 bytes for an int32, frame has {}",
            data.len()
        )));
    };
    let value = I32BE::ref_from_bytes(head)?.get();
    Ok((value, rest))
}

/// Read a NUL-terminated byte string, returned without the terminator.
#[inline]
pub fn read_cstring(data: &[u8]) -> Result<(&[u8], &[u8])> {
    let Some(nul) = memchr::memchr(0, data) else {
        return Err(Error::Protocol("unterminated cstring in frame".into()));
    };
    Ok((&data[..nul], &data[nul + 1..]))
}

/// Read a NUL-terminated UTF-8 string.
#[inline]
pub fn read_cstr(data: &[u8]) -> Result<(&str, &[u8])> {
    let (bytes, rest) = read_cstring(data)?;
    match simdutf8::compat::from_utf8(bytes) {
        Ok(s) => Ok((s, rest)),
        Err(e) => Err(Error::Protocol(format!("cstring is not UTF-8: {e}"))),
    }
}

/// Builder for one tagged backend message.
///
/// Backend framing is `tag, int32 length, payload`, where the length counts
/// itself but not the tag. The length is unknown until the payload has been
/// written, so the builder pushes a placeholder up front and [`finish`]
/// patches it. Several messages of a request cycle share one outbound
/// buffer; each builder appends after whatever is already there.
///
/// [`finish`]: MessageBuilder::finish
pub struct MessageBuilder<'a> {
    buf: &'a mut Vec<u8>,
    length_at: usize,
}

impl<'a> MessageBuilder<'a> {
    /// Start a message with the given tag byte.
    pub fn new(buf: &'a mut Vec<u8>, tag: u8) -> Self {
        buf.push(tag);
        let length_at = buf.len();
        buf.extend_from_slice(&[0; 4]);
        Self { buf, length_at }
    }

    /// Mutable access to the underlying buffer, for payloads written by
    /// other encoders (DataRow cells).
    pub fn buf(&mut self) -> &mut Vec<u8> {
        self.buf
    }

    /// Write a u8.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write a big-endian i16.
    pub fn write_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a big-endian u16.
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a big-endian i32.
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a big-endian u32.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a NUL-terminated string.
    pub fn write_cstr(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    /// Patch the reserved length field, completing the message.
    pub fn finish(self) {
        let length = (self.buf.len() - self.length_at) as i32;
        self.buf[self.length_at..self.length_at + 4].copy_from_slice(&length.to_be_bytes());
    }
}
