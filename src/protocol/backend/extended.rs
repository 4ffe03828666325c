//! Extended-query backend messages.

use crate::protocol::codec::MessageBuilder;
use crate::protocol::types::Oid;

/// Write a ParseComplete message.
pub fn write_parse_complete(buf: &mut Vec<u8>) {
    MessageBuilder::new(buf, super::msg_type::PARSE_COMPLETE).finish();
}

/// Write a BindComplete message.
pub fn write_bind_complete(buf: &mut Vec<u8>) {
    MessageBuilder::new(buf, super::msg_type::BIND_COMPLETE).finish();
}

/// Write a ParameterDescription message for the given parameter type OIDs.
///
/// This server never infers parameters, so the slice is empty in practice,
/// but the count is taken from the slice rather than hard-coded.
pub fn write_parameter_description(buf: &mut Vec<u8>, param_oids: &[Oid]) {
    let mut msg = MessageBuilder::new(buf, super::msg_type::PARAMETER_DESCRIPTION);
    msg.write_u16(param_oids.len() as u16);
    for &oid in param_oids {
        msg.write_u32(oid);
    }
    msg.finish();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complete() {
        let mut buf = Vec::new();
        write_parse_complete(&mut buf);
        assert_eq!(buf, [b'1', 0, 0, 0, 4]);
    }

    #[test]
    fn test_bind_complete() {
        let mut buf = Vec::new();
        write_bind_complete(&mut buf);
        assert_eq!(buf, [b'2', 0, 0, 0, 4]);
    }

    #[test]
    fn test_parameter_description_empty() {
        let mut buf = Vec::new();
        write_parameter_description(&mut buf, &[]);
        assert_eq!(buf, [b't', 0, 0, 0, 6, 0, 0]);
    }

    #[test]
    fn test_parameter_description_with_oids() {
        let mut buf = Vec::new();
        write_parameter_description(&mut buf, &[23, 25]);
        assert_eq!(
            buf,
            [b't', 0, 0, 0, 14, 0, 2, 0, 0, 0, 23, 0, 0, 0, 25]
        );
    }
}
