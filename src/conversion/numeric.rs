//! PostgreSQL NUMERIC binary encoding.
//!
//! NUMERIC binary format:
//! - ndigits: i16 - number of base-10000 digits
//! - weight: i16 - base-10000 position of the first digit
//! - sign: u16 - 0x0000 = positive, 0x4000 = negative, 0xC000 = NaN
//! - dscale: u16 - display scale (decimal places)
//! - digits: [u16] - base-10000 digits, most significant first
//!
//! Semantic value when not NaN:
//! `sign * sum(digits[i] * 10000^(weight - i))`.

use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::value::Numeric;

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NBASE: u128 = 10000;

/// Encode a NUMERIC value as a length-prefixed binary blob.
///
/// The 4-byte length prefix expected by the DataRow encoder is included,
/// covering the 8-byte header plus the digits. Infinity has no binary
/// NUMERIC representation and is rejected.
pub fn encode_numeric(buf: &mut Vec<u8>, value: &Numeric) -> Result<()> {
    match value {
        Numeric::Infinity | Numeric::NegInfinity => {
            Err(Error::Encode("infinity has no NUMERIC binary encoding".into()))
        }
        Numeric::NaN => {
            write_numeric(buf, &[], 0, NUMERIC_NAN, 0);
            Ok(())
        }
        Numeric::Finite(d) => encode_finite(buf, d),
    }
}

fn encode_finite(buf: &mut Vec<u8>, value: &Decimal) -> Result<()> {
    // rust_decimal stores coefficient * 10^(-scale); scale is the number of
    // fractional base-10 digits, i.e. the NUMERIC dscale.
    let dscale = value.scale() as u16;
    let coeff = value.mantissa().unsigned_abs();

    if coeff == 0 {
        // Normalise -0 to a positive zero, keeping the declared scale.
        write_numeric(buf, &[], 0, NUMERIC_POS, dscale);
        return Ok(());
    }

    // Pad the coefficient so the fractional part aligns on a base-10000
    // boundary, then peel off base-10000 digits.
    let scale_groups = u32::from(dscale).div_ceil(4);
    let pad = scale_groups * 4 - u32::from(dscale);
    let mut remaining = coeff * 10u128.pow(pad);

    let mut digits: Vec<u16> = Vec::new();
    while remaining > 0 {
        digits.push((remaining % NBASE) as u16);
        remaining /= NBASE;
    }
    digits.reverse();

    let mut weight = digits.len() as i32 - scale_groups as i32 - 1;

    // Strip leading zero digits, moving the weight down with each one, and
    // trailing zero digits, which do not affect the weight.
    let leading = digits.iter().take_while(|&&d| d == 0).count();
    digits.drain(..leading);
    weight -= leading as i32;
    while digits.last() == Some(&0) {
        digits.pop();
    }

    let sign = if value.is_sign_negative() {
        NUMERIC_NEG
    } else {
        NUMERIC_POS
    };
    write_numeric(buf, &digits, weight as i16, sign, dscale);
    Ok(())
}

fn write_numeric(buf: &mut Vec<u8>, digits: &[u16], weight: i16, sign: u16, dscale: u16) {
    let payload_len = 8 + digits.len() * 2;
    buf.extend_from_slice(&(payload_len as i32).to_be_bytes());
    buf.extend_from_slice(&(digits.len() as i16).to_be_bytes());
    buf.extend_from_slice(&weight.to_be_bytes());
    buf.extend_from_slice(&sign.to_be_bytes());
    buf.extend_from_slice(&dscale.to_be_bytes());
    for digit in digits {
        buf.extend_from_slice(&digit.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn encode(s: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_numeric(&mut buf, &Numeric::Finite(Decimal::from_str(s).unwrap())).unwrap();
        buf
    }

    // Decode a length-prefixed NUMERIC blob back to (value, dscale).
    fn decode(bytes: &[u8]) -> (Decimal, u16) {
        let len = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        assert_eq!(len, bytes.len() - 4, "length prefix covers header + digits");
        let body = &bytes[4..];

        let ndigits = i16::from_be_bytes([body[0], body[1]]) as usize;
        let weight = i16::from_be_bytes([body[2], body[3]]) as i32;
        let sign = u16::from_be_bytes([body[4], body[5]]);
        let dscale = u16::from_be_bytes([body[6], body[7]]);
        assert_ne!(sign, NUMERIC_NAN);

        let mut coeff: i128 = 0;
        for i in 0..ndigits {
            let digit = u16::from_be_bytes([body[8 + i * 2], body[9 + i * 2]]);
            assert!(digit < 10000);
            coeff = coeff * 10000 + i128::from(digit);
        }
        if sign == NUMERIC_NEG {
            coeff = -coeff;
        }

        // value = coeff * 10000^(weight - ndigits + 1)
        let exponent = (weight - ndigits as i32 + 1) * 4;
        let mut value = Decimal::from_i128_with_scale(coeff, 0);
        if exponent >= 0 {
            for _ in 0..exponent {
                value = value.checked_mul(Decimal::TEN).unwrap();
            }
        } else {
            value.set_scale((-exponent) as u32).unwrap();
        }
        (value, dscale)
    }

    #[test]
    fn test_zero() {
        let buf = encode("0");
        assert_eq!(buf, [0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_zero_with_scale_keeps_dscale() {
        let buf = encode("0.00");
        // ndigits=0, weight=0, sign=positive, dscale=2
        assert_eq!(buf, [0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn test_negative_zero_normalises_sign() {
        let buf = encode("-0");
        assert_eq!(buf, [0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_three_point_five_zero() {
        // 3.50: coefficient 350, dscale 2, pad 2 -> 35000 -> [3, 5000]
        let buf = encode("3.50");
        assert_eq!(
            buf,
            [
                0, 0, 0, 12, // length
                0, 2, // ndigits
                0, 0, // weight
                0, 0, // sign
                0, 2, // dscale
                0, 3, // digit 3
                0x13, 0x88, // digit 5000
            ]
        );
    }

    #[test]
    fn test_negative_123_45() {
        // -123.45: coefficient 12345, pad 2 -> 1234500 -> [123, 4500]
        let buf = encode("-123.45");
        assert_eq!(
            buf,
            [
                0, 0, 0, 12, // length
                0, 2, // ndigits
                0, 0, // weight
                0x40, 0, // sign: negative
                0, 2, // dscale
                0, 0x7B, // digit 123
                0x11, 0x94, // digit 4500
            ]
        );
    }

    #[test]
    fn test_integer_weight() {
        // 12345: digits [1, 2345], weight 1
        let (value, dscale) = decode(&encode("12345"));
        assert_eq!(value, Decimal::from(12345));
        assert_eq!(dscale, 0);

        let buf = encode("12345");
        assert_eq!(&buf[4..6], &2_i16.to_be_bytes()); // ndigits
        assert_eq!(&buf[6..8], &1_i16.to_be_bytes()); // weight
    }

    #[test]
    fn test_trailing_zero_digit_stripped() {
        // 1000000 -> raw digits [100, 0]; the trailing zero group is
        // dropped without touching the weight.
        let buf = encode("1000000");
        assert_eq!(&buf[4..6], &1_i16.to_be_bytes()); // ndigits
        assert_eq!(&buf[6..8], &1_i16.to_be_bytes()); // weight
        assert_eq!(&buf[12..14], &100_u16.to_be_bytes());

        let (value, _) = decode(&buf);
        assert_eq!(value, Decimal::from(1_000_000));
    }

    #[test]
    fn test_small_fraction_negative_weight() {
        // 0.0001: digits [1], weight -1
        let buf = encode("0.0001");
        assert_eq!(&buf[4..6], &1_i16.to_be_bytes()); // ndigits
        assert_eq!(&buf[6..8], &(-1_i16).to_be_bytes()); // weight
        assert_eq!(&buf[10..12], &4_u16.to_be_bytes()); // dscale
    }

    #[test]
    fn test_nan() {
        let mut buf = Vec::new();
        encode_numeric(&mut buf, &Numeric::NaN).unwrap();
        assert_eq!(buf, [0, 0, 0, 8, 0, 0, 0, 0, 0xC0, 0, 0, 0]);
    }

    #[test]
    fn test_infinity_rejected() {
        let mut buf = Vec::new();
        assert!(matches!(
            encode_numeric(&mut buf, &Numeric::Infinity),
            Err(Error::Encode(_))
        ));
        assert!(matches!(
            encode_numeric(&mut buf, &Numeric::NegInfinity),
            Err(Error::Encode(_))
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_roundtrip_preserves_value_and_dscale() {
        for s in [
            "0", "1", "-1", "3.50", "-123.45", "4.125", "100.50", "0.0001", "9999", "10000",
            "12345.6789", "99999999.99999999", "0.5", "-0.00005", "79228162514264337593543950335",
        ] {
            let original = Decimal::from_str(s).unwrap();
            let (value, dscale) = decode(&encode(s));
            assert_eq!(value, original, "value mismatch for {s}");
            assert_eq!(u32::from(dscale), original.scale(), "dscale mismatch for {s}");
        }
    }
}
