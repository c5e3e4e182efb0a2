//! Base-128 varints, least significant group first.
//!
//! Signed integers are sign-extended to 64 bits before encoding (protobuf
//! `int32`/`int64`), so negative values always take 10 bytes. No zig-zag.

use crate::Error;
use crate::Result;

/// Longest possible encoding of a `u64`.
pub const MAX_LEN: usize = 10;

/// Appends the varint encoding of `v` to `buf`.
#[inline]
pub fn encode(mut v: u64, buf: &mut Vec<u8>) {
    while v >= 0x80 {
        buf.push((v as u8 & 0x7F) | 0x80);
        v >>= 7;
    }
    buf.push(v as u8);
}

/// Number of bytes `encode(v)` will write.
#[inline]
pub const fn encoded_len(v: u64) -> usize {
    // 1 byte per started group of 7 bits, minimum 1.
    let bits = 64 - (v | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decodes one varint from the front of `buf`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in buf.iter().enumerate().take(MAX_LEN) {
        let group = (byte & 0x7F) as u64;
        // The 10th byte may only carry the single top bit.
        if i == MAX_LEN - 1 && byte > 0x01 {
            return Err(Error::VarintOverflow);
        }
        value |= group << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::UnexpectedEnd)
}

/// Widens a signed 32-bit value the way protobuf `int32` does.
#[inline]
pub const fn from_i32(v: i32) -> u64 {
    v as i64 as u64
}

/// Widens a signed 64-bit value the way protobuf `int64` does.
#[inline]
pub const fn from_i64(v: i64) -> u64 {
    v as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(v: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        encode(v, &mut buf);
        buf
    }

    #[test]
    fn canonical_encodings() {
        assert_eq!(enc(0), [0x00]);
        assert_eq!(enc(1), [0x01]);
        assert_eq!(enc(127), [0x7F]);
        assert_eq!(enc(128), [0x80, 0x01]);
        assert_eq!(enc(300), [0xAC, 0x02]);
        assert_eq!(enc(16383), [0xFF, 0x7F]);
        assert_eq!(enc(16384), [0x80, 0x80, 0x01]);
        assert_eq!(enc(i32::MAX as u64), [0xFF, 0xFF, 0xFF, 0xFF, 0x07]);
    }

    #[test]
    fn canonical_values_decode_back() -> Result<()> {
        for v in [0u64, 127, 128, 16383, (1 << 31) - 1] {
            let bytes = enc(v);
            assert_eq!(bytes.len(), encoded_len(v));
            assert_eq!(decode(&bytes)?, (v, bytes.len()));
        }
        Ok(())
    }

    #[test]
    fn encoded_len_boundaries() {
        assert_eq!(encoded_len(0), 1);
        assert_eq!(encoded_len(0x7F), 1);
        assert_eq!(encoded_len(0x80), 2);
        assert_eq!(encoded_len(0x3FFF), 2);
        assert_eq!(encoded_len(0x4000), 3);
        assert_eq!(encoded_len(u64::MAX), MAX_LEN);
    }

    #[test]
    fn negative_int32_is_sign_extended() -> Result<()> {
        let bytes = enc(from_i32(-1));
        assert_eq!(bytes.len(), MAX_LEN);
        assert_eq!(bytes[MAX_LEN - 1], 0x01);
        let (v, n) = decode(&bytes)?;
        assert_eq!(n, MAX_LEN);
        assert_eq!(v as i32, -1);
        Ok(())
    }

    #[test]
    fn decode_stops_at_first_terminal_byte() -> Result<()> {
        let (v, n) = decode(&[0xAC, 0x02, 0xFF, 0xFF])?;
        assert_eq!((v, n), (300, 2));
        Ok(())
    }

    #[test]
    fn truncated_varint() {
        assert_eq!(decode(&[]), Err(Error::UnexpectedEnd));
        assert_eq!(decode(&[0x80, 0x80]), Err(Error::UnexpectedEnd));
    }

    #[test]
    fn overlong_varint() {
        assert_eq!(decode(&[0xFF; 11]), Err(Error::VarintOverflow));
        let mut too_big = vec![0xFF; 9];
        too_big.push(0x02);
        assert_eq!(decode(&too_big), Err(Error::VarintOverflow));
    }
}
