//! A zero-copy, bounds-checked reader for the wire format.
//!
//! Decoders are views: reading advances the view, and length-delimited reads
//! hand back sub-slices of the original buffer.

use crate::Error;
use crate::Result;
use crate::schema;
use crate::schema::FieldDescriptor;
use crate::schema::WireType;
use crate::varint;

/// Largest field number protobuf allows (2^29 - 1).
pub const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;

#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Returns the remaining bytes in the view.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.buf.len() {
            return Err(Error::UnexpectedEnd);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    pub fn varint(&mut self) -> Result<u64> {
        let (v, n) = varint::decode(self.buf)?;
        self.buf = &self.buf[n..];
        Ok(v)
    }

    /// Reads a field key, returning `(field_number, wire_type)`.
    pub fn key(&mut self) -> Result<(u32, WireType)> {
        let key = self.varint()?;
        let wire = (key & 0x07) as u8;
        let field = key >> 3;
        if field == 0 || field > MAX_FIELD_NUMBER {
            return Err(Error::InvalidFieldNumber(field));
        }
        let wire_type = WireType::from_u8(wire).ok_or(Error::InvalidWireType(wire))?;
        Ok((field as u32, wire_type))
    }

    /// Truncates to 32 bits, as protobuf `int32` does.
    pub fn int32(&mut self) -> Result<i32> {
        Ok(self.varint()? as i32)
    }

    pub fn int64(&mut self) -> Result<i64> {
        Ok(self.varint()? as i64)
    }

    /// Reads a length prefix and returns exactly that many bytes.
    pub fn len_delimited(&mut self) -> Result<&'a [u8]> {
        let len = self.varint()?;
        let len = usize::try_from(len).map_err(|_| Error::LengthOverflow(len))?;
        self.read_bytes(len)
    }

    pub fn bytes(&mut self) -> Result<&'a [u8]> {
        self.len_delimited()
    }

    pub fn str(&mut self) -> Result<&'a str> {
        let bytes = self.len_delimited()?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    /// Skips one payload of the given wire type.
    pub fn skip(&mut self, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::Varint => { self.varint()?; }
            WireType::Fixed64 => { self.read_bytes(8)?; }
            WireType::Len => { self.len_delimited()?; }
            WireType::Fixed32 => { self.read_bytes(4)?; }
        }
        Ok(())
    }
}

/// Walks every field of a `type_name` message in `buf`.
///
/// Known fields are checked against their schema wire type and handed to `f`
/// with the decoder positioned at the payload. Unknown fields are skipped.
pub fn for_each_field<'a, F>(type_name: &str, buf: &'a [u8], mut f: F) -> Result<()>
where
    F: FnMut(&'static FieldDescriptor, &mut Decoder<'a>) -> Result<()>,
{
    let mut dec = Decoder::new(buf);
    while !dec.is_empty() {
        let (tag, wire_type) = dec.key()?;
        match schema::field(type_name, tag) {
            Some(field) if field.wire_type == wire_type => f(field, &mut dec)?,
            Some(field) => {
                return Err(Error::WireTypeMismatch {
                    field: field.name,
                    expected: field.wire_type,
                    found: wire_type,
                });
            }
            None => dec.skip(wire_type)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_splits_field_and_wire_type() -> Result<()> {
        // field 4, wire type 2
        let mut dec = Decoder::new(&[0x22]);
        assert_eq!(dec.key()?, (4, WireType::Len));
        Ok(())
    }

    #[test]
    fn field_zero_is_rejected() {
        let mut dec = Decoder::new(&[0x02]);
        assert_eq!(dec.key(), Err(Error::InvalidFieldNumber(0)));
    }

    #[test]
    fn group_wire_types_are_rejected() {
        // field 1, wire type 3 (start group)
        let mut dec = Decoder::new(&[0x0B]);
        assert_eq!(dec.key(), Err(Error::InvalidWireType(3)));
    }

    #[test]
    fn len_delimited_past_end() {
        let mut dec = Decoder::new(&[0x05, b'a', b'b']);
        assert_eq!(dec.len_delimited(), Err(Error::UnexpectedEnd));
    }

    #[test]
    fn str_rejects_bad_utf8() {
        let mut dec = Decoder::new(&[0x02, 0xC3, 0x28]);
        assert_eq!(dec.str(), Err(Error::InvalidUtf8));
    }

    #[test]
    fn skip_every_wire_type() -> Result<()> {
        let buf = [
            0xAC, 0x02, // varint 300
            1, 2, 3, 4, 5, 6, 7, 8, // fixed64
            0x02, b'h', b'i', // len 2
            9, 9, 9, 9, // fixed32
        ];
        let mut dec = Decoder::new(&buf);
        dec.skip(WireType::Varint)?;
        dec.skip(WireType::Fixed64)?;
        dec.skip(WireType::Len)?;
        dec.skip(WireType::Fixed32)?;
        assert!(dec.is_empty());
        Ok(())
    }

    #[test]
    fn for_each_field_skips_unknown_tags() -> Result<()> {
        // ResponseMessage: unknown field 9 (varint 7), then statusCode = 200
        let buf = [0x48, 0x07, 0x10, 0xC8, 0x01];
        let mut seen = Vec::new();
        for_each_field(schema::RESPONSE_MESSAGE, &buf, |field, dec| {
            seen.push((field.name, dec.int32()?));
            Ok(())
        })?;
        assert_eq!(seen, [("statusCode", 200)]);
        Ok(())
    }

    #[test]
    fn for_each_field_rejects_wrong_wire_type() {
        // statusCode (field 2) sent as length-delimited
        let buf = [0x12, 0x00];
        let err = for_each_field(schema::RESPONSE_MESSAGE, &buf, |_, _| Ok(())).unwrap_err();
        assert_eq!(
            err,
            Error::WireTypeMismatch {
                field: "statusCode",
                expected: WireType::Varint,
                found: WireType::Len,
            }
        );
    }
}
