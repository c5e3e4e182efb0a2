//! # Encoder
//!
//! Writes keys, varints and length-delimited payloads into a growable buffer.
//! Nested messages are sized first (`Message::encoded_len`) so every length
//! prefix is written once, in place, with no back-patching.

use crate::message::Message;
use crate::schema::WireType;
use crate::validate::Validated;
use crate::varint;

pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self { buf: Vec::with_capacity(cap) }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    pub fn key(&mut self, tag: u32, wire_type: WireType) {
        varint::encode(((tag as u64) << 3) | wire_type as u64, &mut self.buf);
    }

    #[inline]
    pub fn varint(&mut self, v: u64) {
        varint::encode(v, &mut self.buf);
    }

    pub fn int32_field(&mut self, tag: u32, v: i32) {
        self.key(tag, WireType::Varint);
        self.varint(varint::from_i32(v));
    }

    pub fn int64_field(&mut self, tag: u32, v: i64) {
        self.key(tag, WireType::Varint);
        self.varint(varint::from_i64(v));
    }

    /// Writes `[Key][Len][bytes]`, even when `v` is empty.
    pub fn bytes_field(&mut self, tag: u32, v: &[u8]) {
        self.key(tag, WireType::Len);
        self.varint(v.len() as u64);
        self.buf.extend_from_slice(v);
    }

    pub fn str_field(&mut self, tag: u32, v: &str) {
        self.bytes_field(tag, v.as_bytes());
    }

    /// One entry per string, in order.
    pub fn repeated_str_field<S: AsRef<str>>(&mut self, tag: u32, values: &[S]) {
        for v in values {
            self.str_field(tag, v.as_ref());
        }
    }

    /// Writes `[Key][Len][body]` for a nested message.
    pub fn message_field<M: Message>(&mut self, tag: u32, msg: &M) {
        self.key(tag, WireType::Len);
        self.varint(msg.encoded_len() as u64);
        msg.encode_raw(self);
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes a validated message into a buffer sized exactly to fit.
pub fn encode<M: Message>(msg: &Validated<M>) -> Vec<u8> {
    let len = msg.encoded_len();
    let mut enc = Encoder::with_capacity(len);
    msg.encode_raw(&mut enc);
    debug_assert_eq!(enc.len(), len, "encoded_len disagrees with encode_raw");
    enc.into_bytes()
}

// Sizes, mirroring the writers above.

pub(crate) const fn key_len(tag: u32) -> usize {
    varint::encoded_len((tag as u64) << 3)
}

pub(crate) const fn int32_field_len(tag: u32, v: i32) -> usize {
    key_len(tag) + varint::encoded_len(varint::from_i32(v))
}

pub(crate) const fn int64_field_len(tag: u32, v: i64) -> usize {
    key_len(tag) + varint::encoded_len(varint::from_i64(v))
}

pub(crate) const fn len_field_len(tag: u32, payload: usize) -> usize {
    key_len(tag) + varint::encoded_len(payload as u64) + payload
}

pub(crate) fn repeated_str_field_len<S: AsRef<str>>(tag: u32, values: &[S]) -> usize {
    values.iter().map(|v| len_field_len(tag, v.as_ref().len())).sum()
}
