//! Typed messages and their wire mappings.
//!
//! Each type here pairs with a table in [`crate::schema`]; the `TYPE_NAME`
//! constant is the link between the two.

use std::collections::BTreeMap;

use crate::Result;
use crate::decoder::Decoder;
use crate::decoder::for_each_field;
use crate::encoder::Encoder;
use crate::encoder::int32_field_len;
use crate::encoder::int64_field_len;
use crate::encoder::len_field_len;
use crate::encoder::repeated_str_field_len;
use crate::schema;
use crate::schema::FieldDescriptor;
use crate::validate;
use crate::validate::Limits;
use crate::validate::Problem;
use crate::validate::Validated;
use crate::validate::ValidationError;
use crate::validate::join;

/// A message with a registered schema.
pub trait Message: Default + Sized {
    /// Registry name of this message's field table.
    const TYPE_NAME: &'static str;

    /// Exact number of bytes `encode_raw` writes.
    fn encoded_len(&self) -> usize;

    /// Writes every populated field, without an outer length prefix.
    fn encode_raw(&self, enc: &mut Encoder);

    /// Consumes one known field's payload from `dec` into `self`.
    fn merge_field(&mut self, field: &'static FieldDescriptor, dec: &mut Decoder<'_>) -> Result<()>;

    /// Reports every length-delimited payload that exceeds `limits`.
    fn check_payloads(&self, path: &str, limits: &Limits, problems: &mut Vec<Problem>);

    /// Merges every field found in `buf` into `self`.
    fn merge(&mut self, buf: &[u8]) -> Result<()> {
        for_each_field(Self::TYPE_NAME, buf, |field, dec| self.merge_field(field, dec))
    }

    fn decode(buf: &[u8]) -> Result<Self> {
        let mut msg = Self::default();
        msg.merge(buf)?;
        Ok(msg)
    }

    /// Checks byte-length limits and wraps `self` for encoding.
    fn validate(self, limits: &Limits) -> std::result::Result<Validated<Self>, ValidationError> {
        validate::check_limits(self, limits)
    }
}

// ============================================================================
//  STRING LISTS
// ============================================================================

/// Defines a message whose only field is `fields = 1` (repeated string).
macro_rules! string_list_message {
    ($(#[$meta:meta])* $name:ident, $type_name:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
        pub struct $name {
            pub fields: Vec<String>,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn push(&mut self, value: impl Into<String>) {
                self.fields.push(value.into());
            }

            pub fn first(&self) -> Option<&str> {
                self.fields.first().map(String::as_str)
            }

            pub fn len(&self) -> usize {
                self.fields.len()
            }

            pub fn is_empty(&self) -> bool {
                self.fields.is_empty()
            }
        }

        impl<S: Into<String>> FromIterator<S> for $name {
            fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
                Self { fields: iter.into_iter().map(Into::into).collect() }
            }
        }

        impl From<Vec<String>> for $name {
            fn from(fields: Vec<String>) -> Self {
                Self { fields }
            }
        }

        impl<S: Into<String>, const N: usize> From<[S; N]> for $name {
            fn from(values: [S; N]) -> Self {
                values.into_iter().collect()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self { fields: vec![value.to_string()] }
            }
        }

        impl Message for $name {
            const TYPE_NAME: &'static str = $type_name;

            fn encoded_len(&self) -> usize {
                repeated_str_field_len(1, &self.fields)
            }

            fn encode_raw(&self, enc: &mut Encoder) {
                enc.repeated_str_field(1, &self.fields);
            }

            fn merge_field(&mut self, field: &'static FieldDescriptor, dec: &mut Decoder<'_>) -> Result<()> {
                match field.tag {
                    1 => self.fields.push(dec.str()?.to_string()),
                    _ => dec.skip(field.wire_type)?,
                }
                Ok(())
            }

            fn check_payloads(&self, path: &str, limits: &Limits, problems: &mut Vec<Problem>) {
                for (i, v) in self.fields.iter().enumerate() {
                    limits.check_payload(|| format!("{}[{}]", join(path, "fields"), i), v.len(), problems);
                }
            }
        }
    };
}

string_list_message!(
    /// The ordered values of one header. Order is significant.
    HeaderFields,
    schema::HEADER_FIELDS
);

string_list_message!(
    /// A bare list of strings (e.g. `Transfer-Encoding` codings).
    StringSlice,
    schema::STRING_SLICE
);

// ============================================================================
//  HEADER MAP
// ============================================================================

/// Header name to values. Names are unique and case-sensitive as given.
///
/// Backed by a `BTreeMap`, so encoding order is deterministic (sorted by name).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap(BTreeMap<String, HeaderFields>);

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all values of `name`, returning the previous ones.
    pub fn insert(&mut self, name: impl Into<String>, values: HeaderFields) -> Option<HeaderFields> {
        self.0.insert(name.into(), values)
    }

    /// Adds one value to `name`, after any existing values.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value);
    }

    /// Replaces all values of `name` with the single `value`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), HeaderFields { fields: vec![value.into()] });
    }

    pub fn get(&self, name: &str) -> Option<&HeaderFields> {
        self.0.get(name)
    }

    /// First value of `name`, if any.
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(HeaderFields::first)
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderFields> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderFields)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn entry_len(name: &str, values: &HeaderFields) -> usize {
        len_field_len(1, name.len()) + len_field_len(2, values.encoded_len())
    }

    /// Size of the map written as field `tag`.
    pub(crate) fn encoded_len(&self, tag: u32) -> usize {
        self.iter()
            .map(|(k, v)| len_field_len(tag, Self::entry_len(k, v)))
            .sum()
    }

    /// Writes one `{1: name, 2: values}` entry per header as field `tag`.
    pub(crate) fn encode(&self, tag: u32, enc: &mut Encoder) {
        for (name, values) in self.iter() {
            enc.key(tag, schema::WireType::Len);
            enc.varint(Self::entry_len(name, values) as u64);
            enc.str_field(1, name);
            enc.message_field(2, values);
        }
    }

    /// Decodes one entry body. A repeated name replaces the earlier entry.
    pub(crate) fn merge_entry(&mut self, entry: &[u8]) -> Result<()> {
        let mut name = String::new();
        let mut values = HeaderFields::default();
        for_each_field(schema::HEADER_ENTRY, entry, |field, dec| {
            match field.tag {
                1 => name = dec.str()?.to_string(),
                2 => values.merge(dec.len_delimited()?)?,
                _ => dec.skip(field.wire_type)?,
            }
            Ok(())
        })?;
        self.0.insert(name, values);
        Ok(())
    }

    fn check_payloads(&self, path: &str, limits: &Limits, problems: &mut Vec<Problem>) {
        for (name, values) in self.iter() {
            let entry = join(path, name);
            limits.check_payload(|| format!("{} (entry)", entry), Self::entry_len(name, values), problems);
            limits.check_payload(|| format!("{} (name)", entry), name.len(), problems);
            limits.check_payload(|| entry.clone(), values.encoded_len(), problems);
            values.check_payloads(&entry, limits, problems);
        }
    }
}

impl<K: Into<String>> FromIterator<(K, HeaderFields)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, HeaderFields)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a String, &'a HeaderFields);
    type IntoIter = std::collections::btree_map::Iter<'a, String, HeaderFields>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
//  RESPONSE
// ============================================================================

/// The response a guest hands back to its host.
///
/// `length` is caller supplied and is *not* derived from `body`: the wire
/// carries whatever the caller set, even if it disagrees with `body.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMessage {
    pub body: Vec<u8>,
    pub status_code: i32,
    pub length: i32,
    pub header: HeaderMap,
}

impl ResponseMessage {
    pub fn new(status_code: i32) -> Self {
        Self { status_code, ..Self::default() }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_length(mut self, length: i32) -> Self {
        self.length = length;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, values: impl Into<HeaderFields>) -> Self {
        self.header.insert(name, values.into());
        self
    }

    pub fn with_header_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.append(name, value);
        self
    }
}

impl Message for ResponseMessage {
    const TYPE_NAME: &'static str = schema::RESPONSE_MESSAGE;

    fn encoded_len(&self) -> usize {
        let body = if self.body.is_empty() { 0 } else { len_field_len(1, self.body.len()) };
        body + int32_field_len(2, self.status_code)
            + int32_field_len(3, self.length)
            + self.header.encoded_len(4)
    }

    fn encode_raw(&self, enc: &mut Encoder) {
        if !self.body.is_empty() {
            enc.bytes_field(1, &self.body);
        }
        enc.int32_field(2, self.status_code);
        enc.int32_field(3, self.length);
        self.header.encode(4, enc);
    }

    fn merge_field(&mut self, field: &'static FieldDescriptor, dec: &mut Decoder<'_>) -> Result<()> {
        match field.tag {
            1 => self.body = dec.bytes()?.to_vec(),
            2 => self.status_code = dec.int32()?,
            3 => self.length = dec.int32()?,
            4 => self.header.merge_entry(dec.len_delimited()?)?,
            _ => dec.skip(field.wire_type)?,
        }
        Ok(())
    }

    fn check_payloads(&self, path: &str, limits: &Limits, problems: &mut Vec<Problem>) {
        limits.check_payload(|| join(path, "body"), self.body.len(), problems);
        self.header.check_payloads(&join(path, "header"), limits, problems);
    }
}

// ============================================================================
//  REQUEST
// ============================================================================

/// The request a host hands to its guest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMessage {
    pub method: String,
    pub header: HeaderMap,
    pub body: Vec<u8>,
    pub content_length: i64,
    pub transfer_encoding: Option<StringSlice>,
    pub host: String,
    pub remote_addr: String,
    pub request_uri: String,
    pub pattern: String,
}

impl RequestMessage {
    pub fn new(method: impl Into<String>, request_uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            request_uri: request_uri.into(),
            ..Self::default()
        }
    }

    /// Sets the body and `content_length` together.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self.content_length = self.body.len() as i64;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, values: impl Into<HeaderFields>) -> Self {
        self.header.insert(name, values.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = addr.into();
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_transfer_encoding(mut self, codings: StringSlice) -> Self {
        self.transfer_encoding = Some(codings);
        self
    }
}

impl Message for RequestMessage {
    const TYPE_NAME: &'static str = schema::REQUEST_MESSAGE;

    fn encoded_len(&self) -> usize {
        let opt_str = |tag: u32, s: &str| if s.is_empty() { 0 } else { len_field_len(tag, s.len()) };

        let mut len = opt_str(1, &self.method);
        len += self.header.encoded_len(2);
        if !self.body.is_empty() {
            len += len_field_len(3, self.body.len());
        }
        len += int64_field_len(4, self.content_length);
        if let Some(te) = &self.transfer_encoding {
            len += len_field_len(5, te.encoded_len());
        }
        len += opt_str(6, &self.host);
        len += opt_str(7, &self.remote_addr);
        len += opt_str(8, &self.request_uri);
        len += opt_str(9, &self.pattern);
        len
    }

    fn encode_raw(&self, enc: &mut Encoder) {
        let opt_str = |enc: &mut Encoder, tag: u32, s: &str| {
            if !s.is_empty() {
                enc.str_field(tag, s);
            }
        };

        opt_str(enc, 1, &self.method);
        self.header.encode(2, enc);
        if !self.body.is_empty() {
            enc.bytes_field(3, &self.body);
        }
        enc.int64_field(4, self.content_length);
        if let Some(te) = &self.transfer_encoding {
            enc.message_field(5, te);
        }
        opt_str(enc, 6, &self.host);
        opt_str(enc, 7, &self.remote_addr);
        opt_str(enc, 8, &self.request_uri);
        opt_str(enc, 9, &self.pattern);
    }

    fn merge_field(&mut self, field: &'static FieldDescriptor, dec: &mut Decoder<'_>) -> Result<()> {
        match field.tag {
            1 => self.method = dec.str()?.to_string(),
            2 => self.header.merge_entry(dec.len_delimited()?)?,
            3 => self.body = dec.bytes()?.to_vec(),
            4 => self.content_length = dec.int64()?,
            5 => self
                .transfer_encoding
                .get_or_insert_with(StringSlice::default)
                .merge(dec.len_delimited()?)?,
            6 => self.host = dec.str()?.to_string(),
            7 => self.remote_addr = dec.str()?.to_string(),
            8 => self.request_uri = dec.str()?.to_string(),
            9 => self.pattern = dec.str()?.to_string(),
            _ => dec.skip(field.wire_type)?,
        }
        Ok(())
    }

    fn check_payloads(&self, path: &str, limits: &Limits, problems: &mut Vec<Problem>) {
        limits.check_payload(|| join(path, "method"), self.method.len(), problems);
        self.header.check_payloads(&join(path, "header"), limits, problems);
        limits.check_payload(|| join(path, "body"), self.body.len(), problems);
        if let Some(te) = &self.transfer_encoding {
            let te_path = join(path, "transferEncoding");
            limits.check_payload(|| te_path.clone(), te.encoded_len(), problems);
            te.check_payloads(&te_path, limits, problems);
        }
        limits.check_payload(|| join(path, "host"), self.host.len(), problems);
        limits.check_payload(|| join(path, "remoteAddr"), self.remote_addr.len(), problems);
        limits.check_payload(|| join(path, "requestUri"), self.request_uri.len(), problems);
        limits.check_payload(|| join(path, "pattern"), self.pattern.len(), problems);
    }
}
