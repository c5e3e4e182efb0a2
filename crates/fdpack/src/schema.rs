//! # Schema Registry
//!
//! The static field table for every message that crosses the boundary.
//! Tags are part of the wire contract: never renumber one without a migration.

/// How a field's payload is framed on the wire.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    Len = 2,
    Fixed32 = 5,
}

impl WireType {
    /// Returns the WireType for the low three bits of a key, or `None` for
    /// groups and reserved values.
    pub const fn from_u8(b: u8) -> Option<Self> {
        match b {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::Len),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }
}

/// The logical type stored in a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int32,
    Int64,
    Bytes,
    String,
    /// A nested message, by registry name.
    Message(&'static str),
    /// `map<string, value>`, encoded as repeated entry messages.
    Map { entry: &'static str, value: &'static str },
}

/// One row of a message's field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub tag: u32,
    pub wire_type: WireType,
    pub repeated: bool,
    pub value_type: ValueType,
}

impl FieldDescriptor {
    const fn new(
        name: &'static str,
        tag: u32,
        wire_type: WireType,
        repeated: bool,
        value_type: ValueType,
    ) -> Self {
        Self { name, tag, wire_type, repeated, value_type }
    }
}

pub const RESPONSE_MESSAGE: &str = "ResponseMessage";
pub const HEADER_FIELDS: &str = "HeaderFields";
pub const HEADER_ENTRY: &str = "HeaderEntry";
pub const REQUEST_MESSAGE: &str = "RequestMessage";
pub const STRING_SLICE: &str = "StringSlice";

use ValueType as V;
use WireType as W;

const HEADER_MAP: ValueType = V::Map { entry: HEADER_ENTRY, value: HEADER_FIELDS };

static RESPONSE_FIELDS: [FieldDescriptor; 4] = [
    FieldDescriptor::new("body", 1, W::Len, false, V::Bytes),
    FieldDescriptor::new("statusCode", 2, W::Varint, false, V::Int32),
    FieldDescriptor::new("length", 3, W::Varint, false, V::Int32),
    FieldDescriptor::new("header", 4, W::Len, true, HEADER_MAP),
];

static HEADER_FIELDS_FIELDS: [FieldDescriptor; 1] = [
    FieldDescriptor::new("fields", 1, W::Len, true, V::String),
];

static HEADER_ENTRY_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new("key", 1, W::Len, false, V::String),
    FieldDescriptor::new("value", 2, W::Len, false, V::Message(HEADER_FIELDS)),
];

static REQUEST_FIELDS: [FieldDescriptor; 9] = [
    FieldDescriptor::new("method", 1, W::Len, false, V::String),
    FieldDescriptor::new("header", 2, W::Len, true, HEADER_MAP),
    FieldDescriptor::new("body", 3, W::Len, false, V::Bytes),
    FieldDescriptor::new("contentLength", 4, W::Varint, false, V::Int64),
    FieldDescriptor::new("transferEncoding", 5, W::Len, false, V::Message(STRING_SLICE)),
    FieldDescriptor::new("host", 6, W::Len, false, V::String),
    FieldDescriptor::new("remoteAddr", 7, W::Len, false, V::String),
    FieldDescriptor::new("requestUri", 8, W::Len, false, V::String),
    FieldDescriptor::new("pattern", 9, W::Len, false, V::String),
];

static STRING_SLICE_FIELDS: [FieldDescriptor; 1] = [
    FieldDescriptor::new("fields", 1, W::Len, true, V::String),
];

static REGISTRY: [(&str, &[FieldDescriptor]); 5] = [
    (RESPONSE_MESSAGE, &RESPONSE_FIELDS),
    (HEADER_FIELDS, &HEADER_FIELDS_FIELDS),
    (HEADER_ENTRY, &HEADER_ENTRY_FIELDS),
    (REQUEST_MESSAGE, &REQUEST_FIELDS),
    (STRING_SLICE, &STRING_SLICE_FIELDS),
];

/// Returns the field table for `type_name`, or `None` if it is not registered.
pub fn try_lookup(type_name: &str) -> Option<&'static [FieldDescriptor]> {
    REGISTRY
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, fields)| *fields)
}

/// Returns the field table for `type_name`.
///
/// # Panics
/// If `type_name` is not registered. Every caller names a type compiled into
/// this table, so a miss means the code and the schema disagree.
pub fn lookup(type_name: &str) -> &'static [FieldDescriptor] {
    match try_lookup(type_name) {
        Some(fields) => fields,
        None => panic!("fdpack: no schema registered for message type '{}'", type_name),
    }
}

/// Finds the descriptor for `tag` within `type_name`, if the tag is known.
pub fn field(type_name: &str, tag: u32) -> Option<&'static FieldDescriptor> {
    lookup(type_name).iter().find(|f| f.tag == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_tags_are_fixed() {
        let tags: Vec<_> = lookup(RESPONSE_MESSAGE)
            .iter()
            .map(|f| (f.name, f.tag, f.wire_type))
            .collect();
        assert_eq!(
            tags,
            [
                ("body", 1, WireType::Len),
                ("statusCode", 2, WireType::Varint),
                ("length", 3, WireType::Varint),
                ("header", 4, WireType::Len),
            ]
        );
    }

    #[test]
    fn header_fields_is_repeated_string() {
        let f = field(HEADER_FIELDS, 1).unwrap();
        assert_eq!(f.name, "fields");
        assert!(f.repeated);
        assert_eq!(f.value_type, ValueType::String);
    }

    #[test]
    fn every_nested_type_is_registered() {
        for (_, fields) in REGISTRY.iter() {
            for f in fields.iter() {
                match f.value_type {
                    ValueType::Message(name) => assert!(try_lookup(name).is_some(), "{}", name),
                    ValueType::Map { entry, value } => {
                        assert!(try_lookup(entry).is_some(), "{}", entry);
                        assert!(try_lookup(value).is_some(), "{}", value);
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn unknown_tag_is_none() {
        assert!(field(RESPONSE_MESSAGE, 99).is_none());
    }

    #[test]
    fn unknown_type_is_none() {
        assert!(try_lookup("Nope").is_none());
    }

    #[test]
    #[should_panic(expected = "no schema registered")]
    fn unknown_type_panics() {
        lookup("Nope");
    }
}
