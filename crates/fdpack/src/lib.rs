//! # fdpack
//!
//! A schema-validated binary codec for moving an HTTP-like response out of a
//! sandboxed guest and into the host that owns the real I/O channel.
//!
//! ## Philosophy
//!
//! - **Schema as data**: field tags and wire types live in a `static` registry.
//!   Nothing is loaded or mutated at runtime.
//! - **Validate, then encode**: the encoder only accepts a [`Validated`] value,
//!   so an unchecked message cannot reach the wire.
//! - **Tight buffers**: every encode computes its exact length up front and
//!   allocates once.
//!
//! ## Format
//!
//! Protobuf-compatible (proto3) wire encoding:
//!
//! - **Key**: `varint((field << 3) | wire_type)`
//! - **Varint fields**: `[Key][base-128 varint]`
//! - **Length-delimited**: `[Key][varint Len][Data: Len]`
//! - **Maps**: one `[Key][Len][Entry]` per pair, entry = `{1: key, 2: value}`
//!
//! No outer length prefix is written; framing belongs to the transport.

pub mod decoder;
pub mod encoder;
pub mod message;
pub mod schema;
pub mod validate;
pub mod value;
pub mod varint;


pub use decoder::Decoder;
pub use encoder::Encoder;
pub use encoder::encode;
pub use message::HeaderFields;
pub use message::HeaderMap;
pub use message::Message;
pub use message::RequestMessage;
pub use message::ResponseMessage;
pub use message::StringSlice;
pub use schema::FieldDescriptor;
pub use schema::ValueType;
pub use schema::WireType;
pub use validate::Limits;
pub use validate::Problem;
pub use validate::Validated;
pub use validate::ValidationError;
pub use validate::Validator;
pub use validate::validate;
pub use value::Utf8Fn;
pub use value::Value;

/// Wire decoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer exhausted while reading.
    UnexpectedEnd,
    /// A varint ran past 10 bytes or overflowed 64 bits.
    VarintOverflow,
    /// The key carried a wire type this format cannot skip (groups, 6, 7).
    InvalidWireType(u8),
    /// A known field arrived with a wire type other than its schema's.
    WireTypeMismatch { field: &'static str, expected: WireType, found: WireType },
    /// Field number 0 or above the protobuf maximum.
    InvalidFieldNumber(u64),
    /// String data is not valid UTF-8.
    InvalidUtf8,
    /// A declared length does not fit in `usize` on this platform.
    LengthOverflow(u64),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidWireType(w) => write!(f, "Invalid wire type: {}", w),
            Error::WireTypeMismatch { field, expected, found } => {
                write!(f, "Wire type mismatch on '{}': expected {:?}, found {:?}", field, expected, found)
            }
            Error::InvalidFieldNumber(n) => write!(f, "Invalid field number: {}", n),
            Error::LengthOverflow(n) => write!(f, "Declared length {} overflows usize", n),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for fdpack decoding.
pub type Result<T> = std::result::Result<T, Error>;
