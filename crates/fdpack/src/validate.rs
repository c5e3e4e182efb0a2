//! # Validator
//!
//! Two entry points, one error type:
//!
//! - [`Validator::validate`] checks a loosely-typed [`Value`] against the
//!   `ResponseMessage` schema and converts it.
//! - [`Message::validate`] checks an already-typed message, where the only
//!   things left to get wrong are byte lengths.
//!
//! Either way, every problem found is collected into a single
//! [`ValidationError`]. Nothing is mutated.

use std::ops::Deref;

use crate::message::HeaderFields;
use crate::message::HeaderMap;
use crate::message::Message;
use crate::message::ResponseMessage;
use crate::schema;
use crate::schema::ValueType;
use crate::value::Utf8Fn;
use crate::value::Value;
use crate::value::utf8;

/// Protobuf's hard ceiling on a length-delimited payload or whole message.
pub const MAX_WIRE_LEN: usize = i32::MAX as usize;

/// Byte bounds enforced before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest single length-delimited payload (body, string, nested message,
    /// map entry).
    pub max_payload_len: usize,
    /// Largest encoded message.
    pub max_message_len: usize,
}

impl Limits {
    pub fn with_max_payload_len(mut self, len: usize) -> Self {
        self.max_payload_len = len.min(MAX_WIRE_LEN);
        self
    }

    pub fn with_max_message_len(mut self, len: usize) -> Self {
        self.max_message_len = len.min(MAX_WIRE_LEN);
        self
    }

    /// Records a [`Problem::TooLarge`] if `len` exceeds the payload bound.
    pub fn check_payload<F>(&self, path: F, len: usize, problems: &mut Vec<Problem>)
    where
        F: FnOnce() -> String,
    {
        if len > self.max_payload_len {
            problems.push(Problem::TooLarge { path: path(), len, max: self.max_payload_len });
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_payload_len: MAX_WIRE_LEN, max_message_len: MAX_WIRE_LEN }
    }
}

/// One thing wrong with a candidate value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    Missing { path: String },
    WrongType { path: String, expected: &'static str, found: &'static str },
    OutOfRange { path: String, value: i64 },
    TooLarge { path: String, len: usize, max: usize },
}

impl Problem {
    pub fn path(&self) -> &str {
        match self {
            Problem::Missing { path }
            | Problem::WrongType { path, .. }
            | Problem::OutOfRange { path, .. }
            | Problem::TooLarge { path, .. } => path,
        }
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Problem::Missing { path } => write!(f, "{}: missing", path),
            Problem::WrongType { path, expected, found } => {
                write!(f, "{}: expected {}, found {}", path, expected, found)
            }
            Problem::OutOfRange { path, value } => write!(f, "{}: {} does not fit in 32 bits", path, value),
            Problem::TooLarge { path, len, max } => write!(f, "{}: {} bytes exceeds limit of {}", path, len, max),
        }
    }
}

/// The aggregated result of a failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub type_name: &'static str,
    pub problems: Vec<Problem>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: ", self.type_name)?;
        for (i, p) in self.problems.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", p)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// A message that has passed validation. Only this can be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T>(T);

impl<T> Validated<T> {
    pub fn get(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> AsRef<T> for Validated<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

/// `header` + `content-type` -> `header.content-type`.
pub(crate) fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

/// Byte-length check for typed messages; see [`Message::validate`].
pub(crate) fn check_limits<M: Message>(msg: M, limits: &Limits) -> Result<Validated<M>, ValidationError> {
    let mut problems = Vec::new();
    msg.check_payloads("", limits, &mut problems);
    let len = msg.encoded_len();
    if len > limits.max_message_len {
        problems.push(Problem::TooLarge {
            path: "<message>".to_string(),
            len,
            max: limits.max_message_len,
        });
    }
    if problems.is_empty() {
        Ok(Validated(msg))
    } else {
        Err(ValidationError { type_name: M::TYPE_NAME, problems })
    }
}

/// Checks dynamic values against the schema registry.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    utf8: Utf8Fn,
    limits: Limits,
}

impl Validator {
    pub fn new(utf8: Utf8Fn) -> Self {
        Self { utf8, limits: Limits::default() }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Validates `value` as a `ResponseMessage` and converts it.
    ///
    /// Unknown fields on `value` are ignored. Field names are matched as
    /// registered (`statusCode`) or in snake_case (`status_code`).
    pub fn validate(&self, value: &Value) -> Result<Validated<ResponseMessage>, ValidationError> {
        let problems = self.check_shape(schema::RESPONSE_MESSAGE, value);
        if !problems.is_empty() {
            return Err(ValidationError { type_name: schema::RESPONSE_MESSAGE, problems });
        }
        let msg = self.response_from_value(value).ok_or_else(|| ValidationError {
            type_name: schema::RESPONSE_MESSAGE,
            problems: vec![Problem::WrongType {
                path: "<root>".to_string(),
                expected: "object",
                found: value.kind(),
            }],
        })?;
        msg.validate(&self.limits)
    }

    /// Every schema problem with `value` as a `type_name`. Empty means valid.
    pub fn check_shape(&self, type_name: &str, value: &Value) -> Vec<Problem> {
        let mut problems = Vec::new();
        self.check_message(type_name, value, "", &mut problems);
        problems
    }

    fn check_message(&self, type_name: &str, value: &Value, path: &str, problems: &mut Vec<Problem>) {
        if value.as_object().is_none() {
            let path = if path.is_empty() { "<root>" } else { path };
            problems.push(Problem::WrongType { path: path.to_string(), expected: "object", found: value.kind() });
            return;
        }
        for field in schema::lookup(type_name) {
            let path = join(path, field.name);
            match value.get_field(field.name) {
                None | Some(Value::Null) => problems.push(Problem::Missing { path }),
                Some(v) => self.check_value(field.value_type, field.repeated, v, &path, problems),
            }
        }
    }

    fn check_value(&self, ty: ValueType, repeated: bool, v: &Value, path: &str, problems: &mut Vec<Problem>) {
        let wrong = |expected| Problem::WrongType { path: path.to_string(), expected, found: v.kind() };

        if let ValueType::Map { value, .. } = ty {
            match v.as_object() {
                Some(entries) => {
                    for (key, entry) in entries {
                        self.check_message(value, entry, &join(path, key), problems);
                    }
                }
                None => problems.push(wrong("map")),
            }
            return;
        }

        if repeated {
            match v {
                Value::List(items) => {
                    for (i, item) in items.iter().enumerate() {
                        self.check_value(ty, false, item, &format!("{}[{}]", path, i), problems);
                    }
                }
                _ => problems.push(wrong("list")),
            }
            return;
        }

        match ty {
            ValueType::Int32 => match v.as_integer() {
                Some(i) if i32::try_from(i).is_ok() => {}
                Some(i) => problems.push(Problem::OutOfRange { path: path.to_string(), value: i }),
                None => problems.push(wrong("int32")),
            },
            ValueType::Int64 => {
                if v.as_integer().is_none() {
                    problems.push(wrong("int64"));
                }
            }
            ValueType::Bytes => {
                if v.to_bytes(self.utf8).is_none() {
                    problems.push(wrong("bytes"));
                }
            }
            ValueType::String => {
                if v.as_str().is_none() {
                    problems.push(wrong("string"));
                }
            }
            ValueType::Message(name) => self.check_message(name, v, path, problems),
            ValueType::Map { .. } => {}
        }
    }

    fn response_from_value(&self, v: &Value) -> Option<ResponseMessage> {
        let int32 = |name| v.get_field(name)?.as_integer().and_then(|i| i32::try_from(i).ok());
        let header = v
            .get_field("header")?
            .as_object()?
            .iter()
            .map(|(name, entry)| Some((name.clone(), string_list(entry)?)))
            .collect::<Option<HeaderMap>>()?;

        Some(ResponseMessage {
            body: v.get_field("body")?.to_bytes(self.utf8)?,
            status_code: int32("statusCode")?,
            length: int32("length")?,
            header,
        })
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(utf8)
    }
}

fn string_list(v: &Value) -> Option<HeaderFields> {
    match v.get_field("fields")? {
        Value::List(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

/// Validates `value` as a `ResponseMessage` with default limits and UTF-8.
pub fn validate(value: &Value) -> Result<Validated<ResponseMessage>, ValidationError> {
    Validator::default().validate(value)
}
