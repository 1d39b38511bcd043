//! Event Records and their owned payloads.
//!
//! A record is built once in a producer context and then only moved:
//! producer → queue → drain step. Heap payloads are exclusive copies of
//! the native buffers, made with fallible allocation so an exhausted heap
//! turns into a dropped event instead of an abort inside an interrupt.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Deref;

use heapless::Vec as BoundedVec;

use crate::config::MAX_PAYLOAD_FIELDS;

/// A record that can cross from a producer context to the loop thread.
///
/// `payload` is the per-variant conversion table: one match arm per
/// variant, so adding a variant without a mapping fails to compile.
pub trait Event: Send {
    /// Event name handed to the script callback as its first argument.
    fn name(&self) -> &'static str;

    /// Structured payload, or `None` when the event carries nothing.
    fn payload(&self) -> Option<Payload<'_>>;
}

/// One payload field, borrowed from the record that owns the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    Bool(bool),
    Int(i32),
    Uint(u32),
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> Field<'a> {
    /// Text when `data` is valid UTF-8, binary otherwise.
    pub fn text_or_bytes(data: &'a [u8]) -> Self {
        match core::str::from_utf8(data) {
            Ok(s) => Field::Text(s),
            Err(_) => Field::Bytes(data),
        }
    }
}

/// Second callback argument: an object built from an ordered key/field
/// list, or a single bare value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload<'a> {
    body: Body<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Body<'a> {
    Object(BoundedVec<(&'static str, Field<'a>), MAX_PAYLOAD_FIELDS>),
    Scalar(Field<'a>),
}

impl<'a> Payload<'a> {
    pub fn new() -> Self {
        Self {
            body: Body::Object(BoundedVec::new()),
        }
    }

    /// Payload passed to the callback as the value itself, not an object.
    pub fn scalar(field: Field<'a>) -> Self {
        Self {
            body: Body::Scalar(field),
        }
    }

    /// Append a field. Fields past `MAX_PAYLOAD_FIELDS` are dropped, and
    /// a scalar payload takes none.
    pub fn with(mut self, key: &'static str, field: Field<'a>) -> Self {
        match &mut self.body {
            Body::Object(fields) => {
                if fields.push((key, field)).is_err() {
                    warn!("payload full - dropping field {}", key);
                }
            }
            Body::Scalar(_) => warn!("scalar payload - dropping field {}", key),
        }
        self
    }

    /// Append a field only when present.
    pub fn with_opt(self, key: &'static str, field: Option<Field<'a>>) -> Self {
        match field {
            Some(field) => self.with(key, field),
            None => self,
        }
    }

    pub fn fields(&self) -> &[(&'static str, Field<'a>)] {
        match &self.body {
            Body::Object(fields) => fields.as_slice(),
            Body::Scalar(_) => &[],
        }
    }

    pub fn as_scalar(&self) -> Option<Field<'a>> {
        match self.body {
            Body::Scalar(field) => Some(field),
            Body::Object(_) => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<Field<'a>> {
        self.fields()
            .iter()
            .find_map(|(k, f)| (*k == key).then_some(*f))
    }

    pub fn len(&self) -> usize {
        self.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

impl Default for Payload<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Heap copy of a native byte buffer, owned by exactly one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedBytes(Vec<u8>);

impl OwnedBytes {
    /// Copy `data` onto the heap. `None` if the allocation fails.
    pub fn try_copy(data: &[u8]) -> Option<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(data.len()).ok()?;
        buf.extend_from_slice(data);
        Some(Self(buf))
    }

    /// Take ownership of an already-filled buffer.
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self(buf)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for OwnedBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// Heap copy of a native string (addresses, topics, UUIDs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedText(String);

impl OwnedText {
    /// Copy `text` onto the heap. `None` if the allocation fails.
    pub fn try_copy(text: &str) -> Option<Self> {
        let mut s = String::new();
        s.try_reserve_exact(text.len()).ok()?;
        s.push_str(text);
        Some(Self(s))
    }

    /// Validate and adopt a reassembled byte buffer.
    pub fn from_utf8(buf: Vec<u8>) -> Option<Self> {
        String::from_utf8(buf).ok().map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for OwnedText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}
