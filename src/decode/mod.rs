//! Decoding of key → multi-value mappings into typed targets.
//!
//! # Responsibilities
//! - Match mapping keys to target fields by serde name (`#[serde(rename)]`)
//! - Convert submitted strings into the field's type
//! - Update the caller's target in place
//!
//! # Design Decisions
//! - Same contract for query, form and route params
//! - Stateless: one [`ValueDecoder`] value can serve any number of requests
//! - Keys unknown to the target are ignored
//! - Target fields without a key keep their current value
//! - Conversion failures are errors, never silent zero values
//! - Scalars take the last submitted value, sequences take all of them
//! - Nested structs are not supported

pub mod values;

pub use values::Values;

use std::fmt;

use serde::de::{
    self, value::StringDeserializer, DeserializeOwned, DeserializeSeed, MapAccess, SeqAccess,
    Visitor,
};
use serde::{forward_to_deserialize_any, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while decoding [`Values`] into a target.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Decoding a specific field failed.
    #[error("field `{field}`: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<DecodeError>,
    },

    /// A submitted string could not be converted.
    #[error("invalid value {value:?}, expected {expected}")]
    InvalidValue { value: String, expected: &'static str },

    /// The target does not serialize as a struct or map.
    #[error("decode target must be a struct or map, found {0}")]
    UnsupportedTarget(&'static str),

    #[error("{0}")]
    Custom(String),
}

impl de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DecodeError::Custom(msg.to_string())
    }
}

impl DecodeError {
    fn in_field(self, field: &str) -> Self {
        match self {
            DecodeError::Field { .. } => self,
            other => DecodeError::Field {
                field: field.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Name of the field that failed, if known.
    pub fn field(&self) -> Option<&str> {
        match self {
            DecodeError::Field { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Stateless decoder from [`Values`] into serde types.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueDecoder;

impl ValueDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode `values` into `target` in place.
    ///
    /// On error `target` is left unchanged.
    pub fn decode_into<T>(&self, target: &mut T, values: &Values) -> Result<(), DecodeError>
    where
        T: Serialize + DeserializeOwned,
    {
        let existing = match serde_json::to_value(&*target)
            .map_err(|e| DecodeError::Custom(e.to_string()))?
        {
            Value::Object(map) => map,
            Value::Null => return Err(DecodeError::UnsupportedTarget("null")),
            Value::Bool(_) => return Err(DecodeError::UnsupportedTarget("bool")),
            Value::Number(_) => return Err(DecodeError::UnsupportedTarget("number")),
            Value::String(_) => return Err(DecodeError::UnsupportedTarget("string")),
            Value::Array(_) => return Err(DecodeError::UnsupportedTarget("sequence")),
        };
        *target = T::deserialize(SourceDeserializer::new(values, existing))?;
        Ok(())
    }

    /// Decode `values` into a fresh `T`.
    ///
    /// Fields without a key must be optional or carry `#[serde(default)]`.
    pub fn decode<T: DeserializeOwned>(&self, values: &Values) -> Result<T, DecodeError> {
        T::deserialize(SourceDeserializer::new(values, Map::new()))
    }
}

enum Entry<'a> {
    Submitted(&'a [String]),
    Existing(Value),
}

/// Top-level deserializer: submitted values layered over the target's
/// current fields.
struct SourceDeserializer<'a> {
    entries: Vec<(String, Entry<'a>)>,
}

impl<'a> SourceDeserializer<'a> {
    fn new(values: &'a Values, mut existing: Map<String, Value>) -> Self {
        let mut entries = Vec::with_capacity(values.len() + existing.len());
        for (key, submitted) in values.iter() {
            let blank = submitted.last().map_or(true, |v| v.is_empty());
            match existing.remove(key) {
                Some(current) if blank => entries.push((key.to_string(), Entry::Existing(current))),
                _ => entries.push((key.to_string(), Entry::Submitted(submitted))),
            }
        }
        entries.extend(existing.into_iter().map(|(k, v)| (k, Entry::Existing(v))));
        Self { entries }
    }
}

impl<'de, 'a> Deserializer<'de> for SourceDeserializer<'a> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_map(SourceMap {
            entries: self.entries.into_iter(),
            pending: None,
        })
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

struct SourceMap<'a> {
    entries: std::vec::IntoIter<(String, Entry<'a>)>,
    pending: Option<(String, Entry<'a>)>,
}

impl<'de, 'a> MapAccess<'de> for SourceMap<'a> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.entries.next() {
            Some((key, entry)) => {
                let decoded = seed.deserialize(StringDeserializer::<DecodeError>::new(key.clone()))?;
                self.pending = Some((key, entry));
                Ok(Some(decoded))
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Self::Error> {
        let (key, entry) = self
            .pending
            .take()
            .ok_or_else(|| DecodeError::Custom("value requested before key".to_string()))?;
        match entry {
            Entry::Submitted(values) => seed
                .deserialize(FieldDeserializer { values })
                .map_err(|e| e.in_field(&key)),
            Entry::Existing(value) => seed
                .deserialize(value)
                .map_err(|e| DecodeError::Custom(e.to_string()).in_field(&key)),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// Deserializes the submitted values of a single key.
struct FieldDeserializer<'a> {
    values: &'a [String],
}

impl<'a> FieldDeserializer<'a> {
    fn last(&self) -> &'a str {
        self.values.last().map_or("", String::as_str)
    }

    fn parse<T: std::str::FromStr>(&self, expected: &'static str) -> Result<T, DecodeError> {
        let raw = self.last();
        raw.parse().map_err(|_| DecodeError::InvalidValue {
            value: raw.to_string(),
            expected,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

macro_rules! deserialize_number {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                visitor.$visit(self.parse::<$ty>(stringify!($ty))?)
            }
        )*
    };
}

impl<'de, 'a> Deserializer<'de> for FieldDeserializer<'a> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if self.values.len() > 1 {
            self.deserialize_seq(visitor)
        } else {
            visitor.visit_str(self.last())
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let raw = self.last();
        match parse_bool(raw) {
            Some(b) => visitor.visit_bool(b),
            None => Err(DecodeError::InvalidValue {
                value: raw.to_string(),
                expected: "bool",
            }),
        }
    }

    deserialize_number! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let raw = self.last();
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(DecodeError::InvalidValue {
                value: raw.to_string(),
                expected: "char",
            }),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_str(self.last())
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_string(self.last().to_string())
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_bytes(self.last().as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_byte_buf(self.last().as_bytes().to_vec())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if self.last().is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(ValueSeq {
            values: self.values.iter(),
        })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_enum(StringDeserializer::<DecodeError>::new(self.last().to_string()))
    }

    forward_to_deserialize_any! {
        unit_struct tuple tuple_struct map struct identifier ignored_any
    }
}

struct ValueSeq<'a> {
    values: std::slice::Iter<'a, String>,
}

impl<'de, 'a> SeqAccess<'de> for ValueSeq<'a> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        match self.values.next() {
            Some(value) => seed
                .deserialize(FieldDeserializer {
                    values: std::slice::from_ref(value),
                })
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.values.len())
    }
}
