//! Runtime values held by dynamic message fields.

use crate::message::DynamicMessage;
use bytes::Bytes;
use std::collections::HashMap;

/// A value assignable to a dynamic message field.
///
/// Scalar variants mirror the protobuf scalar kinds (the four integer wire
/// encodings of each width share a variant). Repeated fields hold [`Value::List`],
/// map fields hold [`Value::Map`] keyed by [`MapKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean value
    Bool(bool),
    /// Signed 32-bit integer (int32, sint32, sfixed32)
    I32(i32),
    /// Signed 64-bit integer (int64, sint64, sfixed64)
    I64(i64),
    /// Unsigned 32-bit integer (uint32, fixed32)
    U32(u32),
    /// Unsigned 64-bit integer (uint64, fixed64)
    U64(u64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Bytes),
    /// Enum value by number
    EnumNumber(i32),
    /// Nested message instance
    Message(DynamicMessage),
    /// Ordered sequence for repeated fields
    List(Vec<Value>),
    /// Key-unique mapping for map fields
    Map(HashMap<MapKey, Value>),
}

impl Value {
    /// Returns a short name of the value's own kind, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::EnumNumber(_) => "enum",
            Value::Message(_) => "message",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Returns the boolean value, if this is a [`Value::Bool`]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i32 value, if this is a [`Value::I32`]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i64 value, if this is a [`Value::I64`]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value, if this is a [`Value::String`]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the nested message, if this is a [`Value::Message`]
    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the list, if this is a [`Value::List`]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the mapping, if this is a [`Value::Map`]
    pub fn as_map(&self) -> Option<&HashMap<MapKey, Value>> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// A map field key.
///
/// Protobuf restricts map keys to integral, boolean, and string kinds; float,
/// bytes, and message keys do not exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    /// Boolean key
    Bool(bool),
    /// Signed 32-bit key
    I32(i32),
    /// Signed 64-bit key
    I64(i64),
    /// Unsigned 32-bit key
    U32(u32),
    /// Unsigned 64-bit key
    U64(u64),
    /// String key
    String(String),
}

impl MapKey {
    /// Converts the key into the equivalent field value
    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Bool(v) => Value::Bool(*v),
            MapKey::I32(v) => Value::I32(*v),
            MapKey::I64(v) => Value::I64(*v),
            MapKey::U32(v) => Value::U32(*v),
            MapKey::U64(v) => Value::U64(*v),
            MapKey::String(v) => Value::String(v.clone()),
        }
    }

    /// Converts a field value into a key, if it has a key-capable kind
    pub fn from_value(value: &Value) -> Option<MapKey> {
        match value {
            Value::Bool(v) => Some(MapKey::Bool(*v)),
            Value::I32(v) => Some(MapKey::I32(*v)),
            Value::I64(v) => Some(MapKey::I64(*v)),
            Value::U32(v) => Some(MapKey::U32(*v)),
            Value::U64(v) => Some(MapKey::U64(*v)),
            Value::String(v) => Some(MapKey::String(v.clone())),
            _ => None,
        }
    }
}

impl From<&str> for MapKey {
    fn from(v: &str) -> Self {
        MapKey::String(v.to_string())
    }
}

impl From<String> for MapKey {
    fn from(v: String) -> Self {
        MapKey::String(v)
    }
}

impl From<i32> for MapKey {
    fn from(v: i32) -> Self {
        MapKey::I32(v)
    }
}

impl From<i64> for MapKey {
    fn from(v: i64) -> Self {
        MapKey::I64(v)
    }
}
