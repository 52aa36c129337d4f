//! Dynamic message classes bound to pool-resident descriptors.
//!
//! This module derives a runtime-usable handle — a [`MessageClass`] — from a
//! message descriptor. The class exposes typed get/set operations over a
//! [`DynamicMessage`], a contiguous field-slot array addressed through a
//! per-descriptor offset table built once and memoized.
//!
//! Map fields are presented to callers as genuine key-unique mappings while
//! the descriptor keeps the synthetic two-field entry representation the wire
//! format requires; [`DynamicMessage::map_entries`] and
//! [`DynamicMessage::set_map_entries`] perform the translation at the
//! serialization boundary.

mod value;

use crate::descriptor::{Cardinality, Descriptor, FieldDescriptor, FieldKind, MessageDescriptor};
use crate::error::{Error, Result};
use crate::pool::DescriptorPool;
use std::collections::HashMap;
use std::sync::Arc;

pub use value::{MapKey, Value};

/// Per-descriptor slot lookup table, built once per message descriptor.
///
/// Slots index into a [`DynamicMessage`]'s field array in declaration order.
#[derive(Debug)]
pub(crate) struct FieldTable {
    by_name: HashMap<String, usize>,
    by_number: HashMap<u32, usize>,
    len: usize,
}

impl FieldTable {
    fn build(descriptor: &MessageDescriptor) -> Self {
        let mut by_name = HashMap::with_capacity(descriptor.fields().len());
        let mut by_number = HashMap::with_capacity(descriptor.fields().len());

        for (slot, field) in descriptor.fields().iter().enumerate() {
            by_name.insert(field.name().to_string(), slot);
            by_number.insert(field.number(), slot);
        }

        Self {
            len: descriptor.fields().len(),
            by_name,
            by_number,
        }
    }
}

/// A stateless set of typed accessors over one message descriptor.
///
/// Cheap to clone; the descriptor and slot table are shared. Binding the same
/// descriptor twice yields classes backed by the same memoized table.
#[derive(Debug, Clone)]
pub struct MessageClass {
    pool: DescriptorPool,
    descriptor: Arc<MessageDescriptor>,
    table: Arc<FieldTable>,
}

impl MessageClass {
    /// Binds a message descriptor to its pool, yielding an accessor class
    pub fn bind(pool: DescriptorPool, descriptor: Arc<MessageDescriptor>) -> Self {
        let table = descriptor
            .table_cell()
            .get_or_init(|| Arc::new(FieldTable::build(&descriptor)))
            .clone();

        Self {
            pool,
            descriptor,
            table,
        }
    }

    /// Returns the bound message descriptor
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// Returns the fully-qualified name of the bound message type
    pub fn full_name(&self) -> &str {
        self.descriptor.full_name()
    }

    /// Creates an empty instance with every field unset
    pub fn new_instance(&self) -> DynamicMessage {
        DynamicMessage {
            class: self.clone(),
            slots: vec![None; self.table.len],
        }
    }

    fn field(&self, name: &str) -> Result<(usize, &FieldDescriptor)> {
        let slot = self
            .table
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::unknown_field(self.full_name(), name))?;
        Ok((slot, &self.descriptor.fields()[slot]))
    }

    fn field_by_number(&self, number: u32) -> Result<(usize, &FieldDescriptor)> {
        let slot = self
            .table
            .by_number
            .get(&number)
            .copied()
            .ok_or_else(|| Error::unknown_field(self.full_name(), format!("#{number}")))?;
        Ok((slot, &self.descriptor.fields()[slot]))
    }

    /// The well-defined value for an unset field: zero/empty for scalars,
    /// empty list/map for repeated/map fields, a default instance for
    /// message fields. Resolution failures surface here, at the access site.
    fn default_of(&self, field: &FieldDescriptor) -> Result<Value> {
        match field.cardinality() {
            Cardinality::Repeated => Ok(Value::List(Vec::new())),
            Cardinality::Map => Ok(Value::Map(HashMap::new())),
            Cardinality::Singular => match field.kind() {
                FieldKind::Message(_) => {
                    let target = self.resolve_message(field)?;
                    let class = MessageClass::bind(self.pool.clone(), target);
                    Ok(Value::Message(class.new_instance()))
                }
                FieldKind::Enum(_) => {
                    self.pool.resolve_field(field)?;
                    Ok(Value::EnumNumber(0))
                }
                kind => Ok(scalar_default(kind)),
            },
        }
    }

    fn resolve_message(&self, field: &FieldDescriptor) -> Result<Arc<MessageDescriptor>> {
        match self.pool.resolve_field(field)? {
            Descriptor::Message(m) => Ok(m),
            Descriptor::Enum(e) => Err(Error::invalid_descriptor(
                e.full_name(),
                "expected a message type",
            )),
        }
    }

    fn check(&self, field: &FieldDescriptor, value: &Value) -> Result<()> {
        match field.cardinality() {
            Cardinality::Singular => self.check_single(field, value),
            Cardinality::Repeated => match value {
                Value::List(items) => items.iter().try_for_each(|v| self.check_single(field, v)),
                _ => Err(Error::type_mismatch(
                    field.full_name(),
                    format!("repeated {}", field.kind()),
                )),
            },
            Cardinality::Map => self.check_map(field, value),
        }
    }

    fn check_single(&self, field: &FieldDescriptor, value: &Value) -> Result<()> {
        match field.kind() {
            FieldKind::Message(_) => {
                let target = self.resolve_message(field)?;
                match value {
                    Value::Message(m) if m.descriptor().full_name() == target.full_name() => Ok(()),
                    _ => Err(Error::type_mismatch(
                        field.full_name(),
                        format!("message {}", target.full_name()),
                    )),
                }
            }
            FieldKind::Enum(name) => {
                self.pool.resolve_field(field)?;
                match value {
                    Value::EnumNumber(_) => Ok(()),
                    _ => Err(Error::type_mismatch(
                        field.full_name(),
                        format!("enum {}", name),
                    )),
                }
            }
            kind => {
                if scalar_accepts(kind, value) {
                    Ok(())
                } else {
                    Err(Error::type_mismatch(field.full_name(), kind.to_string()))
                }
            }
        }
    }

    fn check_map(&self, field: &FieldDescriptor, value: &Value) -> Result<()> {
        let (key_field, value_field) = field.map_entry_fields().ok_or_else(|| {
            Error::invalid_descriptor(field.full_name(), "map field has no entry message")
        })?;

        let map = match value {
            Value::Map(map) => map,
            _ => {
                return Err(Error::type_mismatch(
                    field.full_name(),
                    format!("map<{}, {}>", key_field.kind(), value_field.kind()),
                ))
            }
        };

        for (key, entry_value) in map {
            if !map_key_accepts(key_field.kind(), key) {
                return Err(Error::type_mismatch(
                    field.full_name(),
                    format!("map key of kind {}", key_field.kind()),
                ));
            }
            self.check_single(value_field, entry_value)?;
        }

        Ok(())
    }
}

/// One message instance: a field-slot array addressed through its class.
///
/// `None` slots are unset; reads materialize the field's default instead.
#[derive(Debug, Clone)]
pub struct DynamicMessage {
    class: MessageClass,
    slots: Vec<Option<Value>>,
}

impl PartialEq for DynamicMessage {
    fn eq(&self, other: &Self) -> bool {
        self.class.full_name() == other.class.full_name() && self.slots == other.slots
    }
}

impl DynamicMessage {
    /// Returns the accessor class this instance belongs to
    pub fn class(&self) -> &MessageClass {
        &self.class
    }

    /// Returns the descriptor of this instance's message type
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        self.class.descriptor()
    }

    /// Reads a field by name.
    ///
    /// Unset fields yield their default value, never an error; an unset
    /// message field yields an empty instance of the target type.
    pub fn get(&self, name: &str) -> Result<Value> {
        let (slot, field) = self.class.field(name)?;
        match &self.slots[slot] {
            Some(value) => Ok(value.clone()),
            None => self.class.default_of(field),
        }
    }

    /// Reads a field by declared number
    pub fn get_by_number(&self, number: u32) -> Result<Value> {
        let (slot, field) = self.class.field_by_number(number)?;
        match &self.slots[slot] {
            Some(value) => Ok(value.clone()),
            None => self.class.default_of(field),
        }
    }

    /// Writes a field by name.
    ///
    /// The value is checked against the field's declared kind before any
    /// state changes; on mismatch the instance is left untouched.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let (slot, field) = self.class.field(name)?;
        self.class.check(field, &value)?;
        self.slots[slot] = Some(value);
        Ok(())
    }

    /// Returns true if the field has been explicitly set
    pub fn has(&self, name: &str) -> Result<bool> {
        let (slot, _) = self.class.field(name)?;
        Ok(self.slots[slot].is_some())
    }

    /// Unsets a field, restoring its default on the next read
    pub fn clear(&mut self, name: &str) -> Result<()> {
        let (slot, _) = self.class.field(name)?;
        self.slots[slot] = None;
        Ok(())
    }

    /// Appends a value to a repeated field
    pub fn push(&mut self, name: &str, value: Value) -> Result<()> {
        let (slot, field) = self.class.field(name)?;
        if field.cardinality() != Cardinality::Repeated {
            return Err(Error::type_mismatch(
                field.full_name(),
                format!("repeated {}", field.kind()),
            ));
        }
        self.class.check_single(field, &value)?;

        match self.slots[slot].get_or_insert_with(|| Value::List(Vec::new())) {
            Value::List(items) => items.push(value),
            other => {
                return Err(Error::type_mismatch(
                    field.full_name(),
                    format!("repeated {}, found {}", field.kind(), other.kind_name()),
                ))
            }
        }
        Ok(())
    }

    /// Inserts a key/value pair into a map field, replacing any existing
    /// value for the key
    pub fn insert(&mut self, name: &str, key: MapKey, value: Value) -> Result<()> {
        let (slot, field) = self.class.field(name)?;
        let (key_field, value_field) = field.map_entry_fields().ok_or_else(|| {
            Error::type_mismatch(field.full_name(), "map field".to_string())
        })?;

        if !map_key_accepts(key_field.kind(), &key) {
            return Err(Error::type_mismatch(
                field.full_name(),
                format!("map key of kind {}", key_field.kind()),
            ));
        }
        self.class.check_single(value_field, &value)?;

        match self.slots[slot].get_or_insert_with(|| Value::Map(HashMap::new())) {
            Value::Map(map) => {
                map.insert(key, value);
            }
            other => {
                return Err(Error::type_mismatch(
                    field.full_name(),
                    format!("map, found {}", other.kind_name()),
                ))
            }
        }
        Ok(())
    }

    /// Materializes a map field into synthetic entry instances (`key` = 1,
    /// `value` = 2), the representation an instance codec serializes.
    ///
    /// Entry order is not significant.
    pub fn map_entries(&self, name: &str) -> Result<Vec<DynamicMessage>> {
        let (_, field) = self.class.field(name)?;
        let entry_descriptor = field.map_entry_message().ok_or_else(|| {
            Error::type_mismatch(field.full_name(), "map field".to_string())
        })?;

        let map = match self.get(name)? {
            Value::Map(map) => map,
            // A map slot only ever holds Value::Map; get() defaults to empty
            _ => HashMap::new(),
        };

        let (key_field, value_field) = field.map_entry_fields().ok_or_else(|| {
            Error::invalid_descriptor(field.full_name(), "map field has no entry message")
        })?;
        let (key_name, value_name) = (key_field.name().to_string(), value_field.name().to_string());

        let entry_class = MessageClass::bind(self.class.pool.clone(), entry_descriptor.clone());
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let mut entry = entry_class.new_instance();
            entry.set(&key_name, key.to_value())?;
            entry.set(&value_name, value)?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Replaces a map field from synthetic entry instances, folding duplicate
    /// keys (last entry wins)
    pub fn set_map_entries(&mut self, name: &str, entries: Vec<DynamicMessage>) -> Result<()> {
        let (_, field) = self.class.field(name)?;
        let entry_descriptor = field.map_entry_message().ok_or_else(|| {
            Error::type_mismatch(field.full_name(), "map field".to_string())
        })?;

        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            if entry.descriptor().full_name() != entry_descriptor.full_name() {
                return Err(Error::type_mismatch(
                    field.full_name(),
                    format!("entry message {}", entry_descriptor.full_name()),
                ));
            }
            let key = MapKey::from_value(&entry.get_by_number(1)?).ok_or_else(|| {
                Error::type_mismatch(field.full_name(), "key-capable entry key".to_string())
            })?;
            map.insert(key, entry.get_by_number(2)?);
        }

        self.set(name, Value::Map(map))
    }
}

fn scalar_default(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Double => Value::F64(0.0),
        FieldKind::Float => Value::F32(0.0),
        FieldKind::Int32 | FieldKind::Sint32 | FieldKind::Sfixed32 => Value::I32(0),
        FieldKind::Int64 | FieldKind::Sint64 | FieldKind::Sfixed64 => Value::I64(0),
        FieldKind::Uint32 | FieldKind::Fixed32 => Value::U32(0),
        FieldKind::Uint64 | FieldKind::Fixed64 => Value::U64(0),
        FieldKind::Bool => Value::Bool(false),
        FieldKind::String => Value::String(String::new()),
        FieldKind::Bytes => Value::Bytes(bytes::Bytes::new()),
        // Message/enum defaults are produced by the caller
        FieldKind::Message(_) | FieldKind::Enum(_) => Value::EnumNumber(0),
    }
}

fn scalar_accepts(kind: &FieldKind, value: &Value) -> bool {
    use FieldKind as K;
    matches!(
        (kind, value),
        (K::Double, Value::F64(_))
            | (K::Float, Value::F32(_))
            | (K::Int32 | K::Sint32 | K::Sfixed32, Value::I32(_))
            | (K::Int64 | K::Sint64 | K::Sfixed64, Value::I64(_))
            | (K::Uint32 | K::Fixed32, Value::U32(_))
            | (K::Uint64 | K::Fixed64, Value::U64(_))
            | (K::Bool, Value::Bool(_))
            | (K::String, Value::String(_))
            | (K::Bytes, Value::Bytes(_))
    )
}

fn map_key_accepts(kind: &FieldKind, key: &MapKey) -> bool {
    use FieldKind as K;
    matches!(
        (kind, key),
        (K::Int32 | K::Sint32 | K::Sfixed32, MapKey::I32(_))
            | (K::Int64 | K::Sint64 | K::Sfixed64, MapKey::I64(_))
            | (K::Uint32 | K::Fixed32, MapKey::U32(_))
            | (K::Uint64 | K::Fixed64, MapKey::U64(_))
            | (K::Bool, MapKey::Bool(_))
            | (K::String, MapKey::String(_))
    )
}
