//! Descriptor parsing and the immutable descriptor data model.
//!
//! This module decodes a serialized `FileDescriptorProto` blob into an owned
//! tree of file/message/field/enum descriptors.
//!
//! ## Architecture
//!
//! Parsing happens in three stages:
//!
//! 1. A structural wire-format pre-check ([`wire::validate_message`]) that
//!    rejects malformed bytes with the offending byte offset
//! 2. A `prost_types::FileDescriptorProto` decode, which keeps the blob
//!    format bit-for-bit compatible with standard serializers
//! 3. A validated conversion into the descriptor tree: duplicate field
//!    numbers are rejected, map-entry messages are detected and attached to
//!    their owning field, and message/enum type references are kept as
//!    fully-qualified name strings for lazy resolution against the pool
//!
//! Descriptors are immutable once built; cross-type references resolve on
//! first use via [`crate::DescriptorPool::resolve_field`].

pub mod wire;

use crate::error::{Error, Result};
use crate::message::FieldTable;
use crate::MAX_FIELD_NUMBER;
use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Proto syntax version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Proto2 syntax
    Proto2,
    /// Proto3 syntax
    Proto3,
}

impl Syntax {
    /// Returns the syntax declaration string
    pub fn as_str(&self) -> &'static str {
        match self {
            Syntax::Proto2 => "proto2",
            Syntax::Proto3 => "proto3",
        }
    }
}

impl TryFrom<&str> for Syntax {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "" | "proto2" => Ok(Syntax::Proto2),
            "proto3" => Ok(Syntax::Proto3),
            _ => Err(Error::UnsupportedSyntax {
                syntax: value.to_string(),
            }),
        }
    }
}

/// Cardinality of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// At most one value
    Singular,
    /// Ordered sequence of values
    Repeated,
    /// Key/value mapping, represented on the wire as a repeated synthetic
    /// entry message
    Map,
}

/// Declared kind of a field value.
///
/// Message and enum kinds carry the fully-qualified name of the target type
/// (without the leading dot); the target descriptor is resolved lazily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// 64-bit float
    Double,
    /// 32-bit float
    Float,
    /// Varint-encoded signed 32-bit integer
    Int32,
    /// Varint-encoded signed 64-bit integer
    Int64,
    /// Varint-encoded unsigned 32-bit integer
    Uint32,
    /// Varint-encoded unsigned 64-bit integer
    Uint64,
    /// Zigzag-encoded signed 32-bit integer
    Sint32,
    /// Zigzag-encoded signed 64-bit integer
    Sint64,
    /// Fixed-width unsigned 32-bit integer
    Fixed32,
    /// Fixed-width unsigned 64-bit integer
    Fixed64,
    /// Fixed-width signed 32-bit integer
    Sfixed32,
    /// Fixed-width signed 64-bit integer
    Sfixed64,
    /// Boolean
    Bool,
    /// UTF-8 string
    String,
    /// Raw byte sequence
    Bytes,
    /// Reference to a message type by fully-qualified name
    Message(std::string::String),
    /// Reference to an enum type by fully-qualified name
    Enum(std::string::String),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Double => write!(f, "double"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Int32 => write!(f, "int32"),
            FieldKind::Int64 => write!(f, "int64"),
            FieldKind::Uint32 => write!(f, "uint32"),
            FieldKind::Uint64 => write!(f, "uint64"),
            FieldKind::Sint32 => write!(f, "sint32"),
            FieldKind::Sint64 => write!(f, "sint64"),
            FieldKind::Fixed32 => write!(f, "fixed32"),
            FieldKind::Fixed64 => write!(f, "fixed64"),
            FieldKind::Sfixed32 => write!(f, "sfixed32"),
            FieldKind::Sfixed64 => write!(f, "sfixed64"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::String => write!(f, "string"),
            FieldKind::Bytes => write!(f, "bytes"),
            FieldKind::Message(name) | FieldKind::Enum(name) => write!(f, "{}", name),
        }
    }
}

/// A pool-resident type: either a message or an enum descriptor
#[derive(Debug, Clone)]
pub enum Descriptor {
    /// A message type
    Message(Arc<MessageDescriptor>),
    /// An enum type
    Enum(Arc<EnumDescriptor>),
}

impl Descriptor {
    /// Returns the fully-qualified name of the described type
    pub fn full_name(&self) -> &str {
        match self {
            Descriptor::Message(m) => m.full_name(),
            Descriptor::Enum(e) => e.full_name(),
        }
    }
}

/// A single field declaration within a message
#[derive(Debug)]
pub struct FieldDescriptor {
    name: String,
    full_name: String,
    number: u32,
    cardinality: Cardinality,
    kind: FieldKind,
    map_entry: Option<Arc<MessageDescriptor>>,
    resolved: OnceLock<Descriptor>,
}

impl FieldDescriptor {
    /// Returns the declared field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fully-qualified field name (`package.Message.field`)
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Returns the declared field number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Returns the field cardinality
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Returns the declared value kind
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// For map fields, returns the synthetic entry message descriptor
    pub fn map_entry_message(&self) -> Option<&Arc<MessageDescriptor>> {
        self.map_entry.as_ref()
    }

    /// For map fields, returns the (`key`, `value`) field descriptors of the
    /// synthetic entry message
    pub fn map_entry_fields(&self) -> Option<(&FieldDescriptor, &FieldDescriptor)> {
        let entry = self.map_entry.as_ref()?;
        Some((entry.field_by_number(1)?, entry.field_by_number(2)?))
    }

    pub(crate) fn resolved(&self) -> Option<&Descriptor> {
        self.resolved.get()
    }

    pub(crate) fn memoize_resolved(&self, descriptor: Descriptor) {
        let _ = self.resolved.set(descriptor);
    }
}

/// A message type declaration
#[derive(Debug)]
pub struct MessageDescriptor {
    name: String,
    full_name: String,
    fields: Vec<FieldDescriptor>,
    nested: Vec<Arc<MessageDescriptor>>,
    enums: Vec<Arc<EnumDescriptor>>,
    map_entry: bool,
    options: Option<prost_types::MessageOptions>,
    table: OnceLock<Arc<FieldTable>>,
}

impl MessageDescriptor {
    /// Returns the short message name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fully-qualified message name
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Returns the declared fields, in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns the field with the given number, if declared
    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }

    /// Returns the field with the given name, if declared
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the nested message types (including synthetic map entries)
    pub fn nested_messages(&self) -> &[Arc<MessageDescriptor>] {
        &self.nested
    }

    /// Returns the nested enum types
    pub fn nested_enums(&self) -> &[Arc<EnumDescriptor>] {
        &self.enums
    }

    /// Returns true if this is a synthetic map-entry message
    pub fn is_map_entry(&self) -> bool {
        self.map_entry
    }

    /// Returns the verbatim message options, if any
    pub fn options(&self) -> Option<&prost_types::MessageOptions> {
        self.options.as_ref()
    }

    pub(crate) fn table_cell(&self) -> &OnceLock<Arc<FieldTable>> {
        &self.table
    }
}

/// One named value of an enum type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDescriptor {
    /// The value name
    pub name: String,
    /// The declared number
    pub number: i32,
}

/// An enum type declaration
#[derive(Debug)]
pub struct EnumDescriptor {
    name: String,
    full_name: String,
    values: Vec<EnumValueDescriptor>,
}

impl EnumDescriptor {
    /// Returns the short enum name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fully-qualified enum name
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Returns the declared values, in declaration order
    pub fn values(&self) -> &[EnumValueDescriptor] {
        &self.values
    }
}

/// One parsed compilation unit: a named file with its type declarations
#[derive(Debug)]
pub struct FileDescriptor {
    name: String,
    package: String,
    syntax: Syntax,
    messages: Vec<Arc<MessageDescriptor>>,
    enums: Vec<Arc<EnumDescriptor>>,
    dependencies: Vec<String>,
    options: Option<prost_types::FileOptions>,
}

impl FileDescriptor {
    /// Returns the declared file name (e.g. `temporal/api/.../message.proto`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared package
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Returns the proto syntax version
    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    /// Returns the top-level message types
    pub fn messages(&self) -> &[Arc<MessageDescriptor>] {
        &self.messages
    }

    /// Returns the top-level enum types
    pub fn enums(&self) -> &[Arc<EnumDescriptor>] {
        &self.enums
    }

    /// Returns the names of imported files
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Returns the verbatim file options, if any.
    ///
    /// These carry per-language package hints and are stored uninterpreted.
    pub fn options(&self) -> Option<&prost_types::FileOptions> {
        self.options.as_ref()
    }

    /// Builds a file descriptor from an already-decoded proto
    pub fn from_proto(proto: &FileDescriptorProto) -> Result<Self> {
        if proto.name().is_empty() {
            return Err(Error::invalid_descriptor(
                proto.package(),
                "descriptor file has no name",
            ));
        }

        let syntax = Syntax::try_from(proto.syntax())?;
        let package = proto.package().to_string();

        let messages = proto
            .message_type
            .iter()
            .map(|m| convert_message(&package, m))
            .collect::<Result<Vec<_>>>()?;

        let enums = proto
            .enum_type
            .iter()
            .map(|e| convert_enum(&package, e))
            .collect::<Result<Vec<_>>>()?;

        trace!(
            file = proto.name(),
            messages = messages.len(),
            enums = enums.len(),
            "converted file descriptor"
        );

        Ok(Self {
            name: proto.name().to_string(),
            package,
            syntax,
            messages,
            enums,
            dependencies: proto.dependency.clone(),
            options: proto.options.clone(),
        })
    }
}

/// Parse a serialized `FileDescriptorProto` blob into a file descriptor.
///
/// Malformed bytes fail with an offset-bearing wire format error; structural
/// violations (duplicate field numbers, bad map entries) fail with the
/// offending symbol. Nothing is registered anywhere on failure.
pub fn parse(data: &[u8]) -> Result<FileDescriptor> {
    wire::validate_message(data)?;
    let proto = FileDescriptorProto::decode(data)?;
    FileDescriptor::from_proto(&proto)
}

/// Strips the leading dot from a fully-qualified type reference
fn trim_reference(type_name: &str) -> String {
    type_name.strip_prefix('.').unwrap_or(type_name).to_string()
}

fn convert_message(prefix: &str, proto: &DescriptorProto) -> Result<Arc<MessageDescriptor>> {
    if proto.name().is_empty() {
        return Err(Error::invalid_descriptor(prefix, "message has no name"));
    }

    let full_name = if prefix.is_empty() {
        proto.name().to_string()
    } else {
        format!("{}.{}", prefix, proto.name())
    };

    // Nested types first: map detection needs their resolved full names
    let nested = proto
        .nested_type
        .iter()
        .map(|n| convert_message(&full_name, n))
        .collect::<Result<Vec<_>>>()?;

    let enums = proto
        .enum_type
        .iter()
        .map(|e| convert_enum(&full_name, e))
        .collect::<Result<Vec<_>>>()?;

    let map_entry = proto
        .options
        .as_ref()
        .is_some_and(|o| o.map_entry.unwrap_or(false));

    let mut fields = Vec::with_capacity(proto.field.len());
    let mut seen_numbers = HashSet::new();

    for field in &proto.field {
        let converted = convert_field(&full_name, field, &nested)?;
        if !seen_numbers.insert(converted.number) {
            return Err(Error::DuplicateFieldNumber {
                message: full_name,
                number: converted.number,
            });
        }
        fields.push(converted);
    }

    if map_entry {
        validate_map_entry(&full_name, &fields)?;
    }

    Ok(Arc::new(MessageDescriptor {
        name: proto.name().to_string(),
        full_name,
        fields,
        nested,
        enums,
        map_entry,
        options: proto.options.clone(),
        table: OnceLock::new(),
    }))
}

fn convert_field(
    message: &str,
    proto: &FieldDescriptorProto,
    nested: &[Arc<MessageDescriptor>],
) -> Result<FieldDescriptor> {
    let full_name = format!("{}.{}", message, proto.name());

    if proto.name().is_empty() {
        return Err(Error::invalid_descriptor(message, "field has no name"));
    }

    let number = proto.number();
    if number < 1 || number > MAX_FIELD_NUMBER as i32 {
        return Err(Error::InvalidFieldNumber {
            number: number as u32,
            max: MAX_FIELD_NUMBER,
        });
    }

    let kind = match proto.r#type() {
        Type::Double => FieldKind::Double,
        Type::Float => FieldKind::Float,
        Type::Int32 => FieldKind::Int32,
        Type::Int64 => FieldKind::Int64,
        Type::Uint32 => FieldKind::Uint32,
        Type::Uint64 => FieldKind::Uint64,
        Type::Sint32 => FieldKind::Sint32,
        Type::Sint64 => FieldKind::Sint64,
        Type::Fixed32 => FieldKind::Fixed32,
        Type::Fixed64 => FieldKind::Fixed64,
        Type::Sfixed32 => FieldKind::Sfixed32,
        Type::Sfixed64 => FieldKind::Sfixed64,
        Type::Bool => FieldKind::Bool,
        Type::String => FieldKind::String,
        Type::Bytes => FieldKind::Bytes,
        Type::Message => FieldKind::Message(trim_reference(proto.type_name())),
        Type::Enum => FieldKind::Enum(trim_reference(proto.type_name())),
        Type::Group => {
            return Err(Error::invalid_descriptor(
                full_name,
                "group fields are not supported",
            ))
        }
    };

    // A repeated field whose target is a sibling map-entry message is a map;
    // the synthetic entry descriptor rides along on the field itself
    let mut map_entry = None;
    let cardinality = if proto.label() == Label::Repeated {
        if let FieldKind::Message(target) = &kind {
            map_entry = nested
                .iter()
                .find(|n| n.is_map_entry() && n.full_name() == target)
                .cloned();
        }
        if map_entry.is_some() {
            Cardinality::Map
        } else {
            Cardinality::Repeated
        }
    } else {
        Cardinality::Singular
    };

    Ok(FieldDescriptor {
        name: proto.name().to_string(),
        full_name,
        number: number as u32,
        cardinality,
        kind,
        map_entry,
        resolved: OnceLock::new(),
    })
}

/// Checks that a map-entry message has exactly `key = 1` and `value = 2`,
/// with a key kind the map representation supports
fn validate_map_entry(full_name: &str, fields: &[FieldDescriptor]) -> Result<()> {
    if fields.len() != 2 {
        return Err(Error::invalid_descriptor(
            full_name,
            format!("map entry must have exactly 2 fields, has {}", fields.len()),
        ));
    }

    let key = fields.iter().find(|f| f.number == 1).ok_or_else(|| {
        Error::invalid_descriptor(full_name, "map entry has no key field (number 1)")
    })?;
    fields.iter().find(|f| f.number == 2).ok_or_else(|| {
        Error::invalid_descriptor(full_name, "map entry has no value field (number 2)")
    })?;

    match key.kind {
        FieldKind::Bool
        | FieldKind::Int32
        | FieldKind::Int64
        | FieldKind::Uint32
        | FieldKind::Uint64
        | FieldKind::Sint32
        | FieldKind::Sint64
        | FieldKind::Fixed32
        | FieldKind::Fixed64
        | FieldKind::Sfixed32
        | FieldKind::Sfixed64
        | FieldKind::String => Ok(()),
        _ => Err(Error::invalid_descriptor(
            full_name,
            format!("invalid map key kind: {}", key.kind),
        )),
    }
}

fn convert_enum(prefix: &str, proto: &EnumDescriptorProto) -> Result<Arc<EnumDescriptor>> {
    if proto.name().is_empty() {
        return Err(Error::invalid_descriptor(prefix, "enum has no name"));
    }

    let full_name = if prefix.is_empty() {
        proto.name().to_string()
    } else {
        format!("{}.{}", prefix, proto.name())
    };

    let values = proto
        .value
        .iter()
        .map(|v| EnumValueDescriptor {
            name: v.name().to_string(),
            number: v.number(),
        })
        .collect();

    Ok(Arc::new(EnumDescriptor {
        name: proto.name().to_string(),
        full_name,
        values,
    }))
}
