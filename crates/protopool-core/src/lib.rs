//! # protopool-core
//!
//! A descriptor pool and dynamic accessor runtime for Protocol Buffer schemas.
//!
//! This crate provides the core functionality for:
//! - Parsing serialized `FileDescriptorProto` blobs into validated descriptors
//! - Registering descriptors into a shared, name-keyed pool
//! - Binding message descriptors into typed dynamic accessor classes
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`descriptor`]: Blob parsing and the immutable descriptor data model
//! - [`pool`]: The shared registry and lazy cross-type resolution
//! - [`message`]: Accessor classes and dynamic message instances
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use protopool_core::{DescriptorPool, Value};
//! use prost_types::field_descriptor_proto::{Label, Type};
//! use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};
//!
//! let file = FileDescriptorProto {
//!     name: Some("limits.proto".into()),
//!     package: Some("cloud.v1".into()),
//!     syntax: Some("proto3".into()),
//!     message_type: vec![DescriptorProto {
//!         name: Some("Limits".into()),
//!         field: vec![FieldDescriptorProto {
//!             name: Some("actions_per_second_limit".into()),
//!             number: Some(1),
//!             label: Some(Label::Optional as i32),
//!             r#type: Some(Type::Int32 as i32),
//!             ..Default::default()
//!         }],
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let pool = DescriptorPool::new();
//! pool.add_file(file)?;
//!
//! let class = pool.bind("cloud.v1.Limits")?;
//! let mut limits = class.new_instance();
//! limits.set("actions_per_second_limit", Value::I32(100))?;
//! assert_eq!(limits.get("actions_per_second_limit")?, Value::I32(100));
//! # Ok::<(), protopool_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod descriptor;
pub mod error;
pub mod message;
pub mod pool;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export primary types for convenience
pub use descriptor::{
    parse, Cardinality, Descriptor, EnumDescriptor, FieldDescriptor, FieldKind, FileDescriptor,
    MessageDescriptor, Syntax,
};
pub use error::{Error, Result};
pub use message::{DynamicMessage, MapKey, MessageClass, Value};
pub use pool::DescriptorPool;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum valid protobuf field number (2^29 - 1)
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;
