//! Error types for the protopool-core library.
//!
//! This module provides comprehensive error handling using the `thiserror` crate,
//! with detailed error variants for different failure modes.

use thiserror::Error;

/// Result type alias for protopool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all protopool operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid protobuf wire format
    #[error("invalid protobuf wire format at offset {offset}: {details}")]
    InvalidWireFormat {
        /// Byte offset where the error occurred
        offset: usize,
        /// Detailed description of the issue
        details: String,
    },

    /// Failed to decode varint
    #[error("failed to decode varint at offset {offset}: buffer too small or invalid encoding")]
    VarintDecode {
        /// Byte offset where the error occurred
        offset: usize,
    },

    /// Failed to decode a FileDescriptorProto
    #[error("failed to decode descriptor: {0}")]
    DescriptorDecode(#[from] prost::DecodeError),

    /// Invalid field number in descriptor
    #[error("invalid field number {number}: must be between 1 and {max}")]
    InvalidFieldNumber {
        /// The invalid field number
        number: u32,
        /// Maximum valid field number
        max: u32,
    },

    /// Two fields within one message declare the same number
    #[error("duplicate field number {number} in message '{message}'")]
    DuplicateFieldNumber {
        /// Fully-qualified name of the message
        message: String,
        /// The duplicated field number
        number: u32,
    },

    /// Descriptor content violates a structural invariant
    #[error("invalid descriptor for '{symbol}': {details}")]
    InvalidDescriptor {
        /// The offending symbol
        symbol: String,
        /// Detailed description of the issue
        details: String,
    },

    /// Unsupported proto syntax version
    #[error("unsupported proto syntax: '{syntax}'")]
    UnsupportedSyntax {
        /// The unsupported syntax string
        syntax: String,
    },

    /// A file with this name but different content is already registered
    #[error("file '{file}' is already registered with different content")]
    AlreadyRegistered {
        /// The conflicting file name
        file: String,
    },

    /// Two registered files declare the same fully-qualified type name
    #[error("type '{symbol}' from file '{file}' is already registered")]
    DuplicateSymbol {
        /// The duplicated fully-qualified name
        symbol: String,
        /// The file attempting the second registration
        file: String,
    },

    /// Lookup of a name that was never registered
    #[error("name '{name}' not found in descriptor pool")]
    NotFound {
        /// The fully-qualified name that was looked up
        name: String,
    },

    /// Accessor request for a field the message does not declare
    #[error("message '{message}' has no field named '{field}'")]
    UnknownField {
        /// Fully-qualified name of the message
        message: String,
        /// The unknown field name
        field: String,
    },

    /// A cross-type reference that never resolved against the pool
    #[error("unresolved reference to '{symbol}' from field '{referrer}'")]
    UnresolvedReference {
        /// The referenced fully-qualified name
        symbol: String,
        /// The field holding the reference
        referrer: String,
    },

    /// Value incompatible with the field's declared kind
    #[error("type mismatch for field '{field}': expected {expected}")]
    TypeMismatch {
        /// Fully-qualified field name
        field: String,
        /// Description of the expected kind
        expected: String,
    },
}

impl Error {
    /// Creates a new wire format error
    pub fn invalid_wire_format(offset: usize, details: impl Into<String>) -> Self {
        Self::InvalidWireFormat {
            offset,
            details: details.into(),
        }
    }

    /// Creates a new varint decode error
    pub fn varint_decode(offset: usize) -> Self {
        Self::VarintDecode { offset }
    }

    /// Creates a new invalid descriptor error
    pub fn invalid_descriptor(symbol: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            symbol: symbol.into(),
            details: details.into(),
        }
    }

    /// Creates a new already-registered error
    pub fn already_registered(file: impl Into<String>) -> Self {
        Self::AlreadyRegistered { file: file.into() }
    }

    /// Creates a new not-found error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates a new unknown-field error
    pub fn unknown_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            message: message.into(),
            field: field.into(),
        }
    }

    /// Creates a new unresolved reference error
    pub fn unresolved(symbol: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            symbol: symbol.into(),
            referrer: referrer.into(),
        }
    }

    /// Creates a new type mismatch error
    pub fn type_mismatch(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// Shifts any embedded byte offset by `base`.
    ///
    /// Used when a sub-slice was parsed and the error should report a position
    /// within the original buffer.
    pub fn offset_by(self, base: usize) -> Self {
        match self {
            Self::InvalidWireFormat { offset, details } => Self::InvalidWireFormat {
                offset: offset + base,
                details,
            },
            Self::VarintDecode { offset } => Self::VarintDecode {
                offset: offset + base,
            },
            other => other,
        }
    }
}
