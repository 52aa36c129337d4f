//! Low-level protobuf wire format parsing.
//!
//! This module implements the wire format primitives needed to structurally
//! validate a serialized descriptor blob before it is decoded.
//!
//! ## Wire Format Overview
//!
//! Each protobuf field is encoded as:
//! - A varint "tag" containing the field number and wire type
//! - The field data (format depends on wire type)
//!
//! Wire types:
//! - 0: VARINT (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
//! - 1: I64 (fixed64, sfixed64, double)
//! - 2: LEN (string, bytes, embedded messages, packed repeated fields)
//! - 5: I32 (fixed32, sfixed32, float)

use crate::error::{Error, Result};
use crate::MAX_FIELD_NUMBER;

/// Protobuf wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 64-bit fixed-width
    I64 = 1,
    /// Length-delimited (strings, bytes, embedded messages)
    Len = 2,
    /// Start group (deprecated)
    StartGroup = 3,
    /// End group (deprecated)
    EndGroup = 4,
    /// 32-bit fixed-width
    I32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::I32),
            _ => Err(Error::invalid_wire_format(
                0,
                format!("unknown wire type: {}", value),
            )),
        }
    }
}

/// Decode a varint from the given bytes.
///
/// Returns the decoded value and the number of bytes consumed.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in data.iter().enumerate() {
        if i >= 10 {
            // Varints are at most 10 bytes for a 64-bit value
            return Err(Error::varint_decode(i));
        }

        result |= ((byte & 0x7F) as u64) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(Error::varint_decode(data.len()))
}

/// Consume a single protobuf field from the data.
///
/// Returns the field number and total bytes consumed (including tag and value).
pub fn consume_field(data: &[u8]) -> Result<(u32, usize)> {
    if data.is_empty() {
        return Err(Error::invalid_wire_format(0, "empty data"));
    }

    // Decode the tag (varint containing field number and wire type)
    let (tag, tag_len) = decode_varint(data)
        .map_err(|_| Error::invalid_wire_format(0, "failed to decode field tag"))?;

    let wire_type = WireType::try_from((tag & 0x07) as u8)?;
    let field_number = (tag >> 3) as u32;

    // Validate field number
    if field_number == 0 || field_number > MAX_FIELD_NUMBER {
        return Err(Error::InvalidFieldNumber {
            number: field_number,
            max: MAX_FIELD_NUMBER,
        });
    }

    // Calculate bytes consumed based on wire type
    let value_len = match wire_type {
        WireType::Varint => {
            let remaining = &data[tag_len..];
            let (_, varint_len) = decode_varint(remaining)
                .map_err(|e| e.offset_by(tag_len))?;
            varint_len
        }
        WireType::I64 => {
            if data.len() < tag_len + 8 {
                return Err(Error::invalid_wire_format(
                    tag_len,
                    "not enough bytes for I64",
                ));
            }
            8
        }
        WireType::Len => {
            // Length-prefixed: decode length varint, then skip that many bytes
            let remaining = &data[tag_len..];
            let (length, length_varint_len) = decode_varint(remaining)
                .map_err(|_| Error::invalid_wire_format(tag_len, "failed to decode length prefix"))?;

            // The declared length is attacker-controlled; compare against the
            // available bytes instead of adding it to anything
            let available = remaining.len() - length_varint_len;
            if length > available as u64 {
                return Err(Error::invalid_wire_format(
                    tag_len,
                    format!(
                        "not enough bytes for LEN field (need {}, have {})",
                        length, available
                    ),
                ));
            }
            length_varint_len + length as usize
        }
        WireType::StartGroup | WireType::EndGroup => {
            // Groups never appear in descriptor.proto itself
            return Err(Error::invalid_wire_format(
                0,
                "group wire type in descriptor data",
            ));
        }
        WireType::I32 => {
            if data.len() < tag_len + 4 {
                return Err(Error::invalid_wire_format(
                    tag_len,
                    "not enough bytes for I32",
                ));
            }
            4
        }
    };

    Ok((field_number, tag_len + value_len))
}

/// Structurally validate a complete serialized message.
///
/// Walks every top-level field of the buffer and fails with the absolute byte
/// offset of the first malformed or truncated field. An empty buffer is valid
/// (an empty message).
pub fn validate_message(data: &[u8]) -> Result<()> {
    let mut position = 0;

    while position < data.len() {
        let (_, len) = consume_field(&data[position..]).map_err(|e| e.offset_by(position))?;
        position += len;
    }

    Ok(())
}
