//! Well-known type descriptors shipped with the crate.
//!
//! Mirrors the canonical `google/protobuf/timestamp.proto` so files that
//! import it resolve without the caller supplying the blob themselves.

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileOptions};

/// Builds the `google/protobuf/timestamp.proto` file descriptor.
///
/// Field numbers, names, and file options match the canonical definition, so
/// registrations of this descriptor and of upstream-serialized copies refer
/// to the same `google.protobuf.Timestamp` type.
pub fn timestamp_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("google/protobuf/timestamp.proto".to_string()),
        package: Some("google.protobuf".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Timestamp".to_string()),
            field: vec![
                FieldDescriptorProto {
                    name: Some("seconds".to_string()),
                    number: Some(1),
                    label: Some(Label::Optional as i32),
                    r#type: Some(Type::Int64 as i32),
                    json_name: Some("seconds".to_string()),
                    ..Default::default()
                },
                FieldDescriptorProto {
                    name: Some("nanos".to_string()),
                    number: Some(2),
                    label: Some(Label::Optional as i32),
                    r#type: Some(Type::Int32 as i32),
                    json_name: Some("nanos".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }],
        options: Some(FileOptions {
            java_package: Some("com.google.protobuf".to_string()),
            java_outer_classname: Some("TimestampProto".to_string()),
            java_multiple_files: Some(true),
            go_package: Some("google.golang.org/protobuf/types/known/timestamppb".to_string()),
            cc_enable_arenas: Some(true),
            objc_class_prefix: Some("GPB".to_string()),
            csharp_namespace: Some("Google.Protobuf.WellKnownTypes".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
