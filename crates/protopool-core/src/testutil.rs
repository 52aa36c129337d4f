//! Shared descriptor fixtures for unit tests.
//!
//! The main fixture rebuilds the Temporal cloud-namespace descriptor file
//! (messages, map entries, and well-known timestamp references) with
//! `prost-types` builders, so tests exercise the same shapes a compiler-
//! serialized blob carries.

use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileOptions, MessageOptions,
};

pub(crate) fn encode(proto: FileDescriptorProto) -> Vec<u8> {
    proto.encode_to_vec()
}

pub(crate) fn scalar_field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

pub(crate) fn message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::Message as i32),
        type_name: Some(type_name.to_string()),
        ..Default::default()
    }
}

pub(crate) fn enum_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::Enum as i32),
        type_name: Some(type_name.to_string()),
        ..Default::default()
    }
}

pub(crate) fn repeated(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field.label = Some(Label::Repeated as i32);
    field
}

pub(crate) fn msg(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

/// A synthetic map-entry message: `key = 1`, `value = 2`, `map_entry` set
pub(crate) fn map_entry(
    name: &str,
    key: FieldDescriptorProto,
    value: FieldDescriptorProto,
) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: vec![key, value],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(crate) fn file(
    name: &str,
    package: &str,
    messages: Vec<DescriptorProto>,
) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: Some(package.to_string()),
        syntax: Some("proto3".to_string()),
        message_type: messages,
        ..Default::default()
    }
}

/// The Temporal cloud-namespace descriptor file, as declared by
/// `temporal/api/cloud/namespace/v1/message.proto`
pub(crate) fn namespace_file() -> FileDescriptorProto {
    const NS: &str = ".temporal.api.cloud.namespace.v1";

    let certificate_filter_spec = msg(
        "CertificateFilterSpec",
        vec![
            scalar_field("common_name", 1, Type::String),
            scalar_field("organization", 2, Type::String),
            scalar_field("organizational_unit", 3, Type::String),
            scalar_field("subject_alternative_name", 4, Type::String),
        ],
    );

    let mtls_auth_spec = msg(
        "MtlsAuthSpec",
        vec![
            scalar_field("accepted_client_ca", 1, Type::String),
            repeated(message_field(
                "certificate_filters",
                2,
                &format!("{NS}.CertificateFilterSpec"),
            )),
            scalar_field("enabled", 3, Type::Bool),
        ],
    );

    let api_key_auth_spec = msg(
        "ApiKeyAuthSpec",
        vec![scalar_field("enabled", 1, Type::Bool)],
    );

    let codec_server_spec = msg(
        "CodecServerSpec",
        vec![
            scalar_field("endpoint", 1, Type::String),
            scalar_field("pass_access_token", 2, Type::Bool),
            scalar_field("include_cross_origin_credentials", 3, Type::Bool),
        ],
    );

    let mut namespace_spec = msg(
        "NamespaceSpec",
        vec![
            scalar_field("name", 1, Type::String),
            repeated(scalar_field("regions", 2, Type::String)),
            scalar_field("retention_days", 3, Type::Int32),
            message_field("mtls_auth", 4, &format!("{NS}.MtlsAuthSpec")),
            message_field("api_key_auth", 7, &format!("{NS}.ApiKeyAuthSpec")),
            repeated(message_field(
                "custom_search_attributes",
                5,
                &format!("{NS}.NamespaceSpec.CustomSearchAttributesEntry"),
            )),
            message_field("codec_server", 6, &format!("{NS}.CodecServerSpec")),
        ],
    );
    namespace_spec.nested_type = vec![map_entry(
        "CustomSearchAttributesEntry",
        scalar_field("key", 1, Type::String),
        scalar_field("value", 2, Type::String),
    )];

    let endpoints = msg(
        "Endpoints",
        vec![
            scalar_field("web_address", 1, Type::String),
            scalar_field("mtls_grpc_address", 2, Type::String),
            scalar_field("grpc_address", 3, Type::String),
        ],
    );

    let limits = msg(
        "Limits",
        vec![scalar_field("actions_per_second_limit", 1, Type::Int32)],
    );

    let aws_private_link_info = msg(
        "AWSPrivateLinkInfo",
        vec![
            repeated(scalar_field("allowed_principal_arns", 1, Type::String)),
            repeated(scalar_field("vpc_endpoint_service_names", 2, Type::String)),
        ],
    );

    let private_connectivity = msg(
        "PrivateConnectivity",
        vec![
            scalar_field("region", 1, Type::String),
            message_field("aws_private_link", 2, &format!("{NS}.AWSPrivateLinkInfo")),
        ],
    );

    let mut namespace = msg(
        "Namespace",
        vec![
            scalar_field("namespace", 1, Type::String),
            scalar_field("resource_version", 2, Type::String),
            message_field("spec", 3, &format!("{NS}.NamespaceSpec")),
            scalar_field("state", 4, Type::String),
            scalar_field("async_operation_id", 5, Type::String),
            message_field("endpoints", 6, &format!("{NS}.Endpoints")),
            scalar_field("active_region", 7, Type::String),
            message_field("limits", 8, &format!("{NS}.Limits")),
            repeated(message_field(
                "private_connectivities",
                9,
                &format!("{NS}.PrivateConnectivity"),
            )),
            message_field("created_time", 10, ".google.protobuf.Timestamp"),
            message_field("last_modified_time", 11, ".google.protobuf.Timestamp"),
            repeated(message_field(
                "region_status",
                12,
                &format!("{NS}.Namespace.RegionStatusEntry"),
            )),
        ],
    );
    namespace.nested_type = vec![map_entry(
        "RegionStatusEntry",
        scalar_field("key", 1, Type::String),
        message_field("value", 2, &format!("{NS}.NamespaceRegionStatus")),
    )];

    let namespace_region_status = msg(
        "NamespaceRegionStatus",
        vec![
            scalar_field("state", 1, Type::String),
            scalar_field("async_operation_id", 2, Type::String),
        ],
    );

    FileDescriptorProto {
        name: Some("temporal/api/cloud/namespace/v1/message.proto".to_string()),
        package: Some("temporal.api.cloud.namespace.v1".to_string()),
        syntax: Some("proto3".to_string()),
        dependency: vec!["google/protobuf/timestamp.proto".to_string()],
        message_type: vec![
            certificate_filter_spec,
            mtls_auth_spec,
            api_key_auth_spec,
            codec_server_spec,
            namespace_spec,
            endpoints,
            limits,
            aws_private_link_info,
            private_connectivity,
            namespace,
            namespace_region_status,
        ],
        options: Some(FileOptions {
            java_package: Some("io.temporal.api.cloud.namespace.v1".to_string()),
            java_outer_classname: Some("MessageProto".to_string()),
            java_multiple_files: Some(true),
            go_package: Some("go.temporal.io/api/cloud/namespace/v1;namespace".to_string()),
            csharp_namespace: Some("Temporalio.Api.Cloud.Namespace.V1".to_string()),
            ruby_package: Some("Temporalio::Api::Cloud::Namespace::V1".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// One message with every scalar kind plus an enum field
pub(crate) fn scalars_file() -> FileDescriptorProto {
    let scalars = msg(
        "Scalars",
        vec![
            scalar_field("f_double", 1, Type::Double),
            scalar_field("f_float", 2, Type::Float),
            scalar_field("f_int32", 3, Type::Int32),
            scalar_field("f_int64", 4, Type::Int64),
            scalar_field("f_uint32", 5, Type::Uint32),
            scalar_field("f_uint64", 6, Type::Uint64),
            scalar_field("f_sint32", 7, Type::Sint32),
            scalar_field("f_sint64", 8, Type::Sint64),
            scalar_field("f_fixed32", 9, Type::Fixed32),
            scalar_field("f_fixed64", 10, Type::Fixed64),
            scalar_field("f_sfixed32", 11, Type::Sfixed32),
            scalar_field("f_sfixed64", 12, Type::Sfixed64),
            scalar_field("f_bool", 13, Type::Bool),
            scalar_field("f_string", 14, Type::String),
            scalar_field("f_bytes", 15, Type::Bytes),
            enum_field("f_enum", 16, ".test.Color"),
        ],
    );

    let color = EnumDescriptorProto {
        name: Some("Color".to_string()),
        value: vec![
            EnumValueDescriptorProto {
                name: Some("COLOR_UNSPECIFIED".to_string()),
                number: Some(0),
                ..Default::default()
            },
            EnumValueDescriptorProto {
                name: Some("COLOR_RED".to_string()),
                number: Some(1),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let mut file = file("scalars.proto", "test", vec![scalars]);
    file.enum_type = vec![color];
    file
}

/// A message referencing a type that is never registered
pub(crate) fn dangling_reference_file() -> FileDescriptorProto {
    file(
        "dangling.proto",
        "test",
        vec![msg(
            "Dangling",
            vec![message_field("target", 1, ".test.Missing")],
        )],
    )
}
