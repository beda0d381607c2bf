/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The binding resolver: classifies every member of a shape into exactly one
//! wire location and validates the combinations the protocol cannot express.

use crate::error::SchemaError;
use crate::model::{Member, Model, Shape, ShapeId, ShapeKind, StaticTrait};

/// The part of an HTTP-style message a member's value occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// A named header.
    Header,
    /// A named query parameter.
    Query,
    /// All headers sharing a prefix.
    PrefixHeaders,
    /// The member alone is the body.
    Payload,
    /// A URI path label.
    Label,
    /// Part of the synthesized document body.
    Document,
    /// The numeric response status code.
    StatusCode,
}

/// A member classified to its wire location. Derived during resolution, never
/// stored in the model.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpBindingDescriptor {
    /// Index of the member within its owning shape.
    pub member_index: usize,
    /// The member's model name.
    pub member_name: String,
    /// Where the value goes.
    pub location: Location,
    /// The wire name: header/query/label name, header prefix, or the member
    /// name itself for document and status-code bindings.
    pub location_name: String,
}

/// True when the member's value travels in the HTTP body: it either is the
/// payload or carries no location trait at all.
pub fn member_is_in_http_body(member: &Member) -> bool {
    let has_non_payload_location = member.header_name().is_some()
        || member.query_name().is_some()
        || member.prefix_headers().is_some()
        || member.has(&StaticTrait::Label)
        || member.has(&StaticTrait::ResponseCode);
    member.has(&StaticTrait::Payload) || !has_non_payload_location
}

/// True when at least one member of the shape travels in the body.
pub fn shape_has_body_members(shape: &Shape) -> bool {
    shape.members().iter().any(member_is_in_http_body)
}

/// Classifies every member of `shape_id` into exactly one location.
///
/// Classification is total and exclusive: each member yields exactly one
/// descriptor, except when the shape itself carries the payload marker, in
/// which case the whole value is the body and members get no document
/// bindings. Malformed bindings abort with a [`SchemaError`] naming the
/// operation, shape, and member.
pub fn resolve_bindings(
    model: &Model,
    shape_id: ShapeId,
    operation: &str,
) -> Result<Vec<HttpBindingDescriptor>, SchemaError> {
    let shape = model.shape(shape_id);
    let shape_is_payload = shape.traits.iter().any(|t| matches!(t, StaticTrait::Payload));
    let mut descriptors = Vec::new();
    let mut payload_member: Option<&str> = None;
    let mut prefix_member: Option<&str> = None;

    for (member_index, member) in shape.members().iter().enumerate() {
        if location_trait_count(member) > 1 {
            return Err(unsupported(
                operation,
                shape,
                member,
                "member carries more than one location trait".to_owned(),
            ));
        }
        let (location, location_name) = if member.has(&StaticTrait::Label) {
            validate_scalar_target(model, shape, member, operation, "a URI label")?;
            (Location::Label, member.name.clone())
        } else if let Some(name) = member.header_name() {
            validate_text_target(model, shape, member, operation, "a header")?;
            (Location::Header, wire_name(name, member))
        } else if let Some(name) = member.query_name() {
            validate_text_target(model, shape, member, operation, "a query parameter")?;
            (Location::Query, wire_name(name, member))
        } else if let Some(prefix) = member.prefix_headers() {
            if let Some(first) = prefix_member {
                return Err(SchemaError::MultiplePrefixHeaderBindings {
                    operation: operation.to_owned(),
                    shape: shape.name.clone(),
                    first: first.to_owned(),
                    second: member.name.clone(),
                });
            }
            prefix_member = Some(&member.name);
            validate_prefix_headers_target(model, shape, member, operation)?;
            (Location::PrefixHeaders, prefix.to_owned())
        } else if member.has(&StaticTrait::ResponseCode) {
            (Location::StatusCode, member.name.clone())
        } else if member.has(&StaticTrait::Payload) {
            if let Some(first) = payload_member {
                return Err(SchemaError::MultiplePayloadBindings {
                    operation: operation.to_owned(),
                    shape: shape.name.clone(),
                    first: first.to_owned(),
                    second: member.name.clone(),
                });
            }
            payload_member = Some(&member.name);
            validate_payload_target(model, shape, member, operation)?;
            (Location::Payload, member.name.clone())
        } else if shape_is_payload {
            // The entire shape is the body; nothing to classify per member.
            continue;
        } else {
            (Location::Document, member.name.clone())
        };
        descriptors.push(HttpBindingDescriptor {
            member_index,
            member_name: member.name.clone(),
            location,
            location_name,
        });
    }
    Ok(descriptors)
}

/// How many location traits a member declares. Anything above one makes the
/// "exactly one location" rule ambiguous and is rejected up front.
fn location_trait_count(member: &Member) -> usize {
    member
        .traits
        .iter()
        .filter(|t| {
            matches!(
                t,
                StaticTrait::Header(_)
                    | StaticTrait::Query(_)
                    | StaticTrait::PrefixHeaders(_)
                    | StaticTrait::Payload
                    | StaticTrait::Label
                    | StaticTrait::ResponseCode
            )
        })
        .count()
}

/// An empty trait-declared name falls back to the member's own name.
fn wire_name(declared: &str, member: &Member) -> String {
    if declared.is_empty() {
        member.name.clone()
    } else {
        declared.to_owned()
    }
}

fn is_text_scalar(kind: &ShapeKind) -> bool {
    matches!(
        kind,
        ShapeKind::String
            | ShapeKind::Boolean
            | ShapeKind::Byte
            | ShapeKind::Short
            | ShapeKind::Integer
            | ShapeKind::Long
            | ShapeKind::Float
            | ShapeKind::Double
            | ShapeKind::Blob
            | ShapeKind::Timestamp
    )
}

fn unsupported(
    operation: &str,
    shape: &Shape,
    member: &Member,
    reason: String,
) -> SchemaError {
    SchemaError::UnsupportedBinding {
        operation: operation.to_owned(),
        shape: shape.name.clone(),
        member: member.name.clone(),
        reason,
    }
}

fn validate_scalar_target(
    model: &Model,
    shape: &Shape,
    member: &Member,
    operation: &str,
    where_: &str,
) -> Result<(), SchemaError> {
    let target = model.shape(member.target);
    if is_text_scalar(&target.kind) {
        Ok(())
    } else {
        Err(unsupported(
            operation,
            shape,
            member,
            format!("shape `{}` cannot be rendered as {}", target.name, where_),
        ))
    }
}

/// Headers and query parameters take scalars or collections of scalars.
fn validate_text_target(
    model: &Model,
    shape: &Shape,
    member: &Member,
    operation: &str,
    where_: &str,
) -> Result<(), SchemaError> {
    let target = model.shape(member.target);
    match &target.kind {
        kind if is_text_scalar(kind) => Ok(()),
        ShapeKind::List { member: element } | ShapeKind::Set { member: element } => {
            let element = model.shape(*element);
            if is_text_scalar(&element.kind) {
                Ok(())
            } else {
                Err(unsupported(
                    operation,
                    shape,
                    member,
                    format!(
                        "collection elements of shape `{}` cannot be rendered as {}",
                        element.name, where_
                    ),
                ))
            }
        }
        _ => Err(unsupported(
            operation,
            shape,
            member,
            format!("shape `{}` cannot be rendered as {}", target.name, where_),
        )),
    }
}

/// Prefix headers may only target a map of strings, lists of strings, or sets
/// of strings.
fn validate_prefix_headers_target(
    model: &Model,
    shape: &Shape,
    member: &Member,
    operation: &str,
) -> Result<(), SchemaError> {
    let schema_error = || SchemaError::InvalidPrefixHeadersTarget {
        operation: operation.to_owned(),
        shape: shape.name.clone(),
        member: member.name.clone(),
    };
    let target = model.shape(member.target);
    let value = match &target.kind {
        ShapeKind::Map { value } => *value,
        _ => return Err(schema_error()),
    };
    match &model.shape(value).kind {
        ShapeKind::String => Ok(()),
        ShapeKind::List { member: element } | ShapeKind::Set { member: element } => {
            match &model.shape(*element).kind {
                ShapeKind::String => Ok(()),
                _ => Err(schema_error()),
            }
        }
        _ => Err(schema_error()),
    }
}

fn validate_payload_target(
    model: &Model,
    shape: &Shape,
    member: &Member,
    operation: &str,
) -> Result<(), SchemaError> {
    let target = model.shape(member.target);
    match &target.kind {
        ShapeKind::Blob
        | ShapeKind::String
        | ShapeKind::Structure { .. }
        | ShapeKind::Union { .. }
        | ShapeKind::Document => Ok(()),
        _ => Err(unsupported(
            operation,
            shape,
            member,
            format!("shape `{}` cannot be the sole payload", target.name),
        )),
    }
}

#[cfg(test)]
mod test {
    use super::{resolve_bindings, Location};
    use crate::error::SchemaError;
    use crate::model::{Member, Model, ModelBuilder, ShapeId, ShapeKind, StaticTrait};

    fn model_with_shape(
        build_members: impl FnOnce(&mut ModelBuilder) -> Vec<Member>,
    ) -> (Model, ShapeId) {
        let mut builder = ModelBuilder::new();
        let members = build_members(&mut builder);
        let id = builder.shape("TestShape", ShapeKind::Structure { members });
        (builder.build(), id)
    }

    #[test]
    fn classification_partitions_the_member_set() {
        let (model, id) = model_with_shape(|b| {
            let string = b.shape("String", ShapeKind::String);
            let integer = b.shape("Integer", ShapeKind::Integer);
            let blob = b.shape("Blob", ShapeKind::Blob);
            let map = b.shape("Headers", ShapeKind::Map { value: string });
            vec![
                Member::new("id", string).with_trait(StaticTrait::Label),
                Member::new("tag", string).with_trait(StaticTrait::Header("X-Tag".into())),
                Member::new("limit", integer).with_trait(StaticTrait::Query("limit".into())),
                Member::new("meta", map).with_trait(StaticTrait::PrefixHeaders("X-Meta-".into())),
                Member::new("data", blob).with_trait(StaticTrait::Payload),
                Member::new("status", integer).with_trait(StaticTrait::ResponseCode),
            ]
        });
        let bindings = resolve_bindings(&model, id, "TestOp").unwrap();
        // every member classified exactly once
        assert_eq!(bindings.len(), model.shape(id).members().len());
        let mut indices: Vec<_> = bindings.iter().map(|b| b.member_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        let locations: Vec<_> = bindings.iter().map(|b| b.location).collect();
        assert_eq!(
            locations,
            vec![
                Location::Label,
                Location::Header,
                Location::Query,
                Location::PrefixHeaders,
                Location::Payload,
                Location::StatusCode,
            ]
        );
    }

    #[test]
    fn untraited_members_go_to_the_document() {
        let (model, id) = model_with_shape(|b| {
            let string = b.shape("String", ShapeKind::String);
            vec![
                Member::new("name", string),
                Member::new("tag", string).with_trait(StaticTrait::Header(String::new())),
            ]
        });
        let bindings = resolve_bindings(&model, id, "TestOp").unwrap();
        assert_eq!(bindings[0].location, Location::Document);
        assert_eq!(bindings[0].location_name, "name");
        // empty declared header name falls back to the member name
        assert_eq!(bindings[1].location_name, "tag");
    }

    #[test]
    fn two_payload_members_is_a_schema_error() {
        let (model, id) = model_with_shape(|b| {
            let blob = b.shape("Blob", ShapeKind::Blob);
            vec![
                Member::new("first", blob).with_trait(StaticTrait::Payload),
                Member::new("second", blob).with_trait(StaticTrait::Payload),
            ]
        });
        let err = resolve_bindings(&model, id, "TestOp").unwrap_err();
        match err {
            SchemaError::MultiplePayloadBindings { first, second, .. } => {
                assert_eq!(first, "first");
                assert_eq!(second, "second");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn two_location_traits_on_one_member_is_a_schema_error() {
        let (model, id) = model_with_shape(|b| {
            let blob = b.shape("Blob", ShapeKind::Blob);
            vec![Member::new("data", blob)
                .with_trait(StaticTrait::Header("X-Data".into()))
                .with_trait(StaticTrait::Payload)]
        });
        let err = resolve_bindings(&model, id, "TestOp").unwrap_err();
        match err {
            SchemaError::UnsupportedBinding { member, reason, .. } => {
                assert_eq!(member, "data");
                assert!(reason.contains("more than one location trait"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn prefix_headers_on_a_non_map_is_a_schema_error() {
        let (model, id) = model_with_shape(|b| {
            let string = b.shape("String", ShapeKind::String);
            vec![Member::new("meta", string).with_trait(StaticTrait::PrefixHeaders("X-".into()))]
        });
        let err = resolve_bindings(&model, id, "TestOp").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPrefixHeadersTarget { .. }));
    }

    #[test]
    fn prefix_headers_accepts_maps_of_string_collections() {
        let (model, id) = model_with_shape(|b| {
            let string = b.shape("String", ShapeKind::String);
            let list = b.shape("StringList", ShapeKind::List { member: string });
            let map = b.shape("HeaderMap", ShapeKind::Map { value: list });
            vec![Member::new("meta", map).with_trait(StaticTrait::PrefixHeaders(String::new()))]
        });
        resolve_bindings(&model, id, "TestOp").unwrap();
    }

    #[test]
    fn structures_cannot_be_header_bound() {
        let (model, id) = model_with_shape(|b| {
            let nested = b.shape("Nested", ShapeKind::Structure { members: vec![] });
            vec![Member::new("bad", nested).with_trait(StaticTrait::Header("X-Bad".into()))]
        });
        let err = resolve_bindings(&model, id, "TestOp").unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedBinding { .. }));
    }
}
