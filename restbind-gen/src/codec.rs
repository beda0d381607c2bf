/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Value codec rules: the per-type conversions between wire text and
//! structured values, including header-bound collections.

use crate::binding::{HttpBindingDescriptor, Location};
use crate::error::DecodeError;
use crate::model::{Member, Model, ShapeId, ShapeKind};
use crate::ProtocolConfig;
use restbind_http::header::{split_header_values, split_http_date_values};
use restbind_http::Headers;
use restbind_types::instant::Format;
use restbind_types::{base64, Instant, Number, Value};

/// A single value that could not be converted. Carriers (header, body member)
/// attach their own context before surfacing this.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CodecError {
    message: String,
}

impl CodecError {
    fn new(message: impl Into<String>) -> Self {
        CodecError {
            message: message.into(),
        }
    }
}

/// The timestamp format in effect for one binding: the member's explicit
/// trait if present, else the protocol default for the location.
pub fn effective_timestamp_format(
    member: &Member,
    location: Location,
    config: &ProtocolConfig,
) -> Format {
    member.timestamp_format().unwrap_or(match location {
        Location::Header | Location::Query => config.default_header_timestamp_format,
        Location::PrefixHeaders
        | Location::Payload
        | Location::Label
        | Location::Document
        | Location::StatusCode => config.default_document_timestamp_format,
    })
}

/// Renders one scalar value as wire text.
///
/// `member` is the binding member (it carries any timestamp format override);
/// `target` is the scalar shape being rendered, which for collections is the
/// element shape rather than the member's own target.
pub fn encode_scalar(
    model: &Model,
    member: &Member,
    target: ShapeId,
    value: &Value,
    location: Location,
    config: &ProtocolConfig,
) -> Result<String, CodecError> {
    let shape = model.shape(target);
    let mismatch = |expected: &str| {
        CodecError::new(format!(
            "member `{}` holds a value that is not {expected}",
            member.name
        ))
    };
    match &shape.kind {
        ShapeKind::Boolean => match value {
            Value::Bool(true) => Ok("true".to_owned()),
            Value::Bool(false) => Ok("false".to_owned()),
            _ => Err(mismatch("a boolean")),
        },
        ShapeKind::Byte
        | ShapeKind::Short
        | ShapeKind::Integer
        | ShapeKind::Long
        | ShapeKind::Float
        | ShapeKind::Double => match value {
            Value::Number(number) => Ok(number.to_wire_string()),
            _ => Err(mismatch("a number")),
        },
        ShapeKind::Blob => match value {
            Value::Blob(bytes) => Ok(base64::encode(bytes)),
            _ => Err(mismatch("a blob")),
        },
        ShapeKind::String => match value {
            Value::String(text) => {
                if shape.has_media_type() {
                    Ok(base64::encode(text.as_bytes()))
                } else {
                    Ok(text.clone())
                }
            }
            _ => Err(mismatch("a string")),
        },
        ShapeKind::Timestamp => match value {
            Value::Timestamp(instant) => instant
                .fmt(effective_timestamp_format(member, location, config))
                .map_err(|err| CodecError::new(err.to_string())),
            _ => Err(mismatch("a timestamp")),
        },
        ShapeKind::Structure { .. }
        | ShapeKind::Union { .. }
        | ShapeKind::List { .. }
        | ShapeKind::Set { .. }
        | ShapeKind::Map { .. }
        | ShapeKind::Document => Err(CodecError::new(format!(
            "shape `{}` has no text representation",
            shape.name
        ))),
    }
}

/// Parses one scalar wire token into a structured value.
pub fn decode_scalar(
    model: &Model,
    member: &Member,
    target: ShapeId,
    text: &str,
    location: Location,
    config: &ProtocolConfig,
) -> Result<Value, CodecError> {
    let shape = model.shape(target);
    let unparsable = |as_what: &str| {
        CodecError::new(format!("`{text}` could not be parsed as {as_what}"))
    };
    match &shape.kind {
        ShapeKind::Boolean => match text {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(unparsable("a boolean")),
        },
        ShapeKind::Byte => text
            .parse::<i8>()
            .map(|v| Value::Number(Number::from(v as i64)))
            .map_err(|_| unparsable("an 8-bit integer")),
        ShapeKind::Short => text
            .parse::<i16>()
            .map(|v| Value::Number(Number::from(v as i64)))
            .map_err(|_| unparsable("a 16-bit integer")),
        ShapeKind::Integer => text
            .parse::<i32>()
            .map(|v| Value::Number(Number::from(v as i64)))
            .map_err(|_| unparsable("a 32-bit integer")),
        ShapeKind::Long => text
            .parse::<i64>()
            .map(|v| Value::Number(Number::from(v)))
            .map_err(|_| unparsable("a 64-bit integer")),
        ShapeKind::Float => text
            .parse::<f32>()
            .map(|v| Value::Number(Number::Float(v as f64)))
            .map_err(|_| unparsable("a 32-bit float")),
        ShapeKind::Double => text
            .parse::<f64>()
            .map(|v| Value::Number(Number::Float(v)))
            .map_err(|_| unparsable("a 64-bit float")),
        ShapeKind::Blob => base64::decode(text)
            .map(Value::Blob)
            .map_err(|_| unparsable("base64 bytes")),
        ShapeKind::String => {
            if let Some(values) = shape.enum_values() {
                // An unmatched raw value is a decode failure, never a
                // silently substituted default.
                if values.iter().any(|v| v == text) {
                    Ok(Value::String(text.to_owned()))
                } else {
                    Err(CodecError::new(format!(
                        "`{text}` is not one of the declared values of enum `{}`",
                        shape.name
                    )))
                }
            } else if shape.has_media_type() {
                let bytes = base64::decode(text).map_err(|_| unparsable("base64 text"))?;
                String::from_utf8(bytes)
                    .map(Value::String)
                    .map_err(|_| unparsable("base64-encoded UTF-8"))
            } else {
                Ok(Value::String(text.to_owned()))
            }
        }
        ShapeKind::Timestamp => {
            let format = effective_timestamp_format(member, location, config);
            Instant::parse(text, format)
                .map(Value::Timestamp)
                .map_err(|err| CodecError::new(err.to_string()))
        }
        ShapeKind::Structure { .. }
        | ShapeKind::Union { .. }
        | ShapeKind::List { .. }
        | ShapeKind::Set { .. }
        | ShapeKind::Map { .. }
        | ShapeKind::Document => Err(CodecError::new(format!(
            "shape `{}` has no text representation",
            shape.name
        ))),
    }
}

/// The element shape of a header/query-bound collection, with whether the
/// collection is a set and whether elements may individually be absent.
pub(crate) fn collection_element(
    model: &Model,
    target: ShapeId,
) -> Option<(ShapeId, /* set */ bool, /* sparse */ bool)> {
    let shape = model.shape(target);
    match &shape.kind {
        ShapeKind::List { member } => Some((*member, false, shape.is_sparse())),
        ShapeKind::Set { member } => Some((*member, true, shape.is_sparse())),
        _ => None,
    }
}

/// Renders a collection value as a single header line.
///
/// Elements containing commas or quotes are quoted so the receiver's
/// quote-aware split recovers them; HTTP-date elements stay bare because the
/// receiving side splits those at every second comma.
pub fn encode_header_list(
    model: &Model,
    member: &Member,
    element: ShapeId,
    items: &[Value],
    config: &ProtocolConfig,
) -> Result<String, CodecError> {
    let element_is_http_date = matches!(model.shape(element).kind, ShapeKind::Timestamp)
        && effective_timestamp_format(member, Location::Header, config) == Format::HttpDate;
    let mut encoded = Vec::with_capacity(items.len());
    for item in items {
        let text = encode_scalar(model, member, element, item, Location::Header, config)?;
        if !element_is_http_date && (text.contains(',') || text.contains('"')) {
            let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
            encoded.push(format!("\"{escaped}\""));
        } else {
            encoded.push(text);
        }
    }
    Ok(encoded.join(", "))
}

/// Reads a header-bound collection member from response headers.
///
/// Returns `Ok(None)` when the header is entirely absent. A token that fails
/// to convert is a decode error naming the header, unless elements are
/// declared individually optional, in which case the failed element becomes
/// an absent entry.
pub fn decode_header_list(
    model: &Model,
    binding: &HttpBindingDescriptor,
    member: &Member,
    headers: &Headers,
    config: &ProtocolConfig,
) -> Result<Option<Value>, DecodeError> {
    let (element, is_set, sparse) = match collection_element(model, member.target) {
        Some(parts) => parts,
        None => return Ok(None),
    };
    let raw_values = headers.get_all(&binding.location_name);
    if raw_values.is_empty() {
        return Ok(None);
    }
    let element_is_http_date = matches!(model.shape(element).kind, ShapeKind::Timestamp)
        && effective_timestamp_format(member, Location::Header, config) == Format::HttpDate;

    let mut tokens = Vec::new();
    for raw in raw_values {
        if element_is_http_date {
            tokens.extend(split_http_date_values(&binding.location_name, raw)?);
        } else {
            tokens.extend(split_header_values(raw));
        }
    }

    let mut items: Vec<Value> = Vec::with_capacity(tokens.len());
    for token in &tokens {
        match decode_scalar(model, member, element, token, Location::Header, config) {
            Ok(value) => {
                if !is_set || !items.contains(&value) {
                    items.push(value);
                }
            }
            Err(err) if sparse => {
                tracing::debug!(
                    header = %binding.location_name,
                    %err,
                    "sparse collection element failed to convert; storing absent"
                );
                items.push(Value::Null);
            }
            Err(err) => {
                return Err(DecodeError::InvalidHeader {
                    header: binding.location_name.clone(),
                    message: err.to_string(),
                })
            }
        }
    }
    Ok(Some(Value::List(items)))
}

#[cfg(test)]
mod test {
    use super::{decode_header_list, decode_scalar, encode_header_list, encode_scalar};
    use crate::binding::{HttpBindingDescriptor, Location};
    use crate::model::{Member, Model, ModelBuilder, ShapeId, ShapeKind, StaticTrait};
    use crate::ProtocolConfig;
    use restbind_http::Headers;
    use restbind_types::instant::Format;
    use restbind_types::{Instant, Number, Value};

    fn config() -> ProtocolConfig {
        ProtocolConfig::default()
    }

    fn scalar_model(kind: ShapeKind) -> (Model, Member, ShapeId) {
        let mut b = ModelBuilder::new();
        let target = b.shape("Target", kind);
        (b.build(), Member::new("field", target), target)
    }

    #[test]
    fn booleans_are_strict() {
        let (model, member, target) = scalar_model(ShapeKind::Boolean);
        let value =
            decode_scalar(&model, &member, target, "true", Location::Header, &config()).unwrap();
        assert_eq!(value, Value::Bool(true));
        decode_scalar(&model, &member, target, "True", Location::Header, &config())
            .expect_err("not lowercase");
        decode_scalar(&model, &member, target, "truth", Location::Header, &config())
            .expect_err("not a boolean");
    }

    #[test]
    fn numbers_respect_their_width() {
        let (model, member, target) = scalar_model(ShapeKind::Byte);
        decode_scalar(&model, &member, target, "300", Location::Header, &config())
            .expect_err("out of range for i8");
        let (model, member, target) = scalar_model(ShapeKind::Integer);
        decode_scalar(&model, &member, target, "12ef3", Location::Header, &config())
            .expect_err("not numeric");
        assert_eq!(
            decode_scalar(&model, &member, target, "777", Location::Header, &config()).unwrap(),
            Value::Number(Number::PosInt(777))
        );
    }

    #[test]
    fn epoch_seconds_decode() {
        let mut b = ModelBuilder::new();
        let target = b.shape("Timestamp", ShapeKind::Timestamp);
        let model = b.build();
        let member = Member::new("when", target)
            .with_trait(StaticTrait::TimestampFormat(Format::EpochSeconds));
        let value = decode_scalar(
            &model,
            &member,
            target,
            "1609459200",
            Location::Header,
            &config(),
        )
        .unwrap();
        assert_eq!(value, Value::Timestamp(Instant::from_epoch_seconds(1609459200)));
        decode_scalar(&model, &member, target, "12ef3", Location::Header, &config())
            .expect_err("unparsable epoch seconds");
    }

    #[test]
    fn header_timestamps_default_to_http_date() {
        let (model, member, target) = scalar_model(ShapeKind::Timestamp);
        let text =
            encode_scalar(
                &model,
                &member,
                target,
                &Value::Timestamp(Instant::from_epoch_seconds(1576540098)),
                Location::Header,
                &config(),
            )
            .unwrap();
        assert_eq!(text, "Mon, 16 Dec 2019 23:48:18 GMT");
    }

    #[test]
    fn unmatched_enum_value_is_a_decode_failure() {
        let mut b = ModelBuilder::new();
        let target = b.shape_with_traits(
            "Suit",
            ShapeKind::String,
            vec![StaticTrait::Enumeration(vec![
                "CLUB".into(),
                "DIAMOND".into(),
            ])],
        );
        let model = b.build();
        let member = Member::new("suit", target);
        assert_eq!(
            decode_scalar(&model, &member, target, "CLUB", Location::Header, &config()).unwrap(),
            Value::String("CLUB".into())
        );
        decode_scalar(&model, &member, target, "Bar", Location::Header, &config())
            .expect_err("not a declared enum value");
    }

    #[test]
    fn media_type_strings_travel_base64() {
        let mut b = ModelBuilder::new();
        let target = b.shape_with_traits(
            "JsonValue",
            ShapeKind::String,
            vec![StaticTrait::MediaType("application/json".into())],
        );
        let model = b.build();
        let member = Member::new("doc", target);
        let encoded = encode_scalar(
            &model,
            &member,
            target,
            &Value::String("{\"a\":1}".into()),
            Location::Header,
            &config(),
        )
        .unwrap();
        assert_eq!(
            decode_scalar(&model, &member, target, &encoded, Location::Header, &config()).unwrap(),
            Value::String("{\"a\":1}".into())
        );
    }

    fn integer_list_model() -> (Model, Member, HttpBindingDescriptor) {
        let mut b = ModelBuilder::new();
        let integer = b.shape("Integer", ShapeKind::Integer);
        let list = b.shape("IntegerList", ShapeKind::List { member: integer });
        let model = b.build();
        let member = Member::new("counts", list);
        let binding = HttpBindingDescriptor {
            member_index: 0,
            member_name: "counts".into(),
            location: Location::Header,
            location_name: "X-Counts".into(),
        };
        (model, member, binding)
    }

    #[test]
    fn header_collection_round_trip() {
        let (model, member, binding) = integer_list_model();
        let items = vec![
            Value::Number(Number::PosInt(1)),
            Value::Number(Number::PosInt(2)),
            Value::Number(Number::PosInt(3)),
        ];
        let element = match model.shape(member.target).kind {
            ShapeKind::List { member } => member,
            _ => unreachable!(),
        };
        let line = encode_header_list(&model, &member, element, &items, &config()).unwrap();
        assert_eq!(line, "1, 2, 3");

        let mut headers = Headers::new();
        headers.append("X-Counts", "1, 2, 3");
        let decoded = decode_header_list(&model, &binding, &member, &headers, &config())
            .unwrap()
            .unwrap();
        assert_eq!(decoded, Value::List(items));
    }

    #[test]
    fn absent_header_collection_is_absent_not_empty() {
        let (model, member, binding) = integer_list_model();
        let headers = Headers::new();
        assert!(decode_header_list(&model, &binding, &member, &headers, &config())
            .unwrap()
            .is_none());
    }

    #[test]
    fn bad_element_in_strict_collection_names_the_header() {
        let (model, member, binding) = integer_list_model();
        let mut headers = Headers::new();
        headers.append("X-Counts", "1, oops, 3");
        let err = decode_header_list(&model, &binding, &member, &headers, &config()).unwrap_err();
        assert!(err.to_string().contains("X-Counts"));
    }

    #[test]
    fn sets_deduplicate_after_conversion() {
        let mut b = ModelBuilder::new();
        let integer = b.shape("Integer", ShapeKind::Integer);
        let set = b.shape("IntegerSet", ShapeKind::Set { member: integer });
        let model = b.build();
        let member = Member::new("ids", set);
        let binding = HttpBindingDescriptor {
            member_index: 0,
            member_name: "ids".into(),
            location: Location::Header,
            location_name: "X-Ids".into(),
        };
        let mut headers = Headers::new();
        headers.append("X-Ids", "1, 2, 1");
        let decoded = decode_header_list(&model, &binding, &member, &headers, &config())
            .unwrap()
            .unwrap();
        assert_eq!(
            decoded,
            Value::List(vec![
                Value::Number(Number::PosInt(1)),
                Value::Number(Number::PosInt(2)),
            ])
        );
    }

    #[test]
    fn http_date_elements_split_at_every_second_comma() {
        let mut b = ModelBuilder::new();
        let timestamp = b.shape("Timestamp", ShapeKind::Timestamp);
        let list = b.shape("Timestamps", ShapeKind::List { member: timestamp });
        let model = b.build();
        let member = Member::new("dates", list);
        let binding = HttpBindingDescriptor {
            member_index: 0,
            member_name: "dates".into(),
            location: Location::Header,
            location_name: "X-Dates".into(),
        };
        let mut headers = Headers::new();
        headers.append(
            "X-Dates",
            "Mon, 16 Dec 2019 23:48:18 GMT, Mon, 16 Dec 2019 23:48:19 GMT",
        );
        let decoded = decode_header_list(&model, &binding, &member, &headers, &config())
            .unwrap()
            .unwrap();
        assert_eq!(
            decoded,
            Value::List(vec![
                Value::Timestamp(Instant::from_epoch_seconds(1576540098)),
                Value::Timestamp(Instant::from_epoch_seconds(1576540099)),
            ])
        );
    }
}
