/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The response assembler: resolves output/error bindings into a
//! [`ResponsePlan`] and executes the plan against a wire response, plus the
//! error dispatcher that routes a failed response to its modeled variant.

use crate::binding::{resolve_bindings, HttpBindingDescriptor, Location};
use crate::codec;
use crate::error::DecodeError;
use crate::model::{Member, Model, ShapeId, ShapeKind};
use crate::ProtocolConfig;
use restbind_http::header::prefix_header_map;
use restbind_http::WireResponse;
use restbind_types::{Number, Value};
use std::collections::BTreeMap;

/// Deserializes body bytes into a structured value. The concrete wire format
/// is a protocol concern injected from outside the engine.
pub trait BodyDecoder {
    /// Decodes `body` into a structured value.
    fn decode(&self, body: &[u8]) -> Result<Value, crate::error::BoxError>;
}

/// Everything needed to parse responses for one output or error shape, with
/// all orderings fixed at plan time.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePlan {
    /// The shape being reassembled.
    pub shape: ShapeId,
    /// Its name, for diagnostics.
    pub shape_name: String,
    /// Protocol defaults captured at plan time.
    pub config: ProtocolConfig,
    /// Header bindings, sorted by member name.
    pub header_bindings: Vec<HttpBindingDescriptor>,
    /// The at-most-one prefix-headers binding.
    pub prefix_header_binding: Option<HttpBindingDescriptor>,
    /// The at-most-one payload binding.
    pub payload_binding: Option<HttpBindingDescriptor>,
    /// Document bindings, sorted by member name.
    pub document_bindings: Vec<HttpBindingDescriptor>,
    /// The at-most-one status-code binding.
    pub response_code_binding: Option<HttpBindingDescriptor>,
}

/// Resolves the response plan for `shape` (an operation output or a modeled
/// error).
pub fn plan_response(
    model: &Model,
    shape: ShapeId,
    operation: &str,
    config: &ProtocolConfig,
) -> Result<ResponsePlan, crate::error::SchemaError> {
    let bindings = resolve_bindings(model, shape, operation)?;
    let mut plan = ResponsePlan {
        shape,
        shape_name: model.shape(shape).name.clone(),
        config: config.clone(),
        header_bindings: Vec::new(),
        prefix_header_binding: None,
        payload_binding: None,
        document_bindings: Vec::new(),
        response_code_binding: None,
    };
    for binding in bindings {
        match binding.location {
            Location::Header => plan.header_bindings.push(binding),
            Location::PrefixHeaders => plan.prefix_header_binding = Some(binding),
            Location::Payload => plan.payload_binding = Some(binding),
            Location::Document => plan.document_bindings.push(binding),
            Location::StatusCode => plan.response_code_binding = Some(binding),
            // Labels and queries are request-only; a response never carries
            // them back.
            Location::Label | Location::Query => {}
        }
    }
    plan.header_bindings.sort_by(|a, b| a.member_name.cmp(&b.member_name));
    plan.document_bindings.sort_by(|a, b| a.member_name.cmp(&b.member_name));
    Ok(plan)
}

impl ResponsePlan {
    fn member<'a>(&self, model: &'a Model, binding: &HttpBindingDescriptor) -> &'a Member {
        &model.shape(self.shape).members()[binding.member_index]
    }

    /// Reassembles the shape's structure value from `response`.
    ///
    /// Members are filled from headers first, then prefix headers, then the
    /// body, then the status code. Absent optional members stay out of the
    /// map; required scalar members with nothing on the wire take their zero
    /// value.
    pub fn parse(
        &self,
        model: &Model,
        response: &WireResponse,
        decoder: Option<&dyn BodyDecoder>,
    ) -> Result<Value, DecodeError> {
        let mut members = BTreeMap::new();
        self.read_headers(model, response, &mut members)?;
        self.read_prefix_headers(model, response, &mut members)?;
        self.read_body(model, response, decoder, &mut members)?;
        if let Some(binding) = &self.response_code_binding {
            members.insert(
                binding.member_name.clone(),
                Value::Number(Number::from(u64::from(response.status().as_u16()))),
            );
        }
        Ok(Value::Map(members))
    }

    fn read_headers(
        &self,
        model: &Model,
        response: &WireResponse,
        members: &mut BTreeMap<String, Value>,
    ) -> Result<(), DecodeError> {
        for binding in &self.header_bindings {
            let member = self.member(model, binding);
            if codec::collection_element(model, member.target).is_some() {
                if let Some(value) =
                    codec::decode_header_list(model, binding, member, response.headers(), &self.config)?
                {
                    members.insert(binding.member_name.clone(), value);
                }
            } else if let Some(raw) = response.headers().get(&binding.location_name) {
                let value = codec::decode_scalar(
                    model,
                    member,
                    member.target,
                    raw,
                    Location::Header,
                    &self.config,
                )
                .map_err(|err| DecodeError::InvalidHeader {
                    header: binding.location_name.clone(),
                    message: err.to_string(),
                })?;
                members.insert(binding.member_name.clone(), value);
            }
        }
        Ok(())
    }

    /// Collects every header starting with the bound prefix into a map keyed
    /// by the rest of the header name, original case preserved. No matching
    /// header leaves the member absent rather than an empty map.
    fn read_prefix_headers(
        &self,
        model: &Model,
        response: &WireResponse,
        members: &mut BTreeMap<String, Value>,
    ) -> Result<(), DecodeError> {
        let binding = match &self.prefix_header_binding {
            Some(binding) => binding,
            None => return Ok(()),
        };
        let member = self.member(model, binding);
        let collected = match prefix_header_map(response.headers(), &binding.location_name) {
            Some(collected) => collected,
            None => return Ok(()),
        };
        let value_shape = match &model.shape(member.target).kind {
            ShapeKind::Map { value } => *value,
            // binding resolution already rejected non-map targets
            _ => return Ok(()),
        };
        let mut map = BTreeMap::new();
        for (key, values) in collected {
            let entry = match &model.shape(value_shape).kind {
                ShapeKind::Set { .. } => {
                    let mut items: Vec<Value> = Vec::with_capacity(values.len());
                    for v in values {
                        let v = Value::String(v);
                        if !items.contains(&v) {
                            items.push(v);
                        }
                    }
                    Value::List(items)
                }
                ShapeKind::List { .. } => {
                    Value::List(values.into_iter().map(Value::String).collect())
                }
                _ => match values.into_iter().next() {
                    Some(first) => Value::String(first),
                    None => continue,
                },
            };
            map.insert(key, entry);
        }
        members.insert(binding.member_name.clone(), Value::Map(map));
        Ok(())
    }

    fn read_body(
        &self,
        model: &Model,
        response: &WireResponse,
        decoder: Option<&dyn BodyDecoder>,
        members: &mut BTreeMap<String, Value>,
    ) -> Result<(), DecodeError> {
        if let Some(binding) = &self.payload_binding {
            let member = self.member(model, binding);
            if let Some(body) = response.body() {
                let value = self.decode_payload(model, member, body, decoder)?;
                members.insert(binding.member_name.clone(), value);
            }
            return Ok(());
        }
        if self.document_bindings.is_empty() {
            return Ok(());
        }

        let decoded = match (decoder, response.body()) {
            (Some(decoder), Some(body)) if !body.is_empty() => {
                Some(decoder.decode(body).map_err(DecodeError::Deserialization)?)
            }
            _ => None,
        };
        match decoded {
            Some(Value::Map(document)) => {
                for binding in &self.document_bindings {
                    match document.get(&binding.location_name) {
                        Some(Value::Null) | None => {}
                        Some(value) => {
                            members.insert(binding.member_name.clone(), value.clone());
                        }
                    }
                }
            }
            Some(_) => {
                return Err(DecodeError::InvalidBody {
                    member: self.shape_name.clone(),
                    message: "document body did not decode to a map".to_owned(),
                })
            }
            // No body: required scalars take their zero value, everything
            // else stays absent.
            None => {
                for binding in &self.document_bindings {
                    let member = self.member(model, binding);
                    if !member.is_required() {
                        continue;
                    }
                    if let Some(zero) = zero_value(model, member.target) {
                        members.insert(binding.member_name.clone(), zero);
                    }
                }
            }
        }
        Ok(())
    }

    fn decode_payload(
        &self,
        model: &Model,
        member: &Member,
        body: &[u8],
        decoder: Option<&dyn BodyDecoder>,
    ) -> Result<Value, DecodeError> {
        match &model.shape(member.target).kind {
            ShapeKind::Blob => Ok(Value::Blob(body.to_vec())),
            ShapeKind::String => match std::str::from_utf8(body) {
                Ok(text) => Ok(Value::String(text.to_owned())),
                Err(_) => Err(DecodeError::InvalidBody {
                    member: member.name.clone(),
                    message: "payload is not valid UTF-8".to_owned(),
                }),
            },
            ShapeKind::Structure { .. } | ShapeKind::Union { .. } | ShapeKind::Document => {
                match decoder {
                    Some(decoder) => decoder.decode(body).map_err(DecodeError::Deserialization),
                    None => Err(DecodeError::InvalidBody {
                        member: member.name.clone(),
                        message: "structured payload requires a body decoder".to_owned(),
                    }),
                }
            }
            _ => Err(DecodeError::InvalidBody {
                member: member.name.clone(),
                message: "member cannot carry a payload".to_owned(),
            }),
        }
    }
}

/// The zero value a required member takes when the wire carried nothing.
fn zero_value(model: &Model, target: ShapeId) -> Option<Value> {
    match &model.shape(target).kind {
        ShapeKind::Boolean => Some(Value::Bool(false)),
        ShapeKind::Byte | ShapeKind::Short | ShapeKind::Integer | ShapeKind::Long => {
            Some(Value::Number(Number::from(0i64)))
        }
        ShapeKind::Float | ShapeKind::Double => Some(Value::Number(Number::Float(0.0))),
        _ => None,
    }
}

/// Extra context the transport already extracted from a failed response.
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    /// A human-readable message, when the wire carried one.
    pub message: Option<String>,
    /// The service-assigned request id, when present.
    pub request_id: Option<String>,
}

/// One modeled error an operation can return.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorCase {
    /// The error shape's name, matched against the wire's error type.
    pub name: String,
    /// How to reassemble the error shape.
    pub plan: ResponsePlan,
}

/// Routes a failed response to the modeled error named by its error-type
/// indicator, falling back to an unknown variant for anything unrecognized.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDispatcher {
    /// The operation whose errors are dispatched.
    pub operation: String,
    /// Modeled error cases, sorted by name.
    pub cases: Vec<ErrorCase>,
}

/// A dispatched service failure.
#[derive(Debug)]
pub enum ServiceError {
    /// A modeled error, fully reassembled.
    Modeled {
        /// The matched error shape name.
        name: String,
        /// The reassembled error structure.
        value: Value,
        /// A message carried out of band, when present.
        message: Option<String>,
        /// The service-assigned request id, when present.
        request_id: Option<String>,
        /// The response status code.
        status: u16,
    },
    /// A failure the model does not name. Never itself a decode failure.
    Unknown {
        /// The response status code.
        status: u16,
        /// A message carried out of band, when present.
        message: Option<String>,
        /// The raw response body, for the caller to inspect.
        body: Option<Vec<u8>>,
    },
}

impl ErrorDispatcher {
    /// Dispatches `response` on its extracted error-type indicator.
    ///
    /// A missing or unmatched indicator yields [`ServiceError::Unknown`];
    /// only a matched case that then fails to reassemble is a decode error.
    pub fn dispatch(
        &self,
        model: &Model,
        error_type: Option<&str>,
        response: &WireResponse,
        decoder: Option<&dyn BodyDecoder>,
        context: &ErrorContext,
    ) -> Result<ServiceError, DecodeError> {
        let case = error_type.and_then(|name| self.cases.iter().find(|c| c.name == name));
        match case {
            Some(case) => {
                tracing::debug!(
                    operation = %self.operation,
                    error = %case.name,
                    "dispatching modeled error"
                );
                let value = case.plan.parse(model, response, decoder)?;
                Ok(ServiceError::Modeled {
                    name: case.name.clone(),
                    value,
                    message: context.message.clone(),
                    request_id: context.request_id.clone(),
                    status: response.status().as_u16(),
                })
            }
            None => {
                tracing::debug!(
                    operation = %self.operation,
                    error_type = ?error_type,
                    "no modeled error matched; returning unknown variant"
                );
                Ok(ServiceError::Unknown {
                    status: response.status().as_u16(),
                    message: context.message.clone(),
                    body: response.body().map(|b| b.to_vec()),
                })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{plan_response, BodyDecoder, ErrorCase, ErrorContext, ErrorDispatcher, ServiceError};
    use crate::error::BoxError;
    use crate::model::{Member, Model, ModelBuilder, ShapeId, ShapeKind, StaticTrait};
    use crate::ProtocolConfig;
    use bytes::Bytes;
    use http::StatusCode;
    use restbind_http::WireResponse;
    use restbind_types::{Number, Value};
    use std::collections::BTreeMap;

    /// Decodes `key=value;...` lines written by the request-side test encoder.
    struct LineDecoder;

    impl BodyDecoder for LineDecoder {
        fn decode(&self, body: &[u8]) -> Result<Value, BoxError> {
            let text = std::str::from_utf8(body)?;
            let mut map = BTreeMap::new();
            for pair in text.split(';').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').ok_or("malformed pair")?;
                map.insert(key.to_owned(), Value::String(value.to_owned()));
            }
            Ok(Value::Map(map))
        }
    }

    fn output_shape(b: &mut ModelBuilder, members: Vec<Member>) -> ShapeId {
        b.shape("Output", ShapeKind::Structure { members })
    }

    #[test]
    fn prefix_headers_preserve_remainder_case() {
        let mut b = ModelBuilder::new();
        let string = b.shape("String", ShapeKind::String);
        let map = b.shape("Metadata", ShapeKind::Map { value: string });
        let output = output_shape(
            &mut b,
            vec![Member::new("metadata", map)
                .with_trait(StaticTrait::PrefixHeaders("X-Meta-".into()))],
        );
        let model = b.build();
        let plan = plan_response(&model, output, "GetObject", &ProtocolConfig::default()).unwrap();
        let response = WireResponse::new(StatusCode::OK)
            .with_header("X-Meta-Foo", "bar")
            .with_header("X-Other", "nope");
        let parsed = plan.parse(&model, &response, None).unwrap();
        let members = parsed.as_map().unwrap();
        let metadata = members["metadata"].as_map().unwrap();
        assert_eq!(
            metadata.get("Foo"),
            Some(&Value::String("bar".to_owned()))
        );
        assert_eq!(metadata.len(), 1);
    }

    #[test]
    fn no_matching_prefix_leaves_the_member_absent() {
        let mut b = ModelBuilder::new();
        let string = b.shape("String", ShapeKind::String);
        let map = b.shape("Metadata", ShapeKind::Map { value: string });
        let output = output_shape(
            &mut b,
            vec![Member::new("metadata", map)
                .with_trait(StaticTrait::PrefixHeaders("X-Meta-".into()))],
        );
        let model = b.build();
        let plan = plan_response(&model, output, "GetObject", &ProtocolConfig::default()).unwrap();
        let response = WireResponse::new(StatusCode::OK).with_header("X-Other", "nope");
        let parsed = plan.parse(&model, &response, None).unwrap();
        assert!(parsed.as_map().unwrap().get("metadata").is_none());
    }

    #[test]
    fn status_code_member_captures_the_status() {
        let mut b = ModelBuilder::new();
        let integer = b.shape("Integer", ShapeKind::Integer);
        let output = output_shape(
            &mut b,
            vec![Member::new("status", integer).with_trait(StaticTrait::ResponseCode)],
        );
        let model = b.build();
        let plan = plan_response(&model, output, "Op", &ProtocolConfig::default()).unwrap();
        let parsed = plan.parse(&model, &WireResponse::new(StatusCode::PARTIAL_CONTENT), None).unwrap();
        assert_eq!(
            parsed.as_map().unwrap().get("status"),
            Some(&Value::Number(Number::PosInt(206)))
        );
    }

    #[test]
    fn required_scalars_take_zero_values_without_a_body() {
        let mut b = ModelBuilder::new();
        let integer = b.shape("Integer", ShapeKind::Integer);
        let boolean = b.shape("Boolean", ShapeKind::Boolean);
        let string = b.shape("String", ShapeKind::String);
        let output = output_shape(
            &mut b,
            vec![
                Member::new("count", integer).with_trait(StaticTrait::Required),
                Member::new("truncated", boolean).with_trait(StaticTrait::Required),
                Member::new("marker", string),
            ],
        );
        let model = b.build();
        let plan = plan_response(&model, output, "List", &ProtocolConfig::default()).unwrap();
        let parsed = plan
            .parse(&model, &WireResponse::new(StatusCode::OK), Some(&LineDecoder))
            .unwrap();
        let members = parsed.as_map().unwrap();
        assert_eq!(members.get("count"), Some(&Value::Number(Number::PosInt(0))));
        assert_eq!(members.get("truncated"), Some(&Value::Bool(false)));
        assert!(members.get("marker").is_none());
    }

    #[test]
    fn document_members_copy_by_wire_name() {
        let mut b = ModelBuilder::new();
        let string = b.shape("String", ShapeKind::String);
        let output = output_shape(&mut b, vec![Member::new("name", string)]);
        let model = b.build();
        let plan = plan_response(&model, output, "Get", &ProtocolConfig::default()).unwrap();
        let response =
            WireResponse::new(StatusCode::OK).with_body(Bytes::from_static(b"name=fido"));
        let parsed = plan.parse(&model, &response, Some(&LineDecoder)).unwrap();
        assert_eq!(
            parsed.as_map().unwrap().get("name"),
            Some(&Value::String("fido".to_owned()))
        );
    }

    fn error_model() -> (Model, ShapeId) {
        let mut b = ModelBuilder::new();
        let string = b.shape("String", ShapeKind::String);
        let shape = b.shape(
            "NotFound",
            ShapeKind::Structure {
                members: vec![Member::new("resource", string)],
            },
        );
        (b.build(), shape)
    }

    #[test]
    fn matched_indicator_reassembles_the_modeled_error() {
        let (model, shape) = error_model();
        let plan = plan_response(&model, shape, "Get", &ProtocolConfig::default()).unwrap();
        let dispatcher = ErrorDispatcher {
            operation: "Get".into(),
            cases: vec![ErrorCase {
                name: "NotFound".into(),
                plan,
            }],
        };
        let response =
            WireResponse::new(StatusCode::NOT_FOUND).with_body(Bytes::from_static(b"resource=pet-42"));
        let error = dispatcher
            .dispatch(
                &model,
                Some("NotFound"),
                &response,
                Some(&LineDecoder),
                &ErrorContext::default(),
            )
            .unwrap();
        match error {
            ServiceError::Modeled { name, value, status, .. } => {
                assert_eq!(name, "NotFound");
                assert_eq!(status, 404);
                assert_eq!(
                    value.as_map().unwrap().get("resource"),
                    Some(&Value::String("pet-42".to_owned()))
                );
            }
            other => panic!("expected a modeled error, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_indicator_is_unknown_not_a_failure() {
        let (model, shape) = error_model();
        let plan = plan_response(&model, shape, "Get", &ProtocolConfig::default()).unwrap();
        let dispatcher = ErrorDispatcher {
            operation: "Get".into(),
            cases: vec![ErrorCase {
                name: "NotFound".into(),
                plan,
            }],
        };
        let response = WireResponse::new(StatusCode::INTERNAL_SERVER_ERROR).with_body(Bytes::from_static(b"oops"));
        let error = dispatcher
            .dispatch(
                &model,
                Some("InternalFailure"),
                &response,
                Some(&LineDecoder),
                &ErrorContext::default(),
            )
            .unwrap();
        match error {
            ServiceError::Unknown { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body.as_deref(), Some(b"oops".as_slice()));
            }
            other => panic!("expected the unknown variant, got {other:?}"),
        }
    }

    #[test]
    fn missing_indicator_is_unknown() {
        let (model, shape) = error_model();
        let plan = plan_response(&model, shape, "Get", &ProtocolConfig::default()).unwrap();
        let dispatcher = ErrorDispatcher {
            operation: "Get".into(),
            cases: vec![ErrorCase {
                name: "NotFound".into(),
                plan,
            }],
        };
        let error = dispatcher
            .dispatch(
                &model,
                None,
                &WireResponse::new(StatusCode::SERVICE_UNAVAILABLE),
                None,
                &ErrorContext::default(),
            )
            .unwrap();
        assert!(matches!(error, ServiceError::Unknown { status: 503, .. }));
    }
}
