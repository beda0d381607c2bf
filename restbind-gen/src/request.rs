/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The request assembler: resolves an operation's input bindings into a
//! [`RequestPlan`] and executes the plan against a structured input value to
//! produce a wire request.

use crate::binding::{resolve_bindings, HttpBindingDescriptor, Location};
use crate::codec;
use crate::error::{BindError, BoxError, SchemaError};
use crate::model::{HttpTrait, Member, Model, Operation, ShapeId, ShapeKind, StaticTrait, UriSegment};
use crate::ProtocolConfig;
use bytes::Bytes;
use restbind_http::label::fmt_label;
use restbind_http::{Body, WireRequest};
use restbind_types::Value;

/// Serializes a synthesized document or structured payload into body bytes.
/// The concrete wire format (JSON, XML, ...) is a protocol concern injected
/// from outside the engine.
pub trait BodyEncoder {
    /// Encodes `value` into body bytes.
    fn encode(&self, value: &Value) -> Result<Bytes, BoxError>;
}

/// Generates client tokens for members marked idempotent when the caller
/// supplies no value.
pub trait IdempotencyTokenGenerator {
    /// Produces one fresh token.
    fn generate_token(&self) -> String;
}

/// UUID-shaped random tokens.
#[derive(Debug, Default)]
pub struct DefaultIdempotencyTokenGenerator;

impl IdempotencyTokenGenerator for DefaultIdempotencyTokenGenerator {
    fn generate_token(&self) -> String {
        let (hi, lo) = (fastrand::u64(..), fastrand::u64(..));
        format!(
            "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
            hi >> 32,
            (hi >> 16) & 0xffff,
            hi & 0x0fff,
            ((lo >> 48) & 0x3fff) | 0x8000,
            lo & 0xffff_ffff_ffff,
        )
    }
}

/// Everything needed to build requests for one operation, with all orderings
/// fixed at plan time so emission and execution are deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    /// The operation name.
    pub operation: String,
    /// The HTTP binding (method and URI pattern).
    pub http: HttpTrait,
    /// Protocol defaults (content type, timestamp formats) captured at plan
    /// time.
    pub config: ProtocolConfig,
    /// The input shape.
    pub input: ShapeId,
    /// Header bindings, sorted by member name.
    pub header_bindings: Vec<HttpBindingDescriptor>,
    /// The at-most-one prefix-headers binding.
    pub prefix_header_binding: Option<HttpBindingDescriptor>,
    /// Query bindings, sorted by wire name.
    pub query_bindings: Vec<HttpBindingDescriptor>,
    /// Label bindings, in member order; matched to URI segments by name.
    pub label_bindings: Vec<HttpBindingDescriptor>,
    /// The at-most-one payload binding.
    pub payload_binding: Option<HttpBindingDescriptor>,
    /// Document bindings, sorted by member name.
    pub document_bindings: Vec<HttpBindingDescriptor>,
}

/// Resolves the request plan for `operation`.
pub fn plan_request(
    model: &Model,
    operation: &Operation,
    http: &HttpTrait,
    config: &ProtocolConfig,
) -> Result<RequestPlan, SchemaError> {
    let bindings = resolve_bindings(model, operation.input, &operation.name)?;
    let mut plan = RequestPlan {
        operation: operation.name.clone(),
        http: http.clone(),
        config: config.clone(),
        input: operation.input,
        header_bindings: Vec::new(),
        prefix_header_binding: None,
        query_bindings: Vec::new(),
        label_bindings: Vec::new(),
        payload_binding: None,
        document_bindings: Vec::new(),
    };
    for binding in bindings {
        match binding.location {
            Location::Header => plan.header_bindings.push(binding),
            Location::Query => plan.query_bindings.push(binding),
            Location::PrefixHeaders => plan.prefix_header_binding = Some(binding),
            Location::Payload => plan.payload_binding = Some(binding),
            Location::Label => plan.label_bindings.push(binding),
            Location::Document => plan.document_bindings.push(binding),
            // Status codes exist only on responses; nothing to send.
            Location::StatusCode => {}
        }
    }
    plan.header_bindings.sort_by(|a, b| a.member_name.cmp(&b.member_name));
    plan.query_bindings.sort_by(|a, b| a.location_name.cmp(&b.location_name));
    plan.document_bindings.sort_by(|a, b| a.member_name.cmp(&b.member_name));

    for label in http.uri.labels() {
        if !plan.label_bindings.iter().any(|b| b.location_name == label) {
            return Err(SchemaError::MissingLabelBinding {
                operation: operation.name.clone(),
                label: label.to_owned(),
            });
        }
    }
    Ok(plan)
}

impl RequestPlan {
    fn member<'a>(&self, model: &'a Model, binding: &HttpBindingDescriptor) -> &'a Member {
        &model.shape(self.input).members()[binding.member_index]
    }

    /// Builds a wire request from `input`.
    ///
    /// `input` must be a structure value keyed by member name. Absent
    /// optional members contribute nothing; absent members marked idempotent
    /// get a generated token.
    pub fn build(
        &self,
        model: &Model,
        input: &Value,
        encoder: &dyn BodyEncoder,
        tokens: &dyn IdempotencyTokenGenerator,
    ) -> Result<WireRequest, BindError> {
        let members = input.as_map().ok_or_else(|| BindError::InputNotAStructure {
            operation: self.operation.clone(),
        })?;
        let mut request = WireRequest::new(self.http.method.clone());
        self.write_path(model, members, &mut request)?;
        self.write_query(model, members, &mut request, tokens)?;
        self.write_headers(model, members, &mut request, tokens)?;
        self.write_prefix_headers(model, members, &mut request)?;
        self.write_body(model, members, &mut request, encoder, tokens)?;
        Ok(request)
    }

    fn write_path(
        &self,
        model: &Model,
        members: &std::collections::BTreeMap<String, Value>,
        request: &mut WireRequest,
    ) -> Result<(), BindError> {
        let mut path = String::new();
        for segment in &self.http.uri.segments {
            path.push('/');
            match segment {
                UriSegment::Literal(text) => path.push_str(text),
                UriSegment::Label(name) => {
                    // plan_request guarantees a binding exists for every label
                    let binding = self
                        .label_bindings
                        .iter()
                        .find(|b| &b.location_name == name)
                        .ok_or_else(|| BindError::MissingLabelValue {
                            member: name.clone(),
                        })?;
                    let member = self.member(model, binding);
                    let value = members.get(&binding.member_name).ok_or_else(|| {
                        BindError::MissingLabelValue {
                            member: binding.member_name.clone(),
                        }
                    })?;
                    let text = self.encode(model, member, member.target, value, Location::Label)?;
                    path.push_str(&fmt_label(&text));
                }
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        request.set_path(path);
        Ok(())
    }

    fn write_query(
        &self,
        model: &Model,
        members: &std::collections::BTreeMap<String, Value>,
        request: &mut WireRequest,
        tokens: &dyn IdempotencyTokenGenerator,
    ) -> Result<(), BindError> {
        for (name, value) in &self.http.uri.query_literals {
            request.push_query(name.clone(), value.clone());
        }
        for binding in &self.query_bindings {
            let member = self.member(model, binding);
            match members.get(&binding.member_name) {
                Some(Value::List(items)) => {
                    let element = codec::collection_element(model, member.target)
                        .map(|(element, _, _)| element)
                        .ok_or_else(|| BindError::UnexpectedValue {
                            member: member.name.clone(),
                            expected: "a scalar query value",
                        })?;
                    // repeated query parameters carry the sequence in order
                    for item in items {
                        let text = self.encode(model, member, element, item, Location::Query)?;
                        request.push_query(binding.location_name.clone(), text);
                    }
                }
                Some(value) => {
                    let text = self.encode(model, member, member.target, value, Location::Query)?;
                    request.push_query(binding.location_name.clone(), text);
                }
                None if member.has(&StaticTrait::IdempotencyToken) => {
                    request.push_query(binding.location_name.clone(), tokens.generate_token());
                }
                None => {}
            }
        }
        Ok(())
    }

    fn write_headers(
        &self,
        model: &Model,
        members: &std::collections::BTreeMap<String, Value>,
        request: &mut WireRequest,
        tokens: &dyn IdempotencyTokenGenerator,
    ) -> Result<(), BindError> {
        for binding in &self.header_bindings {
            let member = self.member(model, binding);
            match members.get(&binding.member_name) {
                Some(Value::List(items)) => {
                    let element = codec::collection_element(model, member.target)
                        .map(|(element, _, _)| element)
                        .ok_or_else(|| BindError::UnexpectedValue {
                            member: member.name.clone(),
                            expected: "a scalar header value",
                        })?;
                    if !items.is_empty() {
                        let line = codec::encode_header_list(model, member, element, items, &self.config)
                            .map_err(|err| self.encoding_error(member, err))?;
                        request.headers_mut().append(binding.location_name.clone(), line);
                    }
                }
                Some(value) => {
                    let text = self.encode(model, member, member.target, value, Location::Header)?;
                    request.headers_mut().append(binding.location_name.clone(), text);
                }
                None if member.has(&StaticTrait::IdempotencyToken) => {
                    request
                        .headers_mut()
                        .append(binding.location_name.clone(), tokens.generate_token());
                }
                None => {}
            }
        }
        Ok(())
    }

    fn write_prefix_headers(
        &self,
        model: &Model,
        members: &std::collections::BTreeMap<String, Value>,
        request: &mut WireRequest,
    ) -> Result<(), BindError> {
        let binding = match &self.prefix_header_binding {
            Some(binding) => binding,
            None => return Ok(()),
        };
        let member = self.member(model, binding);
        let map = match members.get(&binding.member_name) {
            Some(value) => value.as_map().ok_or_else(|| BindError::UnexpectedValue {
                member: member.name.clone(),
                expected: "a map of header values",
            })?,
            None => return Ok(()),
        };
        for (key, value) in map {
            let name = format!("{}{}", binding.location_name, key);
            match value {
                Value::List(items) => {
                    for item in items {
                        let text = item.as_str().ok_or_else(|| BindError::UnexpectedValue {
                            member: member.name.clone(),
                            expected: "string header values",
                        })?;
                        request.headers_mut().append(name.clone(), text);
                    }
                }
                Value::String(text) => request.headers_mut().append(name.clone(), text.clone()),
                _ => {
                    return Err(BindError::UnexpectedValue {
                        member: member.name.clone(),
                        expected: "string header values",
                    })
                }
            }
        }
        Ok(())
    }

    fn write_body(
        &self,
        model: &Model,
        members: &std::collections::BTreeMap<String, Value>,
        request: &mut WireRequest,
        encoder: &dyn BodyEncoder,
        tokens: &dyn IdempotencyTokenGenerator,
    ) -> Result<(), BindError> {
        let bytes = if let Some(binding) = &self.payload_binding {
            let member = self.member(model, binding);
            match members.get(&binding.member_name) {
                Some(value) => Some(self.encode_payload(model, member, value, encoder)?),
                None if member.has(&StaticTrait::IdempotencyToken) => {
                    Some(Bytes::from(tokens.generate_token()))
                }
                None => None,
            }
        } else if !self.document_bindings.is_empty() {
            let mut document = std::collections::BTreeMap::new();
            for binding in &self.document_bindings {
                let member = self.member(model, binding);
                match members.get(&binding.member_name) {
                    Some(value) => {
                        document.insert(binding.location_name.clone(), value.clone());
                    }
                    None if member.has(&StaticTrait::IdempotencyToken) => {
                        document.insert(
                            binding.location_name.clone(),
                            Value::String(tokens.generate_token()),
                        );
                    }
                    None => {}
                }
            }
            if document.is_empty() {
                // all document members absent: no body at all
                None
            } else {
                Some(
                    encoder
                        .encode(&Value::Map(document))
                        .map_err(BindError::Serialization)?,
                )
            }
        } else {
            None
        };

        if let Some(bytes) = bytes {
            // defaults only; a header-bound member that already set either
            // one wins
            if !request.headers().contains("Content-Length") {
                request
                    .headers_mut()
                    .append("Content-Length", bytes.len().to_string());
            }
            if !request.headers().contains("Content-Type") {
                request
                    .headers_mut()
                    .append("Content-Type", self.config.default_content_type.clone());
            }
            request.set_body(Body::Bytes(bytes));
        }
        Ok(())
    }

    /// The sole-payload member becomes the body: blobs raw, strings as UTF-8,
    /// structured values through the injected encoder.
    fn encode_payload(
        &self,
        model: &Model,
        member: &Member,
        value: &Value,
        encoder: &dyn BodyEncoder,
    ) -> Result<Bytes, BindError> {
        match &model.shape(member.target).kind {
            ShapeKind::Blob => value
                .as_blob()
                .map(Bytes::copy_from_slice)
                .ok_or_else(|| BindError::UnexpectedValue {
                    member: member.name.clone(),
                    expected: "a blob",
                }),
            ShapeKind::String => value
                .as_str()
                .map(|s| Bytes::copy_from_slice(s.as_bytes()))
                .ok_or_else(|| BindError::UnexpectedValue {
                    member: member.name.clone(),
                    expected: "a string",
                }),
            ShapeKind::Structure { .. } | ShapeKind::Union { .. } | ShapeKind::Document => {
                encoder.encode(value).map_err(BindError::Serialization)
            }
            _ => Err(BindError::UnexpectedValue {
                member: member.name.clone(),
                expected: "a payload-capable value",
            }),
        }
    }

    fn encode(
        &self,
        model: &Model,
        member: &Member,
        target: ShapeId,
        value: &Value,
        location: Location,
    ) -> Result<String, BindError> {
        codec::encode_scalar(model, member, target, value, location, &self.config)
            .map_err(|err| self.encoding_error(member, err))
    }

    fn encoding_error(&self, member: &Member, err: codec::CodecError) -> BindError {
        BindError::Encoding {
            member: member.name.clone(),
            message: err.to_string(),
        }
    }
}
