/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The emission stage: turns resolved plans and closures into named code
//! units. Emission is a pure function of its inputs; rendering units as
//! source text in some target language is a separate backend concern.

use crate::model::{Model, ShapeId, ShapeKind};
use crate::request::RequestPlan;
use crate::response::ResponsePlan;

/// One generated artifact, named after the shape or operation it serves.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeUnit {
    /// A unique unit name, e.g. `GetPet.request` or `Pet.encode`.
    pub name: String,
    /// What the unit is.
    pub kind: CodeUnitKind,
}

/// The kinds of artifact the engine emits.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeUnitKind {
    /// Serialization logic for one shape's body members.
    ShapeEncoder {
        /// The shape being encoded.
        shape: ShapeId,
        /// True when the shape is an operation input whose body members are
        /// wrapped in a synthesized body container.
        body_wrapper: bool,
        /// `(member name, wire name)` pairs, sorted by member name.
        coding_keys: Vec<(String, String)>,
    },
    /// Deserialization logic for one shape's body members.
    ShapeDecoder {
        /// The shape being decoded.
        shape: ShapeId,
        /// True when the shape is an operation output or error whose body
        /// members arrive in a synthesized body container.
        body_wrapper: bool,
        /// `(member name, wire name)` pairs, sorted by member name.
        coding_keys: Vec<(String, String)>,
    },
    /// The request-building procedure for one operation.
    RequestBuilder(RequestPlan),
    /// The response-parsing procedure for one operation's output.
    ResponseParser(ResponsePlan),
    /// The response-parsing procedure for one modeled error.
    ErrorParser(ResponsePlan),
    /// The error-routing switch for one operation.
    ErrorDispatch {
        /// The operation whose errors are routed.
        operation: String,
        /// Modeled error names, sorted.
        error_names: Vec<String>,
    },
}

/// The `(member name, wire name)` pairs a shape's serde logic addresses.
///
/// Top-level request/response shapes key only their body-bound members;
/// nested shapes and unions key every member.
pub(crate) fn coding_keys(model: &Model, shape: ShapeId, top_level: bool) -> Vec<(String, String)> {
    let shape = model.shape(shape);
    let mut keys: Vec<(String, String)> = shape
        .members()
        .iter()
        .filter(|member| !top_level || crate::binding::member_is_in_http_body(member))
        .map(|member| (member.name.clone(), member.name.clone()))
        .collect();
    keys.sort_by(|a, b| a.0.cmp(&b.0));
    keys
}

/// A shape encoder unit, named `{shape}.encode`.
pub(crate) fn shape_encoder(model: &Model, shape: ShapeId, body_wrapper: bool) -> CodeUnit {
    let name = format!("{}.encode", model.shape(shape).name);
    CodeUnit {
        name,
        kind: CodeUnitKind::ShapeEncoder {
            shape,
            body_wrapper,
            coding_keys: coding_keys(model, shape, body_wrapper),
        },
    }
}

/// A shape decoder unit, named `{shape}_body.decode` when the members arrive
/// in a synthesized body container and `{shape}.decode` otherwise.
pub(crate) fn shape_decoder(model: &Model, shape: ShapeId, body_wrapper: bool) -> CodeUnit {
    let shape_name = &model.shape(shape).name;
    let name = if body_wrapper {
        format!("{shape_name}_body.decode")
    } else {
        format!("{shape_name}.decode")
    };
    CodeUnit {
        name,
        kind: CodeUnitKind::ShapeDecoder {
            shape,
            body_wrapper,
            coding_keys: coding_keys(model, shape, body_wrapper),
        },
    }
}

/// The request builder unit for one operation, named `{operation}.request`.
pub(crate) fn request_builder(plan: RequestPlan) -> CodeUnit {
    CodeUnit {
        name: format!("{}.request", plan.operation),
        kind: CodeUnitKind::RequestBuilder(plan),
    }
}

/// The response parser unit for one operation, named `{operation}.response`.
pub(crate) fn response_parser(operation: &str, plan: ResponsePlan) -> CodeUnit {
    CodeUnit {
        name: format!("{operation}.response"),
        kind: CodeUnitKind::ResponseParser(plan),
    }
}

/// The error parser unit for one modeled error, named `{error}.error`.
pub(crate) fn error_parser(plan: ResponsePlan) -> CodeUnit {
    CodeUnit {
        name: format!("{}.error", plan.shape_name),
        kind: CodeUnitKind::ErrorParser(plan),
    }
}

/// The error dispatch unit for one operation, named
/// `{operation}.error_dispatch`.
pub(crate) fn error_dispatch(operation: &str, mut error_names: Vec<String>) -> CodeUnit {
    error_names.sort();
    CodeUnit {
        name: format!("{operation}.error_dispatch"),
        kind: CodeUnitKind::ErrorDispatch {
            operation: operation.to_owned(),
            error_names,
        },
    }
}

/// True when a shape needs no serde unit at all (nothing would go in a body).
pub(crate) fn is_serde_noop(model: &Model, shape: ShapeId) -> bool {
    match &model.shape(shape).kind {
        ShapeKind::Structure { members } | ShapeKind::Union { members } => members.is_empty(),
        _ => false,
    }
}
