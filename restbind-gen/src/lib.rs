/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Protocol-binding resolution and code emission for REST-style HTTP APIs.
//!
//! Given a shape model whose operations carry HTTP binding traits, this crate
//! resolves each operation into executable request/response plans and emits
//! the set of code units a protocol backend needs: request builders, response
//! parsers, error parsers and dispatchers, and per-shape serde logic for
//! everything reachable from an operation boundary.
//!
//! Resolution is deterministic: the same model and configuration always
//! produce the same units in the same order. Schema problems (conflicting or
//! unsupportable bindings) fail generation with a [`SchemaError`]; anything
//! advisory lands in the returned [`Diagnostics`] instead of aborting.

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod binding;
pub mod closure;
pub mod codec;
pub mod diag;
pub mod emit;
pub mod error;
pub mod model;
pub mod request;
pub mod response;

pub use binding::{HttpBindingDescriptor, Location};
pub use closure::{decodable_closure, encodable_closure, SerdeClosure, VisitedSet};
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use emit::{CodeUnit, CodeUnitKind};
pub use error::{BindError, BoxError, DecodeError, SchemaError};
pub use model::{Model, ModelBuilder, Operation, ShapeId};
pub use request::{
    plan_request, BodyEncoder, DefaultIdempotencyTokenGenerator, IdempotencyTokenGenerator,
    RequestPlan,
};
pub use response::{
    plan_response, BodyDecoder, ErrorCase, ErrorContext, ErrorDispatcher, ResponsePlan,
    ServiceError,
};

use restbind_types::instant::Format;

/// Protocol-level defaults applied wherever the model does not override them.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolConfig {
    /// The content type stamped on requests that carry a body.
    pub default_content_type: String,
    /// The timestamp format for header- and query-bound timestamps without
    /// an explicit format trait.
    pub default_header_timestamp_format: Format,
    /// The timestamp format for body-bound timestamps without an explicit
    /// format trait.
    pub default_document_timestamp_format: Format,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            default_content_type: "application/json".to_owned(),
            default_header_timestamp_format: Format::HttpDate,
            default_document_timestamp_format: Format::DateTime,
        }
    }
}

/// The output of one generation run.
#[derive(Debug, PartialEq)]
pub struct Generation {
    /// Every emitted unit, in deterministic order.
    pub units: Vec<CodeUnit>,
    /// Advisory findings collected along the way.
    pub diagnostics: Diagnostics,
}

/// Resolves every HTTP-bound operation in `model` and emits its code units.
///
/// Operations are processed in name order. Operations without an HTTP trait
/// are skipped with a warning. Error parsers and serde units are emitted once
/// per shape no matter how many operations share the shape.
pub fn generate(model: &Model, config: &ProtocolConfig) -> Result<Generation, SchemaError> {
    let mut diagnostics = Diagnostics::new();
    let mut units = Vec::new();

    let mut bound_ops: Vec<&Operation> = Vec::new();
    let mut sorted: Vec<&Operation> = model.operations().iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    for op in sorted {
        match &op.http {
            Some(_) => bound_ops.push(op),
            None => diagnostics.warn(
                Some(&op.name),
                format!("operation `{}` has no HTTP binding; skipping", op.name),
            ),
        }
    }

    let mut emitted_errors = VisitedSet::new(model);
    for &op in &bound_ops {
        // the loop above only keeps operations that carry the trait
        let http = match &op.http {
            Some(http) => http,
            None => continue,
        };
        let request_plan = plan_request(model, op, http, config)?;
        units.push(emit::request_builder(request_plan));

        if let Some(output) = op.output {
            let plan = plan_response(model, output, &op.name, config)?;
            units.push(emit::response_parser(&op.name, plan));
        }

        let mut error_names: Vec<String> = Vec::with_capacity(op.errors.len());
        for error in &op.errors {
            error_names.push(model.shape(*error).name.clone());
            if emitted_errors.insert(*error) {
                let plan = plan_response(model, *error, &op.name, config)?;
                units.push(emit::error_parser(plan));
            }
        }
        if !error_names.is_empty() {
            units.push(emit::error_dispatch(&op.name, error_names));
        }
    }

    let mut encode_visited = VisitedSet::new(model);
    let encodable = encodable_closure(model, &bound_ops, &mut encode_visited);
    for shape in &encodable.top_level {
        units.push(emit::shape_encoder(model, *shape, true));
    }
    for shape in &encodable.nested {
        if emit::is_serde_noop(model, *shape) {
            diagnostics.note(
                None,
                format!(
                    "shape `{}` has no members; skipping its encoder",
                    model.shape(*shape).name
                ),
            );
            continue;
        }
        units.push(emit::shape_encoder(model, *shape, false));
    }

    let mut decode_visited = VisitedSet::new(model);
    let decodable = decodable_closure(model, &bound_ops, &mut decode_visited);
    for shape in &decodable.top_level {
        units.push(emit::shape_decoder(model, *shape, true));
    }
    for shape in &decodable.nested {
        if emit::is_serde_noop(model, *shape) {
            diagnostics.note(
                None,
                format!(
                    "shape `{}` has no members; skipping its decoder",
                    model.shape(*shape).name
                ),
            );
            continue;
        }
        units.push(emit::shape_decoder(model, *shape, false));
    }

    tracing::debug!(
        units = units.len(),
        diagnostics = diagnostics.entries().len(),
        "generation complete"
    );
    Ok(Generation { units, diagnostics })
}
