/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The conformance closure walker: finds every shape that needs encode or
//! decode logic, starting from operation boundaries, deduplicated by shape
//! identity.

use crate::binding::shape_has_body_members;
use crate::model::{Model, Operation, ShapeId, ShapeKind};
use std::collections::VecDeque;

/// A caller-owned "already processed" set keyed by shape index.
///
/// Owning it outside the walk keeps a resolution pass composable: nothing
/// leaks between runs unless the caller passes the same set twice on purpose.
#[derive(Debug)]
pub struct VisitedSet {
    seen: Vec<bool>,
}

impl VisitedSet {
    /// Creates a set sized for `model`.
    pub fn new(model: &Model) -> Self {
        VisitedSet {
            seen: vec![false; model.shape_count()],
        }
    }

    /// Marks `id` as visited; returns `true` the first time.
    pub fn insert(&mut self, id: ShapeId) -> bool {
        let seen = &mut self.seen[id.index()];
        let first = !*seen;
        *seen = true;
        first
    }

    /// True when `id` was already visited.
    pub fn contains(&self, id: ShapeId) -> bool {
        self.seen[id.index()]
    }
}

/// The closure of shapes needing generated serde logic, partitioned into
/// shapes directly bound to HTTP (which get a synthesized body wrapper) and
/// plain nested shapes.
#[derive(Debug, PartialEq)]
pub struct SerdeClosure {
    /// Operation inputs/outputs/errors with at least one body-bound member.
    pub top_level: Vec<ShapeId>,
    /// Structures and unions reached through members, elements, and map
    /// values. Scalars and collections are traversed through, not collected.
    pub nested: Vec<ShapeId>,
}

/// The shapes needing encode logic: operation inputs and everything nested
/// inside them.
pub fn encodable_closure(
    model: &Model,
    operations: &[&Operation],
    visited: &mut VisitedSet,
) -> SerdeClosure {
    let roots: Vec<ShapeId> = operations.iter().map(|op| op.input).collect();
    walk(model, roots, visited)
}

/// The shapes needing decode logic: operation outputs, modeled errors, and
/// everything nested inside them.
pub fn decodable_closure(
    model: &Model,
    operations: &[&Operation],
    visited: &mut VisitedSet,
) -> SerdeClosure {
    let mut roots = Vec::new();
    for op in operations {
        roots.extend(op.output);
        roots.extend(op.errors.iter().copied());
    }
    walk(model, roots, visited)
}

/// Breadth-first traversal over structural relationships only: member target,
/// list/set element, map value, union member. Map keys are always strings and
/// are excluded. A shape is added the first time it is reached, no matter how
/// many paths lead to it.
///
/// A root without body-bound members needs no top-level unit, but it stays
/// unvisited: if another root nests it as a body member, the structural walk
/// must still collect it.
fn walk(model: &Model, roots: Vec<ShapeId>, visited: &mut VisitedSet) -> SerdeClosure {
    let mut top_level = Vec::new();
    let mut queue = VecDeque::new();
    for root in roots {
        let shape = model.shape(root);
        if shape_has_body_members(shape) {
            if !visited.insert(root) {
                continue;
            }
            top_level.push(root);
        }
        for member in shape.members() {
            queue.push_back(member.target);
        }
    }

    let mut nested = Vec::new();
    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        let shape = model.shape(id);
        tracing::trace!(shape = %shape.name, "walking nested shape");
        match &shape.kind {
            ShapeKind::Structure { members } | ShapeKind::Union { members } => {
                nested.push(id);
                for member in members {
                    queue.push_back(member.target);
                }
            }
            ShapeKind::List { member } | ShapeKind::Set { member } => {
                queue.push_back(*member);
            }
            ShapeKind::Map { value } => {
                queue.push_back(*value);
            }
            // Scalars and documents are encoded inline at the point of use.
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
            | ShapeKind::Document => {}
        }
    }
    SerdeClosure { top_level, nested }
}

#[cfg(test)]
mod test {
    use super::{encodable_closure, VisitedSet};
    use crate::model::{
        HttpTrait, Member, Model, ModelBuilder, Operation, ShapeId, ShapeKind, UriPattern,
    };

    /// Two operations that share one input shape, which nests a structure
    /// through a list.
    fn shared_input_model() -> (Model, ShapeId, ShapeId) {
        let mut b = ModelBuilder::new();
        let string = b.shape("String", ShapeKind::String);
        let nested = b.shape(
            "Nested",
            ShapeKind::Structure {
                members: vec![Member::new("value", string)],
            },
        );
        let list = b.shape("NestedList", ShapeKind::List { member: nested });
        let input = b.shape(
            "SharedInput",
            ShapeKind::Structure {
                members: vec![Member::new("items", list)],
            },
        );
        for name in ["OpA", "OpB"] {
            b.operation(Operation {
                name: name.into(),
                http: Some(HttpTrait {
                    method: http::Method::POST,
                    uri: UriPattern::parse("/op").unwrap(),
                }),
                input,
                output: None,
                errors: vec![],
            });
        }
        (b.build(), input, nested)
    }

    #[test]
    fn shared_shapes_are_processed_once() {
        let (model, input, nested) = shared_input_model();
        let ops: Vec<_> = model.operations().iter().collect();
        let mut visited = VisitedSet::new(&model);
        let closure = encodable_closure(&model, &ops, &mut visited);
        assert_eq!(closure.top_level, vec![input]);
        assert_eq!(closure.nested, vec![nested]);
    }

    #[test]
    fn collections_are_traversed_through_but_not_collected() {
        let (model, _, nested) = shared_input_model();
        let ops: Vec<_> = model.operations().iter().collect();
        let mut visited = VisitedSet::new(&model);
        let closure = encodable_closure(&model, &ops, &mut visited);
        // the list shape is walked through to reach `Nested` but is not in
        // the closure itself
        assert_eq!(closure.nested, vec![nested]);
    }

    #[test]
    fn header_only_root_nested_elsewhere_is_still_collected() {
        use crate::model::StaticTrait;
        let mut b = ModelBuilder::new();
        let string = b.shape("String", ShapeKind::String);
        // Filter binds everything to headers, so as an operation input it
        // needs no top-level unit.
        let filter = b.shape(
            "Filter",
            ShapeKind::Structure {
                members: vec![Member::new("kind", string)
                    .with_trait(StaticTrait::Header("X-Kind".into()))],
            },
        );
        let batch_input = b.shape(
            "BatchInput",
            ShapeKind::Structure {
                members: vec![Member::new("filter", filter)],
            },
        );
        for (name, input) in [("ApplyFilter", filter), ("Batch", batch_input)] {
            b.operation(Operation {
                name: name.into(),
                http: Some(HttpTrait {
                    method: http::Method::POST,
                    uri: UriPattern::parse("/op").unwrap(),
                }),
                input,
                output: None,
                errors: vec![],
            });
        }
        let model = b.build();
        let ops: Vec<_> = model.operations().iter().collect();
        let mut visited = VisitedSet::new(&model);
        let closure = encodable_closure(&model, &ops, &mut visited);
        // Filter travels inside BatchInput's body, so it still needs encode
        // logic even though its own operation never serializes it
        assert_eq!(closure.top_level, vec![batch_input]);
        assert_eq!(closure.nested, vec![filter]);
    }

    #[test]
    fn visited_set_is_caller_owned() {
        let (model, input, _) = shared_input_model();
        let ops: Vec<_> = model.operations().iter().collect();
        let mut visited = VisitedSet::new(&model);
        assert!(visited.insert(input));
        // pre-seeding the set excludes the shape from the walk
        let closure = encodable_closure(&model, &ops, &mut visited);
        assert!(closure.top_level.is_empty());
    }
}
