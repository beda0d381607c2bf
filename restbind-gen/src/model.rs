/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The immutable shape graph: shapes, members, traits, and operations.
//!
//! The graph is built once through [`ModelBuilder`] and never mutated during
//! generation; shapes are identified by their index into the model's arena.

use crate::error::SchemaError;
use http::Method;
use restbind_types::instant::Format;

/// Identity of a shape: its index into the model's shape arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(u32);

impl ShapeId {
    /// The arena index behind this id.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Every kind of shape the wire protocol can bind. Matched exhaustively
/// throughout the engine so a new kind cannot be silently unhandled.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// A structure with named, ordered members.
    Structure {
        /// The structure's members.
        members: Vec<Member>,
    },
    /// A tagged union; a value inhabits exactly one member.
    Union {
        /// The union's variants.
        members: Vec<Member>,
    },
    /// An ordered collection of one target shape.
    List {
        /// The element shape.
        member: ShapeId,
    },
    /// An unordered collection without duplicates.
    Set {
        /// The element shape.
        member: ShapeId,
    },
    /// A map with string keys.
    Map {
        /// The value shape. Keys are always strings and carry no binding.
        value: ShapeId,
    },
    /// A UTF-8 string (possibly enum- or media-type-constrained via traits).
    String,
    /// A boolean.
    Boolean,
    /// An 8-bit integer.
    Byte,
    /// A 16-bit integer.
    Short,
    /// A 32-bit integer.
    Integer,
    /// A 64-bit integer.
    Long,
    /// A 32-bit float.
    Float,
    /// A 64-bit float.
    Double,
    /// Raw bytes.
    Blob,
    /// An instant in time.
    Timestamp,
    /// Schema-free open content.
    Document,
}

/// Metadata attached to a shape or member. Traits are data, not behavior.
#[derive(Debug, Clone, PartialEq)]
pub enum StaticTrait {
    /// Bind the member to a named HTTP header. An empty name means "use the
    /// member's own name".
    Header(String),
    /// Bind the member to a named query parameter.
    Query(String),
    /// Bind a map member to all headers sharing a prefix.
    PrefixHeaders(String),
    /// The member alone is the message body.
    Payload,
    /// Bind the member to a URI path label.
    Label,
    /// The member carries the response status code.
    ResponseCode,
    /// The string or blob carries content of this media type and travels
    /// base64-encoded in text locations.
    MediaType(String),
    /// Explicit timestamp wire format, overriding the location default.
    TimestampFormat(Format),
    /// The blob is streamed rather than buffered.
    Streaming,
    /// A client token generated when the caller supplies none.
    IdempotencyToken,
    /// The string only admits these raw values.
    Enumeration(Vec<String>),
    /// The member must be present.
    Required,
    /// Collection elements may individually be absent.
    Sparse,
}

/// A named, trait-annotated slot on a structure or union.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// The member name.
    pub name: String,
    /// The shape this member holds.
    pub target: ShapeId,
    /// Member-level traits.
    pub traits: Vec<StaticTrait>,
}

impl Member {
    /// Creates a member without traits.
    pub fn new(name: impl Into<String>, target: ShapeId) -> Self {
        Member {
            name: name.into(),
            target,
            traits: Vec::new(),
        }
    }

    /// Adds a trait, builder style.
    pub fn with_trait(mut self, t: StaticTrait) -> Self {
        self.traits.push(t);
        self
    }

    /// The declared header name, if the member is header-bound.
    pub fn header_name(&self) -> Option<&str> {
        self.traits.iter().find_map(|t| match t {
            StaticTrait::Header(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// The declared query parameter name, if the member is query-bound.
    pub fn query_name(&self) -> Option<&str> {
        self.traits.iter().find_map(|t| match t {
            StaticTrait::Query(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// The declared header prefix, if the member is prefix-header-bound.
    pub fn prefix_headers(&self) -> Option<&str> {
        self.traits.iter().find_map(|t| match t {
            StaticTrait::PrefixHeaders(prefix) => Some(prefix.as_str()),
            _ => None,
        })
    }

    /// An explicit timestamp format override, if declared.
    pub fn timestamp_format(&self) -> Option<Format> {
        self.traits.iter().find_map(|t| match t {
            StaticTrait::TimestampFormat(format) => Some(*format),
            _ => None,
        })
    }

    /// True when the member carries the given marker trait.
    pub fn has(&self, marker: &StaticTrait) -> bool {
        self.traits.iter().any(|t| t == marker)
    }

    /// True when the member must be present.
    pub fn is_required(&self) -> bool {
        self.has(&StaticTrait::Required)
    }
}

/// A typed node in the shape graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// The shape's model name.
    pub name: String,
    /// What the shape is.
    pub kind: ShapeKind,
    /// Shape-level traits.
    pub traits: Vec<StaticTrait>,
}

impl Shape {
    /// The shape's members; empty for anything but structures and unions.
    pub fn members(&self) -> &[Member] {
        match &self.kind {
            ShapeKind::Structure { members } | ShapeKind::Union { members } => members,
            _ => &[],
        }
    }

    /// The declared enumeration raw values, if any.
    pub fn enum_values(&self) -> Option<&[String]> {
        self.traits.iter().find_map(|t| match t {
            StaticTrait::Enumeration(values) => Some(values.as_slice()),
            _ => None,
        })
    }

    /// True when the shape carries a media type.
    pub fn has_media_type(&self) -> bool {
        self.traits
            .iter()
            .any(|t| matches!(t, StaticTrait::MediaType(_)))
    }

    /// True when collection elements may individually be absent.
    pub fn is_sparse(&self) -> bool {
        self.traits.iter().any(|t| matches!(t, StaticTrait::Sparse))
    }
}

/// One segment of a URI pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum UriSegment {
    /// A fixed path segment.
    Literal(String),
    /// A `{name}` placeholder filled from a label-bound member.
    Label(String),
}

/// A parsed operation URI: path segments plus literal query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct UriPattern {
    /// Path segments in order.
    pub segments: Vec<UriSegment>,
    /// Query parameters baked into the URI itself, e.g. `?list&type=2`.
    pub query_literals: Vec<(String, String)>,
}

impl UriPattern {
    /// Parses a pattern such as `/pets/{petId}?list`.
    pub fn parse(uri: &str) -> Result<Self, SchemaError> {
        let invalid = |reason: &'static str| SchemaError::InvalidUriPattern {
            uri: uri.to_owned(),
            reason,
        };
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };
        if !path.starts_with('/') {
            return Err(invalid("pattern must start with `/`"));
        }
        let mut segments = Vec::new();
        for raw in path.split('/').skip(1).filter(|s| !s.is_empty()) {
            if let Some(label) = raw.strip_prefix('{') {
                let label = label.strip_suffix('}').ok_or_else(|| invalid("unclosed `{`"))?;
                if label.is_empty() {
                    return Err(invalid("empty label"));
                }
                segments.push(UriSegment::Label(label.to_owned()));
            } else if raw.contains('{') || raw.contains('}') {
                return Err(invalid("braces may only delimit a whole segment"));
            } else {
                segments.push(UriSegment::Literal(raw.to_owned()));
            }
        }
        let mut query_literals = Vec::new();
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                match pair.split_once('=') {
                    Some((name, value)) => {
                        query_literals.push((name.to_owned(), value.to_owned()))
                    }
                    None => query_literals.push((pair.to_owned(), String::new())),
                }
            }
        }
        Ok(UriPattern {
            segments,
            query_literals,
        })
    }

    /// The label names appearing in the pattern, in path order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            UriSegment::Label(name) => Some(name.as_str()),
            UriSegment::Literal(_) => None,
        })
    }
}

/// The HTTP binding of an operation: method and URI pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpTrait {
    /// The request method.
    pub method: Method,
    /// The URI pattern with labels and query literals.
    pub uri: UriPattern,
}

/// A service operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// The operation name.
    pub name: String,
    /// The HTTP binding; operations without one are skipped with a warning.
    pub http: Option<HttpTrait>,
    /// The input shape.
    pub input: ShapeId,
    /// The output shape, if the operation returns one.
    pub output: Option<ShapeId>,
    /// Modeled error shapes, in declaration order.
    pub errors: Vec<ShapeId>,
}

/// The finalized, read-only shape graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    shapes: Vec<Shape>,
    operations: Vec<Operation>,
}

impl Model {
    /// Looks up a shape by id.
    ///
    /// Ids are only ever minted by the builder that produced this model, so
    /// an out-of-range id is a caller bug; this panics rather than limping on.
    pub fn shape(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.index()]
    }

    /// All operations in declaration order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// The number of shapes in the arena, for sizing visited sets.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }
}

/// Builds a [`Model`]. Targets must be created before the members that
/// reference them.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    shapes: Vec<Shape>,
    operations: Vec<Operation>,
}

impl ModelBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a shape and returns its id.
    pub fn shape(&mut self, name: impl Into<String>, kind: ShapeKind) -> ShapeId {
        self.shape_with_traits(name, kind, Vec::new())
    }

    /// Adds a shape carrying shape-level traits and returns its id.
    pub fn shape_with_traits(
        &mut self,
        name: impl Into<String>,
        kind: ShapeKind,
        traits: Vec<StaticTrait>,
    ) -> ShapeId {
        let id = ShapeId(self.shapes.len() as u32);
        self.shapes.push(Shape {
            name: name.into(),
            kind,
            traits,
        });
        id
    }

    /// Adds an operation.
    pub fn operation(&mut self, operation: Operation) -> &mut Self {
        self.operations.push(operation);
        self
    }

    /// Finalizes the graph.
    pub fn build(self) -> Model {
        Model {
            shapes: self.shapes,
            operations: self.operations,
        }
    }
}
