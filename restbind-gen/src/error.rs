/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The two error strata: fatal schema errors raised while resolving a model,
//! and runtime errors raised while executing a bound procedure against a
//! single message.

use restbind_http::header::HeaderError;

/// Errors boxed across the injected serializer boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A malformed binding in the model. Always fatal: generation aborts with the
/// operation, shape, and member at fault.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// More than one member of a shape carries the payload trait.
    #[error(
        "operation `{operation}`: shape `{shape}` binds more than one member to the payload \
         (`{first}` and `{second}`)"
    )]
    MultiplePayloadBindings {
        /// The operation being resolved.
        operation: String,
        /// The offending shape.
        shape: String,
        /// The first payload member.
        first: String,
        /// The conflicting payload member.
        second: String,
    },

    /// More than one member of a shape carries the prefix-headers trait.
    #[error(
        "operation `{operation}`: shape `{shape}` binds more than one member to prefix headers \
         (`{first}` and `{second}`)"
    )]
    MultiplePrefixHeaderBindings {
        /// The operation being resolved.
        operation: String,
        /// The offending shape.
        shape: String,
        /// The first prefix-headers member.
        first: String,
        /// The conflicting prefix-headers member.
        second: String,
    },

    /// Prefix headers bound to anything but a map of strings (or of
    /// string collections).
    #[error(
        "operation `{operation}`: member `{shape}${member}` carries prefix headers but does not \
         target a map of strings"
    )]
    InvalidPrefixHeadersTarget {
        /// The operation being resolved.
        operation: String,
        /// The owning shape.
        shape: String,
        /// The offending member.
        member: String,
    },

    /// A shape/location combination the protocol cannot express.
    #[error("operation `{operation}`: member `{shape}${member}` cannot be bound: {reason}")]
    UnsupportedBinding {
        /// The operation being resolved.
        operation: String,
        /// The owning shape.
        shape: String,
        /// The offending member.
        member: String,
        /// Why the binding is unsupported.
        reason: String,
    },

    /// A URI pattern that could not be parsed.
    #[error("invalid URI pattern `{uri}`: {reason}")]
    InvalidUriPattern {
        /// The raw pattern.
        uri: String,
        /// Why it is invalid.
        reason: &'static str,
    },

    /// A `{label}` in the URI with no label-bound input member to fill it.
    #[error("operation `{operation}`: no input member is bound to URI label `{label}`")]
    MissingLabelBinding {
        /// The operation being resolved.
        operation: String,
        /// The unfilled label.
        label: String,
    },
}

/// A failure while building a request from a structured input value.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// The input value was not a structure.
    #[error("operation `{operation}` input must be a structure value")]
    InputNotAStructure {
        /// The operation whose request was being built.
        operation: String,
    },

    /// A label-bound member had no value; labels can never be absent.
    #[error("member `{member}` fills a URI label and must be present")]
    MissingLabelValue {
        /// The absent member.
        member: String,
    },

    /// A member value did not have the shape its binding requires.
    #[error("member `{member}` expected {expected}")]
    UnexpectedValue {
        /// The offending member.
        member: String,
        /// What the binding required.
        expected: &'static str,
    },

    /// A member value that could not be rendered as wire text.
    #[error("member `{member}` could not be encoded: {message}")]
    Encoding {
        /// The offending member.
        member: String,
        /// What went wrong.
        message: String,
    },

    /// The injected body encoder failed.
    #[error("failed to serialize body: {0}")]
    Serialization(#[source] BoxError),
}

/// A wire value present but unparsable against its declared type. Permanent
/// for a given message; never retried.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A header value failed to convert to its member's type.
    #[error("header `{header}` could not be parsed: {message}")]
    InvalidHeader {
        /// The offending header.
        header: String,
        /// What went wrong.
        message: String,
    },

    /// A header list could not be split into elements.
    #[error(transparent)]
    HeaderList(#[from] HeaderError),

    /// A body (or body member) failed to convert.
    #[error("member `{member}` could not be decoded: {message}")]
    InvalidBody {
        /// The offending member.
        member: String,
        /// What went wrong.
        message: String,
    },

    /// The injected body decoder failed.
    #[error("failed to deserialize body: {0}")]
    Deserialization(#[source] BoxError),
}
