/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The mutable wire request a request-building procedure writes into.

use crate::header::Headers;
use crate::query;
use bytes::Bytes;
use http::Method;

/// The body of a wire request.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// No body at all. Distinct from an empty byte body.
    Empty,
    /// A fully loaded byte body.
    Bytes(Bytes),
}

impl Body {
    /// The body bytes, when loaded.
    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            Body::Empty => None,
            Body::Bytes(bytes) => Some(bytes),
        }
    }

    /// The byte length of the body; `Empty` has length zero.
    pub fn len(&self) -> usize {
        self.bytes().map(|b| b.len()).unwrap_or(0)
    }

    /// True when the body carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An abstract HTTP request under construction.
///
/// The path is stored already percent-encoded (label substitution encodes as
/// it writes); query parameters are stored raw and encoded when the URI is
/// rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    method: Method,
    path: String,
    query_params: Vec<(String, String)>,
    headers: Headers,
    body: Body,
}

impl WireRequest {
    /// Creates a request with an empty path and body.
    pub fn new(method: Method) -> Self {
        WireRequest {
            method,
            path: String::new(),
            query_params: Vec::new(),
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Replaces the (already percent-encoded) request path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// The request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Appends one query parameter. Repeated names are preserved in order.
    pub fn push_query(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query_params.push((name.into(), value.into()));
    }

    /// The raw query parameters in insertion order.
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query_params
    }

    /// The request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to the request headers.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Replaces the request body.
    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// The request body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Renders path and query parameters as a request target.
    pub fn uri(&self) -> String {
        if self.query_params.is_empty() {
            self.path.clone()
        } else {
            format!(
                "{}?{}",
                self.path,
                query::fmt_query_string(&self.query_params)
            )
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Body, WireRequest};
    use bytes::Bytes;
    use http::Method;

    #[test]
    fn renders_uri_with_query() {
        let mut request = WireRequest::new(Method::GET);
        request.set_path("/pets/fido");
        request.push_query("limit", "10");
        request.push_query("tag", "a b");
        assert_eq!(request.uri(), "/pets/fido?limit=10&tag=a%20b");
    }

    #[test]
    fn body_length() {
        let mut request = WireRequest::new(Method::POST);
        assert!(request.body().is_empty());
        request.set_body(Body::Bytes(Bytes::from_static(b"abc")));
        assert_eq!(request.body().len(), 3);
    }
}
