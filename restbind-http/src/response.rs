/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The read-only wire response a response-parsing procedure consumes.

use crate::header::Headers;
use bytes::Bytes;
use http::StatusCode;

/// A fully received HTTP response: status, headers, and an optional loaded body.
///
/// `body` is `None` when the response carried no body at all; an empty body is
/// `Some` with zero bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct WireResponse {
    status: StatusCode,
    headers: Headers,
    body: Option<Bytes>,
}

impl WireResponse {
    /// Creates a response with no headers and no body.
    pub fn new(status: StatusCode) -> Self {
        WireResponse {
            status,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Adds a header, builder style. Intended for tests and adapters.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the body, builder style.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The response status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The loaded body bytes, if a body was received.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }
}
