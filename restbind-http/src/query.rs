/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Percent-encoding for query parameter names and values.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

const QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encodes a query parameter name or value.
pub fn fmt_query(value: &str) -> String {
    utf8_percent_encode(value, QUERY_SET).to_string()
}

/// Renders `params` as a query string without the leading `?`.
pub fn fmt_query_string(params: &[(String, String)]) -> String {
    let mut out = String::new();
    for (i, (name, value)) in params.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(&fmt_query(name));
        if !value.is_empty() {
            out.push('=');
            out.push_str(&fmt_query(value));
        }
    }
    out
}
