/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Case-preserving header storage and list-valued header parsing.

use std::collections::BTreeMap;

/// An ordered, case-preserving multimap of header names to values.
///
/// `http::HeaderMap` lowercases names on insertion; prefix-header bindings
/// need the original spelling of the un-prefixed remainder, so the wire types
/// carry their own header storage and match names case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header, keeping any existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// The first value for `name`, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name` in insertion order, matched case-insensitively.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// True when at least one value exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// The number of header entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no headers are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A header value that could not be interpreted as the list its binding declares.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// An HTTP-date list with an even number of commas cannot be split into
    /// whole dates.
    #[error("header `{header}` is not a valid HTTP-date list: {reason}")]
    InvalidHttpDateList {
        /// The offending header name.
        header: String,
        /// Why the value could not be split.
        reason: &'static str,
    },
}

/// Splits a comma-delimited header value into trimmed tokens.
///
/// Quoted tokens may themselves contain commas; a backslash escapes the next
/// character inside quotes.
pub fn split_header_values(value: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    for ch in value.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
        } else if in_quotes {
            match ch {
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => current.push(ch),
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => {
                    out.push(std::mem::take(&mut current));
                    current.clear();
                }
                _ => current.push(ch),
            }
        }
    }
    out.push(current);
    out.iter().map(|token| token.trim().to_owned()).collect()
}

/// Splits a header value holding HTTP-date elements.
///
/// The HTTP-date format contains a comma after the weekday, so unquoted lists
/// must be split at every *second* comma. A value containing quotes falls back
/// to the quote-aware split.
pub fn split_http_date_values(header: &str, value: &str) -> Result<Vec<String>, HeaderError> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    if value.contains('"') {
        return Ok(split_header_values(value));
    }
    let comma_count = value.matches(',').count();
    if comma_count <= 1 {
        return Ok(vec![value.trim().to_owned()]);
    }
    if comma_count % 2 == 0 {
        tracing::debug!(header, value, "rejecting malformed HTTP-date header list");
        return Err(HeaderError::InvalidHttpDateList {
            header: header.to_owned(),
            reason: "even number of commas",
        });
    }
    let mut out = Vec::new();
    let mut current = String::new();
    let mut commas_seen = 0;
    for ch in value.chars() {
        if ch == ',' {
            commas_seen += 1;
            if commas_seen % 2 == 0 {
                out.push(std::mem::take(&mut current).trim().to_owned());
                continue;
            }
        }
        current.push(ch);
    }
    out.push(current.trim().to_owned());
    Ok(out)
}

/// Collects all headers whose names start with `prefix` (case-insensitively)
/// into a map keyed by the name with the prefix stripped, preserving the
/// original case of the remainder.
///
/// Returns `None` when no header matches; an empty prefix matches every
/// header.
pub fn prefix_header_map(headers: &Headers, prefix: &str) -> Option<BTreeMap<String, Vec<String>>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers.iter() {
        // the boundary check keeps the slices safe when a multi-byte name
        // straddles the prefix length
        if name.len() >= prefix.len()
            && name.is_char_boundary(prefix.len())
            && name[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            out.entry(name[prefix.len()..].to_owned())
                .or_default()
                .push(value.to_owned());
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
