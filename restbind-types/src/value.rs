/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::{Instant, Number};
use std::collections::BTreeMap;

/// A structured value, the runtime counterpart of a shape.
///
/// Structures, unions, and maps are all represented as `Map`; a union value is
/// a map with a single entry. Absent optional members are simply missing from
/// their owning map, so `Null` appears only where a document explicitly
/// carries a null.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An explicit null inside a document.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number of any supported width.
    Number(Number),
    /// A string or enumeration raw value.
    String(String),
    /// Raw bytes.
    Blob(Vec<u8>),
    /// A timestamp.
    Timestamp(Instant),
    /// An ordered sequence.
    List(Vec<Value>),
    /// A structure, union, or map value. `BTreeMap` keeps member iteration
    /// deterministic.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// The contained string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The contained map, if this is a map value.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// The contained list, if this is a list value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The contained bytes, if this is a blob value.
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<Instant> for Value {
    fn from(value: Instant) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::List(values)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Value::Map(values)
    }
}
