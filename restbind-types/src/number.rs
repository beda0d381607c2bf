/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// A numeric value of any of the widths the shape model supports.
///
/// Wire text for integers is rendered with `itoa` and for floats with `ryu`
/// so that repeated generation runs produce identical output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// An unsigned integer.
    PosInt(u64),
    /// A signed integer.
    NegInt(i64),
    /// A floating point value.
    Float(f64),
}

impl Number {
    /// Renders this number as wire text.
    pub fn to_wire_string(self) -> String {
        match self {
            Number::PosInt(v) => itoa::Buffer::new().format(v).to_owned(),
            Number::NegInt(v) => itoa::Buffer::new().format(v).to_owned(),
            Number::Float(v) => ryu::Buffer::new().format(v).to_owned(),
        }
    }

    /// This number as an `f64`, potentially losing precision.
    pub fn to_f64_lossy(self) -> f64 {
        match self {
            Number::PosInt(v) => v as f64,
            Number::NegInt(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    /// This number as an `i64`, when it is an integer that fits.
    pub fn to_i64(self) -> Option<i64> {
        match self {
            Number::PosInt(v) => i64::try_from(v).ok(),
            Number::NegInt(v) => Some(v),
            Number::Float(_) => None,
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        if value < 0 {
            Number::NegInt(value)
        } else {
            Number::PosInt(value as u64)
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::from(value as i64)
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Number::PosInt(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}
