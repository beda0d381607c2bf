/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Protocol-agnostic primitives shared by the restbind runtime and the
//! binding code generator: timestamps, numbers, structured values, base64.

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod base64;
pub mod instant;

mod number;
mod value;

pub use instant::Instant;
pub use number::Number;
pub use value::Value;
