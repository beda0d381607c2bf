/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The wire-object boundary of restbind: an abstract HTTP request builder, a
//! read-only HTTP response, and the header parsing helpers generated binding
//! code relies on. Nothing in this crate opens sockets; transport is someone
//! else's problem.

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod header;
pub mod label;
pub mod query;
pub mod request;
pub mod response;

pub use header::Headers;
pub use request::{Body, WireRequest};
pub use response::WireResponse;
