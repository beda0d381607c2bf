/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! An explicit diagnostics collector. Warnings travel with the generation
//! result instead of disappearing into process-wide logging, so tests can
//! observe them; each one is also mirrored to `tracing`.

/// How serious a diagnostic is. Fatal conditions are `SchemaError`s, not
/// diagnostics, so the worst severity here is a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something was skipped or degraded.
    Warning,
    /// Purely informational.
    Note,
}

/// One diagnostic with its model context.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The severity.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// The operation being processed, when known.
    pub operation: Option<String>,
}

/// The collector threaded through a generation pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and mirrors it to `tracing`.
    pub fn warn(&mut self, operation: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(operation, %message);
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            message,
            operation: operation.map(str::to_owned),
        });
    }

    /// Records a note.
    pub fn note(&mut self, operation: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(operation, %message);
        self.entries.push(Diagnostic {
            severity: Severity::Note,
            message,
            operation: operation.map(str::to_owned),
        });
    }

    /// All diagnostics in emission order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
