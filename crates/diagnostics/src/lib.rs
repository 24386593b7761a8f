//! Failure reasons and diagnostics for cmdtree.
//!
//! Provides the flat [`Reason`] taxonomy reported by the dispatch engine, the
//! stable reason codes in [`codes`], and the serializable [`Diagnostic`] /
//! [`Span`] pair hosts use to show a failure to a user.

#![warn(missing_docs)]

/// Reason code constants auto-generated from `spec/reasons.json`.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

// ── Reason ──────────────────────────────────────────────────────────────

/// Why a dispatch was rejected before its executor ran.
///
/// The set is deliberately flat: every rejection maps to exactly one reason,
/// and each reason carries a stable code (see [`Reason::code`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    /// Fewer tokens than the parameter tree's minimum usage.
    LackingArguments,
    /// More tokens than the parameter tree's maximum usage.
    ExtraArguments,
    /// Token count in range, but a token failed to parse.
    InsufficientArguments,
    /// The sender kind is not accepted by the command.
    InvalidSender,
    /// The sender lacks the command's permission.
    LackingPermission,
}

impl Reason {
    /// Every reason, in code order.
    pub const ALL: [Reason; 5] = [
        Reason::LackingArguments,
        Reason::ExtraArguments,
        Reason::InsufficientArguments,
        Reason::InvalidSender,
        Reason::LackingPermission,
    ];

    /// Stable diagnostic code for this reason (e.g. `"CMD1001"`).
    pub fn code(self) -> &'static str {
        include!(concat!(env!("OUT_DIR"), "/generated_reason_codes.rs"))
    }

    /// Upper snake-case name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::LackingArguments => "LACKING_ARGUMENTS",
            Reason::ExtraArguments => "EXTRA_ARGUMENTS",
            Reason::InsufficientArguments => "INSUFFICIENT_ARGUMENTS",
            Reason::InvalidSender => "INVALID_SENDER",
            Reason::LackingPermission => "LACKING_PERMISSION",
        }
    }

    /// One-line summary of the reason.
    pub fn summary(self) -> &'static str {
        summary(self.code()).unwrap_or(self.as_str())
    }

    /// Long-form explanation of the reason.
    pub fn explain(self) -> Option<&'static str> {
        explain(self.code())
    }

    /// Look a reason up by its code.
    pub fn from_code(code: &str) -> Option<Reason> {
        Reason::ALL.into_iter().find(|r| r.code() == code)
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Span ────────────────────────────────────────────────────────────────

/// Byte span inside a rendered command line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Create a zero-width span at the given position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Whether the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// ── Diagnostic ──────────────────────────────────────────────────────────

/// A rendered failure, ready to be shown to a user or emitted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable code (e.g., `"CMD1003"`).
    pub id: Cow<'static, str>,
    /// The failure reason the code stands for.
    pub reason: Reason,
    /// Human-readable message.
    pub message: String,
    /// Optional span in the rendered command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Machine-readable context for tooling. Keys and values are free-form strings.
    ///
    /// Uses `BTreeMap` for deterministic key ordering in serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic for `reason`; the id is the reason's code.
    pub fn new(reason: Reason, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            id: Cow::Borrowed(reason.code()),
            reason,
            message: message.into(),
            span,
            context: None,
        }
    }

    /// Attach machine-readable context metadata (builder pattern).
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Returns the human-readable explanation for this diagnostic's code, if available.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error[{}]: {}", self.id, self.message)
    }
}

/// Returns the long-form explanation for a reason code, if known.
///
/// Auto-generated from `spec/reasons.json` at build time.
pub fn explain(id: &str) -> Option<&'static str> {
    include!(concat!(env!("OUT_DIR"), "/generated_explain.rs"))
}

/// Returns the one-line summary for a reason code, if known.
pub fn summary(id: &str) -> Option<&'static str> {
    include!(concat!(env!("OUT_DIR"), "/generated_summary.rs"))
}
