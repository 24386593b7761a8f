//! cmdtree core library.
//!
//! Turns a tokenized command line into typed values through a tree of
//! composable parameters, checks token-count bounds recursively, produces
//! completions that follow the same windowing rules, and routes every input
//! failure to a typed handler before an executor runs.
//!
//! The main entry points are [`Parameter`] for building argument trees,
//! [`CommandSpec`] for describing a command, and [`Registry`] for dispatching
//! and completing command lines.

#![warn(missing_docs)]

/// Failure values and the handlers that receive them.
pub mod handler;
/// Tokenized command lines and windows over them.
pub mod input;
/// Parameter trees: leaves, combinators, and the parse contract.
pub mod parameter;
/// Label/alias registration and top-level dispatch.
pub mod registry;
/// Who issued a command.
pub mod sender;
/// Completion candidates and providers.
pub mod suggest;
/// Values produced by parameter trees.
pub mod value;

mod dispatch;

#[cfg(test)]
mod testing;

/// Error type for host-supplied code (resolvers, executors).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Input
pub use input::{CommandInput, InputError};

// Parameters
pub use parameter::{
    Arity, CasePolicy, CompositionError, EnumRepository, Leaf, MutableParameter, NamedConstant,
    Parameter, ParameterKind, ParseFault, Parsed, Resolver,
};

// Dispatch
pub use dispatch::{CommandSpec, DispatchError, Executor, Outcome};
pub use handler::{Failure, FailureHandler, MessageHandler, NoopHandler, ReasonMultiplexer};
pub use registry::{CommandHost, RegistrationError, Registry};

// Senders, values, suggestions
pub use sender::{Sender, SenderKind};
pub use suggest::{FirstArgument, StaticSuggestions, Suggestion, SuggestionProvider};
pub use value::{Object, Value};

// Reasons and diagnostics (re-exported from the diagnostics crate)
pub use cmdtree_diagnostics::{Diagnostic, Reason, Span};
