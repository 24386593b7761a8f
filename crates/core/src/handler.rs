use std::collections::{BTreeMap, HashMap};
use std::fmt;

use cmdtree_diagnostics::{Diagnostic, Reason, Span};

use crate::input::CommandInput;
use crate::parameter::Arity;
use crate::sender::Sender;

/// A rejected invocation: why, and against which input.
///
/// Built by the dispatcher and moved into exactly one [`FailureHandler`].
#[derive(Debug, Clone)]
pub struct Failure {
    reason: Reason,
    input: CommandInput,
    arity: Arity,
    usage: String,
}

impl Failure {
    pub(crate) fn new(reason: Reason, input: CommandInput, arity: Arity, usage: String) -> Self {
        Self {
            reason,
            input,
            arity,
            usage,
        }
    }

    /// Why dispatch stopped.
    pub fn reason(&self) -> Reason {
        self.reason
    }

    /// The input as received.
    pub fn input(&self) -> &CommandInput {
        &self.input
    }

    /// The command's token-count bounds.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// The command's usage signature, e.g. `<int> <int>`.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// A one-line, user-facing message.
    pub fn message(&self) -> String {
        let label = self.input.label();
        match self.reason {
            Reason::LackingPermission => {
                format!("you do not have permission to use `{label}`")
            }
            Reason::InvalidSender => format!("`{label}` cannot be used by this sender"),
            Reason::LackingArguments => format!(
                "not enough arguments: expected at least {}, got {} (usage: {})",
                self.arity.min,
                self.input.argument_count(),
                self.usage_line()
            ),
            Reason::ExtraArguments => format!(
                "too many arguments: expected at most {}, got {} (usage: {})",
                self.arity.max,
                self.input.argument_count(),
                self.usage_line()
            ),
            Reason::InsufficientArguments => {
                format!("invalid arguments (usage: {})", self.usage_line())
            }
        }
    }

    fn usage_line(&self) -> String {
        if self.usage.is_empty() {
            self.input.label().to_owned()
        } else {
            format!("{} {}", self.input.label(), self.usage)
        }
    }

    /// Span of the offending region inside [`CommandInput::command_line`].
    pub fn span(&self) -> Span {
        let line = self.input.command_line();
        let label_len = self.input.label().len();
        match self.reason {
            Reason::LackingPermission | Reason::InvalidSender => Span::new(0, label_len),
            Reason::LackingArguments => Span::empty(line.len()),
            Reason::ExtraArguments => match self.input.token_span(self.arity.max) {
                Some((start, _)) => Span::new(start, line.len()),
                None => Span::empty(line.len()),
            },
            Reason::InsufficientArguments => {
                Span::new((label_len + 1).min(line.len()), line.len())
            }
        }
    }

    /// Render as a [`Diagnostic`] carrying the bounds and token count as
    /// context.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut context = BTreeMap::new();
        context.insert("command".to_owned(), self.input.label().to_owned());
        context.insert("min".to_owned(), self.arity.min.to_string());
        context.insert(
            "max".to_owned(),
            if self.arity.max == usize::MAX {
                "unbounded".to_owned()
            } else {
                self.arity.max.to_string()
            },
        );
        context.insert(
            "actual".to_owned(),
            self.input.argument_count().to_string(),
        );
        Diagnostic::new(self.reason, self.message(), Some(self.span())).with_context(context)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason.code(), self.message())
    }
}

/// Receives each rejected invocation.
pub trait FailureHandler: Send + Sync {
    /// Handle one failure.
    fn handle(&self, sender: &dyn Sender, failure: Failure);
}

impl<F> FailureHandler for F
where
    F: Fn(&dyn Sender, Failure) + Send + Sync,
{
    fn handle(&self, sender: &dyn Sender, failure: Failure) {
        self(sender, failure)
    }
}

/// Drops every failure. The default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl FailureHandler for NoopHandler {
    fn handle(&self, _sender: &dyn Sender, failure: Failure) {
        tracing::trace!(reason = %failure.reason(), "failure dropped");
    }
}

/// Sends [`Failure::message`] back to the sender.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageHandler;

impl FailureHandler for MessageHandler {
    fn handle(&self, sender: &dyn Sender, failure: Failure) {
        sender.send_message(&failure.message());
    }
}

/// Routes each failure to the handler registered for its reason, or to a
/// fallback.
pub struct ReasonMultiplexer {
    handlers: HashMap<Reason, Box<dyn FailureHandler>>,
    fallback: Box<dyn FailureHandler>,
}

impl ReasonMultiplexer {
    /// A multiplexer sending unmatched reasons to `fallback`.
    pub fn new(fallback: impl FailureHandler + 'static) -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Box::new(fallback),
        }
    }

    /// Handle `reason` with `handler`, replacing any earlier registration.
    pub fn on(mut self, reason: Reason, handler: impl FailureHandler + 'static) -> Self {
        self.handlers.insert(reason, Box::new(handler));
        self
    }
}

impl Default for ReasonMultiplexer {
    fn default() -> Self {
        Self::new(NoopHandler)
    }
}

impl FailureHandler for ReasonMultiplexer {
    fn handle(&self, sender: &dyn Sender, failure: Failure) {
        match self.handlers.get(&failure.reason()) {
            Some(handler) => handler.handle(sender, failure),
            None => self.fallback.handle(sender, failure),
        }
    }
}

impl fmt::Debug for ReasonMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reasons: Vec<_> = self.handlers.keys().collect();
        reasons.sort();
        f.debug_struct("ReasonMultiplexer")
            .field("reasons", &reasons)
            .finish_non_exhaustive()
    }
}
