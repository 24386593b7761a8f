use std::fmt;
use std::sync::Arc;

use cmdtree_diagnostics::Reason;
use tracing::{debug, warn};

use crate::BoxError;
use crate::handler::{Failure, FailureHandler, NoopHandler};
use crate::input::CommandInput;
use crate::parameter::{Arity, Parameter, ParseFault, Parsed};
use crate::registry::RegistrationError;
use crate::sender::{Sender, SenderKind};
use crate::suggest::{Suggestion, SuggestionProvider};
use crate::value::Value;

/// Runs a command once its arguments have parsed.
///
/// Any `Fn(&dyn Sender, Value, &CommandInput) -> Result<(), BoxError>`
/// is an executor.
pub trait Executor: Send + Sync {
    /// Act on the parsed value. An `Err` propagates out of dispatch as
    /// [`DispatchError::Execution`].
    fn execute(&self, sender: &dyn Sender, value: Value, input: &CommandInput)
    -> Result<(), BoxError>;
}

impl<F> Executor for F
where
    F: Fn(&dyn Sender, Value, &CommandInput) -> Result<(), BoxError> + Send + Sync,
{
    fn execute(
        &self,
        sender: &dyn Sender,
        value: Value,
        input: &CommandInput,
    ) -> Result<(), BoxError> {
        self(sender, value, input)
    }
}

/// What a dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The executor ran and returned `Ok`.
    Executed,
    /// Dispatch stopped before the executor; the handler saw the failure.
    Failed(Reason),
    /// No command is registered under the label.
    Unhandled,
}

/// A hard fault during dispatch. Never routed through a failure handler.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A parameter raised a fault while parsing.
    #[error("command `{command}` failed while parsing arguments")]
    Parse {
        /// The command's label.
        command: String,
        /// The underlying fault.
        #[source]
        source: ParseFault,
    },

    /// The executor returned an error.
    #[error("command `{command}` failed")]
    Execution {
        /// The command's label.
        command: String,
        /// The executor's error.
        #[source]
        source: BoxError,
    },
}

/// Registration descriptor for one command.
///
/// ```
/// use cmdtree_core::{BoxError, CommandInput, CommandSpec, Parameter, Sender, Value};
///
/// let spec = CommandSpec::new(
///     "add",
///     Parameter::chain([Parameter::integer(), Parameter::integer()]).unwrap(),
///     |sender: &dyn Sender, value: Value, _: &CommandInput| -> Result<(), BoxError> {
///         let sum: i64 = value.flatten().iter().filter_map(|v| v.as_int()).sum();
///         sender.send_message(&sum.to_string());
///         Ok(())
///     },
/// )
/// .with_permission("math.add")
/// .with_description("Add two numbers");
/// assert_eq!(spec.usage(), "<int> <int>");
/// ```
#[derive(Clone)]
pub struct CommandSpec {
    label: String,
    aliases: Vec<String>,
    permission: Option<String>,
    sender_kind: SenderKind,
    parameter: Parameter,
    handler: Arc<dyn FailureHandler>,
    executor: Arc<dyn Executor>,
    suggestions: Option<Arc<dyn SuggestionProvider>>,
    description: Option<String>,
}

impl CommandSpec {
    /// A command with no aliases, no permission, any sender, and a no-op
    /// failure handler.
    pub fn new(
        label: impl Into<String>,
        parameter: Parameter,
        executor: impl Executor + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            aliases: Vec::new(),
            permission: None,
            sender_kind: SenderKind::Any,
            parameter,
            handler: Arc::new(NoopHandler),
            executor: Arc::new(executor),
            suggestions: None,
            description: None,
        }
    }

    /// Add an alternative label.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Require `permission`.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Require senders of `kind` (or a subtype).
    pub fn with_sender_kind(mut self, kind: SenderKind) -> Self {
        self.sender_kind = kind;
        self
    }

    /// Route failures to `handler`.
    pub fn with_handler(mut self, handler: impl FailureHandler + 'static) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    /// Replace the parameter tree's completions with `provider`.
    pub fn with_suggestions(mut self, provider: impl SuggestionProvider + 'static) -> Self {
        self.suggestions = Some(Arc::new(provider));
        self
    }

    /// Attach help text. Carried for hosts; the engine never renders it.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Primary label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Alternative labels.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Required permission, if any.
    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    /// Required sender kind.
    pub fn sender_kind(&self) -> SenderKind {
        self.sender_kind
    }

    /// The parameter tree.
    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    /// Help text, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Usage signature of the parameter tree.
    pub fn usage(&self) -> String {
        self.parameter.describe()
    }

    /// Check the label and aliases: non-empty, no whitespace, and no alias
    /// equal to the label or to another alias (ignoring case).
    pub fn validate(&self) -> Result<(), RegistrationError> {
        check_name(&self.label)?;
        let label = self.label.to_lowercase();
        let mut seen: Vec<String> = Vec::with_capacity(self.aliases.len());
        for alias in &self.aliases {
            check_name(alias)?;
            let key = alias.to_lowercase();
            if key == label {
                return Err(RegistrationError::AliasIsLabel {
                    label: self.label.clone(),
                });
            }
            if seen.contains(&key) {
                return Err(RegistrationError::DuplicateAlias {
                    label: self.label.clone(),
                    alias: alias.clone(),
                });
            }
            seen.push(key);
        }
        Ok(())
    }

    fn allowed(&self, sender: &dyn Sender) -> Result<(), Reason> {
        let permitted = self
            .permission
            .as_deref()
            .is_none_or(|permission| sender.has_permission(permission));
        if !permitted {
            return Err(Reason::LackingPermission);
        }
        if !sender.kind().is_a(self.sender_kind) {
            return Err(Reason::InvalidSender);
        }
        Ok(())
    }

    fn fail(
        &self,
        sender: &dyn Sender,
        reason: Reason,
        input: CommandInput,
        arity: Arity,
    ) -> Outcome {
        debug!(
            command = %self.label,
            sender = sender.name(),
            %reason,
            "dispatch rejected"
        );
        let failure = Failure::new(reason, input, arity, self.usage());
        self.handler.handle(sender, failure);
        Outcome::Failed(reason)
    }

    /// Run the dispatch state machine for `input`.
    ///
    /// Permission, sender kind, arity, and parse failures go to the handler
    /// (exactly once) and come back as [`Outcome::Failed`]; the executor is
    /// only reached when all checks pass. Faults are returned as `Err`.
    ///
    /// Mutable slots are read once per call: the bounds check and the parse
    /// see the same tree.
    pub fn dispatch(
        &self,
        sender: &dyn Sender,
        input: CommandInput,
    ) -> Result<Outcome, DispatchError> {
        let parameter = self.parameter.pinned();
        let arity = parameter.arity();
        if let Err(reason) = self.allowed(sender) {
            return Ok(self.fail(sender, reason, input, arity));
        }

        let count = input.argument_count();
        if count < arity.min {
            return Ok(self.fail(sender, Reason::LackingArguments, input, arity));
        }
        if count > arity.max {
            return Ok(self.fail(sender, Reason::ExtraArguments, input, arity));
        }

        let parsed = parameter
            .parse(sender, &input)
            .map_err(|source| {
                warn!(command = %self.label, error = %source, "parse fault");
                DispatchError::Parse {
                    command: self.label.clone(),
                    source,
                }
            })?;
        let value = match parsed {
            Parsed::Value(value) => value,
            Parsed::Omitted => Value::Omitted,
            Parsed::Invalid => {
                return Ok(self.fail(sender, Reason::InsufficientArguments, input, arity));
            }
        };

        debug!(command = %self.label, sender = sender.name(), count, "executing");
        self.executor
            .execute(sender, value, &input)
            .map_err(|source| {
                warn!(command = %self.label, error = %source, "executor failed");
                DispatchError::Execution {
                    command: self.label.clone(),
                    source,
                }
            })?;
        Ok(Outcome::Executed)
    }

    /// Completions for the last token of `input`. Senders who could not run
    /// the command get none.
    pub fn suggest(&self, sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        if self.allowed(sender).is_err() {
            return Vec::new();
        }
        match &self.suggestions {
            Some(provider) => provider.suggest(sender, input),
            None => self.parameter.suggest(sender, input),
        }
    }
}

fn check_name(name: &str) -> Result<(), RegistrationError> {
    if name.is_empty() {
        return Err(RegistrationError::EmptyLabel);
    }
    if name.chars().any(char::is_whitespace) {
        return Err(RegistrationError::InvalidName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("label", &self.label)
            .field("aliases", &self.aliases)
            .field("permission", &self.permission)
            .field("sender_kind", &self.sender_kind)
            .field("usage", &self.usage())
            .finish_non_exhaustive()
    }
}
