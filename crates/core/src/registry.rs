use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::dispatch::{CommandSpec, DispatchError, Outcome};
use crate::input::CommandInput;
use crate::sender::Sender;
use crate::suggest::{Suggestion, filter_prefix};

/// Rejected command registration.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The label or an alias is empty.
    #[error("command label must not be empty")]
    EmptyLabel,

    /// The label or an alias contains whitespace.
    #[error("`{name}` is not a valid command name (no whitespace allowed)")]
    InvalidName {
        /// The offending name.
        name: String,
    },

    /// An alias repeats the label.
    #[error("command `{label}` lists its own label as an alias")]
    AliasIsLabel {
        /// The command's label.
        label: String,
    },

    /// Two aliases of one command are the same.
    #[error("command `{label}` lists alias `{alias}` twice")]
    DuplicateAlias {
        /// The command's label.
        label: String,
        /// The repeated alias.
        alias: String,
    },

    /// The label or an alias is already registered.
    #[error("`{name}` is already registered by `{owner}`")]
    NameTaken {
        /// The clashing name.
        name: String,
        /// Label of the command that holds it.
        owner: String,
    },
}

/// What a host exposes to command authors: a place to register commands and
/// a way to ask for completions.
pub trait CommandHost {
    /// Register `spec` under its label and aliases.
    fn register(&self, spec: CommandSpec) -> Result<(), RegistrationError>;

    /// Completions for `tokens` typed after `label`.
    fn suggest(&self, sender: &dyn Sender, label: &str, tokens: &[String]) -> Vec<Suggestion>;
}

#[derive(Default)]
struct State {
    commands: Vec<Arc<CommandSpec>>,
    /// Lowercased label or alias → index into `commands`.
    names: HashMap<String, usize>,
}

/// Label/alias → command map. Labels match case-insensitively.
///
/// Registration takes a write lock; dispatch and completion only hold the
/// read lock long enough to clone the command out.
#[derive(Default)]
pub struct Registry {
    state: RwLock<State>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a command by label or alias.
    pub fn get(&self, label: &str) -> Option<Arc<CommandSpec>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .names
            .get(&label.to_lowercase())
            .map(|&i| Arc::clone(&state.commands[i]))
    }

    /// Every registered command, in registration order.
    pub fn commands(&self) -> Vec<Arc<CommandSpec>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.commands.clone()
    }

    /// Number of registered commands (aliases not counted).
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .commands
            .len()
    }

    /// Whether no command is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dispatch `tokens` to the command registered under `label`.
    ///
    /// An unknown label is [`Outcome::Unhandled`], not an error.
    pub fn dispatch(
        &self,
        sender: &dyn Sender,
        label: &str,
        tokens: &[String],
    ) -> Result<Outcome, DispatchError> {
        let Some(spec) = self.get(label) else {
            tracing::debug!(label, "no command registered");
            return Ok(Outcome::Unhandled);
        };
        spec.dispatch(sender, CommandInput::new(label, tokens.iter().cloned()))
    }

    /// Split `line` on whitespace and dispatch it; the first word is the
    /// label. A blank line is [`Outcome::Unhandled`].
    pub fn dispatch_line(&self, sender: &dyn Sender, line: &str) -> Result<Outcome, DispatchError> {
        let mut words = line.split_ascii_whitespace();
        let Some(label) = words.next() else {
            return Ok(Outcome::Unhandled);
        };
        let tokens: Vec<String> = words.map(String::from).collect();
        self.dispatch(sender, label, &tokens)
    }

    /// Completions for a partially typed line.
    ///
    /// While the label itself is being typed, completes labels the sender is
    /// allowed to use; afterwards defers to the command.
    pub fn suggest_line(&self, sender: &dyn Sender, line: &str) -> Vec<Suggestion> {
        let trimmed = line.trim_start();
        match trimmed.split_once(|c: char| c.is_ascii_whitespace()) {
            None => self.suggest_labels(sender, trimmed),
            Some((label, rest)) => match self.get(label) {
                Some(spec) => spec.suggest(sender, &CommandInput::for_completion(label, rest)),
                None => Vec::new(),
            },
        }
    }

    fn suggest_labels(&self, sender: &dyn Sender, prefix: &str) -> Vec<Suggestion> {
        let candidates = self
            .commands()
            .into_iter()
            .filter(|spec| {
                spec.permission()
                    .is_none_or(|permission| sender.has_permission(permission))
                    && sender.kind().is_a(spec.sender_kind())
            })
            .map(|spec| {
                let suggestion = Suggestion::new(spec.label());
                match spec.description() {
                    Some(description) => suggestion.with_tooltip(description),
                    None => suggestion,
                }
            });
        filter_prefix(candidates, prefix)
    }
}

impl CommandHost for Registry {
    fn register(&self, spec: CommandSpec) -> Result<(), RegistrationError> {
        spec.validate()?;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let names: Vec<String> = std::iter::once(spec.label())
            .chain(spec.aliases().iter().map(String::as_str))
            .map(str::to_lowercase)
            .collect();
        for name in &names {
            if let Some(&owner) = state.names.get(name) {
                return Err(RegistrationError::NameTaken {
                    name: name.clone(),
                    owner: state.commands[owner].label().to_owned(),
                });
            }
        }

        let index = state.commands.len();
        for name in names {
            state.names.insert(name, index);
        }
        tracing::debug!(
            label = spec.label(),
            aliases = spec.aliases().len(),
            usage = %spec.usage(),
            "registered command"
        );
        state.commands.push(Arc::new(spec));
        Ok(())
    }

    fn suggest(&self, sender: &dyn Sender, label: &str, tokens: &[String]) -> Vec<Suggestion> {
        match self.get(label) {
            Some(spec) => spec.suggest(sender, &CommandInput::new(label, tokens.iter().cloned())),
            None => Vec::new(),
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<String> = self
            .commands()
            .iter()
            .map(|spec| spec.label().to_owned())
            .collect();
        f.debug_struct("Registry").field("commands", &labels).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoxError;
    use crate::parameter::Parameter;
    use crate::testing::TestSender;
    use crate::value::Value;

    fn noop(_: &dyn Sender, _: Value, _: &CommandInput) -> Result<(), BoxError> {
        Ok(())
    }

    fn registry() -> Registry {
        let registry = Registry::new();
        registry
            .register(
                CommandSpec::new("teleport", Parameter::text(), noop)
                    .with_alias("tp")
                    .with_description("Move somewhere"),
            )
            .unwrap();
        registry
            .register(CommandSpec::new("time", Parameter::integer(), noop).with_permission("time"))
            .unwrap();
        registry
    }

    #[test]
    fn lookups_ignore_case_and_follow_aliases() {
        let registry = registry();
        assert_eq!(registry.get("TP").unwrap().label(), "teleport");
        assert_eq!(registry.get("Teleport").unwrap().label(), "teleport");
        assert!(registry.get("warp").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn taken_names_are_rejected() {
        let registry = registry();
        let err = registry
            .register(CommandSpec::new("warp", Parameter::empty(), noop).with_alias("TP"))
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::NameTaken {
                name: "tp".into(),
                owner: "teleport".into()
            }
        );
        // The failed registration left nothing behind.
        assert!(registry.get("warp").is_none());
    }

    #[test]
    fn unknown_and_blank_lines_are_unhandled() {
        let registry = registry();
        let sender = TestSender::console();
        assert_eq!(registry.dispatch_line(&sender, "warp x").unwrap(), Outcome::Unhandled);
        assert_eq!(registry.dispatch_line(&sender, "   ").unwrap(), Outcome::Unhandled);
        assert_eq!(registry.dispatch_line(&sender, "tp a b").unwrap(), Outcome::Executed);
    }

    #[test]
    fn label_completion_respects_permissions() {
        let registry = registry();
        let got = registry.suggest_line(&TestSender::console(), "t");
        assert_eq!(
            got,
            [Suggestion::new("teleport").with_tooltip("Move somewhere")]
        );
        let admin = TestSender::console().with_permission("time");
        assert_eq!(registry.suggest_line(&admin, "t").len(), 2);
    }
}
