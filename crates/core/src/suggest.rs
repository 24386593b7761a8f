use serde::Serialize;

use crate::input::CommandInput;
use crate::parameter::Parameter;
use crate::sender::Sender;

/// One completion candidate for the token being typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Suggestion {
    /// Replacement text for the last token.
    pub text: String,
    /// Optional hover text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl Suggestion {
    /// A suggestion without a tooltip.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tooltip: None,
        }
    }

    /// Attach a tooltip.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }
}

impl From<&str> for Suggestion {
    fn from(text: &str) -> Self {
        Suggestion::new(text)
    }
}

/// Keep the candidates whose text starts with `current`, ignoring ASCII case.
pub fn filter_prefix(
    candidates: impl IntoIterator<Item = Suggestion>,
    current: &str,
) -> Vec<Suggestion> {
    candidates
        .into_iter()
        .filter(|s| {
            s.text
                .get(..current.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(current))
        })
        .collect()
}

/// Produces completions for a command's arguments.
///
/// A command uses its parameter tree by default; a provider replaces that.
pub trait SuggestionProvider: Send + Sync {
    /// Completions for the last token of `input`.
    fn suggest(&self, sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion>;
}

impl SuggestionProvider for Parameter {
    fn suggest(&self, sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        Parameter::suggest(self, sender, input)
    }
}

impl<F> SuggestionProvider for F
where
    F: Fn(&dyn Sender, &CommandInput) -> Vec<Suggestion> + Send + Sync,
{
    fn suggest(&self, sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        self(sender, input)
    }
}

/// A fixed list, filtered by the token being typed.
#[derive(Debug, Clone, Default)]
pub struct StaticSuggestions {
    candidates: Vec<Suggestion>,
}

impl StaticSuggestions {
    /// Suggest from `candidates`.
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Suggestion>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }
}

impl SuggestionProvider for StaticSuggestions {
    fn suggest(&self, _sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        filter_prefix(self.candidates.iter().cloned(), input.last_argument())
    }
}

/// Delegates to `P` only while the first argument is being typed.
#[derive(Debug, Clone)]
pub struct FirstArgument<P> {
    inner: P,
}

impl<P> FirstArgument<P> {
    /// Wrap `inner`.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: SuggestionProvider> SuggestionProvider for FirstArgument<P> {
    fn suggest(&self, sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        if input.argument_count() == 1 {
            self.inner.suggest(sender, input)
        } else {
            Vec::new()
        }
    }
}
