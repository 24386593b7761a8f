use super::{Arity, CompositionError, Leaf, ParseFault, Parsed};
use crate::BoxError;
use crate::input::CommandInput;
use crate::sender::Sender;
use crate::suggest::Suggestion;
use crate::value::Value;

/// Host-side lookup behind a [`LookupLeaf`], e.g. "player by name" or
/// "world + coordinates".
///
/// `Ok(None)` means the tokens named nothing: user error, reported as
/// invalid input. `Err` is an environment fault and aborts the dispatch.
///
/// Any `Fn(&dyn Sender, &[String]) -> Result<Option<Value>, BoxError>`
/// is a resolver without completions.
pub trait Resolver: Send + Sync {
    /// Resolve exactly the leaf's width worth of tokens.
    fn resolve(&self, sender: &dyn Sender, tokens: &[String]) -> Result<Option<Value>, BoxError>;

    /// Completions for the last token of the window.
    fn suggest(&self, sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        let _ = (sender, input);
        Vec::new()
    }
}

impl<F> Resolver for F
where
    F: Fn(&dyn Sender, &[String]) -> Result<Option<Value>, BoxError> + Send + Sync,
{
    fn resolve(&self, sender: &dyn Sender, tokens: &[String]) -> Result<Option<Value>, BoxError> {
        self(sender, tokens)
    }
}

/// A fixed-width leaf that hands its tokens to a [`Resolver`].
pub struct LookupLeaf {
    name: String,
    width: usize,
    resolver: Box<dyn Resolver>,
}

impl LookupLeaf {
    /// A leaf consuming exactly `width` tokens.
    pub fn new(
        name: impl Into<String>,
        width: usize,
        resolver: impl Resolver + 'static,
    ) -> Result<Self, CompositionError> {
        let name = name.into();
        if width == 0 {
            return Err(CompositionError::ZeroWidth {
                role: "lookup",
                node: format!("<{name}>"),
            });
        }
        Ok(Self {
            name,
            width,
            resolver: Box::new(resolver),
        })
    }
}

impl Leaf for LookupLeaf {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> Arity {
        Arity::fixed(self.width)
    }

    fn parse(&self, sender: &dyn Sender, input: &CommandInput) -> Result<Parsed, ParseFault> {
        let resolved = self
            .resolver
            .resolve(sender, input.tokens())
            .map_err(|source| ParseFault::Resolver {
                node: self.name.clone(),
                source,
            })?;
        if resolved.is_none() {
            tracing::debug!(
                lookup = %self.name,
                tokens = %input.argument_line(),
                "lookup found nothing"
            );
        }
        Ok(resolved.into())
    }

    fn suggest(&self, sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        self.resolver.suggest(sender, input)
    }
}
