use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use super::{Arity, CompositionError, Leaf, ParseFault, Parsed};
use crate::input::CommandInput;
use crate::sender::Sender;
use crate::suggest::{Suggestion, filter_prefix};
use crate::value::Value;

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("integer pattern is valid"));

static DOUBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)$").expect("double pattern is valid")
});

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("uuid pattern is valid")
});

/// The single token of a width-one window.
fn single(input: &CommandInput) -> Result<&str, ParseFault> {
    Ok(input.argument(0)?)
}

/// `true` or `false`, any case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolLeaf;

impl Leaf for BoolLeaf {
    fn name(&self) -> &str {
        "bool"
    }

    fn arity(&self) -> Arity {
        Arity::fixed(1)
    }

    fn parse(&self, _sender: &dyn Sender, input: &CommandInput) -> Result<Parsed, ParseFault> {
        let token = single(input)?;
        Ok(if token.eq_ignore_ascii_case("true") {
            Parsed::Value(Value::Bool(true))
        } else if token.eq_ignore_ascii_case("false") {
            Parsed::Value(Value::Bool(false))
        } else {
            Parsed::Invalid
        })
    }

    fn suggest(&self, _sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        filter_prefix(
            [Suggestion::new("true"), Suggestion::new("false")],
            input.last_argument(),
        )
    }
}

/// A signed whole number that fits in an `i64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerLeaf;

impl Leaf for IntegerLeaf {
    fn name(&self) -> &str {
        "int"
    }

    fn arity(&self) -> Arity {
        Arity::fixed(1)
    }

    fn parse(&self, _sender: &dyn Sender, input: &CommandInput) -> Result<Parsed, ParseFault> {
        let token = single(input)?;
        if !INTEGER.is_match(token) {
            return Ok(Parsed::Invalid);
        }
        // Out-of-range digits match the pattern but are still bad input.
        Ok(token.parse::<i64>().ok().map(Value::Int).into())
    }
}

/// A signed decimal. `12.` is accepted; exponents are not.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleLeaf;

impl Leaf for DoubleLeaf {
    fn name(&self) -> &str {
        "double"
    }

    fn arity(&self) -> Arity {
        Arity::fixed(1)
    }

    fn parse(&self, _sender: &dyn Sender, input: &CommandInput) -> Result<Parsed, ParseFault> {
        let token = single(input)?;
        if !DOUBLE.is_match(token) {
            return Ok(Parsed::Invalid);
        }
        Ok(token
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Double)
            .into())
    }
}

/// An RFC 4122 UUID in canonical hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidLeaf;

impl Leaf for UuidLeaf {
    fn name(&self) -> &str {
        "uuid"
    }

    fn arity(&self) -> Arity {
        Arity::fixed(1)
    }

    fn parse(&self, _sender: &dyn Sender, input: &CommandInput) -> Result<Parsed, ParseFault> {
        let token = single(input)?;
        if !UUID.is_match(token) {
            return Ok(Parsed::Invalid);
        }
        Ok(Uuid::parse_str(token).ok().map(Value::Uuid).into())
    }
}

/// One or more tokens rejoined with single spaces.
#[derive(Debug, Clone, Copy)]
pub struct TextLeaf {
    max_words: usize,
}

impl TextLeaf {
    /// Any number of words (at least one).
    pub fn unbounded() -> Self {
        Self {
            max_words: usize::MAX,
        }
    }

    /// Between one and `max_words` words.
    pub fn bounded(max_words: usize) -> Result<Self, CompositionError> {
        if max_words == 0 {
            return Err(CompositionError::ZeroWidth {
                role: "text",
                node: "<text>".into(),
            });
        }
        Ok(Self { max_words })
    }
}

impl Leaf for TextLeaf {
    fn name(&self) -> &str {
        "text"
    }

    fn arity(&self) -> Arity {
        Arity::new(1, self.max_words)
    }

    fn parse(&self, _sender: &dyn Sender, input: &CommandInput) -> Result<Parsed, ParseFault> {
        Ok(Parsed::Value(Value::Text(input.argument_line().to_owned())))
    }

    fn describe(&self) -> String {
        if self.max_words == 1 {
            "<text>".into()
        } else {
            "<text...>".into()
        }
    }
}

/// Accepts no tokens and never parses. The initial content of a
/// [`super::MutableParameter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverLeaf;

impl Leaf for NeverLeaf {
    fn name(&self) -> &str {
        "never"
    }

    fn arity(&self) -> Arity {
        Arity::fixed(0)
    }

    fn parse(&self, _sender: &dyn Sender, _input: &CommandInput) -> Result<Parsed, ParseFault> {
        Ok(Parsed::Invalid)
    }

    fn describe(&self) -> String {
        "<unavailable>".into()
    }
}

/// Accepts exactly zero tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLeaf;

impl Leaf for EmptyLeaf {
    fn name(&self) -> &str {
        "empty"
    }

    fn arity(&self) -> Arity {
        Arity::fixed(0)
    }

    fn parse(&self, _sender: &dyn Sender, _input: &CommandInput) -> Result<Parsed, ParseFault> {
        Ok(Parsed::Omitted)
    }

    fn describe(&self) -> String {
        String::new()
    }
}
