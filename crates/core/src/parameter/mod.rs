//! The parsing-unit contract and the combinators built on it.
//!
//! A [`Parameter`] is one of a closed set of node kinds: a leaf, a sequence,
//! a repetition, an optional, or a mutable (runtime-swappable) slot. Every
//! node reports inclusive token-count bounds ([`Arity`]) and guards them: a
//! window outside `[min, max]` parses to [`Parsed::Invalid`] before the node
//! looks at a single token.

mod combinator;
/// Enum-by-name leaves and the per-type name table cache.
pub mod enums;
/// Built-in scalar leaves.
pub mod leaf;
/// Leaves that delegate to host resolvers.
pub mod lookup;

pub use combinator::MutableParameter;
pub use enums::{CasePolicy, EnumRepository, NamedConstant};
pub use leaf::{BoolLeaf, DoubleLeaf, EmptyLeaf, IntegerLeaf, NeverLeaf, TextLeaf, UuidLeaf};
pub use lookup::{LookupLeaf, Resolver};

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::BoxError;
use crate::input::{CommandInput, InputError};
use crate::sender::Sender;
use crate::suggest::Suggestion;
use crate::value::Value;

// ── Arity ───────────────────────────────────────────────────────────────

/// Inclusive token-count bounds `[min, max]`.
///
/// Invariant: `min <= max`. `usize::MAX` stands for "unbounded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arity {
    /// Fewest tokens accepted.
    pub min: usize,
    /// Most tokens accepted.
    pub max: usize,
}

impl Arity {
    /// Create an arity.
    ///
    /// # Panics
    /// Panics if `min > max`.
    pub fn new(min: usize, max: usize) -> Self {
        assert!(min <= max, "Arity: min ({min}) must not exceed max ({max})");
        Self { min, max }
    }

    /// Exactly `width` tokens.
    pub fn fixed(width: usize) -> Self {
        Self {
            min: width,
            max: width,
        }
    }

    /// Whether `min == max`.
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// Whether `count` is within bounds.
    pub fn contains(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }

    /// Bounds of `self` followed by `next`, saturating at `usize::MAX`.
    pub fn then(self, next: Arity) -> Arity {
        Arity {
            min: self.min.saturating_add(next.min),
            max: self.max.saturating_add(next.max),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (min, max) if min == max => write!(f, "{min}"),
            (min, usize::MAX) => write!(f, "{min}.."),
            (min, max) => write!(f, "{min}..={max}"),
        }
    }
}

// ── Parse outcome ───────────────────────────────────────────────────────

/// Outcome of a soft parse.
///
/// `Omitted` and `Invalid` are different answers: an optional parameter that
/// was left out is fine, a malformed token is not.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// The tokens parsed to a value.
    Value(Value),
    /// An optional parameter was not supplied.
    Omitted,
    /// The tokens were malformed for this parameter.
    Invalid,
}

impl Parsed {
    /// Whether this is [`Parsed::Invalid`].
    pub fn is_invalid(&self) -> bool {
        matches!(self, Parsed::Invalid)
    }

    /// The value, mapping `Omitted` to [`Value::Omitted`]; `None` when invalid.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Parsed::Value(v) => Some(v),
            Parsed::Omitted => Some(Value::Omitted),
            Parsed::Invalid => None,
        }
    }
}

impl From<Option<Value>> for Parsed {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Parsed::Invalid, Parsed::Value)
    }
}

// ── Errors ──────────────────────────────────────────────────────────────

/// A hard fault raised while parsing: a programmer or environment error,
/// never bad user input. Faults propagate to the caller unchanged.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ParseFault {
    /// A host resolver failed.
    #[error("resolver for `{node}` failed")]
    Resolver {
        /// The lookup parameter's name.
        node: String,
        /// The resolver's error.
        #[source]
        source: BoxError,
    },

    /// A node that must be fixed-width reported variable bounds at parse time
    /// (only reachable through a mutable slot swapped after composition).
    #[error("`{node}` must be fixed-width but accepts {arity} tokens")]
    VariableWidth {
        /// Description of the offending node.
        node: String,
        /// Its bounds at parse time.
        arity: Arity,
    },

    /// Windowing went out of range.
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Rejected combinator construction.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    /// A child that must be fixed-width is not.
    #[error("{role} `{node}` must be fixed-width, got {arity} tokens")]
    VariableWidth {
        /// Which slot the child sits in (e.g. "sequence head").
        role: &'static str,
        /// Description of the child.
        node: String,
        /// The child's bounds.
        arity: Arity,
    },

    /// A child that must consume tokens consumes none.
    #[error("{role} `{node}` must consume at least one token")]
    ZeroWidth {
        /// Which slot the child sits in.
        role: &'static str,
        /// Description of the child.
        node: String,
    },

    /// Repetition counts are inconsistent.
    #[error("invalid repetition count {min_reps}..={max_reps}")]
    InvalidRepetition {
        /// Requested minimum repetitions.
        min_reps: usize,
        /// Requested maximum repetitions.
        max_reps: usize,
    },
}

// ── Leaf contract ───────────────────────────────────────────────────────

/// A leaf parser: turns its window of tokens into a value.
///
/// Implementations must be pure: no interior mutation during `parse` or
/// `suggest`. Malformed tokens yield [`Parsed::Invalid`]; a returned
/// `Err` is a hard fault. The enclosing [`Parameter`] only calls `parse`
/// with a token count inside [`Leaf::arity`].
pub trait Leaf: Send + Sync {
    /// Short name used in usage strings and logs (e.g. `"int"`).
    fn name(&self) -> &str;

    /// Token-count bounds.
    fn arity(&self) -> Arity;

    /// Parse the window.
    fn parse(&self, sender: &dyn Sender, input: &CommandInput) -> Result<Parsed, ParseFault>;

    /// Completions for the last token of the window.
    fn suggest(&self, sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        let _ = (sender, input);
        Vec::new()
    }

    /// Usage fragment; defaults to `<name>`.
    fn describe(&self) -> String {
        format!("<{}>", self.name())
    }
}

// ── Parameter ───────────────────────────────────────────────────────────

/// A node in a parameter tree.
///
/// Trees are built once at registration time and shared across threads;
/// cloning shares leaves and mutable slots.
#[derive(Clone)]
pub struct Parameter {
    node: Node,
}

#[derive(Clone)]
enum Node {
    Leaf(Arc<dyn Leaf>),
    Sequence(Box<Parameter>, Box<Parameter>),
    Repetition {
        inner: Box<Parameter>,
        min_reps: usize,
        max_reps: usize,
    },
    Optional(Box<Parameter>),
    Mutable(MutableParameter),
}

/// Which kind of node a [`Parameter`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// A leaf parser.
    Leaf,
    /// Two parameters in a row.
    Sequence,
    /// One fixed-width parameter repeated.
    Repetition,
    /// A parameter that may be left out.
    Optional,
    /// A swappable slot.
    Mutable,
}

impl Parameter {
    /// Wrap a leaf.
    pub fn leaf(leaf: impl Leaf + 'static) -> Self {
        Self {
            node: Node::Leaf(Arc::new(leaf)),
        }
    }

    /// Case-insensitive `true` / `false`.
    pub fn boolean() -> Self {
        Self::leaf(BoolLeaf)
    }

    /// A signed whole number (`i64`).
    pub fn integer() -> Self {
        Self::leaf(IntegerLeaf)
    }

    /// A signed decimal (`f64`); a trailing `.` is tolerated.
    pub fn double() -> Self {
        Self::leaf(DoubleLeaf)
    }

    /// An RFC 4122 UUID.
    pub fn uuid() -> Self {
        Self::leaf(UuidLeaf)
    }

    /// Free text of one or more tokens, unbounded.
    pub fn text() -> Self {
        Self::leaf(TextLeaf::unbounded())
    }

    /// Free text of `1..=max_words` tokens.
    pub fn text_bounded(max_words: usize) -> Result<Self, CompositionError> {
        Ok(Self::leaf(TextLeaf::bounded(max_words)?))
    }

    /// A parameter that accepts nothing and never parses.
    pub fn never() -> Self {
        Self::leaf(NeverLeaf)
    }

    /// A parameter for commands that take no arguments: accepts exactly zero
    /// tokens and reports [`Parsed::Omitted`].
    pub fn empty() -> Self {
        Self::leaf(EmptyLeaf)
    }

    /// A `width`-token lookup delegating to `resolver`.
    pub fn lookup(
        name: impl Into<String>,
        width: usize,
        resolver: impl Resolver + 'static,
    ) -> Result<Self, CompositionError> {
        Ok(Self::leaf(LookupLeaf::new(name, width, resolver)?))
    }

    /// `first` then `second`.
    ///
    /// `first` must be fixed-width: `second` is windowed at `first`'s
    /// width, so a variable-width head would misalign it. `second` may be
    /// variable-width since it owns the remainder.
    pub fn sequence(first: Parameter, second: Parameter) -> Result<Self, CompositionError> {
        let head = first.arity();
        if !head.is_fixed() {
            return Err(CompositionError::VariableWidth {
                role: "sequence head",
                node: first.describe(),
                arity: head,
            });
        }
        Ok(Self {
            node: Node::Sequence(Box::new(first), Box::new(second)),
        })
    }

    /// Fold `parts` into right-nested sequences: `[a, b, c]` is
    /// `sequence(a, sequence(b, c))`. Every part but the last must be
    /// fixed-width.
    pub fn chain(parts: impl IntoIterator<Item = Parameter>) -> Result<Self, CompositionError> {
        let mut parts: Vec<Parameter> = parts.into_iter().collect();
        let Some(mut acc) = parts.pop() else {
            return Ok(Self::empty());
        };
        while let Some(prev) = parts.pop() {
            acc = Self::sequence(prev, acc)?;
        }
        Ok(acc)
    }

    /// `inner` repeated `min_reps..=max_reps` times.
    ///
    /// `inner` must be fixed-width with width at least one.
    pub fn repetition(
        inner: Parameter,
        min_reps: usize,
        max_reps: usize,
    ) -> Result<Self, CompositionError> {
        if max_reps == 0 || min_reps > max_reps {
            return Err(CompositionError::InvalidRepetition { min_reps, max_reps });
        }
        let arity = inner.arity();
        if !arity.is_fixed() {
            return Err(CompositionError::VariableWidth {
                role: "repeated parameter",
                node: inner.describe(),
                arity,
            });
        }
        if arity.max == 0 {
            return Err(CompositionError::ZeroWidth {
                role: "repeated parameter",
                node: inner.describe(),
            });
        }
        Ok(Self {
            node: Node::Repetition {
                inner: Box::new(inner),
                min_reps,
                max_reps,
            },
        })
    }

    /// `inner`, or nothing at all.
    pub fn optional(inner: Parameter) -> Self {
        Self {
            node: Node::Optional(Box::new(inner)),
        }
    }

    /// A node that delegates to whatever `slot` currently holds.
    pub fn mutable(slot: &MutableParameter) -> Self {
        Self {
            node: Node::Mutable(slot.clone()),
        }
    }

    /// Which kind of node this is.
    pub fn kind(&self) -> ParameterKind {
        match self.node {
            Node::Leaf(_) => ParameterKind::Leaf,
            Node::Sequence(..) => ParameterKind::Sequence,
            Node::Repetition { .. } => ParameterKind::Repetition,
            Node::Optional(_) => ParameterKind::Optional,
            Node::Mutable(_) => ParameterKind::Mutable,
        }
    }

    /// Token-count bounds, derived recursively.
    pub fn arity(&self) -> Arity {
        match &self.node {
            Node::Leaf(leaf) => leaf.arity(),
            Node::Sequence(first, second) => first.arity().then(second.arity()),
            Node::Repetition {
                inner,
                min_reps,
                max_reps,
            } => Arity {
                min: *min_reps,
                max: inner.arity().max.saturating_mul(*max_reps),
            },
            Node::Optional(inner) => Arity {
                min: 0,
                max: inner.arity().max,
            },
            Node::Mutable(slot) => slot.current().arity(),
        }
    }

    /// This tree with every mutable slot replaced by its current parameter.
    ///
    /// Bounds checks and parsing against the pinned tree agree even if a slot
    /// is swapped in between. Trees without slots are returned as-is.
    pub fn pinned(&self) -> Cow<'_, Parameter> {
        if self.has_mutable() {
            Cow::Owned(self.pin())
        } else {
            Cow::Borrowed(self)
        }
    }

    fn has_mutable(&self) -> bool {
        match &self.node {
            Node::Leaf(_) => false,
            Node::Sequence(first, second) => first.has_mutable() || second.has_mutable(),
            Node::Repetition { inner, .. } | Node::Optional(inner) => inner.has_mutable(),
            Node::Mutable(_) => true,
        }
    }

    fn pin(&self) -> Parameter {
        let node = match &self.node {
            Node::Leaf(leaf) => Node::Leaf(Arc::clone(leaf)),
            Node::Sequence(first, second) => {
                Node::Sequence(Box::new(first.pin()), Box::new(second.pin()))
            }
            Node::Repetition {
                inner,
                min_reps,
                max_reps,
            } => Node::Repetition {
                inner: Box::new(inner.pin()),
                min_reps: *min_reps,
                max_reps: *max_reps,
            },
            Node::Optional(inner) => Node::Optional(Box::new(inner.pin())),
            Node::Mutable(slot) => return slot.current().pin(),
        };
        Parameter { node }
    }

    /// Fewest tokens accepted.
    pub fn min_usage(&self) -> usize {
        self.arity().min
    }

    /// Most tokens accepted.
    pub fn max_usage(&self) -> usize {
        self.arity().max
    }

    /// Parse `input`.
    ///
    /// Children only ever see their own window of `input`.
    pub fn parse(&self, sender: &dyn Sender, input: &CommandInput) -> Result<Parsed, ParseFault> {
        let count = input.argument_count();
        match &self.node {
            // The slot's current parameter guards its own bounds.
            Node::Mutable(slot) => return slot.current().parse(sender, input),
            Node::Optional(_) if count == 0 => return Ok(Parsed::Omitted),
            _ => {}
        }
        if !self.arity().contains(count) {
            return Ok(Parsed::Invalid);
        }
        match &self.node {
            Node::Leaf(leaf) => leaf.parse(sender, input),
            Node::Sequence(first, second) => {
                combinator::parse_sequence(first, second, sender, input)
            }
            Node::Repetition {
                inner,
                min_reps,
                max_reps,
            } => combinator::parse_repetition(inner, *min_reps, *max_reps, sender, input),
            Node::Optional(inner) => inner.parse(sender, input),
            Node::Mutable(slot) => slot.current().parse(sender, input),
        }
    }

    /// Completions for the last token of `input`, routed with the same
    /// windowing rules as [`Parameter::parse`].
    pub fn suggest(&self, sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        if let Node::Mutable(slot) = &self.node {
            return slot.current().suggest(sender, input);
        }
        if input.argument_count() > self.arity().max {
            return Vec::new();
        }
        match &self.node {
            Node::Leaf(leaf) => leaf.suggest(sender, input),
            Node::Sequence(first, second) => {
                combinator::suggest_sequence(first, second, sender, input)
            }
            Node::Repetition {
                inner, max_reps, ..
            } => combinator::suggest_repetition(inner, *max_reps, sender, input),
            Node::Optional(inner) => inner.suggest(sender, input),
            Node::Mutable(slot) => slot.current().suggest(sender, input),
        }
    }

    /// Compact usage signature, e.g. `<int> [<text...>]`.
    pub fn describe(&self) -> String {
        match &self.node {
            Node::Leaf(leaf) => leaf.describe(),
            Node::Sequence(first, second) => {
                let parts = [first.describe(), second.describe()];
                parts
                    .into_iter()
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            }
            Node::Repetition {
                inner,
                min_reps,
                max_reps,
            } => format!("{}{{{min_reps},{max_reps}}}", inner.describe()),
            Node::Optional(inner) => format!("[{}]", inner.describe()),
            Node::Mutable(slot) => slot.current().describe(),
        }
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("kind", &self.kind())
            .field("usage", &self.describe())
            .field("arity", &self.arity())
            .finish()
    }
}

impl From<&MutableParameter> for Parameter {
    fn from(slot: &MutableParameter) -> Self {
        Parameter::mutable(slot)
    }
}
