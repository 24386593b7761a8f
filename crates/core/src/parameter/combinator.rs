use std::fmt;
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};

use super::{Parameter, ParseFault, Parsed};
use crate::input::CommandInput;
use crate::sender::Sender;
use crate::suggest::Suggestion;
use crate::value::Value;

/// Width of a node that must be fixed-width, re-checked at use time.
///
/// Construction already rejects variable-width heads; this only trips when a
/// mutable slot inside the tree was swapped for a parameter of another shape.
fn fixed_width(node: &Parameter) -> Result<usize, ParseFault> {
    let arity = node.arity();
    if arity.is_fixed() {
        Ok(arity.max)
    } else {
        Err(ParseFault::VariableWidth {
            node: node.describe(),
            arity,
        })
    }
}

pub(super) fn parse_sequence(
    first: &Parameter,
    second: &Parameter,
    sender: &dyn Sender,
    input: &CommandInput,
) -> Result<Parsed, ParseFault> {
    let width = fixed_width(first)?;
    // The caller's bounds guard ensures count >= width.
    let head = input.window(0, width)?;
    let tail = input.window_from(width)?;

    let Some(a) = first.parse(sender, &head)?.into_value() else {
        return Ok(Parsed::Invalid);
    };
    let Some(b) = second.parse(sender, &tail)?.into_value() else {
        return Ok(Parsed::Invalid);
    };
    Ok(Parsed::Value(Value::pair(a, b)))
}

pub(super) fn parse_repetition(
    inner: &Parameter,
    min_reps: usize,
    max_reps: usize,
    sender: &dyn Sender,
    input: &CommandInput,
) -> Result<Parsed, ParseFault> {
    let width = fixed_width(inner)?;
    if width == 0 {
        return Err(ParseFault::VariableWidth {
            node: inner.describe(),
            arity: inner.arity(),
        });
    }
    let count = input.argument_count();
    if count % width != 0 {
        return Ok(Parsed::Invalid);
    }
    let groups = count / width;
    if groups < min_reps || groups > max_reps {
        return Ok(Parsed::Invalid);
    }

    let mut values = Vec::with_capacity(groups);
    for group in 0..groups {
        let window = input.window(group * width, width)?;
        match inner.parse(sender, &window)?.into_value() {
            Some(v) => values.push(v),
            None => return Ok(Parsed::Invalid),
        }
    }
    Ok(Parsed::Value(Value::List(values)))
}

pub(super) fn suggest_sequence(
    first: &Parameter,
    second: &Parameter,
    sender: &dyn Sender,
    input: &CommandInput,
) -> Vec<Suggestion> {
    let width = match fixed_width(first) {
        Ok(width) => width,
        Err(fault) => {
            tracing::warn!(error = %fault, "skipping suggestions for misaligned sequence");
            return Vec::new();
        }
    };
    let count = input.argument_count();
    let window = if count <= width {
        tracing::trace!(count, width, "routing suggestion to sequence head");
        input.window(0, count).map(|w| first.suggest(sender, &w))
    } else {
        tracing::trace!(count, width, "routing suggestion to sequence tail");
        input.window_from(width).map(|w| second.suggest(sender, &w))
    };
    window.unwrap_or_default()
}

pub(super) fn suggest_repetition(
    inner: &Parameter,
    max_reps: usize,
    sender: &dyn Sender,
    input: &CommandInput,
) -> Vec<Suggestion> {
    let count = input.argument_count();
    let width = match fixed_width(inner) {
        Ok(width) if width > 0 => width,
        _ => return Vec::new(),
    };
    if count == 0 {
        return Vec::new();
    }
    let group = (count - 1) / width;
    if group >= max_reps {
        return Vec::new();
    }
    let start = group * width;
    tracing::trace!(count, group, "routing suggestion to repetition group");
    input
        .window(start, count - start)
        .map(|w| inner.suggest(sender, &w))
        .unwrap_or_default()
}

// ── Mutable ─────────────────────────────────────────────────────────────

/// A swappable parameter slot.
///
/// Every operation reads one consistent snapshot of the current parameter.
/// Swaps are atomic, so replacing the parameter while other threads
/// dispatch through it is safe; in-flight operations finish against the
/// snapshot they loaded. Clones share the slot.
///
/// A slot must not (directly or indirectly) contain itself.
#[derive(Clone)]
pub struct MutableParameter {
    current: Arc<ArcSwap<Parameter>>,
}

impl MutableParameter {
    /// A slot that starts out always-invalid (`[0, 0]`, never parses).
    pub fn new() -> Self {
        Self::with(Parameter::never())
    }

    /// A slot holding `initial`.
    pub fn with(initial: Parameter) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(initial)),
        }
    }

    /// Replace the current parameter, returning the previous one.
    pub fn set(&self, parameter: Parameter) -> Arc<Parameter> {
        self.current.swap(Arc::new(parameter))
    }

    /// Snapshot of the current parameter.
    pub fn current(&self) -> Guard<Arc<Parameter>> {
        self.current.load()
    }
}

impl Default for MutableParameter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MutableParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutableParameter")
            .field(&**self.current())
            .finish()
    }
}
