use std::fmt;
use std::ops::Range;
use std::sync::{Arc, OnceLock};

/// Errors raised by direct token access on a [`CommandInput`].
///
/// These are precondition violations, not user-input problems, so they are
/// never folded into a dispatch failure reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// A token index (or window) fell outside the available tokens.
    #[error("token index {index} out of range for {count} argument(s)")]
    IndexOutOfRange {
        /// The first offending index.
        index: usize,
        /// Number of tokens in the input.
        count: usize,
    },
}

/// An immutable, tokenized command line: a label plus argument tokens.
///
/// Cloning is cheap and shares the lazily derived strings. Windows created by
/// [`CommandInput::slice`] share the parent's token storage; only the bounds
/// and label differ. A window's label is rendered on first use, so opening a
/// window costs the same wherever it starts.
///
/// Equality is identity: two inputs are "the same" only when
/// [`CommandInput::ptr_eq`] says so. Compare [`CommandInput::command_line`]
/// explicitly when rendered text is what matters.
#[derive(Clone)]
pub struct CommandInput {
    inner: Arc<Inner>,
}

struct Inner {
    /// Label text before any absorbed tokens.
    label_base: Arc<str>,
    /// Absolute token range appended to `label_base` to form the label.
    label_tokens: Range<usize>,
    label: OnceLock<String>,
    tokens: Arc<[String]>,
    start: usize,
    end: usize,
    argument_line: OnceLock<String>,
    command_line: OnceLock<String>,
}

impl CommandInput {
    /// Build an input from a label and its argument tokens.
    pub fn new<I, S>(label: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Arc<[String]> = tokens.into_iter().map(Into::into).collect();
        let end = tokens.len();
        let label: String = label.into();
        Self::from_parts(Arc::from(label), 0..0, tokens, 0, end)
    }

    /// Split `raw` on ASCII whitespace into argument tokens.
    pub fn from_line(label: impl Into<String>, raw: &str) -> Self {
        Self::new(label, raw.split_ascii_whitespace())
    }

    /// Like [`CommandInput::from_line`], but for completion requests: when
    /// `raw` is empty or ends in whitespace, a final empty token stands for
    /// the argument the user is about to type.
    pub fn for_completion(label: impl Into<String>, raw: &str) -> Self {
        let mut tokens: Vec<String> = raw.split_ascii_whitespace().map(String::from).collect();
        if raw.is_empty() || raw.ends_with(|c: char| c.is_ascii_whitespace()) {
            tokens.push(String::new());
        }
        Self::new(label, tokens)
    }

    fn from_parts(
        label_base: Arc<str>,
        label_tokens: Range<usize>,
        tokens: Arc<[String]>,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                label_base,
                label_tokens,
                label: OnceLock::new(),
                tokens,
                start,
                end,
                argument_line: OnceLock::new(),
                command_line: OnceLock::new(),
            }),
        }
    }

    /// The command label (for windows, the extended label).
    pub fn label(&self) -> &str {
        self.inner.label.get_or_init(|| {
            let inner = &self.inner;
            let absorbed = inner.tokens[inner.label_tokens.clone()].join(" ");
            if absorbed.is_empty() {
                inner.label_base.to_string()
            } else {
                format!("{} {absorbed}", inner.label_base)
            }
        })
    }

    /// Number of argument tokens visible through this input.
    pub fn argument_count(&self) -> usize {
        self.inner.end - self.inner.start
    }

    /// Whether there are no argument tokens.
    pub fn is_empty(&self) -> bool {
        self.argument_count() == 0
    }

    /// The visible argument tokens.
    pub fn tokens(&self) -> &[String] {
        &self.inner.tokens[self.inner.start..self.inner.end]
    }

    /// The token at `index`.
    pub fn argument(&self, index: usize) -> Result<&str, InputError> {
        self.tokens()
            .get(index)
            .map(String::as_str)
            .ok_or(InputError::IndexOutOfRange {
                index,
                count: self.argument_count(),
            })
    }

    /// The last token, or `""` when there are none. This is the token being
    /// completed in a suggestion request.
    pub fn last_argument(&self) -> &str {
        self.tokens().last().map(String::as_str).unwrap_or("")
    }

    /// Tokens joined by a single space. Computed once.
    pub fn argument_line(&self) -> &str {
        self.inner.argument_line.get_or_init(|| self.tokens().join(" "))
    }

    /// `label + " " + argument_line`. Computed once.
    pub fn command_line(&self) -> &str {
        self.inner
            .command_line
            .get_or_init(|| format!("{} {}", self.label(), self.argument_line()))
    }

    /// A window over `len` tokens starting at `start`, labelled
    /// `label + " " + label_suffix` (the label is kept as-is when the suffix
    /// is empty).
    pub fn slice(&self, start: usize, len: usize, label_suffix: &str) -> Result<Self, InputError> {
        let end = self.checked_end(start, len)?;
        let (label_base, label_tokens) = if label_suffix.is_empty() {
            (
                Arc::clone(&self.inner.label_base),
                self.inner.label_tokens.clone(),
            )
        } else {
            let at = self.inner.start + start;
            (Arc::from(format!("{} {label_suffix}", self.label())), at..at)
        };
        Ok(self.child(label_base, label_tokens, start, end))
    }

    fn checked_end(&self, start: usize, len: usize) -> Result<usize, InputError> {
        let count = self.argument_count();
        start
            .checked_add(len)
            .filter(|&end| end <= count)
            .ok_or(InputError::IndexOutOfRange {
                index: if start > count { start } else { count },
                count,
            })
    }

    fn child(
        &self,
        label_base: Arc<str>,
        label_tokens: Range<usize>,
        start: usize,
        end: usize,
    ) -> Self {
        Self::from_parts(
            label_base,
            label_tokens,
            Arc::clone(&self.inner.tokens),
            self.inner.start + start,
            self.inner.start + end,
        )
    }

    /// A window over every token from `start` on, keeping this input's label.
    pub fn slice_from(&self, start: usize) -> Result<Self, InputError> {
        let count = self.argument_count();
        if start > count {
            return Err(InputError::IndexOutOfRange { index: start, count });
        }
        self.slice(start, count - start, "")
    }

    /// A window over `len` tokens starting at `start`, whose label absorbs
    /// the tokens before the window. The window's command line is then a
    /// prefix-preserving view of this input's command line.
    pub fn window(&self, start: usize, len: usize) -> Result<Self, InputError> {
        let count = self.argument_count();
        if start > count {
            return Err(InputError::IndexOutOfRange { index: start, count });
        }
        let end = self.checked_end(start, len)?;
        let inner = &self.inner;
        // Absorbed tokens must stay contiguous with the window; otherwise
        // the current label becomes the new base.
        let (label_base, from) = if inner.label_tokens.end == inner.start {
            (Arc::clone(&inner.label_base), inner.label_tokens.start)
        } else {
            (Arc::from(self.label()), inner.start)
        };
        Ok(self.child(label_base, from..inner.start + start, start, end))
    }

    /// A window over every token from `start` to the end.
    pub fn window_from(&self, start: usize) -> Result<Self, InputError> {
        let count = self.argument_count();
        if start > count {
            return Err(InputError::IndexOutOfRange { index: start, count });
        }
        self.window(start, count - start)
    }

    /// Byte range of token `index` inside [`CommandInput::command_line`].
    pub fn token_span(&self, index: usize) -> Option<(usize, usize)> {
        let tokens = self.tokens();
        let token = tokens.get(index)?;
        let start = self.label().len()
            + 1
            + tokens[..index].iter().map(|t| t.len() + 1).sum::<usize>();
        Some((start, start + token.len()))
    }

    /// Whether both handles refer to the same input (or the same window).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (Arc::ptr_eq(&self.inner.tokens, &other.inner.tokens)
                && self.inner.start == other.inner.start
                && self.inner.end == other.inner.end
                && self.label() == other.label())
    }
}

impl fmt::Debug for CommandInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandInput")
            .field("label", &self.label())
            .field("tokens", &self.tokens())
            .finish()
    }
}

impl fmt::Display for CommandInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_line())
    }
}
