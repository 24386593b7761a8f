//! Shared test helpers for `cmdtree_core` integration tests.

#![allow(unreachable_pub)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cmdtree_core::{
    Arity, BoxError, CommandInput, Failure, Leaf, ParseFault, Parsed, Reason, Sender, SenderKind,
    Value,
};

// ─── Senders ─────────────────────────────────────────────────────────────────

/// A sender with a fixed kind, an explicit permission list, and a message log.
pub struct Recorder {
    name: String,
    kind: SenderKind,
    permissions: Vec<String>,
    messages: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn new(name: &str, kind: SenderKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            permissions: Vec::new(),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn console() -> Self {
        Self::new("console", SenderKind::Console)
    }

    #[allow(dead_code)]
    pub fn player(name: &str) -> Self {
        Self::new(name, SenderKind::Player)
    }

    #[allow(dead_code)]
    pub fn granted(mut self, permission: &str) -> Self {
        self.permissions.push(permission.to_owned());
        self
    }

    #[allow(dead_code)]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Sender for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SenderKind {
        self.kind
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    fn send_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_owned());
    }
}

// ─── Handlers and executors ──────────────────────────────────────────────────

/// Shared log of every failure reason a handler saw.
pub type Reasons = Arc<Mutex<Vec<Reason>>>;

/// A failure handler that appends each reason to the returned log.
#[allow(dead_code)]
pub fn recording_handler() -> (
    Reasons,
    impl Fn(&dyn Sender, Failure) + Clone + Send + Sync + 'static,
) {
    let log: Reasons = Arc::default();
    let sink = Arc::clone(&log);
    let handler = move |_: &dyn Sender, failure: Failure| {
        sink.lock().unwrap().push(failure.reason());
    };
    (log, handler)
}

/// Shared log of every value an executor received.
pub type Values = Arc<Mutex<Vec<Value>>>;

/// An executor that appends each parsed value to the returned log.
#[allow(dead_code)]
pub fn recording_executor() -> (
    Values,
    impl Fn(&dyn Sender, Value, &CommandInput) -> Result<(), BoxError>
    + Clone
    + Send
    + Sync
    + 'static,
) {
    let log: Values = Arc::default();
    let sink = Arc::clone(&log);
    let executor = move |_: &dyn Sender, value: Value, _: &CommandInput| -> Result<(), BoxError> {
        sink.lock().unwrap().push(value);
        Ok(())
    };
    (log, executor)
}

// ─── Leaves ──────────────────────────────────────────────────────────────────

/// A one-token leaf that counts how often it is asked to parse.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct CountingLeaf {
    pub calls: Arc<AtomicUsize>,
}

impl Leaf for CountingLeaf {
    fn name(&self) -> &str {
        "counted"
    }

    fn arity(&self) -> Arity {
        Arity::fixed(1)
    }

    fn parse(&self, _sender: &dyn Sender, input: &CommandInput) -> Result<Parsed, ParseFault> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Parsed::Value(Value::Text(input.argument(0)?.to_owned())))
    }
}

/// Owned tokens from string literals.
#[allow(dead_code)]
pub fn tokens(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_owned()).collect()
}
