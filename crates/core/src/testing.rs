//! Sender double for unit tests.

use std::sync::Mutex;

use crate::sender::{Sender, SenderKind};

pub(crate) struct TestSender {
    name: String,
    kind: SenderKind,
    permissions: Vec<String>,
    messages: Mutex<Vec<String>>,
}

impl TestSender {
    pub(crate) fn console() -> Self {
        Self::new("console", SenderKind::Console)
    }

    pub(crate) fn player(name: &str) -> Self {
        Self::new(name, SenderKind::Player)
    }

    fn new(name: &str, kind: SenderKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            permissions: Vec::new(),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_permission(mut self, permission: &str) -> Self {
        self.permissions.push(permission.to_owned());
        self
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Sender for TestSender {
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
