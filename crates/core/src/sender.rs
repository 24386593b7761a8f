use serde::{Deserialize, Serialize};

/// Kind of entity issuing a command.
///
/// Kinds form a small hierarchy rooted at [`SenderKind::Any`]:
///
/// ```text
/// any
/// ├── console
/// │   └── remote_console
/// ├── entity
/// │   └── player
/// └── block
/// ```
///
/// A command requiring `entity` accepts a `player`; a command requiring
/// `player` rejects a `console`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    /// Matches every sender.
    #[default]
    Any,
    /// The local server console.
    Console,
    /// A remote administration console.
    RemoteConsole,
    /// Any in-world entity.
    Entity,
    /// A connected player.
    Player,
    /// A command block or similar fixed source.
    Block,
}

impl SenderKind {
    /// The direct supertype, or `None` for [`SenderKind::Any`].
    pub fn parent(self) -> Option<SenderKind> {
        match self {
            SenderKind::Any => None,
            SenderKind::Console | SenderKind::Entity | SenderKind::Block => Some(SenderKind::Any),
            SenderKind::RemoteConsole => Some(SenderKind::Console),
            SenderKind::Player => Some(SenderKind::Entity),
        }
    }

    /// Whether `self` is `required` or one of its subtypes.
    pub fn is_a(self, required: SenderKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == required {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Lower snake-case name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            SenderKind::Any => "any",
            SenderKind::Console => "console",
            SenderKind::RemoteConsole => "remote_console",
            SenderKind::Entity => "entity",
            SenderKind::Player => "player",
            SenderKind::Block => "block",
        }
    }
}

impl std::fmt::Display for SenderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whoever invoked a command, as seen by the engine.
///
/// Hosts implement this for their own sender types; the engine only needs a
/// name for logging, a kind for the sender-type check, a single boolean
/// permission check, and a way to send feedback.
pub trait Sender: Send + Sync {
    /// Display name, used in logs and messages.
    fn name(&self) -> &str;

    /// Runtime kind of this sender.
    fn kind(&self) -> SenderKind;

    /// Whether the sender holds `permission`.
    fn has_permission(&self, permission: &str) -> bool;

    /// Deliver a feedback message to the sender.
    fn send_message(&self, message: &str);
}
