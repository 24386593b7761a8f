//! Sender profile definitions and validation for cmdtree.
//!
//! A profile is a small JSON document describing who is running commands:
//! a name, a [`SenderKind`], and the permission nodes they hold. The CLI
//! loads one per invocation and dispatches through a [`ProfileSender`].

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use cmdtree_core::{Sender, SenderKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current profile schema version.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Errors that can occur when loading or validating a sender profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The profile file could not be read.
    #[error("failed to read profile {path}: {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON deserialization failed.
    #[error("invalid profile JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is malformed.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The name of the field that failed validation.
        field: String,
        /// A human-readable explanation of why the field value is invalid.
        reason: String,
    },
}

/// Who a CLI invocation runs as.
///
/// # Example
/// ```
/// let profile = cmdtree_profile::SenderProfile {
///     name: "alice".into(),
///     schema_version: "1.0.0".into(),
///     kind: cmdtree_core::SenderKind::Player,
///     permissions: vec!["demo.math.*".into(), "demo.tp".into()],
///     operator: false,
/// };
/// assert!(profile.grants("demo.math.add"));
/// assert!(!profile.grants("demo.gamemode"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SenderProfile {
    /// Display name (e.g., `"console"`, `"alice"`).
    pub name: String,
    /// Profile schema version for forward compatibility (e.g., `"1.0.0"`).
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Sender kind used for sender-type checks.
    #[serde(default)]
    pub kind: SenderKind,
    /// Permission nodes held: exact nodes (`demo.tp`), subtree wildcards
    /// (`demo.math.*`), or `*` for everything.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Operators hold every permission.
    #[serde(default)]
    pub operator: bool,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_owned()
}

impl SenderProfile {
    /// The built-in profile: the local console, operator.
    pub fn console() -> Self {
        Self {
            name: "console".into(),
            schema_version: default_schema_version(),
            kind: SenderKind::Console,
            permissions: Vec::new(),
            operator: true,
        }
    }

    /// Whether this profile holds `permission`.
    pub fn grants(&self, permission: &str) -> bool {
        self.operator
            || self
                .permissions
                .iter()
                .any(|node| node_matches(node, permission))
    }
}

/// Whether permission `node` covers `permission`.
///
/// `*` covers everything; `a.b.*` covers `a.b` and every node below it.
pub fn node_matches(node: &str, permission: &str) -> bool {
    if node == "*" || node == permission {
        return true;
    }
    match node.strip_suffix(".*") {
        Some(prefix) => {
            permission == prefix
                || permission
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('.'))
        }
        None => false,
    }
}

fn check_node(index: usize, node: &str) -> Result<(), ProfileError> {
    let field = || format!("permissions[{index}]");
    if node.is_empty() {
        return Err(ProfileError::InvalidField {
            field: field(),
            reason: "must not be empty".into(),
        });
    }
    if node == "*" {
        return Ok(());
    }
    if node.chars().any(char::is_whitespace) {
        return Err(ProfileError::InvalidField {
            field: field(),
            reason: format!("`{node}` contains whitespace"),
        });
    }
    let body = node.strip_suffix(".*").unwrap_or(node);
    for segment in body.split('.') {
        if segment.is_empty() {
            return Err(ProfileError::InvalidField {
                field: field(),
                reason: format!("`{node}` has an empty segment"),
            });
        }
        if segment.contains('*') {
            return Err(ProfileError::InvalidField {
                field: field(),
                reason: format!("`{node}`: `*` is only allowed as the last segment"),
            });
        }
    }
    Ok(())
}

/// Load and validate a [`SenderProfile`] from a JSON string.
///
/// `name` is required; `kind` defaults to `any`, `permissions` to empty,
/// and `operator` to false.
///
/// Performs structural validation after deserialization:
/// - `name` and `schema_version` must be non-empty
/// - the major part of `schema_version` must match [`SCHEMA_VERSION`]
/// - each permission node must be `*` or dot-separated non-empty segments,
///   optionally ending in `.*`
pub fn load_profile_from_str(s: &str) -> Result<SenderProfile, ProfileError> {
    let profile: SenderProfile = serde_json::from_str(s)?;

    if profile.name.trim().is_empty() {
        return Err(ProfileError::InvalidField {
            field: "name".into(),
            reason: "must not be empty".into(),
        });
    }
    if profile.schema_version.trim().is_empty() {
        return Err(ProfileError::InvalidField {
            field: "schema_version".into(),
            reason: "must not be empty".into(),
        });
    }
    let major = |v: &str| v.split('.').next().map(str::to_owned);
    if major(&profile.schema_version) != major(SCHEMA_VERSION) {
        return Err(ProfileError::InvalidField {
            field: "schema_version".into(),
            reason: format!(
                "{} is not compatible with {SCHEMA_VERSION}",
                profile.schema_version
            ),
        });
    }

    for (index, node) in profile.permissions.iter().enumerate() {
        check_node(index, node)?;
    }

    Ok(profile)
}

/// Read a profile file and validate it with [`load_profile_from_str`].
pub fn load_profile_from_path(path: impl AsRef<Path>) -> Result<SenderProfile, ProfileError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_profile_from_str(&text)
}

/// A [`Sender`] backed by a profile. Messages are collected in order.
#[derive(Debug)]
pub struct ProfileSender {
    profile: SenderProfile,
    messages: Mutex<Vec<String>>,
}

impl ProfileSender {
    /// Wrap `profile`.
    pub fn new(profile: SenderProfile) -> Self {
        Self {
            profile,
            messages: Mutex::new(Vec::new()),
        }
    }

    /// The backing profile.
    pub fn profile(&self) -> &SenderProfile {
        &self.profile
    }

    /// Take every message sent so far.
    pub fn drain_messages(&self) -> Vec<String> {
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *messages)
    }
}

impl Sender for ProfileSender {
    fn name(&self) -> &str {
        &self.profile.name
    }

    fn kind(&self) -> SenderKind {
        self.profile.kind
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.profile.grants(permission)
    }

    fn send_message(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_full_profile() {
        let json = r#"{
            "name": "alice",
            "schema_version": "1.0.0",
            "kind": "player",
            "permissions": ["demo.math.*", "demo.tp"],
            "operator": false
        }"#;
        let p = load_profile_from_str(json).unwrap();
        assert_eq!(p.name, "alice");
        assert_eq!(p.kind, SenderKind::Player);
        assert_eq!(p.permissions.len(), 2);
        assert!(!p.operator);
    }

    #[test]
    fn load_minimal_profile() {
        let p = load_profile_from_str(r#"{ "name": "bot" }"#).unwrap();
        assert_eq!(p.kind, SenderKind::Any);
        assert_eq!(p.schema_version, SCHEMA_VERSION);
        assert!(p.permissions.is_empty());
        assert!(!p.grants("demo.echo"));
    }

    #[test]
    fn missing_name_is_a_json_error() {
        let err = load_profile_from_str(r#"{ "kind": "console" }"#).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidJson(_)));
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = load_profile_from_str(r#"{ "name": "  " }"#).unwrap_err();
        assert!(err.to_string().contains("name"), "{err}");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = load_profile_from_str(r#"{ "name": "x", "kind": "robot" }"#).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidJson(_)));
    }

    #[test]
    fn incompatible_schema_is_rejected() {
        let err =
            load_profile_from_str(r#"{ "name": "x", "schema_version": "2.0.0" }"#).unwrap_err();
        assert!(err.to_string().contains("schema_version"), "{err}");
    }

    #[test]
    fn malformed_permission_nodes_are_rejected() {
        for bad in ["", "demo..tp", "demo.*.tp", "demo tp", ".demo", "demo*"] {
            let json = format!(r#"{{ "name": "x", "permissions": ["ok", "{bad}"] }}"#);
            let err = load_profile_from_str(&json).unwrap_err();
            assert!(
                err.to_string().contains("permissions[1]"),
                "`{bad}` should be rejected: {err}"
            );
        }
    }

    #[test]
    fn wildcard_matching() {
        assert!(node_matches("*", "anything.at.all"));
        assert!(node_matches("demo.math.*", "demo.math.add"));
        assert!(node_matches("demo.math.*", "demo.math"));
        assert!(!node_matches("demo.math.*", "demo.mathematics"));
        assert!(!node_matches("demo.math", "demo.math.add"));
    }

    #[test]
    fn operator_holds_everything() {
        let console = SenderProfile::console();
        assert!(console.grants("demo.anything"));
        assert_eq!(console.kind, SenderKind::Console);
    }

    #[test]
    fn profile_sender_collects_messages() {
        let sender = ProfileSender::new(SenderProfile::console());
        sender.send_message("one");
        sender.send_message("two");
        assert_eq!(sender.drain_messages(), ["one", "two"]);
        assert!(sender.drain_messages().is_empty());
        assert!(sender.has_permission("x"));
    }
}
