//! Loading profiles from disk.

use std::io::Write;

use cmdtree_core::{Sender, SenderKind};
use cmdtree_profile::{ProfileError, ProfileSender, load_profile_from_path};

#[test]
fn loads_profile_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "name": "steve", "kind": "player", "permissions": ["demo.*"] }}"#
    )
    .unwrap();

    let profile = load_profile_from_path(file.path()).unwrap();
    let sender = ProfileSender::new(profile);
    assert_eq!(sender.name(), "steve");
    assert_eq!(sender.kind(), SenderKind::Player);
    assert!(sender.has_permission("demo.tp"));
    assert!(!sender.has_permission("admin.stop"));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = load_profile_from_path(&path).unwrap_err();
    assert!(matches!(err, ProfileError::Io { .. }));
    assert!(err.to_string().contains("absent.json"), "{err}");
}

#[test]
fn invalid_file_reports_field() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "name": "x", "permissions": ["a..b"] }}"#).unwrap();
    let err = load_profile_from_path(file.path()).unwrap_err();
    assert!(matches!(err, ProfileError::InvalidField { .. }));
}
