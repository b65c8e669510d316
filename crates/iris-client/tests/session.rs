use std::sync::Arc;

use iris_client::{AuthTokens, FileStore, Session, SessionStore, User};
use pretty_assertions::assert_eq;

fn user() -> User {
    User {
        id: "u1".to_string(),
        username: "alice".to_string(),
        role: "admin".to_string(),
        is_active: true,
    }
}

#[test]
fn starts_unauthenticated() {
    let session = Session::new();
    assert!(!session.is_authenticated());
    assert_eq!(session.access_token(), None);
}

#[test]
fn set_then_clear() {
    let session = Session::new();
    session.set_auth(AuthTokens::bearer("a", "r"), user());
    assert!(session.is_authenticated());
    assert_eq!(session.access_token().as_deref(), Some("a"));

    session.clear_auth();
    assert_eq!(session.access_token(), None);
    assert_eq!(session.refresh_token(), None);
    assert_eq!(session.current_user(), None);
}

#[test]
fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));

    let session = Session::with_store(store.clone());
    session.set_auth(AuthTokens::bearer("a", "r"), user());
    assert!(store.path().exists());

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw["accessToken"], "a");
    assert_eq!(raw["refreshToken"], "r");
    assert_eq!(raw["user"]["id"], "u1");

    let restarted = Session::with_store(store.clone());
    assert_eq!(restarted.access_token().as_deref(), Some("a"));
    assert_eq!(restarted.current_user(), Some(user()));

    restarted.clear_auth();
    assert!(!store.path().exists());
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn refreshed_tokens_are_written_through() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    let session = Session::with_store(store.clone());
    session.set_auth(AuthTokens::bearer("a", "r"), user());

    session.update_tokens(AuthTokens::bearer("a2", "r2"));

    let stored = store.load().unwrap().unwrap();
    assert_eq!(stored.access_token, "a2");
    assert_eq!(stored.refresh_token, "r2");
    assert_eq!(stored.user, user());
}
