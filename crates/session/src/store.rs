//! Injected session storage capability.
//!
//! The host application persists the credential and identity; the sync
//! layer reads them through this seam, never as ambient global state,
//! and clears them at logout. The credential is opaque: it is forwarded
//! to REST calls verbatim, never parsed or refreshed here.

use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Storage key for the bearer credential.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the persisted user object.
pub const USER_KEY: &str = "user";
/// Storage key for the selected team identifier.
pub const TEAM_KEY: &str = "selectedTeamId";

/// Key-value capability backing the session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn clear(&self);
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: DashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.remove(key);
    }

    fn clear(&self) {
        self.values.clear();
    }
}

/// Persisted user object; only the id matters to the sync layer.
#[derive(Debug, Deserialize)]
struct StoredUser {
    id: Value,
}

/// Typed view over the session store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Session backed by an in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// Initialize at session start (login).
    pub fn init(&self, token: &str, user_json: &str) {
        self.store.set(TOKEN_KEY, token);
        self.store.set(USER_KEY, user_json);
    }

    /// Bearer credential, with the JSON quoting some hosts persist
    /// around the raw token stripped.
    pub fn bearer_token(&self) -> Option<String> {
        self.store
            .get(TOKEN_KEY)
            .map(|raw| raw.trim_matches('"').to_string())
    }

    /// Stable user identifier parsed from the persisted user object.
    pub fn user_id(&self) -> Option<String> {
        let raw = self.store.get(USER_KEY)?;
        let user: StoredUser = match serde_json::from_str(&raw) {
            Ok(user) => user,
            Err(e) => {
                warn!("Persisted user object is unreadable: {}", e);
                return None;
            }
        };
        match user.id {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn set_selected_team(&self, team_id: &str) {
        self.store.set(TEAM_KEY, team_id);
    }

    pub fn selected_team(&self) -> Option<String> {
        self.store.get(TEAM_KEY)
    }

    /// Clear everything at logout.
    pub fn clear(&self) {
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_strips_persisted_quoting() {
        let session = Session::in_memory();
        session.init("\"abc.def.ghi\"", r#"{"id":1}"#);
        assert_eq!(session.bearer_token().unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_passes_plain_tokens_through() {
        let session = Session::in_memory();
        session.init("abc.def.ghi", r#"{"id":1}"#);
        assert_eq!(session.bearer_token().unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_user_id_from_numeric_id() {
        let session = Session::in_memory();
        session.init("t", r#"{"id":42,"email":"a@b.c"}"#);
        assert_eq!(session.user_id().unwrap(), "42");
    }

    #[test]
    fn test_user_id_from_string_id() {
        let session = Session::in_memory();
        session.init("t", r#"{"id":"u-7"}"#);
        assert_eq!(session.user_id().unwrap(), "u-7");
    }

    #[test]
    fn test_user_id_absent_or_garbage() {
        let session = Session::in_memory();
        assert!(session.user_id().is_none());
        session.init("t", "not json");
        assert!(session.user_id().is_none());
    }

    #[test]
    fn test_clear_removes_everything() {
        let session = Session::in_memory();
        session.init("t", r#"{"id":1}"#);
        session.set_selected_team("9");
        session.clear();
        assert!(session.bearer_token().is_none());
        assert!(session.user_id().is_none());
        assert!(session.selected_team().is_none());
    }
}
