use crate::error::StorageError;
use crate::models::User;
use crate::storage::LocalStorage;
use crate::transport::HttpRequest;
use parking_lot::RwLock;
use std::sync::Arc;

/// Storage key holding the bearer token between runs.
pub const TOKEN_KEY: &str = "token";

/// Session context handed to every API call: bearer token plus the current
/// user profile. Clones share state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<RwLock<SessionState>>,
    storage: LocalStorage,
}

#[derive(Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    pub fn new(storage: LocalStorage) -> Self {
        let token = match storage.get_item(TOKEN_KEY) {
            Ok(token) => token
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
            Err(err) => {
                tracing::warn!(%err, "failed to read persisted token");
                None
            }
        };
        Self {
            inner: Arc::new(RwLock::new(SessionState { token, user: None })),
            storage,
        }
    }

    /// A session backed by a throwaway temp directory.
    pub fn ephemeral() -> Self {
        Self::new(LocalStorage::in_memory())
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().token.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.read().token.is_some()
    }

    pub fn set_token(&self, token: impl Into<String>) -> Result<(), StorageError> {
        let token = token.into();
        self.storage.set_item(TOKEN_KEY, &token)?;
        self.inner.write().token = Some(token);
        Ok(())
    }

    pub fn user(&self) -> Option<User> {
        self.inner.read().user.clone()
    }

    pub fn set_user(&self, user: Option<User>) {
        self.inner.write().user = user;
    }

    /// Forget token and user, in memory and on disk.
    pub fn clear(&self) -> Result<(), StorageError> {
        {
            let mut inner = self.inner.write();
            inner.token = None;
            inner.user = None;
        }
        self.storage.remove_item(TOKEN_KEY)
    }

    pub fn authorize(&self, request: &mut HttpRequest) {
        if let Some(token) = self.token() {
            request.set_header("Authorization", format!("Bearer {token}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn token_survives_a_restart() {
        let dir = TempDir::new().unwrap();
        let session = Session::new(LocalStorage::new(dir.path().to_path_buf()));
        assert!(!session.is_logged_in());
        session.set_token("abc123").unwrap();

        let restored = Session::new(LocalStorage::new(dir.path().to_path_buf()));
        assert_eq!(restored.token().as_deref(), Some("abc123"));
    }

    #[test]
    fn clear_removes_persisted_token() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf());
        let session = Session::new(storage.clone());
        session.set_token("abc123").unwrap();
        session.clear().unwrap();
        assert!(session.token().is_none());
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn blank_persisted_token_is_ignored() {
        let storage = LocalStorage::in_memory();
        storage.set_item(TOKEN_KEY, "  ").unwrap();
        assert!(!Session::new(storage).is_logged_in());
    }

    #[test]
    fn persisted_token_is_trimmed() {
        let storage = LocalStorage::in_memory();
        storage.set_item(TOKEN_KEY, "abc123\n").unwrap();
        let session = Session::new(storage);

        let mut request = HttpRequest::new(
            reqwest::Method::GET,
            url::Url::parse("http://localhost/api/v1/auth/me").unwrap(),
        );
        session.authorize(&mut request);
        assert_eq!(request.header("Authorization"), Some("Bearer abc123"));
    }
}
