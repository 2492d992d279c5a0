//! The session service: sole owner of the client-side session keys.

use crate::error::{Result, SessionError};
use crate::storage::KeyValueStore;
use herd_http::{ExecutionContext, TokenSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

pub const TOKEN_KEY: &str = "auth_token";
pub const USERNAME_KEY: &str = "username";
pub const AUTH_METHOD_KEY: &str = "auth_method";

/// How the current session was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Username/password login against the API.
    Credential,
    /// Third-party single sign-on.
    Sso,
}

impl AuthMethod {
    pub fn as_tag(self) -> &'static str {
        match self {
            AuthMethod::Credential => "credential",
            AuthMethod::Sso => "sso",
        }
    }

    /// Parse a stored tag. `google` is the tag older clients wrote for SSO.
    pub fn from_tag(tag: &str) -> Option<AuthMethod> {
        match tag.trim() {
            "credential" => Some(AuthMethod::Credential),
            "sso" | "google" => Some(AuthMethod::Sso),
            _ => None,
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Point-in-time view of the stored session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub username: Option<String>,
    pub auth_method: Option<AuthMethod>,
}

impl Session {
    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Injectable session owner.
///
/// In the server context there is no client storage: reads yield nothing,
/// [`SessionService::clear`] is a no-op and writes fail with
/// [`SessionError::NoClientStorage`].
#[derive(Clone)]
pub struct SessionService {
    context: ExecutionContext,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl SessionService {
    /// Session backed by client storage.
    pub fn client(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            context: ExecutionContext::Client,
            store: Some(store),
        }
    }

    /// Session as seen from the server-side renderer.
    pub fn server() -> Self {
        Self {
            context: ExecutionContext::Server,
            store: None,
        }
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    fn store(&self) -> Result<&Arc<dyn KeyValueStore>> {
        self.store.as_ref().ok_or(SessionError::NoClientStorage)
    }

    fn read(&self, key: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.get(key) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                warn!("[Session] Failed to read {}: {}", key, e);
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.read(TOKEN_KEY)
    }

    pub fn username(&self) -> Option<String> {
        self.read(USERNAME_KEY)
    }

    pub fn auth_method(&self) -> Option<AuthMethod> {
        self.read(AUTH_METHOD_KEY)
            .and_then(|tag| AuthMethod::from_tag(&tag))
    }

    /// `false` in the server context; otherwise whether a token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.context.is_client() && self.token().is_some()
    }

    pub fn snapshot(&self) -> Session {
        Session {
            token: self.token(),
            username: self.username(),
            auth_method: self.auth_method(),
        }
    }

    /// Record a successful login. Token, username and method are written
    /// together; if any write fails the session is cleared again.
    pub fn start(&self, token: &str, username: &str, method: AuthMethod) -> Result<()> {
        let store = self.store()?;
        if token.trim().is_empty() {
            return Err(SessionError::Storage("refusing to store an empty token".into()));
        }
        if username.trim().is_empty() {
            return Err(SessionError::Storage("refusing to store an empty username".into()));
        }

        let written = store
            .set(TOKEN_KEY, token)
            .and_then(|_| store.set(USERNAME_KEY, username))
            .and_then(|_| store.set(AUTH_METHOD_KEY, method.as_tag()));

        if let Err(e) = written {
            warn!("[Session] Partial session write, rolling back: {}", e);
            let _ = self.clear();
            return Err(e);
        }

        info!("[Session] Started {} session for {}", method, username);
        Ok(())
    }

    /// Rename the user of the active session. Returns `false` when there is
    /// no session to update.
    pub fn set_username(&self, username: &str) -> Result<bool> {
        let store = self.store()?;
        if self.token().is_none() {
            return Ok(false);
        }
        store.set(USERNAME_KEY, username)?;
        info!("[Session] Username changed to {}", username);
        Ok(true)
    }

    /// Remove all three session keys.
    ///
    /// Every removal is attempted even if an earlier one fails; the first
    /// failure is reported. Idempotent, so a retry converges.
    pub fn clear(&self) -> Result<()> {
        let store = match &self.store {
            Some(store) => store,
            None => return Ok(()),
        };

        let mut first_err = None;
        for key in [TOKEN_KEY, USERNAME_KEY, AUTH_METHOD_KEY] {
            if let Err(e) = store.remove(key) {
                warn!("[Session] Failed to remove {}: {}", key, e);
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => {
                info!("[Session] Cleared");
                Ok(())
            }
        }
    }
}

impl TokenSource for SessionService {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}

impl fmt::Debug for SessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("context", &self.context)
            .field("has_store", &self.store.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    fn client() -> (SessionService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (SessionService::client(store.clone()), store)
    }

    #[test]
    fn test_tags() {
        assert_eq!(AuthMethod::from_tag("credential"), Some(AuthMethod::Credential));
        assert_eq!(AuthMethod::from_tag("sso"), Some(AuthMethod::Sso));
        assert_eq!(AuthMethod::from_tag("google"), Some(AuthMethod::Sso));
        assert_eq!(AuthMethod::from_tag("saml"), None);
        assert_eq!(AuthMethod::Sso.to_string(), "sso");
    }

    #[test]
    fn test_start_sets_all_fields() {
        let (session, _) = client();
        assert!(!session.is_authenticated());
        session.start("tok", "jane", AuthMethod::Credential).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(
            session.snapshot(),
            Session {
                token: Some("tok".into()),
                username: Some("jane".into()),
                auth_method: Some(AuthMethod::Credential),
            }
        );
        assert_eq!(session.bearer_token().as_deref(), Some("tok"));
    }

    #[test]
    fn test_empty_token_rejected() {
        let (session, store) = client();
        assert!(session.start("  ", "jane", AuthMethod::Sso).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_username_rejected() {
        let (session, store) = client();
        assert!(matches!(
            session.start("tok", "", AuthMethod::Credential),
            Err(SessionError::Storage(_))
        ));
        assert!(session.start("tok", "   ", AuthMethod::Sso).is_err());
        assert!(store.is_empty());
        assert_eq!(session.snapshot(), Session::default());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (session, store) = client();
        session.start("tok", "jane", AuthMethod::Sso).unwrap();
        session.clear().unwrap();
        session.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(session.snapshot(), Session::default());
    }

    #[test]
    fn test_set_username_requires_session() {
        let (session, _) = client();
        assert!(!session.set_username("other").unwrap());
        assert_eq!(session.username(), None);

        session.start("tok", "jane", AuthMethod::Credential).unwrap();
        assert!(session.set_username("janet").unwrap());
        assert_eq!(session.username().as_deref(), Some("janet"));
        assert_eq!(session.token().as_deref(), Some("tok"));
    }

    #[test]
    fn test_server_context_sees_nothing() {
        let session = SessionService::server();
        assert!(!session.is_authenticated());
        assert_eq!(session.username(), None);
        assert_eq!(session.bearer_token(), None);
        assert!(session.clear().is_ok());
        assert!(matches!(
            session.start("tok", "jane", AuthMethod::Credential),
            Err(SessionError::NoClientStorage)
        ));
    }

    /// Store whose removals of selected keys fail until healed.
    struct FlakyStore {
        inner: MemoryStore,
        broken: Mutex<HashSet<&'static str>>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.broken.lock().contains(key) {
                return Err(SessionError::Storage(format!("{} is read-only", key)));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            if self.broken.lock().contains(key) {
                return Err(SessionError::Storage(format!("{} is read-only", key)));
            }
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_clear_attempts_every_key_and_converges() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            broken: Mutex::new(HashSet::new()),
        });
        let session = SessionService::client(store.clone());
        session.start("tok", "jane", AuthMethod::Sso).unwrap();

        store.broken.lock().insert(TOKEN_KEY);
        assert!(session.clear().is_err());
        assert_eq!(session.username(), None);
        assert_eq!(session.auth_method(), None);
        assert_eq!(session.token().as_deref(), Some("tok"));

        store.broken.lock().clear();
        session.clear().unwrap();
        assert_eq!(session.snapshot(), Session::default());
    }

    #[test]
    fn test_partial_start_rolls_back() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            broken: Mutex::new(HashSet::from([AUTH_METHOD_KEY])),
        });
        let session = SessionService::client(store.clone());
        assert!(session.start("tok", "jane", AuthMethod::Sso).is_err());
        assert_eq!(session.token(), None);
        assert_eq!(session.username(), None);
    }
}
