//! Who is logged in, with which tokens.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::store::{SessionStore, StoredAuth};
use crate::token::{decode_token_claims, parse_token_expiry, TokenClaims};
use crate::types::{AuthTokens, User};

#[derive(Debug, Default, Clone)]
struct SessionData {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<User>,
}

#[derive(Debug)]
struct SessionInner {
    data: RwLock<SessionData>,
    store: Option<Arc<dyn SessionStore>>,
}

/// Shared handle to one login session. Clones see the same state.
///
/// Every change is written through to the store, if there is one. Storage
/// failures are logged; the in-memory session stays authoritative.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session that is not persisted.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                data: RwLock::new(SessionData::default()),
                store: None,
            }),
        }
    }

    /// Session backed by `store`, starting from whatever it holds.
    pub fn with_store(store: Arc<dyn SessionStore>) -> Self {
        let data = match store.load() {
            Ok(Some(stored)) => {
                debug!(user = %stored.user.username, "session restored");
                SessionData {
                    access_token: Some(stored.access_token),
                    refresh_token: Some(stored.refresh_token),
                    user: Some(stored.user),
                }
            }
            Ok(None) => SessionData::default(),
            Err(e) => {
                warn!(error = %e, "could not load stored session");
                SessionData::default()
            }
        };
        Self {
            inner: Arc::new(SessionInner {
                data: RwLock::new(data),
                store: Some(store),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionData> {
        self.inner.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionData> {
        self.inner.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_auth(&self, tokens: AuthTokens, user: User) {
        let stored = StoredAuth {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            user: user.clone(),
        };
        {
            let mut data = self.write();
            data.access_token = Some(tokens.access_token);
            data.refresh_token = Some(tokens.refresh_token);
            data.user = Some(user);
        }
        self.persist(Some(&stored));
    }

    /// Swap in refreshed tokens. The user is unchanged. Only persisted while
    /// a user is present.
    pub fn update_tokens(&self, tokens: AuthTokens) {
        let stored = {
            let mut data = self.write();
            data.access_token = Some(tokens.access_token.clone());
            data.refresh_token = Some(tokens.refresh_token.clone());
            data.user.clone().map(|user| StoredAuth {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                user,
            })
        };
        if let Some(stored) = stored {
            self.persist(Some(&stored));
        }
    }

    pub fn clear_auth(&self) {
        *self.write() = SessionData::default();
        self.persist(None);
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().access_token.is_some()
    }

    /// Unverified claims of the current access token.
    pub fn claims(&self) -> Option<TokenClaims> {
        decode_token_claims(self.read().access_token.as_deref()?)
    }

    /// Expiry of the current access token, milliseconds since epoch.
    pub fn access_token_expiry(&self) -> Option<i64> {
        parse_token_expiry(self.read().access_token.as_deref()?)
    }

    /// Whether the access token is missing or expired at `now_ms`. A token
    /// without a readable expiry is treated as valid.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        let data = self.read();
        match data.access_token.as_deref() {
            None => true,
            Some(token) => parse_token_expiry(token).is_some_and(|exp| now_ms >= exp),
        }
    }

    fn persist(&self, stored: Option<&StoredAuth>) {
        let Some(store) = &self.inner.store else {
            return;
        };
        let result = match stored {
            Some(auth) => store.save(auth),
            None => store.clear(),
        };
        if let Err(e) = result {
            warn!(error = %e, "could not persist session");
        }
    }
}
