//! Cookie session store backing the OAuth handshake
//!
//! In-memory, TTL-bounded sessions keyed by a random cookie id. The OAuth
//! adaptor persists exactly one entry per login attempt: the marshaled
//! auth session blob under [`crate::constants::SESSION_VALUE_KEY`].

use crate::constants::{SESSION_CLEANUP_INTERVAL_SECS, SESSION_COOKIE_NAME};
use axum::http::{HeaderMap, header};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Session data stored per browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session id, also the cookie value
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Arbitrary session data
    pub data: HashMap<String, serde_json::Value>,
}

/// Store managing browser sessions
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    /// Create a new session store.
    ///
    /// When called inside a tokio runtime a background task sweeps expired
    /// sessions; outside one, expiry is still enforced on read.
    pub fn new() -> Self {
        let store = Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let store_clone = store.clone();
            handle.spawn(async move {
                store_clone.cleanup_loop().await;
            });
        }

        store
    }

    /// Create a new session
    pub fn create_session(&self, ttl: Duration) -> Session {
        let session = Session {
            id: generate_session_id(),
            created_at: Utc::now(),
            expires_at: Utc::now() + ttl,
            data: HashMap::new(),
        };

        self.sessions
            .write()
            .insert(session.id.clone(), session.clone());
        session
    }

    /// Get a session by id, dropping it when expired
    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.read();
        let session = sessions.get(session_id)?;

        if Utc::now() > session.expires_at {
            drop(sessions);
            self.sessions.write().remove(session_id);
            return None;
        }

        Some(session.clone())
    }

    /// Set a data entry on a session. Returns false for unknown sessions.
    pub fn set_value(&self, session_id: &str, key: &str, value: serde_json::Value) -> bool {
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get_mut(session_id) {
            session.data.insert(key.to_string(), value);
            true
        } else {
            false
        }
    }

    /// Remove and return a data entry from a session
    pub fn take_value(&self, session_id: &str, key: &str) -> Option<serde_json::Value> {
        self.sessions.write().get_mut(session_id)?.data.remove(key)
    }

    /// Delete a session
    pub fn delete_session(&self, session_id: &str) {
        self.sessions.write().remove(session_id);
    }

    /// Extract the session id from a request's cookie header
    pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
        let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
        let prefix = format!("{}=", SESSION_COOKIE_NAME);
        cookie_header
            .split(';')
            .map(|c| c.trim())
            .find_map(|c| c.strip_prefix(prefix.as_str()))
            .map(|s| s.to_string())
    }

    async fn cleanup_loop(&self) {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(
                SESSION_CLEANUP_INTERVAL_SECS,
            ))
            .await;

            let now = Utc::now();
            let mut sessions = self.sessions.write();
            sessions.retain(|_, session| now < session.expires_at);
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a session cookie with security flags.
///
/// `secure` requires HTTPS; keep it off for local development over HTTP.
pub fn set_session_cookie(session_id: &str, expires_at: DateTime<Utc>, secure: bool) -> String {
    let secure_flag = if secure { " Secure;" } else { "" };
    format!(
        "{}={}; Path=/; Expires={}; HttpOnly;{} SameSite=Lax",
        SESSION_COOKIE_NAME,
        session_id,
        expires_at.to_rfc2822(),
        secure_flag
    )
}

/// Build a cookie that clears the session.
///
/// `secure` should match what was used when setting the cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    let secure_flag = if secure { " Secure;" } else { "" };
    format!(
        "{}=; Path=/; Max-Age=0; HttpOnly;{} SameSite=Lax",
        SESSION_COOKIE_NAME, secure_flag
    )
}

/// Generate a secure random session id (cryptographically secure RNG)
fn generate_session_id() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

#[cfg(test)]
mod session_test;
