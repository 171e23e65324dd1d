//! Shared types for the API layer: context, caller identity, sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::api::error::ApiError;
use crate::config::MAX_SESSION_TTL_SECS;
use crate::core_state::CoreState;
use crate::models::{Role, User};

/// Expired sessions are swept once the store grows past this.
const SESSION_SWEEP_THRESHOLD: usize = 1000;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        let ttl = Duration::from_secs(core.config.session_ttl_secs);
        Self {
            core,
            sessions: Arc::new(Mutex::new(SessionStore::new(ttl))),
        }
    }

    pub fn open_db(&self) -> Result<rusqlite::Connection, ApiError> {
        Ok(self.core.open_db()?)
    }

    pub fn lock_sessions(&self) -> Result<std::sync::MutexGuard<'_, SessionStore>, ApiError> {
        self.sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))
    }
}

// ═══════════════════════════════════════════════════════════
// Auth context: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// The signed-in caller, injected into request extensions by the auth
/// middleware after the bearer token checks out.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub token_hash: [u8; 32],
}

impl AuthContext {
    pub fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Session store: hashed bearer tokens with expiry
// ═══════════════════════════════════════════════════════════

#[derive(Debug)]
struct Session {
    user_id: Uuid,
    username: String,
    role: Role,
    expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    Unknown,
    Expired,
}

/// In-memory login sessions keyed by the SHA-256 of the bearer token.
/// Raw tokens are never stored.
pub struct SessionStore {
    sessions: HashMap<[u8; 32], Session>,
    ttl: Duration,
}

impl SessionStore {
    /// `ttl` is capped at the configured maximum so expiry never overflows.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl: ttl.min(Duration::from_secs(MAX_SESSION_TTL_SECS)),
        }
    }

    /// Start a session for `user` and return the raw token to hand out.
    pub fn issue(&mut self, user: &User) -> String {
        if self.sessions.len() > SESSION_SWEEP_THRESHOLD {
            self.cleanup();
        }
        let token = generate_token();
        self.sessions.insert(
            hash_token(&token),
            Session {
                user_id: user.id,
                username: user.username.clone(),
                role: user.role,
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    /// Resolve a raw token. Expired sessions are removed on sight.
    pub fn validate(&mut self, token: &str) -> Result<AuthContext, SessionRejection> {
        let token_hash = hash_token(token);
        let session = self
            .sessions
            .get(&token_hash)
            .ok_or(SessionRejection::Unknown)?;
        if Instant::now() >= session.expires_at {
            self.sessions.remove(&token_hash);
            return Err(SessionRejection::Expired);
        }
        Ok(AuthContext {
            user_id: session.user_id,
            username: session.username.clone(),
            role: session.role,
            token_hash,
        })
    }

    pub fn revoke(&mut self, token_hash: &[u8; 32]) -> bool {
        self.sessions.remove(token_hash).is_some()
    }

    /// Drop every session belonging to a user. Returns how many went.
    pub fn revoke_user(&mut self, user_id: &Uuid) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| &s.user_id != user_id);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn cleanup(&mut self) {
        let now = Instant::now();
        self.sessions.retain(|_, s| now < s.expires_at);
    }
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: "someone".into(),
            name: "Some One".into(),
            role,
            date_of_birth: None,
            surgery_type: None,
            surgery_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_validates() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        let doctor = user(Role::Doctor);
        let token = store.issue(&doctor);
        let ctx = store.validate(&token).unwrap();
        assert_eq!(ctx.user_id, doctor.id);
        assert_eq!(ctx.role, Role::Doctor);
        assert_eq!(ctx.token_hash, hash_token(&token));
    }

    #[test]
    fn unknown_token_rejected() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        assert_eq!(store.validate("nope").unwrap_err(), SessionRejection::Unknown);
    }

    #[test]
    fn expired_token_rejected_and_removed() {
        let mut store = SessionStore::new(Duration::ZERO);
        let token = store.issue(&user(Role::Patient));
        assert_eq!(store.validate(&token).unwrap_err(), SessionRejection::Expired);
        assert!(store.is_empty());
        assert_eq!(store.validate(&token).unwrap_err(), SessionRejection::Unknown);
    }

    #[test]
    fn oversized_ttl_is_capped() {
        let mut store = SessionStore::new(Duration::MAX);
        let token = store.issue(&user(Role::Admin));
        assert!(store.validate(&token).is_ok());
    }

    #[test]
    fn revoke_ends_one_session() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        let patient = user(Role::Patient);
        let first = store.issue(&patient);
        let second = store.issue(&patient);
        assert!(store.revoke(&hash_token(&first)));
        assert!(store.validate(&first).is_err());
        assert!(store.validate(&second).is_ok());
    }

    #[test]
    fn revoke_user_ends_all_their_sessions() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        let patient = user(Role::Patient);
        let other = user(Role::Doctor);
        store.issue(&patient);
        store.issue(&patient);
        let keep = store.issue(&other);
        assert_eq!(store.revoke_user(&patient.id), 2);
        assert_eq!(store.len(), 1);
        assert!(store.validate(&keep).is_ok());
    }

    #[test]
    fn require_role_checks_exact_role() {
        let ctx = AuthContext {
            user_id: Uuid::new_v4(),
            username: "adm".into(),
            role: Role::Admin,
            token_hash: [0; 32],
        };
        assert!(ctx.require_role(Role::Admin).is_ok());
        assert!(matches!(ctx.require_role(Role::Doctor), Err(ApiError::Forbidden)));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert!(!t1.is_empty());
    }

    #[test]
    fn hash_token_is_deterministic() {
        assert_eq!(hash_token("test"), hash_token("test"));
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }
}
