//! Session Management
//!
//! Explicit login session passed to whatever needs credentials:
//! - Tokens held as secrets, never logged
//! - Explicit login / logout / expire lifecycle
//! - Optional persistence to a JSON file between CLI runs

use crate::error::{IcashError, IcashResult};
use crate::types::{LoginResponse, User};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Active,
    /// The server rejected the token; a new login is required
    Expired,
}

/// Access and refresh tokens
pub struct AuthTokens {
    pub access: SecretString,
    pub refresh: SecretString,
}

/// Current user's session
pub struct Session {
    state: SessionState,
    tokens: Option<AuthTokens>,
    user: Option<User>,
    logged_in_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl Session {
    /// A session with nobody logged in
    pub fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
            tokens: None,
            user: None,
            logged_in_at: None,
        }
    }

    /// Start the session from a successful login
    pub fn login(&mut self, response: LoginResponse) {
        self.tokens = Some(AuthTokens {
            access: SecretString::from(response.access),
            refresh: SecretString::from(response.refresh),
        });
        self.user = Some(response.data);
        self.logged_in_at = Some(Utc::now());
        self.state = SessionState::Active;
    }

    /// End the session and forget every credential
    pub fn logout(&mut self) {
        *self = Self::anonymous();
    }

    /// Mark the tokens as rejected by the server
    pub fn expire(&mut self) {
        if self.state == SessionState::Active {
            self.tokens = None;
            self.state = SessionState::Expired;
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The logged-in user, or an auth error for protected pages
    pub fn require_user(&self) -> IcashResult<&User> {
        match (self.state, self.user.as_ref()) {
            (SessionState::Active, Some(user)) => Ok(user),
            (SessionState::Expired, _) => Err(IcashError::session_expired(
                "Session expirée, veuillez vous reconnecter",
            )),
            _ => Err(IcashError::auth_error("Veuillez vous connecter")),
        }
    }

    pub fn update_user(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn access_token(&self) -> Option<&SecretString> {
        match self.state {
            SessionState::Active => self.tokens.as_ref().map(|t| &t.access),
            _ => None,
        }
    }

    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.tokens.as_ref().map(|t| &t.refresh)
    }

    pub fn logged_in_at(&self) -> Option<DateTime<Utc>> {
        self.logged_in_at
    }
}

/// On-disk form of an active session
#[derive(Serialize, Deserialize)]
struct StoredSession {
    access: String,
    refresh: String,
    user: User,
    logged_in_at: DateTime<Utc>,
}

/// Persists a session to a JSON file
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session; a missing file is an anonymous session
    pub fn load(&self) -> IcashResult<Session> {
        if !self.path.exists() {
            return Ok(Session::anonymous());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let stored: StoredSession = serde_json::from_str(&raw).map_err(|e| {
            IcashError::parse_error(format!("Corrupt session file {}: {}", self.path.display(), e))
        })?;

        Ok(Session {
            state: SessionState::Active,
            tokens: Some(AuthTokens {
                access: SecretString::from(stored.access),
                refresh: SecretString::from(stored.refresh),
            }),
            user: Some(stored.user),
            logged_in_at: Some(stored.logged_in_at),
        })
    }

    /// Save an active session, or remove the file for any other state
    pub fn save(&self, session: &Session) -> IcashResult<()> {
        let (tokens, user) = match (session.state, session.tokens.as_ref(), session.user.as_ref()) {
            (SessionState::Active, Some(tokens), Some(user)) => (tokens, user),
            _ => return self.clear(),
        };

        let stored = StoredSession {
            access: tokens.access.expose_secret().to_string(),
            refresh: tokens.refresh.expose_secret().to_string(),
            user: user.clone(),
            logged_in_at: session.logged_in_at.unwrap_or_else(Utc::now),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(&stored)?)?;
        restrict_permissions(&self.path)?;
        Ok(())
    }

    pub fn clear(&self) -> IcashResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> IcashResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> IcashResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_response() -> LoginResponse {
        LoginResponse {
            access: "access-token-123".into(),
            refresh: "refresh-token-456".into(),
            data: User {
                id: "u-1".into(),
                first_name: "Awa".into(),
                last_name: "Traoré".into(),
                email: "awa@example.com".into(),
                phone: Some("22670000000".into()),
                referral_code: None,
            },
        }
    }

    #[test]
    fn test_login_logout_lifecycle() {
        let mut session = Session::anonymous();
        assert!(session.require_user().is_err());

        session.login(login_response());
        assert!(session.is_authenticated());
        assert_eq!(session.require_user().unwrap().first_name, "Awa");
        assert_eq!(session.access_token().unwrap().expose_secret(), "access-token-123");

        session.logout();
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.access_token().is_none());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_expired_session() {
        let mut session = Session::anonymous();
        session.login(login_response());
        session.expire();

        assert_eq!(session.state(), SessionState::Expired);
        assert!(session.access_token().is_none());
        let err = session.require_user().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::SessionExpired);
    }

    #[test]
    fn test_store_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested/session.json"));

        assert_eq!(store.load().unwrap().state(), SessionState::Anonymous);

        let mut session = Session::anonymous();
        session.login(login_response());
        store.save(&session).unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.is_authenticated());
        assert_eq!(loaded.user().unwrap().email, "awa@example.com");

        session.logout();
        store.save(&session).unwrap();
        assert!(!store.path().exists());
    }
}
