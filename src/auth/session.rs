//! Per-session login state
//!
//! A [`SessionContext`] is created when a client starts, holds at most one
//! [`Session`] and is cleared on logout. Handlers take `&Session`, so code
//! that needs a logged-in user cannot run without one.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{EngagementError, Result};

use super::{random_hex, Authenticator};

/// An authenticated user session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: String,
    pub username: String,
    pub started_at: DateTime<Utc>,
}

impl Session {
    fn start(username: &str) -> Self {
        Session {
            id: random_hex(16),
            username: username.to_string(),
            started_at: Utc::now(),
        }
    }
}

/// Login state for one client
pub struct SessionContext {
    authenticator: Box<dyn Authenticator>,
    session: Option<Session>,
}

impl SessionContext {
    pub fn new(authenticator: Box<dyn Authenticator>) -> Self {
        SessionContext {
            authenticator,
            session: None,
        }
    }

    /// Verify credentials and start a session, replacing any previous one
    pub fn login(&mut self, username: &str, password: &str) -> Result<&Session> {
        if !self.authenticator.authenticate(username, password) {
            log::warn!("Failed login for {:?}", username);
            self.session = None;
            return Err(EngagementError::AuthenticationFailed);
        }

        let session = Session::start(username);
        log::info!("Welcome, {}!", session.username);
        Ok(self.session.insert(session))
    }

    /// Start a session without credentials (authentication disabled)
    pub fn login_anonymous(&mut self) -> &Session {
        log::debug!("Authentication disabled, opening anonymous session");
        self.session.insert(Session::start("anonymous"))
    }

    /// End the current session, if any
    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!("Session {} for {} closed", session.id, session.username);
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// The live session, or `NotLoggedIn`
    pub fn require(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(EngagementError::NotLoggedIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{new_credential, CredentialStore};

    fn context() -> SessionContext {
        let store = CredentialStore::new(vec![new_credential("arun", "correct horse")]);
        SessionContext::new(Box::new(store))
    }

    #[test]
    fn test_login_lifecycle() {
        let mut ctx = context();
        assert!(matches!(ctx.require(), Err(EngagementError::NotLoggedIn)));

        let session = ctx.login("arun", "correct horse").unwrap();
        assert_eq!(session.username, "arun");
        assert_eq!(session.id.len(), 32);
        assert!(ctx.is_logged_in());
        assert_eq!(ctx.require().unwrap().username, "arun");

        ctx.logout();
        assert!(!ctx.is_logged_in());
        assert!(matches!(ctx.require(), Err(EngagementError::NotLoggedIn)));
    }

    #[test]
    fn test_wrong_password() {
        let mut ctx = context();
        assert!(matches!(
            ctx.login("arun", "wrong"),
            Err(EngagementError::AuthenticationFailed)
        ));
        assert!(!ctx.is_logged_in());
    }

    #[test]
    fn test_failed_login_clears_previous_session() {
        let mut ctx = context();
        ctx.login("arun", "correct horse").unwrap();
        assert!(ctx.login("arun", "wrong").is_err());
        assert!(ctx.require().is_err());
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        let mut ctx = context();
        let first = ctx.login("arun", "correct horse").unwrap().id.clone();
        let second = ctx.login("arun", "correct horse").unwrap().id.clone();
        assert_ne!(first, second);
    }

    #[test]
    fn test_anonymous_session() {
        let mut ctx = SessionContext::new(Box::new(CredentialStore::default()));
        assert_eq!(ctx.login_anonymous().username, "anonymous");
        assert!(ctx.require().is_ok());
    }
}
