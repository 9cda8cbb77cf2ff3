//! Mock authentication with opaque bearer tokens.
//!
//! Two fixed accounts can sign in. Tokens are random strings kept in memory
//! together with the account they belong to and their expiry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token lifetime used when none is configured.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 8 * 60 * 60;

/// Errors returned by [`AuthService`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access token required")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
        }
    }
}

/// Profile of a signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub permissions: Vec<String>,
}

/// A freshly issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
    pub token_type: String,
}

struct Account {
    password: String,
    user: AuthUser,
}

struct Session {
    user: AuthUser,
    expires_at: DateTime<Utc>,
}

/// In-memory credential check and session table.
pub struct AuthService {
    accounts: HashMap<String, Account>,
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
}

impl AuthService {
    /// Creates the service with the demo accounts and the default lifetime.
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(DEFAULT_TOKEN_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let accounts = [
            (
                "admin123",
                AuthUser {
                    id: "user-001".to_string(),
                    name: "María González".to_string(),
                    email: "admin@mef.gob.pe".to_string(),
                    role: "admin".to_string(),
                    permissions: to_strings(&[
                        "users:read",
                        "users:write",
                        "products:read",
                        "products:write",
                        "admin:access",
                    ]),
                },
            ),
            (
                "user123",
                AuthUser {
                    id: "user-002".to_string(),
                    name: "Carlos Mendoza".to_string(),
                    email: "user@mef.gob.pe".to_string(),
                    role: "user".to_string(),
                    permissions: to_strings(&["products:read", "products:reserve"]),
                },
            ),
        ]
        .into_iter()
        .map(|(password, user)| {
            (
                user.email.clone(),
                Account {
                    password: password.to_string(),
                    user,
                },
            )
        })
        .collect();

        Self {
            accounts,
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks the credentials and opens a session.
    pub fn login(&self, email: &str, password: &str) -> Result<(AuthUser, IssuedToken), AuthError> {
        let account = self
            .accounts
            .get(&email.trim().to_lowercase())
            .filter(|account| account.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        let issued = self.issue(account.user.clone());
        tracing::info!(user_id = %account.user.id, "user signed in");
        Ok((account.user.clone(), issued))
    }

    /// Resolves the account behind a token. Expired sessions are dropped.
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let mut sessions = self.sessions();
        let session = sessions.get(token).ok_or(AuthError::InvalidToken)?;

        if session.expires_at <= Utc::now() {
            sessions.remove(token);
            return Err(AuthError::TokenExpired);
        }
        Ok(session.user.clone())
    }

    /// Closes the session of `token`.
    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions()
            .remove(token)
            .map(|_| ())
            .ok_or(AuthError::InvalidToken)
    }

    /// Replaces a valid token with a new one.
    pub fn refresh(&self, token: &str) -> Result<IssuedToken, AuthError> {
        let user = self.authenticate(token)?;
        self.sessions().remove(token);
        Ok(self.issue(user))
    }

    /// Number of open sessions, expired ones included.
    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }

    /// Opens a session, dropping every expired one first.
    fn issue(&self, user: AuthUser) -> IssuedToken {
        let token = format!("mock-token-{}", Uuid::new_v4().simple());
        let now = Utc::now();
        let mut sessions = self.sessions();
        sessions.retain(|_, session| session.expires_at > now);
        sessions.insert(
            token.clone(),
            Session {
                user,
                expires_at: now + self.ttl,
            },
        );
        drop(sessions);

        IssuedToken {
            token,
            expires_in: self.ttl.num_seconds(),
            token_type: "Bearer".to_string(),
        }
    }
}

impl Default for AuthService {
    fn default() -> Self {
        Self::new()
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_issues_bearer_token() {
        let auth = AuthService::new();
        let (user, issued) = auth.login("admin@mef.gob.pe", "admin123").unwrap();

        assert_eq!(user.id, "user-001");
        assert_eq!(user.role, "admin");
        assert!(issued.token.starts_with("mock-token-"));
        assert_eq!(issued.expires_in, 28_800);
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(auth.authenticate(&issued.token).unwrap(), user);
    }

    #[test]
    fn test_login_email_is_case_insensitive() {
        let auth = AuthService::new();
        let (user, _) = auth.login(" User@MEF.gob.pe ", "user123").unwrap();
        assert_eq!(user.id, "user-002");
        assert_eq!(user.permissions, vec!["products:read", "products:reserve"]);
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let auth = AuthService::new();
        assert_eq!(
            auth.login("admin@mef.gob.pe", "user123"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.login("nobody@mef.gob.pe", "admin123"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(auth.session_count(), 0);
    }

    #[test]
    fn test_unknown_token_is_invalid() {
        let auth = AuthService::new();
        assert_eq!(auth.authenticate("mock-token-x"), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_expired_token_is_dropped() {
        let auth = AuthService::with_ttl(Duration::zero());
        let (_, issued) = auth.login("admin@mef.gob.pe", "admin123").unwrap();

        assert_eq!(auth.authenticate(&issued.token), Err(AuthError::TokenExpired));
        assert_eq!(auth.session_count(), 0);
        assert_eq!(auth.authenticate(&issued.token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_login_prunes_expired_sessions() {
        let auth = AuthService::with_ttl(Duration::zero());
        for _ in 0..5 {
            auth.login("user@mef.gob.pe", "user123").unwrap();
        }
        assert_eq!(auth.session_count(), 1);

        let auth = AuthService::new();
        for _ in 0..3 {
            auth.login("user@mef.gob.pe", "user123").unwrap();
        }
        assert_eq!(auth.session_count(), 3);
    }

    #[test]
    fn test_logout_revokes_token() {
        let auth = AuthService::new();
        let (_, issued) = auth.login("user@mef.gob.pe", "user123").unwrap();

        auth.logout(&issued.token).unwrap();
        assert_eq!(auth.authenticate(&issued.token), Err(AuthError::InvalidToken));
        assert_eq!(auth.logout(&issued.token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_refresh_rotates_token() {
        let auth = AuthService::new();
        let (user, issued) = auth.login("user@mef.gob.pe", "user123").unwrap();

        let renewed = auth.refresh(&issued.token).unwrap();
        assert_ne!(renewed.token, issued.token);
        assert_eq!(auth.authenticate(&issued.token), Err(AuthError::InvalidToken));
        assert_eq!(auth.authenticate(&renewed.token).unwrap(), user);
        assert_eq!(auth.session_count(), 1);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::InvalidCredentials.code(), "INVALID_CREDENTIALS");
        assert_eq!(AuthError::MissingToken.code(), "MISSING_TOKEN");
        assert_eq!(AuthError::TokenExpired.code(), "TOKEN_EXPIRED");
    }
}
