//! Identity Backend Contract
//!
//! The identity service is an external collaborator: this crate only
//! consumes its published interface. [`IdentityService`] defines that
//! contract, [`HttpIdentityClient`] speaks it over HTTP, and
//! [`StaticIdentityService`] provides a deterministic in-process backend
//! for offline use and tests.

use crate::auth::{AuthSnapshot, UserRecord};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::debug;

/// Errors surfaced by identity operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("phone verification failed: {0}")]
    VerificationFailed(String),
    #[error("identity backend error: {0}")]
    Backend(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Backend(err.to_string())
    }
}

/// Contract with the external authentication subsystem.
///
/// Implementations own credential storage and verification flows; the
/// console only ever sees the resulting [`AuthSnapshot`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Restores a persisted session, if any.
    async fn restore(&self) -> Result<AuthSnapshot, AuthError>;

    /// Exchanges credentials for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSnapshot, AuthError>;

    /// Ends the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Submits a phone verification code for the current session.
    async fn complete_phone_verification(&self, code: &str) -> Result<(), AuthError>;
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct VerifyPhoneRequest<'a> {
    code: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    user: Option<UserRecord>,
    #[serde(default)]
    needs_phone_verification: bool,
}

impl From<SessionResponse> for AuthSnapshot {
    fn from(response: SessionResponse) -> Self {
        AuthSnapshot {
            user: response.user,
            needs_phone_verification: response.needs_phone_verification,
        }
    }
}

/// An [`IdentityService`] backed by an HTTP identity API.
pub struct HttpIdentityClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpIdentityClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl IdentityService for HttpIdentityClient {
    async fn restore(&self) -> Result<AuthSnapshot, AuthError> {
        let response = self.http.get(self.endpoint("/session")).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            // No persisted session: signed out, not an error.
            return Ok(AuthSnapshot::signed_out());
        }
        let session: SessionResponse = response.error_for_status()?.json().await?;
        debug!(has_user = session.user.is_some(), "Restored session");
        Ok(session.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSnapshot, AuthError> {
        let response = self
            .http
            .post(self.endpoint("/session"))
            .json(&SignInRequest { email, password })
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidCredentials);
        }
        let session: SessionResponse = response.error_for_status()?.json().await?;
        Ok(session.into())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.http
            .delete(self.endpoint("/session"))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn complete_phone_verification(&self, code: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.endpoint("/session/verify-phone"))
            .json(&VerifyPhoneRequest { code })
            .send()
            .await?;
        if response.status().is_client_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::VerificationFailed(message));
        }
        response.error_for_status()?;
        Ok(())
    }
}

/// A deterministic in-process identity backend.
///
/// Holds one account with a fixed password. Useful for offline runs and
/// integration tests without an identity deployment.
pub struct StaticIdentityService {
    email: String,
    password: String,
    user: UserRecord,
    state: Mutex<StaticState>,
}

#[derive(Default)]
struct StaticState {
    signed_in: bool,
    phone_verified: bool,
}

impl StaticIdentityService {
    pub fn new(email: impl Into<String>, password: impl Into<String>, user: UserRecord) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            user,
            state: Mutex::new(StaticState {
                signed_in: false,
                phone_verified: true,
            }),
        }
    }

    /// Same account, but phone verification is still pending after sign-in.
    pub fn with_pending_verification(mut self) -> Self {
        self.state.get_mut().expect("lock poisoned").phone_verified = false;
        self
    }

    /// The demo account used by `--offline` runs.
    pub fn demo() -> Self {
        Self::new(
            "demo@lumen.dev",
            "demo",
            UserRecord {
                uid: "demo".to_string(),
                email: Some("demo@lumen.dev".to_string()),
                display_name: Some("Demo".to_string()),
            },
        )
    }

    fn snapshot_locked(&self, state: &StaticState) -> AuthSnapshot {
        if state.signed_in {
            AuthSnapshot::signed_in(self.user.clone(), !state.phone_verified)
        } else {
            AuthSnapshot::signed_out()
        }
    }
}

#[async_trait]
impl IdentityService for StaticIdentityService {
    async fn restore(&self) -> Result<AuthSnapshot, AuthError> {
        let state = self.state.lock().expect("lock poisoned");
        Ok(self.snapshot_locked(&state))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSnapshot, AuthError> {
        if email != self.email || password != self.password {
            return Err(AuthError::InvalidCredentials);
        }
        let mut state = self.state.lock().expect("lock poisoned");
        state.signed_in = true;
        Ok(self.snapshot_locked(&state))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.state.lock().expect("lock poisoned").signed_in = false;
        Ok(())
    }

    async fn complete_phone_verification(&self, code: &str) -> Result<(), AuthError> {
        if code.trim().len() != 6 || !code.trim().chars().all(|c| c.is_ascii_digit()) {
            return Err(AuthError::VerificationFailed(
                "expected a 6-digit code".to_string(),
            ));
        }
        self.state.lock().expect("lock poisoned").phone_verified = true;
        Ok(())
    }
}
