//! The authentication gate: decides which top-level view is shown.

use crate::auth::AuthSnapshot;

/// The three gating states of the console.
///
/// Evaluation is a pure function of the current [`AuthSnapshot`] with no
/// side effects; the caller re-evaluates whenever the store publishes a new
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthGate {
    /// No user record: show the login view.
    Unauthenticated,
    /// User present but phone verification is pending: show the
    /// verification view.
    NeedsVerification,
    /// User present and verified: mount the authenticated shell.
    Authenticated,
}

impl AuthGate {
    pub fn evaluate(snapshot: &AuthSnapshot) -> Self {
        match (&snapshot.user, snapshot.needs_phone_verification) {
            (None, _) => AuthGate::Unauthenticated,
            (Some(_), true) => AuthGate::NeedsVerification,
            (Some(_), false) => AuthGate::Authenticated,
        }
    }
}
