//! The phone verification view.
//!
//! Shown when a user record is present but still flagged for phone
//! verification. Completing verification does not transition in place: the
//! outcome asks the runtime for a full reload, mirroring the original
//! reload-after-verification recovery path.

use lumen_core::{AuthError, AuthStore};
use std::io::Write;
use tokio::sync::mpsc;

#[derive(Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    Quit,
}

pub async fn run<W: Write>(
    store: &AuthStore,
    input: &mut mpsc::Receiver<String>,
    out: &mut W,
) -> anyhow::Result<VerifyOutcome> {
    writeln!(out, "Phone verification required.")?;
    writeln!(out, "Enter the code we sent to your phone (/quit to exit).")?;
    loop {
        write!(out, "code: ")?;
        out.flush()?;
        let Some(code) = input.recv().await else {
            return Ok(VerifyOutcome::Quit);
        };
        let code = code.trim();
        if code == "/quit" {
            return Ok(VerifyOutcome::Quit);
        }
        if code.is_empty() {
            continue;
        }

        match store.complete_phone_verification(code).await {
            Ok(()) => {
                writeln!(out, "Phone verified. Reloading session.")?;
                return Ok(VerifyOutcome::Verified);
            }
            Err(AuthError::VerificationFailed(message)) => {
                writeln!(out, "Verification failed: {message}")?;
            }
            Err(e) => {
                writeln!(out, "Verification error: {e}")?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::StaticIdentityService;
    use std::sync::Arc;

    async fn pending_store() -> AuthStore {
        let identity = StaticIdentityService::demo().with_pending_verification();
        let store = AuthStore::new(Arc::new(identity));
        store.sign_in("demo@lumen.dev", "demo").await.unwrap();
        store
    }

    #[tokio::test]
    async fn bad_code_then_good_code_verifies() {
        let store = pending_store().await;
        let (tx, mut rx) = mpsc::channel(8);
        for line in ["nope", "123456"] {
            tx.send(line.to_string()).await.unwrap();
        }

        let mut out = Vec::new();
        let outcome = run(&store, &mut rx, &mut out).await.unwrap();

        assert_eq!(outcome, VerifyOutcome::Verified);
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("Verification failed"));
        assert!(rendered.contains("Phone verified. Reloading session."));
    }

    #[tokio::test]
    async fn snapshot_only_clears_after_reload() {
        let store = pending_store().await;
        let (tx, mut rx) = mpsc::channel(8);
        tx.send("123456".to_string()).await.unwrap();

        let mut out = Vec::new();
        run(&store, &mut rx, &mut out).await.unwrap();

        // The flag is still set until the runtime reloads the session.
        assert!(store.snapshot().needs_phone_verification);
        store.restore().await.unwrap();
        assert!(!store.snapshot().needs_phone_verification);
    }
}
