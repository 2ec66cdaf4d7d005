//! The login view, shown while no user record is present.

use lumen_core::{AuthError, AuthStore};
use std::io::Write;
use tokio::sync::mpsc;

#[derive(Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    SignedIn,
    Quit,
}

pub async fn run<W: Write>(
    store: &AuthStore,
    input: &mut mpsc::Receiver<String>,
    out: &mut W,
) -> anyhow::Result<LoginOutcome> {
    writeln!(out, "== Lumen ==")?;
    writeln!(out, "Sign in to continue (/quit to exit).")?;
    loop {
        write!(out, "email: ")?;
        out.flush()?;
        let Some(email) = input.recv().await else {
            return Ok(LoginOutcome::Quit);
        };
        let email = email.trim().to_string();
        if email == "/quit" {
            return Ok(LoginOutcome::Quit);
        }
        if email.is_empty() {
            continue;
        }

        write!(out, "password: ")?;
        out.flush()?;
        let Some(password) = input.recv().await else {
            return Ok(LoginOutcome::Quit);
        };
        let password = password.trim();
        if password == "/quit" {
            return Ok(LoginOutcome::Quit);
        }

        match store.sign_in(&email, password).await {
            Ok(()) => {
                writeln!(out, "Signed in as {email}.")?;
                return Ok(LoginOutcome::SignedIn);
            }
            Err(AuthError::InvalidCredentials) => {
                writeln!(out, "Invalid credentials, try again.")?;
            }
            Err(e) => {
                writeln!(out, "Sign-in failed: {e}")?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::StaticIdentityService;
    use std::sync::Arc;

    #[tokio::test]
    async fn retries_after_bad_credentials() {
        let store = AuthStore::new(Arc::new(StaticIdentityService::demo()));
        let (tx, mut rx) = mpsc::channel(8);
        for line in ["demo@lumen.dev", "wrong", "demo@lumen.dev", "demo"] {
            tx.send(line.to_string()).await.unwrap();
        }

        let mut out = Vec::new();
        let outcome = run(&store, &mut rx, &mut out).await.unwrap();

        assert_eq!(outcome, LoginOutcome::SignedIn);
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("Invalid credentials"));
        assert!(rendered.contains("Signed in as demo@lumen.dev."));
        assert!(store.snapshot().user.is_some());
    }

    #[tokio::test]
    async fn quit_at_the_email_prompt() {
        let store = AuthStore::new(Arc::new(StaticIdentityService::demo()));
        let (tx, mut rx) = mpsc::channel(8);
        tx.send("/quit".to_string()).await.unwrap();

        let mut out = Vec::new();
        let outcome = run(&store, &mut rx, &mut out).await.unwrap();

        assert_eq!(outcome, LoginOutcome::Quit);
        assert!(store.snapshot().user.is_none());
    }
}
