//! The composition root.
//!
//! Evaluates the authentication gate against the current snapshot and runs
//! the matching view until it reports a transition. The streaming-session
//! provider is mounted exactly once per entry into `Authenticated` and is
//! released when the shell unmounts; re-renders inside a view never touch
//! the mount.

use crate::{
    live::SessionProvider,
    views::{
        login::{self, LoginOutcome},
        shell::{self, ShellOutcome},
        verification::{self, VerifyOutcome},
    },
};
use anyhow::Context;
use lumen_core::{AuthGate, AuthStore};
use std::io::Write;
use tokio::sync::mpsc;
use tracing::info;

/// What the runtime should do after one app-loop iteration ends.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Restart from scratch (the full-reload recovery path after
    /// verification completes).
    Reload,
    /// Shut down.
    Quit,
}

pub async fn run<W: Write>(
    store: &AuthStore,
    provider: &dyn SessionProvider,
    input: &mut mpsc::Receiver<String>,
    out: &mut W,
) -> anyhow::Result<Outcome> {
    loop {
        match AuthGate::evaluate(&store.snapshot()) {
            AuthGate::Unauthenticated => match login::run(store, input, out).await? {
                LoginOutcome::Quit => return Ok(Outcome::Quit),
                LoginOutcome::SignedIn => {}
            },
            AuthGate::NeedsVerification => match verification::run(store, input, out).await? {
                VerifyOutcome::Quit => return Ok(Outcome::Quit),
                VerifyOutcome::Verified => return Ok(Outcome::Reload),
            },
            AuthGate::Authenticated => {
                let session = provider
                    .mount()
                    .await
                    .context("failed to open the live session")?;
                info!("Streaming session provider mounted");
                match shell::run(store, session, input, out).await? {
                    ShellOutcome::Quit => return Ok(Outcome::Quit),
                    ShellOutcome::LoggedOut => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::{MockSessionProvider, MountedSession};
    use gemini_live::LiveEvent;
    use lumen_core::StaticIdentityService;
    use std::sync::Arc;

    fn detached_session() -> MountedSession {
        // The far ends drop immediately; the shell tolerates a closed
        // session, which is all these tests need.
        let (live_tx, _live_rx) = mpsc::channel(8);
        let (_event_tx, event_rx) = mpsc::channel::<LiveEvent>(8);
        MountedSession::detached(live_tx, event_rx)
    }

    async fn feed(lines: &[&str]) -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(32);
        for line in lines {
            tx.send(line.to_string()).await.unwrap();
        }
        (tx, rx)
    }

    #[tokio::test]
    async fn signed_out_renders_login_only() {
        let store = AuthStore::new(Arc::new(StaticIdentityService::demo()));
        let mut provider = MockSessionProvider::new();
        provider.expect_mount().times(0);

        let (_input_tx, mut input) = feed(&["/quit"]).await;
        let mut out = Vec::new();
        let outcome = run(&store, &provider, &mut input, &mut out).await.unwrap();

        assert_eq!(outcome, Outcome::Quit);
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("Sign in to continue"));
        assert!(!rendered.contains("streaming console"));
        assert!(!rendered.contains("verification"));
    }

    #[tokio::test]
    async fn pending_verification_renders_verification_only_then_reloads() {
        let identity = StaticIdentityService::demo().with_pending_verification();
        let store = AuthStore::new(Arc::new(identity));
        store.sign_in("demo@lumen.dev", "demo").await.unwrap();

        let mut provider = MockSessionProvider::new();
        provider.expect_mount().times(0);

        let (_input_tx, mut input) = feed(&["123456"]).await;
        let mut out = Vec::new();
        let outcome = run(&store, &provider, &mut input, &mut out).await.unwrap();

        // Completing the verification callback triggers a full reload.
        assert_eq!(outcome, Outcome::Reload);
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("Phone verification required."));
        assert!(!rendered.contains("streaming console"));
        assert!(!rendered.contains("Sign in to continue"));
    }

    #[tokio::test]
    async fn authenticated_mounts_the_provider_exactly_once() {
        let store = AuthStore::new(Arc::new(StaticIdentityService::demo()));
        store.sign_in("demo@lumen.dev", "demo").await.unwrap();

        let mut provider = MockSessionProvider::new();
        provider
            .expect_mount()
            .times(1)
            .returning(|| Ok(detached_session()));

        // Blank lines force repeated re-renders with unchanged auth state;
        // none of them may remount the provider.
        let (_input_tx, mut input) = feed(&["", "", "", "/quit"]).await;
        let mut out = Vec::new();
        let outcome = run(&store, &provider, &mut input, &mut out).await.unwrap();

        assert_eq!(outcome, Outcome::Quit);
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("streaming console"));
        assert!(rendered.contains("preview: [hidden]"));
        provider.checkpoint();
    }

    #[tokio::test]
    async fn logout_returns_to_login_and_remounts_on_next_sign_in() {
        let store = AuthStore::new(Arc::new(StaticIdentityService::demo()));
        store.sign_in("demo@lumen.dev", "demo").await.unwrap();

        let mut provider = MockSessionProvider::new();
        provider
            .expect_mount()
            .times(2)
            .returning(|| Ok(detached_session()));

        let (_input_tx, mut input) = feed(&[
            "/logout",
            "demo@lumen.dev",
            "demo",
            "/quit",
        ])
        .await;
        let mut out = Vec::new();
        let outcome = run(&store, &provider, &mut input, &mut out).await.unwrap();

        assert_eq!(outcome, Outcome::Quit);
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("Sign in to continue"));
        provider.checkpoint();
    }
}
