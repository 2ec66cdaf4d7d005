//! Seam to the streaming-session provider.
//!
//! The shell only sees [`MountedSession`]: a sender, a receiver, and an
//! abort-on-drop guard for the provider task. [`SessionProvider`] exists so
//! tests can count mounts without a network.

use async_trait::async_trait;
use gemini_live::{ConnectionDescriptor, LiveClientEvent, LiveEvent, LiveSession, SessionSetup};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::info;

/// A live session scoped to one authenticated shell.
///
/// Dropping the session aborts the provider task, releasing the connection
/// when the shell unmounts.
pub struct MountedSession {
    pub sender: mpsc::Sender<LiveClientEvent>,
    pub events: mpsc::Receiver<LiveEvent>,
    task: Option<JoinHandle<()>>,
}

impl MountedSession {
    /// A session without a backing task (tests, fakes).
    pub fn detached(
        sender: mpsc::Sender<LiveClientEvent>,
        events: mpsc::Receiver<LiveEvent>,
    ) -> Self {
        Self {
            sender,
            events,
            task: None,
        }
    }

    /// A session backed by a provider task, aborted on drop.
    pub fn with_task(
        sender: mpsc::Sender<LiveClientEvent>,
        events: mpsc::Receiver<LiveEvent>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            sender,
            events,
            task: Some(task),
        }
    }
}

impl Drop for MountedSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Acquires a realtime session for the authenticated subtree.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn mount(&self) -> anyhow::Result<MountedSession>;
}

/// The production provider: connects to the Gemini Live API.
pub struct GeminiSessionProvider {
    descriptor: ConnectionDescriptor,
    setup: SessionSetup,
}

impl GeminiSessionProvider {
    pub fn new(descriptor: ConnectionDescriptor, setup: SessionSetup) -> Self {
        Self { descriptor, setup }
    }
}

#[async_trait]
impl SessionProvider for GeminiSessionProvider {
    async fn mount(&self) -> anyhow::Result<MountedSession> {
        let session = LiveSession::connect(&self.descriptor, self.setup.clone()).await?;
        info!(model = %self.setup.model, "Live session mounted");
        let (sender, events, task) = session.into_parts();
        Ok(MountedSession::with_task(sender, events, task))
    }
}
