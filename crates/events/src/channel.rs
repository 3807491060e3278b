//! Job update channel abstraction (subscription mechanics only).
//!
//! The channel is owned by the backend; the client only subscribes per job.
//! Reconnection and framing are the transport's business, and a dead
//! transport simply stops delivering: subscribers see `recv()` return `None`
//! at worst, or nothing at all.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use tellmemo_core::JobId;

use crate::update::JobUpdate;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Internal lock poisoning.
    #[error("channel state poisoned")]
    Poisoned,
    /// The transport could not be opened or has shut down.
    #[error("transport error: {0}")]
    Transport(String),
}

type UnsubscribeHook = Box<dyn FnOnce() + Send + Sync>;

/// A per-job stream of updates.
///
/// Updates arrive in the order the channel delivered them. Dropping the
/// subscription unsubscribes: the receiver closes and the transport's
/// unsubscribe hook, if any, runs once.
pub struct Subscription<M> {
    receiver: mpsc::UnboundedReceiver<M>,
    on_drop: Option<UnsubscribeHook>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: mpsc::UnboundedReceiver<M>) -> Self {
        Self { receiver, on_drop: None }
    }

    /// Run `hook` when the subscription is dropped, e.g. to tell a remote
    /// peer to stop sending.
    pub fn with_unsubscribe(mut self, hook: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.on_drop = Some(Box::new(hook));
        self
    }

    /// Wait for the next message. `None` once the channel side is gone.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }

    /// Take a message if one is already queued.
    pub fn try_recv(&mut self) -> Result<M, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

impl<M> Drop for Subscription<M> {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(hook) = self.on_drop.take() {
            hook();
        }
    }
}

impl<M> std::fmt::Debug for Subscription<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("unsubscribe_hook", &self.on_drop.is_some())
            .finish_non_exhaustive()
    }
}

/// Source of job status updates, filtered by job identifier.
pub trait JobUpdateChannel: Send + Sync {
    fn subscribe(&self, job_id: &JobId) -> Subscription<JobUpdate>;
}

impl<C> JobUpdateChannel for Arc<C>
where
    C: JobUpdateChannel + ?Sized,
{
    fn subscribe(&self, job_id: &JobId) -> Subscription<JobUpdate> {
        (**self).subscribe(job_id)
    }
}
