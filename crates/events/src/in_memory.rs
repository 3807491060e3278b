//! In-memory job update channel.
//!
//! Used directly in tests/dev, and as the per-job fan-out behind the
//! WebSocket transport.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

use tellmemo_core::JobId;

use crate::channel::{ChannelError, JobUpdateChannel, Subscription};
use crate::update::JobUpdate;

/// Per-job pub/sub.
///
/// - No IO
/// - Best-effort fan-out to every live subscriber of the update's job
/// - Dead subscribers are pruned while publishing
#[derive(Debug, Default)]
pub struct InMemoryJobChannel {
    subscribers: Mutex<HashMap<JobId, Vec<mpsc::UnboundedSender<JobUpdate>>>>,
}

impl InMemoryJobChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an update to the subscribers of its job.
    ///
    /// Returns how many subscribers received it; zero is not an error.
    pub fn publish(&self, update: JobUpdate) -> Result<usize, ChannelError> {
        let mut subs = self.subscribers.lock().map_err(|_| ChannelError::Poisoned)?;

        let Some(senders) = subs.get_mut(&update.job_id) else {
            tracing::trace!(job_id = %update.job_id, "no subscribers for job update");
            return Ok(0);
        };

        senders.retain(|tx| tx.send(update.clone()).is_ok());
        let delivered = senders.len();
        if senders.is_empty() {
            subs.remove(&update.job_id);
        }

        Ok(delivered)
    }

    /// Live subscriptions for a job.
    pub fn subscriber_count(&self, job_id: &JobId) -> usize {
        self.subscribers
            .lock()
            .map(|subs| {
                subs.get(job_id)
                    .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            })
            .unwrap_or(0)
    }
}

impl JobUpdateChannel for InMemoryJobChannel {
    fn subscribe(&self, job_id: &JobId) -> Subscription<JobUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();

        // If the lock is poisoned we still hand out a subscription;
        // it just never receives anything.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.entry(job_id.clone()).or_default().push(tx);
        }

        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tellmemo_core::JobStatus;

    #[tokio::test]
    async fn delivers_only_to_matching_job() {
        let channel = InMemoryJobChannel::new();
        let mut j1 = channel.subscribe(&JobId::from("j1"));
        let mut j2 = channel.subscribe(&JobId::from("j2"));

        let delivered = channel
            .publish(JobUpdate::new("j1", JobStatus::Processing).with_progress(0.5))
            .unwrap();
        assert_eq!(delivered, 1);

        let got = j1.recv().await.unwrap();
        assert_eq!(got.progress, 0.5);
        assert!(j2.try_recv().is_err());
    }

    #[tokio::test]
    async fn preserves_order_per_job() {
        let channel = InMemoryJobChannel::new();
        let mut sub = channel.subscribe(&JobId::from("j1"));

        for p in [0.1, 0.2, 0.3] {
            channel
                .publish(JobUpdate::new("j1", JobStatus::Processing).with_progress(p))
                .unwrap();
        }

        let mut seen = Vec::new();
        while let Ok(update) = sub.try_recv() {
            seen.push(update.progress);
        }
        assert_eq!(seen, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn dropped_subscriptions_are_pruned() {
        let channel = InMemoryJobChannel::new();
        let job = JobId::from("j1");
        let sub = channel.subscribe(&job);
        assert_eq!(channel.subscriber_count(&job), 1);

        drop(sub);
        assert_eq!(channel.subscriber_count(&job), 0);
        assert_eq!(channel.publish(JobUpdate::new("j1", JobStatus::Pending)).unwrap(), 0);
    }
}
