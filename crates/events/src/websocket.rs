//! WebSocket transport for job updates.
//!
//! One connection carries every job. A background task writes subscribe and
//! unsubscribe frames and fans decoded updates out through an
//! [`InMemoryJobChannel`].
//! When the socket closes the task ends and subscribers stop receiving;
//! reconnecting is left to whoever owns the channel.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use tellmemo_core::JobId;

use crate::channel::{ChannelError, JobUpdateChannel, Subscription};
use crate::frame::{ClientFrame, ServerFrame, decode_server_frame};
use crate::in_memory::InMemoryJobChannel;
use crate::update::JobUpdate;

pub struct WsJobChannel {
    fanout: Arc<InMemoryJobChannel>,
    outgoing: mpsc::UnboundedSender<ClientFrame>,
    task: JoinHandle<()>,
}

impl WsJobChannel {
    /// Open the socket and start the pump task.
    pub async fn connect(url: &str) -> Result<Self, ChannelError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        tracing::info!(url = %url, "job update socket connected");

        let (mut write, mut read) = stream.split();
        let (outgoing, mut commands) = mpsc::unbounded_channel::<ClientFrame>();
        let fanout = Arc::new(InMemoryJobChannel::new());
        let sink = fanout.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    command = commands.recv() => {
                        let Some(frame) = command else { break };
                        let text = match serde_json::to_string(&frame) {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::error!(error = %e, "failed to encode client frame");
                                continue;
                            }
                        };
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::warn!(error = %e, "job update socket write failed");
                            break;
                        }
                    }
                    incoming = read.next() => match incoming {
                        Some(Ok(Message::Text(text))) => match decode_server_frame(&text) {
                            Ok(ServerFrame::JobUpdate(update)) => {
                                if let Err(e) = sink.publish(update) {
                                    tracing::error!(error = %e, "failed to fan out job update");
                                }
                            }
                            Ok(ServerFrame::Other(kind)) => {
                                tracing::trace!(kind = %kind, "ignoring frame");
                            }
                            Err(e) => tracing::warn!(error = %e, "dropping undecodable frame"),
                        },
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "job update socket read failed");
                            break;
                        }
                    }
                }
            }
            tracing::info!("job update socket closed");
        });

        Ok(Self { fanout, outgoing, task })
    }

    /// Whether the pump task is still running.
    pub fn is_connected(&self) -> bool {
        !self.task.is_finished()
    }
}

impl JobUpdateChannel for WsJobChannel {
    fn subscribe(&self, job_id: &JobId) -> Subscription<JobUpdate> {
        let subscription = self.fanout.subscribe(job_id);
        if self
            .outgoing
            .send(ClientFrame::Subscribe { job_id: job_id.clone() })
            .is_err()
        {
            tracing::debug!(job_id = %job_id, "socket gone; subscription will stay silent");
            return subscription;
        }

        let outgoing = self.outgoing.clone();
        let job_id = job_id.clone();
        subscription.with_unsubscribe(move || {
            // Closed socket: the server has forgotten us already.
            let _ = outgoing.send(ClientFrame::Unsubscribe { job_id });
        })
    }
}

impl Drop for WsJobChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}
