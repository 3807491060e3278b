//! Composition root.
//!
//! Every service the client needs is constructed here and handed out by
//! reference; nothing is reachable through a global.

use std::sync::Arc;

use thiserror::Error;
use tokio::runtime::Handle;

use tellmemo_core::Notifier;
use tellmemo_events::JobUpdateChannel;
use tellmemo_export::ExportService;

use crate::cache::CacheRegistry;
use crate::config::ClientConfig;
use crate::jobs::ProcessingJobs;
use crate::new_items::InMemoryNewItems;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("client context must be initialised inside a tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Channel(#[from] tellmemo_events::ChannelError),
}

pub struct ClientContext {
    config: ClientConfig,
    caches: Arc<CacheRegistry>,
    new_items: Arc<InMemoryNewItems>,
    notifier: Arc<dyn Notifier>,
    jobs: ProcessingJobs,
    exports: ExportService,
}

impl ClientContext {
    /// Wire up the services around an already-open job update channel.
    pub fn init(
        config: ClientConfig,
        channel: Arc<dyn JobUpdateChannel>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ContextError> {
        let runtime = Handle::try_current().map_err(|_| ContextError::NoRuntime)?;

        let caches = Arc::new(CacheRegistry::new());
        let new_items = Arc::new(InMemoryNewItems::new());
        let jobs = ProcessingJobs::with_runtime(
            runtime,
            channel,
            caches.clone(),
            new_items.clone(),
            config.tracker_config(),
        );
        let exports = ExportService::new(notifier.clone());

        tracing::info!(api_url = %config.api_url, "client context initialised");
        Ok(Self { config, caches, new_items, notifier, jobs, exports })
    }

    /// Open the job update socket from `config.ws_url`, then [`init`](Self::init).
    #[cfg(feature = "websocket")]
    pub async fn connect(
        config: ClientConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ContextError> {
        let channel = tellmemo_events::WsJobChannel::connect(&config.ws_url).await?;
        Self::init(config, Arc::new(channel), notifier)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn caches(&self) -> &Arc<CacheRegistry> {
        &self.caches
    }

    pub fn new_items(&self) -> &Arc<InMemoryNewItems> {
        &self.new_items
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn jobs(&self) -> &ProcessingJobs {
        &self.jobs
    }

    pub fn exports(&self) -> &ExportService {
        &self.exports
    }

    /// Tear down background work. The context is unusable afterwards.
    pub fn dispose(self) {
        self.jobs.dispose();
        tracing::info!("client context disposed");
    }
}
