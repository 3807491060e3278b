//! `tellmemo-client`
//!
//! **Responsibility:** client-side state that sits between the backend and
//! the UI.
//!
//! This crate provides:
//! - Background job tracking driven by the job update channel
//! - Read-cache invalidation fan-out when jobs complete
//! - "New item" highlighting
//! - Configuration and the composition root that wires it all together
//!
//! The backend remains the authority; everything here is disposable state.

pub mod cache;
pub mod config;
pub mod context;
pub mod fanout;
pub mod jobs;
pub mod new_items;

pub use cache::{CacheKey, CacheRegistry, Invalidate, ReadCache};
pub use config::{ClientConfig, ConfigError};
pub use context::{ClientContext, ContextError};
pub use jobs::{DEFAULT_EVICTION_DELAY, ProcessingJobs, TrackerConfig};
pub use new_items::{InMemoryNewItems, NewItemsTracker};
