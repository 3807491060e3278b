//! Job status events and the channel abstraction that delivers them.

pub mod channel;
pub mod frame;
pub mod in_memory;
pub mod update;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use channel::{ChannelError, JobUpdateChannel, Subscription};
pub use frame::{ClientFrame, ServerFrame, decode_server_frame};
pub use in_memory::InMemoryJobChannel;
pub use update::{DecodeError, JobUpdate};

#[cfg(feature = "websocket")]
pub use websocket::WsJobChannel;
