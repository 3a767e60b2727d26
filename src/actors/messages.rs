//! Message types for actor communication
//!
//! ## Design Principles
//!
//! 1. **Commands**: Request/response messages sent to the hub actor via mpsc
//! 2. **Frames**: A snapshot is serialized once and shared by every subscriber queue
//! 3. **Immutability**: Frames are reference counted and never mutated after creation

use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::Snapshot;

/// One serialized snapshot, shared by all subscriber queues
pub type Frame = Arc<str>;

/// Opaque identifier of a registered subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(pub(crate) u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Commands that can be sent to the HubActor
#[derive(Debug)]
pub enum HubCommand {
    /// Deliver a snapshot to every currently registered subscriber
    ///
    /// The response carries the number of subscribers the frame was handed to.
    Publish {
        snapshot: Snapshot,
        respond_to: oneshot::Sender<Result<usize, HubError>>,
    },

    /// Gracefully shut down the hub
    ///
    /// Registered subscribers are dropped, which ends their streams.
    Shutdown,
}

/// Errors reported by the broadcast hub
#[derive(Debug)]
pub enum HubError {
    /// The snapshot could not be encoded; nothing was delivered
    Serialization(String),

    /// The hub actor is no longer running
    Closed,
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubError::Serialization(msg) => write!(f, "failed to serialize snapshot: {}", msg),
            HubError::Closed => write!(f, "broadcast hub is not running"),
        }
    }
}

impl std::error::Error for HubError {}
