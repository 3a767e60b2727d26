//! HubActor - Fans snapshots out to connected subscribers
//!
//! The hub owns the subscriber registry. Publishing is serialized through the
//! actor's command channel, so snapshots reach every subscriber in the order
//! they were produced and never interleave.
//!
//! ## Delivery
//!
//! ```text
//! publish(snapshot) → serialize once → try_send to every subscriber queue
//!                                          ├─ Ok      → delivered
//!                                          ├─ Full    → subscriber lagging, removed
//!                                          └─ Closed  → subscriber gone, removed
//! ```
//!
//! A subscriber never blocks the producer: its queue is bounded, and a
//! subscriber that cannot keep up is disconnected instead of buffered.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, error, instrument, trace, warn};

use crate::{Snapshot, config::HubConfig, util::format_bytes};

use super::messages::{Frame, HubCommand, HubError, SubscriberId};

/// Subscriber queues, `None` once the hub has stopped
type Registry = Arc<RwLock<Option<HashMap<SubscriberId, mpsc::Sender<Frame>>>>>;

type LatestSnapshot = Arc<RwLock<Option<Arc<Snapshot>>>>;

/// Actor that delivers published snapshots to all registered subscribers
pub struct HubActor {
    /// Command receiver
    command_rx: mpsc::Receiver<HubCommand>,

    /// Registered subscribers and their frame queues
    registry: Registry,

    /// Most recently published snapshot
    latest: LatestSnapshot,
}

impl HubActor {
    fn new(command_rx: mpsc::Receiver<HubCommand>, registry: Registry, latest: LatestSnapshot) -> Self {
        Self {
            command_rx,
            registry,
            latest,
        }
    }

    /// Run the actor's main loop
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting hub actor");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                HubCommand::Publish {
                    snapshot,
                    respond_to,
                } => {
                    let result = self.deliver(snapshot).await;
                    let _ = respond_to.send(result);
                }

                HubCommand::Shutdown => {
                    debug!("received shutdown command");
                    break;
                }
            }
        }

        // dropping the queues ends every subscriber stream
        self.registry.write().await.take();

        debug!("hub actor stopped");
    }

    async fn deliver(&self, snapshot: Snapshot) -> Result<usize, HubError> {
        let frame: Frame = match serde_json::to_string(&snapshot) {
            Ok(text) => Arc::from(text),
            Err(e) => {
                error!("failed to serialize snapshot: {e}");
                return Err(HubError::Serialization(e.to_string()));
            }
        };

        trace!("frame size: {}", format_bytes(frame.len() as u64));

        *self.latest.write().await = Some(Arc::new(snapshot));

        // Holding the write lock for the whole fan-out puts concurrent
        // registrations strictly before or after this frame.
        let mut registry = self.registry.write().await;
        let Some(subscribers) = registry.as_mut() else {
            return Err(HubError::Closed);
        };
        let mut delivered = 0;

        subscribers.retain(|id, queue| match queue.try_send(frame.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!("subscriber {id} is lagging behind, disconnecting");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("subscriber {id} is gone, removing");
                false
            }
        });

        trace!(
            "delivered snapshot to {delivered} subscribers ({} registered)",
            subscribers.len()
        );

        Ok(delivered)
    }
}

/// Receiving side of a registered subscriber
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    frames: mpsc::Receiver<Frame>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next frame, or `None` once the hub dropped this subscriber.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.frames.recv().await
    }

    /// Next frame if one is already queued
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.frames.try_recv().ok()
    }
}

/// Handle for the HubActor
///
/// Cheap to clone; every clone talks to the same actor and registry.
#[derive(Clone)]
pub struct HubHandle {
    /// Command sender (capacity 1: one publish queued behind the one in flight)
    sender: mpsc::Sender<HubCommand>,

    registry: Registry,

    latest: LatestSnapshot,

    next_id: Arc<AtomicU64>,

    /// Frames buffered per subscriber before it counts as lagging
    queue_capacity: usize,
}

impl HubHandle {
    /// Spawn a new hub actor
    pub fn spawn(config: &HubConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(1);
        let registry = Registry::new(RwLock::new(Some(HashMap::new())));
        let latest = LatestSnapshot::default();

        let actor = HubActor::new(cmd_rx, registry.clone(), latest.clone());

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            registry,
            latest,
            next_id: Arc::new(AtomicU64::new(1)),
            queue_capacity: config.queue_capacity.max(1),
        }
    }

    /// Register a new subscriber
    ///
    /// The subscriber receives every snapshot published after registration.
    pub async fn register(&self) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.queue_capacity);

        // checked under the lock the actor takes when it stops
        match self.registry.write().await.as_mut() {
            Some(subscribers) => {
                subscribers.insert(id, tx);
                debug!("subscriber {id} registered");
            }
            None => warn!("hub is not running, subscriber {id} will receive nothing"),
        }

        Subscription { id, frames: rx }
    }

    /// Remove a subscriber. Returns whether it was still registered.
    pub async fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self
            .registry
            .write()
            .await
            .as_mut()
            .is_some_and(|subscribers| subscribers.remove(&id).is_some());
        if removed {
            debug!("subscriber {id} unregistered");
        }
        removed
    }

    /// Publish a snapshot to all current subscribers
    ///
    /// Waits until any earlier publish has been delivered. Returns the number
    /// of subscribers the snapshot was handed to.
    pub async fn publish(&self, snapshot: Snapshot) -> Result<usize, HubError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HubCommand::Publish {
                snapshot,
                respond_to: tx,
            })
            .await
            .map_err(|_| HubError::Closed)?;

        rx.await.map_err(|_| HubError::Closed)?
    }

    /// Number of currently registered subscribers
    pub async fn active_count(&self) -> usize {
        self.registry.read().await.as_ref().map_or(0, HashMap::len)
    }

    /// Most recently published snapshot
    pub async fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest.read().await.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Shutdown the hub actor
    pub async fn shutdown(&self) {
        let _ = self.sender.send(HubCommand::Shutdown).await;
    }
}
