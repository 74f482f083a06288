//! Message routing between actors.
//!
//! The dispatcher resolves an `(actor, output slot)` pair to its connected
//! targets under the shared read lock, then enqueues one `Data` message per
//! target into that target's mailbox. Ordering per target follows from each
//! actor having a single FIFO channel.

use crate::graph::ActorId;
use crate::runtime::message::{ApiMessage, Message, Payload};
use crate::system::state::SharedHandle;
use crossbeam_channel::{SendTimeoutError, Sender};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

type MailboxRegistry = Arc<RwLock<HashMap<ActorId, Sender<Message>>>>;

/// Cheap-to-clone routing handle given to every actor context.
#[derive(Clone)]
pub struct Dispatcher {
    state: SharedHandle,
    mailboxes: MailboxRegistry,
    enqueue_timeout: Duration,
}

impl Dispatcher {
    pub fn new(state: SharedHandle, enqueue_timeout: Duration) -> Self {
        Self {
            state,
            mailboxes: Arc::new(RwLock::new(HashMap::new())),
            enqueue_timeout,
        }
    }

    /// Make `id` reachable.
    pub fn register(&self, id: ActorId, mailbox: Sender<Message>) {
        match self.mailboxes.write() {
            Ok(mut boxes) => {
                boxes.insert(id, mailbox);
            }
            Err(e) => tracing::warn!("Mailbox registry poisoned, cannot register {}: {}", id, e),
        }
    }

    /// Stop accepting messages for `id`. Returns its sender so the caller can
    /// still deliver a final message.
    pub fn unregister(&self, id: ActorId) -> Option<Sender<Message>> {
        match self.mailboxes.write() {
            Ok(mut boxes) => boxes.remove(&id),
            Err(e) => {
                tracing::warn!("Mailbox registry poisoned, cannot unregister {}: {}", id, e);
                None
            }
        }
    }

    pub fn is_registered(&self, id: ActorId) -> bool {
        self.mailboxes
            .read()
            .map(|boxes| boxes.contains_key(&id))
            .unwrap_or(false)
    }

    /// Deliver `payload` to every input connected to `source.slot`. Returns the
    /// number of mailboxes that accepted it.
    pub fn send(&self, source: ActorId, slot: &str, payload: Payload) -> usize {
        let targets = match self.state.read() {
            Ok(state) => state.graph.targets(source, slot),
            Err(e) => {
                tracing::warn!("Shared state poisoned, dropping message from {}: {}", source, e);
                return 0;
            }
        };

        if targets.is_empty() {
            tracing::trace!("{}.{} has no connections", source, slot);
            return 0;
        }

        let delivered = targets
            .into_iter()
            .filter(|(target, target_slot)| {
                self.deliver(*target, Message::data(target_slot.as_str(), payload.clone()))
            })
            .count();

        tracing::trace!("{}.{} delivered to {} target(s)", source, slot, delivered);
        delivered
    }

    /// Deliver an API message to `target`.
    pub fn send_api(&self, target: ActorId, message: ApiMessage) -> bool {
        tracing::debug!("API {} -> {}", message, target);
        self.deliver(target, Message::Api(message))
    }

    /// Enqueue any message into `target`'s mailbox, waiting at most the
    /// enqueue timeout. Undeliverable messages are dropped.
    pub fn deliver(&self, target: ActorId, message: Message) -> bool {
        let mailbox = match self.mailboxes.read() {
            Ok(boxes) => boxes.get(&target).cloned(),
            Err(e) => {
                tracing::warn!("Mailbox registry poisoned: {}", e);
                None
            }
        };

        let Some(mailbox) = mailbox else {
            tracing::debug!("Dropping {} for {}: no mailbox", message.kind(), target);
            return false;
        };

        match mailbox.send_timeout(message, self.enqueue_timeout) {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(msg)) => {
                tracing::debug!("Dropping {} for {}: mailbox full", msg.kind(), target);
                false
            }
            Err(SendTimeoutError::Disconnected(msg)) => {
                tracing::debug!("Dropping {} for {}: mailbox closed", msg.kind(), target);
                false
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("enqueue_timeout", &self.enqueue_timeout)
            .finish_non_exhaustive()
    }
}
