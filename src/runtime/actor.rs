//! The behaviour seam every actor kind implements.

use crate::dispatch::Dispatcher;
use crate::graph::ActorId;
use crate::runtime::message::{Message, Outcome, Payload};

/// Behaviour of one actor kind.
///
/// A handler owns its live resources (sockets, devices) exclusively and is
/// only ever driven from its actor's own thread, one message at a time.
pub trait ActorHandler: Send {
    /// Capability text in the tree grammar, or `None` for an actor with no
    /// parameters and no slots.
    fn capabilities(&self) -> Option<&str>;

    /// Process one message. The runtime has already filtered out messages
    /// that are invalid for the current lifecycle state.
    fn handle(&mut self, msg: Message, ctx: &mut ActorContext) -> Outcome;

    /// Drain payloads that arrived on resources the actor owns. Called after
    /// every wake-up; each payload is handled as `Data { slot: None }`.
    fn poll_inbound(&mut self) -> Vec<Payload> {
        Vec::new()
    }
}

/// What a handler can see of and do with the rest of the system.
#[derive(Debug, Clone)]
pub struct ActorContext {
    id: ActorId,
    title: String,
    first_output: Option<String>,
    dispatcher: Dispatcher,
}

impl ActorContext {
    pub fn new(
        id: ActorId,
        title: impl Into<String>,
        first_output: Option<String>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            first_output,
            dispatcher,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Label of the output that `Outcome::Forward` uses.
    pub fn first_output(&self) -> Option<&str> {
        self.first_output.as_deref()
    }

    /// Send `payload` on one of this actor's outputs. Returns the number of
    /// targets reached.
    pub fn emit(&self, slot: &str, payload: Payload) -> usize {
        self.dispatcher.send(self.id, slot, payload)
    }

    /// Send `payload` on the first output, if the actor has one.
    pub fn forward(&self, payload: Payload) -> usize {
        match &self.first_output {
            Some(slot) => self.emit(slot, payload),
            None => {
                tracing::trace!("{} has no output to forward to", self.id);
                0
            }
        }
    }
}
