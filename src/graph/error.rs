//! Connection graph errors.

use crate::capability::slot::{SlotDirection, SlotType};
use crate::graph::id::ActorId;
use thiserror::Error;

/// Reasons a graph mutation is rejected. The graph is unchanged on any error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown actor {0:?}")]
    UnknownActor(ActorId),

    #[error("Actor {actor:?} has no {direction:?} slot '{label}'")]
    UnknownSlot {
        actor: ActorId,
        direction: SlotDirection,
        label: String,
    },

    #[error("Incompatible slot types: {source_type} -> {target_type}")]
    IncompatibleSlotType {
        source_type: SlotType,
        target_type: SlotType,
    },

    #[error("Connection already exists")]
    DuplicateConnection,
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
