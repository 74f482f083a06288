//! State shared between the actor system facade and the dispatcher.

use crate::capability::CapabilityDescriptor;
use crate::error::{ActorGraphError, Result};
use crate::graph::{ActorId, ConnectionGraph};
use crate::params::ParameterStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Editor-facing attributes of an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorMeta {
    pub kind: String,
    pub title: String,
    pub xpos: f32,
    pub ypos: f32,
    #[serde(skip)]
    pub selected: bool,
}

impl ActorMeta {
    pub fn new(kind: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            xpos: 0.0,
            ypos: 0.0,
            selected: false,
        }
    }
}

/// Everything the system knows about one live actor besides its thread.
#[derive(Debug, Clone)]
pub struct ActorRecord {
    pub meta: ActorMeta,
    pub descriptor: CapabilityDescriptor,
    pub params: ParameterStore,
}

/// Graph and per-actor records, guarded together by one lock.
#[derive(Debug, Default)]
pub struct SharedState {
    pub graph: ConnectionGraph,
    actors: HashMap<ActorId, ActorRecord>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor in the graph and the record table.
    pub fn insert(&mut self, id: ActorId, record: ActorRecord) {
        self.graph.add_actor(id, &record.meta.title, &record.descriptor);
        self.actors.insert(id, record);
    }

    /// Remove an actor, its record and all its connections.
    pub fn remove(&mut self, id: ActorId) -> Option<ActorRecord> {
        self.graph.remove_actor(id);
        self.actors.remove(&id)
    }

    pub fn record(&self, id: ActorId) -> Result<&ActorRecord> {
        self.actors.get(&id).ok_or(ActorGraphError::UnknownActor(id))
    }

    pub fn record_mut(&mut self, id: ActorId) -> Result<&mut ActorRecord> {
        self.actors
            .get_mut(&id)
            .ok_or(ActorGraphError::UnknownActor(id))
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Live actor ids in ascending order.
    pub fn ids(&self) -> Vec<ActorId> {
        let mut ids: Vec<_> = self.actors.keys().copied().collect();
        ids.sort();
        ids
    }
}

pub type SharedHandle = Arc<RwLock<SharedState>>;

pub fn read_state(state: &SharedHandle) -> Result<RwLockReadGuard<'_, SharedState>> {
    state
        .read()
        .map_err(|e| ActorGraphError::Lock(e.to_string()))
}

pub fn write_state(state: &SharedHandle) -> Result<RwLockWriteGuard<'_, SharedState>> {
    state
        .write()
        .map_err(|e| ActorGraphError::Lock(e.to_string()))
}
