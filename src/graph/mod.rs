//! Directed slot-connection graph.
//!
//! Nodes are actors, edges connect one actor's output slot to another actor's
//! input slot. The graph enforces:
//!
//! - both endpoints exist,
//! - the source label is a declared output and the target label a declared input,
//! - the slot types are compatible (equal, or either side is `Any`),
//! - no two connections are structurally equal.
//!
//! Cycles are allowed. Fan-in and fan-out are unbounded.

pub mod error;
pub mod id;

pub use error::{GraphError, GraphResult};
pub use id::{ActorId, ActorIdAllocator};

use crate::capability::{CapabilityDescriptor, SlotDirection, SlotInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A directed edge from an output slot to an input slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub source: ActorId,
    pub source_slot: String,
    pub target: ActorId,
    pub target_slot: String,
}

impl Connection {
    pub fn new(
        source: ActorId,
        source_slot: impl Into<String>,
        target: ActorId,
        target_slot: impl Into<String>,
    ) -> Self {
        Self {
            source,
            source_slot: source_slot.into(),
            target,
            target_slot: target_slot.into(),
        }
    }

    /// Whether `actor` is either endpoint.
    pub fn involves(&self, actor: ActorId) -> bool {
        self.source == actor || self.target == actor
    }
}

/// Per-actor slot declarations as seen by the graph.
#[derive(Debug, Clone)]
struct ActorNode {
    title: String,
    inputs: Vec<SlotInfo>,
    outputs: Vec<SlotInfo>,
}

impl ActorNode {
    fn slot(&self, direction: SlotDirection, label: &str) -> Option<&SlotInfo> {
        let slots = match direction {
            SlotDirection::Input => &self.inputs,
            SlotDirection::Output => &self.outputs,
        };
        slots.iter().find(|s| s.label == label)
    }
}

/// The set of actors and the connections between their slots.
#[derive(Debug, Default)]
pub struct ConnectionGraph {
    actors: HashMap<ActorId, ActorNode>,
    connections: Vec<Connection>,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor with the slots its descriptor declares.
    pub fn add_actor(&mut self, id: ActorId, title: &str, descriptor: &CapabilityDescriptor) {
        self.actors.insert(
            id,
            ActorNode {
                title: title.to_string(),
                inputs: descriptor.input_slots().to_vec(),
                outputs: descriptor.output_slots().to_vec(),
            },
        );
    }

    pub fn contains_actor(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Title an actor was registered with.
    pub fn title(&self, id: ActorId) -> Option<&str> {
        self.actors.get(&id).map(|n| n.title.as_str())
    }

    /// Connect `source.source_slot` (an output) to `target.target_slot` (an input).
    pub fn add_connection(
        &mut self,
        source: ActorId,
        source_slot: &str,
        target: ActorId,
        target_slot: &str,
    ) -> GraphResult<Connection> {
        let out = self.resolve(source, SlotDirection::Output, source_slot)?;
        let inp = self.resolve(target, SlotDirection::Input, target_slot)?;

        if !out.slot_type.is_compatible(inp.slot_type) {
            return Err(GraphError::IncompatibleSlotType {
                source_type: out.slot_type,
                target_type: inp.slot_type,
            });
        }

        let connection = Connection::new(source, source_slot, target, target_slot);
        if self.connections.contains(&connection) {
            return Err(GraphError::DuplicateConnection);
        }

        tracing::debug!(
            "Connected {:?}.{} -> {:?}.{}",
            source,
            source_slot,
            target,
            target_slot
        );
        self.connections.push(connection.clone());
        Ok(connection)
    }

    /// Remove the first structurally equal connection. Returns whether one was
    /// removed; absence is not an error.
    pub fn remove_connection(&mut self, connection: &Connection) -> bool {
        match self.connections.iter().position(|c| c == connection) {
            Some(index) => {
                self.connections.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove an actor and every connection touching it. Returns the number of
    /// connections removed.
    pub fn remove_actor(&mut self, id: ActorId) -> usize {
        self.actors.remove(&id);
        let before = self.connections.len();
        self.connections.retain(|c| !c.involves(id));
        let removed = before - self.connections.len();
        if removed > 0 {
            tracing::debug!("Removed {} connection(s) of {:?}", removed, id);
        }
        removed
    }

    /// All connections, in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connections where `id` is source or target.
    pub fn connections_of(&self, id: ActorId) -> Vec<Connection> {
        self.connections
            .iter()
            .filter(|c| c.involves(id))
            .cloned()
            .collect()
    }

    /// Routing lookup: every `(target, target_slot)` fed by `source.source_slot`.
    pub fn targets(&self, source: ActorId, source_slot: &str) -> Vec<(ActorId, String)> {
        self.connections
            .iter()
            .filter(|c| c.source == source && c.source_slot == source_slot)
            .map(|c| (c.target, c.target_slot.clone()))
            .collect()
    }

    fn resolve(
        &self,
        actor: ActorId,
        direction: SlotDirection,
        label: &str,
    ) -> GraphResult<&SlotInfo> {
        let node = self
            .actors
            .get(&actor)
            .ok_or(GraphError::UnknownActor(actor))?;
        node.slot(direction, label)
            .ok_or_else(|| GraphError::UnknownSlot {
                actor,
                direction,
                label: label.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::SlotType;
    use proptest::prelude::*;

    fn descriptor(inputs: &[(&str, &str)], outputs: &[(&str, &str)]) -> CapabilityDescriptor {
        let mut text = String::new();
        for (section, entry, slots) in [("inputs", "input", inputs), ("outputs", "output", outputs)] {
            if slots.is_empty() {
                continue;
            }
            text.push_str(section);
            text.push('\n');
            for (label, ty) in slots {
                text.push_str(&format!(
                    "    {}\n        type = \"{}\"\n        name = \"{}\"\n",
                    entry, ty, label
                ));
            }
        }
        CapabilityDescriptor::from_text(Some(&text)).unwrap()
    }

    fn add(g: &mut ConnectionGraph, id: u32, inputs: &[(&str, &str)], outputs: &[(&str, &str)]) {
        g.add_actor(ActorId(id), "test", &descriptor(inputs, outputs));
    }

    #[test]
    fn test_equal_types_connect() {
        let mut g = ConnectionGraph::new();
        add(&mut g, 0, &[], &[("out", "OSC")]);
        add(&mut g, 1, &[("in", "OSC")], &[]);
        let c = g.add_connection(ActorId(0), "out", ActorId(1), "in").unwrap();
        assert_eq!(c, Connection::new(ActorId(0), "out", ActorId(1), "in"));
        assert_eq!(g.connections().len(), 1);
    }

    #[test]
    fn test_incompatible_types_rejected() {
        let mut g = ConnectionGraph::new();
        add(&mut g, 0, &[], &[("out", "Int")]);
        add(&mut g, 1, &[("in", "Position")], &[]);
        let err = g.add_connection(ActorId(0), "out", ActorId(1), "in").unwrap_err();
        assert_eq!(
            err,
            GraphError::IncompatibleSlotType {
                source_type: SlotType::Int,
                target_type: SlotType::Position,
            }
        );
        assert!(g.connections().is_empty());
    }

    #[test]
    fn test_any_connects_with_everything() {
        let mut g = ConnectionGraph::new();
        add(&mut g, 0, &[], &[("any", "Any"), ("mat", "Matrix")]);
        add(&mut g, 1, &[("rot", "Rotation"), ("any", "Any")], &[]);
        assert!(g.add_connection(ActorId(0), "any", ActorId(1), "rot").is_ok());
        assert!(g.add_connection(ActorId(0), "mat", ActorId(1), "any").is_ok());
    }

    #[test]
    fn test_unknown_slot_and_direction() {
        let mut g = ConnectionGraph::new();
        add(&mut g, 0, &[("in", "OSC")], &[("out", "OSC")]);
        add(&mut g, 1, &[("in", "OSC")], &[]);
        // "in" is an input of actor 0, not an output.
        let err = g.add_connection(ActorId(0), "in", ActorId(1), "in").unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnknownSlot {
                direction: SlotDirection::Output,
                ..
            }
        ));
        let err = g.add_connection(ActorId(0), "out", ActorId(1), "missing").unwrap_err();
        assert!(matches!(err, GraphError::UnknownSlot { .. }));
        let err = g.add_connection(ActorId(0), "out", ActorId(7), "in").unwrap_err();
        assert_eq!(err, GraphError::UnknownActor(ActorId(7)));
    }

    #[test]
    fn test_duplicate_rejected_and_length_unchanged() {
        let mut g = ConnectionGraph::new();
        add(&mut g, 0, &[], &[("out", "OSC")]);
        add(&mut g, 1, &[("in", "OSC")], &[]);
        g.add_connection(ActorId(0), "out", ActorId(1), "in").unwrap();
        let err = g.add_connection(ActorId(0), "out", ActorId(1), "in").unwrap_err();
        assert_eq!(err, GraphError::DuplicateConnection);
        assert_eq!(g.connections().len(), 1);
    }

    #[test]
    fn test_remove_connection_is_noop_when_absent() {
        let mut g = ConnectionGraph::new();
        add(&mut g, 0, &[], &[("out", "OSC")]);
        add(&mut g, 1, &[("in", "OSC")], &[]);
        let c = g.add_connection(ActorId(0), "out", ActorId(1), "in").unwrap();
        assert!(g.remove_connection(&c));
        assert!(!g.remove_connection(&c));
        assert!(g.connections().is_empty());
    }

    #[test]
    fn test_cycles_allowed() {
        let mut g = ConnectionGraph::new();
        add(&mut g, 0, &[("in", "OSC")], &[("out", "OSC")]);
        add(&mut g, 1, &[("in", "OSC")], &[("out", "OSC")]);
        g.add_connection(ActorId(0), "out", ActorId(1), "in").unwrap();
        g.add_connection(ActorId(1), "out", ActorId(0), "in").unwrap();
        g.add_connection(ActorId(0), "out", ActorId(0), "in").unwrap();
        assert_eq!(g.connections().len(), 3);
    }

    #[test]
    fn test_targets_fan_out() {
        let mut g = ConnectionGraph::new();
        add(&mut g, 0, &[], &[("out", "OSC")]);
        add(&mut g, 1, &[("in", "OSC")], &[]);
        add(&mut g, 2, &[("in", "OSC")], &[]);
        g.add_connection(ActorId(0), "out", ActorId(1), "in").unwrap();
        g.add_connection(ActorId(0), "out", ActorId(2), "in").unwrap();
        let targets = g.targets(ActorId(0), "out");
        assert_eq!(
            targets,
            vec![(ActorId(1), "in".to_string()), (ActorId(2), "in".to_string())]
        );
        assert!(g.targets(ActorId(1), "out").is_empty());
    }

    #[test]
    fn test_remove_actor_drops_its_connections() {
        let mut g = ConnectionGraph::new();
        for id in 0..3 {
            add(&mut g, id, &[("in", "OSC")], &[("out", "OSC")]);
        }
        g.add_connection(ActorId(0), "out", ActorId(1), "in").unwrap();
        g.add_connection(ActorId(1), "out", ActorId(2), "in").unwrap();
        g.add_connection(ActorId(2), "out", ActorId(0), "in").unwrap();
        g.add_connection(ActorId(0), "out", ActorId(2), "in").unwrap();

        assert_eq!(g.remove_actor(ActorId(1)), 2);
        assert!(!g.contains_actor(ActorId(1)));
        assert_eq!(g.connections().len(), 2);
        assert!(g.connections().iter().all(|c| !c.involves(ActorId(1))));
    }

    proptest! {
        #[test]
        fn test_remove_actor_removes_exactly_its_edges(
            edges in prop::collection::vec((0u32..6, 0u32..6), 0..40),
            order in Just((0u32..6).collect::<Vec<_>>()).prop_shuffle(),
        ) {
            let mut g = ConnectionGraph::new();
            for id in 0..6 {
                add(&mut g, id, &[("in", "Any")], &[("out", "Any")]);
            }
            for (s, t) in &edges {
                let _ = g.add_connection(ActorId(*s), "out", ActorId(*t), "in");
            }

            for id in order {
                let expected = g.connections().iter().filter(|c| c.involves(ActorId(id))).count();
                let survivors: Vec<_> = g
                    .connections()
                    .iter()
                    .filter(|c| !c.involves(ActorId(id)))
                    .cloned()
                    .collect();

                prop_assert_eq!(g.remove_actor(ActorId(id)), expected);
                prop_assert_eq!(g.connections(), survivors.as_slice());
            }
            prop_assert!(g.connections().is_empty());
        }
    }
}
