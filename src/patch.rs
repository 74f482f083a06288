//! Patch files: a saved set of actors, their parameters, positions and
//! connections.
//!
//! Patches are stored as pretty JSON (`.agpatch`). Actor ids in a file are
//! only meaningful within that file; [`PatchFile::apply`] returns the mapping
//! to the ids of the actors it created.
//!
//! # Example
//!
//! ```ignore
//! let patch = PatchFile::capture(&system, "live set")?;
//! patch.save("live.agpatch")?;
//!
//! let restored = ActorSystem::new(config, ActorFactory::with_builtins());
//! let ids = PatchFile::load("live.agpatch")?.apply(&restored)?;
//! ```

use crate::capability::{parse_float, ConfigTree};
use crate::error::{ActorGraphError, Result};
use crate::graph::{ActorId, Connection};
use crate::system::{ActorMeta, ActorSystem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Patch file extension
pub const PATCH_FILE_EXTENSION: &str = "agpatch";

/// Current patch format version
pub const PATCH_VERSION: u32 = 1;

/// File actor id to live actor id.
pub type IdMap = HashMap<ActorId, ActorId>;

/// `xpos` and `ypos` as textual tokens, six decimals.
pub fn position_tokens(meta: &ActorMeta) -> [String; 2] {
    [format!("{:.6}", meta.xpos), format!("{:.6}", meta.ypos)]
}

/// Append an actor's position to a persisted record.
pub fn serialize_position(meta: &ActorMeta, record: &mut ConfigTree) {
    let [x, y] = position_tokens(meta);
    record.add_entry("xpos", x);
    record.add_entry("ypos", y);
}

/// Read an ordered `(xpos, ypos)` pair. Missing or malformed tokens read as 0.
pub fn deserialize_position<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> (f32, f32) {
    let x = tokens.next().map(parse_float).unwrap_or(0.0) as f32;
    let y = tokens.next().map(parse_float).unwrap_or(0.0) as f32;
    (x, y)
}

/// Read the position from a record written by [`serialize_position`]. Other
/// fields in the record are ignored.
pub fn position_from_record(record: &ConfigTree) -> (f32, f32) {
    let mut tokens = ["xpos", "ypos"]
        .into_iter()
        .map(|field| record.value_at(field).unwrap_or(""));
    deserialize_position(&mut tokens)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchActor {
    pub id: ActorId,
    pub kind: String,
    #[serde(default)]
    pub xpos: String,
    #[serde(default)]
    pub ypos: String,
    /// Parameter values in their textual form.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchFile {
    #[serde(default = "default_patch_version")]
    pub version: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub actors: Vec<PatchActor>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

fn default_patch_version() -> u32 {
    PATCH_VERSION
}

impl PatchFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: PATCH_VERSION,
            name: name.into(),
            saved_at: Utc::now(),
            actors: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Snapshot every live actor and connection of `system`.
    pub fn capture(system: &ActorSystem, name: impl Into<String>) -> Result<Self> {
        let mut patch = Self::new(name);

        for id in system.actor_ids()? {
            let meta = system.meta(id)?;
            let [xpos, ypos] = position_tokens(&meta);
            let parameters = system
                .parameters_of(id)?
                .iter()
                .map(|p| (p.name().to_string(), p.value().to_text()))
                .collect();

            patch.actors.push(PatchActor {
                id,
                kind: meta.kind,
                xpos,
                ypos,
                parameters,
            });
        }

        patch.connections = system.connections()?;
        Ok(patch)
    }

    /// Load a patch file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            ActorGraphError::Serialization(format!("Failed to parse patch {:?}: {}", path, e))
        })
    }

    /// Save patch file to disk as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Recreate the patch inside `system`.
    ///
    /// Actors of unknown kinds, unknown parameters and connections the graph
    /// rejects are logged and skipped; the rest of the patch still loads.
    pub fn apply(&self, system: &ActorSystem) -> Result<IdMap> {
        let mut ids = IdMap::new();

        for actor in &self.actors {
            let id = match system.create_actor(&actor.kind) {
                Ok(id) => id,
                Err(ActorGraphError::UnknownActorKind(kind)) => {
                    tracing::warn!("Patch '{}': skipping unknown actor kind '{}'", self.name, kind);
                    continue;
                }
                Err(e) => return Err(e),
            };
            ids.insert(actor.id, id);

            for (name, text) in &actor.parameters {
                if let Err(e) = system.store_parameter_text(id, name, text) {
                    tracing::warn!("Patch '{}': {} {}: {}", self.name, actor.kind, name, e);
                }
            }
            system.resync_parameters(id)?;

            let mut tokens = [actor.xpos.as_str(), actor.ypos.as_str()].into_iter();
            let (x, y) = deserialize_position(&mut tokens);
            system.set_position(id, x, y)?;
        }

        for c in &self.connections {
            let (Some(&source), Some(&target)) = (ids.get(&c.source), ids.get(&c.target)) else {
                tracing::warn!("Patch '{}': connection references a missing actor", self.name);
                continue;
            };
            if let Err(e) = system.add_connection(source, &c.source_slot, target, &c.target_slot) {
                tracing::warn!(
                    "Patch '{}': skipping connection {}.{} -> {}.{}: {}",
                    self.name,
                    c.source,
                    c.source_slot,
                    c.target,
                    c.target_slot,
                    e
                );
            }
        }

        tracing::info!(
            "Applied patch '{}': {} actor(s), {} connection(s)",
            self.name,
            ids.len(),
            self.connections.len()
        );
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_position_record_round_trip() {
        let mut meta = ActorMeta::new("Client", "Client 0");
        meta.xpos = 120.25;
        meta.ypos = -7.5;

        let mut record = ConfigTree::new("actor");
        record.add_entry("title", "Client 0");
        serialize_position(&meta, &mut record);
        record.add_entry("selected", "1");

        assert_eq!(record.value_at("xpos"), Some("120.250000"));
        assert_eq!(position_from_record(&record), (120.25, -7.5));
    }

    #[test]
    fn test_deserialize_position_tolerates_garbage() {
        assert_eq!(deserialize_position(&mut ["abc", "4.5"].into_iter()), (0.0, 4.5));
        assert_eq!(deserialize_position(&mut std::iter::empty()), (0.0, 0.0));
        assert_eq!(deserialize_position(&mut ["3"].into_iter()), (3.0, 0.0));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let json = r#"{
            "version": 1,
            "name": "x",
            "saved_at": "2024-01-01T00:00:00Z",
            "editor": {"zoom": 2},
            "actors": [{"id": 3, "kind": "Relay", "xpos": "1.0", "ypos": "2.0", "color": "red"}],
            "connections": []
        }"#;
        let patch: PatchFile = serde_json::from_str(json).unwrap();
        assert_eq!(patch.actors.len(), 1);
        assert_eq!(patch.actors[0].id, ActorId(3));
        assert!(patch.actors[0].parameters.is_empty());
    }

    proptest! {
        #[test]
        fn test_position_tokens_round_trip(x in -1.0e5f32..1.0e5, y in -1.0e5f32..1.0e5) {
            let mut meta = ActorMeta::new("Relay", "r");
            meta.xpos = x;
            meta.ypos = y;
            let tokens = position_tokens(&meta);
            let (rx, ry) = deserialize_position(&mut tokens.iter().map(String::as_str));
            prop_assert!((rx - x).abs() <= 1e-3 + x.abs() * 1e-6);
            prop_assert!((ry - y).abs() <= 1e-3 + y.abs() * 1e-6);
        }
    }
}
