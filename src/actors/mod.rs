//! Built-in actor kinds and the factory that instantiates them by name.

pub mod client;
pub mod modplayer;
pub mod natnet;
pub mod osc;
pub mod relay;

pub use client::ClientActor;
pub use modplayer::{AudioBackend, AudioDevice, ModPlayerActor, NullAudioBackend};
pub use natnet::NatNetActor;
pub use relay::RelayActor;

use crate::runtime::ActorHandler;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Constructor for one actor kind.
pub type ActorConstructor = Arc<dyn Fn() -> Box<dyn ActorHandler> + Send + Sync>;

/// Registry of actor kinds keyed by their type name.
#[derive(Clone, Default)]
pub struct ActorFactory {
    kinds: BTreeMap<String, ActorConstructor>,
}

impl ActorFactory {
    /// Factory with no kinds registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with `Client`, `NatNet`, `ModPlayer` and `Relay`.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register("Client", || Box::new(ClientActor::new()));
        factory.register("NatNet", || Box::new(NatNetActor::new()));
        factory.register("ModPlayer", || Box::new(ModPlayerActor::default()));
        factory.register("Relay", || Box::new(RelayActor::new()));
        factory
    }

    /// Register or replace a kind.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn ActorHandler> + Send + Sync + 'static,
    {
        self.kinds.insert(kind.into(), Arc::new(constructor));
    }

    pub fn create(&self, kind: &str) -> Option<Box<dyn ActorHandler>> {
        self.kinds.get(kind).map(|construct| construct())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ActorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
