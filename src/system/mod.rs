//! The actor system facade.
//!
//! `ActorSystem` is what an editor (or the binary) talks to: it creates and
//! destroys actors, routes parameter edits to them as API messages, and owns
//! the connection graph. Every method takes `&self`; structural state lives
//! behind one `RwLock` shared with the [`Dispatcher`].

pub mod state;

pub use state::{ActorMeta, ActorRecord, SharedHandle, SharedState};

use crate::actors::ActorFactory;
use crate::capability::{CapabilityDescriptor, ParamValue};
use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::error::{ActorGraphError, Result, ResultExt};
use crate::graph::{ActorId, ActorIdAllocator, Connection};
use crate::params::{ParamResult, ParameterStore};
use crate::runtime::{worker, ActorContext, ActorRuntime, ApiMessage, Message, Payload};
use crossbeam_channel::bounded;
use state::{read_state, write_state};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};

pub struct ActorSystem {
    config: AppConfig,
    factory: ActorFactory,
    state: SharedHandle,
    dispatcher: Dispatcher,
    ids: ActorIdAllocator,
    threads: Mutex<HashMap<ActorId, JoinHandle<()>>>,
}

impl ActorSystem {
    pub fn new(config: AppConfig, factory: ActorFactory) -> Self {
        let state = Arc::new(RwLock::new(SharedState::new()));
        let dispatcher = Dispatcher::new(state.clone(), config.runtime.enqueue_timeout());
        Self {
            config,
            factory,
            state,
            dispatcher,
            ids: ActorIdAllocator::new(),
            threads: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn factory(&self) -> &ActorFactory {
        &self.factory
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    // ── Lifecycle ──

    /// Instantiate an actor of `kind` and start its thread. `Init` is the
    /// first message it processes.
    pub fn create_actor(&self, kind: &str) -> Result<ActorId> {
        let handler = self
            .factory
            .create(kind)
            .ok_or_else(|| ActorGraphError::UnknownActorKind(kind.to_string()))?;

        let descriptor = CapabilityDescriptor::from_text(handler.capabilities())
            .with_context(|| format!("Invalid capabilities for {}", kind))?;
        let params =
            ParameterStore::from_descriptor(&descriptor, self.config.parameters.max_string_len);

        let id = self.ids.next_id().ok_or(ActorGraphError::IdsExhausted)?;
        let title = format!("{} {}", kind, id.0);
        let first_output = descriptor.output_slots().first().map(|s| s.label.clone());

        write_state(&self.state)?.insert(
            id,
            ActorRecord {
                meta: ActorMeta::new(kind, title.clone()),
                descriptor,
                params,
            },
        );

        let (tx, rx) = bounded(self.config.runtime.mailbox_capacity.max(1));
        self.dispatcher.register(id, tx);

        let ctx = ActorContext::new(id, title, first_output, self.dispatcher.clone());
        let runtime = ActorRuntime::new(handler, ctx);
        match worker::spawn(runtime, rx, self.config.runtime.timer_interval()) {
            Ok(handle) => {
                self.lock_threads()?.insert(id, handle);
            }
            Err(e) => {
                self.dispatcher.unregister(id);
                write_state(&self.state)?.remove(id);
                return Err(ActorGraphError::Spawn(e.to_string()));
            }
        }

        tracing::info!("Created actor {} ({})", id, kind);
        Ok(id)
    }

    /// Stop an actor, release its resources and remove it with all of its
    /// connections.
    ///
    /// The mailbox is unregistered first so nothing new reaches the actor.
    /// Joining is skipped when called from the actor's own thread.
    pub fn destroy_actor(&self, id: ActorId) -> Result<()> {
        if !read_state(&self.state)?.contains(id) {
            return Err(ActorGraphError::UnknownActor(id));
        }

        if let Some(mailbox) = self.dispatcher.unregister(id) {
            // A full mailbox still ends in Destroy once the sender is dropped.
            let _ = mailbox.try_send(Message::Destroy);
        }

        let handle = self.lock_threads()?.remove(&id);
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                tracing::debug!("{} destroyed from its own thread, not joining", id);
            } else if handle.join().is_err() {
                tracing::warn!("Actor {} thread panicked", id);
            }
        }

        let mut state = write_state(&self.state)?;
        let removed = state.graph.connections_of(id).len();
        state.remove(id);
        tracing::info!("Destroyed actor {} ({} connection(s) removed)", id, removed);
        Ok(())
    }

    /// Destroy every actor.
    pub fn shutdown(&self) {
        let ids = match read_state(&self.state) {
            Ok(state) => state.ids(),
            Err(e) => {
                tracing::warn!("Cannot shut down cleanly: {}", e);
                return;
            }
        };

        for id in ids {
            if let Err(e) = self.destroy_actor(id) {
                tracing::warn!("Failed to destroy {}: {}", id, e);
            }
        }
    }

    pub fn actor_ids(&self) -> Result<Vec<ActorId>> {
        Ok(read_state(&self.state)?.ids())
    }

    pub fn actor_count(&self) -> Result<usize> {
        Ok(read_state(&self.state)?.ids().len())
    }

    pub fn contains(&self, id: ActorId) -> Result<bool> {
        Ok(read_state(&self.state)?.contains(id))
    }

    // ── Parameters ──

    /// Store an edited value and, if it changed and the parameter declares an
    /// API call, send the API message to the actor. Returns whether it changed.
    pub fn on_parameter_edited(&self, id: ActorId, name: &str, value: ParamValue) -> Result<bool> {
        self.update_parameter(id, name, |store| store.set(name, value))
    }

    /// Like [`on_parameter_edited`](Self::on_parameter_edited), parsing `text`
    /// with the parameter's kind.
    pub fn on_parameter_text(&self, id: ActorId, name: &str, text: &str) -> Result<bool> {
        self.update_parameter(id, name, |store| store.set_from_text(name, text))
    }

    /// Store a value parsed from `text` without notifying the actor. Used when
    /// loading patches, followed by [`resync_parameters`](Self::resync_parameters).
    pub fn store_parameter_text(&self, id: ActorId, name: &str, text: &str) -> Result<bool> {
        let mut state = write_state(&self.state)?;
        Ok(state.record_mut(id)?.params.set_from_text(name, text)?)
    }

    fn update_parameter<F>(&self, id: ActorId, name: &str, update: F) -> Result<bool>
    where
        F: FnOnce(&mut ParameterStore) -> ParamResult<bool>,
    {
        let mut state = write_state(&self.state)?;
        let record = state.record_mut(id)?;
        if !update(&mut record.params)? {
            return Ok(false);
        }

        // Enqueue under the guard so mailbox order matches store order.
        if let Some(message) = record.params.api_message(name) {
            self.dispatcher.send_api(id, message);
        }
        Ok(true)
    }

    /// Send the current value of every API-bearing parameter to the actor.
    /// Returns the number of messages delivered.
    pub fn resync_parameters(&self, id: ActorId) -> Result<usize> {
        let state = read_state(&self.state)?;
        let messages = state.record(id)?.params.api_messages();
        Ok(messages
            .into_iter()
            .filter(|m| self.dispatcher.send_api(id, m.clone()))
            .count())
    }

    /// Send an arbitrary API message to an actor.
    pub fn send_api(&self, id: ActorId, message: ApiMessage) -> bool {
        self.dispatcher.send_api(id, message)
    }

    pub fn capabilities_of(&self, id: ActorId) -> Result<CapabilityDescriptor> {
        Ok(read_state(&self.state)?.record(id)?.descriptor.clone())
    }

    pub fn parameters_of(&self, id: ActorId) -> Result<ParameterStore> {
        Ok(read_state(&self.state)?.record(id)?.params.clone())
    }

    pub fn parameter(&self, id: ActorId, name: &str) -> Result<Option<ParamValue>> {
        Ok(read_state(&self.state)?.record(id)?.params.get(name).cloned())
    }

    // ── Graph ──

    pub fn add_connection(
        &self,
        source: ActorId,
        source_slot: &str,
        target: ActorId,
        target_slot: &str,
    ) -> Result<Connection> {
        let mut state = write_state(&self.state)?;
        Ok(state
            .graph
            .add_connection(source, source_slot, target, target_slot)?)
    }

    pub fn remove_connection(&self, connection: &Connection) -> Result<bool> {
        Ok(write_state(&self.state)?.graph.remove_connection(connection))
    }

    pub fn connections_of(&self, id: ActorId) -> Result<Vec<Connection>> {
        Ok(read_state(&self.state)?.graph.connections_of(id))
    }

    pub fn connections(&self) -> Result<Vec<Connection>> {
        Ok(read_state(&self.state)?.graph.connections().to_vec())
    }

    /// Inject `payload` as if `id` had emitted it on `slot`.
    pub fn send(&self, id: ActorId, slot: &str, payload: Payload) -> usize {
        self.dispatcher.send(id, slot, payload)
    }

    // ── Editor metadata ──

    pub fn meta(&self, id: ActorId) -> Result<ActorMeta> {
        Ok(read_state(&self.state)?.record(id)?.meta.clone())
    }

    pub fn title(&self, id: ActorId) -> Result<String> {
        Ok(read_state(&self.state)?.record(id)?.meta.title.clone())
    }

    pub fn set_position(&self, id: ActorId, x: f32, y: f32) -> Result<()> {
        let mut state = write_state(&self.state)?;
        let meta = &mut state.record_mut(id)?.meta;
        meta.xpos = x;
        meta.ypos = y;
        Ok(())
    }

    pub fn position(&self, id: ActorId) -> Result<(f32, f32)> {
        let state = read_state(&self.state)?;
        let meta = &state.record(id)?.meta;
        Ok((meta.xpos, meta.ypos))
    }

    pub fn set_selected(&self, id: ActorId, selected: bool) -> Result<()> {
        write_state(&self.state)?.record_mut(id)?.meta.selected = selected;
        Ok(())
    }

    pub fn is_selected(&self, id: ActorId) -> Result<bool> {
        Ok(read_state(&self.state)?.record(id)?.meta.selected)
    }

    fn lock_threads(&self) -> Result<std::sync::MutexGuard<'_, HashMap<ActorId, JoinHandle<()>>>> {
        self.threads
            .lock()
            .map_err(|e| ActorGraphError::Lock(e.to_string()))
    }
}

impl Drop for ActorSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorSystem")
            .field("factory", &self.factory)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
