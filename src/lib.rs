//! # actorgraph-rs: capability-driven actor graphs
//!
//! Actors are independent message-processing units, each running on its own
//! thread. Every actor kind describes itself with a small capability text:
//! its tunable parameters and its typed input/output slots. The system wires
//! actors together through a connection graph and routes payloads along it.
//!
//! ## Architecture
//!
//! - **Capability**: parses capability text into typed parameter and slot
//!   declarations
//! - **Graph**: actors and type-checked connections between their slots
//! - **Params**: per-actor live parameter values, clamped to declared bounds;
//!   changes become API messages to the actor
//! - **Runtime**: the per-actor `INIT / API / DATA / TIMER / DESTROY` state
//!   machine and its thread loop
//! - **Dispatch**: routes emitted payloads to every connected input through
//!   bounded crossbeam mailboxes
//! - **System**: the facade tying it together, plus **Patch** files for
//!   saving and restoring a whole graph
//!
//! ## Example
//!
//! ```ignore
//! use actorgraph_rs::{actors::ActorFactory, config::AppConfig, system::ActorSystem};
//! use actorgraph_rs::capability::ParamValue;
//!
//! let system = ActorSystem::new(AppConfig::default(), ActorFactory::with_builtins());
//! let natnet = system.create_actor("NatNet")?;
//! let client = system.create_actor("Client")?;
//! system.add_connection(natnet, "OSC", client, "OSC")?;
//!
//! // Sends ("SET PORT", 9000) to the client, which reopens its socket.
//! system.on_parameter_edited(client, "port", ParamValue::Int(9000))?;
//! ```

pub mod actors;
pub mod capability;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod params;
pub mod patch;
pub mod runtime;
pub mod system;

// Re-export commonly used types
pub use actors::ActorFactory;
pub use capability::{CapabilityDescriptor, ParamValue, SlotType};
pub use config::AppConfig;
pub use error::{ActorGraphError, Result};
pub use graph::{ActorId, Connection, ConnectionGraph};
pub use params::ParameterStore;
pub use patch::PatchFile;
pub use system::ActorSystem;
