//! Actor runtime: messages, the handler seam and the per-actor thread.

pub mod actor;
pub mod message;
pub mod worker;

pub use actor::{ActorContext, ActorHandler};
pub use message::{ApiArg, ApiArgs, ApiMessage, Message, Outcome, Payload};
pub use worker::{spawn, ActorRuntime, RuntimeState};
