//! Mock construction helpers

use actorgraph_rs::graph::ActorId;
use actorgraph_rs::runtime::{ActorContext, ActorHandler, ApiMessage, Message, Outcome, Payload};
use actorgraph_rs::ActorFactory;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Capability text of the observer kind.
pub const OBSERVER_CAPABILITIES: &str = r#"capabilities
    data
        name = "port"
        type = "int"
        value = "6200"
        min = "1"
        max = "10000"
        api_call = "SET PORT"
inputs
    input
        type = "OSC"
        name = "osc-in"
outputs
    output
        type = "OSC"
        name = "osc-out"
"#;

/// Something an observer actor saw.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Lifecycle(ActorId, &'static str),
    Api(ActorId, ApiMessage),
    Data(ActorId, Option<String>, Payload),
}

/// Actor that reports every message it handles.
pub struct ObserverActor {
    events: Sender<Observed>,
}

impl ActorHandler for ObserverActor {
    fn capabilities(&self) -> Option<&str> {
        Some(OBSERVER_CAPABILITIES)
    }

    fn handle(&mut self, msg: Message, ctx: &mut ActorContext) -> Outcome {
        let id = ctx.id();
        let observed = match msg {
            Message::Api(api) => Observed::Api(id, api),
            Message::Data { slot, payload } => Observed::Data(id, slot, payload),
            other => Observed::Lifecycle(id, other.kind()),
        };
        let _ = self.events.send(observed);
        Outcome::Handled
    }
}

/// Register the `Observer` kind; every observer reports to the returned receiver.
pub fn register_observer(factory: &mut ActorFactory) -> Receiver<Observed> {
    let (tx, rx) = unbounded();
    factory.register("Observer", move || {
        Box::new(ObserverActor { events: tx.clone() }) as Box<dyn ActorHandler>
    });
    rx
}

/// Drain data observations, ignoring timers and lifecycle.
pub fn data_events(rx: &Receiver<Observed>) -> Vec<(ActorId, Option<String>, Payload)> {
    rx.try_iter()
        .filter_map(|o| match o {
            Observed::Data(id, slot, payload) => Some((id, slot, payload)),
            _ => None,
        })
        .collect()
}

/// Drain API observations.
pub fn api_events(rx: &Receiver<Observed>) -> Vec<(ActorId, ApiMessage)> {
    rx.try_iter()
        .filter_map(|o| match o {
            Observed::Api(id, msg) => Some((id, msg)),
            _ => None,
        })
        .collect()
}

/// Builtin kinds plus `Observer`.
pub fn observer_factory() -> (ActorFactory, Receiver<Observed>) {
    let mut factory = ActorFactory::with_builtins();
    let rx = register_observer(&mut factory);
    (factory, rx)
}
