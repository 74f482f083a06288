//! Pass-through actor: whatever arrives on its input leaves on its output.

use crate::runtime::{ActorContext, ActorHandler, Message, Outcome};

pub const RELAY_CAPABILITIES: &str = r#"inputs
    input
        type = "Any"
        name = "in"
outputs
    output
        type = "Any"
        name = "out"
"#;

#[derive(Debug, Default)]
pub struct RelayActor {
    forwarded: u64,
}

impl RelayActor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }
}

impl ActorHandler for RelayActor {
    fn capabilities(&self) -> Option<&str> {
        Some(RELAY_CAPABILITIES)
    }

    fn handle(&mut self, msg: Message, _ctx: &mut ActorContext) -> Outcome {
        match msg {
            Message::Data { payload, .. } => {
                self.forwarded += 1;
                Outcome::Forward(payload)
            }
            Message::Init | Message::Destroy => Outcome::Handled,
            Message::Api(_) | Message::Timer => Outcome::Ignored,
        }
    }
}
