//! Per-actor lifecycle state machine and message loop.
//!
//! Each actor runs on its own thread:
//! 1. `Init` is processed before anything else
//! 2. Mailbox messages are processed in arrival order
//! 3. `Timer` fires whenever the interval has elapsed, even if the mailbox
//!    never runs dry
//! 4. Payloads from the handler's own resources are drained after every
//!    wake-up
//!
//! The loop ends after `Destroy`, or when every sender of the mailbox is gone.

use crate::graph::ActorId;
use crate::runtime::actor::{ActorContext, ActorHandler};
use crate::runtime::message::{Message, Outcome};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Longest wait between inbound drains when `Timer` is disabled.
pub const INBOUND_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lifecycle of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Uninitialized,
    Ready,
    Destroyed,
}

/// A handler plus the state machine that gates which messages reach it.
pub struct ActorRuntime {
    handler: Box<dyn ActorHandler>,
    ctx: ActorContext,
    state: RuntimeState,
}

impl ActorRuntime {
    pub fn new(handler: Box<dyn ActorHandler>, ctx: ActorContext) -> Self {
        Self {
            handler,
            ctx,
            state: RuntimeState::Uninitialized,
        }
    }

    pub fn id(&self) -> ActorId {
        self.ctx.id()
    }

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    fn accepts(&self, msg: &Message) -> bool {
        match (self.state, msg) {
            (RuntimeState::Destroyed, _) => false,
            (_, Message::Destroy) => true,
            (RuntimeState::Uninitialized, Message::Init) => true,
            (RuntimeState::Uninitialized, _) => false,
            (RuntimeState::Ready, Message::Init) => false,
            (RuntimeState::Ready, _) => true,
        }
    }

    /// Run one message through the state machine and the handler.
    pub fn process(&mut self, msg: Message) -> Outcome {
        if !self.accepts(&msg) {
            tracing::trace!(
                "{} ignoring {} while {:?}",
                self.ctx.id(),
                msg.kind(),
                self.state
            );
            return Outcome::Ignored;
        }

        let next = match msg {
            Message::Init => Some(RuntimeState::Ready),
            Message::Destroy => Some(RuntimeState::Destroyed),
            _ => None,
        };

        let outcome = self.handler.handle(msg, &mut self.ctx);
        if let Some(next) = next {
            self.state = next;
        }

        if let Outcome::Forward(payload) = &outcome {
            self.ctx.forward(payload.clone());
        }
        outcome
    }

    /// Deliver whatever the handler's own resources have received.
    pub fn poll_inbound(&mut self) {
        if self.state != RuntimeState::Ready {
            return;
        }
        for payload in self.handler.poll_inbound() {
            self.process(Message::Data {
                slot: None,
                payload,
            });
        }
    }

    /// Run until destroyed. `timer` of `None` disables `Timer` messages but
    /// bound resources are still drained every [`INBOUND_POLL_INTERVAL`].
    pub fn run(mut self, mailbox: Receiver<Message>, timer: Option<Duration>) {
        tracing::info!("Actor {} ({}) started", self.ctx.id(), self.ctx.title());
        self.process(Message::Init);

        let mut next_tick = timer.map(|interval| Instant::now() + interval);

        while self.state != RuntimeState::Destroyed {
            // Without a timer, still wake up to drain bound resources.
            let wake = next_tick.unwrap_or_else(|| Instant::now() + INBOUND_POLL_INTERVAL);
            let received = mailbox.recv_deadline(wake);

            match received {
                Ok(msg) => {
                    self.process(msg);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!("{} mailbox closed", self.ctx.id());
                    self.process(Message::Destroy);
                    break;
                }
            }

            if let (Some(interval), Some(deadline)) = (timer, next_tick) {
                let now = Instant::now();
                if now >= deadline {
                    self.process(Message::Timer);
                    // Skip missed ticks instead of bursting to catch up.
                    let next = deadline + interval;
                    next_tick = Some(if next <= now { now + interval } else { next });
                }
            }

            self.poll_inbound();
        }

        tracing::info!("Actor {} ({}) exiting", self.ctx.id(), self.ctx.title());
    }
}

/// Start `runtime` on a dedicated, named thread.
pub fn spawn(
    runtime: ActorRuntime,
    mailbox: Receiver<Message>,
    timer: Option<Duration>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("actor-{}", runtime.id().0))
        .spawn(move || runtime.run(mailbox, timer))
}
