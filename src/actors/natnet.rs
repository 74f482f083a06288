//! Motion-capture stream receiver.
//!
//! Binds a non-blocking UDP socket and forwards every received datagram, as
//! is, on its OSC output.

use crate::runtime::{ActorContext, ActorHandler, ApiMessage, Message, Outcome, Payload};
use std::net::{SocketAddr, UdpSocket};

pub const NATNET_CAPABILITIES: &str = r#"capabilities
    data
        name = "host"
        type = "string"
        value = "0.0.0.0"
        api_call = "SET HOST"
    data
        name = "port"
        type = "int"
        value = "1511"
        min = "1"
        max = "65535"
        api_call = "SET PORT"
outputs
    output
        type = "OSC"
"#;

/// Upper bound on datagrams drained per wake-up.
const MAX_DATAGRAMS_PER_POLL: usize = 64;

/// Largest datagram accepted; NatNet frames fit comfortably.
const RECV_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug)]
pub struct NatNetActor {
    host: String,
    port: u16,
    socket: Option<UdpSocket>,
    buffer: Vec<u8>,
}

impl Default for NatNetActor {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 1511,
            socket: None,
            buffer: vec![0; RECV_BUFFER_SIZE],
        }
    }
}

impl NatNetActor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address the receive socket is bound to, if any.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn rebind(&mut self) {
        self.socket.take();

        let socket = UdpSocket::bind((self.host.as_str(), self.port))
            .and_then(|s| s.set_nonblocking(true).map(|()| s));
        match socket {
            Ok(s) => {
                tracing::info!("NatNet listening on {}:{}", self.host, self.port);
                self.socket = Some(s);
            }
            Err(e) => tracing::warn!(
                "Could not bind dgram udp://{}:{}: {}",
                self.host,
                self.port,
                e
            ),
        }
    }

    fn handle_api(&mut self, msg: &ApiMessage) -> Outcome {
        let mut args = msg.reader();
        match msg.command() {
            "SET HOST" => match args.pop_str() {
                Some(host) => self.host = host,
                None => return Outcome::Ignored,
            },
            "SET PORT" => match args.pop_int().map(u16::try_from) {
                Some(Ok(port)) => self.port = port,
                _ => return Outcome::Ignored,
            },
            _ => return Outcome::Ignored,
        }
        self.rebind();
        Outcome::Handled
    }
}

impl ActorHandler for NatNetActor {
    fn capabilities(&self) -> Option<&str> {
        Some(NATNET_CAPABILITIES)
    }

    fn handle(&mut self, msg: Message, _ctx: &mut ActorContext) -> Outcome {
        match msg {
            Message::Init => Outcome::Handled,
            Message::Api(api) => self.handle_api(&api),
            Message::Data { slot: None, payload } => Outcome::Forward(payload),
            Message::Data { .. } | Message::Timer => Outcome::Ignored,
            Message::Destroy => {
                self.socket.take();
                Outcome::Handled
            }
        }
    }

    fn poll_inbound(&mut self) -> Vec<Payload> {
        let Some(socket) = &self.socket else {
            return Vec::new();
        };

        let mut received = Vec::new();
        while received.len() < MAX_DATAGRAMS_PER_POLL {
            match socket.recv(&mut self.buffer) {
                Ok(n) => received.push(Payload::from(&self.buffer[..n])),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    tracing::debug!("NatNet receive error: {}", e);
                    break;
                }
            }
        }
        received
    }
}
