//! OSC-over-UDP sender.
//!
//! Every payload arriving on the OSC input is sent as one datagram to
//! `host:port`. Changing either through the API drops the socket and opens a
//! new one.

use crate::runtime::{ActorContext, ActorHandler, ApiMessage, Message, Outcome, Payload};
use std::net::UdpSocket;

pub const CLIENT_CAPABILITIES: &str = r#"capabilities
    data
        name = "ip"
        type = "string"
        value = "192.168.0.1"
        api_call = "SET HOST"
        api_value = "s"
    data
        name = "port"
        type = "int"
        value = "6200"
        min = "1"
        max = "10000"
        api_call = "SET PORT"
        api_value = "i"
inputs
    input
        type = "OSC"
"#;

#[derive(Debug)]
pub struct ClientActor {
    host: String,
    port: u16,
    socket: Option<UdpSocket>,
}

impl Default for ClientActor {
    fn default() -> Self {
        Self {
            host: "192.168.0.1".to_string(),
            port: 6200,
            socket: None,
        }
    }
}

impl ClientActor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn url(&self) -> String {
        format!("udp://{}:{}", self.host, self.port)
    }

    fn reconnect(&mut self) {
        self.socket.take();

        let socket = UdpSocket::bind(("0.0.0.0", 0))
            .and_then(|s| s.connect((self.host.as_str(), self.port)).map(|()| s));
        match socket {
            Ok(s) => {
                tracing::info!("Client sending to {}", self.url());
                self.socket = Some(s);
            }
            Err(e) => tracing::warn!("Could not create dgram {}: {}", self.url(), e),
        }
    }

    fn handle_api(&mut self, msg: &ApiMessage) -> Outcome {
        let mut args = msg.reader();
        match msg.command() {
            "SET HOST" => {
                let Some(host) = args.pop_str() else {
                    return Outcome::Ignored;
                };
                self.host = host;
            }
            "SET PORT" => {
                let Some(port) = args.pop_int() else {
                    return Outcome::Ignored;
                };
                match u16::try_from(port) {
                    Ok(p) => self.port = p,
                    Err(_) => {
                        tracing::warn!("Client port {} out of range", port);
                        return Outcome::Ignored;
                    }
                }
            }
            other => {
                tracing::debug!("Client ignoring API command '{}'", other);
                return Outcome::Ignored;
            }
        }
        self.reconnect();
        Outcome::Handled
    }

    fn send(&self, payload: &Payload) -> Outcome {
        let Some(socket) = &self.socket else {
            return Outcome::Ignored;
        };
        if let Err(e) = socket.send(payload) {
            tracing::warn!("Error sending OSC message to {}: {}", self.host, e);
        }
        Outcome::Handled
    }
}

impl ActorHandler for ClientActor {
    fn capabilities(&self) -> Option<&str> {
        Some(CLIENT_CAPABILITIES)
    }

    fn handle(&mut self, msg: Message, _ctx: &mut ActorContext) -> Outcome {
        match msg {
            Message::Init => Outcome::Handled,
            Message::Api(api) => self.handle_api(&api),
            Message::Data { payload, .. } => self.send(&payload),
            Message::Timer => Outcome::Ignored,
            Message::Destroy => {
                self.socket.take();
                Outcome::Handled
            }
        }
    }
}
