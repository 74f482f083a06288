//! Messages delivered to an actor's mailbox.

use crate::capability::{parse_float, parse_int, ParamValue, WirePicture};
use std::fmt;
use std::sync::Arc;

/// Opaque message body routed between actors. Cloning is a refcount bump, so
/// fan-out to N targets never copies the bytes.
pub type Payload = Arc<[u8]>;

/// One typed argument of an [`ApiMessage`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiArg {
    Str(String),
    Int(i64),
    Unsigned(u64),
    Float(f64),
}

impl ApiArg {
    /// Encode a parameter value with the given wire tag.
    pub fn encode(value: &ParamValue, picture: WirePicture) -> Self {
        match picture {
            WirePicture::Str => ApiArg::Str(value.to_text()),
            WirePicture::Int => ApiArg::Int(match value {
                ParamValue::Int(v) => *v,
                ParamValue::Float(v) => *v as i64,
                ParamValue::String(s) => parse_int(s),
            }),
            WirePicture::Unsigned => ApiArg::Unsigned(match value {
                ParamValue::Int(v) => (*v).max(0) as u64,
                ParamValue::Float(v) => v.max(0.0) as u64,
                ParamValue::String(s) => parse_int(s).max(0) as u64,
            }),
            WirePicture::Float => ApiArg::Float(match value {
                ParamValue::Int(v) => *v as f64,
                ParamValue::Float(v) => *v,
                ParamValue::String(s) => parse_float(s),
            }),
        }
    }

    pub fn picture(&self) -> WirePicture {
        match self {
            ApiArg::Str(_) => WirePicture::Str,
            ApiArg::Int(_) => WirePicture::Int,
            ApiArg::Unsigned(_) => WirePicture::Unsigned,
            ApiArg::Float(_) => WirePicture::Float,
        }
    }
}

impl fmt::Display for ApiArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiArg::Str(s) => write!(f, "\"{}\"", s),
            ApiArg::Int(v) => write!(f, "{}", v),
            ApiArg::Unsigned(v) => write!(f, "{}", v),
            ApiArg::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A command token followed by typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiMessage {
    command: String,
    args: Vec<ApiArg>,
}

impl ApiMessage {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: ApiArg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn push_arg(&mut self, arg: ApiArg) {
        self.args.push(arg);
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[ApiArg] {
        &self.args
    }

    /// Cursor over the arguments, in order.
    pub fn reader(&self) -> ApiArgs<'_> {
        ApiArgs {
            args: self.args.iter(),
        }
    }

    /// Wire tag string: `s` for the command, then one tag per argument.
    pub fn picture(&self) -> String {
        std::iter::once('s')
            .chain(self.args.iter().map(|a| a.picture().tag()))
            .collect()
    }
}

impl fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Pops arguments off an [`ApiMessage`] the way a handler reads them.
///
/// Each `pop_*` consumes one argument and converts it to the requested form,
/// parsing text best effort. `None` means the arguments are exhausted.
pub struct ApiArgs<'a> {
    args: std::slice::Iter<'a, ApiArg>,
}

impl<'a> ApiArgs<'a> {
    pub fn pop(&mut self) -> Option<&'a ApiArg> {
        self.args.next()
    }

    pub fn pop_str(&mut self) -> Option<String> {
        self.pop().map(|arg| match arg {
            ApiArg::Str(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn pop_int(&mut self) -> Option<i64> {
        self.pop().map(|arg| match arg {
            ApiArg::Str(s) => parse_int(s),
            ApiArg::Int(v) => *v,
            ApiArg::Unsigned(v) => i64::try_from(*v).unwrap_or(i64::MAX),
            ApiArg::Float(v) => *v as i64,
        })
    }

    pub fn pop_float(&mut self) -> Option<f64> {
        self.pop().map(|arg| match arg {
            ApiArg::Str(s) => parse_float(s),
            ApiArg::Int(v) => *v as f64,
            ApiArg::Unsigned(v) => *v as f64,
            ApiArg::Float(v) => *v,
        })
    }

    pub fn remaining(&self) -> usize {
        self.args.len()
    }
}

/// Everything an actor's message loop can receive.
#[derive(Debug, Clone)]
pub enum Message {
    /// First message of every actor.
    Init,
    /// Command addressed to the actor, usually from a parameter change.
    Api(ApiMessage),
    /// Payload from a connected output (`slot` names our input), or from a
    /// live resource the actor owns (`slot` is `None`).
    Data {
        slot: Option<String>,
        payload: Payload,
    },
    /// Periodic tick.
    Timer,
    /// Release everything. Terminal.
    Destroy,
}

impl Message {
    pub fn data(slot: impl Into<String>, payload: Payload) -> Self {
        Message::Data {
            slot: Some(slot.into()),
            payload,
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Init => "INIT",
            Message::Api(_) => "API",
            Message::Data { .. } => "DATA",
            Message::Timer => "TIMER",
            Message::Destroy => "DESTROY",
        }
    }
}

/// What a handler did with a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Handled,
    /// Not meaningful for this actor or its current resources.
    Ignored,
    /// Send this payload on the actor's first output slot.
    Forward(Payload),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picture() {
        let msg = ApiMessage::new("SET PORT").with_arg(ApiArg::Int(6200));
        assert_eq!(msg.picture(), "si");

        let msg = ApiMessage::new("MIX")
            .with_arg(ApiArg::Str("a".into()))
            .with_arg(ApiArg::Unsigned(3))
            .with_arg(ApiArg::Float(0.5));
        assert_eq!(msg.picture(), "ssuf");
        assert_eq!(ApiMessage::new("STOP").picture(), "s");
    }

    #[test]
    fn test_encode_respects_picture() {
        assert_eq!(
            ApiArg::encode(&ParamValue::Int(6200), WirePicture::Str),
            ApiArg::Str("6200".into())
        );
        assert_eq!(
            ApiArg::encode(&ParamValue::from("42abc"), WirePicture::Int),
            ApiArg::Int(42)
        );
        assert_eq!(
            ApiArg::encode(&ParamValue::Int(-5), WirePicture::Unsigned),
            ApiArg::Unsigned(0)
        );
        assert_eq!(
            ApiArg::encode(&ParamValue::Int(2), WirePicture::Float),
            ApiArg::Float(2.0)
        );
    }

    #[test]
    fn test_reader_pops_in_order() {
        let msg = ApiMessage::new("SET")
            .with_arg(ApiArg::Str("127.0.0.1".into()))
            .with_arg(ApiArg::Str("9000".into()))
            .with_arg(ApiArg::Int(3));
        let mut args = msg.reader();
        assert_eq!(args.remaining(), 3);
        assert_eq!(args.pop_str().as_deref(), Some("127.0.0.1"));
        assert_eq!(args.pop_int(), Some(9000));
        assert_eq!(args.pop_float(), Some(3.0));
        assert_eq!(args.pop_int(), None);
    }

    #[test]
    fn test_message_kind() {
        assert_eq!(Message::Init.kind(), "INIT");
        assert_eq!(Message::data("in", Arc::from(&b"x"[..])).kind(), "DATA");
        assert_eq!(Message::Destroy.kind(), "DESTROY");
    }
}
