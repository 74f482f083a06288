//! Minimal OSC 1.0 message encoding for actor outputs.

use crate::runtime::message::Payload;

/// One OSC argument.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Str(String),
}

impl OscArg {
    fn tag(&self) -> char {
        match self {
            OscArg::Int(_) => 'i',
            OscArg::Float(_) => 'f',
            OscArg::Str(_) => 's',
        }
    }
}

/// An OSC message under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    address: String,
    args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    pub fn int(mut self, v: i32) -> Self {
        self.args.push(OscArg::Int(v));
        self
    }

    pub fn float(mut self, v: f32) -> Self {
        self.args.push(OscArg::Float(v));
        self
    }

    pub fn string(mut self, v: impl Into<String>) -> Self {
        self.args.push(OscArg::Str(v.into()));
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn args(&self) -> &[OscArg] {
        &self.args
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(32);
        write_padded_str(&mut buf, &self.address);

        let tags: String = std::iter::once(',')
            .chain(self.args.iter().map(OscArg::tag))
            .collect();
        write_padded_str(&mut buf, &tags);

        for arg in &self.args {
            match arg {
                OscArg::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
                OscArg::Float(v) => buf.extend_from_slice(&v.to_be_bytes()),
                OscArg::Str(s) => write_padded_str(&mut buf, s),
            }
        }
        buf
    }

    pub fn into_payload(self) -> Payload {
        self.encode().into()
    }
}

/// Null-terminate and pad to a multiple of 4 bytes.
fn write_padded_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    let pad = 4 - (s.len() % 4);
    buf.extend(std::iter::repeat(0u8).take(pad));
}

/// Read back the address of an encoded message.
pub fn address_of(bytes: &[u8]) -> Option<&str> {
    let end = bytes.iter().position(|b| *b == 0)?;
    std::str::from_utf8(&bytes[..end]).ok()
}
