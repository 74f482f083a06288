//! Live parameter values of one actor.
//!
//! The store is seeded from the actor's [`CapabilityDescriptor`] and its key set
//! never changes afterwards. Writes are normalised rather than rejected:
//! numbers are clamped into `[min, max]` when `min != max`, strings are
//! truncated to their maximum length.

use crate::capability::{CapabilityDescriptor, ParamKind, ParamValue, ParameterDecl};
use crate::runtime::message::{ApiArg, ApiMessage};
use thiserror::Error;

/// Maximum string length used when a string parameter declares none.
pub const DEFAULT_MAX_STRING_LEN: usize = 256;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),
}

pub type ParamResult<T> = std::result::Result<T, ParamError>;

/// A parameter's declaration together with its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    decl: ParameterDecl,
    value: ParamValue,
    max_len: usize,
}

impl Parameter {
    fn new(decl: ParameterDecl, max_string_default: usize) -> Self {
        let max_len = decl.max_len.unwrap_or(max_string_default);
        let mut param = Self {
            value: decl.kind.zero(),
            decl,
            max_len,
        };
        param.value = param.normalize(param.decl.value.clone());
        param
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn kind(&self) -> ParamKind {
        self.decl.kind
    }

    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    pub fn decl(&self) -> &ParameterDecl {
        &self.decl
    }

    /// Maximum length for string values.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Coerce into this parameter's kind and apply its bounds.
    fn normalize(&self, value: ParamValue) -> ParamValue {
        let bounded = self.decl.is_bounded();
        let (min, max) = (self.decl.min, self.decl.max);

        match value.coerce(self.decl.kind) {
            ParamValue::Int(v) if bounded => {
                let (lo, hi) = (min.min(max) as i64, min.max(max) as i64);
                ParamValue::Int(v.clamp(lo, hi))
            }
            // NaN would slip through clamp and never compare equal.
            ParamValue::Float(v) if v.is_nan() => self.normalize(ParamValue::Float(0.0)),
            ParamValue::Float(v) if bounded => ParamValue::Float(v.clamp(min.min(max), min.max(max))),
            ParamValue::String(s) => ParamValue::String(truncate_chars(s, self.max_len)),
            other => other,
        }
    }

    /// API message announcing this parameter's current value, if it declares
    /// an API call.
    pub fn api_message(&self) -> Option<ApiMessage> {
        let command = self.decl.api_call.as_ref()?;
        let arg = ApiArg::encode(&self.value, self.decl.picture());
        Some(ApiMessage::new(command.clone()).with_arg(arg))
    }
}

/// Per-actor mapping from parameter name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterStore {
    params: Vec<Parameter>,
}

impl ParameterStore {
    /// Seed a store from the descriptor's declared initial values.
    pub fn from_descriptor(descriptor: &CapabilityDescriptor, max_string_default: usize) -> Self {
        Self {
            params: descriptor
                .parameters()
                .iter()
                .cloned()
                .map(|decl| Parameter::new(decl, max_string_default))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.parameter(name).map(Parameter::value)
    }

    /// Store a new value. Returns whether the stored value changed.
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) -> ParamResult<bool> {
        let param = self
            .params
            .iter_mut()
            .find(|p| p.decl.name == name)
            .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))?;

        let value = param.normalize(value.into());
        if same_value(&value, &param.value) {
            return Ok(false);
        }

        tracing::trace!("Parameter {} = {}", name, value);
        param.value = value;
        Ok(true)
    }

    /// Store a value given as text, parsed with the kind's best-effort rules.
    pub fn set_from_text(&mut self, name: &str, text: &str) -> ParamResult<bool> {
        let kind = self
            .parameter(name)
            .map(Parameter::kind)
            .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))?;
        self.set(name, kind.parse_text(text))
    }

    /// API message for the named parameter's current value, if it declares one.
    pub fn api_message(&self, name: &str) -> Option<ApiMessage> {
        self.parameter(name).and_then(Parameter::api_message)
    }

    /// API messages for every parameter that declares an API call.
    pub fn api_messages(&self) -> Vec<ApiMessage> {
        self.params.iter().filter_map(Parameter::api_message).collect()
    }
}

fn same_value(a: &ParamValue, b: &ParamValue) -> bool {
    match (a, b) {
        (ParamValue::Float(x), ParamValue::Float(y)) => x.total_cmp(y).is_eq(),
        _ => a == b,
    }
}

fn truncate_chars(mut s: String, max_chars: usize) -> String {
    if let Some((byte_index, _)) = s.char_indices().nth(max_chars) {
        s.truncate(byte_index);
    }
    s
}
