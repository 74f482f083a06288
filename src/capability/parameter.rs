//! Parameter declarations and values.
//!
//! Numeric text is read the way C's `atoi`/`atof` read it: leading whitespace,
//! an optional sign, then the longest numeric prefix. Anything unparseable is
//! the kind's zero value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a tunable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Int,
    Float,
    String,
}

impl ParamKind {
    /// Parse the `type` field of a `data` node.
    pub fn from_type_str(s: &str) -> Option<Self> {
        match s {
            "int" => Some(ParamKind::Int),
            "float" => Some(ParamKind::Float),
            "string" => Some(ParamKind::String),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::String => "string",
        }
    }

    /// Wire tag used for API messages when a parameter declares none.
    pub fn default_picture(&self) -> WirePicture {
        match self {
            ParamKind::Int => WirePicture::Int,
            ParamKind::Float => WirePicture::Float,
            ParamKind::String => WirePicture::Str,
        }
    }

    /// Zero value of this kind.
    pub fn zero(&self) -> ParamValue {
        match self {
            ParamKind::Int => ParamValue::Int(0),
            ParamKind::Float => ParamValue::Float(0.0),
            ParamKind::String => ParamValue::String(String::new()),
        }
    }

    /// Parse text into a value of this kind (best effort).
    pub fn parse_text(&self, text: &str) -> ParamValue {
        match self {
            ParamKind::Int => ParamValue::Int(parse_int(text)),
            ParamKind::Float => ParamValue::Float(parse_float(text)),
            ParamKind::String => ParamValue::String(text.to_string()),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding tag for a single API message argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WirePicture {
    /// `s`: UTF-8 string.
    Str,
    /// `i`: signed integer.
    Int,
    /// `u`: unsigned integer.
    Unsigned,
    /// `f`: floating point.
    Float,
}

impl WirePicture {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "s" => Some(WirePicture::Str),
            "i" => Some(WirePicture::Int),
            "u" => Some(WirePicture::Unsigned),
            "f" => Some(WirePicture::Float),
            _ => None,
        }
    }

    pub fn tag(&self) -> char {
        match self {
            WirePicture::Str => 's',
            WirePicture::Int => 'i',
            WirePicture::Unsigned => 'u',
            WirePicture::Float => 'f',
        }
    }
}

/// A live parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    String(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::String(_) => ParamKind::String,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Convert into `kind`. Numbers convert numerically (floats truncate toward
    /// zero), text is parsed best effort, numbers become their textual form.
    pub fn coerce(self, kind: ParamKind) -> ParamValue {
        match (kind, self) {
            (ParamKind::Int, ParamValue::Int(v)) => ParamValue::Int(v),
            (ParamKind::Int, ParamValue::Float(v)) => ParamValue::Int(v as i64),
            (ParamKind::Int, ParamValue::String(s)) => ParamValue::Int(parse_int(&s)),
            (ParamKind::Float, ParamValue::Int(v)) => ParamValue::Float(v as f64),
            (ParamKind::Float, ParamValue::Float(v)) => ParamValue::Float(v),
            (ParamKind::Float, ParamValue::String(s)) => ParamValue::Float(parse_float(&s)),
            (ParamKind::String, ParamValue::String(s)) => ParamValue::String(s),
            (ParamKind::String, other) => ParamValue::String(other.to_text()),
        }
    }

    /// Textual form used in capability trees and patch files
    /// (`%i` for ints, `%f` for floats).
    pub fn to_text(&self) -> String {
        match self {
            ParamValue::Int(v) => v.to_string(),
            ParamValue::Float(v) => format!("{:.6}", v),
            ParamValue::String(s) => s.clone(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

/// A parameter as declared in an actor's capability description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub name: String,
    pub kind: ParamKind,
    /// Initial value.
    pub value: ParamValue,
    /// Lower bound for numeric kinds. `min == max` means unbounded.
    pub min: f64,
    /// Upper bound for numeric kinds.
    pub max: f64,
    /// Edit increment hint for widgets.
    pub step: f64,
    /// Maximum length for string kinds, if declared.
    pub max_len: Option<usize>,
    /// Command token sent to the actor when this parameter changes.
    pub api_call: Option<String>,
    /// Overrides the kind's default wire tag for the API argument.
    pub api_value: Option<WirePicture>,
}

impl ParameterDecl {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: kind.zero(),
            min: 0.0,
            max: 0.0,
            step: 0.0,
            max_len: None,
            api_call: None,
            api_value: None,
        }
    }

    /// Whether numeric values are clamped into `[min, max]`.
    pub fn is_bounded(&self) -> bool {
        self.kind != ParamKind::String && self.min != self.max
    }

    /// Wire tag used for this parameter's API argument.
    pub fn picture(&self) -> WirePicture {
        self.api_value.unwrap_or_else(|| self.kind.default_picture())
    }
}

/// `atoi`-style integer parse. Saturates on overflow.
pub fn parse_int(text: &str) -> i64 {
    let prefix = numeric_prefix(text, false);
    if prefix.is_empty() {
        return 0;
    }
    prefix.parse::<i64>().unwrap_or_else(|_| {
        if prefix.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        }
    })
}

/// `atof`-style float parse.
pub fn parse_float(text: &str) -> f64 {
    let prefix = numeric_prefix(text, true);
    prefix.parse::<f64>().unwrap_or(0.0)
}

/// Longest prefix of `text` (after leading whitespace) that looks like a number.
fn numeric_prefix(text: &str, fractional: bool) -> &str {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;

    if fractional {
        if end < bytes.len() && bytes[end] == b'.' {
            let frac_start = end + 1;
            let mut frac_end = frac_start;
            while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
                frac_end += 1;
            }
            if has_digits || frac_end > frac_start {
                end = frac_end;
                has_digits = true;
            }
        }
        if has_digits && end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
            let mut exp_end = end + 1;
            if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
                exp_end += 1;
            }
            let exp_digits = exp_end;
            while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                exp_end += 1;
            }
            if exp_end > exp_digits {
                end = exp_end;
            }
        }
    }

    if has_digits {
        &s[..end]
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_like_atoi() {
        assert_eq!(parse_int("6200"), 6200);
        assert_eq!(parse_int("  -12abc"), -12);
        assert_eq!(parse_int("+7"), 7);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("-"), 0);
        assert_eq!(parse_int("12.9"), 12);
    }

    #[test]
    fn test_parse_float_like_atof() {
        assert_eq!(parse_float("1.5"), 1.5);
        assert_eq!(parse_float(" -0.25xyz"), -0.25);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("3."), 3.0);
        assert_eq!(parse_float("1e3"), 1000.0);
        assert_eq!(parse_float("2e"), 2.0);
        assert_eq!(parse_float("nope"), 0.0);
        assert_eq!(parse_float("."), 0.0);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(ParamValue::Float(9.9).coerce(ParamKind::Int), ParamValue::Int(9));
        assert_eq!(ParamValue::Int(3).coerce(ParamKind::Float), ParamValue::Float(3.0));
        assert_eq!(
            ParamValue::from("42").coerce(ParamKind::Int),
            ParamValue::Int(42)
        );
        assert_eq!(
            ParamValue::Int(42).coerce(ParamKind::String),
            ParamValue::from("42")
        );
    }

    #[test]
    fn test_float_text_has_six_decimals() {
        assert_eq!(ParamValue::Float(1.5).to_text(), "1.500000");
    }

    #[test]
    fn test_picture_defaults() {
        let mut decl = ParameterDecl::new("port", ParamKind::Int);
        assert_eq!(decl.picture(), WirePicture::Int);
        decl.api_value = Some(WirePicture::Str);
        assert_eq!(decl.picture(), WirePicture::Str);
        assert_eq!(
            ParameterDecl::new("ip", ParamKind::String).picture(),
            WirePicture::Str
        );
    }

    #[test]
    fn test_string_is_never_bounded_numerically() {
        let mut decl = ParameterDecl::new("ip", ParamKind::String);
        decl.max = 32.0;
        assert!(!decl.is_bounded());
    }
}
