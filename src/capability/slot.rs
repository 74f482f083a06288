//! Typed connection points declared by actors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of data a slot carries.
///
/// Discriminants start at 1; 0 is reserved to mean "no type" and never maps to
/// a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SlotType {
    /// Accepts or produces anything.
    Any = 1,
    Position,
    Rotation,
    Matrix,
    Int,
    /// Open Sound Control packets.
    #[serde(rename = "OSC")]
    Osc,
}

impl SlotType {
    /// All slot types, in discriminant order.
    pub fn all() -> &'static [SlotType] {
        &[
            SlotType::Any,
            SlotType::Position,
            SlotType::Rotation,
            SlotType::Matrix,
            SlotType::Int,
            SlotType::Osc,
        ]
    }

    /// Name used in capability descriptions.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotType::Any => "Any",
            SlotType::Position => "Position",
            SlotType::Rotation => "Rotation",
            SlotType::Matrix => "Matrix",
            SlotType::Int => "Int",
            SlotType::Osc => "OSC",
        }
    }

    /// Numeric type id. Never 0.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Inverse of [`SlotType::id`]. Returns `None` for 0 and unknown ids.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.id() == id)
    }

    /// Whether an output of type `self` may feed an input of type `other`.
    pub fn is_compatible(self, other: SlotType) -> bool {
        self == other || self == SlotType::Any || other == SlotType::Any
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unsupported slot type '{}'", s))
    }
}

/// Whether a slot is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotDirection {
    Input,
    Output,
}

impl SlotDirection {
    /// Section name holding slots of this direction.
    pub fn section(&self) -> &'static str {
        match self {
            SlotDirection::Input => "inputs",
            SlotDirection::Output => "outputs",
        }
    }

    /// Node name of a single slot entry.
    pub fn entry(&self) -> &'static str {
        match self {
            SlotDirection::Input => "input",
            SlotDirection::Output => "output",
        }
    }
}

/// A named, typed slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotInfo {
    pub label: String,
    pub slot_type: SlotType,
}

impl SlotInfo {
    pub fn new(label: impl Into<String>, slot_type: SlotType) -> Self {
        Self {
            label: label.into(),
            slot_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_is_never_zero() {
        assert_eq!(SlotType::Any.id(), 1);
        assert!(SlotType::all().iter().all(|t| t.id() != 0));
        assert_eq!(SlotType::from_id(0), None);
    }

    #[test]
    fn test_id_round_trip() {
        for t in SlotType::all() {
            assert_eq!(SlotType::from_id(t.id()), Some(*t));
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("OSC".parse::<SlotType>(), Ok(SlotType::Osc));
        assert_eq!("Matrix".parse::<SlotType>(), Ok(SlotType::Matrix));
        assert!("osc".parse::<SlotType>().is_err());
        assert!("MIDI".parse::<SlotType>().is_err());
    }

    #[test]
    fn test_compatibility() {
        assert!(SlotType::Int.is_compatible(SlotType::Int));
        assert!(!SlotType::Int.is_compatible(SlotType::Position));
        assert!(SlotType::Any.is_compatible(SlotType::Matrix));
        assert!(SlotType::Rotation.is_compatible(SlotType::Any));
    }
}
