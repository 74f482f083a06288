//! Parsing a capability tree into a typed descriptor.
//!
//! The descriptor is the only place where capability strings are interpreted.
//! Everything downstream works on [`SlotType`] and [`ParamKind`].

use crate::capability::parameter::{parse_float, parse_int, ParamKind, ParameterDecl, WirePicture};
use crate::capability::slot::{SlotDirection, SlotInfo, SlotType};
use crate::capability::tree::{ConfigTree, TreeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-fatal problem found while parsing. The offending entry is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// Section the entry belongs to (`inputs`, `outputs`, `capabilities`).
    pub section: String,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.section, self.message)
    }
}

/// Parsed, immutable declaration of an actor's parameters and slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    parameters: Vec<ParameterDecl>,
    input_slots: Vec<SlotInfo>,
    output_slots: Vec<SlotInfo>,
    #[serde(skip)]
    warnings: Vec<ParseWarning>,
}

impl CapabilityDescriptor {
    /// Descriptor with nothing declared.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a descriptor from an already parsed tree. `None` yields an empty
    /// descriptor.
    pub fn parse(tree: Option<&ConfigTree>) -> Self {
        let Some(tree) = tree else {
            return Self::empty();
        };

        let mut descriptor = Self::empty();
        descriptor.input_slots = descriptor.parse_slots(tree, SlotDirection::Input);
        descriptor.output_slots = descriptor.parse_slots(tree, SlotDirection::Output);
        descriptor.parameters = descriptor.parse_parameters(tree);
        descriptor
    }

    /// Parse capability text. Only grammar errors fail; capability-level
    /// problems become warnings.
    pub fn from_text(text: Option<&str>) -> Result<Self, TreeError> {
        match text {
            Some(text) => {
                let tree = ConfigTree::parse(text)?;
                Ok(Self::parse(Some(&tree)))
            }
            None => Ok(Self::empty()),
        }
    }

    pub fn parameters(&self) -> &[ParameterDecl] {
        &self.parameters
    }

    pub fn input_slots(&self) -> &[SlotInfo] {
        &self.input_slots
    }

    pub fn output_slots(&self) -> &[SlotInfo] {
        &self.output_slots
    }

    /// Slots of one direction.
    pub fn slots(&self, direction: SlotDirection) -> &[SlotInfo] {
        match direction {
            SlotDirection::Input => &self.input_slots,
            SlotDirection::Output => &self.output_slots,
        }
    }

    /// Warnings collected while parsing.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDecl> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn input_slot(&self, label: &str) -> Option<&SlotInfo> {
        self.input_slots.iter().find(|s| s.label == label)
    }

    pub fn output_slot(&self, label: &str) -> Option<&SlotInfo> {
        self.output_slots.iter().find(|s| s.label == label)
    }

    /// True when nothing at all is declared.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.input_slots.is_empty() && self.output_slots.is_empty()
    }

    fn warn(&mut self, section: &str, message: String) {
        tracing::warn!("Capability {}: {}", section, message);
        self.warnings.push(ParseWarning {
            section: section.to_string(),
            message,
        });
    }

    fn parse_slots(&mut self, tree: &ConfigTree, direction: SlotDirection) -> Vec<SlotInfo> {
        let mut slots = Vec::new();
        let Some(section) = tree.child(direction.section()) else {
            return slots;
        };

        for node in section.children_named(direction.entry()) {
            let Some(type_str) = node.value_at("type") else {
                self.warn(
                    direction.section(),
                    format!("{} without a type", direction.entry()),
                );
                continue;
            };

            match type_str.parse::<SlotType>() {
                Ok(slot_type) => {
                    let label = node.value_at("name").unwrap_or(type_str);
                    slots.push(SlotInfo::new(label, slot_type));
                }
                Err(_) => {
                    self.warn(
                        direction.section(),
                        format!("Unsupported {}: {}", direction.entry(), type_str),
                    );
                }
            }
        }

        slots
    }

    fn parse_parameters(&mut self, tree: &ConfigTree) -> Vec<ParameterDecl> {
        let mut parameters = Vec::new();
        let Some(root) = tree.child("capabilities") else {
            return parameters;
        };

        for data in root.children_named("data") {
            let (Some(name), Some(type_str)) = (data.value_at("name"), data.value_at("type"))
            else {
                self.warn("capabilities", "data entry needs both name and type".to_string());
                continue;
            };

            let Some(kind) = ParamKind::from_type_str(type_str) else {
                self.warn(
                    "capabilities",
                    format!("Unsupported data type '{}' for '{}'", type_str, name),
                );
                continue;
            };

            let mut decl = ParameterDecl::new(name, kind);
            if let Some(value) = data.value_at("value") {
                decl.value = kind.parse_text(value);
            }

            match kind {
                ParamKind::String => {
                    decl.max_len = data
                        .value_at("max")
                        .map(|max| parse_int(max).max(0) as usize);
                }
                ParamKind::Int | ParamKind::Float => {
                    let read = |field: &str| data.value_at(field).map(|v| read_bound(kind, v));
                    decl.min = read("min").unwrap_or(0.0);
                    decl.max = read("max").unwrap_or(0.0);
                    decl.step = read("step").unwrap_or(0.0);
                }
            }

            decl.api_call = data.value_at("api_call").map(str::to_string);
            if let Some(tag) = data.value_at("api_value") {
                match WirePicture::from_tag(tag) {
                    Some(picture) => decl.api_value = Some(picture),
                    None => self.warn(
                        "capabilities",
                        format!("Unsupported api_value '{}' for '{}'", tag, name),
                    ),
                }
            }

            parameters.push(decl);
        }

        parameters
    }
}

/// Bounds of int parameters are read as ints, so "1.9" bounds an int at 1.
fn read_bound(kind: ParamKind, text: &str) -> f64 {
    match kind {
        ParamKind::Int => parse_int(text) as f64,
        _ => parse_float(text),
    }
}
