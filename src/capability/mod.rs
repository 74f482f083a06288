//! Capability descriptions.
//!
//! Every actor kind describes its tunable parameters and its typed slots in a
//! small tree grammar ([`tree`]). [`CapabilityDescriptor::parse`] turns that
//! tree into closed Rust types once; the graph, parameter store and runtime
//! only ever see the typed form.

pub mod descriptor;
pub mod parameter;
pub mod slot;
pub mod tree;

pub use descriptor::{CapabilityDescriptor, ParseWarning};
pub use parameter::{parse_float, parse_int, ParamKind, ParamValue, ParameterDecl, WirePicture};
pub use slot::{SlotDirection, SlotInfo, SlotType};
pub use tree::{ConfigTree, TreeError};
