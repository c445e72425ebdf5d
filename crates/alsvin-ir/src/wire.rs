//! Wires and wire roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a wire within a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireId(pub u32);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

impl From<u32> for WireId {
    fn from(id: u32) -> Self {
        WireId(id)
    }
}

impl From<usize> for WireId {
    fn from(id: usize) -> Self {
        WireId(u32::try_from(id).expect("WireId overflow: exceeds u32::MAX"))
    }
}

/// The role of a wire, fixed for the lifetime of a trace and any graph
/// built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireRole {
    /// Externally supplied value, borrowed and optionally restored.
    Input,
    /// Temporary scratch value that must end in its initial state.
    Ancilla,
    /// Final result; never uncomputed.
    Output,
}

impl fmt::Display for WireRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireRole::Input => write!(f, "input"),
            WireRole::Ancilla => write!(f, "ancilla"),
            WireRole::Output => write!(f, "output"),
        }
    }
}

/// A named resource lane carrying a sequence of operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wire {
    /// The unique identifier.
    pub id: WireId,
    /// The register this wire belongs to.
    pub register: String,
    /// The index within the register.
    pub index: u32,
    /// The role of this wire.
    pub role: WireRole,
}

impl Wire {
    /// Create a new wire with register membership and a role.
    pub fn new(id: WireId, register: impl Into<String>, index: u32, role: WireRole) -> Self {
        Self {
            id,
            register: register.into(),
            index,
            role,
        }
    }

    /// The wire label, e.g. `"q3"` for index 3 of register `q`.
    pub fn label(&self) -> String {
        format!("{}{}", self.register, self.index)
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}
