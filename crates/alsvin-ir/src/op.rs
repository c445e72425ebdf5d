//! Operation traces: ordered sequences of reversible operations over wires.

use serde::{Deserialize, Serialize};

use crate::wire::{Wire, WireId, WireRole};

/// One operation record: a named action writing one target wire, influenced
/// by zero or more controlling wires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceOp {
    /// Operation name. Opaque to the graph model; inverses share the name.
    pub name: String,
    /// The wire this operation writes.
    pub target: WireId,
    /// Wires whose values influence this operation.
    pub controls: Vec<WireId>,
}

impl TraceOp {
    /// Create an operation record.
    pub fn new(
        name: impl Into<String>,
        target: WireId,
        controls: impl IntoIterator<Item = WireId>,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            controls: controls.into_iter().collect(),
        }
    }

    /// Create a singly-controlled operation.
    pub fn controlled(name: impl Into<String>, control: WireId, target: WireId) -> Self {
        Self::new(name, target, [control])
    }

    /// Create an uncontrolled operation.
    pub fn local(name: impl Into<String>, target: WireId) -> Self {
        Self::new(name, target, [])
    }

    /// Check whether this operation touches `wire` as target or control.
    pub fn touches(&self, wire: WireId) -> bool {
        self.target == wire || self.controls.contains(&wire)
    }
}

/// An ordered operation trace together with its wire declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    wires: Vec<Wire>,
    ops: Vec<TraceOp>,
}

impl Trace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty trace over an existing set of wires.
    pub fn with_wires(wires: Vec<Wire>) -> Self {
        Self { wires, ops: vec![] }
    }

    /// Declare a register of `size` wires sharing a role, returning their ids.
    pub fn add_register(
        &mut self,
        name: impl Into<String>,
        size: u32,
        role: WireRole,
    ) -> Vec<WireId> {
        let name = name.into();
        let mut ids = vec![];
        for i in 0..size {
            ids.push(self.add_wire(&name, i, role));
        }
        ids
    }

    /// Declare a single wire.
    pub fn add_wire(&mut self, register: impl Into<String>, index: u32, role: WireRole) -> WireId {
        let id = WireId::from(self.wires.len());
        self.wires.push(Wire::new(id, register, index, role));
        id
    }

    /// Append an operation.
    pub fn push(&mut self, op: TraceOp) {
        self.ops.push(op);
    }

    /// Append an operation from its parts.
    pub fn push_op(
        &mut self,
        name: impl Into<String>,
        target: WireId,
        controls: impl IntoIterator<Item = WireId>,
    ) {
        self.ops.push(TraceOp::new(name, target, controls));
    }

    /// The declared wires.
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Look up a wire by id.
    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(id.0 as usize)
    }

    /// The role of a wire, if declared.
    pub fn role(&self, id: WireId) -> Option<WireRole> {
        self.wire(id).map(|w| w.role)
    }

    /// Ids of all wires with the given role.
    pub fn wires_with_role(&self, role: WireRole) -> Vec<WireId> {
        self.wires
            .iter()
            .filter(|w| w.role == role)
            .map(|w| w.id)
            .collect()
    }

    /// Ids of all ancilla wires.
    pub fn ancilla_wires(&self) -> Vec<WireId> {
        self.wires_with_role(WireRole::Ancilla)
    }

    /// The operations in program order.
    pub fn ops(&self) -> &[TraceOp] {
        &self.ops
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check whether the trace has no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// A copy of this trace keeping only the first `len` operations.
    pub fn prefix(&self, len: usize) -> Trace {
        Trace {
            wires: self.wires.clone(),
            ops: self.ops[..len.min(self.ops.len())].to_vec(),
        }
    }
}
