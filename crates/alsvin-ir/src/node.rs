//! Graph nodes: operation instances bound to the wire they write.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;
use crate::wire::{WireId, WireRole};

/// The kind of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Synthetic zeroth node of a wire, marking its creation.
    Init,
    /// A forward operation instance.
    Comp,
    /// The inverse twin of exactly one `Comp` node.
    Uncomp,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Init => write!(f, "init"),
            NodeKind::Comp => write!(f, "comp"),
            NodeKind::Uncomp => write!(f, "uncomp"),
        }
    }
}

/// One operation instance bound to the wire it writes.
///
/// `node_num` is the occurrence counter among nodes on the same wire: the
/// `Init` node is 0 and the counter is strictly increasing along the wire's
/// target chain. `seq` is the global creation index across the whole graph.
#[derive(Debug, Clone, PartialEq)]
pub struct OpNode {
    /// The wire this node writes.
    pub wire: WireId,
    /// Cached wire label, e.g. `"a0"`.
    pub label: String,
    /// Global creation index.
    pub seq: u32,
    /// Per-wire occurrence counter.
    pub node_num: u32,
    /// Operation name; `None` only for `Init` nodes.
    pub name: Option<String>,
    /// The node kind.
    pub kind: NodeKind,
    /// The role of the node's wire.
    pub role: WireRole,
    /// Whether an uncompute twin exists for this `Comp` node.
    pub is_uncomputed: bool,
    /// The uncompute twin of a `Comp` node, or the original of an `Uncomp`
    /// node.
    pub twin: Option<NodeId>,
}

impl OpNode {
    /// Create the `Init` node for a wire.
    pub fn init(wire: WireId, label: impl Into<String>, seq: u32, role: WireRole) -> Self {
        Self {
            wire,
            label: label.into(),
            seq,
            node_num: 0,
            name: None,
            kind: NodeKind::Init,
            role,
            is_uncomputed: false,
            twin: None,
        }
    }

    /// Create a forward operation node.
    pub fn comp(
        wire: WireId,
        label: impl Into<String>,
        seq: u32,
        node_num: u32,
        name: impl Into<String>,
        role: WireRole,
    ) -> Self {
        Self {
            wire,
            label: label.into(),
            seq,
            node_num,
            name: Some(name.into()),
            kind: NodeKind::Comp,
            role,
            is_uncomputed: false,
            twin: None,
        }
    }

    /// Create the uncompute twin of a forward operation node.
    pub fn uncomp(
        wire: WireId,
        label: impl Into<String>,
        seq: u32,
        node_num: u32,
        name: impl Into<String>,
        role: WireRole,
        original: NodeId,
    ) -> Self {
        Self {
            wire,
            label: label.into(),
            seq,
            node_num,
            name: Some(name.into()),
            kind: NodeKind::Uncomp,
            role,
            is_uncomputed: false,
            twin: Some(original),
        }
    }

    /// Check if this is an init node.
    #[inline]
    pub fn is_init(&self) -> bool {
        self.kind == NodeKind::Init
    }

    /// Check if this is a forward operation node.
    #[inline]
    pub fn is_comp(&self) -> bool {
        self.kind == NodeKind::Comp
    }

    /// Check if this is an uncompute twin.
    #[inline]
    pub fn is_uncomp(&self) -> bool {
        self.kind == NodeKind::Uncomp
    }

    /// The immutable identity used for cross-graph matching.
    pub fn signature(&self) -> NodeSignature {
        NodeSignature {
            label: self.label.clone(),
            node_num: self.node_num,
            name: self.name.clone(),
            kind: self.kind,
        }
    }
}

impl fmt::Display for OpNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(
                f,
                "{}:{}({}{})",
                name,
                self.label,
                self.node_num,
                if self.is_uncomp() { "*" } else { "" }
            ),
            None => write!(f, "{}", self.label),
        }
    }
}

/// Structural node identity: wire label, occurrence counter, operation name
/// and kind. Used only for matching nodes between two graphs; in-graph
/// operations address nodes by their arena id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeSignature {
    /// Wire label.
    pub label: String,
    /// Per-wire occurrence counter.
    pub node_num: u32,
    /// Operation name (`None` for init nodes).
    pub name: Option<String>,
    /// Node kind.
    pub kind: NodeKind,
}
