//! Output of a compile pass.
//!
//! A [`CompiledGraph`] is an immutable snapshot: the dispatch graph plus a
//! copy of every module's committed-parameter block. A downstream executor
//! reads it; the next edit produces a fresh one.

use crate::module::ModuleId;

use super::construction::Graph;
use super::edge::Edge;
use super::node::{Node, NodeId};

/// Committed parameters of one module, as uploaded to the device.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedBlock {
    /// Owning module.
    pub module: ModuleId,
    /// Module kind name.
    pub kind: &'static str,
    /// Packed values.
    pub words: Vec<f32>,
}

impl CommittedBlock {
    /// The block as bytes, native byte order.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }
}

/// A node graph together with the parameter blocks its dispatches consume.
#[derive(Debug, Clone)]
pub struct CompiledGraph {
    graph: Graph,
    committed: Vec<CommittedBlock>,
}

impl CompiledGraph {
    pub(crate) fn new(graph: Graph, committed: Vec<CommittedBlock>) -> Self {
        Self { graph, committed }
    }

    /// The dispatch graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> &[Node] {
        self.graph.nodes()
    }

    /// All node-level edges.
    pub fn edges(&self) -> &[Edge] {
        self.graph.edges()
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node(id)
    }

    /// Committed blocks, in compile order. Modules with an empty block are
    /// included.
    pub fn committed_blocks(&self) -> &[CommittedBlock] {
        &self.committed
    }

    /// Committed block of `module`.
    pub fn committed(&self, module: ModuleId) -> Option<&[f32]> {
        self.committed
            .iter()
            .find(|b| b.module == module)
            .map(|b| b.words.as_slice())
    }

    /// Committed block of `module` as bytes.
    pub fn committed_bytes(&self, module: ModuleId) -> Option<&[u8]> {
        self.committed
            .iter()
            .find(|b| b.module == module)
            .map(CommittedBlock::as_bytes)
    }

    /// Takes the graph apart.
    pub fn into_parts(self) -> (Graph, Vec<CommittedBlock>) {
        (self.graph, self.committed)
    }
}
