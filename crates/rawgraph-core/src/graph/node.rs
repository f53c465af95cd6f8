//! Graph node types.
//!
//! A [`Node`] is one GPU compute dispatch. It is created by a module during
//! node construction and lives until the next compile pass discards the graph.

use core::fmt;

use crate::connector::Connector;
use crate::module::ModuleId;
use crate::push::PushConstants;

/// Maximum number of connectors on a single node.
pub const MAX_CONNECTORS: usize = 10;

/// Connector on a node; its back-reference points at another node.
pub type NodeConnector = Connector<NodeId>;

/// Index of a node in the graph arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A single compute dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Name of the module kind that created the node.
    pub name: &'static str,
    /// Kernel entry point.
    pub kernel: &'static str,
    /// Owning module. Used to look up shared metadata and committed params.
    pub module: ModuleId,
    /// Work width.
    pub wd: u32,
    /// Work height.
    pub ht: u32,
    /// Work depth (array layers), 1 for plain 2D work.
    pub dp: u32,
    pub(crate) connectors: Vec<NodeConnector>,
    /// Constants for this dispatch.
    pub push_constants: PushConstants,
}

impl Node {
    /// A node with no connectors and an empty push-constant block.
    pub fn new(
        name: &'static str,
        kernel: &'static str,
        module: ModuleId,
        wd: u32,
        ht: u32,
    ) -> Self {
        Self {
            name,
            kernel,
            module,
            wd,
            ht,
            dp: 1,
            connectors: Vec::new(),
            push_constants: PushConstants::empty(),
        }
    }

    /// Sets the work depth.
    pub fn with_depth(mut self, dp: u32) -> Self {
        self.dp = dp;
        self
    }

    /// Appends a connector. The count is checked against
    /// [`MAX_CONNECTORS`] when the node is added to a graph.
    pub fn with_connector(mut self, connector: NodeConnector) -> Self {
        self.connectors.push(connector);
        self
    }

    /// Sets the push-constant block.
    pub fn with_push_constants(mut self, push_constants: PushConstants) -> Self {
        self.push_constants = push_constants;
        self
    }

    /// The node's connectors, in declaration order.
    pub fn connectors(&self) -> &[NodeConnector] {
        &self.connectors
    }

    /// Connector by index.
    pub fn connector(&self, index: usize) -> Option<&NodeConnector> {
        self.connectors.get(index)
    }

    /// Index of the connector called `name`.
    pub fn connector_index(&self, name: &str) -> Option<usize> {
        self.connectors.iter().position(|c| c.name == name)
    }
}
