//! Node arena, wiring primitives and their errors.

use std::collections::HashMap;

use thiserror::Error;

use crate::connector::{Direction, Link};
use crate::module::{ModuleData, ModuleId};

use super::edge::Edge;
use super::node::{MAX_CONNECTORS, Node, NodeId};

/// Node ceiling used when a pipeline does not configure one.
pub const DEFAULT_MAX_NODES: usize = 256;

/// Errors raised while constructing a node graph.
///
/// All of these indicate a construction-logic bug or an exhausted resource
/// bound; they abort the compile pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Adding nodes would exceed the arena's capacity.
    #[error("node capacity exceeded: {requested} nodes requested, max {max}")]
    CapacityExceeded {
        /// Total node count that was requested.
        requested: usize,
        /// Arena capacity.
        max: usize,
    },

    /// The node id does not refer to a node in this graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The connector index is out of range for the node.
    #[error("connector {connector} out of range on node {node}")]
    ConnectorOutOfRange {
        /// Node the connector was looked up on.
        node: NodeId,
        /// Offending index.
        connector: usize,
    },

    /// The connector index is out of range for the module.
    #[error("connector {connector} out of range on module {module}")]
    ModuleConnectorOutOfRange {
        /// Module the connector was looked up on.
        module: ModuleId,
        /// Offending index.
        connector: usize,
    },

    /// The node declares more connectors than a node can hold.
    #[error("node '{kernel}' has {count} connectors, max {max}")]
    TooManyConnectors {
        /// Kernel of the offending node.
        kernel: &'static str,
        /// Declared connector count.
        count: usize,
        /// Per-node limit.
        max: usize,
    },

    /// The source side of a connection is not a write connector.
    #[error("connector {connector} on node {node} is not an output")]
    NotAnOutput {
        /// Node the connector belongs to.
        node: NodeId,
        /// Connector index.
        connector: usize,
    },

    /// The destination side of a connection is not a read connector.
    #[error("connector {connector} on node {node} is not an input")]
    NotAnInput {
        /// Node the connector belongs to.
        node: NodeId,
        /// Connector index.
        connector: usize,
    },

    /// The read connector is already fed by another output.
    #[error("connector {connector} on node {node} is already connected")]
    AlreadyConnected {
        /// Node the connector belongs to.
        node: NodeId,
        /// Connector index.
        connector: usize,
    },

    /// A module pin was copied onto a node pin of the other direction.
    #[error("module connector {module_connector} direction does not match node {node} connector {connector}")]
    DirectionMismatch {
        /// Module connector index.
        module_connector: usize,
        /// Target node.
        node: NodeId,
        /// Target node connector index.
        connector: usize,
    },

    /// A module output was mapped onto node pins twice.
    #[error("output {connector} of module {module} is already bound to a node")]
    AlreadyBound {
        /// Module owning the output.
        module: ModuleId,
        /// Output connector index.
        connector: usize,
    },

    /// A module input's upstream output has not been mapped onto a node yet.
    #[error("output {connector} of upstream module {module} is not bound to a node")]
    UnboundUpstream {
        /// Upstream module.
        module: ModuleId,
        /// Upstream output connector index.
        connector: usize,
    },

    /// A push-constant block exceeds the per-dispatch limit.
    #[error("push constants of {words} words exceed the limit of {max}")]
    PushConstantsTooLarge {
        /// Requested word count.
        words: usize,
        /// Word limit.
        max: usize,
    },

    /// A push-constant struct is not a whole number of aligned 32-bit words.
    #[error("push-constant block of {bytes} bytes is not made of 32-bit words")]
    PushConstantLayout {
        /// Struct size in bytes.
        bytes: usize,
    },

    /// A node would be dispatched over an empty work size.
    #[error("node '{kernel}' has an empty work size {wd}x{ht}")]
    EmptyRegion {
        /// Kernel name of the rejected node.
        kernel: &'static str,
        /// Work width.
        wd: u32,
        /// Work height.
        ht: u32,
    },
}

/// Nodes and edges of one compiled pipeline instance.
///
/// Built fresh by every compile pass. Owns its nodes, its edge list and the
/// mapping from module outputs to the node outputs that realise them.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    max_nodes: usize,
    bindings: HashMap<(ModuleId, usize), Link<NodeId>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NODES)
    }
}

impl Graph {
    /// Creates an empty graph holding at most `max_nodes` nodes.
    pub fn new(max_nodes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(max_nodes.min(DEFAULT_MAX_NODES)),
            edges: Vec::new(),
            max_nodes,
            bindings: HashMap::new(),
        }
    }

    /// Fails unless `count` more nodes fit.
    ///
    /// Modules that create several nodes call this first so that a capacity
    /// violation leaves no half-built expansion behind.
    pub fn reserve_nodes(&self, count: usize) -> Result<(), GraphError> {
        let requested = self.nodes.len() + count;
        if requested > self.max_nodes {
            return Err(GraphError::CapacityExceeded {
                requested,
                max: self.max_nodes,
            });
        }
        Ok(())
    }

    /// Adds a node and returns its id.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        self.reserve_nodes(1)?;
        if node.wd == 0 || node.ht == 0 {
            return Err(GraphError::EmptyRegion {
                kernel: node.kernel,
                wd: node.wd,
                ht: node.ht,
            });
        }
        if node.connectors.len() > MAX_CONNECTORS {
            return Err(GraphError::TooManyConnectors {
                kernel: node.kernel,
                count: node.connectors.len(),
                max: MAX_CONNECTORS,
            });
        }
        let id = NodeId(self.nodes.len() as u32);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            "graph_add: {id} {}/{} {}x{}",
            node.name,
            node.kernel,
            node.wd,
            node.ht
        );
        self.nodes.push(node);
        Ok(id)
    }

    /// Connects output `from_connector` of `from` to input `to_connector` of
    /// `to`.
    ///
    /// The read connector records the back-reference; one output may feed
    /// any number of inputs, an input is fed by exactly one output.
    pub fn connect(
        &mut self,
        from: NodeId,
        from_connector: usize,
        to: NodeId,
        to_connector: usize,
    ) -> Result<(), GraphError> {
        let source = self.node_connector(from, from_connector)?;
        if source.direction != Direction::Write {
            return Err(GraphError::NotAnOutput {
                node: from,
                connector: from_connector,
            });
        }
        let target = self.node_connector(to, to_connector)?;
        if target.direction != Direction::Read {
            return Err(GraphError::NotAnInput {
                node: to,
                connector: to_connector,
            });
        }
        if target.connected.is_some() {
            return Err(GraphError::AlreadyConnected {
                node: to,
                connector: to_connector,
            });
        }

        self.nodes[to.index()].connectors[to_connector].connected = Some(Link {
            id: from,
            connector: from_connector,
        });
        self.edges.push(Edge {
            from,
            from_connector,
            to,
            to_connector,
        });
        #[cfg(feature = "tracing")]
        tracing::trace!("graph_connect: {from}:{from_connector} → {to}:{to_connector}");
        Ok(())
    }

    /// Maps module pin `module_connector` onto node pin `node_connector`.
    ///
    /// The node pin takes over the module pin's channel layout, format, ROI
    /// and sampling flag. For a module output, the node pin becomes the
    /// output's realisation; downstream modules copying their inputs will be
    /// wired to it. For a module input, the node pin is connected to the node
    /// realising the upstream module's output. Unconnected module inputs
    /// leave the node pin open.
    pub fn connector_copy(
        &mut self,
        module: &ModuleData,
        module_connector: usize,
        node: NodeId,
        node_connector: usize,
    ) -> Result<(), GraphError> {
        let pin = module.connectors().get(module_connector).ok_or(
            GraphError::ModuleConnectorOutOfRange {
                module: module.id(),
                connector: module_connector,
            },
        )?;
        let target = self.node_connector(node, node_connector)?;
        if target.direction != pin.direction {
            return Err(GraphError::DirectionMismatch {
                module_connector,
                node,
                connector: node_connector,
            });
        }

        let target = &mut self.nodes[node.index()].connectors[node_connector];
        target.chan = pin.chan;
        target.format = pin.format;
        target.roi = pin.roi;
        target.smooth = pin.smooth;

        match pin.direction {
            Direction::Write => {
                let key = (module.id(), module_connector);
                if self.bindings.contains_key(&key) {
                    return Err(GraphError::AlreadyBound {
                        module: module.id(),
                        connector: module_connector,
                    });
                }
                self.bindings.insert(
                    key,
                    Link {
                        id: node,
                        connector: node_connector,
                    },
                );
                Ok(())
            }
            Direction::Read => {
                let Some(upstream) = pin.connected else {
                    return Ok(());
                };
                let source = self.binding(upstream.id, upstream.connector).ok_or(
                    GraphError::UnboundUpstream {
                        module: upstream.id,
                        connector: upstream.connector,
                    },
                )?;
                self.connect(source.id, source.connector, node, node_connector)
            }
        }
    }

    /// Node pin realising output `connector` of `module`, if bound.
    pub fn binding(&self, module: ModuleId, connector: usize) -> Option<Link<NodeId>> {
        self.bindings.get(&(module, connector)).copied()
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges in creation order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Node capacity.
    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    /// Iterates over `(id, node)` pairs created by `module`.
    pub fn nodes_of(&self, module: ModuleId) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.module == module)
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// First node of `module` running `kernel`.
    pub fn find_node(&self, module: ModuleId, kernel: &str) -> Option<NodeId> {
        self.nodes_of(module)
            .find(|(_, n)| n.kernel == kernel)
            .map(|(id, _)| id)
    }

    /// Edges leaving `node`.
    pub fn outgoing(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.from == node)
    }

    /// Edges arriving at `node`.
    pub fn incoming(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.to == node)
    }

    fn node_connector(
        &self,
        node: NodeId,
        connector: usize,
    ) -> Result<&super::node::NodeConnector, GraphError> {
        self.nodes
            .get(node.index())
            .ok_or(GraphError::NodeNotFound(node))?
            .connectors
            .get(connector)
            .ok_or(GraphError::ConnectorOutOfRange { node, connector })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{Chan, Connector, Format};
    use crate::roi::Roi;

    fn module() -> ModuleId {
        ModuleId::from_index(0)
    }

    fn pass(kernel: &'static str) -> Node {
        Node::new("test", kernel, module(), 16, 16)
            .with_connector(Connector::read("input", Chan::Rgba, Format::F16))
            .with_connector(Connector::write("output", Chan::Rgba, Format::F16))
    }

    #[test]
    fn add_and_connect() {
        let mut graph = Graph::new(4);
        let a = graph.add_node(pass("a")).unwrap();
        let b = graph.add_node(pass("b")).unwrap();
        graph.connect(a, 1, b, 0).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let link = graph.node(b).unwrap().connectors()[0].connected.unwrap();
        assert_eq!(link.id, a);
        assert_eq!(link.connector, 1);
        assert_eq!(graph.outgoing(a).count(), 1);
        assert_eq!(graph.incoming(b).count(), 1);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut graph = Graph::new(2);
        graph.add_node(pass("a")).unwrap();
        graph.add_node(pass("b")).unwrap();
        let result = graph.add_node(pass("c"));
        assert_eq!(
            result,
            Err(GraphError::CapacityExceeded {
                requested: 3,
                max: 2
            })
        );
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn reserve_checks_without_adding() {
        let mut graph = Graph::new(5);
        graph.add_node(pass("a")).unwrap();
        assert!(graph.reserve_nodes(4).is_ok());
        assert!(graph.reserve_nodes(5).is_err());
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn too_many_connectors() {
        let mut node = Node::new("test", "wide", module(), 1, 1);
        for _ in 0..=MAX_CONNECTORS {
            node = node.with_connector(Connector::read("s", Chan::Rgba, Format::F16));
        }
        let mut graph = Graph::new(4);
        assert!(matches!(
            graph.add_node(node),
            Err(GraphError::TooManyConnectors { count: 11, .. })
        ));
    }

    #[test]
    fn empty_work_size_rejected() {
        let mut graph = Graph::new(4);
        let err = graph
            .add_node(Node::new("test", "thin", module(), 0, 16))
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::EmptyRegion {
                kernel: "thin",
                wd: 0,
                ht: 16
            }
        );
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn input_fed_once() {
        let mut graph = Graph::new(4);
        let a = graph.add_node(pass("a")).unwrap();
        let b = graph.add_node(pass("b")).unwrap();
        let c = graph.add_node(pass("c")).unwrap();
        graph.connect(a, 1, c, 0).unwrap();
        assert!(matches!(
            graph.connect(b, 1, c, 0),
            Err(GraphError::AlreadyConnected { .. })
        ));
    }

    #[test]
    fn output_fans_out() {
        let mut graph = Graph::new(4);
        let a = graph.add_node(pass("a")).unwrap();
        let b = graph.add_node(pass("b")).unwrap();
        let c = graph.add_node(pass("c")).unwrap();
        graph.connect(a, 1, b, 0).unwrap();
        graph.connect(a, 1, c, 0).unwrap();
        assert_eq!(graph.outgoing(a).count(), 2);
    }

    #[test]
    fn direction_checks() {
        let mut graph = Graph::new(4);
        let a = graph.add_node(pass("a")).unwrap();
        let b = graph.add_node(pass("b")).unwrap();
        assert!(matches!(
            graph.connect(a, 0, b, 0),
            Err(GraphError::NotAnOutput { .. })
        ));
        assert!(matches!(
            graph.connect(a, 1, b, 1),
            Err(GraphError::NotAnInput { .. })
        ));
    }

    #[test]
    fn out_of_range_indices() {
        let mut graph = Graph::new(4);
        let a = graph.add_node(pass("a")).unwrap();
        assert!(matches!(
            graph.connect(a, 5, a, 0),
            Err(GraphError::ConnectorOutOfRange { connector: 5, .. })
        ));
        assert!(matches!(
            graph.connect(NodeId(9), 1, a, 0),
            Err(GraphError::NodeNotFound(_))
        ));
    }

    #[test]
    fn find_node_by_kernel() {
        let mut graph = Graph::new(4);
        graph.add_node(pass("a")).unwrap();
        let b = graph.add_node(pass("b")).unwrap();
        assert_eq!(graph.find_node(module(), "b"), Some(b));
        assert_eq!(graph.find_node(module(), "z"), None);
        assert_eq!(graph.nodes_of(module()).count(), 2);
        let roi = graph.node(b).unwrap().connectors()[0].roi;
        assert_eq!(roi, Roi::default());
    }
}
