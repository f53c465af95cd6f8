//! Directed edges between node connectors.

use super::node::NodeId;

/// A directed connection from a node's write connector to another node's
/// read connector.
///
/// The read connector also stores the reverse link; the edge list exists so
/// consumers can walk the graph in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Producing node.
    pub from: NodeId,
    /// Index of the producer's write connector.
    pub from_connector: usize,
    /// Consuming node.
    pub to: NodeId,
    /// Index of the consumer's read connector.
    pub to_connector: usize,
}
