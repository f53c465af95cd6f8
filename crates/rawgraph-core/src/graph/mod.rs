//! Dispatch-level node graph.
//!
//! Each module expands into one or more [`Node`]s during
//! [`create_nodes`](crate::ModuleOps::create_nodes). A node is a single GPU
//! compute dispatch with a work size, a small array of typed connectors and a
//! packed push-constant block. Nodes are wired output-to-input by
//! [`Graph::connect`]; module-level pins are mapped onto node-level pins by
//! [`Graph::connector_copy`].
//!
//! # Arena
//!
//! Nodes live in a flat arena indexed by [`NodeId`]. The arena has a hard
//! capacity fixed at construction; exceeding it is an error, never a silent
//! truncation. A graph is built fresh on every compile pass and never patched
//! incrementally, so ids are plain indices with no generation tracking.
//!
//! # Example
//!
//! ```rust
//! use rawgraph_core::{Chan, Connector, Format, Graph, ModuleId, Node, Roi};
//!
//! let roi = Roi::full(64, 64);
//! let mut graph = Graph::new(8);
//! let a = graph.add_node(
//!     Node::new("demo", "fill", ModuleId::from_index(0), 64, 64)
//!         .with_connector(Connector::write("output", Chan::Rgba, Format::F16).with_roi(roi)),
//! )?;
//! let b = graph.add_node(
//!     Node::new("demo", "blur", ModuleId::from_index(0), 64, 64)
//!         .with_connector(Connector::read("input", Chan::Rgba, Format::F16).with_roi(roi))
//!         .with_connector(Connector::write("output", Chan::Rgba, Format::F16).with_roi(roi)),
//! )?;
//! graph.connect(a, 0, b, 0)?;
//! assert_eq!(graph.edge_count(), 1);
//! # Ok::<(), rawgraph_core::GraphError>(())
//! ```

pub mod compiled;
pub mod construction;
pub mod edge;
pub mod node;

pub use compiled::{CommittedBlock, CompiledGraph};
pub use construction::{DEFAULT_MAX_NODES, Graph, GraphError};
pub use edge::Edge;
pub use node::{MAX_CONNECTORS, Node, NodeConnector, NodeId};
