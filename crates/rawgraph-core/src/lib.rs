//! Rawgraph Core - graph compilation for GPU image pipelines
//!
//! This crate turns a user-editable chain of image-processing modules into a
//! concrete graph of GPU compute dispatches. It does not allocate GPU memory,
//! compile shaders or submit work; it produces the node graph, its wiring and
//! the packed parameter blocks a GPU backend consumes.
//!
//! # Core Abstractions
//!
//! ## Regions and Pins
//!
//! - [`Roi`] - Region of interest carried by every connector
//! - [`Connector`] - Typed, named pin on a module or node
//! - [`ImageParams`] - Read-only sensor metadata shared by all modules
//!
//! ## Modules
//!
//! - [`ModuleOps`] - Per-kind callbacks (ROI negotiation, node construction,
//!   parameter commit)
//! - [`Module`] / [`ModuleData`] - A module instance and its state
//! - [`ParamDescriptor`] - Named run of floats in a module's parameter block
//!
//! ## Graph
//!
//! - [`Graph`] - Fixed-capacity node arena with output-to-input wiring
//! - [`Node`] - One compute dispatch with its connectors and push constants
//! - [`PushConstants`] - Packed 32-bit words attached to a dispatch
//!
//! ## Driver
//!
//! - [`Pipeline`] - Module arena, module-level wiring and the compile pass
//! - [`CompiledGraph`] - Result of a compile pass
//!
//! ## Numerics
//!
//! - [`numeric::linalg`] - Gaussian elimination and quad-to-rectangle
//!   homographies
//! - [`numeric::spline`] - Monotone cubic Hermite tangents
//!
//! # Example
//!
//! ```rust,ignore
//! use rawgraph_core::{ImageParams, Pipeline};
//!
//! let mut pipe = Pipeline::new(ImageParams::rgb(6000, 4000));
//! let src = pipe.add_module(registry.create(ModuleKind::Source), "main")?;
//! let crop = pipe.add_module(registry.create(ModuleKind::Crop), "main")?;
//! pipe.connect(src, 0, crop, 0)?;
//! pipe.set_param(crop, "perspect", &[0.05, 0.0, 0.95, 0.02, 1.0, 1.0, 0.0, 0.98])?;
//!
//! let compiled = pipe.compile()?;
//! for node in compiled.nodes() {
//!     println!("{}/{} {}x{}", node.name, node.kernel, node.wd, node.ht);
//! }
//! ```
//!
//! # Features
//!
//! - `tracing`: emit `tracing` events at pass boundaries, node creation,
//!   wiring and module lifecycle.

pub mod connector;
pub mod graph;
pub mod image;
pub mod module;
pub mod numeric;
pub mod param_info;
pub mod pipeline;
pub mod push;
pub mod roi;

// Re-export main types at crate root
pub use connector::{Chan, Connector, Direction, Format, Link};
pub use graph::{
    CommittedBlock, CompiledGraph, DEFAULT_MAX_NODES, Edge, Graph, GraphError, MAX_CONNECTORS,
    Node, NodeConnector, NodeId,
};
pub use image::{FILTERS_XTRANS, ImageParams, RAW_WHITE};
pub use module::{
    Module, ModuleConnector, ModuleData, ModuleError, ModuleId, ModuleOps, passthrough_roi_in,
    passthrough_roi_out,
};
pub use numeric::NumericError;
pub use param_info::{ParamDescriptor, param_block_len, param_span};
pub use pipeline::{Pipeline, PipelineError};
pub use push::{MAX_PUSH_WORDS, PushConstants};
pub use roi::{Roi, RoiError, SCALE_TOLERANCE_PX};
