//! Pipeline-level modules and the per-kind callback trait.
//!
//! A module is one logical image operation (crop, development, tone curve,
//! ...). Its behavior lives in a [`ModuleOps`] implementation; its state
//! (module-level connectors, user parameters, committed block) lives in
//! [`ModuleData`]. The pipeline driver owns both, bundled as a [`Module`], and
//! calls the trait methods in a fixed order on every compile pass:
//!
//! 1. [`roi_out`](ModuleOps::roi_out) in topological order
//! 2. [`roi_in`](ModuleOps::roi_in) in reverse topological order
//! 3. [`create_nodes`](ModuleOps::create_nodes) in topological order
//! 4. [`commit_params`](ModuleOps::commit_params)
//!
//! Image metadata is passed by shared reference to every callback and is never
//! mutated by a module.

use core::fmt;

use thiserror::Error;

use crate::connector::Connector;
use crate::graph::{Graph, GraphError};
use crate::image::ImageParams;
use crate::numeric::NumericError;
use crate::param_info::{ParamDescriptor, param_block_len, param_span};

/// Connector on a module; its back-reference points at another module.
pub type ModuleConnector = Connector<ModuleId>;

/// Index of a module in the pipeline arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) u32);

impl ModuleId {
    /// Wraps a raw arena index.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Returns the raw arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

/// Errors raised by module initialization and parameter handling.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModuleError {
    /// The committed-parameter block could not be allocated.
    #[error("module {module}: cannot allocate {len} committed parameter floats")]
    Alloc {
        /// Module kind.
        module: &'static str,
        /// Requested number of floats.
        len: usize,
    },

    /// Parameter commit could not derive a finite result.
    #[error("module {module}: degenerate parameters")]
    DegenerateParams {
        /// Module kind.
        module: &'static str,
        /// What went wrong in the derivation.
        #[source]
        source: NumericError,
    },

    /// The module has no parameter with this name.
    #[error("module {module} has no parameter `{name}`")]
    UnknownParam {
        /// Module kind.
        module: &'static str,
        /// Requested parameter name.
        name: String,
    },

    /// Wrong number of values for a parameter.
    #[error("parameter `{name}` expects {expected} values, got {got}")]
    ParamLength {
        /// Parameter name.
        name: &'static str,
        /// Declared length.
        expected: usize,
        /// Supplied length.
        got: usize,
    },

    /// A value is outside the parameter's declared range.
    #[error("parameter `{name}` value {value} outside [{min}, {max}]")]
    ParamOutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f32,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },
}

/// Callbacks implemented once per module kind.
///
/// Implementations are stateless; everything that changes between passes is
/// in the [`ModuleData`] handed to each call.
pub trait ModuleOps: Send {
    /// Module kind name, e.g. `"crop"`.
    fn name(&self) -> &'static str;

    /// Module-level connectors in declaration order. Called once at module
    /// initialization.
    fn connectors(&self, img: &ImageParams) -> Vec<ModuleConnector>;

    /// User-editable parameters, in block order.
    fn params(&self) -> &'static [ParamDescriptor] {
        &[]
    }

    /// Number of floats in the committed-parameter block.
    fn committed_param_len(&self) -> usize {
        0
    }

    /// Computes output ROIs from the already resolved input ROIs.
    ///
    /// The default copies the first input's region onto every output.
    fn roi_out(&self, img: &ImageParams, module: &mut ModuleData) {
        let _ = img;
        passthrough_roi_out(module);
    }

    /// Computes the ROIs requested on the inputs from the requests already
    /// placed on the outputs.
    ///
    /// The default forwards the first output's request to every input.
    fn roi_in(&self, img: &ImageParams, module: &mut ModuleData) {
        let _ = img;
        passthrough_roi_in(module);
    }

    /// Emits this module's nodes into `graph` and maps the module's
    /// connectors onto node connectors.
    fn create_nodes(
        &self,
        graph: &mut Graph,
        img: &ImageParams,
        module: &ModuleData,
    ) -> Result<(), GraphError>;

    /// Packs the live parameters into the committed block.
    fn commit_params(&self, img: &ImageParams, module: &mut ModuleData) -> Result<(), ModuleError> {
        let _ = (img, module);
        Ok(())
    }
}

/// Copies the first input's full size onto every output, resetting the
/// output request to the full region.
pub fn passthrough_roi_out(module: &mut ModuleData) {
    let Some(src) = module.connectors.iter().find(|c| c.is_input()).map(|c| c.roi) else {
        return;
    };
    for c in module.connectors.iter_mut().filter(|c| c.is_output()) {
        c.roi = src;
        c.roi.request_full();
    }
}

/// Forwards the first output's request to every input.
pub fn passthrough_roi_in(module: &mut ModuleData) {
    let Some(request) = module.connectors.iter().find(|c| c.is_output()).map(|c| c.roi) else {
        return;
    };
    for c in module.connectors.iter_mut().filter(|c| c.is_input()) {
        c.roi.request_from(&request);
    }
}

/// Per-instance module state.
#[derive(Debug, Clone)]
pub struct ModuleData {
    id: ModuleId,
    kind: &'static str,
    instance: String,
    pub(crate) connectors: Vec<ModuleConnector>,
    descriptors: &'static [ParamDescriptor],
    params: Vec<f32>,
    committed: Vec<f32>,
}

impl ModuleData {
    /// Arena id.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Module kind name.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Instance name, unique per kind within a pipeline.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Module-level connectors.
    pub fn connectors(&self) -> &[ModuleConnector] {
        &self.connectors
    }

    /// Mutable module-level connectors. ROI callbacks write through this.
    pub fn connectors_mut(&mut self) -> &mut [ModuleConnector] {
        &mut self.connectors
    }

    /// Index of the connector called `name`.
    pub fn connector_index(&self, name: &str) -> Option<usize> {
        self.connectors.iter().position(|c| c.name == name)
    }

    /// Parameter descriptors.
    pub fn descriptors(&self) -> &'static [ParamDescriptor] {
        self.descriptors
    }

    /// The whole flat parameter block.
    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Current values of parameter `name`.
    pub fn param(&self, name: &str) -> Option<&[f32]> {
        let (offset, len) = param_span(self.descriptors, name)?;
        self.params.get(offset..offset + len)
    }

    /// First value of parameter `name`, or `fallback` if it does not exist.
    pub fn param_scalar(&self, name: &str, fallback: f32) -> f32 {
        self.param(name)
            .and_then(|v| v.first().copied())
            .unwrap_or(fallback)
    }

    /// Replaces the values of parameter `name`.
    ///
    /// All values are checked before any is written.
    pub fn set_param(&mut self, name: &str, values: &[f32]) -> Result<(), ModuleError> {
        let index = self
            .descriptors
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| ModuleError::UnknownParam {
                module: self.kind,
                name: name.to_owned(),
            })?;
        let desc = &self.descriptors[index];
        if values.len() != desc.len() {
            return Err(ModuleError::ParamLength {
                name: desc.name,
                expected: desc.len(),
                got: values.len(),
            });
        }
        if let Some(&value) = values.iter().find(|&&v| !desc.accepts(v)) {
            return Err(ModuleError::ParamOutOfRange {
                name: desc.name,
                value,
                min: desc.min,
                max: desc.max,
            });
        }
        let offset: usize = self.descriptors[..index].iter().map(ParamDescriptor::len).sum();
        self.params[offset..offset + values.len()].copy_from_slice(values);
        Ok(())
    }

    /// The committed-parameter block.
    pub fn committed(&self) -> &[f32] {
        &self.committed
    }

    /// Mutable committed-parameter block. Its length is fixed at init.
    pub fn committed_mut(&mut self) -> &mut [f32] {
        &mut self.committed
    }
}

/// A module instance: its callbacks plus its state.
pub struct Module {
    data: ModuleData,
    ops: Box<dyn ModuleOps>,
}

impl Module {
    /// Creates a module and allocates its committed-parameter block.
    ///
    /// Allocation is fallible; on failure nothing is kept and the caller must
    /// not add the module to a pipeline.
    pub fn init(
        id: ModuleId,
        ops: Box<dyn ModuleOps>,
        instance: impl Into<String>,
        img: &ImageParams,
    ) -> Result<Self, ModuleError> {
        let len = ops.committed_param_len();
        let mut committed = Vec::new();
        committed
            .try_reserve_exact(len)
            .map_err(|_| ModuleError::Alloc {
                module: ops.name(),
                len,
            })?;
        committed.resize(len, 0.0);

        let descriptors = ops.params();
        let mut params = Vec::with_capacity(param_block_len(descriptors));
        for d in descriptors {
            params.extend_from_slice(d.default);
        }

        let data = ModuleData {
            id,
            kind: ops.name(),
            instance: instance.into(),
            connectors: ops.connectors(img),
            descriptors,
            params,
            committed,
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "module_init: {id} {}:{} committed={len}",
            data.kind,
            data.instance
        );
        Ok(Self { data, ops })
    }

    /// Releases the module and its committed block. Consuming `self` makes a
    /// second release impossible.
    pub fn cleanup(self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "module_cleanup: {} {}:{}",
            self.data.id,
            self.data.kind,
            self.data.instance
        );
        drop(self);
    }

    /// Module state.
    pub fn data(&self) -> &ModuleData {
        &self.data
    }

    /// Mutable module state.
    pub fn data_mut(&mut self) -> &mut ModuleData {
        &mut self.data
    }

    /// Module callbacks.
    pub fn ops(&self) -> &dyn ModuleOps {
        self.ops.as_ref()
    }

    /// Runs [`ModuleOps::roi_out`].
    pub fn roi_out(&mut self, img: &ImageParams) {
        self.ops.roi_out(img, &mut self.data);
    }

    /// Runs [`ModuleOps::roi_in`].
    pub fn roi_in(&mut self, img: &ImageParams) {
        self.ops.roi_in(img, &mut self.data);
    }

    /// Runs [`ModuleOps::create_nodes`].
    pub fn create_nodes(&self, graph: &mut Graph, img: &ImageParams) -> Result<(), GraphError> {
        self.ops.create_nodes(graph, img, &self.data)
    }

    /// Runs [`ModuleOps::commit_params`].
    pub fn commit_params(&mut self, img: &ImageParams) -> Result<(), ModuleError> {
        self.ops.commit_params(img, &mut self.data)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}
