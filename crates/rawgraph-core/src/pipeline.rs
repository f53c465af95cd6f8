//! Pipeline driver: module arena, module-level wiring and the compile pass.
//!
//! A [`Pipeline`] owns the image metadata, the modules and their module-level
//! connections. [`Pipeline::compile`] runs one full pass:
//!
//! 1. topological sort of the modules (Kahn's algorithm)
//! 2. forward pass: every input checks and adopts its producer's full size,
//!    channel layout and format, then the module computes its outputs
//!    ([`ModuleOps::roi_out`](crate::ModuleOps::roi_out))
//! 3. backward pass: every output takes the largest request placed by its
//!    consumers (or the full region if nothing consumes it), then the module
//!    computes its input requests ([`ModuleOps::roi_in`](crate::ModuleOps::roi_in))
//! 4. every module connector ROI is validated
//! 5. node construction into a fresh [`Graph`]
//! 6. parameter commit
//!
//! The pass is sequential and stops at the first error. A failed pass returns
//! no graph, but module connector ROIs and the committed blocks of modules
//! already visited stay updated in place; the next pass recomputes them.

use std::collections::VecDeque;

use thiserror::Error;

use crate::connector::{Chan, Link};
use crate::graph::{CommittedBlock, CompiledGraph, DEFAULT_MAX_NODES, Graph, GraphError};
use crate::image::ImageParams;
use crate::module::{Module, ModuleError, ModuleId, ModuleOps};
use crate::roi::{Roi, RoiError};

/// Errors raised while editing or compiling a pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// The module id does not refer to a live module.
    #[error("module {0} not found")]
    ModuleNotFound(ModuleId),

    /// The connector index is out of range for the module.
    #[error("module {module} has no connector {connector}")]
    ConnectorOutOfRange {
        /// Module.
        module: ModuleId,
        /// Requested connector index.
        connector: usize,
    },

    /// A connection must start at a write connector.
    #[error("connector {connector} of {module} is not an output")]
    NotAnOutput {
        /// Module.
        module: ModuleId,
        /// Connector index.
        connector: usize,
    },

    /// A connection must end at a read connector.
    #[error("connector {connector} of {module} is not an input")]
    NotAnInput {
        /// Module.
        module: ModuleId,
        /// Connector index.
        connector: usize,
    },

    /// The connection would close a cycle.
    #[error("connection would create a cycle")]
    CycleDetected,

    /// The input is already fed by another output.
    #[error("input {connector} of {module} is already connected")]
    DuplicateInput {
        /// Module.
        module: ModuleId,
        /// Connector index.
        connector: usize,
    },

    /// An input has no producer at compile time.
    #[error("input `{connector}` of {kind}:{instance} is not connected")]
    UnconnectedInput {
        /// Module kind.
        kind: &'static str,
        /// Module instance.
        instance: String,
        /// Connector name.
        connector: &'static str,
    },

    /// An input is fed data in a channel layout it cannot read.
    #[error("input `{connector}` of {kind}:{instance} expects {expected}, got {got}")]
    IncompatibleChan {
        /// Module kind.
        kind: &'static str,
        /// Module instance.
        instance: String,
        /// Connector name.
        connector: &'static str,
        /// Layout the module declares for the input.
        expected: Chan,
        /// Layout of the upstream output.
        got: Chan,
    },

    /// ROI negotiation left a connector in an inconsistent state.
    #[error("connector `{connector}` of {kind}:{instance} has an invalid region")]
    InvalidRoi {
        /// Module kind.
        kind: &'static str,
        /// Module instance.
        instance: String,
        /// Connector name.
        connector: &'static str,
        /// What is wrong with the region.
        #[source]
        source: RoiError,
    },

    /// Node construction failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Module initialization, parameter update or commit failed.
    #[error(transparent)]
    Module(#[from] ModuleError),
}

/// An editable pipeline of modules.
///
/// ## Example
///
/// ```rust,ignore
/// let mut pipe = Pipeline::new(ImageParams::rgb(1920, 1080));
/// let src = pipe.add_module(Box::new(Source), "main")?;
/// let out = pipe.add_module(Box::new(Display), "main")?;
/// pipe.connect(src, 0, out, 0)?;
/// let compiled = pipe.compile()?;
/// ```
pub struct Pipeline {
    img: ImageParams,
    modules: Vec<Option<Module>>,
    max_nodes: usize,
}

impl Pipeline {
    /// An empty pipeline for an image with metadata `img`.
    pub fn new(img: ImageParams) -> Self {
        Self {
            img,
            modules: Vec::new(),
            max_nodes: DEFAULT_MAX_NODES,
        }
    }

    /// Sets the node ceiling used by [`compile`](Self::compile).
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Image metadata shared with every module.
    pub fn image(&self) -> &ImageParams {
        &self.img
    }

    /// Replaces the image metadata. Takes effect on the next compile.
    pub fn set_image(&mut self, img: ImageParams) {
        self.img = img;
    }

    /// Node ceiling.
    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    /// Initializes a module and adds it to the pipeline.
    pub fn add_module(
        &mut self,
        ops: Box<dyn ModuleOps>,
        instance: impl Into<String>,
    ) -> Result<ModuleId, PipelineError> {
        let id = ModuleId::from_index(self.modules.len());
        let module = Module::init(id, ops, instance, &self.img)?;
        self.modules.push(Some(module));
        Ok(id)
    }

    /// Removes a module, disconnecting every input it fed, and releases it.
    pub fn remove_module(&mut self, id: ModuleId) -> Result<(), PipelineError> {
        let module = self
            .modules
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(PipelineError::ModuleNotFound(id))?;
        for m in self.modules.iter_mut().flatten() {
            for c in m.data_mut().connectors_mut() {
                if c.connected.is_some_and(|l| l.id == id) {
                    c.connected = None;
                }
            }
        }
        module.cleanup();
        Ok(())
    }

    /// Module by id.
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutable module by id.
    pub fn module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Live modules in id order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().flatten()
    }

    /// Number of live modules.
    pub fn module_count(&self) -> usize {
        self.modules.iter().flatten().count()
    }

    /// Id of the module with kind `kind` and instance name `instance`.
    pub fn find(&self, kind: &str, instance: &str) -> Option<ModuleId> {
        self.modules()
            .find(|m| m.data().kind() == kind && m.data().instance() == instance)
            .map(|m| m.data().id())
    }

    /// Connects output `from_connector` of `from` to input `to_connector` of
    /// `to`.
    pub fn connect(
        &mut self,
        from: ModuleId,
        from_connector: usize,
        to: ModuleId,
        to_connector: usize,
    ) -> Result<(), PipelineError> {
        let source = self
            .get(from)?
            .data()
            .connectors()
            .get(from_connector)
            .ok_or(PipelineError::ConnectorOutOfRange {
                module: from,
                connector: from_connector,
            })?;
        if !source.is_output() {
            return Err(PipelineError::NotAnOutput {
                module: from,
                connector: from_connector,
            });
        }
        let target = self
            .get(to)?
            .data()
            .connectors()
            .get(to_connector)
            .ok_or(PipelineError::ConnectorOutOfRange {
                module: to,
                connector: to_connector,
            })?;
        if !target.is_input() {
            return Err(PipelineError::NotAnInput {
                module: to,
                connector: to_connector,
            });
        }
        if target.connected.is_some() {
            return Err(PipelineError::DuplicateInput {
                module: to,
                connector: to_connector,
            });
        }
        if from == to || self.can_reach(to, from) {
            return Err(PipelineError::CycleDetected);
        }

        self.get_mut(to)?.data_mut().connectors_mut()[to_connector].connected = Some(Link {
            id: from,
            connector: from_connector,
        });
        #[cfg(feature = "tracing")]
        tracing::debug!("pipeline_connect: {from}:{from_connector} → {to}:{to_connector}");
        Ok(())
    }

    /// Disconnects input `connector` of `module`. Disconnecting an open input
    /// is a no-op.
    pub fn disconnect(&mut self, module: ModuleId, connector: usize) -> Result<(), PipelineError> {
        let pin = self
            .get_mut(module)?
            .data_mut()
            .connectors_mut()
            .get_mut(connector)
            .ok_or(PipelineError::ConnectorOutOfRange { module, connector })?;
        if !pin.is_input() {
            return Err(PipelineError::NotAnInput { module, connector });
        }
        pin.connected = None;
        Ok(())
    }

    /// Sets parameter `name` of `module`.
    pub fn set_param(
        &mut self,
        module: ModuleId,
        name: &str,
        values: &[f32],
    ) -> Result<(), PipelineError> {
        self.get_mut(module)?.data_mut().set_param(name, values)?;
        Ok(())
    }

    /// Current values of parameter `name` of `module`.
    pub fn param(&self, module: ModuleId, name: &str) -> Option<&[f32]> {
        self.module(module)?.data().param(name)
    }

    /// Runs a full compile pass.
    ///
    /// Module connector ROIs and committed blocks are updated in place; the
    /// node graph is built from scratch.
    pub fn compile(&mut self) -> Result<CompiledGraph, PipelineError> {
        let order = self.sort()?;
        #[cfg(feature = "tracing")]
        tracing::debug!("pipeline_compile: {} modules", order.len());

        for &id in &order {
            self.adopt_inputs(id)?;
            if let Some(m) = self.modules[id.index()].as_mut() {
                m.roi_out(&self.img);
            }
        }

        for &id in order.iter().rev() {
            self.take_requests(id);
            if let Some(m) = self.modules[id.index()].as_mut() {
                m.roi_in(&self.img);
            }
        }

        for &id in &order {
            let data = self.get(id)?.data();
            for c in data.connectors() {
                c.roi.validate().map_err(|source| PipelineError::InvalidRoi {
                    kind: data.kind(),
                    instance: data.instance().to_owned(),
                    connector: c.name,
                    source,
                })?;
            }
        }

        let mut graph = Graph::new(self.max_nodes);
        for &id in &order {
            self.get(id)?.create_nodes(&mut graph, &self.img)?;
        }

        let mut committed = Vec::with_capacity(order.len());
        for &id in &order {
            let Some(m) = self.modules[id.index()].as_mut() else {
                return Err(PipelineError::ModuleNotFound(id));
            };
            m.commit_params(&self.img)?;
            committed.push(CommittedBlock {
                module: id,
                kind: m.data().kind(),
                words: m.data().committed().to_vec(),
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "pipeline_compiled: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(CompiledGraph::new(graph, committed))
    }

    /// Forward step for one module: inputs take their producer's full size,
    /// channel layout and format. The producer's layout must be one the
    /// module declares it can read.
    fn adopt_inputs(&mut self, id: ModuleId) -> Result<(), PipelineError> {
        let module = self.get(id)?;
        let declared = module.ops().connectors(&self.img);
        let data = module.data();
        let mut adopted = Vec::new();
        for (i, c) in data.connectors().iter().enumerate().filter(|(_, c)| c.is_input()) {
            let link = c.connected.ok_or_else(|| PipelineError::UnconnectedInput {
                kind: data.kind(),
                instance: data.instance().to_owned(),
                connector: c.name,
            })?;
            let src = self
                .get(link.id)?
                .data()
                .connectors()
                .get(link.connector)
                .ok_or(PipelineError::ConnectorOutOfRange {
                    module: link.id,
                    connector: link.connector,
                })?;
            let expected = declared.get(i).map_or(c.chan, |d| d.chan);
            if !expected.accepts(src.chan) {
                return Err(PipelineError::IncompatibleChan {
                    kind: data.kind(),
                    instance: data.instance().to_owned(),
                    connector: c.name,
                    expected,
                    got: src.chan,
                });
            }
            adopted.push((i, src.chan, src.format, src.roi));
        }

        let connectors = self.get_mut(id)?.data_mut().connectors_mut();
        for (i, chan, format, roi) in adopted {
            let c = &mut connectors[i];
            c.chan = chan;
            c.format = format;
            c.roi = Roi::full(roi.full_wd, roi.full_ht);
        }
        Ok(())
    }

    /// Backward step for one module: every output takes the largest request
    /// placed on it by a consumer, or the full region if nothing reads it.
    fn take_requests(&mut self, id: ModuleId) {
        let Some(module) = self.module(id) else {
            return;
        };
        let outputs: Vec<usize> = module
            .data()
            .connectors()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_output())
            .map(|(i, _)| i)
            .collect();

        for o in outputs {
            let request = self
                .modules()
                .flat_map(|m| m.data().connectors())
                .filter(|c| c.connected == Some(Link { id, connector: o }))
                .map(|c| c.roi)
                .max_by_key(|r| u64::from(r.wd) * u64::from(r.ht));
            if let Some(m) = self.module_mut(id) {
                let roi = &mut m.data_mut().connectors_mut()[o].roi;
                match request {
                    Some(r) => roi.request_from(&r),
                    None => roi.request_full(),
                }
            }
        }
    }

    /// Topological order of the live modules.
    fn sort(&self) -> Result<Vec<ModuleId>, PipelineError> {
        let downstream = self.downstream();
        let mut in_degree = vec![0usize; self.modules.len()];
        for consumers in &downstream {
            for &c in consumers {
                in_degree[c] += 1;
            }
        }

        let mut queue: VecDeque<usize> = (0..self.modules.len())
            .filter(|&i| self.modules[i].is_some() && in_degree[i] == 0)
            .collect();
        let mut sorted = Vec::with_capacity(self.modules.len());
        while let Some(i) = queue.pop_front() {
            sorted.push(ModuleId::from_index(i));
            for &c in &downstream[i] {
                in_degree[c] -= 1;
                if in_degree[c] == 0 {
                    queue.push_back(c);
                }
            }
        }

        if sorted.len() != self.module_count() {
            return Err(PipelineError::CycleDetected);
        }
        Ok(sorted)
    }

    /// Consumers of each module slot, one entry per connected input.
    fn downstream(&self) -> Vec<Vec<usize>> {
        let mut downstream = vec![Vec::new(); self.modules.len()];
        for m in self.modules() {
            for c in m.data().connectors() {
                if let Some(link) = c.connected
                    && let Some(list) = downstream.get_mut(link.id.index())
                {
                    list.push(m.data().id().index());
                }
            }
        }
        downstream
    }

    /// DFS reachability over module connections.
    fn can_reach(&self, from: ModuleId, to: ModuleId) -> bool {
        let downstream = self.downstream();
        let mut visited = vec![false; self.modules.len()];
        let mut stack = vec![from.index()];
        while let Some(current) = stack.pop() {
            if current == to.index() {
                return true;
            }
            if current >= visited.len() || visited[current] {
                continue;
            }
            visited[current] = true;
            stack.extend_from_slice(&downstream[current]);
        }
        false
    }

    fn get(&self, id: ModuleId) -> Result<&Module, PipelineError> {
        self.module(id).ok_or(PipelineError::ModuleNotFound(id))
    }

    fn get_mut(&mut self, id: ModuleId) -> Result<&mut Module, PipelineError> {
        self.module_mut(id).ok_or(PipelineError::ModuleNotFound(id))
    }
}

impl core::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pipeline")
            .field("img", &self.img)
            .field("modules", &self.module_count())
            .field("max_nodes", &self.max_nodes)
            .finish()
    }
}
