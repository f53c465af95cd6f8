//! Perspective correction and crop.
//!
//! The user places four corners on the image (normalized to `[0, 1]`,
//! ordered top-left, top-right, bottom-right, bottom-left). Parameter commit
//! turns them into the homography that straightens that quad onto the
//! rectangle spanned by its first corner, the second corner's x and the
//! fourth corner's y.
//!
//! ## Committed block
//!
//! | floats | content |
//! |--------|---------|
//! | 0..9 | homography, row-major |
//! | 9..13 | crop window `x0 x1 y0 y1`, passed through |
//!
//! Region negotiation is a plain passthrough in both directions; the
//! requested input region does not yet account for the transform.

use rawgraph_core::numeric::linalg::solve_homography;
use rawgraph_core::{
    Chan, Connector, Format, Graph, GraphError, ImageParams, ModuleConnector, ModuleData,
    ModuleError, ModuleOps, Node, ParamDescriptor,
};

/// Connector index of the input.
pub const INPUT: usize = 0;
/// Connector index of the output.
pub const OUTPUT: usize = 1;
/// Length of the committed block.
pub const COMMITTED_LEN: usize = 13;

const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::new(
        "perspect",
        "quad corners x y, top-left then clockwise",
        &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
    )
    .with_range(-1.0, 2.0),
    ParamDescriptor::new("crop", "crop window x0 x1 y0 y1", &[0.0, 1.0, 0.0, 1.0])
        .with_range(0.0, 1.0),
];

/// Crop module (`crop`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Crop;

impl ModuleOps for Crop {
    fn name(&self) -> &'static str {
        "crop"
    }

    fn connectors(&self, _img: &ImageParams) -> Vec<ModuleConnector> {
        vec![
            Connector::read("input", Chan::Rgba, Format::F16).smooth(),
            Connector::write("output", Chan::Rgba, Format::F16),
        ]
    }

    fn params(&self) -> &'static [ParamDescriptor] {
        PARAMS
    }

    fn committed_param_len(&self) -> usize {
        COMMITTED_LEN
    }

    fn create_nodes(
        &self,
        graph: &mut Graph,
        _img: &ImageParams,
        module: &ModuleData,
    ) -> Result<(), GraphError> {
        let out = &module.connectors()[OUTPUT];
        let id = graph.add_node(
            Node::new("crop", "main", module.id(), out.roi.wd, out.roi.ht)
                .with_connector(Connector::read("input", Chan::Rgba, Format::F16))
                .with_connector(Connector::write("output", Chan::Rgba, Format::F16)),
        )?;
        graph.connector_copy(module, INPUT, id, 0)?;
        graph.connector_copy(module, OUTPUT, id, 1)
    }

    fn commit_params(&self, _img: &ImageParams, module: &mut ModuleData) -> Result<(), ModuleError> {
        let roi = module.connectors()[INPUT].roi;
        let mut quad = [0.0f32; 8];
        let mut window = [0.0f32; 4];
        if let Some(p) = module.param("perspect") {
            for (k, (q, v)) in quad.iter_mut().zip(p).enumerate() {
                let full = if k % 2 == 0 { roi.full_wd } else { roi.full_ht };
                *q = full as f32 * v;
            }
        }
        if let Some(c) = module.param("crop") {
            window.copy_from_slice(c);
        }

        let h = solve_homography(&quad)
            .map_err(|source| ModuleError::DegenerateParams { module: "crop", source })?;
        #[cfg(feature = "tracing")]
        tracing::trace!("crop_commit: h={h:?}");

        let committed = module.committed_mut();
        committed[..9].copy_from_slice(&h);
        committed[9..].copy_from_slice(&window);
        Ok(())
    }
}
