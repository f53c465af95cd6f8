//! Film-style tone curve through four control points.
//!
//! Parameters `x` and `y` hold the control points in blocked layout. Commit
//! copies them and appends one monotone Hermite tangent per point, so the
//! device evaluates a curve that never overshoots between points.

use rawgraph_core::numeric::spline::monotone_tangents;
use rawgraph_core::{
    Chan, Connector, Format, Graph, GraphError, ImageParams, ModuleConnector, ModuleData,
    ModuleError, ModuleOps, Node, ParamDescriptor,
};

/// Connector index of the input.
pub const INPUT: usize = 0;
/// Connector index of the output.
pub const OUTPUT: usize = 1;
/// Length of the committed block: 8 coordinates and 4 tangents.
pub const COMMITTED_LEN: usize = 12;

const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::new("x", "control point inputs", &[0.0, 0.25, 0.75, 1.0]).with_range(0.0, 1.0),
    ParamDescriptor::new("y", "control point outputs", &[0.0, 0.25, 0.75, 1.0]).with_range(0.0, 1.0),
];

/// Tone curve module (`filmcurv`).
#[derive(Debug, Clone, Copy, Default)]
pub struct FilmCurve;

impl ModuleOps for FilmCurve {
    fn name(&self) -> &'static str {
        "filmcurv"
    }

    fn connectors(&self, _img: &ImageParams) -> Vec<ModuleConnector> {
        vec![
            Connector::read("input", Chan::Rgba, Format::F16),
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
            Node::new("filmcurv", "main", module.id(), out.roi.wd, out.roi.ht)
                .with_connector(Connector::read("input", Chan::Rgba, Format::F16))
                .with_connector(Connector::write("output", Chan::Rgba, Format::F16)),
        )?;
        graph.connector_copy(module, INPUT, id, 0)?;
        graph.connector_copy(module, OUTPUT, id, 1)
    }

    fn commit_params(&self, _img: &ImageParams, module: &mut ModuleData) -> Result<(), ModuleError> {
        let mut points = [0.0f32; 8];
        points.copy_from_slice(&module.params()[..8]);
        let x: [f32; 4] = core::array::from_fn(|i| points[i]);
        let y: [f32; 4] = core::array::from_fn(|i| points[4 + i]);

        let m = monotone_tangents(&x, &y).map_err(|source| ModuleError::DegenerateParams {
            module: "filmcurv",
            source,
        })?;

        let committed = module.committed_mut();
        committed[..8].copy_from_slice(&points);
        committed[8..].copy_from_slice(&m);
        Ok(())
    }
}
