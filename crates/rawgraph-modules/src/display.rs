//! Display sink.
//!
//! Consumes the end of the pipeline and requests the largest region that fits
//! a `max_wd` x `max_ht` viewport without changing the aspect ratio. Never
//! requests more than the full resolution.

use rawgraph_core::{
    Chan, Connector, Format, Graph, GraphError, ImageParams, ModuleConnector, ModuleData,
    ModuleOps, Node, ParamDescriptor,
};

/// Connector index of the input.
pub const INPUT: usize = 0;

const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::new("max_wd", "viewport width in pixels", &[1920.0]).with_range(1.0, 65535.0),
    ParamDescriptor::new("max_ht", "viewport height in pixels", &[1080.0]).with_range(1.0, 65535.0),
];

/// Display module (`display`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Display;

impl ModuleOps for Display {
    fn name(&self) -> &'static str {
        "display"
    }

    fn connectors(&self, _img: &ImageParams) -> Vec<ModuleConnector> {
        vec![Connector::read("input", Chan::Rgba, Format::F16)]
    }

    fn params(&self) -> &'static [ParamDescriptor] {
        PARAMS
    }

    fn roi_out(&self, _img: &ImageParams, _module: &mut ModuleData) {}

    fn roi_in(&self, _img: &ImageParams, module: &mut ModuleData) {
        let max_wd = module.param_scalar("max_wd", 1920.0) as u32;
        let max_ht = module.param_scalar("max_ht", 1080.0) as u32;
        module.connectors_mut()[INPUT].roi.fit_within(max_wd, max_ht);
    }

    fn create_nodes(
        &self,
        graph: &mut Graph,
        _img: &ImageParams,
        module: &ModuleData,
    ) -> Result<(), GraphError> {
        let input = &module.connectors()[INPUT];
        let id = graph.add_node(
            Node::new("display", "sink", module.id(), input.roi.wd, input.roi.ht)
                .with_connector(Connector::read("input", Chan::Rgba, Format::F16)),
        )?;
        graph.connector_copy(module, INPUT, id, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawgraph_core::{Module, ModuleId, Roi};

    #[test]
    fn requests_fit_preserving_aspect() {
        let img = ImageParams::rgb(6000, 4000);
        let mut m = Module::init(ModuleId::from_index(0), Box::new(Display), "main", &img).unwrap();
        m.data_mut().connectors_mut()[INPUT].roi = Roi::full(6000, 4000);
        m.roi_in(&img);
        let roi = m.data().connectors()[INPUT].roi;
        assert_eq!(roi.ht, 1080);
        assert_eq!(roi.wd, 1620);
        assert!(roi.is_consistent());
    }

    #[test]
    fn never_upscales() {
        let img = ImageParams::rgb(640, 480);
        let mut m = Module::init(ModuleId::from_index(0), Box::new(Display), "main", &img).unwrap();
        m.data_mut().connectors_mut()[INPUT].roi = Roi::full(640, 480);
        m.roi_in(&img);
        assert!(m.data().connectors()[INPUT].roi.is_full_request());
    }
}
