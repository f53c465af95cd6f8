//! Block demosaic: raw mosaic to four-channel colour.
//!
//! Collapses every mosaic block (2x2 Bayer, 3x3 X-Trans) into one colour
//! pixel, so the output is the input divided by the block size. Four-channel
//! input passes through at block size 1.
//!
//! ## Push-constant layout
//!
//! | words | content |
//! |-------|---------|
//! | 0..4 | white balance |
//! | 4 | colour filter pattern |
//! | 5 | block size |

use bytemuck::{Pod, Zeroable};
use rawgraph_core::{
    Chan, Connector, Format, Graph, GraphError, ImageParams, ModuleConnector, ModuleData,
    ModuleOps, Node, PushConstants, Roi,
};

/// Connector index of the input.
pub const INPUT: usize = 0;
/// Connector index of the output.
pub const OUTPUT: usize = 1;

/// Push constants of the demosaic node.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DemosaicPush {
    /// White balance multipliers.
    pub wb: [f32; 4],
    /// Colour filter pattern.
    pub filters: u32,
    /// Mosaic pixels per output pixel along each axis.
    pub block: u32,
}

/// Demosaic module (`demosaic`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Demosaic;

impl ModuleOps for Demosaic {
    fn name(&self) -> &'static str {
        "demosaic"
    }

    fn connectors(&self, _img: &ImageParams) -> Vec<ModuleConnector> {
        vec![
            Connector::read("input", Chan::Rggb, Format::F16),
            Connector::write("output", Chan::Rgba, Format::F16),
        ]
    }

    fn roi_out(&self, img: &ImageParams, module: &mut ModuleData) {
        let input = module.connectors()[INPUT].roi;
        let block = img.block_size(module.connectors()[INPUT].chan);
        let reduced = input.divided(block);
        let out = &mut module.connectors_mut()[OUTPUT];
        out.chan = Chan::Rgba;
        out.format = Format::F16;
        out.roi = Roi::full(reduced.full_wd, reduced.full_ht);
    }

    /// Asks for the mosaic region under the requested colour pixels, at the
    /// same scale.
    fn roi_in(&self, img: &ImageParams, module: &mut ModuleData) {
        let block = img.block_size(module.connectors()[INPUT].chan);
        let request = module.connectors()[OUTPUT].roi;
        let input = &mut module.connectors_mut()[INPUT].roi;
        if request.is_full_request() {
            input.request_full();
            return;
        }
        input.wd = ((input.full_wd as f32 * request.scale) as u32).clamp(1, input.full_wd.max(1));
        input.ht = ((input.full_ht as f32 * request.scale) as u32).clamp(1, input.full_ht.max(1));
        input.x = request.x * block;
        input.y = request.y * block;
        input.scale = request.scale;
    }

    fn create_nodes(
        &self,
        graph: &mut Graph,
        img: &ImageParams,
        module: &ModuleData,
    ) -> Result<(), GraphError> {
        let input = &module.connectors()[INPUT];
        let out = &module.connectors()[OUTPUT];
        let push = PushConstants::from_pod(&DemosaicPush {
            wb: img.whitebalance,
            filters: img.filters,
            block: img.block_size(input.chan),
        })?;
        let id = graph.add_node(
            Node::new("demosaic", "main", module.id(), out.roi.wd, out.roi.ht)
                .with_connector(Connector::read("input", input.chan, Format::F16))
                .with_connector(Connector::write("output", Chan::Rgba, Format::F16))
                .with_push_constants(push),
        )?;
        graph.connector_copy(module, INPUT, id, 0)?;
        graph.connector_copy(module, OUTPUT, id, 1)
    }
}
