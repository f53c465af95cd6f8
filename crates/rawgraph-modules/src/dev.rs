//! Sensor development: multi-scale denoise on raw or RGB input.
//!
//! The module works at one pixel per mosaic block. Its node expansion is:
//!
//! ```text
//! input ─► half ─► down0 ─► down1 ─► down2 ─► down3
//!           │        │        │        │        │
//!           ▼        ▼        ▼        ▼        ▼
//!           s0       s1       s2       s3       s4   assemble
//!                                                       │
//! input ──────────────────────────────────► orig  doub ◄┘ coarse
//!                                                 │
//!                                                 ▼
//!                                               output
//! ```
//!
//! `half` and `doub` only exist for mosaic input. For four-channel input the
//! module input feeds `down0` and `s0` directly and the assembled image is the
//! module output.
//!
//! ## Push-constant layouts
//!
//! | kernel | words |
//! |--------|-------|
//! | `down` | white balance (4), pyramid level |
//! | `assemble` | white balance (4), noise a, noise b |
//! | `half`, `doub` | white balance (4), black (4), white (4), crop box (4), filters |
//!
//! Black and white points are normalized by 65535.

use bytemuck::{Pod, Zeroable};
use rawgraph_core::{
    Chan, Connector, Format, Graph, GraphError, ImageParams, ModuleConnector, ModuleData,
    ModuleOps, Node, NodeConnector, NodeId, PushConstants, Roi,
};

/// Connector index of the input.
pub const INPUT: usize = 0;
/// Connector index of the output.
pub const OUTPUT: usize = 1;
/// Number of downsample stages.
pub const PYRAMID_LEVELS: usize = 4;

/// Push constants of a `down` node.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DownPush {
    /// White balance multipliers.
    pub wb: [f32; 4],
    /// Pyramid level, 0 is the finest.
    pub level: u32,
}

/// Push constants of the `assemble` node.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct AssemblePush {
    /// White balance multipliers.
    pub wb: [f32; 4],
    /// Signal-independent noise.
    pub noise_a: f32,
    /// Signal-dependent noise.
    pub noise_b: f32,
}

/// Push constants of the mosaic-aware `half` and `doub` nodes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MosaicPush {
    /// White balance multipliers.
    pub wb: [f32; 4],
    /// Black points in `[0, 1]`.
    pub black: [f32; 4],
    /// White points in `[0, 1]`.
    pub white: [f32; 4],
    /// Valid sensor area, `[x0, y0, x1, y1]`.
    pub crop_aabb: [u32; 4],
    /// Colour filter pattern.
    pub filters: u32,
}

impl MosaicPush {
    /// Layout for the image `img`.
    pub fn new(img: &ImageParams) -> Self {
        Self {
            wb: img.whitebalance,
            black: img.black_normalized(),
            white: img.white_normalized(),
            crop_aabb: img.crop_aabb,
            filters: img.filters,
        }
    }
}

/// Development module (`dev`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Dev;

fn rgba(name: &'static str, read: bool, roi: Roi) -> NodeConnector {
    let c = if read {
        Connector::read(name, Chan::Rgba, Format::F16)
    } else {
        Connector::write(name, Chan::Rgba, Format::F16)
    };
    c.with_roi(roi)
}

impl ModuleOps for Dev {
    fn name(&self) -> &'static str {
        "dev"
    }

    fn connectors(&self, _img: &ImageParams) -> Vec<ModuleConnector> {
        vec![
            Connector::read("input", Chan::Rggb, Format::Ui16),
            Connector::write("output", Chan::Rggb, Format::F16),
        ]
    }

    /// The output keeps the input's layout. Mosaic data is cropped to the
    /// valid sensor area.
    fn roi_out(&self, img: &ImageParams, module: &mut ModuleData) {
        let input = module.connectors()[INPUT].clone();
        let out = &mut module.connectors_mut()[OUTPUT];
        out.chan = input.chan;
        out.format = Format::F16;
        out.roi = if input.chan == Chan::Rggb {
            let (wd, ht) = img.crop_size();
            input.roi.with_full_size(wd, ht)
        } else {
            input.roi.with_full_size(input.roi.full_wd, input.roi.full_ht)
        };
    }

    /// Always requests the whole uncropped input; the borders feed the
    /// coarse levels.
    fn roi_in(&self, _img: &ImageParams, module: &mut ModuleData) {
        module.connectors_mut()[INPUT].roi.request_full();
    }

    fn create_nodes(
        &self,
        graph: &mut Graph,
        img: &ImageParams,
        module: &ModuleData,
    ) -> Result<(), GraphError> {
        let input = &module.connectors()[INPUT];
        let output = &module.connectors()[OUTPUT];
        let mosaic = input.chan == Chan::Rggb;
        let block = img.block_size(input.chan);
        let half = output.roi.divided(block);
        let (wd, ht) = (half.full_wd, half.full_ht);
        if wd == 0 || ht == 0 {
            return Err(GraphError::EmptyRegion {
                kernel: "down",
                wd,
                ht,
            });
        }

        graph.reserve_nodes(if mosaic { PYRAMID_LEVELS + 3 } else { PYRAMID_LEVELS + 1 })?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "dev_create_nodes: block={block} reduced={wd}x{ht} mosaic={mosaic}"
        );

        let mut down: Vec<NodeId> = Vec::with_capacity(PYRAMID_LEVELS);
        for level in 0..PYRAMID_LEVELS {
            let push = PushConstants::from_pod(&DownPush {
                wb: img.whitebalance,
                level: level as u32,
            })?;
            down.push(graph.add_node(
                Node::new("dev", "down", module.id(), wd, ht)
                    .with_connector(rgba("input", true, half))
                    .with_connector(rgba("output", false, half))
                    .with_push_constants(push),
            )?);
        }
        for pair in down.windows(2) {
            graph.connect(pair[0], 1, pair[1], 0)?;
        }

        let mut assemble = Node::new("dev", "assemble", module.id(), wd, ht).with_push_constants(
            PushConstants::from_pod(&AssemblePush {
                wb: img.whitebalance,
                noise_a: img.noise_a,
                noise_b: img.noise_b,
            })?,
        );
        for name in ["s0", "s1", "s2", "s3", "s4"] {
            assemble = assemble.with_connector(rgba(name, true, half));
        }
        let assemble = graph.add_node(assemble.with_connector(rgba("output", false, half)))?;
        for (level, &id) in down.iter().enumerate() {
            graph.connect(id, 1, assemble, level + 1)?;
        }

        if mosaic {
            let push = PushConstants::from_pod(&MosaicPush::new(img))?;
            let half_node = graph.add_node(
                Node::new("dev", "half", module.id(), wd, ht)
                    .with_connector(
                        Connector::read("input", Chan::Rggb, Format::Ui16).with_roi(input.roi),
                    )
                    .with_connector(rgba("output", false, half))
                    .with_push_constants(push),
            )?;
            let doub = graph.add_node(
                Node::new("dev", "doub", module.id(), wd, ht)
                    .with_connector(
                        Connector::read("orig", Chan::Rggb, Format::Ui16).with_roi(input.roi),
                    )
                    .with_connector(rgba("coarse", true, half))
                    .with_connector(
                        Connector::write("output", Chan::Rggb, Format::F16).with_roi(output.roi),
                    )
                    .with_push_constants(push),
            )?;
            graph.connect(half_node, 1, down[0], 0)?;
            graph.connect(half_node, 1, assemble, 0)?;
            graph.connect(assemble, 5, doub, 1)?;
            graph.connector_copy(module, INPUT, half_node, 0)?;
            graph.connector_copy(module, INPUT, doub, 0)?;
            graph.connector_copy(module, OUTPUT, doub, 2)
        } else {
            graph.connector_copy(module, INPUT, down[0], 0)?;
            graph.connector_copy(module, INPUT, assemble, 0)?;
            graph.connector_copy(module, OUTPUT, assemble, 5)
        }
    }
}
