//! Raw image source.
//!
//! Has no inputs. Its single output carries the sensor data: a single-channel
//! 16 bit mosaic when the sensor has a colour filter array, otherwise
//! four-channel half floats. The full size is the uncropped sensor size.

use rawgraph_core::{
    Chan, Connector, Format, Graph, GraphError, ImageParams, ModuleConnector, ModuleData,
    ModuleOps, Node, Roi,
};

/// Connector index of the output.
pub const OUTPUT: usize = 0;

/// Sensor data source (`i-raw`).
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSource;

fn sensor_format(img: &ImageParams) -> (Chan, Format) {
    if img.is_mosaic() {
        (Chan::Rggb, Format::Ui16)
    } else {
        (Chan::Rgba, Format::F16)
    }
}

impl ModuleOps for RawSource {
    fn name(&self) -> &'static str {
        "i-raw"
    }

    fn connectors(&self, img: &ImageParams) -> Vec<ModuleConnector> {
        let (chan, format) = sensor_format(img);
        vec![Connector::write("output", chan, format)]
    }

    fn roi_out(&self, img: &ImageParams, module: &mut ModuleData) {
        let (chan, format) = sensor_format(img);
        let out = &mut module.connectors_mut()[OUTPUT];
        out.chan = chan;
        out.format = format;
        out.roi = Roi::full(img.width, img.height);
    }

    fn roi_in(&self, _img: &ImageParams, _module: &mut ModuleData) {}

    fn create_nodes(
        &self,
        graph: &mut Graph,
        _img: &ImageParams,
        module: &ModuleData,
    ) -> Result<(), GraphError> {
        let out = &module.connectors()[OUTPUT];
        let id = graph.add_node(
            Node::new("i-raw", "source", module.id(), out.roi.wd, out.roi.ht)
                .with_connector(Connector::write("output", out.chan, out.format)),
        )?;
        graph.connector_copy(module, OUTPUT, id, 0)
    }
}
