//! Integration tests for rawgraph-modules.
//!
//! Compiles full pipelines (source, development, demosaic, crop, tone curve,
//! display) and checks the resulting node graph: node counts, pyramid wiring,
//! mosaic-aware stages, node sizes, push constants and committed blocks.

use rawgraph_core::{
    Chan, CompiledGraph, FILTERS_XTRANS, Format, GraphError, ImageParams, ModuleError, ModuleId,
    NodeId, Pipeline, PipelineError,
};
use rawgraph_modules::{AssemblePush, DemosaicPush, DownPush, ModuleKind};

const BAYER: u32 = 0x94949494;

fn bayer_image() -> ImageParams {
    ImageParams {
        filters: BAYER,
        whitebalance: [2.0, 1.0, 1.5, 1.0],
        black: [512.0; 4],
        white: [16383.0; 4],
        noise_a: 0.25,
        noise_b: 0.5,
        crop_aabb: [8, 8, 5992, 3992],
        ..ImageParams::rgb(6000, 4000)
    }
}

struct Ids {
    source: ModuleId,
    dev: ModuleId,
    demosaic: ModuleId,
    crop: ModuleId,
    curve: ModuleId,
    display: ModuleId,
}

fn full_pipeline(img: ImageParams) -> (Pipeline, Ids) {
    let mut pipe = Pipeline::new(img);
    let ids = Ids {
        source: pipe.add_module(ModuleKind::Source.create(), "main").unwrap(),
        dev: pipe.add_module(ModuleKind::Dev.create(), "main").unwrap(),
        demosaic: pipe.add_module(ModuleKind::Demosaic.create(), "main").unwrap(),
        crop: pipe.add_module(ModuleKind::Crop.create(), "main").unwrap(),
        curve: pipe.add_module(ModuleKind::FilmCurve.create(), "main").unwrap(),
        display: pipe.add_module(ModuleKind::Display.create(), "main").unwrap(),
    };
    pipe.connect(ids.source, 0, ids.dev, 0).unwrap();
    pipe.connect(ids.dev, 1, ids.demosaic, 0).unwrap();
    pipe.connect(ids.demosaic, 1, ids.crop, 0).unwrap();
    pipe.connect(ids.crop, 1, ids.curve, 0).unwrap();
    pipe.connect(ids.curve, 1, ids.display, 0).unwrap();
    (pipe, ids)
}

fn kernel(compiled: &CompiledGraph, module: ModuleId, kernel: &str) -> NodeId {
    compiled
        .graph()
        .find_node(module, kernel)
        .unwrap_or_else(|| panic!("no {kernel} node"))
}

fn feeder(compiled: &CompiledGraph, node: NodeId, connector: usize) -> (NodeId, usize) {
    let link = compiled
        .node(node)
        .unwrap()
        .connector(connector)
        .unwrap()
        .connected
        .expect("input is wired");
    (link.id, link.connector)
}

#[test]
fn raw_pipeline_node_layout() {
    let (mut pipe, ids) = full_pipeline(bayer_image());
    let compiled = pipe.compile().unwrap();
    assert_eq!(compiled.nodes().len(), 1 + 7 + 1 + 1 + 1 + 1);

    let kernels: Vec<&str> = compiled
        .graph()
        .nodes_of(ids.dev)
        .map(|(_, n)| n.kernel)
        .collect();
    assert_eq!(
        kernels,
        ["down", "down", "down", "down", "assemble", "half", "doub"]
    );

    // one pixel per 2x2 block of the cropped sensor area
    for (_, n) in compiled.graph().nodes_of(ids.dev) {
        assert_eq!((n.wd, n.ht), (2992, 1992), "{}", n.kernel);
    }
}

#[test]
fn pyramid_and_mosaic_wiring() {
    let (mut pipe, ids) = full_pipeline(bayer_image());
    let compiled = pipe.compile().unwrap();
    let graph = compiled.graph();
    let down: Vec<NodeId> = graph
        .nodes_of(ids.dev)
        .filter(|(_, n)| n.kernel == "down")
        .map(|(id, _)| id)
        .collect();
    let assemble = kernel(&compiled, ids.dev, "assemble");
    let half = kernel(&compiled, ids.dev, "half");
    let doub = kernel(&compiled, ids.dev, "doub");
    let source = kernel(&compiled, ids.source, "source");

    for i in 1..4 {
        assert_eq!(feeder(&compiled, down[i], 0), (down[i - 1], 1));
    }
    assert_eq!(feeder(&compiled, down[0], 0), (half, 1));
    assert_eq!(feeder(&compiled, assemble, 0), (half, 1));
    for i in 0..4 {
        assert_eq!(feeder(&compiled, assemble, i + 1), (down[i], 1));
    }
    assert_eq!(feeder(&compiled, half, 0), (source, 0));
    assert_eq!(feeder(&compiled, doub, 0), (source, 0));
    assert_eq!(feeder(&compiled, doub, 1), (assemble, 5));

    let demosaic = kernel(&compiled, ids.demosaic, "main");
    assert_eq!(feeder(&compiled, demosaic, 0), (doub, 2));
    let crop = kernel(&compiled, ids.crop, "main");
    assert_eq!(feeder(&compiled, crop, 0), (demosaic, 1));
    let curve = kernel(&compiled, ids.curve, "main");
    assert_eq!(feeder(&compiled, curve, 0), (crop, 1));
    let sink = kernel(&compiled, ids.display, "sink");
    assert_eq!(feeder(&compiled, sink, 0), (curve, 1));
}

#[test]
fn mosaic_stage_regions() {
    let (mut pipe, ids) = full_pipeline(bayer_image());
    let compiled = pipe.compile().unwrap();
    let half = compiled.node(kernel(&compiled, ids.dev, "half")).unwrap();
    let doub = compiled.node(kernel(&compiled, ids.dev, "doub")).unwrap();

    let raw_in = half.connector(0).unwrap();
    assert_eq!((raw_in.chan, raw_in.format), (Chan::Rggb, Format::Ui16));
    assert_eq!((raw_in.roi.full_wd, raw_in.roi.full_ht), (6000, 4000));
    assert!(raw_in.roi.is_full_request());

    let out = doub.connector(2).unwrap();
    assert_eq!((out.roi.full_wd, out.roi.full_ht), (5984, 3984));
    assert!((2159..=2160).contains(&out.roi.ht));
    assert!(out.roi.is_consistent());
    assert_eq!(out.chan, Chan::Rggb);

    let demosaic = compiled.node(kernel(&compiled, ids.demosaic, "main")).unwrap();
    let colour = demosaic.connector(1).unwrap();
    assert_eq!(colour.chan, Chan::Rgba);
    assert_eq!((colour.roi.full_wd, colour.roi.full_ht), (2992, 1992));
    assert!((1079..=1080).contains(&colour.roi.ht));
}

#[test]
fn push_constant_blocks() {
    let img = bayer_image();
    let (mut pipe, ids) = full_pipeline(img.clone());
    let compiled = pipe.compile().unwrap();
    let graph = compiled.graph();

    for (level, (_, n)) in graph
        .nodes_of(ids.dev)
        .filter(|(_, n)| n.kernel == "down")
        .enumerate()
    {
        let expected = bytemuck::bytes_of(&DownPush {
            wb: img.whitebalance,
            level: level as u32,
        })
        .to_vec();
        assert_eq!(n.push_constants.as_bytes(), expected.as_slice());
    }

    let assemble = compiled.node(kernel(&compiled, ids.dev, "assemble")).unwrap();
    let expected = AssemblePush {
        wb: img.whitebalance,
        noise_a: 0.25,
        noise_b: 0.5,
    };
    assert_eq!(
        assemble.push_constants.as_bytes(),
        bytemuck::bytes_of(&expected)
    );

    let half = compiled.node(kernel(&compiled, ids.dev, "half")).unwrap();
    let doub = compiled.node(kernel(&compiled, ids.dev, "doub")).unwrap();
    assert_eq!(half.push_constants.len(), 17);
    assert_eq!(half.push_constants, doub.push_constants);
    assert_eq!(half.push_constants.words()[16], BAYER);

    let demosaic = compiled.node(kernel(&compiled, ids.demosaic, "main")).unwrap();
    let expected = DemosaicPush {
        wb: img.whitebalance,
        filters: BAYER,
        block: 2,
    };
    assert_eq!(
        demosaic.push_constants.as_bytes(),
        bytemuck::bytes_of(&expected)
    );
}

#[test]
fn rgb_input_skips_mosaic_stages() {
    let (mut pipe, ids) = full_pipeline(ImageParams::rgb(1600, 1200));
    let compiled = pipe.compile().unwrap();
    assert_eq!(compiled.graph().nodes_of(ids.dev).count(), 5);
    assert!(compiled.graph().find_node(ids.dev, "half").is_none());

    let source = kernel(&compiled, ids.source, "source");
    let down0 = kernel(&compiled, ids.dev, "down");
    let assemble = kernel(&compiled, ids.dev, "assemble");
    assert_eq!(feeder(&compiled, down0, 0), (source, 0));
    assert_eq!(feeder(&compiled, assemble, 0), (source, 0));
    let demosaic = kernel(&compiled, ids.demosaic, "main");
    assert_eq!(feeder(&compiled, demosaic, 0), (assemble, 5));

    for (_, n) in compiled.graph().nodes_of(ids.dev) {
        assert_eq!((n.wd, n.ht), (1600, 1200));
    }
}

#[test]
fn xtrans_uses_three_pixel_blocks() {
    let img = ImageParams {
        filters: FILTERS_XTRANS,
        crop_aabb: [0, 0, 6000, 4002],
        ..ImageParams::rgb(6000, 4002)
    };
    let (mut pipe, ids) = full_pipeline(img);
    let compiled = pipe.compile().unwrap();
    let assemble = compiled.node(kernel(&compiled, ids.dev, "assemble")).unwrap();
    assert_eq!((assemble.wd, assemble.ht), (2000, 1334));
}

#[test]
fn committed_blocks_for_crop_and_curve() {
    let (mut pipe, ids) = full_pipeline(bayer_image());
    pipe.set_param(ids.crop, "crop", &[0.1, 0.9, 0.2, 0.8]).unwrap();
    let compiled = pipe.compile().unwrap();

    let crop = compiled.committed(ids.crop).unwrap();
    assert_eq!(crop.len(), 13);
    assert!((crop[0] - 1.0).abs() < 1e-5 && (crop[4] - 1.0).abs() < 1e-5);
    assert_eq!(&crop[9..], &[0.1, 0.9, 0.2, 0.8]);

    let curve = compiled.committed(ids.curve).unwrap();
    assert_eq!(curve.len(), 12);
    assert_eq!(compiled.committed(ids.dev), Some(&[][..]));
    assert_eq!(compiled.committed_bytes(ids.curve).unwrap().len(), 48);
}

#[test]
fn display_bounds_drive_requests() {
    let (mut pipe, ids) = full_pipeline(bayer_image());
    pipe.set_param(ids.display, "max_wd", &[800.0]).unwrap();
    pipe.set_param(ids.display, "max_ht", &[800.0]).unwrap();
    pipe.compile().unwrap();

    let crop_out = pipe.module(ids.crop).unwrap().data().connectors()[1].roi;
    assert!((799..=800).contains(&crop_out.wd));
    assert!(crop_out.ht < 600);
    assert!(crop_out.is_consistent());
    let dev_in = pipe.module(ids.dev).unwrap().data().connectors()[0].roi;
    assert!(dev_in.is_full_request());
}

#[test]
fn degenerate_crop_fails_compile() {
    let (mut pipe, ids) = full_pipeline(bayer_image());
    pipe.set_param(ids.crop, "perspect", &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 1.0])
        .unwrap();
    assert!(matches!(
        pipe.compile(),
        Err(PipelineError::Module(ModuleError::DegenerateParams { module: "crop", .. }))
    ));
}

#[test]
fn node_ceiling_is_enforced() {
    let (pipe, _) = full_pipeline(bayer_image());
    let mut pipe = pipe.with_max_nodes(7);
    assert_eq!(
        pipe.compile().unwrap_err(),
        PipelineError::Graph(GraphError::CapacityExceeded {
            requested: 8,
            max: 7
        })
    );
}

#[test]
fn crop_box_smaller_than_a_block_fails_compile() {
    for (filters, aabb, block) in [(BAYER, [0, 0, 1, 1], 2), (FILTERS_XTRANS, [0, 0, 2, 2], 3)] {
        let img = ImageParams {
            filters,
            crop_aabb: aabb,
            ..ImageParams::rgb(64, 64)
        };
        let mut pipe = Pipeline::new(img);
        let source = pipe.add_module(ModuleKind::Source.create(), "main").unwrap();
        let dev = pipe.add_module(ModuleKind::Dev.create(), "main").unwrap();
        pipe.connect(source, 0, dev, 0).unwrap();
        assert_eq!(
            pipe.compile().unwrap_err(),
            PipelineError::Graph(GraphError::EmptyRegion {
                kernel: "down",
                wd: aabb[2] / block,
                ht: aabb[3] / block,
            }),
            "block {block}"
        );
    }
}

#[test]
fn mosaic_output_needs_demosaic() {
    let mut pipe = Pipeline::new(bayer_image());
    let source = pipe.add_module(ModuleKind::Source.create(), "main").unwrap();
    let dev = pipe.add_module(ModuleKind::Dev.create(), "main").unwrap();
    let crop = pipe.add_module(ModuleKind::Crop.create(), "main").unwrap();
    pipe.connect(source, 0, dev, 0).unwrap();
    pipe.connect(dev, 1, crop, 0).unwrap();
    assert_eq!(
        pipe.compile().unwrap_err(),
        PipelineError::IncompatibleChan {
            kind: "crop",
            instance: "main".to_owned(),
            connector: "input",
            expected: Chan::Rgba,
            got: Chan::Rggb,
        }
    );

    // the same chain on four-channel input is fine
    pipe.set_image(ImageParams::rgb(1600, 1200));
    assert_eq!(pipe.compile().unwrap().nodes().len(), 1 + 5 + 1);
}
