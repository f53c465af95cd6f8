//! Property tests for full pipeline compiles.

use proptest::prelude::*;
use rawgraph_core::{Chan, FILTERS_XTRANS, ImageParams, ModuleId, Pipeline};
use rawgraph_modules::ModuleKind;

fn image_strategy() -> impl Strategy<Value = ImageParams> {
    (
        64u32..8000,
        64u32..6000,
        prop_oneof![Just(0u32), Just(0x94949494u32), Just(FILTERS_XTRANS)],
        0u32..16,
        0u32..16,
    )
        .prop_map(|(width, height, filters, mx, my)| ImageParams {
            filters,
            crop_aabb: [mx, my, width - mx, height - my],
            ..ImageParams::rgb(width, height)
        })
}

fn build(img: ImageParams, max_wd: f32, max_ht: f32) -> (Pipeline, [ModuleId; 6]) {
    let mut pipe = Pipeline::new(img);
    let ids = ModuleKind::ALL.map(|kind| pipe.add_module(kind.create(), "main").unwrap());
    pipe.connect(ids[0], 0, ids[1], 0).unwrap();
    for pair in ids[1..].windows(2) {
        pipe.connect(pair[0], 1, pair[1], 0).unwrap();
    }
    pipe.set_param(ids[5], "max_wd", &[max_wd]).unwrap();
    pipe.set_param(ids[5], "max_ht", &[max_ht]).unwrap();
    (pipe, ids)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn every_region_is_consistent(
        img in image_strategy(),
        max_wd in 16.0f32..4096.0,
        max_ht in 16.0f32..4096.0,
    ) {
        let (mut pipe, _) = build(img, max_wd.floor(), max_ht.floor());
        let compiled = pipe.compile().unwrap();
        for m in pipe.modules() {
            for c in m.data().connectors() {
                prop_assert!(c.roi.is_consistent(), "{} {}: {:?}", m.data().kind(), c.name, c.roi);
            }
        }
        for n in compiled.nodes() {
            prop_assert!(n.wd > 0 && n.ht > 0, "{}/{}", n.name, n.kernel);
        }
    }

    #[test]
    fn dev_nodes_are_block_reduced(img in image_strategy()) {
        let (mut pipe, ids) = build(img.clone(), 1920.0, 1080.0);
        let compiled = pipe.compile().unwrap();
        let block = img.block_size(img.sensor_chan());
        let (wd, ht) = if img.is_mosaic() {
            img.crop_size()
        } else {
            (img.width, img.height)
        };
        let nodes: Vec<_> = compiled.graph().nodes_of(ids[1]).collect();
        prop_assert_eq!(nodes.len(), if img.is_mosaic() { 7 } else { 5 });
        for (_, n) in nodes {
            prop_assert_eq!((n.wd, n.ht), (wd / block, ht / block));
        }
        if img.filters == FILTERS_XTRANS {
            prop_assert_eq!(block, 3);
        }
    }

    #[test]
    fn pyramid_levels_chain(img in image_strategy()) {
        let (mut pipe, ids) = build(img, 1920.0, 1080.0);
        let compiled = pipe.compile().unwrap();
        let graph = compiled.graph();
        let down: Vec<_> = graph
            .nodes_of(ids[1])
            .filter(|(_, n)| n.kernel == "down")
            .map(|(id, _)| id)
            .collect();
        prop_assert_eq!(down.len(), 4);
        for pair in down.windows(2) {
            let link = graph.node(pair[1]).unwrap().connectors()[0].connected.unwrap();
            prop_assert_eq!((link.id, link.connector), (pair[0], 1));
        }
        let out = graph.binding(ids[1], 1).unwrap();
        let kernel = graph.node(out.id).unwrap().kernel;
        let chan = graph.node(out.id).unwrap().connectors()[out.connector].chan;
        if chan == Chan::Rggb {
            prop_assert_eq!(kernel, "doub");
        } else {
            prop_assert_eq!(kernel, "assemble");
        }
    }

    #[test]
    fn compile_is_repeatable(img in image_strategy()) {
        let (mut pipe, _) = build(img, 1920.0, 1080.0);
        let first = pipe.compile().unwrap();
        let second = pipe.compile().unwrap();
        prop_assert_eq!(first.nodes(), second.nodes());
        prop_assert_eq!(first.edges(), second.edges());
        prop_assert_eq!(first.committed_blocks(), second.committed_blocks());
    }
}
