mod common;

use cluster_report_pdf::Error;
use cluster_report_pdf::raster::{BlockRenderer, PanelRasterizer};
use cluster_report_pdf::report::{self, BlockContent, BlockSpec};
use cluster_report_pdf::stage::StagingArea;
use common::{ScriptedRasterizer, renderer};
use futures::executor::block_on;

fn block(label: &str, content: BlockContent) -> BlockSpec {
    BlockSpec {
        label: label.to_string(),
        content,
    }
}

#[test]
fn one_lease_per_render_and_vacant_afterwards() {
    let mut r = renderer(ScriptedRasterizer::new(40));
    let sections = report::build(&common::resiliency_example());
    let section = &sections[0];

    block_on(r.render(&section.header)).unwrap();
    for group in &section.groups {
        for b in &group.blocks {
            block_on(r.render(b)).unwrap();
        }
    }

    assert_eq!(r.calls(), 5);
    assert_eq!(r.stage().leases_issued(), r.calls());
    assert!(r.stage().is_vacant());
}

#[test]
fn stage_is_vacant_after_a_rasterizer_error() {
    let mut r = renderer(ScriptedRasterizer::new(40).fail_on_call(2));
    let a = block("a", BlockContent::AllPassing);
    let b = block("b", BlockContent::NoChecks);

    block_on(r.render(&a)).unwrap();
    let err = block_on(r.render(&b)).unwrap_err();
    match err {
        Error::Render { block, source } => {
            assert_eq!(block, "b");
            assert!(source.to_string().contains("canvas exploded"));
        }
        other => panic!("expected render error, got {other:?}"),
    }
    assert!(r.stage().is_vacant());
    assert_eq!(r.stage().leases_issued(), 2);

    // The renderer is usable again after a failure.
    block_on(r.render(&a)).unwrap();
    assert!(r.stage().is_vacant());
}

#[test]
fn every_block_is_mounted_at_the_fixed_width() {
    let mut r = BlockRenderer::new(ScriptedRasterizer::new(40), 250.0, 2.0);
    assert_eq!(r.stage().width_px(), 500);
    for label in ["x", "y", "z"] {
        block_on(r.render(&block(label, BlockContent::Divider))).unwrap();
    }
    assert_eq!(r.rasterizer().widths_seen, vec![500, 500, 500]);
}

#[test]
fn pixel_height_converts_to_points_through_the_content_width() {
    // 500px wide surface for 250pt of content: 2px per point.
    let mut r = BlockRenderer::new(ScriptedRasterizer::new(120), 250.0, 2.0);
    let rendered = block_on(r.render(&block("x", BlockContent::AllPassing))).unwrap();
    assert_eq!(rendered.height, 60.0);
    assert_eq!(rendered.label, "x");
}

#[test]
fn second_attach_on_an_occupied_stage_is_rejected() {
    let mut stage = StagingArea::new(100);
    let a = block("a", BlockContent::AllPassing);
    let b = block("b", BlockContent::NoChecks);

    {
        let mut lease = stage.acquire().unwrap();
        let mounted = lease.attach(&a).unwrap();
        assert_eq!(mounted.block().label, "a");
        assert_eq!(mounted.width_px(), 100);
        assert!(matches!(lease.attach(&b), Err(Error::StageOccupied)));

        lease.detach();
        assert!(lease.attach(&b).is_ok());
    }
    assert!(stage.is_vacant());
    assert_eq!(stage.leases_issued(), 1);
}

#[test]
fn panel_rasterizer_grows_with_text() {
    let mut r = BlockRenderer::new(PanelRasterizer::new(1.0, 80), 300.0, 1.0);
    let short = block(
        "short",
        BlockContent::Recommendations(vec!["Enable probes.".to_string()]),
    );
    let long = block(
        "long",
        BlockContent::Recommendations(
            (0..6)
                .map(|i| format!("Recommendation {i}: {}", "spread replicas across zones ".repeat(4)))
                .collect(),
        ),
    );

    let short = block_on(r.render(&short)).unwrap();
    let long = block_on(r.render(&long)).unwrap();
    assert!(long.height > short.height);
    assert_eq!(short.image.pixel_width, 300);
    assert_eq!(&short.image.data[..2], &[0xFF_u8, 0xD8]);

    let divider = block_on(r.render(&report::divider_block("x"))).unwrap();
    assert_eq!(divider.height, 14.0);
}
