#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{NaiveDate, NaiveDateTime};
use cluster_report_pdf::CollaboratorError;
use cluster_report_pdf::model::{AnalysisResult, Category, Check};
use cluster_report_pdf::pdf::PageFlow;
use cluster_report_pdf::raster::{BlockRenderer, ImageFormat, RasterImage, Rasterizer};
use cluster_report_pdf::stage::MountedBlock;
use cluster_report_pdf::{PageGeometry, ReportConfig};

/// Content area of the test geometry is exactly 500 x 700 points.
pub const CONTENT_WIDTH: f32 = 500.0;
pub const CONTENT_HEIGHT: f32 = 700.0;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_geometry() -> PageGeometry {
    PageGeometry {
        width: 600.0,
        height: 800.0,
        margin: 50.0,
    }
}

/// One raster pixel per point, no gaps: pixel heights read directly as points.
pub fn test_config() -> ReportConfig {
    ReportConfig {
        page: test_geometry(),
        block_gap: 0.0,
        group_gap: 0.0,
        raster_scale: 1.0,
        ..ReportConfig::default()
    }
}

pub fn fixed_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .expect("valid timestamp")
}

/// Completes after being polled twice, waking itself in between.
#[derive(Default)]
pub struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Rasterizer returning fake JPEG payloads with scripted pixel heights.
/// Heights are looked up by label suffix (`"header"`, `"checks/0"`, ...).
pub struct ScriptedRasterizer {
    heights: Vec<(String, u32)>,
    default_height: u32,
    fail_on_call: Option<usize>,
    yield_on_call: Option<usize>,
    on_render: Option<Box<dyn FnMut(&str)>>,
    pub calls: Vec<String>,
    pub widths_seen: Vec<u32>,
}

impl ScriptedRasterizer {
    pub fn new(default_height: u32) -> Self {
        Self {
            heights: Vec::new(),
            default_height,
            fail_on_call: None,
            yield_on_call: None,
            on_render: None,
            calls: Vec::new(),
            widths_seen: Vec::new(),
        }
    }

    pub fn height(mut self, label_suffix: &str, px: u32) -> Self {
        self.heights.push((label_suffix.to_string(), px));
        self
    }

    /// 1-based call number that fails.
    pub fn fail_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// 1-based call number that suspends once before completing.
    pub fn yield_on_call(mut self, call: usize) -> Self {
        self.yield_on_call = Some(call);
        self
    }

    pub fn on_render(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.on_render = Some(Box::new(f));
        self
    }

    fn height_for(&self, label: &str) -> u32 {
        self.heights
            .iter()
            .rev()
            .find(|(suffix, _)| label.ends_with(suffix.as_str()))
            .map(|(_, h)| *h)
            .unwrap_or(self.default_height)
    }
}

impl Rasterizer for ScriptedRasterizer {
    async fn rasterize(
        &mut self,
        mounted: &MountedBlock<'_>,
    ) -> Result<RasterImage, CollaboratorError> {
        let label = mounted.block().label.clone();
        self.calls.push(label.clone());
        self.widths_seen.push(mounted.width_px());
        let call = self.calls.len();
        if let Some(f) = self.on_render.as_mut() {
            f(&label);
        }
        if self.yield_on_call == Some(call) {
            YieldOnce::default().await;
        }
        if self.fail_on_call == Some(call) {
            return Err(format!("canvas exploded on {label}").into());
        }
        Ok(RasterImage {
            data: vec![0xFF, 0xD8, 0xFF, 0xD9],
            format: ImageFormat::Jpeg,
            pixel_width: mounted.width_px(),
            pixel_height: self.height_for(&label),
        })
    }
}

pub fn renderer(rasterizer: ScriptedRasterizer) -> BlockRenderer<ScriptedRasterizer> {
    BlockRenderer::new(rasterizer, CONTENT_WIDTH, 1.0)
}

pub fn flow(content_height: f32) -> PageFlow {
    PageFlow::new(content_height)
}

pub fn check(name: &str, passed: bool) -> Check {
    Check {
        name: name.to_string(),
        passed,
        details: format!("{name}: 50% of workloads compliant"),
        ..Check::default()
    }
}

pub fn category(score: f64, checks: Vec<Check>) -> Category {
    Category { score, checks }
}

pub fn result_with(categories: Vec<(&str, Category)>) -> AnalysisResult {
    AnalysisResult {
        overall_score: 64.0,
        cluster_name: Some("prod cluster".to_string()),
        cluster_id: Some("abc123".to_string()),
        categories: categories
            .into_iter()
            .map(|(id, c)| (id.to_string(), c))
            .collect::<HashMap<_, _>>(),
    }
}

/// `resiliency` with A passing and B, C failing.
pub fn resiliency_example() -> AnalysisResult {
    result_with(vec![(
        "resiliency",
        category(
            80.0,
            vec![check("A", true), check("B", false), check("C", false)],
        ),
    )])
}

/// All eight declared categories, `n` checks each, every other one failing.
pub fn full_result(n: usize) -> AnalysisResult {
    let ids = [
        "resiliency",
        "workload",
        "pdb",
        "topology",
        "security",
        "network",
        "secrets",
        "observability",
    ];
    result_with(
        ids.iter()
            .map(|id| {
                let checks = (0..n)
                    .map(|i| check(&format!("{id} check {i}"), i % 2 == 0))
                    .collect();
                (*id, category(55.0, checks))
            })
            .collect(),
    )
}

/// Unique scratch directory under the system temp dir.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!(
        "cluster-report-pdf-{tag}-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}
