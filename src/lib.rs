pub mod config;
mod error;
pub mod export;
pub mod model;
pub mod pdf;
pub mod raster;
pub mod report;
pub mod stage;

pub use config::{PageGeometry, ReportConfig};
pub use error::{CollaboratorError, Error};
pub use export::{
    DirectorySink, ExpandedSections, ExportPhase, Exporter, MemorySink, ReportSink, SavedReport,
};
pub use model::AnalysisResult;

use std::cell::RefCell;
use std::path::Path;
use std::time::Instant;

use pdf::PdfWriter;
use raster::PanelRasterizer;

const DOCUMENT_TITLE: &str = "Kubernetes Best Practices Analysis";

/// Reads an analysis result from JSON and writes its report into `out_dir`
/// using the built-in preview rasterizer.
pub fn export_analysis_file(
    input: &Path,
    out_dir: &Path,
    config: &ReportConfig,
) -> Result<SavedReport, Error> {
    let t0 = Instant::now();

    let result = AnalysisResult::load(input)?;
    let t_parse = t0.elapsed();

    let saved = export_analysis(&result, out_dir, config)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, export={:.1}ms, total={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t_total - t_parse).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        saved.byte_len,
    );

    Ok(saved)
}

/// Runs one export of an in-memory analysis result to `out_dir`.
pub fn export_analysis(
    result: &AnalysisResult,
    out_dir: &Path,
    config: &ReportConfig,
) -> Result<SavedReport, Error> {
    let exporter = Exporter::new(
        config.clone(),
        PanelRasterizer::new(config.raster_scale, config.jpeg_quality),
        PdfWriter::new(&config.page).with_title(DOCUMENT_TITLE),
        DirectorySink::new(out_dir),
    )?;
    let ui = RefCell::new(ExpandedSections::default());
    futures::executor::block_on(exporter.export_report(result, &ui)?)
}
