//! Export orchestration: build -> compose -> serialize -> save, as an explicit
//! state machine. Only one export runs at a time, and the caller's section
//! expansion state is restored on every exit path.

use std::cell::{Cell, Ref, RefCell};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Local, NaiveDateTime};

use crate::config::ReportConfig;
use crate::error::{CollaboratorError, Error};
use crate::model::AnalysisResult;
use crate::pdf::{DocumentWriter, PageFlow, ReportMeta, serialize};
use crate::raster::{BlockRenderer, Rasterizer};
use crate::report::{ContentTreeBuilder, RuleTable, title_block};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    Preparing,
    Building,
    Composing,
    Serializing,
    Saving,
    Failed,
}

/// Which report sections the UI currently shows expanded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpandedSections(BTreeMap<String, bool>);

impl ExpandedSections {
    pub fn is_expanded(&self, category: &str) -> bool {
        self.0.get(category).copied().unwrap_or(false)
    }

    pub fn set(&mut self, category: &str, expanded: bool) {
        self.0.insert(category.to_string(), expanded);
    }

    pub fn toggle(&mut self, category: &str) {
        let next = !self.is_expanded(category);
        self.set(category, next);
    }

    pub fn expand_all<'a>(&mut self, categories: impl IntoIterator<Item = &'a str>) {
        for category in categories {
            self.set(category, true);
        }
    }
}

/// Captured expansion state; puts the value back when dropped.
struct ExpansionSnapshot<'a> {
    target: &'a RefCell<ExpandedSections>,
    saved: Option<ExpandedSections>,
}

impl<'a> ExpansionSnapshot<'a> {
    fn capture(target: &'a RefCell<ExpandedSections>) -> Self {
        let saved = target.borrow().clone();
        Self {
            target,
            saved: Some(saved),
        }
    }

    fn restore(&mut self) {
        if let Some(saved) = self.saved.take() {
            *self.target.borrow_mut() = saved;
        }
    }
}

impl Drop for ExpansionSnapshot<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Returns the orchestrator to `Idle` however the export future ends.
struct IdleOnDrop<'a>(&'a Cell<ExportPhase>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(ExportPhase::Idle);
    }
}

/// Host "save/download" facility.
pub trait ReportSink {
    fn save(
        &mut self,
        filename: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<PathBuf, CollaboratorError>>;
}

/// Writes reports into a directory.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportSink for DirectorySink {
    async fn save(&mut self, filename: &str, bytes: &[u8]) -> Result<PathBuf, CollaboratorError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Keeps saved reports in memory.
#[derive(Default)]
pub struct MemorySink {
    pub saved: Vec<(String, Vec<u8>)>,
}

impl ReportSink for MemorySink {
    async fn save(&mut self, filename: &str, bytes: &[u8]) -> Result<PathBuf, CollaboratorError> {
        self.saved.push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(filename))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SavedReport {
    pub path: PathBuf,
    pub filename: String,
    pub page_count: usize,
    pub byte_len: usize,
}

pub struct Exporter<R, W, S> {
    config: ReportConfig,
    builder: ContentTreeBuilder,
    renderer: RefCell<BlockRenderer<R>>,
    writer: RefCell<W>,
    sink: RefCell<S>,
    clock: Box<dyn Fn() -> NaiveDateTime>,
    phase: Cell<ExportPhase>,
    last_failure: RefCell<Option<String>>,
}

impl<R: Rasterizer, W: DocumentWriter, S: ReportSink> Exporter<R, W, S> {
    pub fn new(config: ReportConfig, rasterizer: R, writer: W, sink: S) -> Result<Self, Error> {
        config.validate()?;
        let renderer = BlockRenderer::new(
            rasterizer,
            config.page.content_width(),
            config.raster_scale,
        );
        Ok(Self {
            builder: ContentTreeBuilder::new(RuleTable::default(), config.checks_per_group),
            config,
            renderer: RefCell::new(renderer),
            writer: RefCell::new(writer),
            sink: RefCell::new(sink),
            clock: Box::new(|| Local::now().naive_local()),
            phase: Cell::new(ExportPhase::Idle),
            last_failure: RefCell::new(None),
        })
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.builder = ContentTreeBuilder::new(rules, self.config.checks_per_group);
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase.get()
    }

    /// User-facing message from the most recent failed export.
    pub fn last_failure(&self) -> Option<String> {
        self.last_failure.borrow().clone()
    }

    /// `None` while a suspended export is using the renderer.
    pub fn renderer(&self) -> Option<Ref<'_, BlockRenderer<R>>> {
        self.renderer.try_borrow().ok()
    }

    /// `None` while a suspended export is saving.
    pub fn sink(&self) -> Option<Ref<'_, S>> {
        self.sink.try_borrow().ok()
    }

    /// Starts an export. Rejected with [`Error::Busy`] right away if another
    /// export has not finished; otherwise returns the future that runs it.
    pub fn export_report<'a>(
        &'a self,
        result: &'a AnalysisResult,
        ui: &'a RefCell<ExpandedSections>,
    ) -> Result<impl Future<Output = Result<SavedReport, Error>> + 'a, Error> {
        if self.phase.get() != ExportPhase::Idle {
            log::warn!("export requested while {:?}; rejecting", self.phase.get());
            return Err(Error::Busy);
        }
        self.phase.set(ExportPhase::Preparing);
        let idle = IdleOnDrop(&self.phase);

        Ok(async move {
            let _idle = idle;
            let mut snapshot = ExpansionSnapshot::capture(ui);
            ui.borrow_mut()
                .expand_all(result.categories.keys().map(String::as_str));

            let outcome = self.run(result).await;
            snapshot.restore();

            match &outcome {
                Ok(saved) => {
                    self.last_failure.borrow_mut().take();
                    log::info!("saved {} ({} pages)", saved.path.display(), saved.page_count);
                }
                Err(e) => {
                    self.phase.set(ExportPhase::Failed);
                    log::error!("report export failed: {e}");
                    *self.last_failure.borrow_mut() = Some(format!("Failed to generate report: {e}"));
                }
            }
            outcome
        })
    }

    async fn run(&self, result: &AnalysisResult) -> Result<SavedReport, Error> {
        let t0 = Instant::now();
        let now = (self.clock)();

        self.phase.set(ExportPhase::Building);
        let sections = self.builder.build(result);
        let title = title_block(result, &now.format("%Y-%m-%d %H:%M:%S").to_string());
        let t_build = t0.elapsed();

        self.phase.set(ExportPhase::Composing);
        let flow = PageFlow::new(self.config.page.content_height())
            .with_gaps(self.config.block_gap, self.config.group_gap);
        let (title, pages) = {
            let mut renderer = self.renderer.borrow_mut();
            let title = renderer.render(&title).await?;
            let pages = flow.compose(&sections, &mut *renderer).await?;
            (title, pages)
        };
        let t_compose = t0.elapsed();

        self.phase.set(ExportPhase::Serializing);
        let meta = ReportMeta {
            cluster_name: result.cluster_name.clone(),
            cluster_id: result.cluster_id.clone(),
            date: now.date(),
        };
        let report = serialize(
            &title,
            &pages,
            &meta,
            &self.config.page,
            &mut *self.writer.borrow_mut(),
        )?;
        let t_serialize = t0.elapsed();

        self.phase.set(ExportPhase::Saving);
        let path = self
            .sink
            .borrow_mut()
            .save(&report.filename, &report.bytes)
            .await
            .map_err(|source| Error::Save {
                filename: report.filename.clone(),
                source,
            })?;
        let t_total = t0.elapsed();

        log::info!(
            "Timing: build={:.1}ms, compose={:.1}ms, serialize={:.1}ms, save={:.1}ms, total={:.1}ms ({} sections, {} pages, {} bytes)",
            t_build.as_secs_f64() * 1000.0,
            (t_compose - t_build).as_secs_f64() * 1000.0,
            (t_serialize - t_compose).as_secs_f64() * 1000.0,
            (t_total - t_serialize).as_secs_f64() * 1000.0,
            t_total.as_secs_f64() * 1000.0,
            sections.len(),
            report.page_count,
            report.bytes.len(),
        );

        Ok(SavedReport {
            path,
            filename: report.filename,
            page_count: report.page_count,
            byte_len: report.bytes.len(),
        })
    }
}
