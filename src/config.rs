use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::report::CHECKS_PER_GROUP;

const MM: f32 = 72.0 / 25.4;

/// Page size and margin in PDF points.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        // A4 portrait, 15mm margin
        Self {
            width: 210.0 * MM,
            height: 297.0 * MM,
            margin: 15.0 * MM,
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub page: PageGeometry,
    pub checks_per_group: usize,
    /// Space between blocks of the same group.
    pub block_gap: f32,
    /// Space between groups, headers and dividers.
    pub group_gap: f32,
    /// Staging surface pixels per point.
    pub raster_scale: f32,
    pub jpeg_quality: u8,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            checks_per_group: CHECKS_PER_GROUP,
            block_gap: 6.0,
            group_gap: 10.0,
            raster_scale: 2.0,
            jpeg_quality: 95,
        }
    }
}

impl ReportConfig {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", e, path.display()),
            ))
        })?;
        let config: ReportConfig = serde_json::from_slice(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let page = &self.page;
        if !(page.width > 0.0 && page.height > 0.0 && page.margin >= 0.0) {
            return Err(Error::Config(format!(
                "page must have positive size and non-negative margin (got {}x{}, margin {})",
                page.width, page.height, page.margin
            )));
        }
        if page.content_width() <= 0.0 || page.content_height() <= 0.0 {
            return Err(Error::Config(format!(
                "margin {} leaves no content area on a {}x{} page",
                page.margin, page.width, page.height
            )));
        }
        if self.checks_per_group == 0 {
            return Err(Error::Config("checks_per_group must be at least 1".into()));
        }
        if self.block_gap < 0.0 || self.group_gap < 0.0 {
            return Err(Error::Config("gaps must not be negative".into()));
        }
        if !(self.raster_scale > 0.0) {
            return Err(Error::Config(format!(
                "raster_scale must be positive (got {})",
                self.raster_scale
            )));
        }
        Ok(())
    }
}
