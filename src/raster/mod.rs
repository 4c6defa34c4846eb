mod panel;

pub use panel::PanelRasterizer;

use std::future::Future;

use crate::error::{CollaboratorError, Error};
use crate::report::BlockSpec;
use crate::stage::{MountedBlock, StagingArea};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Encoded raster output of one block.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// Raster primitive: given a block mounted at a fixed width, produce an
/// embeddable image whose pixel height is the block's rendered height.
pub trait Rasterizer {
    fn rasterize(
        &mut self,
        mounted: &MountedBlock<'_>,
    ) -> impl Future<Output = Result<RasterImage, CollaboratorError>>;
}

/// A rendered block with its height converted to page units (points).
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedBlock {
    pub label: String,
    pub image: RasterImage,
    pub height: f32,
}

/// Owns the staging area and drives the rasterizer one block at a time.
pub struct BlockRenderer<R> {
    stage: StagingArea,
    rasterizer: R,
    content_width: f32,
    calls: usize,
}

impl<R: Rasterizer> BlockRenderer<R> {
    /// `content_width` is in points; `scale` is pixels per point on the staging surface.
    pub fn new(rasterizer: R, content_width: f32, scale: f32) -> Self {
        let width_px = (content_width * scale).round().max(1.0) as u32;
        Self {
            stage: StagingArea::new(width_px),
            rasterizer,
            content_width,
            calls: 0,
        }
    }

    pub fn stage(&self) -> &StagingArea {
        &self.stage
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn rasterizer_mut(&mut self) -> &mut R {
        &mut self.rasterizer
    }

    pub fn content_width(&self) -> f32 {
        self.content_width
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Taking `&mut self` makes overlapping renders impossible.
    pub async fn render(&mut self, block: &BlockSpec) -> Result<RenderedBlock, Error> {
        self.calls += 1;
        let mut lease = self.stage.acquire()?;
        let raster = {
            let mounted = lease.attach(block)?;
            self.rasterizer.rasterize(&mounted).await
        };
        lease.detach();
        drop(lease);

        let image = raster.map_err(|source| Error::Render {
            block: block.label.clone(),
            source,
        })?;
        if image.pixel_width == 0 {
            return Err(Error::Render {
                block: block.label.clone(),
                source: "rasterizer returned a zero-width image".into(),
            });
        }

        let height = image.pixel_height as f32 * self.content_width / image.pixel_width as f32;
        log::debug!(
            "rendered {} ({}x{} px -> {:.1}pt)",
            block.label,
            image.pixel_width,
            image.pixel_height,
            height
        );
        Ok(RenderedBlock {
            label: block.label.clone(),
            image,
            height,
        })
    }
}
