use crate::error::Error;
use crate::raster::{BlockRenderer, RasterImage, Rasterizer, RenderedBlock};
use crate::report::{Section, divider_block};

/// Which part of the content tree a placement came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Header { section: usize },
    Group { section: usize, group: usize },
    Divider { section: usize },
}

/// A rendered block pinned to a vertical offset, measured from the top of the
/// page's content area.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub label: String,
    pub origin: Origin,
    pub image: RasterImage,
    pub y: f32,
    pub height: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub placements: Vec<Placement>,
}

/// Greedy page packer. Tracks the remaining height of the page being filled
/// and opens a new page whenever the next unit would not fit.
pub struct PageCursor {
    content_height: f32,
    pages: Vec<Page>,
    remaining: f32,
}

impl PageCursor {
    pub fn new(content_height: f32) -> Self {
        Self {
            content_height,
            pages: vec![Page::default()],
            remaining: content_height,
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn page_index(&self) -> usize {
        self.pages.len() - 1
    }

    fn page_is_empty(&self) -> bool {
        self.pages.last().is_none_or(|p| p.placements.is_empty())
    }

    fn lead(&self, gap: f32) -> f32 {
        if self.page_is_empty() { 0.0 } else { gap }
    }

    /// Inclusive: a unit that exactly fills the remaining height fits.
    pub fn fits(&self, height: f32, gap: f32) -> bool {
        self.lead(gap) + height <= self.remaining
    }

    fn open_page(&mut self) {
        self.pages.push(Page::default());
        self.remaining = self.content_height;
        log::debug!("page break: opened content page {}", self.pages.len());
    }

    /// Places `blocks` consecutively on one page. `gap` precedes the unit,
    /// `inner_gap` separates its blocks.
    pub fn place_unit(
        &mut self,
        blocks: Vec<RenderedBlock>,
        origin: Origin,
        gap: f32,
        inner_gap: f32,
    ) {
        if blocks.is_empty() {
            return;
        }
        let height = unit_height(&blocks, inner_gap);

        if !self.fits(height, gap) {
            if height > self.content_height {
                log::warn!(
                    "{} is {:.1}pt tall but a page holds {:.1}pt; placing it alone on its own page",
                    blocks[0].label,
                    height,
                    self.content_height
                );
            }
            if !self.page_is_empty() {
                self.open_page();
            }
        }

        let mut y = self.content_height - self.remaining + self.lead(gap);
        let page_index = self.page_index();
        let page = &mut self.pages[page_index];
        let count = blocks.len();
        for (i, block) in blocks.into_iter().enumerate() {
            log::debug!(
                "place {} on content page {} at y={:.1} (h={:.1})",
                block.label,
                page_index + 1,
                y,
                block.height
            );
            let h = block.height;
            page.placements.push(Placement {
                label: block.label,
                origin,
                image: block.image,
                y,
                height: h,
            });
            y += h;
            if i + 1 < count {
                y += inner_gap;
            }
        }
        self.remaining = (self.content_height - y).max(0.0);
    }

    /// Places a single block only if it fits on the current page.
    pub fn place_if_fits(&mut self, block: RenderedBlock, origin: Origin, gap: f32) -> bool {
        if self.page_is_empty() || !self.fits(block.height, gap) {
            return false;
        }
        self.place_unit(vec![block], origin, gap, 0.0);
        true
    }

    pub fn finish(mut self) -> Vec<Page> {
        if self.page_is_empty() {
            self.pages.pop();
        }
        self.pages
    }
}

fn unit_height(blocks: &[RenderedBlock], inner_gap: f32) -> f32 {
    let sum: f32 = blocks.iter().map(|b| b.height).sum();
    sum + inner_gap * blocks.len().saturating_sub(1) as f32
}

/// Page Flow Composer: renders the content tree block by block and packs it
/// onto fixed-size pages without splitting any atomic group.
pub struct PageFlow {
    pub content_height: f32,
    pub block_gap: f32,
    pub group_gap: f32,
}

impl PageFlow {
    /// Width is not a parameter: every block is measured at the renderer's width.
    pub fn new(content_height: f32) -> Self {
        Self {
            content_height,
            block_gap: 0.0,
            group_gap: 0.0,
        }
    }

    pub fn with_gaps(mut self, block_gap: f32, group_gap: f32) -> Self {
        self.block_gap = block_gap;
        self.group_gap = group_gap;
        self
    }

    pub async fn compose<R: Rasterizer>(
        &self,
        sections: &[Section],
        renderer: &mut BlockRenderer<R>,
    ) -> Result<Vec<Page>, Error> {
        let mut cursor = PageCursor::new(self.content_height);

        for (si, section) in sections.iter().enumerate() {
            let header = renderer.render(&section.header).await?;
            cursor.place_unit(
                vec![header],
                Origin::Header { section: si },
                self.group_gap,
                0.0,
            );

            for (gi, group) in section.groups.iter().enumerate() {
                if group.blocks.is_empty() {
                    continue;
                }
                let mut rendered = Vec::with_capacity(group.blocks.len());
                for block in &group.blocks {
                    rendered.push(renderer.render(block).await?);
                }
                let origin = Origin::Group {
                    section: si,
                    group: gi,
                };
                if group.atomic {
                    cursor.place_unit(rendered, origin, self.group_gap, self.block_gap);
                } else {
                    let mut gap = self.group_gap;
                    for block in rendered {
                        cursor.place_unit(vec![block], origin, gap, 0.0);
                        gap = self.block_gap;
                    }
                }
            }

            if si + 1 < sections.len() {
                let divider = renderer.render(&divider_block(&section.category)).await?;
                let label = divider.label.clone();
                if !cursor.place_if_fits(divider, Origin::Divider { section: si }, self.group_gap)
                {
                    log::debug!("dropped {label}: next section starts on a new page");
                }
            }
        }

        Ok(cursor.finish())
    }
}
