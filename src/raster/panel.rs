use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

use super::{ImageFormat, RasterImage, Rasterizer};
use crate::error::CollaboratorError;
use crate::model::Tone;
use crate::report::{BlockContent, LineRole, TextLine};
use crate::stage::MountedBlock;

const PADDING: f32 = 12.0; // points
const DIVIDER_HEIGHT: f32 = 14.0;

const SLATE_800: [u8; 3] = [0x1E, 0x29, 0x3B];
const SLATE_700: [u8; 3] = [0x33, 0x41, 0x55];
const SLATE_400: [u8; 3] = [0x94, 0xA3, 0xB8];
const SLATE_200: [u8; 3] = [0xE2, 0xE8, 0xF0];
const GREEN_800: [u8; 3] = [0x06, 0x5F, 0x46];
const WHITE: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// (font size, average glyph advance) in points
fn role_metrics(role: LineRole) -> (f32, f32) {
    match role {
        LineRole::Heading => (18.0, 9.5),
        LineRole::Emphasis => (15.0, 7.8),
        LineRole::Body | LineRole::Item => (13.0, 6.4),
    }
}

fn role_color(role: LineRole) -> [u8; 3] {
    match role {
        LineRole::Heading => SLATE_800,
        LineRole::Emphasis => SLATE_700,
        LineRole::Body => SLATE_400,
        LineRole::Item => GREEN_800,
    }
}

/// (background, border)
fn tone_colors(tone: Option<Tone>) -> ([u8; 3], [u8; 3]) {
    match tone {
        Some(Tone::Good) => ([0xF0, 0xFD, 0xF4], [0xDC, 0xFC, 0xE7]),
        Some(Tone::Warning) => ([0xFE, 0xFC, 0xE8], [0xFE, 0xF9, 0xC3]),
        Some(Tone::Critical) => ([0xFE, 0xF2, 0xF2], [0xFE, 0xE2, 0xE2]),
        None => ([0xEF, 0xF6, 0xFF], [0xDB, 0xEA, 0xFE]),
    }
}

/// Greedy word wrap by character count; returns the character length of each line.
fn wrap_widths(text: &str, max_chars: usize) -> Vec<usize> {
    let mut widths = Vec::new();
    let mut current = 0usize;
    for word in text.split_whitespace() {
        let len = word.chars().count();
        let proposed = if current == 0 { len } else { current + 1 + len };
        if current > 0 && proposed > max_chars {
            widths.push(current);
            current = len;
        } else {
            current = proposed;
        }
    }
    if current > 0 || widths.is_empty() {
        widths.push(current);
    }
    widths
}

struct Bar {
    top: f32,
    line_h: f32,
    width: f32,
    color: [u8; 3],
}

/// Preview rasterizer: draws each block as a tone-coloured panel with one
/// bar per wrapped text line. No glyphs are rendered; the geometry follows
/// the block's text so page composition behaves like the real thing.
pub struct PanelRasterizer {
    scale: f32,
    jpeg_quality: u8,
}

impl PanelRasterizer {
    pub fn new(scale: f32, jpeg_quality: u8) -> Self {
        Self {
            scale,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    fn layout(&self, lines: &[TextLine], width_pt: f32) -> (Vec<Bar>, f32) {
        let inner = (width_pt - 2.0 * PADDING).max(1.0);
        let mut bars = Vec::new();
        let mut y = PADDING;
        for line in lines {
            let (size, advance) = role_metrics(line.role);
            let line_h = size * 1.4;
            let max_chars = ((inner / advance).floor() as usize).max(1);
            for chars in wrap_widths(&line.text, max_chars) {
                bars.push(Bar {
                    top: y,
                    line_h,
                    width: (chars as f32 * advance).min(inner),
                    color: role_color(line.role),
                });
                y += line_h;
            }
        }
        (bars, y + PADDING)
    }

    fn paint(&self, mounted: &MountedBlock<'_>) -> RgbImage {
        let width_px = mounted.width_px();
        let width_pt = width_px as f32 / self.scale;
        let px = |pt: f32| (pt * self.scale).round().max(0.0) as u32;
        let block = mounted.block();

        if matches!(block.content, BlockContent::Divider) {
            let mut img = RgbImage::from_pixel(width_px, px(DIVIDER_HEIGHT).max(1), Rgb(WHITE));
            let mid = px(DIVIDER_HEIGHT / 2.0);
            fill_rect(&mut img, 0, mid, width_px, px(1.0).max(1), SLATE_200);
            return img;
        }

        let (bars, height_pt) = self.layout(&block.lines(), width_pt);
        let (background, border) = tone_colors(block.tone());
        let mut img = RgbImage::from_pixel(width_px, px(height_pt).max(1), Rgb(background));
        stroke_rect(&mut img, px(1.0).max(1), border);

        let left = px(PADDING);
        for bar in &bars {
            let bar_h = px(bar.line_h * 0.55).max(1);
            let top = px(bar.top + bar.line_h * 0.2);
            fill_rect(&mut img, left, top, px(bar.width), bar_h, bar.color);
        }
        img
    }
}

impl Default for PanelRasterizer {
    fn default() -> Self {
        Self::new(2.0, 95)
    }
}

impl Rasterizer for PanelRasterizer {
    async fn rasterize(
        &mut self,
        mounted: &MountedBlock<'_>,
    ) -> Result<RasterImage, CollaboratorError> {
        let img = self.paint(mounted);
        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, self.jpeg_quality).encode_image(&img)?;
        Ok(RasterImage {
            data,
            format: ImageFormat::Jpeg,
            pixel_width: img.width(),
            pixel_height: img.height(),
        })
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, Rgb(color));
        }
    }
}

fn stroke_rect(img: &mut RgbImage, thick: u32, color: [u8; 3]) {
    let (w, h) = (img.width(), img.height());
    fill_rect(img, 0, 0, w, thick, color);
    fill_rect(img, 0, h.saturating_sub(thick), w, thick, color);
    fill_rect(img, 0, 0, thick, h, color);
    fill_rect(img, w.saturating_sub(thick), 0, thick, h, color);
}
