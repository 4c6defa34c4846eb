mod compose;

pub use compose::{Origin, Page, PageCursor, PageFlow, Placement};

use chrono::NaiveDate;
use pdf_writer::{Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::config::PageGeometry;
use crate::error::Error;
use crate::raster::{ImageFormat, RasterImage, RenderedBlock};

/// One image positioned on a page. Coordinates are points from the page's
/// top-left corner.
#[derive(Clone, Debug, PartialEq)]
pub struct ImagePlacement<'a> {
    pub image: &'a RasterImage,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Paged document primitive: lays out images at given offsets, any number of pages.
pub trait DocumentWriter {
    fn write_paged_document(&mut self, pages: &[Vec<ImagePlacement<'_>>]) -> Result<Vec<u8>, Error>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportMeta {
    pub cluster_name: Option<String>,
    pub cluster_id: Option<String>,
    pub date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SerializedReport {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
}

fn sanitize(part: &str) -> String {
    part.split(|c: char| c.is_whitespace() || c == '/' || c == '\\')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// `{cluster name or "report"}[-{cluster id}]-{YYYY-MM-DD}.pdf`
pub fn report_filename(meta: &ReportMeta) -> String {
    let base = meta
        .cluster_name
        .as_deref()
        .map(sanitize)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "report".to_string());
    let mut name = base;
    if let Some(id) = meta.cluster_id.as_deref().map(sanitize).filter(|s| !s.is_empty()) {
        name.push('-');
        name.push_str(&id);
    }
    format!("{name}-{}.pdf", meta.date.format("%Y-%m-%d"))
}

/// Prepends the title page to the composed pages and hands everything to the
/// document writer. Every image sits at the page margin on the x axis.
pub fn serialize(
    title: &RenderedBlock,
    pages: &[Page],
    meta: &ReportMeta,
    geometry: &PageGeometry,
    writer: &mut impl DocumentWriter,
) -> Result<SerializedReport, Error> {
    let margin = geometry.margin;
    let width = geometry.content_width();

    let mut layout: Vec<Vec<ImagePlacement<'_>>> = Vec::with_capacity(pages.len() + 1);
    layout.push(vec![ImagePlacement {
        image: &title.image,
        x: margin,
        y: margin,
        w: width,
        h: title.height,
    }]);
    for page in pages {
        layout.push(
            page.placements
                .iter()
                .map(|p| ImagePlacement {
                    image: &p.image,
                    x: margin,
                    y: margin + p.y,
                    w: width,
                    h: p.height,
                })
                .collect(),
        );
    }

    let bytes = writer.write_paged_document(&layout)?;
    Ok(SerializedReport {
        bytes,
        filename: report_filename(meta),
        page_count: layout.len(),
    })
}

/// `DocumentWriter` backed by pdf-writer.
pub struct PdfWriter {
    page_width: f32,
    page_height: f32,
    title: Option<String>,
}

impl PdfWriter {
    pub fn new(geometry: &PageGeometry) -> Self {
        Self {
            page_width: geometry.width,
            page_height: geometry.height,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

fn embed_image(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    img: &RasterImage,
) -> Result<Ref, Error> {
    let xobj_ref = alloc();
    match img.format {
        ImageFormat::Jpeg => {
            let mut xobj = pdf.image_xobject(xobj_ref, &img.data);
            xobj.filter(Filter::DctDecode);
            xobj.width(img.pixel_width as i32);
            xobj.height(img.pixel_height as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }
        ImageFormat::Png => {
            let decoded = image::load_from_memory_with_format(&img.data, image::ImageFormat::Png)
                .map_err(|e| Error::Image(format!("cannot decode PNG raster: {e}")))?;
            let rgba: image::RgbaImage = decoded.to_rgba8();
            let (w, h) = (rgba.width(), rgba.height());
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

            let rgb_data: Vec<u8> = rgba
                .pixels()
                .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                .collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

            let smask_ref = if has_alpha {
                let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w as i32);
                mask.height(h as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w as i32);
            xobj.height(h as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    Ok(xobj_ref)
}

impl DocumentWriter for PdfWriter {
    fn write_paged_document(&mut self, pages: &[Vec<ImagePlacement<'_>>]) -> Result<Vec<u8>, Error> {
        let t0 = std::time::Instant::now();
        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();
        let info_id = alloc();

        let n = pages.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

        // Key: page index -> [(xobject name, ref)]
        let mut page_xobjects: Vec<Vec<(String, Ref)>> = Vec::with_capacity(n);
        let mut image_count = 0usize;
        for (i, placements) in pages.iter().enumerate() {
            let mut xobjects = Vec::with_capacity(placements.len());
            let mut content = pdf_writer::Content::new();
            for placement in placements {
                if placement.image.pixel_width == 0 || placement.image.pixel_height == 0 {
                    return Err(Error::Pdf(format!(
                        "page {}: cannot embed an empty {}x{} image",
                        i + 1,
                        placement.image.pixel_width,
                        placement.image.pixel_height
                    )));
                }
                image_count += 1;
                let name = format!("Im{image_count}");
                let xobj_ref = embed_image(&mut pdf, &mut alloc, placement.image)?;

                // PDF user space grows upwards from the bottom-left corner
                let y_bottom = self.page_height - placement.y - placement.h;
                content.save_state();
                content.transform([placement.w, 0.0, 0.0, placement.h, placement.x, y_bottom]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
                xobjects.push((name, xobj_ref));
            }
            let raw = content.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);
            page_xobjects.push(xobjects);
        }

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        for i in 0..n {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(Rect::new(0.0, 0.0, self.page_width, self.page_height))
                .parent(pages_id)
                .contents(content_ids[i]);
            if !page_xobjects[i].is_empty() {
                let mut resources = page.resources();
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &page_xobjects[i] {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        {
            let mut info = pdf.document_info(info_id);
            if let Some(title) = &self.title {
                info.title(TextStr(title.as_str()));
            }
            info.producer(TextStr(concat!(
                env!("CARGO_PKG_NAME"),
                " ",
                env!("CARGO_PKG_VERSION")
            )));
        }

        let bytes = pdf.finish();
        log::info!(
            "PDF assembly: {} pages, {} images, {} bytes in {:.1}ms",
            n,
            image_count,
            bytes.len(),
            t0.elapsed().as_secs_f64() * 1000.0
        );
        Ok(bytes)
    }
}
