// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF compositor — wrap a single raster image in a one-page PDF using
// `printpdf` 0.8.
//
// The image is scaled uniformly to the largest size that fits the page and
// centred. Small images are scaled up as well as large images down.

use image::ImageFormat;
use localconvert_core::error::{ConvertError, Result};
use localconvert_core::{PageGeometry, PaperSize, RasterFormat};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

/// Where an image of a given pixel size lands on a page, in points.
///
/// `(x, y)` is the lower-left corner in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    /// Fit an `image_width` x `image_height` image onto `page`, preserving
    /// aspect ratio.
    ///
    /// The width is filled first; if that would overflow the page height the
    /// image is fitted to the height instead.
    pub fn fit_to_page(image_width: u32, image_height: u32, page: PageGeometry) -> Self {
        let img_w = image_width.max(1) as f32;
        let img_h = image_height.max(1) as f32;

        let scale = (page.width / img_w).min(page.height / img_h);
        let width = img_w * scale;
        let height = img_h * scale;

        Self {
            scale,
            x: (page.width - width) / 2.0,
            y: (page.height - height) / 2.0,
            width,
            height,
        }
    }
}

/// Builds single-page PDFs from JPEG/PNG images.
#[derive(Debug, Clone, Copy)]
pub struct PdfPageCompositor {
    geometry: PageGeometry,
}

impl Default for PdfPageCompositor {
    fn default() -> Self {
        Self::new(PaperSize::default())
    }
}

impl PdfPageCompositor {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            geometry: paper_size.geometry(),
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    /// Create a single-page PDF containing the image.
    ///
    /// `image_mime` must be `image/jpeg` (or `image/jpg`) or `image/png`. The
    /// bytes are decoded as that format before anything is embedded.
    #[instrument(skip(self, image_bytes), fields(bytes_len = image_bytes.len(), mime = image_mime))]
    pub fn image_to_single_page_pdf(&self, image_bytes: &[u8], image_mime: &str) -> Result<Vec<u8>> {
        let format = RasterFormat::from_mime(image_mime)
            .ok_or_else(|| ConvertError::UnsupportedImageFormat(image_mime.to_string()))?;
        let image_format = match format {
            RasterFormat::Jpeg => ImageFormat::Jpeg,
            RasterFormat::Png => ImageFormat::Png,
        };

        let dynamic_image = image::load_from_memory_with_format(image_bytes, image_format)
            .map_err(|err| {
                ConvertError::EmbedFailed(format!("image is not a valid {image_mime}: {err}"))
            })?;

        let img_width = dynamic_image.width();
        let img_height = dynamic_image.height();
        let placement = Placement::fit_to_page(img_width, img_height, self.geometry);

        info!(
            width = img_width,
            height = img_height,
            page_w = self.geometry.width,
            page_h = self.geometry.height,
            "Composing image PDF"
        );

        let rgb_image = dynamic_image.to_rgb8();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb_image.into_raw()),
            width: img_width as usize,
            height: img_height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new("LocalConvert Image");
        let xobject_id = doc.add_image(&raw);

        // At 72 dpi one image pixel is one point, so the placement scale
        // applies directly.
        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(placement.x)),
                translate_y: Some(Pt(placement.y)),
                scale_x: Some(placement.scale),
                scale_y: Some(placement.scale),
                dpi: Some(72.0),
                rotate: None,
            },
        }];

        let page = PdfPage::new(
            pt_to_mm(self.geometry.width),
            pt_to_mm(self.geometry.height),
            ops,
        );
        doc.with_pages(vec![page]);

        debug!(?placement, "Image placed on page");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings while saving");
        }

        Ok(output)
    }
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}
