// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page preview rendering — turn one page of a loaded PDF into a PNG thumbnail.
//
// Rasterization is pluggable through `PageRasterizer`. The built-in
// rasterizer is pure Rust over the parsed `lopdf` document; the pdfium-backed
// one (feature `pdfium`) gives full-fidelity output. Whatever the backend,
// a rasterization failure degrades to a placeholder card rather than an error.

pub mod placeholder;
pub mod raster;

#[cfg(feature = "pdfium")]
pub mod pdfium;

use std::sync::Arc;

use image::DynamicImage;
use localconvert_core::SourceId;
use localconvert_core::config::DEFAULT_PREVIEW_SCALE;
use localconvert_core::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::image::codec::encode_png;
use crate::pdf::loader::LoadedPdf;

pub use raster::LopdfRasterizer;

#[cfg(feature = "pdfium")]
pub use self::pdfium::PdfiumRasterizer;

/// Backend that paints a single page into pixels.
///
/// `scale` is pixels per PDF point, so a 612 x 792 pt page at 0.5 becomes a
/// 306 x 396 px image.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, doc: &LoadedPdf, page_index: usize, scale: f32) -> Result<DynamicImage>;
}

/// A rendered page thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePreview {
    pub source: SourceId,
    pub page_index: usize,
    /// PNG-encoded thumbnail.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// True when rasterization failed and this is the substitute card.
    pub is_placeholder: bool,
}

/// Renders page previews at a fixed scale.
#[derive(Clone)]
pub struct PdfPageRenderer {
    rasterizer: Arc<dyn PageRasterizer>,
    scale: f32,
}

impl std::fmt::Debug for PdfPageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfPageRenderer")
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

impl Default for PdfPageRenderer {
    fn default() -> Self {
        Self::new(Arc::new(LopdfRasterizer), DEFAULT_PREVIEW_SCALE)
    }
}

impl PdfPageRenderer {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, scale: f32) -> Self {
        Self { rasterizer, scale }
    }

    /// Built-in rasterizer at the given scale.
    pub fn with_scale(scale: f32) -> Self {
        Self::new(Arc::new(LopdfRasterizer), scale)
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Render page `page_index` (0-based) of `doc`.
    ///
    /// Only an out-of-range index is an error. Any other failure produces a
    /// placeholder preview.
    #[instrument(skip_all, fields(source = %doc.id(), page_index))]
    pub fn render_page(&self, doc: &LoadedPdf, page_index: usize) -> Result<PagePreview> {
        let page_count = doc.page_count();
        if page_index >= page_count {
            return Err(ConvertError::PageIndexOutOfRange {
                index: page_index,
                page_count,
            });
        }

        let rendered = self
            .rasterizer
            .rasterize(doc, page_index, self.scale)
            .and_then(|image| encode_png(&image).map(|png| (image, png)));

        let (image, png, is_placeholder) = match rendered {
            Ok((image, png)) => (image, png, false),
            Err(err) => {
                warn!(%err, "Page could not be rasterized; using placeholder");
                let (width, height) = raster::page_pixel_size(doc, page_index, self.scale);
                let image = placeholder::placeholder_card(width, height, page_index + 1);
                let png = encode_png(&image)?;
                (image, png, true)
            }
        };

        debug!(
            width = image.width(),
            height = image.height(),
            is_placeholder,
            png_bytes = png.len(),
            "Page preview rendered"
        );

        Ok(PagePreview {
            source: doc.id(),
            page_index,
            png,
            width: image.width(),
            height: image.height(),
            is_placeholder,
        })
    }
}
