// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Full-fidelity page rasterization through the pdfium library.
//
// Gated behind the `pdfium` feature. Requires a pdfium shared library on the
// system library path at runtime; without one every page becomes a placeholder.

use image::DynamicImage;
use localconvert_core::error::{ConvertError, Result};
use pdfium_render::prelude::*;
use tracing::debug;

use super::PageRasterizer;
use crate::pdf::loader::LoadedPdf;

/// Rasterizer backed by pdfium.
///
/// Binds to the library per call, since pdfium bindings are not shared
/// across the blocking threads the renderer runs on.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumRasterizer;

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, doc: &LoadedPdf, page_index: usize, scale: f32) -> Result<DynamicImage> {
        let fail = |detail: String| ConvertError::MalformedDocument {
            name: doc.name().to_string(),
            reason: detail,
        };

        let index = u16::try_from(page_index)
            .map_err(|_| fail(format!("page {} is beyond pdfium's page range", page_index + 1)))?;

        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| fail(format!("pdfium library is not available: {e:?}")))?;
        let pdfium = Pdfium::new(bindings);
        let document = pdfium
            .load_pdf_from_byte_slice(doc.bytes(), None)
            .map_err(|e| fail(format!("pdfium could not open document: {e:?}")))?;
        let page = document
            .pages()
            .get(index)
            .map_err(|e| fail(format!("pdfium could not open page {}: {e:?}", page_index + 1)))?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| fail(format!("pdfium could not render page {}: {e:?}", page_index + 1)))?;

        let image = bitmap.as_image();
        debug!(
            page = page_index + 1,
            width = image.width(),
            height = image.height(),
            "Page rendered with pdfium"
        );
        Ok(image)
    }
}
