// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixture builders shared by the unit tests of this crate.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, RgbImage};
use localconvert_core::{PageReference, PaperSize, SourceId};
use localconvert_document::{LoadedPdf, PdfDocumentLoader, PdfMergeEngine, PdfPageCompositor};

/// A solid-colour PNG.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode fixture png");
    out.into_inner()
}

/// A PDF with one page per entry; each page is `widths[i]` points wide.
pub fn pdf_bytes(widths: &[f32]) -> Vec<u8> {
    let loader = PdfDocumentLoader::new();
    let singles: Vec<Arc<LoadedPdf>> = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            let compositor = PdfPageCompositor::new(PaperSize::Custom {
                width_pt: width,
                height_pt: 100.0,
            });
            let bytes = compositor
                .image_to_single_page_pdf(&png(4, 4), "image/png")
                .expect("compose fixture page");
            Arc::new(loader.load(&format!("page-{i}.pdf"), bytes).expect("load fixture page"))
        })
        .collect();
    let refs: Vec<PageReference> = singles.iter().map(|pdf| PageReference::new(pdf.id(), 0)).collect();
    PdfMergeEngine::new()
        .merge(&refs, |id: SourceId| singles.iter().find(|pdf| pdf.id() == id).cloned())
        .expect("assemble fixture pdf")
}

/// Parse `pdf_bytes(widths)` with `loader`.
pub fn loaded(loader: &PdfDocumentLoader, name: &str, widths: &[f32]) -> Arc<LoadedPdf> {
    Arc::new(loader.load(name, pdf_bytes(widths)).expect("load fixture pdf"))
}
