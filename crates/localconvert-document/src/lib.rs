// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// localconvert-document — Binary format work for the LocalConvert engine.
//
// Provides raster re-encoding (JPEG/PNG), image-to-PDF page composition, PDF
// loading, page-level merging, page preview rendering, and optical character
// recognition behind a pluggable worker backend.

pub mod image;
pub mod ocr;
pub mod pdf;
pub mod render;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the primary structs so callers can use `localconvert_document::ImageCodec` etc.
pub use self::image::codec::ImageCodec;
pub use ocr::{OcrBackend, OcrEngine, OcrWorker, WorkerStatus};
pub use pdf::compositor::{PdfPageCompositor, Placement};
pub use pdf::loader::{LoadedPdf, PdfDocumentLoader};
pub use pdf::merge::PdfMergeEngine;
pub use render::{PagePreview, PageRasterizer, PdfPageRenderer};
