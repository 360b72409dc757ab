// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — loading, page-level merging, and image-to-page composition.

pub mod compositor;
pub mod loader;
pub mod merge;

pub use compositor::PdfPageCompositor;
pub use loader::{LoadedPdf, PdfDocumentLoader};
pub use merge::PdfMergeEngine;
