// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF loader — parse PDF bytes into a page-addressable in-memory document
// using the `lopdf` crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use localconvert_core::SourceId;
use localconvert_core::error::{ConvertError, Result};
use lopdf::{Document, ObjectId};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

/// A successfully parsed source PDF.
///
/// Owns both the parsed `lopdf::Document` and the original bytes. The parse
/// is never mutated after loading; the merge engine copies pages out of it
/// and renderers read from it.
pub struct LoadedPdf {
    id: SourceId,
    name: String,
    bytes: Arc<[u8]>,
    document: Document,
    /// Page object ids in page order (index 0 is the first page).
    page_ids: Vec<ObjectId>,
    fingerprint: String,
}

impl std::fmt::Debug for LoadedPdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPdf")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("page_count", &self.page_ids.len())
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl LoadedPdf {
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Display name (usually the original file name).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// The original, unmodified bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The parsed document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// SHA-256 of the original bytes as lowercase hex (diagnostics only).
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Object id of the page at `page_index` (0-based).
    pub fn page_id(&self, page_index: usize) -> Result<ObjectId> {
        self.page_ids
            .get(page_index)
            .copied()
            .ok_or(ConvertError::PageIndexOutOfRange {
                index: page_index,
                page_count: self.page_ids.len(),
            })
    }
}

/// Parses PDFs and hands out per-load identifiers.
#[derive(Debug, Default)]
pub struct PdfDocumentLoader {
    next_id: AtomicU64,
}

impl PdfDocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `bytes` into a [`LoadedPdf`] named `name`.
    ///
    /// Every call allocates a fresh [`SourceId`], even for identical bytes.
    #[instrument(skip(self, bytes), fields(name = %name, bytes_len = tracing::field::Empty))]
    pub fn load(&self, name: &str, bytes: impl Into<Arc<[u8]>>) -> Result<LoadedPdf> {
        let bytes: Arc<[u8]> = bytes.into();
        tracing::Span::current().record("bytes_len", bytes.len());
        let document = Document::load_mem(&bytes).map_err(|err| ConvertError::MalformedDocument {
            name: name.to_string(),
            reason: err.to_string(),
        })?;

        // lopdf pages are keyed by 1-indexed page number, already sorted.
        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        if page_ids.is_empty() {
            warn!("PDF has no pages; it can be listed but contributes nothing to a merge");
        }

        let id = SourceId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let fingerprint = hex::encode(Sha256::digest(&bytes));

        info!(%id, pages = page_ids.len(), "PDF loaded");
        debug!(fingerprint = %fingerprint, version = %document.version, "PDF details");

        Ok(LoadedPdf {
            id,
            name: name.to_string(),
            bytes,
            document,
            page_ids,
            fingerprint,
        })
    }
}
