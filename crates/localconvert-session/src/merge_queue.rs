// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge queue — loaded sources plus the flat, ordered list of page
// references that defines the merged document.

use std::collections::HashMap;
use std::sync::Arc;

use localconvert_core::error::{ConvertError, Result};
use localconvert_core::{PageReference, SourceId};
use localconvert_document::{LoadedPdf, PagePreview};
use serde::Serialize;
use tracing::debug;

/// A PDF that has been loaded into the merge session.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pdf: Arc<LoadedPdf>,
}

impl LoadedSource {
    pub fn new(pdf: Arc<LoadedPdf>) -> Self {
        Self { pdf }
    }

    pub fn id(&self) -> SourceId {
        self.pdf.id()
    }

    pub fn name(&self) -> &str {
        self.pdf.name()
    }

    pub fn page_count(&self) -> usize {
        self.pdf.page_count()
    }

    pub fn fingerprint(&self) -> &str {
        self.pdf.fingerprint()
    }

    pub fn pdf(&self) -> &Arc<LoadedPdf> {
        &self.pdf
    }

    pub fn summary(&self) -> SourceSummary {
        SourceSummary {
            id: self.id(),
            name: self.name().to_string(),
            page_count: self.page_count(),
            fingerprint: self.fingerprint().to_string(),
        }
    }
}

/// Serializable description of a loaded source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub id: SourceId,
    pub name: String,
    pub page_count: usize,
    pub fingerprint: String,
}

/// Sources in load order, and the page order that will be merged.
///
/// Page references only ever point at sources held by the queue: removing a
/// source purges its references, removing a reference leaves the source.
#[derive(Debug, Default)]
pub struct MergeQueue {
    sources: Vec<LoadedSource>,
    pages: Vec<PageReference>,
    previews: HashMap<PageReference, PagePreview>,
}

impl MergeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source and every one of its pages, in page order.
    ///
    /// Previews for pages of other sources are ignored.
    pub fn add_source(&mut self, pdf: Arc<LoadedPdf>, previews: impl IntoIterator<Item = PagePreview>) {
        let id = pdf.id();
        self.pages
            .extend((0..pdf.page_count()).map(|page_index| PageReference::new(id, page_index)));
        for preview in previews.into_iter().filter(|p| p.source == id) {
            self.previews
                .insert(PageReference::new(preview.source, preview.page_index), preview);
        }
        self.sources.push(LoadedSource::new(pdf));
    }

    pub fn sources(&self) -> &[LoadedSource] {
        &self.sources
    }

    pub fn pages(&self) -> &[PageReference] {
        &self.pages
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn source(&self, id: SourceId) -> Option<&LoadedSource> {
        self.sources.iter().find(|s| s.id() == id)
    }

    /// Document lookup for the merge engine.
    pub fn resolve(&self, id: SourceId) -> Option<Arc<LoadedPdf>> {
        self.source(id).map(|s| Arc::clone(s.pdf()))
    }

    pub fn preview(&self, page: &PageReference) -> Option<&PagePreview> {
        self.previews.get(page)
    }

    /// Previews in page order. Pages without a preview are skipped.
    pub fn previews(&self) -> Vec<PagePreview> {
        self.pages
            .iter()
            .filter_map(|page| self.previews.get(page).cloned())
            .collect()
    }

    /// Move the page at `from` so it ends up at `to`.
    ///
    /// Remove-then-insert: `to` indexes the list after the page is taken out.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.pages.len();
        for index in [from, to] {
            if index >= len {
                return Err(ConvertError::PageIndexOutOfRange { index, page_count: len });
            }
        }
        if from != to {
            let page = self.pages.remove(from);
            self.pages.insert(to, page);
            debug!(from, to, "Page moved");
        }
        Ok(())
    }

    /// Drop the reference at `index`. Its source stays loaded.
    pub fn remove_page(&mut self, index: usize) -> Result<PageReference> {
        if index >= self.pages.len() {
            return Err(ConvertError::PageIndexOutOfRange {
                index,
                page_count: self.pages.len(),
            });
        }
        Ok(self.pages.remove(index))
    }

    /// Drop a source and every reference to it. Remaining references keep
    /// their relative order.
    pub fn remove_source(&mut self, id: SourceId) -> Option<LoadedSource> {
        let position = self.sources.iter().position(|s| s.id() == id)?;
        let removed = self.sources.remove(position);
        self.pages.retain(|page| page.source != id);
        self.previews.retain(|page, _| page.source != id);
        debug!(source = %id, remaining_pages = self.pages.len(), "Source removed");
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.sources.clear();
        self.pages.clear();
        self.previews.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::loaded;
    use localconvert_core::ErrorKind;
    use localconvert_document::PdfDocumentLoader;

    fn queue_ab() -> (MergeQueue, SourceId, SourceId) {
        let loader = PdfDocumentLoader::new();
        let a = loaded(&loader, "a.pdf", &[100.0, 101.0, 102.0]);
        let b = loaded(&loader, "b.pdf", &[200.0, 201.0]);
        let (a_id, b_id) = (a.id(), b.id());
        let mut queue = MergeQueue::new();
        queue.add_source(a, Vec::new());
        queue.add_source(b, Vec::new());
        (queue, a_id, b_id)
    }

    fn order(queue: &MergeQueue) -> Vec<(SourceId, usize)> {
        queue.pages().iter().map(|p| (p.source, p.page_index)).collect()
    }

    #[test]
    fn sources_append_all_pages_in_order() {
        let (queue, a, b) = queue_ab();
        assert_eq!(order(&queue), vec![(a, 0), (a, 1), (a, 2), (b, 0), (b, 1)]);
        assert_eq!(queue.sources().len(), 2);
        assert_eq!(queue.source(b).map(LoadedSource::page_count), Some(2));
    }

    #[test]
    fn reorder_moves_forward_and_backward() {
        let (mut queue, a, b) = queue_ab();
        queue.reorder(0, 4).unwrap();
        assert_eq!(order(&queue), vec![(a, 1), (a, 2), (b, 0), (b, 1), (a, 0)]);
        queue.reorder(3, 0).unwrap();
        assert_eq!(order(&queue), vec![(b, 1), (a, 1), (a, 2), (b, 0), (a, 0)]);
        queue.reorder(2, 2).unwrap();
        assert_eq!(queue.pages().len(), 5);
    }

    #[test]
    fn reorder_out_of_range_leaves_order_alone() {
        let (mut queue, ..) = queue_ab();
        let before = order(&queue);
        let err = queue.reorder(1, 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PageIndexOutOfRange);
        assert_eq!(order(&queue), before);
    }

    #[test]
    fn removing_a_page_keeps_the_source() {
        let (mut queue, a, _) = queue_ab();
        assert_eq!(queue.remove_page(1).unwrap(), PageReference::new(a, 1));
        assert_eq!(queue.pages().len(), 4);
        assert!(queue.source(a).is_some());
        assert!(queue.remove_page(4).is_err());
    }

    #[test]
    fn removing_a_source_purges_its_pages_and_keeps_the_rest_in_order() {
        let (mut queue, a, b) = queue_ab();
        queue.reorder(4, 0).unwrap();
        queue.reorder(4, 2).unwrap();
        assert_eq!(order(&queue), vec![(b, 1), (a, 0), (b, 0), (a, 1), (a, 2)]);

        let removed = queue.remove_source(a).expect("a is loaded");
        assert_eq!(removed.name(), "a.pdf");
        assert_eq!(order(&queue), vec![(b, 1), (b, 0)]);
        assert!(queue.resolve(a).is_none());
        assert!(queue.remove_source(a).is_none());
    }

    #[test]
    fn previews_follow_page_order() {
        let loader = PdfDocumentLoader::new();
        let pdf = loaded(&loader, "p.pdf", &[100.0, 120.0]);
        let id = pdf.id();
        let preview = |page_index| PagePreview {
            source: id,
            page_index,
            png: vec![page_index as u8],
            width: 1,
            height: 1,
            is_placeholder: false,
        };
        let mut queue = MergeQueue::new();
        queue.add_source(pdf, vec![preview(0), preview(1)]);
        queue.reorder(1, 0).unwrap();
        let indices: Vec<usize> = queue.previews().iter().map(|p| p.page_index).collect();
        assert_eq!(indices, vec![1, 0]);

        queue.remove_page(0).unwrap();
        assert_eq!(queue.previews().len(), 1);
        queue.clear();
        assert!(queue.is_empty() && queue.sources().is_empty());
    }
}
