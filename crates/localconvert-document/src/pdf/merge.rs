// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF merge engine — assemble a new document from an ordered list of
// (source, page) references using `lopdf`.
//
// Each referenced page is copied together with every object it transitively
// references. Objects shared between pages of one source are copied once per
// merge and shared again in the output. Attributes a page inherits from its
// page-tree ancestors are resolved and written onto the copied page, because
// the source page tree is not carried over.

use std::collections::HashMap;
use std::sync::Arc;

use localconvert_core::error::{ConvertError, Result};
use localconvert_core::{PageReference, SourceId};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, instrument, warn};

use super::loader::LoadedPdf;

/// Page attributes that may be inherited from an ancestor `Pages` node.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed page trees whose `Parent` links form a loop.
const MAX_TREE_DEPTH: usize = 64;

/// Builds merged PDFs from page references into already loaded sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfMergeEngine;

impl PdfMergeEngine {
    pub fn new() -> Self {
        Self
    }

    /// Produce a new PDF whose page `i` is a copy of `refs[i]`.
    ///
    /// `resolve` maps a source id to its loaded document. The merge is
    /// all-or-nothing: every reference is resolved and bounds-checked before
    /// any page is copied, and no partial output is ever returned.
    ///
    /// Errors: `NothingToMerge` for an empty list, `MergeFailed` for an
    /// unknown source, an out-of-range page index, an unreadable page, or a
    /// serialisation failure.
    #[instrument(skip_all, fields(pages = refs.len()))]
    pub fn merge<F>(&self, refs: &[PageReference], resolve: F) -> Result<Vec<u8>>
    where
        F: Fn(SourceId) -> Option<Arc<LoadedPdf>>,
    {
        if refs.is_empty() {
            return Err(ConvertError::NothingToMerge);
        }

        let plan = resolve_all(refs, &resolve)?;
        info!(sources = plan.sources.len(), "Merging pages");

        let mut output = OutputDocument::new();
        let mut copiers: HashMap<SourceId, PageCopier<'_>> = HashMap::new();

        for (position, (source_id, page_id)) in plan.pages.iter().enumerate() {
            let source = plan
                .sources
                .get(source_id)
                .ok_or_else(|| ConvertError::MergeFailed(format!("{source_id} vanished during merge")))?;
            let copier = copiers
                .entry(*source_id)
                .or_insert_with(|| PageCopier::new(source.document()));
            let new_page = copier.copy_page(&mut output, *page_id).map_err(|err| {
                ConvertError::MergeFailed(format!(
                    "page {} of {} ({}) could not be copied: {err}",
                    position + 1,
                    source.name(),
                    source_id
                ))
            })?;
            output.kids.push(Object::Reference(new_page));
        }

        let bytes = output.finish(refs.len())?;
        debug!(output_bytes = bytes.len(), "Merge complete");
        Ok(bytes)
    }
}

/// Every reference resolved up front.
struct MergePlan {
    sources: HashMap<SourceId, Arc<LoadedPdf>>,
    pages: Vec<(SourceId, ObjectId)>,
}

fn resolve_all<F>(refs: &[PageReference], resolve: &F) -> Result<MergePlan>
where
    F: Fn(SourceId) -> Option<Arc<LoadedPdf>>,
{
    let mut sources: HashMap<SourceId, Arc<LoadedPdf>> = HashMap::new();
    let mut pages = Vec::with_capacity(refs.len());

    for (position, page_ref) in refs.iter().enumerate() {
        if !sources.contains_key(&page_ref.source) {
            let loaded = resolve(page_ref.source).ok_or_else(|| {
                ConvertError::MergeFailed(format!(
                    "entry {} refers to {}, which is not loaded",
                    position + 1,
                    page_ref.source
                ))
            })?;
            sources.insert(page_ref.source, loaded);
        }
        let source = &sources[&page_ref.source];
        let page_id = source.page_id(page_ref.page_index).map_err(|err| {
            ConvertError::MergeFailed(format!(
                "entry {} refers to a missing page of {}: {err}",
                position + 1,
                source.name()
            ))
        })?;
        pages.push((page_ref.source, page_id));
    }

    Ok(MergePlan { sources, pages })
}

/// The document under construction plus its single flat page-tree node.
struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl OutputDocument {
    fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    fn finish(mut self, expected_pages: usize) -> Result<Vec<u8>> {
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(self.kids.len() as i64));
        pages.set("Kids", Object::Array(self.kids));
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.doc.add_object(Object::Dictionary(catalog));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let actual = self.doc.get_pages().len();
        if actual != expected_pages {
            return Err(ConvertError::MergeFailed(format!(
                "assembled {actual} pages, expected {expected_pages}"
            )));
        }

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|err| ConvertError::MergeFailed(format!("failed to serialise merged PDF: {err}")))?;
        Ok(output)
    }
}

/// Copies pages out of one source document, remembering which source objects
/// already have a counterpart in the output.
struct PageCopier<'a> {
    source: &'a Document,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageCopier<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            copied: HashMap::new(),
        }
    }

    /// Copy one page and return its id in the output. Each call produces a
    /// fresh page object, so the same page can appear more than once.
    fn copy_page(&mut self, output: &mut OutputDocument, page_id: ObjectId) -> lopdf::Result<ObjectId> {
        let source = self.source;
        let page = source.get_dictionary(page_id)?;
        let new_id = output.doc.new_object_id();
        // Back-references to the page (annotation /P) resolve to its first copy.
        self.copied.entry(page_id).or_insert(new_id);

        let mut dict = self.copy_dictionary(&mut output.doc, page);
        for key in INHERITABLE {
            if dict.has(key) {
                continue;
            }
            if let Some(value) = self.inherited(page, key) {
                let value = self.copy_object(&mut output.doc, value);
                dict.set(key.to_vec(), value);
            }
        }
        dict.set("Parent", Object::Reference(output.pages_id));

        output.doc.objects.insert(new_id, Object::Dictionary(dict));
        Ok(new_id)
    }

    fn inherited(&self, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        let source = self.source;
        let mut node = page;
        for _ in 0..MAX_TREE_DEPTH {
            let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
            node = source.get_dictionary(parent_id).ok()?;
            if let Ok(value) = node.get(key) {
                return Some(value);
            }
        }
        warn!("Page tree deeper than {MAX_TREE_DEPTH} levels; giving up on inheritance");
        None
    }

    fn copy_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(new_id) = self.copied.get(&id) {
            return Object::Reference(*new_id);
        }
        let Ok(object) = self.source.get_object(id) else {
            warn!(?id, "Cannot resolve reference, using Null");
            return Object::Null;
        };
        // Reserve the id first so cycles terminate at the memo lookup.
        let new_id = target.new_object_id();
        self.copied.insert(id, new_id);
        let cloned = self.copy_object(target, object);
        target.objects.insert(new_id, cloned);
        Object::Reference(new_id)
    }

    fn copy_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        // Page-tree links stay behind: the output has its own page tree.
        // Other `Parent` keys (form fields, popup annotations) are kept.
        let page_tree_node = matches!(
            dict.get(b"Type").and_then(Object::as_name),
            Ok(b"Page" | b"Pages")
        );
        let mut new_dict = Dictionary::new();
        for (key, value) in dict.iter() {
            if page_tree_node && key == b"Parent" {
                continue;
            }
            let cloned = self.copy_object(target, value);
            new_dict.set(key.clone(), cloned);
        }
        new_dict
    }

    fn copy_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(target, *id),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_object(target, item))
                    .collect(),
            ),
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(target, &stream.dict);
                Object::Stream(Stream::new(dict, stream.content.clone()))
            }
            other => other.clone(),
        }
    }
}
