// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge session — load PDFs, preview their pages, arrange the page order,
// and assemble the merged document.
//
// Loading and merging run through the same job snapshot as single-file
// conversions. Loading is skip-and-continue: a file that is not a PDF or
// does not parse is reported and the rest still load. Merging is
// all-or-nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};
use localconvert_core::config::EngineConfig;
use localconvert_core::error::{ConvertError, Result};
use localconvert_core::{ConvertedArtifact, FileType, PageReference, SourceFile, SourceId};
use localconvert_document::{LoadedPdf, PagePreview, PdfDocumentLoader, PdfMergeEngine, PdfPageRenderer};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::job::{JobOutcome, JobSnapshot, JobTicket};
use crate::merge_queue::{LoadedSource, MergeQueue, SourceSummary};
use crate::progress::{ProgressTicker, TickerSlot};

/// Progress reported once every page preview of a load has rendered.
const LOAD_PROGRESS_CEILING: usize = 90;

/// A file that could not be added to the session.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub name: String,
    pub error: ConvertError,
}

/// What a `load_sources` call did.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Sources appended to the session, in input order.
    pub loaded: Vec<SourceSummary>,
    pub failures: Vec<LoadFailure>,
    pub pages_added: usize,
    /// Pages whose preview is a placeholder card.
    pub placeholders: usize,
    /// The session was reset while loading; nothing was added.
    pub discarded: bool,
}

/// Serializable view of the session for a UI.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOverview {
    pub sources: Vec<SourceSummary>,
    pub pages: Vec<PageReference>,
    pub merged_file_name: Option<String>,
}

struct SessionState {
    queue: MergeQueue,
    /// Bumped by `reset`; loads started under an older epoch are discarded.
    epoch: u64,
    merged: Option<Arc<ConvertedArtifact>>,
}

struct Inner {
    config: EngineConfig,
    loader: PdfDocumentLoader,
    renderer: PdfPageRenderer,
    engine: PdfMergeEngine,
    state: Mutex<SessionState>,
    job: watch::Sender<JobSnapshot>,
    ticker: TickerSlot,
    live_tickers: Arc<AtomicUsize>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn parse(&self, file: &SourceFile) -> Result<LoadedPdf> {
        if file.file_type() != Some(FileType::Pdf) {
            return Err(ConvertError::MalformedDocument {
                name: file.name.clone(),
                reason: "not a PDF file".into(),
            });
        }
        self.loader.load(&file.name, Arc::clone(&file.bytes))
    }
}

/// Owns loaded sources, the page order, previews and the last merged PDF.
///
/// Cloning is cheap; clones share the session.
#[derive(Clone)]
pub struct MergeSession {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MergeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state();
        f.debug_struct("MergeSession")
            .field("sources", &state.queue.sources().len())
            .field("pages", &state.queue.pages().len())
            .field("epoch", &state.epoch)
            .finish_non_exhaustive()
    }
}

impl MergeSession {
    /// Session with the built-in rasterizer at the configured preview scale.
    pub fn new(config: EngineConfig) -> Self {
        let renderer = PdfPageRenderer::with_scale(config.preview_scale);
        Self::with_renderer(config, renderer)
    }

    pub fn with_renderer(config: EngineConfig, renderer: PdfPageRenderer) -> Self {
        let (job, _) = watch::channel(JobSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                config,
                loader: PdfDocumentLoader::new(),
                renderer,
                engine: PdfMergeEngine::new(),
                state: Mutex::new(SessionState {
                    queue: MergeQueue::new(),
                    epoch: 0,
                    merged: None,
                }),
                job,
                ticker: TickerSlot::new(),
                live_tickers: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.inner.job.subscribe()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.inner.job.borrow().clone()
    }

    pub fn live_tickers(&self) -> usize {
        self.inner.live_tickers.load(Ordering::SeqCst)
    }

    pub fn sources(&self) -> Vec<LoadedSource> {
        self.inner.state().queue.sources().to_vec()
    }

    pub fn pages(&self) -> Vec<PageReference> {
        self.inner.state().queue.pages().to_vec()
    }

    /// Previews in the current page order.
    pub fn previews(&self) -> Vec<PagePreview> {
        self.inner.state().queue.previews()
    }

    /// The last successfully merged document, until the next reset.
    pub fn merged_artifact(&self) -> Option<Arc<ConvertedArtifact>> {
        self.inner.state().merged.clone()
    }

    pub fn overview(&self) -> SessionOverview {
        let state = self.inner.state();
        SessionOverview {
            sources: state.queue.sources().iter().map(LoadedSource::summary).collect(),
            pages: state.queue.pages().to_vec(),
            merged_file_name: state.merged.as_ref().map(|a| a.suggested_file_name.clone()),
        }
    }

    /// Load `files` and append them, with all their pages, to the session.
    ///
    /// Files that are not PDFs or fail to parse are reported in the result
    /// and skipped. Previews render in parallel; progress follows the number
    /// of rendered pages up to 90, then 100 once everything is added.
    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn load_sources(&self, files: Vec<SourceFile>) -> LoadReport {
        let mut report = LoadReport::default();
        if files.is_empty() {
            return report;
        }

        let epoch = self.inner.state().epoch;
        let mut generation = 0;
        self.inner.job.send_modify(|snapshot| generation = snapshot.begin());
        self.inner.ticker.clear();

        let inner = Arc::clone(&self.inner);
        let parsed = tokio::task::spawn_blocking(move || {
            files
                .into_iter()
                .map(|file| {
                    let parsed = inner.parse(&file);
                    (file.name, parsed)
                })
                .collect::<Vec<_>>()
        })
        .await;
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                let error = ConvertError::Internal(format!("document parse task failed: {err}"));
                self.inner
                    .job
                    .send_if_modified(|snapshot| snapshot.fail(generation, error.clone()));
                report.failures.push(LoadFailure {
                    name: String::new(),
                    error,
                });
                return report;
            }
        };

        let mut documents: Vec<Arc<LoadedPdf>> = Vec::new();
        for (name, result) in parsed {
            match result {
                Ok(pdf) => documents.push(Arc::new(pdf)),
                Err(error) => {
                    warn!(file = %name, %error, "Skipping file that could not be loaded");
                    report.failures.push(LoadFailure { name, error });
                }
            }
        }

        let previews = self.render_previews(&documents, generation).await;
        report.placeholders = previews.iter().flatten().filter(|p| p.is_placeholder).count();

        {
            let mut state = self.inner.state();
            if state.epoch == epoch {
                for (pdf, previews) in documents.iter().zip(previews) {
                    report.pages_added += pdf.page_count();
                    report.loaded.push(LoadedSource::new(Arc::clone(pdf)).summary());
                    state.queue.add_source(Arc::clone(pdf), previews);
                }
            } else {
                report.discarded = true;
            }
        }

        if report.discarded {
            info!("Session was reset while loading; loaded documents discarded");
            return report;
        }

        match report.failures.first() {
            Some(first) if report.loaded.is_empty() => {
                let error = first.error.clone();
                self.inner
                    .job
                    .send_if_modified(|snapshot| snapshot.fail(generation, error));
                warn!(failed = report.failures.len(), "No valid PDF files were loaded");
            }
            _ => {
                self.inner
                    .job
                    .send_if_modified(|snapshot| snapshot.succeed(generation, None));
                info!(
                    loaded = report.loaded.len(),
                    failed = report.failures.len(),
                    pages = report.pages_added,
                    placeholders = report.placeholders,
                    "PDF files loaded"
                );
            }
        }
        report
    }

    /// Render every page of `documents` in parallel. The result holds one
    /// list per document, in page order.
    async fn render_previews(&self, documents: &[Arc<LoadedPdf>], generation: u64) -> Vec<Vec<PagePreview>> {
        let total: usize = documents.iter().map(|pdf| pdf.page_count()).sum();
        let mut grouped: Vec<Vec<PagePreview>> = vec![Vec::new(); documents.len()];
        if total == 0 {
            return grouped;
        }

        let mut tasks = JoinSet::new();
        for (position, pdf) in documents.iter().enumerate() {
            for page_index in 0..pdf.page_count() {
                let inner = Arc::clone(&self.inner);
                let pdf = Arc::clone(pdf);
                tasks.spawn_blocking(move || (position, inner.renderer.render_page(&pdf, page_index)));
            }
        }

        let mut done = 0usize;
        while let Some(joined) = tasks.join_next().await {
            done += 1;
            match joined {
                Ok((position, Ok(preview))) => grouped[position].push(preview),
                Ok((position, Err(err))) => {
                    warn!(source = %documents[position].id(), %err, "Page preview skipped");
                }
                Err(err) => warn!(%err, "Page preview task failed"),
            }
            let progress = (LOAD_PROGRESS_CEILING * done / total) as u8;
            self.inner
                .job
                .send_if_modified(|snapshot| snapshot.report(generation, progress));
        }

        for previews in &mut grouped {
            previews.sort_by_key(|p| p.page_index);
        }
        debug!(pages = total, "Page previews rendered");
        grouped
    }

    /// Move the page at `from` to `to` (remove-then-insert).
    pub fn reorder(&self, from: usize, to: usize) -> Result<()> {
        self.inner.state().queue.reorder(from, to)
    }

    /// Drop one page from the merge order.
    pub fn remove_page(&self, index: usize) -> Result<PageReference> {
        self.inner.state().queue.remove_page(index)
    }

    /// Unload a source and purge its pages. `None` if it was not loaded.
    pub fn remove_source(&self, id: SourceId) -> Option<LoadedSource> {
        self.inner.state().queue.remove_source(id)
    }

    /// Assemble the current page order into one PDF.
    ///
    /// An empty page list is refused with `NothingToMerge` before any job
    /// starts. The merged artifact is named `merged_YYYY-MM-DD.pdf` (UTC).
    #[instrument(skip_all)]
    pub fn merge(&self) -> Result<JobTicket> {
        let (refs, sources, epoch) = {
            let state = self.inner.state();
            if state.queue.is_empty() {
                return Err(ConvertError::NothingToMerge);
            }
            let sources: HashMap<SourceId, Arc<LoadedPdf>> = state
                .queue
                .sources()
                .iter()
                .map(|s| (s.id(), Arc::clone(s.pdf())))
                .collect();
            (state.queue.pages().to_vec(), sources, state.epoch)
        };

        let mut generation = 0;
        self.inner.job.send_modify(|snapshot| generation = snapshot.begin());
        info!(generation, pages = refs.len(), sources = sources.len(), "Merge started");

        let ticker_config = self.inner.config.merge_ticker;
        let ticker = {
            let live = Arc::clone(&self.inner.live_tickers);
            let inner = Arc::clone(&self.inner);
            ProgressTicker::spawn(ticker_config, live, move || {
                inner
                    .job
                    .send_if_modified(|snapshot| snapshot.tick(generation, ticker_config.step, ticker_config.ceiling));
            })
        };
        self.inner.ticker.install(generation, ticker);

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(run_merge(inner, generation, epoch, refs, sources));
        Ok(JobTicket::new(generation, handle))
    }

    /// Drop every source, page, preview and merged result.
    pub fn reset(&self) {
        {
            let mut state = self.inner.state();
            state.queue.clear();
            state.merged = None;
            state.epoch += 1;
        }
        self.inner.job.send_modify(JobSnapshot::reset);
        self.inner.ticker.clear();
        info!("Merge session reset");
    }
}

async fn run_merge(
    inner: Arc<Inner>,
    generation: u64,
    epoch: u64,
    refs: Vec<PageReference>,
    sources: HashMap<SourceId, Arc<LoadedPdf>>,
) -> JobOutcome {
    let engine = inner.engine;
    let merged = tokio::task::spawn_blocking(move || engine.merge(&refs, |id| sources.get(&id).cloned()))
        .await
        .map_err(|err| ConvertError::Internal(format!("merge task failed: {err}")))
        .and_then(|result| result);
    inner.ticker.release(generation);

    match merged {
        Ok(bytes) => {
            let name = merged_file_name(Utc::now().date_naive());
            let artifact = Arc::new(ConvertedArtifact::new(bytes, name, FileType::Pdf.mime_type()));
            let mut state = inner.state();
            let published = state.epoch == epoch
                && inner
                    .job
                    .send_if_modified(|snapshot| snapshot.succeed(generation, Some(Arc::clone(&artifact))));
            if published {
                state.merged = Some(Arc::clone(&artifact));
                info!(
                    generation,
                    name = %artifact.suggested_file_name,
                    bytes = artifact.bytes.len(),
                    "PDF files merged"
                );
                JobOutcome::Completed(artifact)
            } else {
                JobOutcome::Superseded
            }
        }
        Err(err) => {
            let published = inner
                .job
                .send_if_modified(|snapshot| snapshot.fail(generation, err.clone()));
            if published {
                warn!(generation, %err, "Merge failed");
                JobOutcome::Failed(err)
            } else {
                JobOutcome::Superseded
            }
        }
    }
}

/// `merged_YYYY-MM-DD.pdf`.
pub fn merged_file_name(date: NaiveDate) -> String {
    format!("merged_{}.pdf", date.format("%Y-%m-%d"))
}
