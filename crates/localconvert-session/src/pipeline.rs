// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion pipeline — gate, dispatch, progress, and the terminal result of
// the session's single active job.
//
// `start_conversion` / `start_ocr` validate synchronously, bump the job
// generation, and hand the work to a background task. The job's progress
// ticker lives until the job ends or is superseded, whichever comes first;
// whatever the task produces is only published if its generation is still
// current when it finishes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use localconvert_core::config::EngineConfig;
use localconvert_core::error::{ConvertError, Result};
use localconvert_core::{ConversionCapabilityTable, ConvertedArtifact, FileType, RasterFormat, SourceFile};
use localconvert_document::ocr::OcrBackend;
use localconvert_document::{ImageCodec, OcrEngine, PdfPageCompositor};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::job::{JobOutcome, JobSnapshot, JobTicket};
use crate::progress::{ProgressTicker, TickerSlot};

const TEXT_MIME: &str = "text/plain";

/// What a started job will do. Decided once, before the job is spawned.
#[derive(Debug, Clone, PartialEq)]
enum ConversionPlan {
    /// Decode and re-encode as another raster format.
    Reencode { format: RasterFormat, target: FileType },
    /// Wrap the image in a single-page PDF.
    ImageToPdf { mime: &'static str },
    /// Extract text with OCR.
    Recognize { language: Option<String> },
}

impl ConversionPlan {
    /// Map a capability-table edge onto a plan.
    fn for_edge(source: FileType, target: FileType) -> Result<Self> {
        if !ConversionCapabilityTable::is_supported(source, target) {
            return Err(ConvertError::UnsupportedConversion {
                from: source.extension().to_string(),
                to: target.extension().to_string(),
            });
        }
        Ok(match target.raster_format() {
            Some(format) => Self::Reencode { format, target },
            None => Self::ImageToPdf {
                mime: source.mime_type(),
            },
        })
    }

    fn artifact_name(&self, file: &SourceFile) -> String {
        let extension = match self {
            Self::Reencode { target, .. } => target.extension(),
            Self::ImageToPdf { .. } => FileType::Pdf.extension(),
            Self::Recognize { .. } => "txt",
        };
        format!("{}.{extension}", file.stem())
    }
}

struct Shared {
    config: EngineConfig,
    codec: ImageCodec,
    compositor: PdfPageCompositor,
    ocr: Arc<OcrEngine>,
    job: watch::Sender<JobSnapshot>,
    ticker: TickerSlot,
    live_tickers: Arc<AtomicUsize>,
}

/// Runs single-file conversions and OCR, one live job at a time.
///
/// Cloning is cheap; clones drive the same job.
#[derive(Clone)]
pub struct ConversionPipeline {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for ConversionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionPipeline")
            .field("config", &self.shared.config)
            .field("job", &*self.shared.job.borrow())
            .finish_non_exhaustive()
    }
}

impl ConversionPipeline {
    pub fn new(config: EngineConfig, ocr: Arc<OcrEngine>) -> Self {
        let (job, _) = watch::channel(JobSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                codec: ImageCodec::new(config.jpeg_quality),
                compositor: PdfPageCompositor::new(config.paper_size),
                ocr,
                job,
                ticker: TickerSlot::new(),
                live_tickers: Arc::new(AtomicUsize::new(0)),
                config,
            }),
        }
    }

    /// Build the OCR engine from the configured language list.
    pub fn with_ocr_backend(config: EngineConfig, backend: Arc<dyn OcrBackend>) -> Self {
        let ocr = Arc::new(OcrEngine::new(backend, config.ocr_languages.clone()));
        Self::new(config, ocr)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    pub fn ocr(&self) -> &Arc<OcrEngine> {
        &self.shared.ocr
    }

    /// Observe job snapshots. The receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.shared.job.subscribe()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.shared.job.borrow().clone()
    }

    /// Number of progress tickers currently alive.
    pub fn live_tickers(&self) -> usize {
        self.shared.live_tickers.load(Ordering::SeqCst)
    }

    /// Targets offered for a file name.
    pub fn available_targets(&self, file_name: &str) -> &'static [FileType] {
        ConversionCapabilityTable::available_targets(file_name)
    }

    /// Start converting `file` to `target`.
    ///
    /// Unsupported pairs are refused here, before any state changes. A
    /// running job is superseded: its result will be discarded.
    #[instrument(skip_all, fields(file = %file.name, target = %target))]
    pub fn start_conversion(&self, file: SourceFile, target: FileType) -> Result<JobTicket> {
        let Some(source) = file.file_type() else {
            return Err(ConvertError::UnsupportedConversion {
                from: source_label(&file.name),
                to: target.extension().to_string(),
            });
        };
        let plan = ConversionPlan::for_edge(source, target)?;
        Ok(self.launch(file, plan))
    }

    /// Start recognising the text in a JPEG/PNG image.
    ///
    /// `language` defaults to the OCR engine's first language.
    #[instrument(skip_all, fields(file = %file.name, language = ?language))]
    pub fn start_ocr(&self, file: SourceFile, language: Option<String>) -> Result<JobTicket> {
        if !file.file_type().is_some_and(|t| t.is_raster()) {
            return Err(ConvertError::UnsupportedConversion {
                from: source_label(&file.name),
                to: "txt".to_string(),
            });
        }
        Ok(self.launch(file, ConversionPlan::Recognize { language }))
    }

    /// Return to Idle. A job still running finishes unobserved.
    pub fn reset(&self) {
        self.shared.job.send_modify(JobSnapshot::reset);
        self.shared.ticker.clear();
        info!("Conversion pipeline reset");
    }

    /// Reset and release the OCR worker.
    pub async fn shutdown(&self) {
        self.reset();
        self.shared.ocr.terminate().await;
    }

    fn launch(&self, file: SourceFile, plan: ConversionPlan) -> JobTicket {
        let mut generation = 0;
        self.shared.job.send_modify(|snapshot| generation = snapshot.begin());
        info!(generation, file = %file.name, ?plan, "Conversion job started");

        let ticker_config = self.shared.config.conversion_ticker;
        let ticker = {
            let live = Arc::clone(&self.shared.live_tickers);
            let shared = Arc::clone(&self.shared);
            ProgressTicker::spawn(ticker_config, live, move || {
                shared
                    .job
                    .send_if_modified(|snapshot| snapshot.tick(generation, ticker_config.step, ticker_config.ceiling));
            })
        };
        self.shared.ticker.install(generation, ticker);

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(run_job(shared, generation, file, plan));
        JobTicket::new(generation, handle)
    }
}

async fn run_job(shared: Arc<Shared>, generation: u64, file: SourceFile, plan: ConversionPlan) -> JobOutcome {
    let result = execute(&shared, &file, &plan).await;
    shared.ticker.release(generation);

    match result {
        Ok(artifact) => {
            let artifact = Arc::new(artifact);
            let published = shared
                .job
                .send_if_modified(|snapshot| snapshot.succeed(generation, Some(Arc::clone(&artifact))));
            if published {
                info!(
                    generation,
                    name = %artifact.suggested_file_name,
                    bytes = artifact.bytes.len(),
                    "Conversion job succeeded"
                );
                JobOutcome::Completed(artifact)
            } else {
                info!(generation, "Conversion job finished after being superseded");
                JobOutcome::Superseded
            }
        }
        Err(err) => {
            let published = shared
                .job
                .send_if_modified(|snapshot| snapshot.fail(generation, err.clone()));
            if published {
                warn!(generation, %err, "Conversion job failed");
                JobOutcome::Failed(err)
            } else {
                JobOutcome::Superseded
            }
        }
    }
}

async fn execute(shared: &Arc<Shared>, file: &SourceFile, plan: &ConversionPlan) -> Result<ConvertedArtifact> {
    let name = plan.artifact_name(file);
    let bytes = Arc::clone(&file.bytes);
    match plan {
        ConversionPlan::Reencode { format, target } => {
            let (codec, format) = (shared.codec, *format);
            let encoded = blocking(move || codec.reencode(&bytes, format)).await?;
            Ok(ConvertedArtifact::new(encoded, name, target.mime_type()))
        }
        ConversionPlan::ImageToPdf { mime } => {
            let (compositor, mime) = (shared.compositor, *mime);
            let pdf = blocking(move || compositor.image_to_single_page_pdf(&bytes, mime)).await?;
            Ok(ConvertedArtifact::new(pdf, name, FileType::Pdf.mime_type()))
        }
        ConversionPlan::Recognize { language } => {
            let text = shared.ocr.recognize(bytes, language.as_deref()).await?;
            Ok(ConvertedArtifact::new(text.into_bytes(), name, TEXT_MIME))
        }
    }
}

async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ConvertError::Internal(format!("conversion task failed: {err}")))?
}

/// Lower-case extension for error messages, or `unknown` when there is none.
fn source_label(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => "unknown".to_string(),
    }
}
