// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR engine — text recognition through a lazily created, long-lived worker.
//
// The recognition backend is pluggable (`OcrBackend` creates `OcrWorker`s).
// The engine owns at most one worker and serialises all access to it: an
// async mutex is held across bring-up, language reconfiguration, and
// recognition, while the blocking work itself runs on tokio's blocking pool.
//
// Lifecycle: Uninitialized -> Ready -> Terminated. Termination is not final;
// the next recognition brings a fresh worker up from scratch.

#[cfg(feature = "ocr")]
pub mod ocrs_backend;

use std::sync::Arc;

use image::DynamicImage;
use localconvert_core::config::DEFAULT_OCR_LANGUAGES;
use localconvert_core::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::image::codec::ImageCodec;

#[cfg(feature = "ocr")]
pub use ocrs_backend::{OcrConfig, OcrsBackend};

/// Creates recognition workers.
pub trait OcrBackend: Send + Sync + 'static {
    /// Bring up a worker able to recognise every language in `languages`,
    /// initially configured for `languages[0]`.
    fn create_worker(&self, languages: &[String]) -> Result<Box<dyn OcrWorker>>;
}

/// A live recognition worker. Methods block; the engine calls them from the
/// blocking pool, one at a time.
pub trait OcrWorker: Send {
    /// Switch the active recognition language.
    fn set_language(&mut self, language: &str) -> Result<()>;

    /// Recognise the text in `image`.
    fn recognize(&mut self, image: &DynamicImage) -> Result<String>;

    /// Release the worker's resources.
    fn terminate(&mut self) -> Result<()>;
}

/// Observable worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerStatus {
    Uninitialized,
    Ready,
    Terminated,
}

enum WorkerState {
    Uninitialized,
    Ready {
        worker: Box<dyn OcrWorker>,
        language: String,
    },
    Terminated,
}

impl WorkerState {
    fn status(&self) -> WorkerStatus {
        match self {
            Self::Uninitialized => WorkerStatus::Uninitialized,
            Self::Ready { .. } => WorkerStatus::Ready,
            Self::Terminated => WorkerStatus::Terminated,
        }
    }
}

/// Serialised access to a single OCR worker.
pub struct OcrEngine {
    backend: Arc<dyn OcrBackend>,
    languages: Vec<String>,
    codec: ImageCodec,
    state: Mutex<WorkerState>,
}

impl std::fmt::Debug for OcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrEngine")
            .field("languages", &self.languages)
            .finish_non_exhaustive()
    }
}

impl OcrEngine {
    /// Create an engine over `backend` supporting `languages`; the first
    /// entry is the default. An empty list falls back to the built-in one.
    pub fn new(backend: Arc<dyn OcrBackend>, languages: Vec<String>) -> Self {
        let languages = if languages.is_empty() {
            DEFAULT_OCR_LANGUAGES.iter().map(|l| l.to_string()).collect()
        } else {
            languages
        };
        Self {
            backend,
            languages,
            codec: ImageCodec::default(),
            state: Mutex::new(WorkerState::Uninitialized),
        }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn default_language(&self) -> &str {
        // `new` guarantees at least one entry.
        self.languages.first().map(String::as_str).unwrap_or("eng")
    }

    pub fn is_supported_language(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l == language)
    }

    /// Current worker lifecycle state.
    pub async fn status(&self) -> WorkerStatus {
        self.state.lock().await.status()
    }

    /// Recognise the text in an encoded JPEG/PNG image.
    ///
    /// `language` defaults to the first supported language. The result is
    /// trimmed of surrounding whitespace.
    #[instrument(skip_all, fields(bytes_len = image_bytes.len(), language = ?language))]
    pub async fn recognize(&self, image_bytes: Arc<[u8]>, language: Option<&str>) -> Result<String> {
        let language = language.unwrap_or(self.default_language()).to_string();
        if !self.is_supported_language(&language) {
            return Err(ConvertError::OcrRecognitionFailed(format!(
                "language '{language}' is not supported (available: {})",
                self.languages.join(", ")
            )));
        }

        let codec = self.codec;
        let image = tokio::task::spawn_blocking(move || codec.decode(&image_bytes))
            .await
            .map_err(|err| ConvertError::Internal(format!("image decode task failed: {err}")))?
            .map_err(|err| ConvertError::OcrRecognitionFailed(format!("image cannot be read: {err}")))?;

        let mut state = self.state.lock().await;
        // The worker is moved out for the duration of the call; if the
        // blocking task dies, the state is left Uninitialized.
        let (worker, active) = match std::mem::replace(&mut *state, WorkerState::Uninitialized) {
            WorkerState::Ready { worker, language } => (worker, language),
            WorkerState::Uninitialized | WorkerState::Terminated => {
                (self.bring_up().await?, self.default_language().to_string())
            }
        };

        let requested = language.clone();
        let (worker, active, result) = tokio::task::spawn_blocking(move || {
            let mut worker = worker;
            let mut active = active;
            if active != requested {
                debug!(from = %active, to = %requested, "Reconfiguring OCR language");
                if let Err(err) = worker.set_language(&requested) {
                    return (worker, active, Err(err));
                }
                active = requested;
            }
            let result = worker.recognize(&image);
            (worker, active, result)
        })
        .await
        .map_err(|err| ConvertError::Internal(format!("OCR task failed: {err}")))?;

        *state = WorkerState::Ready {
            worker,
            language: active,
        };

        let text = result.map_err(|err| match err {
            ConvertError::OcrRecognitionFailed(_) => err,
            other => ConvertError::OcrRecognitionFailed(other.to_string()),
        })?;
        let text = text.trim().to_string();
        info!(chars = text.len(), "OCR recognition complete");
        Ok(text)
    }

    /// Release the worker. A no-op unless a worker is Ready.
    #[instrument(skip(self))]
    pub async fn terminate(&self) {
        let mut state = self.state.lock().await;
        if !matches!(*state, WorkerState::Ready { .. }) {
            return;
        }
        let WorkerState::Ready { worker, .. } = std::mem::replace(&mut *state, WorkerState::Terminated)
        else {
            return;
        };

        let outcome = tokio::task::spawn_blocking(move || {
            let mut worker = worker;
            worker.terminate()
        })
        .await;
        match outcome {
            Ok(Ok(())) => info!("OCR worker terminated"),
            Ok(Err(err)) => warn!(%err, "OCR worker reported an error while terminating"),
            Err(err) => warn!(%err, "OCR termination task failed"),
        }
    }

    /// Create a worker. Must be called with the state lock held.
    async fn bring_up(&self) -> Result<Box<dyn OcrWorker>> {
        info!(languages = ?self.languages, "Bringing up OCR worker");
        let backend = Arc::clone(&self.backend);
        let languages = self.languages.clone();
        let created = tokio::task::spawn_blocking(move || backend.create_worker(&languages))
            .await
            .map_err(|err| ConvertError::OcrInitFailed(format!("worker start-up task failed: {err}")))?;
        created.map_err(|err| {
            warn!(%err, "OCR worker bring-up failed");
            match err {
                ConvertError::OcrInitFailed(_) => err,
                other => ConvertError::OcrInitFailed(other.to_string()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::gradient_png;
    use localconvert_core::ErrorKind;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Counters {
        creations: AtomicUsize,
        reconfigurations: AtomicUsize,
        terminations: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[derive(Default)]
    struct FakeBackend {
        counters: Arc<Counters>,
        fail_next_creation: AtomicBool,
    }

    struct FakeWorker {
        counters: Arc<Counters>,
        language: String,
    }

    impl OcrBackend for FakeBackend {
        fn create_worker(&self, languages: &[String]) -> Result<Box<dyn OcrWorker>> {
            if self.fail_next_creation.swap(false, Ordering::SeqCst) {
                return Err(ConvertError::Internal("model file missing".into()));
            }
            self.counters.creations.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeWorker {
                counters: Arc::clone(&self.counters),
                language: languages[0].clone(),
            }))
        }
    }

    impl OcrWorker for FakeWorker {
        fn set_language(&mut self, language: &str) -> Result<()> {
            self.counters.reconfigurations.fetch_add(1, Ordering::SeqCst);
            self.language = language.to_string();
            Ok(())
        }

        fn recognize(&mut self, image: &DynamicImage) -> Result<String> {
            let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("\n  {} {}x{}  \n", self.language, image.width(), image.height()))
        }

        fn terminate(&mut self) -> Result<()> {
            self.counters.terminations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn engine() -> (OcrEngine, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::default());
        let engine = OcrEngine::new(backend.clone(), vec!["eng".into(), "ron".into()]);
        (engine, backend)
    }

    fn png() -> Arc<[u8]> {
        gradient_png(8, 6).into()
    }

    #[tokio::test]
    async fn worker_is_created_lazily_and_reused() {
        let (engine, backend) = engine();
        assert_eq!(engine.status().await, WorkerStatus::Uninitialized);
        assert_eq!(backend.counters.creations.load(Ordering::SeqCst), 0);

        let text = engine.recognize(png(), None).await.expect("recognize");
        assert_eq!(text, "eng 8x6");
        engine.recognize(png(), Some("eng")).await.expect("recognize");

        assert_eq!(engine.status().await, WorkerStatus::Ready);
        assert_eq!(backend.counters.creations.load(Ordering::SeqCst), 1);
        assert_eq!(backend.counters.reconfigurations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn each_language_change_reconfigures_once() {
        let (engine, backend) = engine();
        assert_eq!(engine.recognize(png(), Some("ron")).await.expect("ron"), "ron 8x6");
        engine.recognize(png(), Some("ron")).await.expect("ron again");
        assert_eq!(backend.counters.reconfigurations.load(Ordering::SeqCst), 1);

        assert_eq!(engine.recognize(png(), None).await.expect("eng"), "eng 8x6");
        assert_eq!(backend.counters.reconfigurations.load(Ordering::SeqCst), 2);
        assert_eq!(backend.counters.creations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsupported_language_fails_without_starting_a_worker() {
        let (engine, backend) = engine();
        let err = engine.recognize(png(), Some("deu")).await.expect_err("deu");
        assert_eq!(err.kind(), ErrorKind::OcrRecognitionFailed);
        assert_eq!(backend.counters.creations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreadable_image_is_a_recognition_failure() {
        let (engine, _) = engine();
        let err = engine
            .recognize(Arc::from(&b"not an image"[..]), None)
            .await
            .expect_err("garbage");
        assert_eq!(err.kind(), ErrorKind::OcrRecognitionFailed);
    }

    #[tokio::test]
    async fn failed_bring_up_leaves_a_clean_slate_for_retry() {
        let (engine, backend) = engine();
        backend.fail_next_creation.store(true, Ordering::SeqCst);

        let err = engine.recognize(png(), None).await.expect_err("init fails");
        assert_eq!(err.kind(), ErrorKind::OcrInitFailed);
        assert_eq!(engine.status().await, WorkerStatus::Uninitialized);

        assert_eq!(engine.recognize(png(), None).await.expect("retry"), "eng 8x6");
        assert_eq!(backend.counters.creations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn terminate_is_idempotent_and_reinit_starts_fresh() {
        let (engine, backend) = engine();
        engine.terminate().await;
        assert_eq!(engine.status().await, WorkerStatus::Uninitialized);
        assert_eq!(backend.counters.terminations.load(Ordering::SeqCst), 0);

        engine.recognize(png(), Some("ron")).await.expect("recognize");
        engine.terminate().await;
        engine.terminate().await;
        assert_eq!(engine.status().await, WorkerStatus::Terminated);
        assert_eq!(backend.counters.terminations.load(Ordering::SeqCst), 1);

        // A fresh worker starts at the default language again.
        assert_eq!(engine.recognize(png(), None).await.expect("again"), "eng 8x6");
        assert_eq!(backend.counters.creations.load(Ordering::SeqCst), 2);
        assert_eq!(engine.status().await, WorkerStatus::Ready);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_never_overlap_on_the_worker() {
        let (engine, backend) = engine();
        let engine = Arc::new(engine);
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..8 {
            let engine = Arc::clone(&engine);
            let language = if i % 2 == 0 { "eng" } else { "ron" };
            tasks.spawn(async move { engine.recognize(png(), Some(language)).await });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.expect("task").expect("recognize");
        }
        assert_eq!(backend.counters.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(backend.counters.creations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_language_list_falls_back_to_defaults() {
        let engine = OcrEngine::new(Arc::new(FakeBackend::default()), Vec::new());
        assert_eq!(engine.default_language(), "eng");
        assert!(engine.is_supported_language("ron"));
    }
}
