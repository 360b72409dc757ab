// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `ocrs` recognition backend, a pure-Rust OCR engine whose neural network
// models run on `rten`.
//
// Only available with the `ocr` feature. The engine needs two model files:
//
// - `text-detection.rten` locates text regions in the image.
// - `text-recognition.rten` decodes characters from those regions.
//
// Running `ocrs-cli` once downloads both into `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is where `OcrConfig::default` looks.
//
// The recognition model covers Latin-script text, so one loaded model
// serves every Latin-script language and switching language does not
// reload anything.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use localconvert_core::error::{ConvertError, Result};
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use super::{OcrBackend, OcrWorker};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Tesseract-style language codes the Latin recognition model can serve.
const LATIN_SCRIPT_LANGUAGES: &[&str] = &[
    "eng", "ron", "deu", "fra", "spa", "ita", "por", "nld", "pol", "ces", "hun", "swe", "fin",
    "dan", "nor",
];

fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Where the two model files live.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Expect `text-detection.rten` and `text-recognition.rten` in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Check both model files exist before trying to load them.
    pub fn validate(&self) -> Result<()> {
        for (role, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(ConvertError::OcrInitFailed(format!(
                    "{role} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Creates `ocrs` workers from on-disk models.
#[derive(Debug, Clone, Default)]
pub struct OcrsBackend {
    config: OcrConfig,
}

impl OcrsBackend {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }
}

impl OcrBackend for OcrsBackend {
    #[instrument(skip_all, fields(
        detection = %self.config.detection_model_path.display(),
        recognition = %self.config.recognition_model_path.display(),
    ))]
    fn create_worker(&self, languages: &[String]) -> Result<Box<dyn OcrWorker>> {
        if let Some(unsupported) = languages
            .iter()
            .find(|l| !LATIN_SCRIPT_LANGUAGES.contains(&l.as_str()))
        {
            return Err(ConvertError::OcrInitFailed(format!(
                "language '{unsupported}' needs a non-Latin recognition model"
            )));
        }
        let initial = languages
            .first()
            .cloned()
            .ok_or_else(|| ConvertError::OcrInitFailed("no recognition language configured".into()))?;

        self.config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&self.config.detection_model_path).map_err(|err| {
            ConvertError::OcrInitFailed(format!(
                "failed to load detection model from {}: {err}",
                self.config.detection_model_path.display()
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model = Model::load_file(&self.config.recognition_model_path).map_err(|err| {
            ConvertError::OcrInitFailed(format!(
                "failed to load recognition model from {}: {err}",
                self.config.recognition_model_path.display()
            ))
        })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| ConvertError::OcrInitFailed(format!("failed to initialise OCR engine: {err}")))?;

        info!(language = %initial, "OCR worker ready");
        Ok(Box::new(OcrsWorker {
            engine: Some(engine),
            language: initial,
        }))
    }
}

struct OcrsWorker {
    /// `None` once terminated.
    engine: Option<OcrsEngine>,
    language: String,
}

impl OcrWorker for OcrsWorker {
    fn set_language(&mut self, language: &str) -> Result<()> {
        if !LATIN_SCRIPT_LANGUAGES.contains(&language) {
            return Err(ConvertError::OcrRecognitionFailed(format!(
                "language '{language}' is not covered by the loaded model"
            )));
        }
        self.language = language.to_string();
        Ok(())
    }

    fn recognize(&mut self, image: &DynamicImage) -> Result<String> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| ConvertError::OcrRecognitionFailed("worker has been terminated".into()))?;

        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            ConvertError::OcrRecognitionFailed(format!(
                "failed to create image source ({width}x{height}): {err}"
            ))
        })?;

        let input = engine
            .prepare_input(source)
            .map_err(|err| ConvertError::OcrRecognitionFailed(format!("OCR preprocessing failed: {err}")))?;
        let text = engine
            .get_text(&input)
            .map_err(|err| ConvertError::OcrRecognitionFailed(format!("OCR text recognition failed: {err}")))?;

        debug!(
            language = %self.language,
            line_count = text.lines().count(),
            char_count = text.len(),
            "OCR recognition complete"
        );
        Ok(text)
    }

    fn terminate(&mut self) -> Result<()> {
        self.engine = None;
        Ok(())
    }
}
