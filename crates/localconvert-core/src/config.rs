// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.
//
// All values have compile-time defaults; an embedding host may overlay them
// from JSON. Nothing is read from the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::PaperSize;

/// Default JPEG quality. Matches the quality browsers apply to canvas JPEG
/// exports, so re-encoded files look the same as before.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Scale factor applied to page previews (thumbnail size).
pub const DEFAULT_PREVIEW_SCALE: f32 = 0.5;

/// OCR languages loaded into the worker. The first entry is the default.
pub const DEFAULT_OCR_LANGUAGES: [&str; 2] = ["eng", "ron"];

/// Heuristic progress ticker settings.
///
/// Progress is not tied to bytes processed: it climbs by `step` every
/// `interval_ms` until `ceiling`, and only real completion reports 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerConfig {
    pub interval_ms: u64,
    pub step: u8,
    pub ceiling: u8,
}

impl TickerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

/// Engine settings shared by the pipeline, the merge session and the OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size used when wrapping an image in a PDF.
    pub paper_size: PaperSize,
    /// JPEG quality (1-100) for raster re-encoding.
    pub jpeg_quality: u8,
    /// Scale factor for merge-flow page previews.
    pub preview_scale: f32,
    /// OCR languages; the first one is the default recognition language.
    pub ocr_languages: Vec<String>,
    /// Ticker for single-file conversions.
    pub conversion_ticker: TickerConfig,
    /// Ticker for merge assembly.
    pub merge_ticker: TickerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::Letter,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            preview_scale: DEFAULT_PREVIEW_SCALE,
            ocr_languages: DEFAULT_OCR_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            conversion_ticker: TickerConfig {
                interval_ms: 200,
                step: 10,
                ceiling: 90,
            },
            merge_ticker: TickerConfig {
                interval_ms: 300,
                step: 10,
                ceiling: 90,
            },
        }
    }
}

impl EngineConfig {
    /// Overlay settings from a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The default OCR language (first configured entry, `eng` if none).
    pub fn default_ocr_language(&self) -> &str {
        self.ocr_languages
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_OCR_LANGUAGES[0])
    }
}
