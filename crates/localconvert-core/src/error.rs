// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for LocalConvert.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all LocalConvert operations.
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    // -- Raster errors --
    #[error("could not decode {byte_len} bytes as a raster image: {reason}")]
    DecodeFailed { byte_len: usize, reason: String },

    #[error("image encoding failed: {0}")]
    EncodeFailed(String),

    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("image could not be embedded in a PDF page: {0}")]
    EmbedFailed(String),

    // -- Document errors --
    #[error("malformed PDF document {name}: {reason}")]
    MalformedDocument { name: String, reason: String },

    #[error("page index {index} out of range (document has {page_count} pages)")]
    PageIndexOutOfRange { index: usize, page_count: usize },

    #[error("merge failed: {0}")]
    MergeFailed(String),

    #[error("no pages selected to merge")]
    NothingToMerge,

    // -- OCR errors --
    #[error("OCR worker initialisation failed: {0}")]
    OcrInitFailed(String),

    #[error("OCR recognition failed: {0}")]
    OcrRecognitionFailed(String),

    // -- Capability gate --
    #[error("conversion from {from} to {to} is not supported")]
    UnsupportedConversion { from: String, to: String },

    // -- Runtime --
    #[error("internal error: {0}")]
    Internal(String),
}

/// Flat classification of [`ConvertError`] for callers that only need to
/// branch on the failure category (UI badges, metrics, tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    DecodeFailed,
    EncodeFailed,
    UnsupportedImageFormat,
    EmbedFailed,
    MalformedDocument,
    PageIndexOutOfRange,
    MergeFailed,
    NothingToMerge,
    OcrInitFailed,
    OcrRecognitionFailed,
    UnsupportedConversion,
    Internal,
}

impl ConvertError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DecodeFailed { .. } => ErrorKind::DecodeFailed,
            Self::EncodeFailed(_) => ErrorKind::EncodeFailed,
            Self::UnsupportedImageFormat(_) => ErrorKind::UnsupportedImageFormat,
            Self::EmbedFailed(_) => ErrorKind::EmbedFailed,
            Self::MalformedDocument { .. } => ErrorKind::MalformedDocument,
            Self::PageIndexOutOfRange { .. } => ErrorKind::PageIndexOutOfRange,
            Self::MergeFailed(_) => ErrorKind::MergeFailed,
            Self::NothingToMerge => ErrorKind::NothingToMerge,
            Self::OcrInitFailed(_) => ErrorKind::OcrInitFailed,
            Self::OcrRecognitionFailed(_) => ErrorKind::OcrRecognitionFailed,
            Self::UnsupportedConversion { .. } => ErrorKind::UnsupportedConversion,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ConvertError>;
