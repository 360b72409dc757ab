// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives UI presentation (icon and colour of the failure notice).

use crate::error::ConvertError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something went wrong inside the engine; trying again may work.
    Transient,
    /// User must do something (pick another file, select pages).
    ActionRequired,
    /// The input cannot be processed as it is.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether re-running the same request may succeed.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `ConvertError` into a `HumanError`.
pub fn humanize_error(err: &ConvertError) -> HumanError {
    match err {
        ConvertError::DecodeFailed { .. } => HumanError {
            message: "We couldn't read this image.".into(),
            suggestion: "The file may be damaged or only partly downloaded. Try opening it in an image viewer, or pick a different file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ConvertError::EncodeFailed(_) => HumanError {
            message: "We couldn't save the converted image.".into(),
            suggestion: "Try again. If it keeps happening, try converting to a different format.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ConvertError::UnsupportedImageFormat(detail) => HumanError {
            message: "This type of image isn't supported.".into(),
            suggestion: format!("Only JPG and PNG images can be placed in a PDF. (File type: {detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        ConvertError::EmbedFailed(_) => HumanError {
            message: "This image couldn't be placed in a PDF.".into(),
            suggestion: "The image data looks damaged. Try re-saving it as a JPG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ConvertError::MalformedDocument { name, .. } => HumanError {
            message: format!("\"{name}\" isn't a readable PDF."),
            suggestion: "The file may be damaged or password-protected. The other files were still loaded.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ConvertError::PageIndexOutOfRange { page_count, .. } => HumanError {
            message: "That page doesn't exist.".into(),
            suggestion: format!("This document has {page_count} pages."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ConvertError::MergeFailed(_) => HumanError {
            message: "The PDFs couldn't be merged.".into(),
            suggestion: "One of the selected pages couldn't be copied. Remove the file it came from and try again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ConvertError::NothingToMerge => HumanError {
            message: "There are no pages to merge.".into(),
            suggestion: "Add at least one PDF and keep at least one page in the list.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ConvertError::OcrInitFailed(_) => HumanError {
            message: "Text recognition couldn't start.".into(),
            suggestion: "Try again in a moment. If it keeps failing, the recognition models may be missing.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ConvertError::OcrRecognitionFailed(_) => HumanError {
            message: "We couldn't extract text from this image.".into(),
            suggestion: "Try a sharper, well-lit image where the text is clearly visible.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ConvertError::UnsupportedConversion { from, to } => HumanError {
            message: "That conversion isn't available.".into(),
            suggestion: format!("A {from} file can't be converted to {to}. Pick one of the offered formats."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ConvertError::Internal(_) => HumanError {
            message: "Something went wrong.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}
