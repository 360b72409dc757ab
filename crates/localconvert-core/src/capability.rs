// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion capability table — the fixed set of legal (source, target) pairs.
//
// PDF has no outgoing edges. Pages of a PDF can be rasterised for previews in
// the merge flow, but that is not exposed as a conversion target.

use crate::types::FileType;

/// Static directed graph of permitted conversions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversionCapabilityTable;

impl ConversionCapabilityTable {
    /// Permitted targets for `source`, in display order.
    pub const fn targets_for(source: FileType) -> &'static [FileType] {
        match source {
            FileType::Jpg | FileType::Jpeg => &[FileType::Pdf, FileType::Png],
            FileType::Png => &[FileType::Pdf, FileType::Jpg],
            FileType::Pdf => &[],
        }
    }

    /// Targets available for a file name; empty when the name is unclassifiable.
    pub fn available_targets(source_name: &str) -> &'static [FileType] {
        match FileType::classify(source_name) {
            Some(source) => Self::targets_for(source),
            None => &[],
        }
    }

    /// Pure membership check. The only gate a conversion passes before it runs.
    pub fn is_supported(source: FileType, target: FileType) -> bool {
        Self::targets_for(source).contains(&target)
    }
}
