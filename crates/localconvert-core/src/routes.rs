// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Named conversion routes (`jpg-to-pdf`, `png-to-txt`, ...).
//
// A route pins both ends of a conversion so a dedicated entry point only
// accepts files of its source type. File-producing routes are a subset of the
// capability table; `txt` routes run text recognition.

use crate::capability::ConversionCapabilityTable;
use crate::types::FileType;

/// What a route produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// A file of the given type, produced by a capability-table conversion.
    File(FileType),
    /// Plain text extracted by OCR.
    Text,
}

impl RouteTarget {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::File(file_type) => file_type.extension(),
            Self::Text => "txt",
        }
    }
}

/// A named, user-facing conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionRoute {
    pub id: &'static str,
    pub source: FileType,
    pub target: RouteTarget,
    pub source_name: &'static str,
    pub target_name: &'static str,
}

const ROUTES: [ConversionRoute; 6] = [
    ConversionRoute {
        id: "jpg-to-pdf",
        source: FileType::Jpg,
        target: RouteTarget::File(FileType::Pdf),
        source_name: "JPG",
        target_name: "PDF",
    },
    ConversionRoute {
        id: "png-to-pdf",
        source: FileType::Png,
        target: RouteTarget::File(FileType::Pdf),
        source_name: "PNG",
        target_name: "PDF",
    },
    ConversionRoute {
        id: "jpg-to-png",
        source: FileType::Jpg,
        target: RouteTarget::File(FileType::Png),
        source_name: "JPG",
        target_name: "PNG",
    },
    ConversionRoute {
        id: "png-to-jpg",
        source: FileType::Png,
        target: RouteTarget::File(FileType::Jpg),
        source_name: "PNG",
        target_name: "JPG",
    },
    ConversionRoute {
        id: "jpg-to-txt",
        source: FileType::Jpg,
        target: RouteTarget::Text,
        source_name: "JPG",
        target_name: "Text",
    },
    ConversionRoute {
        id: "png-to-txt",
        source: FileType::Png,
        target: RouteTarget::Text,
        source_name: "PNG",
        target_name: "Text",
    },
];

impl ConversionRoute {
    /// All published routes.
    pub fn all() -> &'static [ConversionRoute] {
        &ROUTES
    }

    /// Look a route up by its id.
    pub fn by_id(id: &str) -> Option<&'static ConversionRoute> {
        ROUTES.iter().find(|route| route.id == id)
    }

    /// Resolve a route from a URL-like path; the last segment is the id.
    pub fn from_path(path: &str) -> Option<&'static ConversionRoute> {
        let id = path.trim_end_matches('/').rsplit('/').next()?;
        Self::by_id(id)
    }

    /// Path under which the route is published.
    pub fn path(&self) -> String {
        format!("/convert/{}", self.id)
    }

    /// Whether a file with this name may be fed to the route. The extension
    /// must equal the route's source extension exactly (`.jpeg` is not a `jpg`).
    pub fn accepts(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(self.source.extension()))
    }

    /// Whether the route is backed by a legal conversion.
    pub fn is_available(&self) -> bool {
        match self.target {
            RouteTarget::File(target) => ConversionCapabilityTable::is_supported(self.source, target),
            RouteTarget::Text => self.source.is_raster(),
        }
    }
}
