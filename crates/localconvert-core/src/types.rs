// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the LocalConvert engine.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Logical file types the engine understands.
///
/// `Jpg` and `Jpeg` are kept distinct because they are distinct extensions in
/// the capability table; both decode through the same JPEG codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Jpg,
    Jpeg,
    Png,
    Pdf,
}

impl FileType {
    /// Every tag, in declaration order.
    pub const ALL: [FileType; 4] = [Self::Jpg, Self::Jpeg, Self::Png, Self::Pdf];

    /// Derive the file type from a file name.
    ///
    /// Splits on the last `.` and lower-cases the extension. Returns `None`
    /// when there is no extension or it is not one of the known tags.
    pub fn classify(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// Whether `file_name` carries a supported extension.
    pub fn is_supported(file_name: &str) -> bool {
        Self::classify(file_name).is_some()
    }

    /// Infer the file type from a bare extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" => Some(Self::Jpg),
            "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Canonical lower-case extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }

    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpg | Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    /// Raster images (JPEG or PNG) as opposed to documents.
    pub fn is_raster(&self) -> bool {
        self.raster_format().is_some()
    }

    /// The raster codec for this file type, if it is a raster type.
    pub fn raster_format(&self) -> Option<RasterFormat> {
        match self {
            Self::Jpg | Self::Jpeg => Some(RasterFormat::Jpeg),
            Self::Png => Some(RasterFormat::Png),
            Self::Pdf => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Raster encodings the image codec can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RasterFormat {
    Jpeg,
    Png,
}

impl RasterFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Map a MIME type onto a raster format. `image/jpg` is accepted because
    /// some platforms report it for `.jpg` files.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    Letter,
    Legal,
    A4,
    A5,
    Custom { width_pt: f32, height_pt: f32 },
}

impl PaperSize {
    /// Page geometry in PDF points (1/72 inch).
    pub fn geometry(&self) -> PageGeometry {
        let (width, height) = match self {
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
            Self::A4 => (595.28, 841.89),
            Self::A5 => (419.53, 595.28),
            Self::Custom {
                width_pt,
                height_pt,
            } => (*width_pt, *height_pt),
        };
        PageGeometry { width, height }
    }
}

/// Page width and height in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
}

/// Identifier assigned to each successfully loaded PDF.
///
/// Allocated from a monotonically increasing counter, so loading the same
/// bytes twice yields two different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src-{}", self.0)
    }
}

/// One page slot in the merge order: a page of a loaded source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageReference {
    pub source: SourceId,
    /// 0-based page index within the source.
    pub page_index: usize,
}

impl PageReference {
    pub fn new(source: SourceId, page_index: usize) -> Self {
        Self { source, page_index }
    }
}

/// A file handed to the engine by the caller.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// File type derived from the name.
    pub fn file_type(&self) -> Option<FileType> {
        FileType::classify(&self.name)
    }

    /// The name with its last extension stripped (`scan.final.png` → `scan.final`).
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}

/// Output of any conversion: a byte payload plus download metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedArtifact {
    pub bytes: Vec<u8>,
    pub suggested_file_name: String,
    pub mime_type: &'static str,
}

impl ConvertedArtifact {
    pub fn new(bytes: Vec<u8>, suggested_file_name: impl Into<String>, mime_type: &'static str) -> Self {
        Self {
            bytes,
            suggested_file_name: suggested_file_name.into(),
            mime_type,
        }
    }

    /// Whether the artifact is extracted text (for copy-to-clipboard style UIs).
    pub fn is_text(&self) -> bool {
        self.mime_type.starts_with("text/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_uses_last_extension_case_insensitively() {
        assert_eq!(FileType::classify("holiday.photo.JPG"), Some(FileType::Jpg));
        assert_eq!(FileType::classify("scan.Jpeg"), Some(FileType::Jpeg));
        assert_eq!(FileType::classify("report.pdf"), Some(FileType::Pdf));
    }

    #[test]
    fn classify_rejects_missing_or_unknown_extension() {
        assert_eq!(FileType::classify("README"), None);
        assert_eq!(FileType::classify("archive.tar.gz"), None);
        assert_eq!(FileType::classify("trailing."), None);
        assert!(!FileType::is_supported("notes.docx"));
        assert!(FileType::is_supported("logo.png"));
    }

    #[test]
    fn stem_strips_only_the_last_extension() {
        let file = SourceFile::new("scan.final.png", vec![0u8]);
        assert_eq!(file.stem(), "scan.final");
        let bare = SourceFile::new(".png", vec![0u8]);
        assert_eq!(bare.stem(), ".png");
    }

    #[test]
    fn letter_is_the_us_point_size() {
        let g = PaperSize::Letter.geometry();
        assert_eq!((g.width, g.height), (612.0, 792.0));
    }

    #[test]
    fn mime_lookup_accepts_jpg_alias() {
        assert_eq!(RasterFormat::from_mime("image/jpg"), Some(RasterFormat::Jpeg));
        assert_eq!(RasterFormat::from_mime("IMAGE/PNG"), Some(RasterFormat::Png));
        assert_eq!(RasterFormat::from_mime("image/gif"), None);
    }
}
