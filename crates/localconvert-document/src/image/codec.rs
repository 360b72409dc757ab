// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image codec — decode JPEG/PNG bytes into a pixel surface and re-encode to a
// target raster format using the `image` crate. Dimensions are never changed.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use localconvert_core::RasterFormat;
use localconvert_core::config::DEFAULT_JPEG_QUALITY;
use localconvert_core::error::{ConvertError, Result};
use tracing::{debug, instrument};

/// Raster re-encoder.
///
/// PNG output is lossless. JPEG output uses a fixed quality (92 unless
/// configured otherwise) and drops any alpha channel.
#[derive(Debug, Clone, Copy)]
pub struct ImageCodec {
    jpeg_quality: u8,
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl ImageCodec {
    /// Create a codec with the given JPEG quality (clamped to 1-100).
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Decode raw encoded bytes (JPEG or PNG) into a pixel surface.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn decode(&self, data: &[u8]) -> Result<DynamicImage> {
        let format = image::guess_format(data).map_err(|err| ConvertError::DecodeFailed {
            byte_len: data.len(),
            reason: err.to_string(),
        })?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return Err(ConvertError::DecodeFailed {
                byte_len: data.len(),
                reason: format!("{format:?} is not a JPEG or PNG image"),
            });
        }
        let img = image::load_from_memory_with_format(data, format).map_err(|err| {
            ConvertError::DecodeFailed {
                byte_len: data.len(),
                reason: err.to_string(),
            }
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            ?format,
            "Image decoded from bytes"
        );
        Ok(img)
    }

    /// Encode a pixel surface into the given raster format.
    pub fn encode(&self, image: &DynamicImage, format: RasterFormat) -> Result<Vec<u8>> {
        match format {
            RasterFormat::Png => encode_png(image),
            RasterFormat::Jpeg => self.encode_jpeg(image),
        }
    }

    /// Decode `data` and re-encode it as `target`.
    #[instrument(skip(self, data), fields(data_len = data.len(), ?target))]
    pub fn reencode(&self, data: &[u8], target: RasterFormat) -> Result<Vec<u8>> {
        let image = self.decode(data)?;
        let output = self.encode(&image, target)?;
        debug!(
            input_bytes = data.len(),
            output_bytes = output.len(),
            "Image re-encoded"
        );
        Ok(output)
    }

    fn encode_jpeg(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = image.to_rgb8();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| ConvertError::EncodeFailed(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }
}

/// Encode a `DynamicImage` as PNG, returning the raw bytes.
pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| ConvertError::EncodeFailed(format!("PNG encoding failed: {err}")))?;
    Ok(buffer)
}
