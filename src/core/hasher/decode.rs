//! Image decoding with a fast path for JPEG.
//!
//! Uses zune-jpeg for JPEG files (1.5-2x faster than image crate),
//! falls back to image crate for everything else.

use crate::error::HashError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decoder path chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePath {
    Jpeg,
    Generic,
}

impl DecodePath {
    /// Pick a decoder from the file extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("jpg" | "jpeg") => Self::Jpeg,
            _ => Self::Generic,
        }
    }
}

/// Decodes image files into pixels for hashing
pub struct ImageDecoder;

impl ImageDecoder {
    /// Read and decode an image file.
    ///
    /// An unreadable file is an `IoError`; anything the decoders reject, and
    /// images with a zero dimension, are a `DecodeError`.
    pub fn decode(path: &Path) -> Result<DynamicImage, HashError> {
        let bytes = fs::read(path).map_err(|e| HashError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let image = match DecodePath::from_path(path) {
            DecodePath::Jpeg => {
                Self::decode_jpeg(path, &bytes).or_else(|_| Self::decode_generic(path, &bytes))?
            }
            DecodePath::Generic => Self::decode_generic(path, &bytes)?,
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(HashError::DecodeError {
                path: path.to_path_buf(),
                reason: "image has no pixels".to_string(),
            });
        }

        Ok(image)
    }

    fn decode_jpeg(path: &Path, bytes: &[u8]) -> Result<DynamicImage, HashError> {
        let decode_error = |reason: String| HashError::DecodeError {
            path: path.to_path_buf(),
            reason,
        };

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(bytes, options);

        let pixels = decoder
            .decode()
            .map_err(|e| decode_error(format!("zune-jpeg decode failed: {:?}", e)))?;

        let info = decoder
            .info()
            .ok_or_else(|| decode_error("missing JPEG header info".to_string()))?;

        let width = info.width as u32;
        let height = info.height as u32;

        let image = match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8),
            ColorSpace::RGBA => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgba8),
            ColorSpace::Luma => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageLuma8),
            other => {
                return Err(decode_error(format!("unsupported colorspace {:?}", other)));
            }
        };

        image.ok_or_else(|| decode_error("pixel buffer size mismatch".to_string()))
    }

    fn decode_generic(path: &Path, bytes: &[u8]) -> Result<DynamicImage, HashError> {
        image::load_from_memory(bytes).map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn decode_path_detects_jpeg() {
        assert_eq!(DecodePath::from_path(Path::new("photo.jpg")), DecodePath::Jpeg);
        assert_eq!(DecodePath::from_path(Path::new("photo.JPEG")), DecodePath::Jpeg);
        assert_eq!(DecodePath::from_path(Path::new("photo.png")), DecodePath::Generic);
        assert_eq!(DecodePath::from_path(Path::new("photo")), DecodePath::Generic);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = ImageDecoder::decode(Path::new("/nonexistent/photo.png"));
        assert!(matches!(result, Err(HashError::IoError { .. })));
    }

    #[test]
    fn garbage_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.jpg");
        fs::write(&path, b"this is not a valid image file").unwrap();

        let result = ImageDecoder::decode(&path);
        assert!(matches!(result, Err(HashError::DecodeError { .. })));
    }

    #[test]
    fn decodes_png_written_by_image_crate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("red.png");
        image::RgbImage::from_pixel(10, 6, Rgb([255, 0, 0])).save(&path).unwrap();

        let decoded = ImageDecoder::decode(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 6));
    }
}
