//! SIMD-accelerated grayscale downsampling.
//!
//! Uses fast_image_resize, which picks AVX2/NEON at runtime when available.

use crate::error::HashError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage};
use std::path::PathBuf;

fn resize_error(reason: String) -> HashError {
    // The caller fills in the path, see HashAlgorithm::hash_file
    HashError::DecodeError {
        path: PathBuf::new(),
        reason,
    }
}

/// Convert to grayscale, then resize to `width` x `height`.
///
/// Converting first keeps the resize to a single channel.
pub fn resize_to_grayscale(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<GrayImage, HashError> {
    let gray = image.to_luma8();
    let (src_width, src_height) = gray.dimensions();

    if src_width == 0 || src_height == 0 {
        return Err(resize_error("invalid source dimensions".to_string()));
    }
    if width == 0 || height == 0 {
        return Err(resize_error("invalid destination dimensions".to_string()));
    }

    let src_image = Image::from_vec_u8(src_width, src_height, gray.into_raw(), PixelType::U8)
        .map_err(|e| resize_error(format!("failed to wrap source image: {}", e)))?;
    let mut dst_image = Image::new(width, height, PixelType::U8);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    Resizer::new()
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| resize_error(format!("resize failed: {}", e)))?;

    GrayImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| resize_error("failed to create result buffer".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            Rgb([r, g, 64])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn resize_produces_requested_dimensions() {
        let resized = resize_to_grayscale(&create_test_image(100, 100), 9, 8).unwrap();
        assert_eq!(resized.dimensions(), (9, 8));
    }

    #[test]
    fn upscaling_tiny_image_works() {
        let resized = resize_to_grayscale(&create_test_image(4, 4), 9, 8).unwrap();
        assert_eq!(resized.dimensions(), (9, 8));
    }

    #[test]
    fn zero_destination_is_rejected() {
        assert!(resize_to_grayscale(&create_test_image(10, 10), 0, 8).is_err());
    }
}
