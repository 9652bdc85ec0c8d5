//! Resampling to exact output dimensions.

use super::{DecodeError, DecodedImage, FilterType};

/// Resample `image` to `width` x `height`, leaving the input untouched.
///
/// Asking for the current size returns a copy without running the kernel.
///
/// # Errors
///
/// [`DecodeError::EmptyImage`] for a zero target dimension and
/// [`DecodeError::CorruptedFile`] when the source buffer is the wrong length.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage { width, height });
    }
    if (image.width, image.height) == (width, height) {
        return Ok(image.clone());
    }

    let view = image
        .as_rgba_image()
        .ok_or_else(|| DecodeError::CorruptedFile("Pixel buffer does not match dimensions".to_string()))?;
    let out = image::imageops::resize(&view, width, height, filter.to_image_filter());
    Ok(DecodedImage::from_rgba_image(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::gradient;

    #[test]
    fn test_halving_a_gradient() {
        let out = resize(&gradient(64, 48), 32, 24, FilterType::Bilinear).unwrap();
        assert_eq!((out.width, out.height), (32, 24));
        assert_eq!(out.pixels.len(), 32 * 24 * 4);
    }

    #[test]
    fn test_same_size_is_untouched() {
        let img = gradient(30, 20);
        assert_eq!(resize(&img, 30, 20, FilterType::Lanczos3).unwrap(), img);
    }

    #[test]
    fn test_zero_target_is_rejected() {
        let img = gradient(30, 20);
        for (w, h) in [(0, 10), (10, 0), (0, 0)] {
            assert!(matches!(
                resize(&img, w, h, FilterType::Nearest),
                Err(DecodeError::EmptyImage { .. })
            ));
        }
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let img = DecodedImage {
            width: 10,
            height: 10,
            pixels: vec![0; 12],
        };
        assert!(matches!(
            resize(&img, 5, 5, FilterType::Bilinear),
            Err(DecodeError::CorruptedFile(_))
        ));
    }

    #[test]
    fn test_transparency_survives_downscale() {
        let img = DecodedImage::filled(40, 40, [10, 20, 30, 0]);
        let out = resize(&img, 10, 10, FilterType::Lanczos3).unwrap();
        assert!(out.pixels.chunks_exact(4).all(|px| px[3] == 0));
    }

    #[test]
    fn test_every_kernel_upscales() {
        let img = gradient(5, 5);
        for filter in [FilterType::Nearest, FilterType::Bilinear, FilterType::Lanczos3] {
            let out = resize(&img, 9, 7, filter).unwrap();
            assert_eq!((out.width, out.height), (9, 7));
        }
    }
}
