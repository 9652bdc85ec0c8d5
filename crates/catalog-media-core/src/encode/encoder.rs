//! Raster serialization to JPEG, PNG and WebP.
//!
//! Quality is a fraction in `[0, 1]`, the convention browsers use for
//! `canvas.toBlob`. Lossy formats clamp it to `[0.1, 1.0]`; PNG ignores it.
//!
//! The WebP encoder in the `image` crate is pure Rust and lossless only. To
//! keep wasm builds free of C dependencies, quality below 1.0 snaps the color
//! channels to a coarser palette before the lossless encode. Each channel
//! moves by at most half a palette step. This bounds fidelity only: coarse
//! steps defeat the encoder's prediction on smooth content, so the payload
//! is not guaranteed to shrink.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use super::TargetFormat;
use crate::decode::{DecodedImage, CHANNELS};

/// Lowest quality a lossy encode will use.
pub const MIN_QUALITY: f32 = 0.1;
/// Highest quality.
pub const MAX_QUALITY: f32 = 1.0;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec reported a failure
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: TargetFormat,
        message: String,
    },

    /// The codec returned without producing any bytes
    #[error("{0} encoder produced an empty payload")]
    EmptyPayload(TargetFormat),

    /// Requested an unknown output format
    #[error("Unsupported target format: {0}")]
    UnsupportedFormat(String),
}

/// Clamp a lossy quality fraction into `[MIN_QUALITY, MAX_QUALITY]`.
///
/// Non-finite input falls back to full quality.
pub fn clamp_quality(quality: f32) -> f32 {
    if quality.is_finite() {
        quality.clamp(MIN_QUALITY, MAX_QUALITY)
    } else {
        MAX_QUALITY
    }
}

/// Encode an RGBA raster into `format`.
///
/// # Arguments
///
/// * `image` - RGBA raster to serialize
/// * `format` - Output container
/// * `quality` - Fraction in `[0, 1]`; ignored for PNG
///
/// # Errors
///
/// Returns an error for zero dimensions, a pixel buffer that does not match
/// the dimensions, a codec failure, or an empty payload.
pub fn encode(image: &DecodedImage, format: TargetFormat, quality: f32) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * CHANNELS;
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    let failed = |e: image::ImageError| EncodeError::EncodingFailed {
        format,
        message: e.to_string(),
    };

    match format {
        TargetFormat::Jpeg => {
            let rgb = drop_alpha(&image.pixels);
            JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality))
                .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(failed)?;
        }
        TargetFormat::Png => {
            PngEncoder::new(&mut buffer)
                .write_image(&image.pixels, width, height, ExtendedColorType::Rgba8)
                .map_err(failed)?;
        }
        TargetFormat::WebP => {
            let quality = clamp_quality(quality);
            let mut rgba = image.pixels.clone();
            quantize_channels(&mut rgba, quality);
            WebPEncoder::new_lossless(&mut buffer)
                .write_image(&rgba, width, height, ExtendedColorType::Rgba8)
                .map_err(failed)?;
        }
    }

    let payload = buffer.into_inner();
    if payload.is_empty() {
        return Err(EncodeError::EmptyPayload(format));
    }
    Ok(payload)
}

/// Map a quality fraction onto the JPEG encoder's 1-100 scale.
fn jpeg_quality(quality: f32) -> u8 {
    (clamp_quality(quality) * 100.0).round() as u8
}

fn drop_alpha(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(CHANNELS)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}

/// Number of distinct values kept per color channel at `quality`.
///
/// Quadratic so that the upper half of the range stays visually close to
/// the source while low settings shrink the palette aggressively.
fn levels_for_quality(quality: f32) -> u16 {
    if quality >= MAX_QUALITY {
        return 256;
    }
    let q = clamp_quality(quality);
    (2.0 + q * q * 254.0).round().clamp(2.0, 256.0) as u16
}

/// Snap RGB channels to an evenly spaced palette. Alpha is left untouched.
fn quantize_channels(rgba: &mut [u8], quality: f32) {
    let levels = levels_for_quality(quality);
    if levels >= 256 {
        return;
    }

    let step = 255.0 / (levels as f32 - 1.0);
    for px in rgba.chunks_exact_mut(CHANNELS) {
        for channel in px.iter_mut().take(3) {
            let bucket = (*channel as f32 / step).round();
            *channel = (bucket * step).round().clamp(0.0, 255.0) as u8;
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
