//! Shared test utilities for the catalog-media-core test suite.
//!
//! Fixtures are generated in memory and encoded with the `image` crate, so
//! tests never depend on files on disk.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::decode::DecodedImage;
use crate::ingest::{IngestConfig, SourceFile};

pub const RED: [u8; 4] = [255, 0, 0, 255];
pub const GREEN: [u8; 4] = [0, 255, 0, 255];
pub const BLUE: [u8; 4] = [0, 0, 255, 255];
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

// =========================================================================
// Rasters
// =========================================================================

/// A smooth RGBA gradient, opaque.
pub fn gradient(width: u32, height: u32) -> DecodedImage {
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            pixels.push(((x * 255) / width.max(1)) as u8);
            pixels.push(((y * 255) / height.max(1)) as u8);
            pixels.push(128);
            pixels.push(255);
        }
    }
    DecodedImage::new(width, height, pixels)
}

/// A 2x2 image with a distinct color per quadrant:
///
/// ```text
/// RED   GREEN
/// BLUE  WHITE
/// ```
pub fn quadrants() -> DecodedImage {
    let pixels = [RED, GREEN, BLUE, WHITE].concat();
    DecodedImage::new(2, 2, pixels)
}

// =========================================================================
// Encoded fixtures
// =========================================================================

/// Encode a gradient of the given size into `format`.
pub fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let raster = gradient(width, height);
    let rgba = RgbaImage::from_raw(width, height, raster.pixels).unwrap();
    let img = match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()),
        _ => DynamicImage::ImageRgba8(rgba),
    };
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Jpeg)
}

// =========================================================================
// Ingest fixtures
// =========================================================================

/// A PNG source file of the given size.
pub fn png_file(name: &str, width: u32, height: u32) -> SourceFile {
    SourceFile::new(name, "image/png", png_bytes(width, height))
}

/// A file that claims to be a PNG but holds garbage.
pub fn corrupt_file(name: &str) -> SourceFile {
    SourceFile::new(name, "image/png", vec![0x00, 0x01, 0x02, 0x03, 0x04])
}

/// Small, fast defaults for manager tests: PNG output so pixels survive.
pub fn test_config() -> IngestConfig {
    IngestConfig::builder()
        .max_items(5)
        .max_width(64)
        .target_format(crate::encode::TargetFormat::Png)
        .upload_step(50)
        .build()
        .unwrap()
}
