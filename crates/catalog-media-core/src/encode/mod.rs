//! Image encoding for processed product photos.
//!
//! This module provides functionality for:
//! - Encoding RGBA rasters to JPEG, PNG or WebP
//! - Quality clamping for lossy formats
//!
//! # Examples
//!
//! ```ignore
//! use catalog_media_core::decode::DecodedImage;
//! use catalog_media_core::encode::{encode, TargetFormat};
//!
//! let raster = DecodedImage::filled(100, 100, [128, 128, 128, 255]);
//! let jpeg = encode(&raster, TargetFormat::Jpeg, 0.9).unwrap();
//! println!("Encoded {} bytes", jpeg.len());
//! ```

mod encoder;
mod format;

pub use encoder::{clamp_quality, encode, EncodeError, MAX_QUALITY, MIN_QUALITY};
pub use format::TargetFormat;
