//! Image decoding for product photo ingestion.
//!
//! This module provides functionality for:
//! - Decoding JPEG, PNG and WebP uploads into an RGBA raster
//! - Falling back from the declared media type to content sniffing
//! - Applying EXIF orientation so dimensions match what a browser shows
//! - Resampling rasters
//!
//! # Architecture
//!
//! Decoding is synchronous and single-threaded; the ingestion manager runs
//! one file at a time so at most one full-size raster is alive per batch.
//!
//! # Examples
//!
//! ```ignore
//! use catalog_media_core::decode::decode;
//!
//! let bytes = std::fs::read("shoe.png").unwrap();
//! let image = decode(&bytes, Some("image/png")).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod decoder;
mod resize;
mod types;

pub use decoder::{
    decode, format_for_media_type, get_orientation, DecodePath, Decoder, HintedDecode,
    SniffedDecode,
};
pub use resize::resize;
pub use types::{DecodeError, DecodedImage, FilterType, Orientation, CHANNELS};
