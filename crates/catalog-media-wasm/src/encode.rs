//! Image encoding WASM bindings.
//!
//! # Example
//!
//! ```typescript
//! import { encode_image } from '@catalog-media/wasm';
//!
//! const webp = encode_image(image, 'image/webp', 0.85);
//! const blob = new Blob([webp], { type: 'image/webp' });
//! ```

use crate::types::JsRaster;
use catalog_media_core::encode::{self, TargetFormat};
use wasm_bindgen::prelude::*;

/// Encode an RGBA image.
///
/// `format` is a MIME type (`image/webp`) or short name (`webp`, `jpg`,
/// `png`). `quality` is a fraction in `[0, 1]`, clamped to at least 0.1 and
/// ignored for PNG.
///
/// # Errors
///
/// Returns an error for an unknown format or a malformed image.
#[wasm_bindgen]
pub fn encode_image(image: &JsRaster, format: &str, quality: f32) -> Result<Vec<u8>, JsValue> {
    let format: TargetFormat = format.parse().map_err(|e: encode::EncodeError| JsValue::from_str(&e.to_string()))?;
    let raster = image
        .to_decoded()
        .ok_or_else(|| JsValue::from_str("Pixel buffer does not match dimensions"))?;
    encode::encode(&raster, format, quality).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// File extension (without the dot) used for a target format.
#[wasm_bindgen]
pub fn format_extension(format: &str) -> Option<String> {
    format
        .parse::<TargetFormat>()
        .ok()
        .map(|f| f.extension().to_string())
}
