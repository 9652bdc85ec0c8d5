//! Decoding entry points for browser uploads.
//!
//! ```typescript
//! import { decode_image } from '@catalog-media/wasm';
//!
//! const raster = decode_image(new Uint8Array(await file.arrayBuffer()), file.type);
//! preview.width = raster.width;
//! ```

use crate::types::{filter_from_u8, JsRaster};
use catalog_media_core::decode;
use wasm_bindgen::prelude::*;

/// Decode JPEG, PNG or WebP bytes into an upright RGBA raster.
///
/// `media_type` is whatever the browser reported for the file. A wrong or
/// missing type only costs the fast path; the container is then sniffed.
///
/// # Errors
///
/// Fails when neither path can read the bytes.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8], media_type: Option<String>) -> Result<JsRaster, JsValue> {
    decode::decode(bytes, media_type.as_deref())
        .map(JsRaster::from_decoded)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Raw EXIF orientation tag (1 to 8). Files without one report 1.
#[wasm_bindgen]
pub fn image_orientation(bytes: &[u8]) -> u8 {
    decode::get_orientation(bytes).exif_value()
}

/// Resample to exactly `width` x `height`. See `filter_from_u8` for `filter`.
///
/// # Errors
///
/// Fails on a zero target dimension or a raster whose buffer is the wrong size.
#[wasm_bindgen]
pub fn resize(image: &JsRaster, width: u32, height: u32, filter: u8) -> Result<JsRaster, JsValue> {
    let src = image
        .to_decoded()
        .ok_or_else(|| JsValue::from_str("Pixel buffer does not match dimensions"))?;
    decode::resize(&src, width, height, filter_from_u8(filter))
        .map(JsRaster::from_decoded)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
