//! Raster handle passed between JavaScript calls.
//!
//! Keeping decoded pixels on the WASM side lets a preview run crop, rotate
//! and encode without copying the buffer across the boundary each time.

use catalog_media_core::decode::{DecodedImage, FilterType, CHANNELS};
use wasm_bindgen::prelude::*;

/// RGBA8 pixels owned by WASM memory.
///
/// `pixels()` hands back a `Uint8Array` copy suitable for `new ImageData(...)`.
#[wasm_bindgen]
pub struct JsRaster {
    inner: DecodedImage,
}

#[wasm_bindgen]
impl JsRaster {
    /// Wrap caller-supplied RGBA bytes. The length is checked lazily, when
    /// the raster is first used.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsRaster {
        JsRaster {
            inner: DecodedImage { width, height, pixels },
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    #[wasm_bindgen(getter, js_name = byteLength)]
    pub fn byte_length(&self) -> usize {
        self.inner.pixels.len()
    }

    pub fn pixels(&self) -> Vec<u8> {
        self.inner.pixels.clone()
    }

    /// Drop the buffer without waiting for the JS finalizer.
    pub fn free(self) {}
}

impl JsRaster {
    pub(crate) fn from_decoded(inner: DecodedImage) -> Self {
        Self { inner }
    }

    /// Core raster copy, or `None` when the buffer is not `width * height * 4` bytes.
    pub(crate) fn to_decoded(&self) -> Option<DecodedImage> {
        let DecodedImage { width, height, pixels } = &self.inner;
        let wanted = *width as usize * *height as usize * CHANNELS;
        (pixels.len() == wanted).then(|| self.inner.clone())
    }
}

/// Numeric kernel selector used by `resize`: 0 nearest, 1 bilinear, else Lanczos3.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        1 => FilterType::Bilinear,
        _ => FilterType::Lanczos3,
    }
}
