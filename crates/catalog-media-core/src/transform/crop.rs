//! Source-rectangle selection and pixel cropping.
//!
//! Crop rectangles are expressed in source pixels. The only crop the
//! ingestion pipeline asks for is the centered square, but `apply_crop`
//! accepts any rectangle that fits inside the image.

use serde::{Deserialize, Serialize};

use crate::decode::{DecodedImage, CHANNELS};

/// A rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// The whole image.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// The largest centered square. Offsets round down, so an odd surplus
    /// leaves the extra pixel on the right/bottom.
    pub fn centered_square(width: u32, height: u32) -> Self {
        let side = width.min(height);
        Self {
            x: (width - side) / 2,
            y: (height - side) / 2,
            width: side,
            height: side,
        }
    }

    /// True if this rectangle covers a `width x height` image exactly.
    pub fn is_full(&self, width: u32, height: u32) -> bool {
        *self == Self::full(width, height)
    }

    /// True if the rectangle lies inside a `width x height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }
}

/// Copy the pixels inside `rect` into a new image.
///
/// The rectangle is clamped to the image bounds; the output is at least 1x1
/// for any non-empty source.
pub fn apply_crop(image: &DecodedImage, rect: CropRect) -> DecodedImage {
    if rect.is_full(image.width, image.height) {
        return image.clone();
    }

    let left = rect.x.min(image.width.saturating_sub(1));
    let top = rect.y.min(image.height.saturating_sub(1));
    let out_width = rect.width.min(image.width - left).max(1);
    let out_height = rect.height.min(image.height - top).max(1);

    let src_stride = image.width as usize * CHANNELS;
    let row_len = out_width as usize * CHANNELS;
    let mut output = Vec::with_capacity(row_len * out_height as usize);

    for y in top..top + out_height {
        let start = y as usize * src_stride + left as usize * CHANNELS;
        output.extend_from_slice(&image.pixels[start..start + row_len]);
    }

    DecodedImage::new(out_width, out_height, output)
}
