//! Quarter-turn rotation.
//!
//! Product photos are only ever turned in 90 degree steps, so rotation is an
//! exact pixel permutation with no resampling. Angles follow screen
//! coordinates (y grows downward): a positive angle turns the picture
//! clockwise, the same direction a 2D canvas `rotate()` uses.
//!
//! For a source of width `w` and height `h`, the destination pixel
//! `(dx, dy)` reads from:
//! ```text
//!  90: src(dy,         h - 1 - dx)
//! 180: src(w - 1 - dx, h - 1 - dy)
//! 270: src(w - 1 - dy, dx)
//! ```

use serde::{Deserialize, Serialize};

use crate::decode::{DecodedImage, CHANNELS};

/// A rotation by a whole number of quarter turns, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuarterTurn {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl QuarterTurn {
    /// Normalize `degrees` into `[0, 360)` and map it to a quarter turn.
    ///
    /// Returns `None` for angles that are not a multiple of 90.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(QuarterTurn::None),
            90 => Some(QuarterTurn::Cw90),
            180 => Some(QuarterTurn::Cw180),
            270 => Some(QuarterTurn::Cw270),
            _ => None,
        }
    }

    /// The normalized angle in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            QuarterTurn::None => 0,
            QuarterTurn::Cw90 => 90,
            QuarterTurn::Cw180 => 180,
            QuarterTurn::Cw270 => 270,
        }
    }

    /// 90 and 270 degree turns transpose the bounding box.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, QuarterTurn::Cw90 | QuarterTurn::Cw270)
    }

    /// Dimensions of a `width x height` raster after this turn.
    pub fn rotated_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

/// Rotate an image by a quarter turn. `QuarterTurn::None` returns a clone.
pub fn rotate_quarter(image: &DecodedImage, turn: QuarterTurn) -> DecodedImage {
    if turn == QuarterTurn::None {
        return image.clone();
    }

    let (w, h) = (image.width as usize, image.height as usize);
    let (dst_w, dst_h) = turn.rotated_dimensions(image.width, image.height);
    let mut output = vec![0u8; w * h * CHANNELS];

    for dy in 0..dst_h as usize {
        for dx in 0..dst_w as usize {
            let (sx, sy) = match turn {
                QuarterTurn::Cw90 => (dy, h - 1 - dx),
                QuarterTurn::Cw180 => (w - 1 - dx, h - 1 - dy),
                QuarterTurn::Cw270 => (w - 1 - dy, dx),
                QuarterTurn::None => (dx, dy),
            };

            let src_idx = (sy * w + sx) * CHANNELS;
            let dst_idx = (dy * dst_w as usize + dx) * CHANNELS;
            output[dst_idx..dst_idx + CHANNELS]
                .copy_from_slice(&image.pixels[src_idx..src_idx + CHANNELS]);
        }
    }

    DecodedImage::new(dst_w, dst_h, output)
}
