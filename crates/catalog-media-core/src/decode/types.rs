//! Raster, orientation and error types shared by the decode step.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bytes per pixel in a [`DecodedImage`] (RGBA8).
pub const CHANNELS: usize = 4;

/// Why a file could not be turned into pixels.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No codec recognized the bytes.
    #[error("Unrecognized image format")]
    InvalidFormat,

    /// A codec recognized the container but could not finish reading it.
    #[error("Image data is damaged or truncated: {0}")]
    CorruptedFile(String),

    /// Decoding succeeded but produced nothing to show.
    #[error("Image has zero area ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// Resampling kernel used by [`resize`](super::resize).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Nearest,
    /// Triangle kernel.
    Bilinear,
    /// Sharpest of the three; used for catalog downscales.
    #[default]
    Lanczos3,
}

impl FilterType {
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType as Kernel;
        match self {
            FilterType::Nearest => Kernel::Nearest,
            FilterType::Bilinear => Kernel::Triangle,
            FilterType::Lanczos3 => Kernel::Lanczos3,
        }
    }
}

/// How the camera says the stored pixels must be turned to look upright.
///
/// Discriminants are the raw EXIF tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Upright = 1,
    Mirrored = 2,
    UpsideDown = 3,
    MirroredUpsideDown = 4,
    /// Mirror, then a quarter turn counter-clockwise.
    MirroredQuarterCcw = 5,
    QuarterCw = 6,
    /// Mirror, then a quarter turn clockwise.
    MirroredQuarterCw = 7,
    QuarterCcw = 8,
}

impl Orientation {
    /// Map a raw tag value. Anything outside 1..=8 is treated as upright.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Self::Mirrored,
            3 => Self::UpsideDown,
            4 => Self::MirroredUpsideDown,
            5 => Self::MirroredQuarterCcw,
            6 => Self::QuarterCw,
            7 => Self::MirroredQuarterCw,
            8 => Self::QuarterCcw,
            _ => Self::Upright,
        }
    }

    /// Raw tag value, as reported to JavaScript.
    pub fn exif_value(self) -> u8 {
        self as u8
    }
}

/// An RGBA8 raster in row-major order.
///
/// Alpha survives into PNG and WebP output; JPEG flattens it away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Wrap an existing buffer. The length must be `width * height * 4`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            Self::buffer_len(width, height),
            "RGBA buffer length does not match {width}x{height}"
        );
        Self { width, height, pixels }
    }

    /// Solid-color raster.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let len = Self::buffer_len(width, height);
        let pixels = rgba.into_iter().cycle().take(len).collect();
        Self::new(width, height, pixels)
    }

    pub(crate) fn buffer_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * CHANNELS
    }

    pub fn from_rgba_image(buffer: image::RgbaImage) -> Self {
        let (width, height) = buffer.dimensions();
        Self::new(width, height, buffer.into_raw())
    }

    /// Zero-copy view for `image::imageops`. `None` if the buffer is the wrong size.
    pub fn as_rgba_image(&self) -> Option<image::ImageBuffer<image::Rgba<u8>, &[u8]>> {
        image::ImageBuffer::from_raw(self.width, self.height, self.pixels.as_slice())
    }

    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Read one pixel. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let start = (y as usize * self.width as usize + x as usize) * CHANNELS;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[start..start + CHANNELS]);
        px
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
