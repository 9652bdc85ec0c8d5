//! Two-path image decoding with EXIF orientation handling.
//!
//! The fast path trusts the media type the file declared and asks the
//! matching codec directly. Browsers and uploads routinely lie about media
//! types (a `.png` that is really a JPEG), so when the fast path fails the
//! decoder falls back to sniffing the container from its magic bytes. The
//! dimensions reported by whichever path succeeded are authoritative.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageFormat, ImageReader};

use super::{DecodeError, DecodedImage, Orientation};

/// One way of turning bytes into pixels.
pub trait DecodePath: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Decode `bytes`, optionally guided by the declared media type.
    fn decode(&self, bytes: &[u8], media_type: Option<&str>) -> Result<DynamicImage, DecodeError>;
}

/// Fast path: decode with the codec named by the declared media type.
#[derive(Debug, Clone, Copy, Default)]
pub struct HintedDecode;

impl DecodePath for HintedDecode {
    fn name(&self) -> &'static str {
        "hinted"
    }

    fn decode(&self, bytes: &[u8], media_type: Option<&str>) -> Result<DynamicImage, DecodeError> {
        let format = media_type
            .and_then(format_for_media_type)
            .ok_or(DecodeError::InvalidFormat)?;

        image::load_from_memory_with_format(bytes, format)
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()))
    }
}

/// Fallback path: detect the container from its magic bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SniffedDecode;

impl DecodePath for SniffedDecode {
    fn name(&self) -> &'static str {
        "sniffed"
    }

    fn decode(&self, bytes: &[u8], _media_type: Option<&str>) -> Result<DynamicImage, DecodeError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

        if reader.format().is_none() {
            return Err(DecodeError::InvalidFormat);
        }

        reader
            .decode()
            .map_err(|e| DecodeError::CorruptedFile(e.to_string()))
    }
}

/// Ordered list of decode paths, tried until one succeeds.
pub struct Decoder {
    paths: Vec<Box<dyn DecodePath>>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::with_paths(vec![Box::new(HintedDecode), Box::new(SniffedDecode)])
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.paths.iter().map(|p| p.name()).collect();
        f.debug_struct("Decoder").field("paths", &names).finish()
    }
}

impl Decoder {
    /// Create a decoder that tries `paths` in order.
    pub fn with_paths(paths: Vec<Box<dyn DecodePath>>) -> Self {
        Self { paths }
    }

    /// Decode `bytes` into an RGBA raster with EXIF orientation applied.
    ///
    /// # Errors
    ///
    /// Returns the error of the last path tried when every path fails, and
    /// `DecodeError::EmptyImage` when the winning path produced no pixels.
    pub fn decode(&self, bytes: &[u8], media_type: Option<&str>) -> Result<DecodedImage, DecodeError> {
        let mut last_err = DecodeError::InvalidFormat;

        for path in &self.paths {
            match path.decode(bytes, media_type) {
                Ok(img) => {
                    let oriented = apply_orientation(img, extract_orientation(bytes));
                    let rgba = oriented.into_rgba8();
                    let (width, height) = rgba.dimensions();
                    if width == 0 || height == 0 {
                        return Err(DecodeError::EmptyImage { width, height });
                    }
                    tracing::debug!(path = path.name(), width, height, "decoded image");
                    return Ok(DecodedImage::from_rgba_image(rgba));
                }
                Err(e) => {
                    tracing::debug!(path = path.name(), error = %e, "decode path failed, falling back");
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }
}

/// Decode with the default fast path + fallback.
pub fn decode(bytes: &[u8], media_type: Option<&str>) -> Result<DecodedImage, DecodeError> {
    Decoder::default().decode(bytes, media_type)
}

/// Map a declared media type onto a codec, ignoring parameters and case.
pub fn format_for_media_type(media_type: &str) -> Option<ImageFormat> {
    let essence = media_type.split(';').next()?.trim().to_ascii_lowercase();
    match essence.as_str() {
        // Non-standard alias some platforms still report
        "image/jpg" | "image/pjpeg" => Some(ImageFormat::Jpeg),
        other => ImageFormat::from_mime_type(other),
    }
}

/// Read the orientation tag, treating a missing or unreadable tag as upright.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let Ok(exif) = Reader::new().read_from_container(&mut Cursor::new(bytes)) else {
        return Orientation::Upright;
    };
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map_or(Orientation::Upright, Orientation::from_exif)
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Upright => img,
        Orientation::Mirrored => img.fliph(),
        Orientation::UpsideDown => img.rotate180(),
        Orientation::MirroredUpsideDown => img.flipv(),
        Orientation::MirroredQuarterCcw => img.rotate90().fliph(),
        Orientation::QuarterCw => img.rotate90(),
        Orientation::MirroredQuarterCw => img.rotate270().fliph(),
        Orientation::QuarterCcw => img.rotate270(),
    }
}

/// Orientation tag of an encoded file, without decoding pixels.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    extract_orientation(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg_bytes, png_bytes};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A path that always fails and counts how often it was asked.
    struct Unreliable(Arc<AtomicUsize>);

    impl DecodePath for Unreliable {
        fn name(&self) -> &'static str {
            "unreliable"
        }

        fn decode(&self, _: &[u8], _: Option<&str>) -> Result<DynamicImage, DecodeError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(DecodeError::CorruptedFile("accelerated decode unavailable".into()))
        }
    }

    #[test]
    fn test_decode_png_with_matching_hint() {
        let img = decode(&png_bytes(40, 30), Some("image/png")).unwrap();
        assert_eq!((img.width, img.height), (40, 30));
        assert_eq!(img.pixels.len(), 40 * 30 * 4);
    }

    #[test]
    fn test_decode_jpeg_without_hint_uses_fallback() {
        let img = decode(&jpeg_bytes(16, 8), None).unwrap();
        assert_eq!((img.width, img.height), (16, 8));
    }

    #[test]
    fn test_wrong_hint_falls_back_to_sniffing() {
        // Declared PNG, actually JPEG
        let img = decode(&jpeg_bytes(12, 10), Some("image/png")).unwrap();
        assert_eq!((img.width, img.height), (12, 10));
    }

    #[test]
    fn test_failing_fast_path_falls_back() {
        let calls = Arc::new(AtomicUsize::new(0));
        let decoder = Decoder::with_paths(vec![
            Box::new(Unreliable(calls.clone())),
            Box::new(SniffedDecode),
        ]);

        let img = decoder.decode(&png_bytes(8, 4), Some("image/png")).unwrap();
        assert_eq!((img.width, img.height), (8, 4));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_both_paths_fail() {
        let result = decode(&[0x00, 0x01, 0x02, 0x03], Some("image/png"));
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_empty_bytes() {
        assert!(decode(&[], None).is_err());
    }

    #[test]
    fn test_decode_truncated_png() {
        let bytes = png_bytes(20, 20);
        assert!(decode(&bytes[..bytes.len() / 2], Some("image/png")).is_err());
    }

    #[test]
    fn test_decoder_without_paths_fails() {
        let decoder = Decoder::with_paths(Vec::new());
        assert!(matches!(
            decoder.decode(&png_bytes(2, 2), None),
            Err(DecodeError::InvalidFormat)
        ));
    }

    #[test]
    fn test_format_for_media_type() {
        assert_eq!(format_for_media_type("image/png"), Some(ImageFormat::Png));
        assert_eq!(format_for_media_type("IMAGE/JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(format_for_media_type("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(
            format_for_media_type("image/webp; q=1"),
            Some(ImageFormat::WebP)
        );
        assert_eq!(format_for_media_type("text/plain"), None);
    }

    #[test]
    fn test_files_without_exif_are_upright() {
        assert_eq!(get_orientation(&png_bytes(4, 4)), Orientation::Upright);
        assert_eq!(get_orientation(&jpeg_bytes(4, 4)), Orientation::Upright);
        assert_eq!(get_orientation(b"not an image"), Orientation::Upright);
    }

    /// Red then green, one row.
    fn two_pixels() -> DynamicImage {
        let mut row = image::RgbaImage::new(2, 1);
        row.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        row.put_pixel(1, 0, image::Rgba([0, 255, 0, 255]));
        DynamicImage::ImageRgba8(row)
    }

    #[test]
    fn test_quarter_turn_tag_stands_image_up() {
        let upright = apply_orientation(two_pixels(), Orientation::QuarterCw).into_rgba8();
        assert_eq!(upright.dimensions(), (1, 2));
        assert_eq!(upright.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_mirrored_tag_swaps_columns() {
        let fixed = apply_orientation(two_pixels(), Orientation::Mirrored).into_rgba8();
        assert_eq!(fixed.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(fixed.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }
}
