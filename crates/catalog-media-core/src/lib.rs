//! Catalog Media Core - product image ingestion
//!
//! This crate turns uploaded product photos into normalized catalog images:
//! validation, two-path decoding, square crop, downscale, rotation and
//! re-encoding, plus the lifecycle of each image in a small collection
//! (upload progress, main image, revocable display handles).

pub mod decode;
pub mod encode;
pub mod ingest;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use decode::{DecodeError, DecodedImage, Decoder};
pub use encode::{EncodeError, TargetFormat};
pub use ingest::{
    ConfigError, ImageManager, IngestConfig, Item, ItemId, ItemStatus, LifecycleError, Pipeline, PipelineError,
    SourceFile, TransformResult, ValidationError,
};
pub use transform::{TransformError, TransformSpec};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg_bytes, png_file};

    #[test]
    fn test_end_to_end_defaults() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let mut manager = ImageManager::new(IngestConfig::default()).unwrap();
        let jpeg = SourceFile::new("boot.jpg", "image/jpeg", jpeg_bytes(1600, 900));
        let ids = manager.ingest(vec![jpeg, png_file("laces.png", 300, 300)]).unwrap();
        manager.finish_uploads();

        let boot = manager.get(ids[0]).unwrap();
        assert_eq!(boot.status(), ItemStatus::Completed);
        assert_eq!(boot.display_name(), "boot.webp");
        let result = boot.current_result().unwrap();
        assert_eq!((result.width, result.height), (1280, 720));
        assert_eq!(result.format, TargetFormat::WebP);

        let laces = manager.get(ids[1]).unwrap();
        assert_eq!(laces.current_result().unwrap().width, 300);
        assert!(manager.main_item().unwrap().id() == ids[0]);
    }
}
