//! Ingestion configuration.
//!
//! Every limit is checked once, when the configuration is built. Out-of-range
//! values are a caller error and are reported, never clamped.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::TargetFormat;
use crate::transform::TransformSpec;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Errors for out-of-range configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("maxItems must be at least 1")]
    InvalidMaxItems,

    #[error("maxFileSizeMb must be a positive number, got {0}")]
    InvalidMaxFileSize(f64),

    #[error("acceptedMediaTypes must not be empty")]
    NoAcceptedTypes,

    #[error("defaultQuality must be within 0.0..=1.0, got {0}")]
    InvalidQuality(f32),

    #[error("maxWidth must be at least 1")]
    InvalidMaxWidth,

    #[error("uploadStep must be within 1..=100, got {0}")]
    InvalidUploadStep(u8),
}

/// Limits and defaults for one image collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestConfig {
    /// Largest number of items the collection may hold.
    pub max_items: usize,
    /// Per-file ceiling in megabytes (1 MB = 1024 * 1024 bytes).
    pub max_file_size_mb: f64,
    /// Media types accepted at validation, lowercase.
    pub accepted_media_types: BTreeSet<String>,
    /// Container every processed image is re-encoded to.
    pub target_format: TargetFormat,
    /// Quality for lossy targets, in `[0, 1]`.
    pub default_quality: f32,
    /// Output width ceiling in pixels.
    pub max_width: u32,
    /// Whether new items start with the square crop enabled.
    pub default_square_crop: bool,
    /// Percent added per tick by the simulated upload.
    pub upload_step: u8,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_items: 5,
            max_file_size_mb: 5.0,
            accepted_media_types: ["image/jpeg", "image/png", "image/webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            target_format: TargetFormat::WebP,
            default_quality: 0.85,
            max_width: 1280,
            default_square_crop: false,
            upload_step: 10,
        }
    }
}

impl IngestConfig {
    /// Start from the defaults.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items == 0 {
            return Err(ConfigError::InvalidMaxItems);
        }
        if !self.max_file_size_mb.is_finite() || self.max_file_size_mb <= 0.0 {
            return Err(ConfigError::InvalidMaxFileSize(self.max_file_size_mb));
        }
        if self.accepted_media_types.is_empty() {
            return Err(ConfigError::NoAcceptedTypes);
        }
        if !(0.0..=1.0).contains(&self.default_quality) {
            return Err(ConfigError::InvalidQuality(self.default_quality));
        }
        if self.max_width == 0 {
            return Err(ConfigError::InvalidMaxWidth);
        }
        if !(1..=100).contains(&self.upload_step) {
            return Err(ConfigError::InvalidUploadStep(self.upload_step));
        }
        Ok(())
    }

    /// Per-file ceiling in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        (self.max_file_size_mb * BYTES_PER_MB) as u64
    }

    /// True if `media_type` is in the accepted set. Case and parameters
    /// (`; charset=...`) are ignored.
    pub fn accepts(&self, media_type: &str) -> bool {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.accepted_media_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(&essence))
    }

    /// The accepted set as a human-readable list.
    pub fn accepted_list(&self) -> String {
        self.accepted_media_types
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The spec a freshly ingested item starts with.
    pub fn default_spec(&self) -> TransformSpec {
        TransformSpec::new(self.max_width, self.default_quality, self.target_format)
            .with_square_crop(self.default_square_crop)
    }
}

/// Builder for [`IngestConfig`]; `build` validates.
#[derive(Debug, Clone, Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.config.max_items = max_items;
        self
    }

    pub fn max_file_size_mb(mut self, megabytes: f64) -> Self {
        self.config.max_file_size_mb = megabytes;
        self
    }

    /// Replace the accepted set. Entries are lowercased.
    pub fn accepted_media_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.accepted_media_types = types
            .into_iter()
            .map(|t| t.as_ref().trim().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn target_format(mut self, format: TargetFormat) -> Self {
        self.config.target_format = format;
        self
    }

    pub fn default_quality(mut self, quality: f32) -> Self {
        self.config.default_quality = quality;
        self
    }

    pub fn max_width(mut self, max_width: u32) -> Self {
        self.config.max_width = max_width;
        self
    }

    pub fn default_square_crop(mut self, square_crop: bool) -> Self {
        self.config.default_square_crop = square_crop;
        self
    }

    pub fn upload_step(mut self, step: u8) -> Self {
        self.config.upload_step = step;
        self
    }

    pub fn build(self) -> Result<IngestConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = IngestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_file_size_bytes(), 5 * 1024 * 1024);
        assert_eq!(config.target_format, TargetFormat::WebP);
    }

    #[test]
    fn test_builder_rejects_out_of_range_values() {
        assert_eq!(
            IngestConfig::builder().max_items(0).build(),
            Err(ConfigError::InvalidMaxItems)
        );
        assert_eq!(
            IngestConfig::builder().max_file_size_mb(0.0).build(),
            Err(ConfigError::InvalidMaxFileSize(0.0))
        );
        assert!(matches!(
            IngestConfig::builder().max_file_size_mb(f64::NAN).build(),
            Err(ConfigError::InvalidMaxFileSize(_))
        ));
        assert_eq!(
            IngestConfig::builder()
                .accepted_media_types(Vec::<String>::new())
                .build(),
            Err(ConfigError::NoAcceptedTypes)
        );
        assert_eq!(
            IngestConfig::builder().default_quality(1.2).build(),
            Err(ConfigError::InvalidQuality(1.2))
        );
        assert_eq!(
            IngestConfig::builder().max_width(0).build(),
            Err(ConfigError::InvalidMaxWidth)
        );
        assert_eq!(
            IngestConfig::builder().upload_step(0).build(),
            Err(ConfigError::InvalidUploadStep(0))
        );
        assert_eq!(
            IngestConfig::builder().upload_step(101).build(),
            Err(ConfigError::InvalidUploadStep(101))
        );
    }

    #[test]
    fn test_accepts_ignores_case_and_parameters() {
        let config = IngestConfig::builder()
            .accepted_media_types(["Image/PNG"])
            .build()
            .unwrap();
        assert!(config.accepts("image/png"));
        assert!(config.accepts("IMAGE/PNG; charset=binary"));
        assert!(!config.accepts("image/jpeg"));
    }

    #[test]
    fn test_accepted_list_is_sorted() {
        let config = IngestConfig::default();
        assert_eq!(config.accepted_list(), "image/jpeg, image/png, image/webp");
    }

    #[test]
    fn test_fractional_megabytes() {
        let config = IngestConfig::builder().max_file_size_mb(0.5).build().unwrap();
        assert_eq!(config.max_file_size_bytes(), 512 * 1024);
    }

    #[test]
    fn test_default_spec_carries_config() {
        let config = IngestConfig::builder()
            .max_width(640)
            .default_quality(0.6)
            .target_format(TargetFormat::Jpeg)
            .default_square_crop(true)
            .build()
            .unwrap();
        let spec = config.default_spec();
        assert_eq!(spec.max_width, 640);
        assert_eq!(spec.quality, 0.6);
        assert_eq!(spec.target_format, TargetFormat::Jpeg);
        assert_eq!(spec.rotation_degrees, 0);
        assert!(spec.square_crop);
    }

    #[test]
    fn test_deserialize_partial_object_uses_defaults() {
        let config: IngestConfig =
            serde_json::from_str(r#"{"maxItems":3,"targetFormat":"png","maxFileSizeMb":2}"#).unwrap();
        assert_eq!(config.max_items, 3);
        assert_eq!(config.target_format, TargetFormat::Png);
        assert_eq!(config.max_file_size_mb, 2.0);
        assert_eq!(config.max_width, 1280);
        assert!(config.validate().is_ok());
    }
}
