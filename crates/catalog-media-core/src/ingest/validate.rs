//! Upload validation: media type, size ceiling, collection capacity.
//!
//! A batch is all-or-nothing. The first file that breaks a rule rejects the
//! whole batch, and no item is created for any of its files.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::IngestConfig;

/// An uploaded file, exactly as received. Never modified.
#[derive(Clone)]
pub struct SourceFile {
    bytes: Arc<[u8]>,
    media_type: String,
    size: u64,
    name: String,
}

impl SourceFile {
    /// Wrap uploaded bytes. The declared size is the byte length.
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            size: bytes.len() as u64,
            bytes: bytes.into(),
            media_type: media_type.into(),
            name: name.into(),
        }
    }

    /// Override the declared size, for callers that report it separately.
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Why a batch was rejected. One user-facing message per class.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("File type \"{media_type}\" is not supported. Accepted types: {accepted}")]
    UnsupportedType { media_type: String, accepted: String },

    #[error("\"{name}\" is larger than the {limit_mb} MB limit")]
    TooLarge { name: String, size: u64, limit_mb: f64 },

    #[error("You can add at most {max} images")]
    CapacityReached { max: usize },
}

/// Check one file against the rules, in order: type, size, capacity.
///
/// `current_len` is the number of items already in the collection.
pub fn validate_file(file: &SourceFile, current_len: usize, config: &IngestConfig) -> Result<(), ValidationError> {
    if !config.accepts(file.media_type()) {
        return Err(ValidationError::UnsupportedType {
            media_type: file.media_type().to_string(),
            accepted: config.accepted_list(),
        });
    }

    if file.size() > config.max_file_size_bytes() {
        return Err(ValidationError::TooLarge {
            name: file.name().to_string(),
            size: file.size(),
            limit_mb: config.max_file_size_mb,
        });
    }

    if current_len >= config.max_items {
        return Err(ValidationError::CapacityReached {
            max: config.max_items,
        });
    }

    Ok(())
}

/// Check a whole batch. File `i` is checked as if the `i` files before it
/// had already been added, so an accepted batch always fits.
pub fn validate_batch(files: &[SourceFile], current_len: usize, config: &IngestConfig) -> Result<(), ValidationError> {
    files
        .iter()
        .enumerate()
        .try_for_each(|(i, file)| validate_file(file, current_len + i, config))
}
