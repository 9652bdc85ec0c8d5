//! Decode, transform and encode one source file.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::SourceFile;
use crate::decode::{DecodeError, Decoder};
use crate::encode::{encode, EncodeError, TargetFormat};
use crate::transform::{apply_transform, TransformError, TransformSpec};

/// Any stage of a pipeline run that can fail.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Could not read image: {0}")]
    Decode(#[from] DecodeError),

    #[error("Could not transform image: {0}")]
    Transform(#[from] TransformError),

    #[error("Could not encode image: {0}")]
    Encode(#[from] EncodeError),
}

/// The encoded output of one run.
///
/// Width and height are the dimensions of the encoded raster, after
/// rotation.
#[derive(Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub payload: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    pub format: TargetFormat,
}

impl TransformResult {
    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }

    pub fn byte_len(&self) -> usize {
        self.payload.len()
    }
}

impl fmt::Debug for TransformResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformResult")
            .field("bytes", &self.payload.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish()
    }
}

/// Stateless processor. Holds only the decoder configuration, so one
/// instance can serve every item.
#[derive(Debug, Default)]
pub struct Pipeline {
    decoder: Decoder,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decoder(decoder: Decoder) -> Self {
        Self { decoder }
    }

    /// Run all three stages. `source` is never modified, so the same file
    /// can be reprocessed with a different spec any number of times.
    #[tracing::instrument(skip(self, source), fields(file = source.name(), format = %spec.target_format))]
    pub fn run(&self, source: &SourceFile, spec: &TransformSpec) -> Result<TransformResult, PipelineError> {
        spec.validate()?;

        let decoded = self.decoder.decode(source.bytes(), Some(source.media_type()))?;
        let transformed = apply_transform(&decoded, spec)?;
        let payload = encode(&transformed, spec.target_format, spec.quality)?;

        tracing::debug!(
            src_width = decoded.width,
            src_height = decoded.height,
            width = transformed.width,
            height = transformed.height,
            bytes = payload.len(),
            "processed image"
        );

        Ok(TransformResult {
            payload: payload.into(),
            width: transformed.width,
            height: transformed.height,
            format: spec.target_format,
        })
    }
}
