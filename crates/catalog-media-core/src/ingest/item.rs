//! One image in the collection and its lifecycle status.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{SourceFile, TransformResult};
use crate::encode::TargetFormat;
use crate::transform::TransformSpec;

/// Stable identity of an item. Never reused within a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an item is in its lifecycle.
///
/// ```text
/// Pending -> Processing -> Uploading -> Completed
///                 \            \
///                  +-> Failed   +-> Failed
/// Completed -> Processing (re-transform) -> Completed | Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Uploading,
    Completed,
    Failed,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Uploading => "uploading",
            ItemStatus::Completed => "completed",
            ItemStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded image and everything derived from it.
///
/// Items are values: the manager replaces them rather than mutating them in
/// place, so a snapshot handed out earlier never changes underneath its
/// reader.
#[derive(Debug, Clone)]
pub struct Item {
    pub(crate) id: ItemId,
    pub(crate) source: Arc<SourceFile>,
    pub(crate) spec: TransformSpec,
    pub(crate) result: Option<TransformResult>,
    pub(crate) handle: Option<String>,
    pub(crate) display_name: String,
    pub(crate) is_main: bool,
    pub(crate) status: ItemStatus,
    pub(crate) progress: u8,
    pub(crate) error: Option<String>,
}

impl Item {
    pub(crate) fn new(id: ItemId, source: SourceFile, spec: TransformSpec) -> Self {
        let display_name = display_name(source.name(), spec.target_format);
        Self {
            id,
            source: Arc::new(source),
            spec,
            result: None,
            handle: None,
            display_name,
            is_main: false,
            status: ItemStatus::Pending,
            progress: 0,
            error: None,
        }
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.status = ItemStatus::Failed;
        self.error = Some(message);
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    /// Parameters of the last committed result.
    pub fn spec(&self) -> &TransformSpec {
        &self.spec
    }

    pub fn rotation_degrees(&self) -> i32 {
        self.spec.rotation_degrees
    }

    pub fn square_crop(&self) -> bool {
        self.spec.square_crop
    }

    pub fn current_result(&self) -> Option<&TransformResult> {
        self.result.as_ref()
    }

    /// Display handle for the current result, if one has been issued.
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Upload progress in percent.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Plain-data view for serialization.
    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            id: self.id,
            display_name: self.display_name.clone(),
            handle: self.handle.clone(),
            is_main: self.is_main,
            status: self.status,
            progress: self.progress,
            rotation_degrees: self.spec.rotation_degrees,
            square_crop: self.spec.square_crop,
            width: self.result.as_ref().map(|r| r.width),
            height: self.result.as_ref().map(|r| r.height),
            error: self.error.clone(),
        }
    }
}

/// Serializable snapshot of an [`Item`], without payload bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: ItemId,
    pub display_name: String,
    pub handle: Option<String>,
    pub is_main: bool,
    pub status: ItemStatus,
    pub progress: u8,
    pub rotation_degrees: i32,
    pub square_crop: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub error: Option<String>,
}

/// Original file name with its extension replaced by the target's.
///
/// Only the last extension is replaced. A leading dot does not start an
/// extension, so `.hidden` becomes `.hidden.webp`.
pub fn display_name(original: &str, format: TargetFormat) -> String {
    let stem = match original.rfind('.') {
        Some(idx) if idx > 0 => &original[..idx],
        _ => original,
    };
    format!("{stem}.{}", format.extension())
}
