//! Batch ingestion and the item lifecycle.
//!
//! # Flow
//!
//! ```text
//! files --validate--> Pending --pipeline--> Uploading --transport--> Completed
//!                                  |                       |
//!                                  +--------> Failed <-----+
//! ```
//!
//! Validation is all-or-nothing per batch. Processing runs one file at a
//! time; uploads start once the whole batch is processed. A completed item
//! can be re-transformed (rotated, cropped) any number of times from its
//! untouched source file.

mod collection;
mod config;
mod handle;
mod item;
mod manager;
mod pipeline;
mod transport;
mod validate;

pub use collection::ItemCollection;
pub use config::{ConfigError, IngestConfig, IngestConfigBuilder};
pub use handle::{HandleError, HandleStore, MemoryHandleStore};
pub use item::{display_name, Item, ItemId, ItemStatus, ItemSummary};
pub use manager::{ChangeCallback, CommitOutcome, Download, ImageManager, LifecycleError, RetransformTicket};
pub use pipeline::{Pipeline, PipelineError, TransformResult};
pub use transport::{SimulatedTransport, TransportError, UploadPoll, UploadTransport};
pub use validate::{validate_batch, validate_file, SourceFile, ValidationError};

pub use crate::transform::TransformSpec;
