//! The item lifecycle manager.
//!
//! [`ImageManager`] owns the collection and is the only thing that changes
//! it. Every public operation leaves the collection in a consistent state:
//!
//! - a non-empty collection has exactly one main item,
//! - every handle referenced by an item is live in the handle store, and
//!   every other handle the manager issued has been revoked,
//! - upload progress only moves forward.
//!
//! Re-transforms are split in two so the pipeline can run away from the
//! manager: [`ImageManager::begin_retransform`] hands out a ticket, and
//! [`ImageManager::complete_retransform`] commits its result. Only the most
//! recent ticket per item commits; older ones come back as
//! [`CommitOutcome::Superseded`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::{
    validate_batch, ConfigError, HandleStore, IngestConfig, Item, ItemCollection, ItemId, ItemStatus,
    MemoryHandleStore, Pipeline, PipelineError, SimulatedTransport, SourceFile, TransformResult,
    TransportError, UploadPoll, UploadTransport, ValidationError,
};
use crate::transform::{TransformError, TransformSpec};

/// Errors from item operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("No image with id {0}")]
    UnknownItem(ItemId),

    #[error("Image {id} is {status} and cannot be edited yet")]
    NotReady { id: ItemId, status: ItemStatus },

    #[error("Image {0} has no processed result")]
    NoResult(ItemId),

    #[error(transparent)]
    InvalidSpec(#[from] TransformError),
}

/// Called with the live handles, in insertion order, after the collection
/// changes shape.
pub type ChangeCallback = Box<dyn FnMut(&[String])>;

/// What [`ImageManager::complete_retransform`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The result replaced the item's previous one.
    Committed,
    /// The run failed; the item keeps its previous result and handle.
    Failed,
    /// A newer request for the same item exists.
    Superseded,
    /// The item was removed while the run was in flight.
    Discarded,
}

/// A claim on one re-transform run.
#[derive(Debug, Clone)]
pub struct RetransformTicket {
    id: ItemId,
    generation: u64,
    source: Arc<SourceFile>,
    spec: TransformSpec,
}

impl RetransformTicket {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn spec(&self) -> &TransformSpec {
        &self.spec
    }

    /// Run the pipeline for this ticket. Touches no manager state.
    pub fn run(&self, pipeline: &Pipeline) -> Result<TransformResult, PipelineError> {
        pipeline.run(&self.source, &self.spec)
    }
}

/// What the host needs to save an item's current output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Download {
    pub handle: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy)]
struct PendingRetransform {
    generation: u64,
    spec: TransformSpec,
}

/// Owns the item collection and drives every lifecycle transition.
pub struct ImageManager<S = MemoryHandleStore, T = SimulatedTransport> {
    config: IngestConfig,
    pipeline: Pipeline,
    collection: ItemCollection,
    handles: S,
    transport: T,
    uploads: Vec<ItemId>,
    pending: HashMap<ItemId, PendingRetransform>,
    next_id: u64,
    next_generation: u64,
    last_error: Option<String>,
    on_change: Option<ChangeCallback>,
}

impl ImageManager {
    /// Manager with in-memory handles and simulated uploads.
    pub fn new(config: IngestConfig) -> Result<Self, ConfigError> {
        let transport = SimulatedTransport::new(config.upload_step);
        Self::with_parts(config, MemoryHandleStore::new(), transport)
    }
}

impl<S: HandleStore, T: UploadTransport> ImageManager<S, T> {
    pub fn with_parts(config: IngestConfig, handles: S, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            pipeline: Pipeline::new(),
            collection: ItemCollection::new(),
            handles,
            transport,
            uploads: Vec::new(),
            pending: HashMap::new(),
            next_id: 0,
            next_generation: 0,
            last_error: None,
            on_change: None,
        })
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn set_on_change(&mut self, callback: impl FnMut(&[String]) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn clear_on_change(&mut self) {
        self.on_change = None;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn collection(&self) -> &ItemCollection {
        &self.collection
    }

    /// Snapshot of every item, in insertion order.
    pub fn items(&self) -> Arc<[Item]> {
        self.collection.snapshot()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.collection.get(id)
    }

    pub fn main_item(&self) -> Option<&Item> {
        self.collection.main()
    }

    pub fn handles(&self) -> Vec<String> {
        self.collection.handles()
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.collection.version()
    }

    /// Message of the most recent rejected batch. Cleared by the next
    /// accepted batch.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn handle_store(&self) -> &S {
        &self.handles
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn uploads_in_flight(&self) -> usize {
        self.uploads.len()
    }

    /// The spec the next edit of `id` builds on: the newest requested one if
    /// a re-transform is in flight, otherwise the committed one.
    pub fn requested_spec(&self, id: ItemId) -> Result<TransformSpec, LifecycleError> {
        if let Some(pending) = self.pending.get(&id) {
            return Ok(pending.spec);
        }
        self.collection
            .get(id)
            .map(|item| item.spec)
            .ok_or(LifecycleError::UnknownItem(id))
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Validate, process and start uploading a batch.
    ///
    /// The batch is rejected as a whole if any file fails validation. Files
    /// are processed one at a time in batch order; a file that fails to
    /// process becomes a `Failed` item without affecting the others. Uploads
    /// start only once every file in the batch has been processed.
    #[tracing::instrument(skip(self, files), fields(files = files.len()))]
    pub fn ingest(&mut self, files: Vec<SourceFile>) -> Result<Vec<ItemId>, ValidationError> {
        if let Err(err) = validate_batch(&files, self.collection.len(), &self.config) {
            tracing::warn!(error = %err, "batch rejected");
            self.last_error = Some(err.to_string());
            return Err(err);
        }
        self.last_error = None;
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let spec = self.config.default_spec();
        let mut items = Vec::with_capacity(files.len());
        for file in files {
            let id = self.allocate_id();
            items.push(Item::new(id, file, spec));
        }
        let ids: Vec<ItemId> = items.iter().map(Item::id).collect();
        self.collection.extend(items);

        for &id in &ids {
            self.process(id);
        }
        for &id in &ids {
            self.start_upload(id);
        }

        tracing::info!(added = ids.len(), total = self.collection.len(), "batch ingested");
        self.notify();
        Ok(ids)
    }

    fn allocate_id(&mut self) -> ItemId {
        self.next_id += 1;
        ItemId(self.next_id)
    }

    fn process(&mut self, id: ItemId) {
        let Some(item) = self.collection.get(id) else {
            return;
        };
        let source = Arc::clone(&item.source);
        let spec = item.spec;
        self.collection
            .update(id, |item| item.status = ItemStatus::Processing);

        match self.encode_and_issue(&source, &spec) {
            Ok((result, handle)) => {
                self.collection.update(id, move |item| {
                    item.result = Some(result);
                    item.handle = Some(handle);
                    item.status = ItemStatus::Uploading;
                    item.progress = 0;
                });
            }
            Err(message) => {
                tracing::warn!(%id, file = source.name(), error = %message, "processing failed");
                self.collection.update(id, |item| item.fail(message));
            }
        }
    }

    fn encode_and_issue(&mut self, source: &SourceFile, spec: &TransformSpec) -> Result<(TransformResult, String), String> {
        let result = self.pipeline.run(source, spec).map_err(|e| e.to_string())?;
        let handle = self
            .handles
            .issue(&result.payload, result.media_type())
            .map_err(|e| e.to_string())?;
        tracing::debug!(%handle, "issued display handle");
        Ok((result, handle))
    }

    // =========================================================================
    // Uploads
    // =========================================================================

    fn start_upload(&mut self, id: ItemId) {
        let Some(item) = self.collection.get(id) else {
            return;
        };
        if item.status != ItemStatus::Uploading {
            return;
        }
        if let Some(result) = item.result.as_ref() {
            self.transport.begin(id, result);
            self.uploads.push(id);
        }
    }

    fn is_uploading(&self, id: ItemId) -> bool {
        self.collection
            .get(id)
            .is_some_and(|item| item.status == ItemStatus::Uploading)
    }

    /// Poll every in-flight upload once. Returns how many are still running.
    pub fn pump_uploads(&mut self) -> usize {
        for id in std::mem::take(&mut self.uploads) {
            match self.transport.poll(id) {
                UploadPoll::Progress(percent) => {
                    self.report_progress(id, percent);
                }
                UploadPoll::Done => {
                    self.report_progress(id, 100);
                }
                UploadPoll::Failed(err) => {
                    self.report_transport_error(id, err);
                }
            }
            if self.is_uploading(id) {
                self.uploads.push(id);
            }
        }
        self.uploads.len()
    }

    /// Poll until no upload is in flight.
    pub fn finish_uploads(&mut self) {
        while self.pump_uploads() > 0 {}
    }

    /// Record upload progress for `id`.
    ///
    /// Ignored (returns false) unless the item exists and is uploading.
    /// Progress never moves backwards; reaching 100 completes the item.
    pub fn report_progress(&mut self, id: ItemId, percent: u8) -> bool {
        if !self.is_uploading(id) {
            tracing::debug!(%id, percent, "ignoring progress for item that is not uploading");
            return false;
        }
        let percent = percent.min(100);
        if percent == 100 {
            self.uploads.retain(|u| *u != id);
            self.transport.cancel(id);
            self.collection.update(id, |item| {
                item.progress = 100;
                item.status = ItemStatus::Completed;
            });
            tracing::info!(%id, "upload complete");
        } else {
            self.collection
                .update(id, |item| item.progress = item.progress.max(percent));
        }
        true
    }

    /// Fail the upload for `id`. Ignored unless the item is uploading.
    pub fn report_transport_error(&mut self, id: ItemId, err: TransportError) -> bool {
        if !self.is_uploading(id) {
            tracing::debug!(%id, error = %err, "ignoring transport error for item that is not uploading");
            return false;
        }
        tracing::warn!(%id, error = %err, "upload failed");
        self.uploads.retain(|u| *u != id);
        self.transport.cancel(id);
        self.collection.update(id, |item| item.fail(err.to_string()));
        true
    }

    // =========================================================================
    // Re-transforms
    // =========================================================================

    /// Claim a re-transform of `id` with `spec`.
    ///
    /// The item must be `Completed`, or already processing an earlier
    /// request, which this one supersedes.
    pub fn begin_retransform(&mut self, id: ItemId, spec: TransformSpec) -> Result<RetransformTicket, LifecycleError> {
        spec.validate()?;
        let spec = spec.normalized();
        let item = self.collection.get(id).ok_or(LifecycleError::UnknownItem(id))?;
        let superseding = self.pending.contains_key(&id);
        if item.status != ItemStatus::Completed && !superseding {
            return Err(LifecycleError::NotReady {
                id,
                status: item.status,
            });
        }
        let source = Arc::clone(&item.source);

        self.next_generation += 1;
        let generation = self.next_generation;
        self.pending.insert(id, PendingRetransform { generation, spec });
        if !superseding {
            self.collection
                .update(id, |item| item.status = ItemStatus::Processing);
        }

        tracing::debug!(
            %id,
            generation,
            rotation = spec.rotation_degrees,
            square_crop = spec.square_crop,
            "re-transform requested"
        );
        Ok(RetransformTicket {
            id,
            generation,
            source,
            spec,
        })
    }

    /// Commit the outcome of a ticket's run.
    pub fn complete_retransform(
        &mut self,
        ticket: RetransformTicket,
        result: Result<TransformResult, PipelineError>,
    ) -> CommitOutcome {
        let id = ticket.id;
        if !self.collection.contains(id) {
            tracing::debug!(%id, "discarding result for removed item");
            return CommitOutcome::Discarded;
        }
        match self.pending.get(&id) {
            Some(pending) if pending.generation == ticket.generation => {}
            _ => {
                tracing::debug!(%id, generation = ticket.generation, "discarding superseded result");
                return CommitOutcome::Superseded;
            }
        }
        self.pending.remove(&id);

        let result = match result {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(%id, error = %err, "re-transform failed");
                self.collection.update(id, |item| item.fail(err.to_string()));
                return CommitOutcome::Failed;
            }
        };

        // Old handle goes first: one item never has two live handles
        if let Some(old) = self.collection.get(id).and_then(|item| item.handle.clone()) {
            self.handles.revoke(&old);
            tracing::debug!(handle = %old, "revoked display handle");
        }

        let outcome = match self.handles.issue(&result.payload, result.media_type()) {
            Ok(handle) => {
                tracing::info!(%id, %handle, width = result.width, height = result.height, "re-transform committed");
                let spec = ticket.spec;
                self.collection.update(id, move |item| {
                    item.spec = spec;
                    item.result = Some(result);
                    item.handle = Some(handle);
                    item.status = ItemStatus::Completed;
                    item.progress = 100;
                    item.error = None;
                });
                CommitOutcome::Committed
            }
            Err(err) => {
                tracing::warn!(%id, error = %err, "could not issue display handle");
                self.collection.update(id, |item| {
                    item.handle = None;
                    item.fail(err.to_string());
                });
                CommitOutcome::Failed
            }
        };
        self.notify();
        outcome
    }

    /// Re-transform `id` synchronously.
    pub fn retransform(&mut self, id: ItemId, spec: TransformSpec) -> Result<CommitOutcome, LifecycleError> {
        let ticket = self.begin_retransform(id, spec)?;
        let result = ticket.run(&self.pipeline);
        Ok(self.complete_retransform(ticket, result))
    }

    /// Rotate by `delta` degrees clockwise. `delta` must be a multiple of 90.
    pub fn rotate(&mut self, id: ItemId, delta: i32) -> Result<CommitOutcome, LifecycleError> {
        let spec = self.requested_spec(id)?.rotated_by(delta);
        self.retransform(id, spec)
    }

    pub fn set_rotation(&mut self, id: ItemId, degrees: i32) -> Result<CommitOutcome, LifecycleError> {
        let spec = self.requested_spec(id)?.with_rotation(degrees.rem_euclid(360));
        self.retransform(id, spec)
    }

    pub fn toggle_square_crop(&mut self, id: ItemId) -> Result<CommitOutcome, LifecycleError> {
        let spec = self.requested_spec(id)?;
        self.retransform(id, spec.with_square_crop(!spec.square_crop))
    }

    pub fn set_square_crop(&mut self, id: ItemId, square_crop: bool) -> Result<CommitOutcome, LifecycleError> {
        let spec = self.requested_spec(id)?.with_square_crop(square_crop);
        self.retransform(id, spec)
    }

    // =========================================================================
    // Collection edits
    // =========================================================================

    /// Make `id` the main image. Setting the current main is a no-op.
    pub fn set_main(&mut self, id: ItemId) -> Result<(), LifecycleError> {
        let item = self.collection.get(id).ok_or(LifecycleError::UnknownItem(id))?;
        if item.is_main {
            return Ok(());
        }
        self.collection.set_main(id);
        tracing::debug!(%id, "main image changed");
        self.notify();
        Ok(())
    }

    /// Remove `id`, revoking its handle and dropping any upload or
    /// re-transform in flight. Returns the removed item.
    pub fn remove(&mut self, id: ItemId) -> Result<Item, LifecycleError> {
        let Some(mut removed) = self.collection.remove(id) else {
            return Err(LifecycleError::UnknownItem(id));
        };
        if let Some(handle) = removed.handle.take() {
            self.handles.revoke(&handle);
            tracing::debug!(%handle, "revoked display handle");
        }
        self.pending.remove(&id);
        self.uploads.retain(|u| *u != id);
        self.transport.cancel(id);

        tracing::info!(%id, remaining = self.collection.len(), "image removed");
        self.notify();
        Ok(removed)
    }

    /// Remove every item, revoking all handles. Returns how many were
    /// removed; the callback fires once if any were.
    pub fn clear(&mut self) -> usize {
        let ids: Vec<ItemId> = self.collection.iter().map(Item::id).collect();
        for &id in &ids {
            if let Some(mut removed) = self.collection.remove(id) {
                if let Some(handle) = removed.handle.take() {
                    self.handles.revoke(&handle);
                }
            }
            self.transport.cancel(id);
        }
        self.pending.clear();
        self.uploads.clear();

        if !ids.is_empty() {
            tracing::info!(removed = ids.len(), "collection cleared");
            self.notify();
        }
        ids.len()
    }

    /// Handle and file name for saving the current output of `id`.
    pub fn download(&self, id: ItemId) -> Result<Download, LifecycleError> {
        let item = self.collection.get(id).ok_or(LifecycleError::UnknownItem(id))?;
        let handle = item.handle.clone().ok_or(LifecycleError::NoResult(id))?;
        Ok(Download {
            handle,
            display_name: item.display_name.clone(),
        })
    }

    fn notify(&mut self) {
        let handles = self.collection.handles();
        if let Some(callback) = self.on_change.as_mut() {
            callback(&handles);
        }
    }
}

impl<S, T> fmt::Debug for ImageManager<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageManager")
            .field("config", &self.config)
            .field("items", &self.collection.len())
            .field("version", &self.collection.version())
            .field("uploads", &self.uploads)
            .finish_non_exhaustive()
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
