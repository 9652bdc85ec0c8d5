//! Upload transport seam.
//!
//! The manager starts an upload once an item is encoded and then polls the
//! transport for progress. A real network client plugs in here. The
//! bundled [`SimulatedTransport`] advances by a fixed step per poll.

use std::collections::HashMap;

use thiserror::Error;

use super::{ItemId, TransformResult};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Upload failed: {0}")]
    Failed(String),

    #[error("No upload in progress for item {0}")]
    NotStarted(ItemId),
}

/// State of one upload after a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPoll {
    /// Still running, percent complete below 100.
    Progress(u8),
    Done,
    Failed(TransportError),
}

pub trait UploadTransport {
    /// Start sending `result` for `id`.
    fn begin(&mut self, id: ItemId, result: &TransformResult);

    /// Advance and report the upload for `id`.
    fn poll(&mut self, id: ItemId) -> UploadPoll;

    /// Drop the upload for `id`, if any.
    fn cancel(&mut self, id: ItemId);
}

/// Reports `step`, `2 * step`, ... and finishes once 100 is reached.
#[derive(Debug)]
pub struct SimulatedTransport {
    step: u8,
    in_flight: HashMap<ItemId, u8>,
}

impl SimulatedTransport {
    /// `step` is clamped into `1..=100`.
    pub fn new(step: u8) -> Self {
        Self {
            step: step.clamp(1, 100),
            in_flight: HashMap::new(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(10)
    }
}

impl UploadTransport for SimulatedTransport {
    fn begin(&mut self, id: ItemId, result: &TransformResult) {
        tracing::debug!(%id, bytes = result.byte_len(), "simulated upload started");
        self.in_flight.insert(id, 0);
    }

    fn poll(&mut self, id: ItemId) -> UploadPoll {
        let Some(progress) = self.in_flight.get_mut(&id) else {
            return UploadPoll::Failed(TransportError::NotStarted(id));
        };
        *progress = progress.saturating_add(self.step).min(100);
        if *progress == 100 {
            self.in_flight.remove(&id);
            UploadPoll::Done
        } else {
            UploadPoll::Progress(*progress)
        }
    }

    fn cancel(&mut self, id: ItemId) {
        self.in_flight.remove(&id);
    }
}
