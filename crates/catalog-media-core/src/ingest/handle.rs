//! Revocable display handles for encoded payloads.
//!
//! A handle is an opaque string (in a browser, an object URL) that resolves
//! to one payload until it is revoked. The manager revokes a handle before
//! its item is dropped or its result is replaced, so a store never holds a
//! payload nobody can reach.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Could not create a display handle: {0}")]
pub struct HandleError(pub String);

/// Issues and revokes display handles.
pub trait HandleStore {
    /// Register `payload` and return a fresh handle for it.
    fn issue(&mut self, payload: &Arc<[u8]>, media_type: &str) -> Result<String, HandleError>;

    /// Release `handle`. Unknown or already revoked handles are ignored.
    fn revoke(&mut self, handle: &str);
}

/// In-process store. Handles look like `mem:<n>` and are never reused.
#[derive(Debug, Default)]
pub struct MemoryHandleStore {
    next: u64,
    live: HashMap<String, (Arc<[u8]>, String)>,
    revoked: Vec<String>,
}

impl MemoryHandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload and media type behind a live handle.
    pub fn resolve(&self, handle: &str) -> Option<(&[u8], &str)> {
        self.live
            .get(handle)
            .map(|(payload, media_type)| (&payload[..], media_type.as_str()))
    }

    pub fn is_live(&self, handle: &str) -> bool {
        self.live.contains_key(handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Every handle revoked so far, oldest first.
    pub fn revoked(&self) -> &[String] {
        &self.revoked
    }
}

impl HandleStore for MemoryHandleStore {
    fn issue(&mut self, payload: &Arc<[u8]>, media_type: &str) -> Result<String, HandleError> {
        self.next += 1;
        let handle = format!("mem:{}", self.next);
        self.live
            .insert(handle.clone(), (Arc::clone(payload), media_type.to_string()));
        Ok(handle)
    }

    fn revoke(&mut self, handle: &str) {
        if self.live.remove(handle).is_some() {
            self.revoked.push(handle.to_string());
        }
    }
}
