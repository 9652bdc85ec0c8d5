//! Image uploader WASM bindings.
//!
//! [`ImageUploader`] wraps the core manager for a browser page. Display
//! handles are object URLs, so they can go straight into `<img src>`.
//!
//! # Example
//!
//! ```typescript
//! import { ImageUploader, FileBatch } from '@catalog-media/wasm';
//!
//! const uploader = new ImageUploader({ maxItems: 5, targetFormat: 'webp' });
//! uploader.on_change((urls: string[]) => renderGallery(urls));
//!
//! const batch = new FileBatch();
//! for (const file of input.files) {
//!   batch.push(file.name, file.type, new Uint8Array(await file.arrayBuffer()), file.size);
//! }
//! try {
//!   uploader.ingest(batch);
//! } catch (message) {
//!   showError(message);
//! }
//! const timer = setInterval(() => uploader.pump_uploads() || clearInterval(timer), 100);
//! ```

use std::sync::Arc;

use catalog_media_core::ingest::{
    CommitOutcome, HandleError, HandleStore, ImageManager, IngestConfig, ItemId, ItemSummary, LifecycleError,
    SimulatedTransport, SourceFile, TransportError,
};
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, Url};

/// Handle store backed by `URL.createObjectURL`.
#[derive(Debug, Default)]
pub(crate) struct ObjectUrlStore;

impl HandleStore for ObjectUrlStore {
    fn issue(&mut self, payload: &Arc<[u8]>, media_type: &str) -> Result<String, HandleError> {
        let bytes = js_sys::Uint8Array::from(&payload[..]);
        let parts = js_sys::Array::of1(&bytes);
        let options = BlobPropertyBag::new();
        options.set_type(media_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(js_error)?;
        Url::create_object_url_with_blob(&blob).map_err(js_error)
    }

    fn revoke(&mut self, handle: &str) {
        // Revoking an unknown URL is a no-op in every browser
        let _ = Url::revoke_object_url(handle);
    }
}

fn js_error(value: JsValue) -> HandleError {
    HandleError(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

/// Files selected together, validated as one unit.
#[wasm_bindgen]
#[derive(Default)]
pub struct FileBatch {
    files: Vec<SourceFile>,
}

#[wasm_bindgen]
impl FileBatch {
    #[wasm_bindgen(constructor)]
    pub fn new() -> FileBatch {
        FileBatch::default()
    }

    /// Add a file. `size` is the size the browser reported; when omitted the
    /// byte length is used.
    pub fn push(&mut self, name: &str, media_type: &str, bytes: Vec<u8>, size: Option<f64>) {
        let mut file = SourceFile::new(name, media_type, bytes);
        if let Some(size) = size {
            file = file.with_declared_size(size.max(0.0) as u64);
        }
        self.files.push(file);
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.files.len()
    }
}

/// A managed collection of product images.
#[wasm_bindgen]
pub struct ImageUploader {
    inner: ImageManager<ObjectUrlStore, SimulatedTransport>,
}

#[wasm_bindgen]
impl ImageUploader {
    /// Create an uploader. `config` is an optional object with any of
    /// `maxItems`, `maxFileSizeMb`, `acceptedMediaTypes`, `targetFormat`,
    /// `defaultQuality`, `maxWidth`, `defaultSquareCrop`, `uploadStep`.
    ///
    /// # Errors
    ///
    /// Returns an error if a field has the wrong type or is out of range.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ImageUploader, JsValue> {
        let config: IngestConfig = if config.is_undefined() || config.is_null() {
            IngestConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        let transport = SimulatedTransport::new(config.upload_step);
        let inner = ImageManager::with_parts(config, ObjectUrlStore, transport)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(ImageUploader { inner })
    }

    /// Register `callback(urls: string[])`, called after items are added,
    /// removed, re-processed or the main image changes.
    pub fn on_change(&mut self, callback: js_sys::Function) {
        self.inner.set_on_change(move |handles| {
            let urls: js_sys::Array = handles.iter().map(|h| JsValue::from_str(h)).collect();
            if let Err(err) = callback.call1(&JsValue::NULL, &urls) {
                web_sys::console::error_2(&JsValue::from_str("change callback threw"), &err);
            }
        });
    }

    /// Validate and process a batch. Returns the new item ids.
    ///
    /// # Errors
    ///
    /// Throws the validation message if any file is rejected; nothing is
    /// added in that case.
    pub fn ingest(&mut self, batch: FileBatch) -> Result<Vec<u32>, JsValue> {
        let ids = self
            .inner
            .ingest(batch.files)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        ids.into_iter()
            .map(|id| to_js_id(id).ok_or_else(|| JsValue::from_str(&format!("Image id {id} exceeds the u32 range"))))
            .collect()
    }

    /// Advance every upload one step. Returns how many are still running.
    pub fn pump_uploads(&mut self) -> usize {
        self.inner.pump_uploads()
    }

    pub fn report_progress(&mut self, id: u32, percent: u8) -> bool {
        self.inner.report_progress(from_js_id(id), percent)
    }

    pub fn report_upload_error(&mut self, id: u32, message: &str) -> bool {
        self.inner
            .report_transport_error(from_js_id(id), TransportError::Failed(message.to_string()))
    }

    /// Rotate clockwise by `delta` degrees. Returns true if the new result
    /// was committed.
    pub fn rotate(&mut self, id: u32, delta: i32) -> Result<bool, JsValue> {
        committed(self.inner.rotate(from_js_id(id), delta))
    }

    pub fn set_rotation(&mut self, id: u32, degrees: i32) -> Result<bool, JsValue> {
        committed(self.inner.set_rotation(from_js_id(id), degrees))
    }

    pub fn toggle_square_crop(&mut self, id: u32) -> Result<bool, JsValue> {
        committed(self.inner.toggle_square_crop(from_js_id(id)))
    }

    pub fn set_square_crop(&mut self, id: u32, square_crop: bool) -> Result<bool, JsValue> {
        committed(self.inner.set_square_crop(from_js_id(id), square_crop))
    }

    pub fn set_main(&mut self, id: u32) -> Result<(), JsValue> {
        self.inner
            .set_main(from_js_id(id))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn remove(&mut self, id: u32) -> Result<(), JsValue> {
        self.inner
            .remove(from_js_id(id))
            .map(|_| ())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Remove every item and revoke every object URL.
    pub fn clear(&mut self) -> usize {
        self.inner.clear()
    }

    /// `{ handle, displayName }` for saving an item.
    pub fn download(&self, id: u32) -> Result<JsValue, JsValue> {
        let download = self
            .inner
            .download(from_js_id(id))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_wasm_bindgen::to_value(&download).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Plain objects describing every item, in insertion order.
    pub fn items(&self) -> Result<JsValue, JsValue> {
        let items: Vec<ItemSummary> = self.inner.items().iter().map(|item| item.summary()).collect();
        serde_wasm_bindgen::to_value(&items).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Object URLs of every processed item, in insertion order.
    pub fn handles(&self) -> Vec<String> {
        self.inner.handles()
    }

    #[wasm_bindgen(getter)]
    pub fn main_id(&self) -> Option<u32> {
        self.inner.main_item().and_then(|item| to_js_id(item.id()))
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }

    /// Changes whenever the collection does.
    #[wasm_bindgen(getter)]
    pub fn version(&self) -> f64 {
        self.inner.version() as f64
    }

    /// Message of the most recently rejected batch.
    #[wasm_bindgen(getter)]
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error().map(str::to_string)
    }
}

impl Drop for ImageUploader {
    fn drop(&mut self) {
        self.inner.clear_on_change();
        self.inner.clear();
    }
}

fn committed(outcome: Result<CommitOutcome, LifecycleError>) -> Result<bool, JsValue> {
    outcome
        .map(|o| o == CommitOutcome::Committed)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// JavaScript sees ids as `u32`. `None` once the counter outgrows that.
fn to_js_id(id: ItemId) -> Option<u32> {
    u32::try_from(id.0).ok()
}

fn from_js_id(id: u32) -> ItemId {
    ItemId(u64::from(id))
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = crate::types::JsRaster::new(width, height, vec![180u8; (width * height * 4) as usize]);
        crate::encode::encode_image(&image, "png", 1.0).unwrap()
    }

    fn batch(count: usize) -> FileBatch {
        let mut batch = FileBatch::new();
        for i in 0..count {
            batch.push(&format!("{i}.png"), "image/png", png(30, 20), None);
        }
        batch
    }

    #[wasm_bindgen_test]
    fn test_object_urls_are_blob_urls() {
        let mut store = ObjectUrlStore;
        let payload: Arc<[u8]> = Arc::from(&png(2, 2)[..]);
        let url = store.issue(&payload, "image/png").unwrap();
        assert!(url.starts_with("blob:"));
        store.revoke(&url);
    }

    #[wasm_bindgen_test]
    fn test_ingest_rotate_remove() {
        let mut uploader = ImageUploader::new(JsValue::UNDEFINED).unwrap();
        let seen = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&seen);
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |_urls: JsValue| *counter.borrow_mut() += 1);
        uploader.on_change(callback.as_ref().unchecked_ref::<js_sys::Function>().clone());
        callback.forget();

        let ids = uploader.ingest(batch(2)).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(*seen.borrow(), 1);
        while uploader.pump_uploads() > 0 {}

        let before = uploader.handles();
        assert!(uploader.rotate(ids[0], 90).unwrap());
        assert_ne!(uploader.handles()[0], before[0]);

        uploader.set_main(ids[1]).unwrap();
        assert_eq!(uploader.main_id(), Some(ids[1]));

        uploader.remove(ids[1]).unwrap();
        assert_eq!(uploader.main_id(), Some(ids[0]));
        assert_eq!(*seen.borrow(), 4);
    }

    #[wasm_bindgen_test]
    fn test_capacity_error_is_thrown() {
        let config = serde_wasm_bindgen::to_value(&IngestConfig::builder().max_items(1).build().unwrap()).unwrap();
        let mut uploader = ImageUploader::new(config).unwrap();
        let err = uploader.ingest(batch(2)).unwrap_err();
        assert_eq!(err.as_string().unwrap(), "You can add at most 1 images");
        assert_eq!(uploader.length(), 0);
        assert!(uploader.last_error().is_some());
    }

    #[wasm_bindgen_test]
    fn test_invalid_config_is_rejected() {
        let mut config = IngestConfig::default();
        config.max_width = 0;
        let value = serde_wasm_bindgen::to_value(&config).unwrap();
        assert!(ImageUploader::new(value).is_err());
    }
}
