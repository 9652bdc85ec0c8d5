//! Browser bindings for catalog-media-core.
//!
//! Most pages only need [`ImageUploader`], which owns the item collection
//! and hands out object URLs for previews. The free functions expose single
//! pipeline steps for custom editors.
//!
//! ```typescript
//! import init, { ImageUploader, FileBatch } from '@catalog-media/wasm';
//!
//! await init();
//! const uploader = new ImageUploader({ maxItems: 5 });
//! const batch = new FileBatch();
//! for (const file of input.files) {
//!   batch.push(file.name, file.type, new Uint8Array(await file.arrayBuffer()), file.size);
//! }
//! uploader.ingest(batch);
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod encode;
mod transform;
mod types;
mod uploader;

pub use decode::{decode_image, image_orientation, resize};
pub use encode::{encode_image, format_extension};
pub use transform::{apply_transform, output_dimensions, process_image, rotate_image, square_crop};
pub use types::JsRaster;
pub use uploader::{FileBatch, ImageUploader};

#[wasm_bindgen(start)]
pub fn init() {}

/// Crate version, for support logs.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
