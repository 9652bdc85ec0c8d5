//! WASM bindings for the geometric transforms.
//!
//! These run one step of the pipeline on an already decoded image, for
//! previews. The full decode-transform-encode pass is [`process_image`].

use crate::types::JsRaster;
use catalog_media_core::encode::TargetFormat;
use catalog_media_core::ingest::{Pipeline, SourceFile};
use catalog_media_core::transform::{
    apply_crop, apply_transform as core_transform, plan_transform, rotate_quarter, CropRect, QuarterTurn,
    TransformSpec,
};
use wasm_bindgen::prelude::*;

fn spec(max_width: u32, rotation_degrees: i32, square_crop: bool) -> TransformSpec {
    TransformSpec::new(max_width, 1.0, TargetFormat::Png)
        .with_rotation(rotation_degrees)
        .with_square_crop(square_crop)
}

/// Rotate clockwise by a multiple of 90 degrees. Other angles return
/// `undefined`.
#[wasm_bindgen]
pub fn rotate_image(image: &JsRaster, degrees: i32) -> Option<JsRaster> {
    let turn = QuarterTurn::from_degrees(degrees)?;
    let src = image.to_decoded()?;
    Some(JsRaster::from_decoded(rotate_quarter(&src, turn)))
}

/// Crop to the centered square on the shorter side.
#[wasm_bindgen]
pub fn square_crop(image: &JsRaster) -> Option<JsRaster> {
    let src = image.to_decoded()?;
    let rect = CropRect::centered_square(src.width, src.height);
    Some(JsRaster::from_decoded(apply_crop(&src, rect)))
}

/// Output `[width, height]` a pass would produce, without touching pixels.
///
/// # Errors
///
/// Returns an error for a zero dimension or a rotation that is not a
/// multiple of 90.
#[wasm_bindgen]
pub fn output_dimensions(
    width: u32,
    height: u32,
    max_width: u32,
    rotation_degrees: i32,
    square_crop: bool,
) -> Result<Vec<u32>, JsValue> {
    let plan = plan_transform(width, height, &spec(max_width, rotation_degrees, square_crop))
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(vec![plan.output_width, plan.output_height])
}

/// Crop, downscale and rotate a decoded image.
///
/// # Errors
///
/// Returns an error for an invalid rotation, a zero `max_width` or a
/// malformed image.
#[wasm_bindgen]
pub fn apply_transform(
    image: &JsRaster,
    max_width: u32,
    rotation_degrees: i32,
    square_crop: bool,
) -> Result<JsRaster, JsValue> {
    let src = image
        .to_decoded()
        .ok_or_else(|| JsValue::from_str("Pixel buffer does not match dimensions"))?;
    core_transform(&src, &spec(max_width, rotation_degrees, square_crop))
        .map(JsRaster::from_decoded)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Run the whole pipeline on file bytes and return the encoded payload.
///
/// `spec` is an object such as
/// `{ maxWidth: 1280, quality: 0.85, targetFormat: 'webp', rotationDegrees: 0, squareCrop: false }`.
///
/// # Errors
///
/// Returns an error for a malformed spec or a file that cannot be decoded.
#[wasm_bindgen]
pub fn process_image(bytes: &[u8], media_type: &str, spec: JsValue) -> Result<Vec<u8>, JsValue> {
    let spec: TransformSpec =
        serde_wasm_bindgen::from_value(spec).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let source = SourceFile::new("upload", media_type, bytes);
    let result = Pipeline::new()
        .run(&source, &spec)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(result.payload.to_vec())
}
