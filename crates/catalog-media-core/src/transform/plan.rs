//! Geometry planning and composition for one pipeline pass.
//!
//! Planning is pure arithmetic on dimensions, so it can be checked without
//! touching pixels. Composition then follows the plan in three steps:
//!
//! 1. copy the crop rectangle out of the source,
//! 2. resample it to the pre-rotation target size (Lanczos3),
//! 3. rotate by the quarter turn, which may transpose the bounding box.
//!
//! Target height rounds half away from zero:
//! ```text
//! target_w = min(max_width, crop_w)
//! target_h = square ? target_w : round(target_w * crop_h / crop_w)
//! ```

use thiserror::Error;

use super::{apply_crop, rotate_quarter, CropRect, QuarterTurn, TransformSpec};
use crate::decode::{resize, DecodeError, DecodedImage, FilterType};

/// Errors that can occur while planning or composing a transform.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Rotation is not a whole number of quarter turns
    #[error("Rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i32),

    /// Maximum width of zero
    #[error("Maximum width must be greater than zero")]
    InvalidMaxWidth,

    /// Quality outside `[0, 1]`
    #[error("Quality must be within 0.0..=1.0, got {0}")]
    InvalidQuality(f32),

    /// Source raster has no pixels
    #[error("Cannot transform an empty {width}x{height} image")]
    EmptySource { width: u32, height: u32 },

    /// Resampling failed
    #[error(transparent)]
    Resample(#[from] DecodeError),
}

/// Every dimension a transform pass will produce, computed up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformPlan {
    /// Source rectangle to read.
    pub crop: CropRect,
    /// Width the crop is scaled to, before rotation.
    pub target_width: u32,
    /// Height the crop is scaled to, before rotation.
    pub target_height: u32,
    /// Normalized rotation.
    pub rotation: QuarterTurn,
    /// Width of the final raster.
    pub output_width: u32,
    /// Height of the final raster.
    pub output_height: u32,
}

/// Work out crop, scale and rotation for a `src_width x src_height` source.
///
/// # Errors
///
/// Fails for an invalid spec or a zero-area source.
pub fn plan_transform(
    src_width: u32,
    src_height: u32,
    spec: &TransformSpec,
) -> Result<TransformPlan, TransformError> {
    if src_width == 0 || src_height == 0 {
        return Err(TransformError::EmptySource {
            width: src_width,
            height: src_height,
        });
    }
    if spec.max_width == 0 {
        return Err(TransformError::InvalidMaxWidth);
    }
    let rotation = spec.quarter_turn()?;

    let crop = if spec.square_crop {
        CropRect::centered_square(src_width, src_height)
    } else {
        CropRect::full(src_width, src_height)
    };

    let target_width = spec.max_width.min(crop.width);
    let target_height = if spec.square_crop {
        target_width
    } else {
        let scaled = target_width as f64 * crop.height as f64 / crop.width as f64;
        (scaled.round() as u32).max(1)
    };

    let (output_width, output_height) = rotation.rotated_dimensions(target_width, target_height);

    Ok(TransformPlan {
        crop,
        target_width,
        target_height,
        rotation,
        output_width,
        output_height,
    })
}

/// Crop, scale and rotate `image` according to `spec`.
///
/// Encoding parameters in `spec` are ignored here.
pub fn apply_transform(image: &DecodedImage, spec: &TransformSpec) -> Result<DecodedImage, TransformError> {
    let plan = plan_transform(image.width, image.height, spec)?;

    let cropped = apply_crop(image, plan.crop);
    let scaled = resize(
        &cropped,
        plan.target_width,
        plan.target_height,
        FilterType::Lanczos3,
    )?;
    let rotated = rotate_quarter(&scaled, plan.rotation);

    debug_assert_eq!(
        (rotated.width, rotated.height),
        (plan.output_width, plan.output_height)
    );
    Ok(rotated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::TargetFormat;
    use crate::test_helpers::{gradient, quadrants, BLUE, RED};

    fn spec(max_width: u32) -> TransformSpec {
        TransformSpec::new(max_width, 0.85, TargetFormat::Png)
    }

    fn dims(plan: &TransformPlan) -> (u32, u32) {
        (plan.output_width, plan.output_height)
    }

    #[test]
    fn test_landscape_downscale() {
        // 4000x3000, max 1280, no crop, no rotation
        let plan = plan_transform(4000, 3000, &spec(1280)).unwrap();
        assert_eq!(dims(&plan), (1280, 960));
        assert!(plan.crop.is_full(4000, 3000));
    }

    #[test]
    fn test_square_crop_capped_by_short_side() {
        // 800x600, square, max 1280
        let plan = plan_transform(800, 600, &spec(1280).with_square_crop(true)).unwrap();
        assert_eq!(dims(&plan), (600, 600));
        assert_eq!(plan.crop, CropRect::centered_square(800, 600));
    }

    #[test]
    fn test_rotation_swaps_output() {
        // 1000x2000, rotate 90, max 500
        let plan = plan_transform(1000, 2000, &spec(500).with_rotation(90)).unwrap();
        assert_eq!((plan.target_width, plan.target_height), (500, 1000));
        assert_eq!(dims(&plan), (1000, 500));
    }

    #[test]
    fn test_no_upscale() {
        let plan = plan_transform(300, 200, &spec(1280)).unwrap();
        assert_eq!(dims(&plan), (300, 200));
    }

    #[test]
    fn test_height_rounds() {
        // 1000x333 at 500 wide: 166.5 rounds up
        let plan = plan_transform(1000, 333, &spec(500)).unwrap();
        assert_eq!(plan.target_height, 167);
    }

    #[test]
    fn test_extreme_aspect_keeps_one_pixel() {
        let plan = plan_transform(10_000, 1, &spec(100)).unwrap();
        assert_eq!(dims(&plan), (100, 1));
    }

    #[test]
    fn test_negative_rotation_normalizes() {
        let plan = plan_transform(400, 100, &spec(1000).with_rotation(-90)).unwrap();
        assert_eq!(plan.rotation, QuarterTurn::Cw270);
        assert_eq!(dims(&plan), (100, 400));
    }

    #[test]
    fn test_plan_rejects_invalid_input() {
        assert!(matches!(
            plan_transform(0, 10, &spec(10)),
            Err(TransformError::EmptySource { .. })
        ));
        assert!(matches!(
            plan_transform(10, 10, &spec(0)),
            Err(TransformError::InvalidMaxWidth)
        ));
        assert!(matches!(
            plan_transform(10, 10, &spec(10).with_rotation(30)),
            Err(TransformError::InvalidRotation(30))
        ));
    }

    #[test]
    fn test_apply_matches_plan() {
        let img = gradient(120, 80);
        let square = spec(60).with_rotation(270).with_square_crop(true);
        let out = apply_transform(&img, &square).unwrap();
        assert_eq!((out.width, out.height), (60, 60));

        let turned = spec(60).with_rotation(90);
        let out = apply_transform(&img, &turned).unwrap();
        assert_eq!((out.width, out.height), (40, 60));
    }

    #[test]
    fn test_apply_identity_is_exact() {
        let img = gradient(30, 20);
        let out = apply_transform(&img, &spec(100)).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_apply_rotates_content_clockwise() {
        let out = apply_transform(&quadrants(), &spec(10).with_rotation(90)).unwrap();
        // Bottom-left of the source becomes top-left
        assert_eq!(out.pixel(0, 0), BLUE);
        assert_eq!(out.pixel(1, 0), RED);
    }

    #[test]
    fn test_apply_square_crop_takes_center() {
        // 3x1: left and right pixels fall outside the 1x1 center
        let pixels = [[0, 0, 0, 255], [9, 9, 9, 255], [0, 0, 0, 255]].concat();
        let img = DecodedImage::new(3, 1, pixels);
        let out = apply_transform(&img, &spec(10).with_square_crop(true)).unwrap();
        assert_eq!((out.width, out.height), (1, 1));
        assert_eq!(out.pixel(0, 0), [9, 9, 9, 255]);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::encode::TargetFormat;
    use proptest::prelude::*;

    fn rotation_strategy() -> impl Strategy<Value = i32> {
        prop_oneof![Just(0), Just(90), Just(180), Just(270)]
    }

    fn spec(max_width: u32, rotation: i32, square: bool) -> TransformSpec {
        TransformSpec::new(max_width, 0.85, TargetFormat::Jpeg)
            .with_rotation(rotation)
            .with_square_crop(square)
    }

    proptest! {
        /// Property: with no rotation and no crop, width is min(max, src) and height is proportional.
        #[test]
        fn prop_identity_dimensions(
            w in 1u32..=8000,
            h in 1u32..=8000,
            max in 1u32..=4000,
        ) {
            let plan = plan_transform(w, h, &spec(max, 0, false)).unwrap();
            let expected_w = max.min(w);
            let expected_h = ((expected_w as f64 * h as f64 / w as f64).round() as u32).max(1);
            prop_assert_eq!((plan.output_width, plan.output_height), (expected_w, expected_h));
            if max >= w {
                prop_assert_eq!((plan.output_width, plan.output_height), (w, h));
            }
        }

        /// Property: square crop always yields min(max, min(w, h)) on both sides.
        #[test]
        fn prop_square_crop_invariant(
            w in 1u32..=8000,
            h in 1u32..=8000,
            max in 1u32..=4000,
            rotation in rotation_strategy(),
        ) {
            let plan = plan_transform(w, h, &spec(max, rotation, true)).unwrap();
            let side = max.min(w.min(h));
            prop_assert_eq!(plan.output_width, side);
            prop_assert_eq!(plan.output_height, side);
        }

        /// Property: output width before rotation never exceeds the source width.
        #[test]
        fn prop_no_upscaling(
            w in 1u32..=4000,
            h in 1u32..=4000,
            max in 1u32..=8000,
            square in any::<bool>(),
        ) {
            let plan = plan_transform(w, h, &spec(max, 0, square)).unwrap();
            prop_assert!(plan.target_width <= w);
            prop_assert!(plan.target_width <= max);
        }

        /// Property: rotating by r and then by 360 - r from the same source restores the orientation.
        #[test]
        fn prop_rotation_round_trip(
            w in 1u32..=4000,
            h in 1u32..=4000,
            max in 1u32..=4000,
            r in prop_oneof![Just(90), Just(180), Just(270)],
        ) {
            let base = spec(max, 0, false);
            let original = plan_transform(w, h, &base).unwrap();
            let turned = base.rotated_by(r);
            let restored = plan_transform(w, h, &turned.rotated_by(360 - r)).unwrap();
            prop_assert_eq!(
                (restored.output_width, restored.output_height),
                (original.output_width, original.output_height)
            );
        }

        /// Property: the crop rectangle always lies inside the source.
        #[test]
        fn prop_crop_within_source(
            w in 1u32..=8000,
            h in 1u32..=8000,
            square in any::<bool>(),
        ) {
            let plan = plan_transform(w, h, &spec(100, 0, square)).unwrap();
            prop_assert!(plan.crop.fits_within(w, h));
            prop_assert!(plan.crop.width >= 1 && plan.crop.height >= 1);
        }
    }
}
