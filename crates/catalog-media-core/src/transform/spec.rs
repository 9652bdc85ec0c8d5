//! The parameter set for one pipeline pass.

use serde::{Deserialize, Serialize};

use super::{QuarterTurn, TransformError};
use crate::encode::TargetFormat;

/// Geometric and encoding parameters applied in one pass.
///
/// Immutable per run: changing rotation or the crop toggle builds a new
/// value with [`TransformSpec::with_rotation`] or
/// [`TransformSpec::with_square_crop`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformSpec {
    /// Output width ceiling in pixels. Never upscales.
    pub max_width: u32,
    /// Lossy encode quality in `[0, 1]`.
    pub quality: f32,
    pub target_format: TargetFormat,
    /// Clockwise rotation; any multiple of 90.
    pub rotation_degrees: i32,
    /// Crop to the centered square before scaling.
    pub square_crop: bool,
}

impl TransformSpec {
    /// A spec with no rotation and no crop.
    pub fn new(max_width: u32, quality: f32, target_format: TargetFormat) -> Self {
        Self {
            max_width,
            quality,
            target_format,
            rotation_degrees: 0,
            square_crop: false,
        }
    }

    /// Copy with an absolute rotation.
    pub fn with_rotation(self, rotation_degrees: i32) -> Self {
        Self {
            rotation_degrees,
            ..self
        }
    }

    /// Copy with the rotation advanced by `delta` degrees, normalized into `[0, 360)`.
    pub fn rotated_by(self, delta: i32) -> Self {
        let current = self.rotation_degrees.rem_euclid(360);
        self.with_rotation((current + delta.rem_euclid(360)).rem_euclid(360))
    }

    /// Copy with the rotation folded into `[0, 360)`.
    pub fn normalized(self) -> Self {
        self.with_rotation(self.rotation_degrees.rem_euclid(360))
    }

    /// Copy with the square crop toggle set.
    pub fn with_square_crop(self, square_crop: bool) -> Self {
        Self {
            square_crop,
            ..self
        }
    }

    /// The rotation as a quarter turn.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidRotation` for angles that are not a
    /// multiple of 90.
    pub fn quarter_turn(&self) -> Result<QuarterTurn, TransformError> {
        QuarterTurn::from_degrees(self.rotation_degrees)
            .ok_or(TransformError::InvalidRotation(self.rotation_degrees))
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.max_width == 0 {
            return Err(TransformError::InvalidMaxWidth);
        }
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(TransformError::InvalidQuality(self.quality));
        }
        self.quarter_turn().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> TransformSpec {
        TransformSpec::new(1280, 0.85, TargetFormat::WebP)
    }

    #[test]
    fn test_new_has_no_rotation_or_crop() {
        let spec = base();
        assert_eq!(spec.rotation_degrees, 0);
        assert!(!spec.square_crop);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_builders_do_not_mutate_original() {
        let spec = base();
        let rotated = spec.with_rotation(90).with_square_crop(true);
        assert_eq!(spec.rotation_degrees, 0);
        assert_eq!(rotated.rotation_degrees, 90);
        assert!(rotated.square_crop);
    }

    #[test]
    fn test_rotated_by_wraps() {
        let spec = base().with_rotation(270);
        assert_eq!(spec.rotated_by(90).rotation_degrees, 0);
        assert_eq!(spec.rotated_by(-360).rotation_degrees, 270);
        assert_eq!(base().rotated_by(-90).rotation_degrees, 270);
    }

    #[test]
    fn test_rotated_by_extreme_deltas() {
        // 2_147_483_610 is 90 mod 360
        let spec = base().with_rotation(90);
        assert_eq!(spec.rotated_by(2_147_483_610).rotation_degrees, 180);
        assert_eq!(base().with_rotation(i32::MAX).rotated_by(i32::MAX).rotation_degrees, 254);
        assert_eq!(base().rotated_by(i32::MIN).rotation_degrees, 232);
    }

    #[test]
    fn test_normalized_folds_rotation() {
        assert_eq!(base().with_rotation(450).normalized().rotation_degrees, 90);
        assert_eq!(base().with_rotation(-90).normalized().rotation_degrees, 270);
        assert_eq!(base().with_rotation(180).normalized(), base().with_rotation(180));
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        assert!(matches!(
            TransformSpec::new(0, 0.5, TargetFormat::Png).validate(),
            Err(TransformError::InvalidMaxWidth)
        ));
        assert!(matches!(
            TransformSpec::new(10, 1.5, TargetFormat::Png).validate(),
            Err(TransformError::InvalidQuality(_))
        ));
        assert!(matches!(
            TransformSpec::new(10, f32::NAN, TargetFormat::Png).validate(),
            Err(TransformError::InvalidQuality(_))
        ));
        assert!(matches!(
            base().with_rotation(45).validate(),
            Err(TransformError::InvalidRotation(45))
        ));
    }

    #[test]
    fn test_negative_multiple_of_90_is_valid() {
        assert_eq!(base().with_rotation(-90).quarter_turn().unwrap(), QuarterTurn::Cw270);
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = r#"{"maxWidth":800,"quality":0.5,"targetFormat":"jpeg","rotationDegrees":180,"squareCrop":true}"#;
        let spec: TransformSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.max_width, 800);
        assert_eq!(spec.target_format, TargetFormat::Jpeg);
        assert_eq!(spec.rotation_degrees, 180);
        assert!(spec.square_crop);
    }
}
