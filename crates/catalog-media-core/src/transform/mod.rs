//! Geometric transforms for product photos: square crop, downscale, rotation.
//!
//! # Transform Order
//!
//! One pass always runs in this order:
//! 1. Centered square crop (optional)
//! 2. Aspect-preserving downscale to the maximum width
//! 3. Clockwise quarter-turn rotation
//!
//! # Coordinate System
//!
//! - Crop rectangles are in source pixels, origin top-left
//! - Positive rotation is clockwise on screen

mod crop;
mod plan;
mod rotation;
mod spec;

pub use crop::{apply_crop, CropRect};
pub use plan::{apply_transform, plan_transform, TransformError, TransformPlan};
pub use rotation::{rotate_quarter, QuarterTurn};
pub use spec::TransformSpec;
