//! Keystone Core - Crop-inside-perspective geometry
//!
//! This crate keeps a user-controlled crop rectangle inside the part of an
//! image that still has pixel data after a perspective correction, a fine
//! straighten rotation, a horizontal flip and 90° rotation steps.
//!
//! The pieces, bottom-up:
//!
//! - `space` - texture vs. logical coordinates and the 90° axis remap
//! - `perspective` - the 3×3 sampling matrix and the projected image quad
//! - `constraint` - rectangle-in-quad tests, ray scaling and UV validation
//! - `damping` - smoothing for view zoom changes
//! - `controller` - the interaction state machine hosts talk to

pub mod config;
pub mod constraint;
pub mod controller;
pub mod crop;
pub mod damping;
pub mod error;
pub mod perspective;
pub mod quad;
pub mod space;

pub use config::InteractionConfig;
pub use constraint::{constrain_rect_to_uv_bounds, is_inside, min_scale_to_fit};
pub use controller::{
    CommitRecord, CropController, FrameDescriptor, InteractionState, SessionMode, ViewTransform,
    Viewport,
};
pub use crop::{CropBox, CropHandle, PixelRect};
pub use error::CropError;
pub use perspective::{AxisRemap, ProjectionMatrix};
pub use quad::Quad;
pub use space::{Logical, NormalisedRect, Point, RotateSteps, Texture};

/// Tolerance below which two parameter sets count as equal.
const PARAM_EPSILON: f64 = 1e-6;

/// Perspective and orientation inputs, as the sliders report them.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PerspectiveParams {
    /// Vertical keystone (-1 to 1, ±20° tilt at the ends)
    pub vertical: f64,
    /// Horizontal keystone (-1 to 1)
    pub horizontal: f64,
    /// Fine rotation in degrees
    pub straighten_degrees: f64,
    /// Mirror around the vertical axis
    pub flip_horizontal: bool,
    /// Quarter turns clockwise (0 to 3)
    pub rotate_steps: RotateSteps,
}

impl PerspectiveParams {
    /// Create parameters with no correction applied
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all values are at their defaults
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// True if any value differs from `other` by more than 1e-6.
    pub fn differs_from(&self, other: &PerspectiveParams) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= PARAM_EPSILON;
        !(close(self.vertical, other.vertical)
            && close(self.horizontal, other.horizontal)
            && close(self.straighten_degrees, other.straighten_degrees)
            && self.flip_horizontal == other.flip_horizontal
            && self.rotate_steps == other.rotate_steps)
    }
}
