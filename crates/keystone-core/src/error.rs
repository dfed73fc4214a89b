//! Error types for crop interaction.
//!
//! Only configuration problems are reported as errors. Numeric edge cases
//! that show up transiently while a slider sweeps (near-zero homogeneous
//! denominators, non-finite scales) are guarded where they occur and never
//! surface here.

use thiserror::Error;

use crate::controller::SessionMode;

/// Error types for crop controller operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CropError {
    /// A session was requested while the crop box has no usable size.
    #[error("Baseline crop has no area ({width} x {height})")]
    DegenerateBaseline {
        /// Crop width at session start.
        width: f64,
        /// Crop height at session start.
        height: f64,
    },

    /// A rectangle with inverted or zero-length sides was supplied.
    #[error("Rectangle is inverted or has zero area")]
    DegenerateRect,

    /// The source image dimensions cannot be used for pixel conversions.
    #[error("Invalid image size: {width}x{height}")]
    InvalidImageSize {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// Another interaction session is still running.
    #[error("An interaction session is already active: {0:?}")]
    SessionActive(SessionMode),

    /// A configuration value is out of its allowed range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
