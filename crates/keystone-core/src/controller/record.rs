//! Values handed to the renderer each frame and to storage on commit.

use serde::{Deserialize, Serialize};

use super::view::ViewTransform;
use crate::perspective::ProjectionMatrix;
use crate::space::{Logical, NormalisedRect, RotateSteps, Texture};
use crate::PerspectiveParams;

/// Everything the renderer needs to draw one frame.
///
/// The matrix never contains the 90° rotation; the renderer applies
/// `rotate_steps` as an axis remap when sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDescriptor {
    pub matrix: ProjectionMatrix,
    pub rotate_steps: RotateSteps,
    /// Crop in logical space
    pub crop: NormalisedRect<Logical>,
    pub view: ViewTransform,
}

/// Persisted crop and perspective state.
///
/// The crop is stored in texture space (centre form) so it stays valid
/// whatever rotation the image is shown with later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub crop_cx: f64,
    pub crop_cy: f64,
    pub crop_w: f64,
    pub crop_h: f64,
    #[serde(flatten)]
    pub perspective: PerspectiveParams,
}

impl Default for CommitRecord {
    fn default() -> Self {
        Self::new(&NormalisedRect::full(), PerspectiveParams::default())
    }
}

impl CommitRecord {
    pub fn new(crop: &NormalisedRect<Texture>, perspective: PerspectiveParams) -> Self {
        let c = crop.center();
        Self {
            crop_cx: c.x,
            crop_cy: c.y,
            crop_w: crop.width(),
            crop_h: crop.height(),
            perspective,
        }
    }

    /// The stored crop as a texture-space rectangle.
    pub fn texture_rect(&self) -> NormalisedRect<Texture> {
        NormalisedRect::from_center(self.crop_cx, self.crop_cy, self.crop_w, self.crop_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_is_full_image() {
        let record = CommitRecord::default();
        assert_eq!(
            (record.crop_cx, record.crop_cy, record.crop_w, record.crop_h),
            (0.5, 0.5, 1.0, 1.0)
        );
        assert_eq!(record.perspective, PerspectiveParams::default());
    }

    #[test]
    fn test_texture_rect_round_trip() {
        let rect = NormalisedRect::<Texture>::from_center(0.3, 0.7, 0.5, 0.6);
        let record = CommitRecord::new(&rect, PerspectiveParams::default());
        let back = record.texture_rect();
        assert!((back.left - rect.left).abs() < 1e-12);
        assert!((back.bottom - rect.bottom).abs() < 1e-12);
    }
}
