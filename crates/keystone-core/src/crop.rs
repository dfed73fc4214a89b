//! The editable crop box and its pixel-space conversions.
//!
//! The crop box always lives in logical space: the orientation the user is
//! looking at. It is stored in centre form and clamped back into the unit
//! square after every mutation, so any value read from it is a valid crop.
//!
//! # Coordinate System
//!
//! - (0.0, 0.0) = top-left corner
//! - (1.0, 1.0) = bottom-right corner
//! - width/height are fractions of the displayed image

use serde::{Deserialize, Serialize};

use crate::space::{Logical, NormalisedRect, Space};

/// Change threshold used when comparing against a snapshot.
pub const CHANGE_EPSILON: f64 = 1e-6;

/// Tolerance under which a crop counts as covering the whole image.
pub const FULL_CROP_EPSILON: f64 = 1e-3;

/// Saved centre and size, used to revert a rejected edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSnapshot {
    pub cx: f64,
    pub cy: f64,
    pub width: f64,
    pub height: f64,
}

/// Crop rectangle in logical space, in centre form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    /// Centre x (0.0 to 1.0)
    pub cx: f64,
    /// Centre y (0.0 to 1.0)
    pub cy: f64,
    /// Width (min_width to 1.0)
    pub width: f64,
    /// Height (min_height to 1.0)
    pub height: f64,
    /// Smallest allowed width
    pub min_width: f64,
    /// Smallest allowed height
    pub min_height: f64,
}

impl Default for CropBox {
    fn default() -> Self {
        Self::full(0.01)
    }
}

impl CropBox {
    /// A crop covering the whole image.
    pub fn full(min_size: f64) -> Self {
        Self {
            cx: 0.5,
            cy: 0.5,
            width: 1.0,
            height: 1.0,
            min_width: min_size,
            min_height: min_size,
        }
    }

    /// Build a crop box from a logical rectangle, clamped into bounds.
    pub fn from_rect(rect: &NormalisedRect<Logical>, min_size: f64) -> Self {
        let c = rect.center();
        let mut crop = Self {
            cx: c.x,
            cy: c.y,
            width: rect.width(),
            height: rect.height(),
            min_width: min_size,
            min_height: min_size,
        };
        crop.clamp();
        crop
    }

    /// Replace centre and size, then clamp.
    pub fn set(&mut self, cx: f64, cy: f64, width: f64, height: f64) {
        self.cx = cx;
        self.cy = cy;
        self.width = width;
        self.height = height;
        self.clamp();
    }

    /// Pull size into `[min, 1]` and the centre far enough in that every
    /// edge lies inside the unit square.
    ///
    /// Non-finite values are replaced by the full-image crop.
    pub fn clamp(&mut self) {
        if ![self.cx, self.cy, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
        {
            log::warn!("crop box had non-finite values, resetting to full image");
            self.cx = 0.5;
            self.cy = 0.5;
            self.width = 1.0;
            self.height = 1.0;
            return;
        }

        self.width = self.width.clamp(self.min_width.min(1.0), 1.0);
        self.height = self.height.clamp(self.min_height.min(1.0), 1.0);
        let half_w = self.width * 0.5;
        let half_h = self.height * 0.5;
        self.cx = self.cx.clamp(half_w, 1.0 - half_w);
        self.cy = self.cy.clamp(half_h, 1.0 - half_h);
    }

    /// Edges as a logical-space rectangle.
    pub fn bounds(&self) -> NormalisedRect<Logical> {
        NormalisedRect::from_center(self.cx, self.cy, self.width, self.height)
    }

    /// Width over height, or `None` for a zero height.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height > 0.0 {
            Some(self.width / self.height)
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> CropSnapshot {
        CropSnapshot {
            cx: self.cx,
            cy: self.cy,
            width: self.width,
            height: self.height,
        }
    }

    pub fn restore(&mut self, snapshot: &CropSnapshot) {
        self.cx = snapshot.cx;
        self.cy = snapshot.cy;
        self.width = snapshot.width;
        self.height = snapshot.height;
        self.clamp();
    }

    /// True when any component moved more than [`CHANGE_EPSILON`].
    pub fn has_changed(&self, snapshot: &CropSnapshot) -> bool {
        (self.cx - snapshot.cx).abs() > CHANGE_EPSILON
            || (self.cy - snapshot.cy).abs() > CHANGE_EPSILON
            || (self.width - snapshot.width).abs() > CHANGE_EPSILON
            || (self.height - snapshot.height).abs() > CHANGE_EPSILON
    }

    /// Shift the centre by a normalized offset, then clamp.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.cx += dx;
        self.cy += dy;
        self.clamp();
    }

    /// Divide both dimensions by `factor` about the current centre.
    pub fn shrink_by(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.width = (self.width / factor).max(self.min_width);
        self.height = (self.height / factor).max(self.min_height);
        self.clamp();
    }

    /// Move the edges selected by `handle` by a normalized delta.
    ///
    /// Edges are kept at least `min_width`/`min_height` apart. `Inside`
    /// translates the whole box instead.
    pub fn drag_handle(&mut self, handle: CropHandle, dx: f64, dy: f64, min_width: f64, min_height: f64) {
        if handle == CropHandle::Inside {
            self.translate(dx, dy);
            return;
        }

        let half_w = self.width * 0.5;
        let half_h = self.height * 0.5;
        let mut left = self.cx - half_w;
        let mut right = self.cx + half_w;
        let mut top = self.cy - half_h;
        let mut bottom = self.cy + half_h;

        if handle.moves_left() {
            left = (left + dx).max(0.0).min(right - min_width);
        }
        if handle.moves_right() {
            right = (right + dx).min(1.0).max(left + min_width);
        }
        if handle.moves_top() {
            top = (top + dy).max(0.0).min(bottom - min_height);
        }
        if handle.moves_bottom() {
            bottom = (bottom + dy).min(1.0).max(top + min_height);
        }

        self.set(
            (left + right) * 0.5,
            (top + bottom) * 0.5,
            right - left,
            bottom - top,
        );
    }
}

/// The part of the crop box being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropHandle {
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// Drag inside the box: translate without resizing
    Inside,
}

impl CropHandle {
    pub fn moves_left(self) -> bool {
        matches!(self, Self::Left | Self::TopLeft | Self::BottomLeft)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Self::Right | Self::TopRight | Self::BottomRight)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Self::Top | Self::TopLeft | Self::TopRight)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::Bottom | Self::BottomLeft | Self::BottomRight)
    }
}

/// Integer pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// True when `rect` is a usable crop that does not cover the whole image.
pub fn has_valid_crop<S: Space>(rect: &NormalisedRect<S>) -> bool {
    if rect.is_degenerate() {
        return false;
    }
    let full = rect.left <= FULL_CROP_EPSILON
        && rect.top <= FULL_CROP_EPSILON
        && rect.right >= 1.0 - FULL_CROP_EPSILON
        && rect.bottom >= 1.0 - FULL_CROP_EPSILON;
    !full
}

/// Convert a normalized crop into pixel coordinates for an image of the
/// given size.
///
/// # Returns
///
/// `None` for a full-image or invalid crop, or for an empty image.
/// Otherwise a rectangle of at least 1x1 pixels clamped to the image.
pub fn crop_rect_pixels<S: Space>(
    rect: &NormalisedRect<S>,
    image_width: u32,
    image_height: u32,
) -> Option<PixelRect> {
    if image_width == 0 || image_height == 0 || !has_valid_crop(rect) {
        return None;
    }

    let src_w = f64::from(image_width);
    let src_h = f64::from(image_height);

    let px_left = (rect.left.clamp(0.0, 1.0) * src_w).round() as u32;
    let px_top = (rect.top.clamp(0.0, 1.0) * src_h).round() as u32;
    let px_width = (rect.width().clamp(0.0, 1.0) * src_w).round() as u32;
    let px_height = (rect.height().clamp(0.0, 1.0) * src_h).round() as u32;

    let px_left = px_left.min(image_width.saturating_sub(1));
    let px_top = px_top.min(image_height.saturating_sub(1));
    let px_right = (px_left + px_width).min(image_width);
    let px_bottom = (px_top + px_height).min(image_height);

    Some(PixelRect {
        x: px_left,
        y: px_top,
        width: px_right.saturating_sub(px_left).max(1),
        height: px_bottom.saturating_sub(px_top).max(1),
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================
