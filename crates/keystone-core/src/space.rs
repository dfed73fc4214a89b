//! Coordinate spaces and the conversions between them.
//!
//! Every rectangle and quad in this crate carries the space it lives in as a
//! type parameter, so a texture-space crop can never be compared against a
//! logical-space quad by accident. Crossing from one space to another is only
//! possible through the functions in this module.
//!
//! # Spaces
//!
//! - [`Texture`]: normalized coordinates of the original, unrotated image.
//!   This is what gets persisted.
//! - [`Logical`]: normalized coordinates as currently displayed, after the
//!   discrete 90° rotation. All interactive edits happen here.
//!
//! Both use (0, 0) = top-left and (1, 1) = bottom-right.
//!
//! # Rotation formulas
//!
//! On the centre form `(cx, cy, w, h)`, texture to logical:
//!
//! ```text
//! steps = 0:  (cx, cy, w, h)
//! steps = 1:  (1 - cy, cx, h, w)      90° CW
//! steps = 2:  (1 - cx, 1 - cy, w, h)  180°
//! steps = 3:  (cy, 1 - cx, h, w)      270° CW
//! ```

use std::fmt::Debug;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::error::CropError;

/// Marker trait for a named coordinate space.
pub trait Space: Copy + Debug + PartialEq + Default + 'static {
    /// Human readable name, used in debug output.
    const NAME: &'static str;
}

/// Normalized coordinates of the unrotated source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Texture;

impl Space for Texture {
    const NAME: &'static str = "texture";
}

/// Normalized coordinates as displayed after the 90° rotation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Logical;

impl Space for Logical {
    const NAME: &'static str = "logical";
}

/// Clamp a value to the unit interval.
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// A 2D point. Points are plain values; the space is carried by the
/// rectangle or quad that owns them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[inline]
    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    /// Z component of the cross product of two 2D vectors.
    #[inline]
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Number of clockwise 90° rotation steps, always in `0..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct RotateSteps(u8);

impl RotateSteps {
    /// No rotation.
    pub const NONE: RotateSteps = RotateSteps(0);

    /// Create from any integer, wrapping modulo 4 (so -1 becomes 3).
    pub fn new(steps: i32) -> Self {
        Self(steps.rem_euclid(4) as u8)
    }

    /// Raw step count in `0..=3`.
    pub fn get(self) -> u8 {
        self.0
    }

    /// True for 90° and 270°, where width and height swap.
    pub fn is_odd(self) -> bool {
        self.0 % 2 == 1
    }

    /// One more step clockwise.
    pub fn rotated_cw(self) -> Self {
        Self::new(i32::from(self.0) + 1)
    }

    /// One step counter-clockwise.
    pub fn rotated_ccw(self) -> Self {
        Self::new(i32::from(self.0) - 1)
    }
}

impl From<i32> for RotateSteps {
    fn from(steps: i32) -> Self {
        Self::new(steps)
    }
}

impl From<RotateSteps> for i32 {
    fn from(steps: RotateSteps) -> Self {
        i32::from(steps.0)
    }
}

/// An axis-aligned rectangle in the normalized coordinates of space `S`.
///
/// Invariant for values built with [`NormalisedRect::new`]: `left < right`
/// and `top < bottom`. Degenerate rectangles are rejected there rather than
/// silently repaired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalisedRect<S: Space> {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    space: PhantomData<S>,
}

impl<S: Space> NormalisedRect<S> {
    /// Create a rectangle from its edges, rejecting inverted, zero-area or
    /// non-finite input.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Result<Self, CropError> {
        let rect = Self::from_edges(left, top, right, bottom);
        if rect.is_degenerate() {
            return Err(CropError::DegenerateRect);
        }
        Ok(rect)
    }

    /// Create a rectangle from its edges without validation.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            space: PhantomData,
        }
    }

    /// Create a rectangle from its centre and size.
    pub fn from_center(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        let half_w = width.max(0.0) * 0.5;
        let half_h = height.max(0.0) * 0.5;
        Self::from_edges(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    /// The full `[0, 1] x [0, 1]` square.
    pub fn full() -> Self {
        Self::from_edges(0.0, 0.0, 1.0, 1.0)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// Width over height, or `None` when the height is zero.
    pub fn aspect_ratio(&self) -> Option<f64> {
        let h = self.height();
        if h > 0.0 {
            Some(self.width() / h)
        } else {
            None
        }
    }

    /// True when the rectangle is inverted, has no area or is not finite.
    pub fn is_degenerate(&self) -> bool {
        let finite = [self.left, self.top, self.right, self.bottom]
            .iter()
            .all(|v| v.is_finite());
        !finite || self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Corners in the fixed winding order matching the unit square corners
    /// (0,0), (1,0), (1,1), (0,1).
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
        ]
    }

    /// Uniformly scale about the rectangle's own centre.
    pub fn scaled(&self, factor: f64) -> Self {
        let c = self.center();
        Self::from_center(c.x, c.y, self.width() * factor, self.height() * factor)
    }

    /// Name of the space this rectangle lives in.
    pub fn space_name(&self) -> &'static str {
        S::NAME
    }
}

/// Map a texture-space point into logical space.
pub fn texture_point_to_logical(p: Point, steps: RotateSteps) -> Point {
    match steps.get() {
        1 => Point::new(1.0 - p.y, p.x),
        2 => Point::new(1.0 - p.x, 1.0 - p.y),
        3 => Point::new(p.y, 1.0 - p.x),
        _ => p,
    }
}

/// Map a logical-space point back into texture space.
pub fn logical_point_to_texture(p: Point, steps: RotateSteps) -> Point {
    match steps.get() {
        1 => Point::new(p.y, 1.0 - p.x),
        2 => Point::new(1.0 - p.x, 1.0 - p.y),
        3 => Point::new(1.0 - p.y, p.x),
        _ => p,
    }
}

/// Convert a texture-space rectangle into the logical space currently shown.
pub fn texture_to_logical(
    rect: &NormalisedRect<Texture>,
    steps: RotateSteps,
) -> NormalisedRect<Logical> {
    let c = texture_point_to_logical(rect.center(), steps);
    let (w, h) = swap_if_odd(rect.width(), rect.height(), steps);
    NormalisedRect::from_center(c.x, c.y, w, h)
}

/// Convert a logical-space rectangle back into texture space.
///
/// Exact inverse of [`texture_to_logical`] for every rotation step.
pub fn logical_to_texture(
    rect: &NormalisedRect<Logical>,
    steps: RotateSteps,
) -> NormalisedRect<Texture> {
    let c = logical_point_to_texture(rect.center(), steps);
    let (w, h) = swap_if_odd(rect.width(), rect.height(), steps);
    NormalisedRect::from_center(c.x, c.y, w, h)
}

#[inline]
fn swap_if_odd(width: f64, height: f64, steps: RotateSteps) -> (f64, f64) {
    if steps.is_odd() {
        (height, width)
    } else {
        (width, height)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for rectangles that sit inside the unit square.
    fn rect_strategy() -> impl Strategy<Value = (f64, f64, f64, f64)> {
        (0.05f64..=0.5, 0.05f64..=0.5).prop_flat_map(|(w, h)| {
            (
                (w * 0.5)..=(1.0 - w * 0.5),
                (h * 0.5)..=(1.0 - h * 0.5),
                Just(w),
                Just(h),
            )
        })
    }

    proptest! {
        /// Property: texture -> logical -> texture reproduces the input.
        #[test]
        fn prop_round_trip(
            (cx, cy, w, h) in rect_strategy(),
            steps in 0i32..4,
        ) {
            let steps = RotateSteps::new(steps);
            let original = NormalisedRect::<Texture>::from_center(cx, cy, w, h);
            let back = logical_to_texture(&texture_to_logical(&original, steps), steps);

            prop_assert!((back.left - original.left).abs() < 1e-6);
            prop_assert!((back.top - original.top).abs() < 1e-6);
            prop_assert!((back.right - original.right).abs() < 1e-6);
            prop_assert!((back.bottom - original.bottom).abs() < 1e-6);
        }

        /// Property: a rect inside the unit square stays inside after rotation.
        #[test]
        fn prop_rotation_stays_in_unit_square(
            (cx, cy, w, h) in rect_strategy(),
            steps in 0i32..4,
        ) {
            let original = NormalisedRect::<Texture>::from_center(cx, cy, w, h);
            let logical = texture_to_logical(&original, RotateSteps::new(steps));

            prop_assert!(logical.left >= -1e-9 && logical.right <= 1.0 + 1e-9);
            prop_assert!(logical.top >= -1e-9 && logical.bottom <= 1.0 + 1e-9);
        }

        /// Property: area is preserved by every rotation step.
        #[test]
        fn prop_area_preserved(
            (cx, cy, w, h) in rect_strategy(),
            steps in 0i32..4,
        ) {
            let original = NormalisedRect::<Texture>::from_center(cx, cy, w, h);
            let logical = texture_to_logical(&original, RotateSteps::new(steps));
            let before = original.width() * original.height();
            let after = logical.width() * logical.height();
            prop_assert!((before - after).abs() < 1e-9);
        }
    }
}
