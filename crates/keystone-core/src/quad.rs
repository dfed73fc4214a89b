//! Four-sided convex polygons in a typed coordinate space.
//!
//! A [`Quad`] is what the image footprint becomes once a perspective
//! homography is applied to the unit square. Corners follow the winding
//! of the unit square corners (0,0), (1,0), (1,1), (0,1); a mirrored
//! projection may reverse it, so every predicate here accepts both
//! orientations.

use std::marker::PhantomData;

use crate::space::{
    logical_point_to_texture, texture_point_to_logical, Logical, NormalisedRect, Point,
    RotateSteps, Space, Texture,
};

/// Tolerance for point-in-polygon and convexity tests.
pub const CONTAINMENT_EPSILON: f64 = 1e-9;

/// Area below which a quad is treated as collapsed.
const MIN_QUAD_AREA: f64 = 1e-9;

/// A four-cornered polygon in space `S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad<S: Space> {
    corners: [Point; 4],
    space: PhantomData<S>,
}

impl<S: Space> Quad<S> {
    pub fn new(corners: [Point; 4]) -> Self {
        Self {
            corners,
            space: PhantomData,
        }
    }

    /// The unit square, used as the fallback footprint.
    pub fn unit() -> Self {
        Self::new(NormalisedRect::<S>::full().corners())
    }

    pub fn corners(&self) -> &[Point; 4] {
        &self.corners
    }

    /// Iterate over the four edges as `(start, end)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..4).map(move |i| (self.corners[i], self.corners[(i + 1) % 4]))
    }

    /// Mean of the four corners.
    pub fn centroid(&self) -> Point {
        let (sx, sy) = self
            .corners
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx * 0.25, sy * 0.25)
    }

    /// Shoelace area, positive for clockwise winding in y-down coordinates.
    pub fn signed_area(&self) -> f64 {
        self.edges().map(|(a, b)| a.cross(b)).sum::<f64>() * 0.5
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// True when all turns go the same way (collinear turns are allowed).
    pub fn is_convex(&self) -> bool {
        let mut positive = false;
        let mut negative = false;
        for i in 0..4 {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % 4];
            let c = self.corners[(i + 2) % 4];
            let turn = b.sub(a).cross(c.sub(b));
            if turn > CONTAINMENT_EPSILON {
                positive = true;
            } else if turn < -CONTAINMENT_EPSILON {
                negative = true;
            }
        }
        !(positive && negative)
    }

    /// A quad is unusable when a corner is non-finite, the area collapsed,
    /// or the outline self-intersects.
    pub fn is_degenerate(&self) -> bool {
        if !self.corners.iter().all(|p| p.is_finite()) {
            return true;
        }
        self.area() < MIN_QUAD_AREA || !self.is_convex()
    }

    /// Point-in-convex-polygon test. Points on an edge count as inside.
    pub fn contains_point(&self, point: Point) -> bool {
        let mut has_pos = false;
        let mut has_neg = false;
        for (a, b) in self.edges() {
            let side = b.sub(a).cross(point.sub(a));
            if side > CONTAINMENT_EPSILON {
                has_pos = true;
            } else if side < -CONTAINMENT_EPSILON {
                has_neg = true;
            }
            if has_pos && has_neg {
                return false;
            }
        }
        true
    }

    /// True when every corner of `rect` lies inside (or on) the quad.
    pub fn contains_rect(&self, rect: &NormalisedRect<S>) -> bool {
        rect.corners().iter().all(|&p| self.contains_point(p))
    }
}

impl Quad<Texture> {
    /// Express a texture-space quad in the rotated logical space.
    pub fn to_logical(&self, steps: RotateSteps) -> Quad<Logical> {
        Quad::new(self.corners.map(|p| texture_point_to_logical(p, steps)))
    }
}

impl Quad<Logical> {
    /// Express a logical-space quad in texture space.
    pub fn to_texture(&self, steps: RotateSteps) -> Quad<Texture> {
        Quad::new(self.corners.map(|p| logical_point_to_texture(p, steps)))
    }
}
