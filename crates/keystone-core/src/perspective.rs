//! Perspective projection: matrix construction and projected quads.
//!
//! The renderer samples the source texture through a 3x3 homography `M`
//! that maps centred view coordinates (`[-1, 1]²`) to centred texture
//! coordinates. The region of the view that still lands on real pixels is
//! therefore `M⁻¹` applied to the texture square, which is the projected
//! quad the crop has to stay inside.
//!
//! # Composition
//!
//! ```text
//! M = F · Rz' · Rx(v · 20°) · Ry(h · 20°)
//! ```
//!
//! where `Rz' = S⁻¹ · Rz(straighten) · S` with `S = diag(aspect, 1, 1)` so the
//! fine rotation is a true rotation in pixel space, and `F = diag(-1, 1, 1)`
//! when the image is mirrored.
//!
//! The discrete 90° rotation is never part of `M`. It is handled by the
//! [`AxisRemap`] step and the conversions in [`crate::space`].

use crate::quad::Quad;
use crate::space::{NormalisedRect, Point, Space};
use crate::PerspectiveParams;

/// Tilt angle reached at the `±1` ends of the perspective sliders.
pub const MAX_TILT_DEGREES: f64 = 20.0;

/// Smallest magnitude allowed for the homogeneous `w` before dividing.
pub const MIN_HOMOGENEOUS_W: f64 = 1e-6;

/// Determinant magnitude below which a matrix is treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Row-major 3x3 homogeneous matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionMatrix {
    rows: [[f64; 3]; 3],
}

impl Default for ProjectionMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ProjectionMatrix {
    pub const IDENTITY: ProjectionMatrix = ProjectionMatrix {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub const fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[[f64; 3]; 3] {
        &self.rows
    }

    /// Build the sampling matrix for a square image.
    ///
    /// # Arguments
    /// * `vertical` - Vertical tilt, clamped to [-1, 1]
    /// * `horizontal` - Horizontal tilt, clamped to [-1, 1]
    /// * `straighten_degrees` - Fine rotation angle in degrees
    /// * `flip_horizontal` - Mirror the image horizontally
    pub fn build(
        vertical: f64,
        horizontal: f64,
        straighten_degrees: f64,
        flip_horizontal: bool,
    ) -> Self {
        Self::build_with_aspect(vertical, horizontal, straighten_degrees, flip_horizontal, 1.0)
    }

    /// Build the sampling matrix for an image with the given width/height
    /// ratio (as displayed, after the 90° rotation steps).
    ///
    /// Non-finite or non-positive aspect ratios fall back to 1.0.
    pub fn build_with_aspect(
        vertical: f64,
        horizontal: f64,
        straighten_degrees: f64,
        flip_horizontal: bool,
        aspect_ratio: f64,
    ) -> Self {
        let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            aspect_ratio
        } else {
            1.0
        };

        let tilt_v = tilt_radians(vertical);
        let tilt_h = tilt_radians(horizontal);
        let (sx, cx) = tilt_v.sin_cos();
        let (sy, cy) = tilt_h.sin_cos();

        let rx = Self::from_rows([[1.0, 0.0, 0.0], [0.0, cx, -sx], [0.0, sx, cx]]);
        let ry = Self::from_rows([[cy, 0.0, sy], [0.0, 1.0, 0.0], [-sy, 0.0, cy]]);

        let theta = if straighten_degrees.is_finite() {
            straighten_degrees.to_radians()
        } else {
            0.0
        };
        let (sz, cz) = theta.sin_cos();
        // S⁻¹ · Rz · S
        let rz = Self::from_rows([
            [cz, -sz / aspect, 0.0],
            [sz * aspect, cz, 0.0],
            [0.0, 0.0, 1.0],
        ]);

        let mut matrix = rz.multiply(&rx.multiply(&ry));
        if flip_horizontal {
            for value in matrix.rows[0].iter_mut() {
                *value = -*value;
            }
        }
        matrix
    }

    /// Matrix product `self · other`.
    pub fn multiply(&self, other: &ProjectionMatrix) -> ProjectionMatrix {
        let a = &self.rows;
        let b = &other.rows;
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        ProjectionMatrix::from_rows(out)
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.rows;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse via the adjugate, or `None` for a singular matrix.
    pub fn inverse(&self) -> Option<ProjectionMatrix> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let m = &self.rows;
        let inv_det = 1.0 / det;
        Some(ProjectionMatrix::from_rows([
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
            ],
        ]))
    }

    /// Apply the matrix to a point in centred `[-1, 1]` coordinates and
    /// perform the perspective divide.
    ///
    /// A near-zero `w` is clamped to `±MIN_HOMOGENEOUS_W`, keeping its sign.
    pub fn transform_centered(&self, p: Point) -> Point {
        let m = &self.rows;
        let x = m[0][0] * p.x + m[0][1] * p.y + m[0][2];
        let y = m[1][0] * p.x + m[1][1] * p.y + m[1][2];
        let mut w = m[2][0] * p.x + m[2][1] * p.y + m[2][2];
        if w.abs() < MIN_HOMOGENEOUS_W {
            w = MIN_HOMOGENEOUS_W.copysign(w);
        }
        Point::new(x / w, y / w)
    }

    /// Apply the matrix to a point in normalized `[0, 1]` coordinates.
    pub fn transform_normalised(&self, p: Point) -> Point {
        let centred = Point::new(p.x * 2.0 - 1.0, p.y * 2.0 - 1.0);
        let out = self.transform_centered(centred);
        Point::new((out.x + 1.0) * 0.5, (out.y + 1.0) * 0.5)
    }

    /// Column-major `f32` layout, as uploaded to a GL uniform.
    pub fn to_column_major_f32(&self) -> [f32; 9] {
        let m = &self.rows;
        [
            m[0][0] as f32,
            m[1][0] as f32,
            m[2][0] as f32,
            m[0][1] as f32,
            m[1][1] as f32,
            m[2][1] as f32,
            m[0][2] as f32,
            m[1][2] as f32,
            m[2][2] as f32,
        ]
    }
}

#[inline]
fn tilt_radians(slider: f64) -> f64 {
    let value = if slider.is_finite() {
        slider.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    (value * MAX_TILT_DEGREES).to_radians()
}

/// Perspective inputs after compensating for the 90° rotation steps.
///
/// When the image is shown rotated by an odd number of steps, the sliders
/// act on axes the user sees swapped, so the signs of both tilts and the
/// straighten angle flip. This is the only place that rule lives; geometry
/// code downstream takes these values as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRemap {
    pub vertical: f64,
    pub horizontal: f64,
    pub straighten_degrees: f64,
    pub flip_horizontal: bool,
}

impl AxisRemap {
    pub fn apply(params: &PerspectiveParams) -> Self {
        let sign = if params.rotate_steps.is_odd() { -1.0 } else { 1.0 };
        Self {
            vertical: params.vertical * sign,
            horizontal: params.horizontal * sign,
            straighten_degrees: params.straighten_degrees * sign,
            flip_horizontal: params.flip_horizontal,
        }
    }

    /// Sampling matrix for these inputs at the given logical aspect ratio.
    pub fn matrix(&self, aspect_ratio: f64) -> ProjectionMatrix {
        ProjectionMatrix::build_with_aspect(
            self.vertical,
            self.horizontal,
            self.straighten_degrees,
            self.flip_horizontal,
            aspect_ratio,
        )
    }
}

/// Project a set of normalized corners through the inverse of `matrix`.
///
/// Each corner is moved to centred `[-1, 1]` space, mapped through `M⁻¹`,
/// divided by `w` and re-normalized. A singular matrix leaves the corners
/// untouched.
pub fn project_quad<S: Space>(matrix: &ProjectionMatrix, corners: &[Point; 4]) -> Quad<S> {
    let Some(inverse) = matrix.inverse() else {
        log::warn!("projection matrix is singular, using corners unchanged");
        return Quad::new(*corners);
    };
    Quad::new(corners.map(|p| inverse.transform_normalised(p)))
}

/// Project the full unit square.
pub fn projected_unit_quad<S: Space>(matrix: &ProjectionMatrix) -> Quad<S> {
    project_quad(matrix, &NormalisedRect::<S>::full().corners())
}

/// Project the corners of `rect`, keeping the quad in the same space as
/// the rectangle.
pub fn project_rect<S: Space>(matrix: &ProjectionMatrix, rect: &NormalisedRect<S>) -> Quad<S> {
    project_quad(matrix, &rect.corners())
}


// ============================================================================
// Property-Based Tests
// ============================================================================
