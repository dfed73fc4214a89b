//! Ray-cast shrink factor for a rectangle inside a quad.
//!
//! # Algorithm
//!
//! For each rectangle corner, a ray leaves the rectangle centre through the
//! corner. Its closest forward hit `t` on the quad boundary tells how far
//! along the centre-to-corner segment the boundary sits: `t >= 1` means the
//! corner is inside, otherwise the rectangle must shrink by `1 / t` for that
//! corner to land on the boundary. The answer is the largest such factor.

use crate::quad::Quad;
use crate::space::{NormalisedRect, Point, Space};

/// Direction vectors shorter than this are skipped.
const MIN_DIRECTION: f64 = 1e-12;

/// Cross products below this treat the ray and edge as parallel.
const PARALLEL_EPSILON: f64 = 1e-12;

/// Slack on the edge parameter so rays through a vertex still hit.
const EDGE_SLACK: f64 = 1e-9;

/// Minimum uniform scale-down factor that makes `rect` fit inside `quad`.
///
/// Returns exactly 1.0 when the rectangle already fits. Returns
/// `f64::INFINITY` when some corner ray never meets the quad boundary,
/// which only happens when the centre lies outside a degenerate quad;
/// callers check `is_finite` before applying the result.
pub fn min_scale_to_fit<S: Space>(rect: &NormalisedRect<S>, quad: &Quad<S>) -> f64 {
    if quad.contains_rect(rect) {
        return 1.0;
    }

    let center = rect.center();
    let mut required: f64 = 1.0;
    for corner in rect.corners() {
        let direction = corner.sub(center);
        if direction.x.abs() < MIN_DIRECTION && direction.y.abs() < MIN_DIRECTION {
            continue;
        }
        match ray_quad_intersection(center, direction, quad) {
            Some(t) if t > 0.0 => {
                if t < 1.0 {
                    required = required.max(1.0 / t);
                }
            }
            _ => return f64::INFINITY,
        }
    }
    required.max(1.0)
}

/// Closest forward intersection of the ray `origin + t * direction` with
/// the edges of `quad`, as the ray parameter `t`.
pub fn ray_quad_intersection<S: Space>(
    origin: Point,
    direction: Point,
    quad: &Quad<S>,
) -> Option<f64> {
    quad.edges()
        .filter_map(|(a, b)| ray_segment_intersection(origin, direction, a, b))
        .fold(None, |closest: Option<f64>, t| match closest {
            Some(best) if best <= t => Some(best),
            _ => Some(t),
        })
}

fn ray_segment_intersection(origin: Point, direction: Point, a: Point, b: Point) -> Option<f64> {
    let edge = b.sub(a);
    let denom = direction.cross(edge);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let offset = a.sub(origin);
    let t = offset.cross(edge) / denom;
    let u = offset.cross(direction) / denom;
    if t >= 0.0 && (-EDGE_SLACK..=1.0 + EDGE_SLACK).contains(&u) {
        Some(t)
    } else {
        None
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
