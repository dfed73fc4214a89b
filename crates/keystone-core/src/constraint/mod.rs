//! Fitting a crop rectangle inside the projected image footprint.
//!
//! Two solvers live here:
//!
//! - [`min_scale_to_fit`]: exact ray casting against the projected quad.
//!   Used by the interaction controller every update.
//! - [`find_max_safe_scale_binary_search`]: a bounded bisection that
//!   validates corners in texture (UV) space with a pixel safety margin.
//!   Used where the analytic answer is not enough, e.g. when the renderer
//!   must never sample the outermost texels.
//!
//! # Scale Convention
//!
//! `min_scale_to_fit` returns how much a rectangle must be *divided* by to
//! fit (1.0 = already fits). The binary search returns the factor the
//! rectangle is *multiplied* by (1.0 = full size is safe).

mod ray;
mod uv;

pub use ray::{min_scale_to_fit, ray_quad_intersection};
pub use uv::{
    constrain_rect_to_uv_bounds, find_max_safe_scale_binary_search, texture_safety_padding,
    validate_corners_in_uv_space, ScaleSearch, SearchSettings, UvValidation,
};

use crate::quad::Quad;
use crate::space::{NormalisedRect, Space};

/// True when all four corners of `rect` lie inside (or on) `quad`.
pub fn is_inside<S: Space>(rect: &NormalisedRect<S>, quad: &Quad<S>) -> bool {
    quad.contains_rect(rect)
}
