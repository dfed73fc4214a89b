//! Stateless geometry bindings.
//!
//! For hosts that keep their own crop state and only need the coordinate
//! conversions, the sampling matrix or a fit scale.

use keystone_core::constraint::min_scale_to_fit;
use keystone_core::perspective::{projected_unit_quad, AxisRemap};
use keystone_core::space::{logical_to_texture, texture_to_logical, Space};
use keystone_core::{Logical, NormalisedRect, PerspectiveParams, RotateSteps, Texture};
use wasm_bindgen::prelude::*;

fn rect_values<S: Space>(rect: &NormalisedRect<S>) -> Vec<f64> {
    let c = rect.center();
    vec![c.x, c.y, rect.width(), rect.height()]
}

/// Convert a texture-space crop `(cx, cy, width, height)` to logical space.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const [cx, cy, w, h] = texture_to_logical_rect(0.3, 0.7, 0.5, 0.6, 1);
/// // [0.3, 0.3, 0.6, 0.5]
/// ```
#[wasm_bindgen]
pub fn texture_to_logical_rect(cx: f64, cy: f64, width: f64, height: f64, rotate_steps: i32) -> Vec<f64> {
    let rect = NormalisedRect::<Texture>::from_center(cx, cy, width, height);
    rect_values(&texture_to_logical(&rect, RotateSteps::new(rotate_steps)))
}

/// Convert a logical-space crop `(cx, cy, width, height)` to texture space.
#[wasm_bindgen]
pub fn logical_to_texture_rect(cx: f64, cy: f64, width: f64, height: f64, rotate_steps: i32) -> Vec<f64> {
    let rect = NormalisedRect::<Logical>::from_center(cx, cy, width, height);
    rect_values(&logical_to_texture(&rect, RotateSteps::new(rotate_steps)))
}

/// Column-major sampling matrix for the given slider values.
///
/// The sign compensation for odd `rotate_steps` is applied here; the
/// rotation itself is not part of the matrix.
#[wasm_bindgen]
pub fn projection_matrix(
    vertical: f64,
    horizontal: f64,
    straighten_degrees: f64,
    flip_horizontal: bool,
    rotate_steps: i32,
    logical_aspect: f64,
) -> js_sys::Float32Array {
    let m = remapped(vertical, horizontal, straighten_degrees, flip_horizontal, rotate_steps)
        .matrix(logical_aspect)
        .to_column_major_f32();
    js_sys::Float32Array::from(&m[..])
}

/// Factor a logical crop must be divided by to fit inside the image
/// footprint for the given slider values. `1` means it already fits,
/// `Infinity` that it cannot be fitted about its centre.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn crop_fit_scale(
    cx: f64,
    cy: f64,
    width: f64,
    height: f64,
    vertical: f64,
    horizontal: f64,
    straighten_degrees: f64,
    flip_horizontal: bool,
    rotate_steps: i32,
    logical_aspect: f64,
) -> f64 {
    let matrix = remapped(vertical, horizontal, straighten_degrees, flip_horizontal, rotate_steps)
        .matrix(logical_aspect);
    let quad = projected_unit_quad::<Logical>(&matrix);
    let rect = NormalisedRect::<Logical>::from_center(cx, cy, width, height);
    min_scale_to_fit(&rect, &quad)
}

fn remapped(
    vertical: f64,
    horizontal: f64,
    straighten_degrees: f64,
    flip_horizontal: bool,
    rotate_steps: i32,
) -> AxisRemap {
    AxisRemap::apply(&PerspectiveParams {
        vertical,
        horizontal,
        straighten_degrees,
        flip_horizontal,
        rotate_steps: RotateSteps::new(rotate_steps),
    })
}
