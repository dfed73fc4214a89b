//! Texture-space validation and the bounded binary scale search.
//!
//! Corners of a view-space rectangle are pushed forward through the
//! sampling matrix into texture coordinates and compared against the
//! texture square shrunk by a few pixels on each side. The search then
//! finds the largest uniform scale that passes, in a fixed number of
//! steps so it can run inline once per frame.

use crate::config::InteractionConfig;
use crate::perspective::ProjectionMatrix;
use crate::space::{NormalisedRect, Point, Space};

/// Slack on the UV bounds so a corner sitting exactly on the padded
/// boundary still validates.
const UV_SLACK: f64 = 1e-9;

/// Safety margin in normalized texture units for a texture size.
///
/// Returns `(padding / width, padding / height)`, or zeros when either
/// dimension is zero.
pub fn texture_safety_padding(width: u32, height: u32, padding_pixels: u32) -> (f64, f64) {
    if width == 0 || height == 0 {
        return (0.0, 0.0);
    }
    let padding = f64::from(padding_pixels);
    (padding / f64::from(width), padding / f64::from(height))
}

/// Outcome of [`validate_corners_in_uv_space`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvValidation {
    /// True when every corner lands inside the padded texture bounds.
    pub valid: bool,
    /// The rectangle corners mapped into texture coordinates.
    pub corners: [Point; 4],
}

/// Map the corners of `rect` into texture space and check them against
/// the padded `[0, 1]` bounds.
pub fn validate_corners_in_uv_space<S: Space>(
    rect: &NormalisedRect<S>,
    matrix: &ProjectionMatrix,
    texture_size: (u32, u32),
    padding_pixels: u32,
) -> UvValidation {
    let (eps_u, eps_v) = texture_safety_padding(texture_size.0, texture_size.1, padding_pixels);
    let corners = rect.corners().map(|p| matrix.transform_normalised(p));

    let u_range = (eps_u - UV_SLACK)..=(1.0 - eps_u + UV_SLACK);
    let v_range = (eps_v - UV_SLACK)..=(1.0 - eps_v + UV_SLACK);
    let valid = corners
        .iter()
        .all(|c| u_range.contains(&c.x) && v_range.contains(&c.y));

    UvValidation { valid, corners }
}

/// Tuning for the binary scale search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    /// Texture margin in pixels
    pub padding_pixels: u32,
    /// Upper bound on bisection steps
    pub max_iterations: u32,
    /// Stop once the bracket is narrower than this
    pub tolerance: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            padding_pixels: 3,
            max_iterations: 10,
            tolerance: 0.001,
        }
    }
}

impl From<&InteractionConfig> for SearchSettings {
    fn from(config: &InteractionConfig) -> Self {
        Self {
            padding_pixels: config.uv_padding_pixels,
            max_iterations: config.search_max_iterations,
            tolerance: config.search_tolerance,
        }
    }
}

/// Result of [`find_max_safe_scale_binary_search`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSearch {
    /// Largest scale known to validate, in `[0, 1]`.
    pub scale: f64,
    /// Bisection steps performed (0 when full size already validates).
    pub iterations: u32,
}

/// Largest uniform scale in `[0, 1]` at which a rectangle of the given
/// size, centred at `center`, validates in UV space.
///
/// # Algorithm
///
/// 1. If scale 1.0 validates, return it without searching.
/// 2. Bisect `[0, 1]`: a validating midpoint raises the lower bound,
///    a failing one lowers the upper bound.
/// 3. Stop after `max_iterations` steps or once the bracket is narrower
///    than `tolerance`, and return the lower bound.
///
/// The lower bound is always a scale that validated (or 0), so the
/// answer errs toward a smaller, safe rectangle.
pub fn find_max_safe_scale_binary_search<S: Space>(
    center: Point,
    width: f64,
    height: f64,
    matrix: &ProjectionMatrix,
    texture_size: (u32, u32),
    settings: SearchSettings,
) -> ScaleSearch {
    let validates = |scale: f64| {
        let rect = NormalisedRect::<S>::from_center(center.x, center.y, width * scale, height * scale);
        validate_corners_in_uv_space(&rect, matrix, texture_size, settings.padding_pixels).valid
    };

    if validates(1.0) {
        return ScaleSearch {
            scale: 1.0,
            iterations: 0,
        };
    }

    let mut min_scale = 0.0;
    let mut max_scale = 1.0;
    let mut iterations = 0;
    while iterations < settings.max_iterations && max_scale - min_scale >= settings.tolerance {
        iterations += 1;
        let mid = (min_scale + max_scale) * 0.5;
        if validates(mid) {
            min_scale = mid;
        } else {
            max_scale = mid;
        }
    }

    log::trace!(
        "uv scale search: scale={:.4} after {} iterations",
        min_scale,
        iterations
    );

    ScaleSearch {
        scale: min_scale,
        iterations,
    }
}

/// Shrink `rect` about its centre, keeping its aspect ratio, until its
/// corners validate in UV space.
pub fn constrain_rect_to_uv_bounds<S: Space>(
    rect: &NormalisedRect<S>,
    matrix: &ProjectionMatrix,
    texture_size: (u32, u32),
    settings: SearchSettings,
) -> NormalisedRect<S> {
    let search = find_max_safe_scale_binary_search::<S>(
        rect.center(),
        rect.width(),
        rect.height(),
        matrix,
        texture_size,
        settings,
    );
    if search.scale >= 1.0 {
        return *rect;
    }
    rect.scaled(search.scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::Logical;

    const TEXTURE: (u32, u32) = (1000, 1000);

    #[test]
    fn test_safety_padding() {
        let (u, v) = texture_safety_padding(1000, 1000, 3);
        assert!((u - 0.003).abs() < 1e-12 && (v - 0.003).abs() < 1e-12);

        let (u, v) = texture_safety_padding(2000, 1000, 3);
        assert!((u - 0.0015).abs() < 1e-12);
        assert!((v - 0.003).abs() < 1e-12);

        let (u, v) = texture_safety_padding(1000, 1000, 2);
        assert!((u - 0.002).abs() < 1e-12 && (v - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_safety_padding_invalid_size() {
        assert_eq!(texture_safety_padding(0, 0, 3), (0.0, 0.0));
        assert_eq!(texture_safety_padding(100, 0, 3), (0.0, 0.0));
    }

    #[test]
    fn test_identity_validation_keeps_corners() {
        let rect = NormalisedRect::<Logical>::new(0.1, 0.1, 0.9, 0.9).unwrap();
        let result = validate_corners_in_uv_space(&rect, &ProjectionMatrix::IDENTITY, TEXTURE, 3);
        assert!(result.valid);
        let expected = [(0.1, 0.1), (0.9, 0.1), (0.9, 0.9), (0.1, 0.9)];
        for (c, (x, y)) in result.corners.iter().zip(expected) {
            assert!((c.x - x).abs() < 1e-9 && (c.y - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_full_frame_violates_padding() {
        let rect = NormalisedRect::<Logical>::full();
        let result = validate_corners_in_uv_space(&rect, &ProjectionMatrix::IDENTITY, TEXTURE, 3);
        assert!(!result.valid);
    }

    #[test]
    fn test_rect_on_padding_boundary_is_valid() {
        let eps = 0.003;
        let rect = NormalisedRect::<Logical>::new(eps, eps, 1.0 - eps, 1.0 - eps).unwrap();
        let result = validate_corners_in_uv_space(&rect, &ProjectionMatrix::IDENTITY, TEXTURE, 3);
        assert!(result.valid);
    }

    #[test]
    fn test_search_returns_one_without_iterating() {
        let search = find_max_safe_scale_binary_search::<Logical>(
            Point::new(0.5, 0.5),
            0.5,
            0.5,
            &ProjectionMatrix::IDENTITY,
            TEXTURE,
            SearchSettings::default(),
        );
        assert_eq!(search.scale, 1.0);
        assert_eq!(search.iterations, 0);
    }

    #[test]
    fn test_search_shrinks_full_frame() {
        let search = find_max_safe_scale_binary_search::<Logical>(
            Point::new(0.5, 0.5),
            1.0,
            1.0,
            &ProjectionMatrix::IDENTITY,
            TEXTURE,
            SearchSettings::default(),
        );
        // Padding needs scale <= 0.994
        assert!(search.scale < 1.0);
        assert!(search.scale <= 0.994 + 1e-9);
        assert!(search.scale > 0.98, "scale was {}", search.scale);
        assert!(search.iterations <= 10);
    }

    #[test]
    fn test_search_respects_tolerance() {
        let settings = SearchSettings {
            tolerance: 0.1,
            ..SearchSettings::default()
        };
        let search = find_max_safe_scale_binary_search::<Logical>(
            Point::new(0.5, 0.5),
            1.0,
            1.0,
            &ProjectionMatrix::IDENTITY,
            TEXTURE,
            settings,
        );
        // 1 -> 0.5 -> 0.25 -> 0.125 -> 0.0625 bracket widths
        assert_eq!(search.iterations, 4);
    }

    #[test]
    fn test_constrain_preserves_center_and_aspect() {
        let matrix = ProjectionMatrix::build(0.6, -0.3, 0.0, false);
        let rect = NormalisedRect::<Logical>::from_center(0.5, 0.5, 0.9, 0.6);
        let constrained = constrain_rect_to_uv_bounds(&rect, &matrix, TEXTURE, SearchSettings::default());

        assert!((constrained.center().x - 0.5).abs() < 1e-9);
        assert!((constrained.center().y - 0.5).abs() < 1e-9);
        let before = rect.width() / rect.height();
        let after = constrained.width() / constrained.height();
        assert!((before - after).abs() < 1e-9);
        assert!(validate_corners_in_uv_space(&constrained, &matrix, TEXTURE, 3).valid);
    }

    #[test]
    fn test_settings_from_config() {
        let config = InteractionConfig {
            uv_padding_pixels: 5,
            search_max_iterations: 6,
            ..InteractionConfig::default()
        };
        let settings = SearchSettings::from(&config);
        assert_eq!(settings.padding_pixels, 5);
        assert_eq!(settings.max_iterations, 6);
        assert_eq!(settings.tolerance, 0.001);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::space::Logical;
    use proptest::prelude::*;

    proptest! {
        /// Property: the search stops within the iteration cap and the scale
        /// it returns validates.
        #[test]
        fn prop_search_converges_to_valid_scale(
            vertical in -1.0f64..=1.0,
            horizontal in -1.0f64..=1.0,
            straighten in -15.0f64..=15.0,
            cx in 0.4f64..=0.6,
            cy in 0.4f64..=0.6,
            w in 0.1f64..=1.0,
            h in 0.1f64..=1.0,
            tex_w in 100u32..=6000,
            tex_h in 100u32..=6000,
        ) {
            let matrix = ProjectionMatrix::build(vertical, horizontal, straighten, false);
            let center = Point::new(cx, cy);
            let size = (tex_w, tex_h);

            // Only meaningful when the centre itself samples real pixels
            let point = NormalisedRect::<Logical>::from_center(cx, cy, 0.0, 0.0);
            prop_assume!(validate_corners_in_uv_space(&point, &matrix, size, 3).valid);

            let settings = SearchSettings::default();
            let search = find_max_safe_scale_binary_search::<Logical>(
                center, w, h, &matrix, size, settings,
            );

            prop_assert!(search.iterations <= settings.max_iterations);
            prop_assert!((0.0..=1.0).contains(&search.scale));

            let rect = NormalisedRect::<Logical>::from_center(
                cx, cy, w * search.scale, h * search.scale,
            );
            prop_assert!(validate_corners_in_uv_space(&rect, &matrix, size, 3).valid);
        }
    }
}
