//! View pan/zoom and edge-push behaviour.
//!
//! The view places the (logical) image inside the viewport:
//!
//! ```text
//! screen_x = viewport_w / 2 + pan_x + (u - 0.5) * image_w * zoom
//! screen_y = viewport_h / 2 + pan_y + (v - 0.5) * image_h * zoom
//! ```
//!
//! All screen quantities are device pixels; `zoom` is device pixels per
//! image pixel. Pointer deltas arrive in logical pixels and are multiplied
//! by the device pixel ratio first.

use serde::{Deserialize, Serialize};

use crate::config::InteractionConfig;
use crate::crop::CropHandle;
use crate::damping::{ease_in_quad, AutoScaleDamper};
use crate::space::{Logical, NormalisedRect, Point, RotateSteps};

/// Zoom values at or below this are treated as unusable.
pub const MIN_USABLE_ZOOM: f64 = 1e-6;

/// Pixel dimensions of the source image, before any rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions as displayed after `steps` quarter turns.
    pub fn logical(&self, steps: RotateSteps) -> ImageSize {
        if steps.is_odd() {
            ImageSize::new(self.height, self.width)
        } else {
            *self
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            1.0
        } else {
            f64::from(self.width) / f64::from(self.height)
        }
    }
}

/// Size of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in device pixels
    pub width_px: f64,
    /// Height in device pixels
    pub height_px: f64,
    /// Device pixels per logical pixel
    pub device_pixel_ratio: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width_px: 1024.0,
            height_px: 768.0,
            device_pixel_ratio: 1.0,
        }
    }
}

impl Viewport {
    /// Create a viewport; a non-positive pixel ratio falls back to 1.0.
    pub fn new(width_px: f64, height_px: f64, device_pixel_ratio: f64) -> Self {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            width_px: width_px.max(0.0),
            height_px: height_px.max(0.0),
            device_pixel_ratio: dpr,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width_px * 0.5, self.height_px * 0.5)
    }
}

/// Pan and zoom of the image inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Device pixels per image pixel
    pub zoom: f64,
    /// Offset of the image centre from the viewport centre (device px)
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl ViewTransform {
    /// Centred view that shows the whole image.
    pub fn fit(image: ImageSize, viewport: &Viewport) -> Self {
        if image.width == 0 || image.height == 0 {
            return Self::default();
        }
        let zoom_x = viewport.width_px / f64::from(image.width);
        let zoom_y = viewport.height_px / f64::from(image.height);
        let zoom = zoom_x.min(zoom_y);
        Self {
            zoom: if zoom > MIN_USABLE_ZOOM { zoom } else { 1.0 },
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    /// Screen position (device px) of a normalized logical image point.
    pub fn to_screen(&self, p: Point, image: ImageSize, viewport: &Viewport) -> Point {
        let c = viewport.center();
        Point::new(
            c.x + self.pan_x + (p.x - 0.5) * f64::from(image.width) * self.zoom,
            c.y + self.pan_y + (p.y - 0.5) * f64::from(image.height) * self.zoom,
        )
    }

    /// Change zoom while keeping the image point under `anchor` (device
    /// px) fixed on screen.
    pub fn zoom_about(&mut self, anchor: Point, new_zoom: f64, viewport: &Viewport) {
        if !new_zoom.is_finite() || new_zoom <= MIN_USABLE_ZOOM {
            return;
        }
        let c = viewport.center();
        let ax = anchor.x - c.x;
        let ay = anchor.y - c.y;
        let s = new_zoom / self.zoom.max(1e-12);
        self.pan_x = ax - (ax - self.pan_x) * s;
        self.pan_y = ay - (ay - self.pan_y) * s;
        self.zoom = new_zoom;
    }
}

/// Distance (device px) from each crop edge to the matching viewport edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Where the crop edges currently sit on screen.
pub fn crop_margins(
    view: &ViewTransform,
    crop: &NormalisedRect<Logical>,
    image: ImageSize,
    viewport: &Viewport,
) -> EdgeMargins {
    let c = crop.center();
    let left = view.to_screen(Point::new(crop.left, c.y), image, viewport).x;
    let right = view.to_screen(Point::new(crop.right, c.y), image, viewport).x;
    let top = view.to_screen(Point::new(c.x, crop.top), image, viewport).y;
    let bottom = view.to_screen(Point::new(c.x, crop.bottom), image, viewport).y;
    EdgeMargins {
        left,
        right: viewport.width_px - right,
        top,
        bottom: viewport.height_px - bottom,
    }
}

/// View change produced by one edge-push update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePush {
    pub view: ViewTransform,
    /// Strongest edge pressure in `[0, 1]`, before easing
    pub pressure: f64,
}

/// Zoom the view out and pan it away from the boundary while a crop edge
/// is dragged into the edge zone.
///
/// # Algorithm
///
/// For every edge the handle moves outward, with a margin below
/// `edge_threshold_px * dpr`, the pressure is
/// `clamp((threshold - margin) / threshold, 0, 1)`. The strongest pressure
/// is eased (`p²`) and shrinks the zoom by at most `edge_max_shrink`,
/// anchored at the crop centre. The view then pans against the drag by
/// `delta * p` per axis, scaled by a gain between `edge_pan_gain_min` and
/// `edge_pan_gain_max`.
///
/// The crop rectangle itself is not touched, and the returned zoom never
/// exceeds the current one.
///
/// # Returns
///
/// `None` when no dragged edge is inside the edge zone. Translating the
/// whole box (`Inside`) never pushes.
pub fn edge_push(
    view: &ViewTransform,
    crop: &NormalisedRect<Logical>,
    image: ImageSize,
    viewport: &Viewport,
    handle: CropHandle,
    delta_px: Point,
    config: &InteractionConfig,
) -> Option<EdgePush> {
    let dpr = viewport.device_pixel_ratio;
    let threshold = config.edge_threshold_px * dpr;
    if !(threshold > 0.0) {
        return None;
    }

    let margins = crop_margins(view, crop, image, viewport);
    let dx = delta_px.x * dpr;
    let dy = delta_px.y * dpr;
    let edge_pressure = |margin: f64| ((threshold - margin) / threshold).clamp(0.0, 1.0);

    let mut pressure: f64 = 0.0;
    let mut offset_x: f64 = 0.0;
    let mut offset_y: f64 = 0.0;

    if handle.moves_left() && dx < 0.0 && margins.left < threshold {
        let p = edge_pressure(margins.left);
        pressure = pressure.max(p);
        offset_x = offset_x.max(-dx * p);
    }
    if handle.moves_right() && dx > 0.0 && margins.right < threshold {
        let p = edge_pressure(margins.right);
        pressure = pressure.max(p);
        offset_x = offset_x.min(-dx * p);
    }
    if handle.moves_top() && dy < 0.0 && margins.top < threshold {
        let p = edge_pressure(margins.top);
        pressure = pressure.max(p);
        offset_y = offset_y.max(-dy * p);
    }
    if handle.moves_bottom() && dy > 0.0 && margins.bottom < threshold {
        let p = edge_pressure(margins.bottom);
        pressure = pressure.max(p);
        offset_y = offset_y.min(-dy * p);
    }

    if pressure <= 0.0 {
        return None;
    }

    let eased = ease_in_quad(pressure.min(1.0));
    let damper = AutoScaleDamper::new(config.view_damping, config.edge_max_shrink);
    let new_zoom = damper
        .rate_limited_shrink(view.zoom, pressure)
        .clamp(config.min_view_zoom, config.max_view_zoom)
        .min(view.zoom);

    let mut next = *view;
    let anchor = next.to_screen(crop.center(), image, viewport);
    next.zoom_about(anchor, new_zoom, viewport);

    let gain = config.edge_pan_gain_min + (config.edge_pan_gain_max - config.edge_pan_gain_min) * eased;
    next.pan_x += offset_x * gain;
    next.pan_y += offset_y * gain;

    log::trace!(
        "edge push: pressure={:.3} zoom {:.4} -> {:.4}",
        pressure,
        view.zoom,
        next.zoom
    );

    Some(EdgePush {
        view: next,
        pressure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_setup() -> (ImageSize, Viewport, ViewTransform) {
        let image = ImageSize::new(1000, 1000);
        let viewport = Viewport::new(1000.0, 1000.0, 1.0);
        let view = ViewTransform::fit(image, &viewport);
        (image, viewport, view)
    }

    #[test]
    fn test_image_size_logical_swaps_for_odd_steps() {
        let size = ImageSize::new(4000, 3000);
        assert_eq!(size.logical(RotateSteps::new(1)), ImageSize::new(3000, 4000));
        assert_eq!(size.logical(RotateSteps::new(2)), size);
        assert!((size.aspect_ratio() - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_viewport_rejects_bad_dpr() {
        assert_eq!(Viewport::new(10.0, 10.0, 0.0).device_pixel_ratio, 1.0);
        assert_eq!(Viewport::new(10.0, 10.0, f64::NAN).device_pixel_ratio, 1.0);
        assert_eq!(Viewport::new(10.0, 10.0, 2.0).device_pixel_ratio, 2.0);
    }

    #[test]
    fn test_fit_shows_whole_image() {
        let image = ImageSize::new(2000, 1000);
        let viewport = Viewport::new(1000.0, 1000.0, 1.0);
        let view = ViewTransform::fit(image, &viewport);
        assert!((view.zoom - 0.5).abs() < 1e-12);

        let tl = view.to_screen(Point::new(0.0, 0.0), image, &viewport);
        let br = view.to_screen(Point::new(1.0, 1.0), image, &viewport);
        assert!((tl.x - 0.0).abs() < 1e-9 && (tl.y - 250.0).abs() < 1e-9);
        assert!((br.x - 1000.0).abs() < 1e-9 && (br.y - 750.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_about_keeps_anchor_fixed() {
        let (image, viewport, mut view) = square_setup();
        view.pan_x = 30.0;
        let point = Point::new(0.8, 0.3);
        let anchor = view.to_screen(point, image, &viewport);

        view.zoom_about(anchor, 0.6, &viewport);
        let after = view.to_screen(point, image, &viewport);
        assert!((after.x - anchor.x).abs() < 1e-9);
        assert!((after.y - anchor.y).abs() < 1e-9);
        assert_eq!(view.zoom, 0.6);
    }

    #[test]
    fn test_zoom_about_ignores_invalid_zoom() {
        let (_, viewport, mut view) = square_setup();
        let before = view;
        view.zoom_about(Point::new(0.0, 0.0), 0.0, &viewport);
        view.zoom_about(Point::new(0.0, 0.0), f64::NAN, &viewport);
        assert_eq!(view, before);
    }

    #[test]
    fn test_crop_margins() {
        let (image, viewport, view) = square_setup();
        let crop = NormalisedRect::<Logical>::from_edges(0.1, 0.2, 0.7, 0.95);
        let m = crop_margins(&view, &crop, image, &viewport);
        assert!((m.left - 100.0).abs() < 1e-9);
        assert!((m.right - 300.0).abs() < 1e-9);
        assert!((m.top - 200.0).abs() < 1e-9);
        assert!((m.bottom - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_edge_push_at_boundary() {
        let (image, viewport, view) = square_setup();
        let crop = NormalisedRect::<Logical>::full();
        let config = InteractionConfig::default();

        let push = edge_push(
            &view,
            &crop,
            image,
            &viewport,
            CropHandle::Right,
            Point::new(10.0, 0.0),
            &config,
        )
        .expect("right edge sits on the viewport boundary");

        assert_eq!(push.pressure, 1.0);
        assert!((push.view.zoom - 0.95).abs() < 1e-12);
        // Anchored at the viewport centre, so only the pan against the drag
        // remains, at full gain
        assert!((push.view.pan_x + 10.0).abs() < 1e-9);
        assert!(push.view.pan_y.abs() < 1e-9);
    }

    #[test]
    fn test_edge_push_ignores_inward_drag() {
        let (image, viewport, view) = square_setup();
        let crop = NormalisedRect::<Logical>::full();
        let config = InteractionConfig::default();
        let push = edge_push(
            &view,
            &crop,
            image,
            &viewport,
            CropHandle::Right,
            Point::new(-10.0, 0.0),
            &config,
        );
        assert!(push.is_none());
    }

    #[test]
    fn test_edge_push_ignores_far_edges() {
        let (image, viewport, view) = square_setup();
        let crop = NormalisedRect::<Logical>::from_edges(0.2, 0.2, 0.8, 0.8);
        let config = InteractionConfig::default();
        let push = edge_push(
            &view,
            &crop,
            image,
            &viewport,
            CropHandle::BottomRight,
            Point::new(10.0, 10.0),
            &config,
        );
        assert!(push.is_none());
    }

    #[test]
    fn test_translating_never_pushes() {
        let (image, viewport, view) = square_setup();
        let crop = NormalisedRect::<Logical>::full();
        let config = InteractionConfig::default();
        let push = edge_push(
            &view,
            &crop,
            image,
            &viewport,
            CropHandle::Inside,
            Point::new(10.0, 10.0),
            &config,
        );
        assert!(push.is_none());
    }

    #[test]
    fn test_edge_push_partial_pressure() {
        let (image, viewport, view) = square_setup();
        // Top edge 24px from the viewport top: half pressure
        let crop = NormalisedRect::<Logical>::from_edges(0.2, 0.024, 0.8, 0.8);
        let config = InteractionConfig::default();
        let push = edge_push(
            &view,
            &crop,
            image,
            &viewport,
            CropHandle::Top,
            Point::new(0.0, -8.0),
            &config,
        )
        .unwrap();

        assert!((push.pressure - 0.5).abs() < 1e-9);
        let eased = 0.25;
        assert!((push.view.zoom - (1.0 - 0.05 * eased)).abs() < 1e-9);
        assert!(push.view.pan_y > 0.0, "view should pan down, away from the top");
    }

    #[test]
    fn test_edge_threshold_scales_with_dpr() {
        let image = ImageSize::new(1000, 1000);
        let viewport = Viewport::new(2000.0, 2000.0, 2.0);
        let view = ViewTransform::fit(image, &viewport);
        // Right edge 80 device px from the boundary: outside 48px at 1x,
        // inside 96px at 2x
        let crop = NormalisedRect::<Logical>::from_edges(0.2, 0.2, 0.96, 0.8);
        let config = InteractionConfig::default();
        let push = edge_push(
            &view,
            &crop,
            image,
            &viewport,
            CropHandle::Right,
            Point::new(5.0, 0.0),
            &config,
        );
        assert!(push.is_some());
    }

    #[test]
    fn test_edge_push_respects_min_zoom() {
        let (image, viewport, mut view) = square_setup();
        let config = InteractionConfig::default();
        view.zoom = config.min_view_zoom;
        let crop = NormalisedRect::<Logical>::full();
        let push = edge_push(
            &view,
            &crop,
            image,
            &viewport,
            CropHandle::Left,
            Point::new(-5.0, 0.0),
            &config,
        );
        // Crop edges are nowhere near the boundary at this zoom
        assert!(push.is_none());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
