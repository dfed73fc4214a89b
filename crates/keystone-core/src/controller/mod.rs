//! The crop interaction controller.
//!
//! One [`CropController`] owns the crop box of one editing surface. Hosts
//! feed it press/move/release and slider events; after every call the crop
//! is clamped to the unit square and, outside of a perspective drag,
//! never grows past the projected image footprint.
//!
//! # States
//!
//! ```text
//! Idle ──begin_perspective_drag──▶ DraggingPerspective ──release──▶ Idle
//! Idle ──begin_handle_drag──▶ DraggingFree ──(edge zone)──▶ DraggingEdge
//! DraggingFree / DraggingEdge ──release──▶ Idle
//! ```
//!
//! While a perspective drag is active, every slider update re-fits the
//! crop captured at press time (so it can grow back). In every other
//! state the controller only shrinks or recentres a crop that no longer
//! fits.

mod record;
mod session;
mod view;

pub use record::{CommitRecord, FrameDescriptor};
pub use session::{InteractionSession, InteractionState, SessionMode};
pub use view::{
    crop_margins, edge_push, EdgeMargins, EdgePush, ImageSize, ViewTransform, Viewport,
    MIN_USABLE_ZOOM,
};

use crate::config::InteractionConfig;
use crate::constraint::{constrain_rect_to_uv_bounds, is_inside, min_scale_to_fit, SearchSettings};
use crate::crop::{crop_rect_pixels, CropBox, CropHandle, CropSnapshot, PixelRect};
use crate::damping::AutoScaleDamper;
use crate::error::CropError;
use crate::perspective::{projected_unit_quad, AxisRemap, ProjectionMatrix};
use crate::quad::Quad;
use crate::space::{
    clamp_unit, logical_to_texture, texture_to_logical, Logical, NormalisedRect, Point,
    RotateSteps,
};
use crate::PerspectiveParams;

/// Scale factors at or below `1 + PASSIVE_SHRINK_EPSILON` are not applied
/// when shrinking outside of a perspective drag.
const PASSIVE_SHRINK_EPSILON: f64 = 1e-4;

/// Crop interaction state machine for one editing surface.
#[derive(Debug, Clone)]
pub struct CropController {
    config: InteractionConfig,
    crop: CropBox,
    params: PerspectiveParams,
    image: ImageSize,
    viewport: Viewport,
    view: ViewTransform,
    matrix: ProjectionMatrix,
    quad: Quad<Logical>,
    session: Option<InteractionSession>,
    /// View zoom when the current session started
    session_zoom: Option<f64>,
    damper: AutoScaleDamper,
}

impl CropController {
    /// Create a controller for an image of the given pixel size, with a
    /// full-image crop and no perspective.
    pub fn new(
        image_width: u32,
        image_height: u32,
        config: InteractionConfig,
    ) -> Result<Self, CropError> {
        config.validate()?;
        if image_width == 0 || image_height == 0 {
            return Err(CropError::InvalidImageSize {
                width: image_width,
                height: image_height,
            });
        }

        let mut controller = Self {
            crop: CropBox::full(config.min_crop_size),
            params: PerspectiveParams::default(),
            image: ImageSize::new(image_width, image_height),
            viewport: Viewport::default(),
            view: ViewTransform::default(),
            matrix: ProjectionMatrix::IDENTITY,
            quad: Quad::unit(),
            session: None,
            session_zoom: None,
            damper: AutoScaleDamper::new(config.view_damping, config.edge_max_shrink),
            config,
        };
        controller.view = controller.fitted_view();
        Ok(controller)
    }

    /// Restore a controller from a committed record.
    pub fn from_record(
        record: &CommitRecord,
        image_width: u32,
        image_height: u32,
        config: InteractionConfig,
    ) -> Result<Self, CropError> {
        let mut controller = Self::new(image_width, image_height, config)?;
        controller.params = record.perspective;
        let logical = texture_to_logical(&record.texture_rect(), controller.params.rotate_steps);
        controller.crop = CropBox::from_rect(&logical, controller.config.min_crop_size);
        controller.refresh_geometry();
        controller.enforce_passive();
        controller.view = controller.fitted_view();
        log::debug!(
            "restored crop ({:.4}, {:.4}, {:.4}, {:.4}) at {} quarter turns",
            controller.crop.cx,
            controller.crop.cy,
            controller.crop.width,
            controller.crop.height,
            controller.params.rotate_steps.get()
        );
        Ok(controller)
    }

    // ===== Accessors =====

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn crop(&self) -> &CropBox {
        &self.crop
    }

    /// Current crop in logical space.
    pub fn crop_rect(&self) -> NormalisedRect<Logical> {
        self.crop.bounds()
    }

    pub fn params(&self) -> &PerspectiveParams {
        &self.params
    }

    pub fn rotate_steps(&self) -> RotateSteps {
        self.params.rotate_steps
    }

    /// Sampling matrix, without the 90° rotation.
    pub fn matrix(&self) -> &ProjectionMatrix {
        &self.matrix
    }

    /// Valid image region in logical space.
    pub fn quad(&self) -> &Quad<Logical> {
        &self.quad
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn image_size(&self) -> ImageSize {
        self.image
    }

    /// Image size as displayed, after rotation.
    pub fn logical_image_size(&self) -> ImageSize {
        self.image.logical(self.params.rotate_steps)
    }

    pub fn session(&self) -> Option<&InteractionSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> InteractionState {
        InteractionState::from(self.session.as_ref())
    }

    pub fn is_crop_inside(&self) -> bool {
        is_inside(&self.crop.bounds(), &self.quad)
    }

    // ===== Host configuration =====

    /// Replace the tuning values. The crop is re-clamped to the new
    /// minimum size.
    pub fn set_config(&mut self, config: InteractionConfig) -> Result<(), CropError> {
        config.validate()?;
        self.damper = AutoScaleDamper::new(config.view_damping, config.edge_max_shrink);
        self.crop.min_width = config.min_crop_size;
        self.crop.min_height = config.min_crop_size;
        self.crop.clamp();
        self.view.zoom = self.view.zoom.clamp(config.min_view_zoom, config.max_view_zoom);
        self.config = config;
        Ok(())
    }

    /// Resize the drawing surface and refit the view to it.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.view = self.fitted_view();
    }

    /// Replace the view transform, clamping the zoom to the configured range.
    pub fn set_view(&mut self, mut view: ViewTransform) {
        if !view.zoom.is_finite() {
            view.zoom = self.fitted_view().zoom;
        }
        view.zoom = view.zoom.clamp(self.config.min_view_zoom, self.config.max_view_zoom);
        self.view = view;
    }

    /// Show the whole image, centred.
    pub fn reset_view(&mut self) {
        self.view = self.fitted_view();
    }

    fn fitted_view(&self) -> ViewTransform {
        let mut view = ViewTransform::fit(self.logical_image_size(), &self.viewport);
        view.zoom = view.zoom.clamp(self.config.min_view_zoom, self.config.max_view_zoom);
        view
    }

    // ===== Sessions =====

    /// Slider pressed: capture the crop size and aspect ratio as the
    /// baseline the following updates try to restore.
    pub fn begin_perspective_drag(&mut self) -> Result<(), CropError> {
        self.ensure_no_session()?;
        let session = InteractionSession::perspective(&self.crop)?;
        log::debug!(
            "perspective drag started, baseline {:.4}x{:.4}",
            session.baseline_width,
            session.baseline_height
        );
        self.start_session(session);
        Ok(())
    }

    /// Handle pressed.
    pub fn begin_handle_drag(&mut self, handle: CropHandle) -> Result<(), CropError> {
        self.ensure_no_session()?;
        let session = InteractionSession::free(&self.crop, handle)?;
        log::debug!("handle drag started on {:?}", handle);
        self.start_session(session);
        Ok(())
    }

    /// Pointer or slider released: end whatever session is active and
    /// fall back to passive enforcement.
    pub fn release(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!("{:?} session released", session.mode);
            self.session_zoom = None;
            self.enforce_passive();
        }
    }

    fn ensure_no_session(&self) -> Result<(), CropError> {
        match &self.session {
            Some(active) => Err(CropError::SessionActive(active.mode)),
            None => Ok(()),
        }
    }

    fn start_session(&mut self, session: InteractionSession) {
        self.session = Some(session);
        self.session_zoom = Some(self.view.zoom);
    }

    // ===== Perspective =====

    /// Apply new slider values.
    ///
    /// # Returns
    ///
    /// `false` when the values match the current ones within 1e-6 and
    /// nothing was recomputed.
    pub fn update_perspective(
        &mut self,
        vertical: f64,
        horizontal: f64,
        straighten_degrees: f64,
        rotate_steps: RotateSteps,
        flip_horizontal: bool,
    ) -> bool {
        let next = PerspectiveParams {
            vertical,
            horizontal,
            straighten_degrees,
            flip_horizontal,
            rotate_steps,
        };
        if !self.params.differs_from(&next) {
            return false;
        }

        let reoriented = next.rotate_steps != self.params.rotate_steps;
        if reoriented {
            self.reorient_crop(next.rotate_steps);
        }
        self.params = next;
        self.refresh_geometry();
        if reoriented {
            self.view = self.fitted_view();
            if self.session.is_some() {
                self.session_zoom = Some(self.view.zoom);
            }
            log::debug!("slider update rotated to {} quarter turns", next.rotate_steps.get());
        }

        match self.session {
            Some(session) if session.mode == SessionMode::Perspective => {
                self.fit_baseline(&session);
            }
            _ => {
                self.enforce_passive();
            }
        }
        true
    }

    /// Recompute matrix and quad from the current parameters.
    fn refresh_geometry(&mut self) {
        let aspect = self.logical_image_size().aspect_ratio();
        self.matrix = AxisRemap::apply(&self.params).matrix(aspect);
        let quad = projected_unit_quad::<Logical>(&self.matrix);
        self.quad = if quad.is_degenerate() {
            log::warn!("projected quad is degenerate, falling back to the unit quad");
            Quad::unit()
        } else {
            quad
        };
    }

    /// Place a baseline-sized crop at the quad centroid, shrinking it
    /// only as much as needed to fit.
    fn fit_baseline(&mut self, session: &InteractionSession) {
        let centroid = self.quad.centroid();
        let center = Point::new(clamp_unit(centroid.x), clamp_unit(centroid.y));
        let candidate = session.baseline_rect(center);
        let scale = min_scale_to_fit(&candidate, &self.quad);
        if !scale.is_finite() || scale <= 0.0 {
            log::trace!("perspective fit skipped, scale {}", scale);
            self.enforce_passive();
            return;
        }

        let (width, height) = if scale <= 1.0 + self.config.fit_epsilon {
            (candidate.width(), candidate.height())
        } else {
            (candidate.width() / scale, candidate.height() / scale)
        };
        log::trace!(
            "perspective fit: scale={:.4} size={:.4}x{:.4}",
            scale,
            width,
            height
        );

        self.crop.set(center.x, center.y, width, height);
        self.enforce_passive();
    }

    // ===== Passive enforcement =====

    /// Recentre and shrink a crop that sticks out of the quad. A crop
    /// that already fits is left alone, and the crop never grows.
    ///
    /// # Returns
    ///
    /// `true` if the crop changed.
    pub fn enforce_passive(&mut self) -> bool {
        if self.is_crop_inside() {
            return false;
        }
        let snapshot = self.crop.snapshot();

        let center = Point::new(self.crop.cx, self.crop.cy);
        if !self.quad.contains_point(center) {
            let centroid = self.quad.centroid();
            self.crop.cx = clamp_unit(centroid.x);
            self.crop.cy = clamp_unit(centroid.y);
            self.crop.clamp();
        }
        self.shrink_crop_to_quad();

        let changed = self.crop.has_changed(&snapshot);
        if changed {
            log::trace!(
                "passive fit: crop now ({:.4}, {:.4}, {:.4}, {:.4})",
                self.crop.cx,
                self.crop.cy,
                self.crop.width,
                self.crop.height
            );
        }
        changed
    }

    /// Keep the crop inside the quad, shrinking it if allowed, or put
    /// back the snapshot.
    ///
    /// # Returns
    ///
    /// `true` if the crop is valid, `false` if it was reverted.
    pub fn ensure_valid_or_revert(&mut self, snapshot: &CropSnapshot, allow_shrink: bool) -> bool {
        if self.is_crop_inside() {
            return true;
        }
        if allow_shrink && self.shrink_crop_to_quad() {
            return true;
        }
        self.crop.restore(snapshot);
        false
    }

    fn shrink_crop_to_quad(&mut self) -> bool {
        let scale = min_scale_to_fit(&self.crop.bounds(), &self.quad);
        if !scale.is_finite() || scale <= 1.0 + PASSIVE_SHRINK_EPSILON {
            return false;
        }
        self.crop.shrink_by(scale);
        true
    }

    // ===== Handle dragging =====

    /// Pointer moved by `(dx, dy)` logical pixels during a handle drag.
    ///
    /// The edges follow the pointer; a move that would leave the quad is
    /// undone. Valid moves near the viewport edge also push the view.
    ///
    /// # Returns
    ///
    /// `true` if the crop or the view changed.
    pub fn drag_handle(&mut self, dx: f64, dy: f64) -> bool {
        let Some(session) = self.session.filter(|s| s.is_handle_drag()) else {
            return false;
        };
        let Some(handle) = session.handle else {
            return false;
        };

        let image = self.logical_image_size();
        let zoom = self.view.zoom;
        if zoom <= MIN_USABLE_ZOOM {
            return false;
        }
        let img_w = f64::from(image.width);
        let img_h = f64::from(image.height);
        let dpr = self.viewport.device_pixel_ratio;
        let nx = dx * dpr / (zoom * img_w);
        let ny = dy * dpr / (zoom * img_h);
        let min_width = self.crop.min_width.max(1.0 / img_w);
        let min_height = self.crop.min_height.max(1.0 / img_h);

        let snapshot = self.crop.snapshot();
        self.crop.drag_handle(handle, nx, ny, min_width, min_height);
        if !self.ensure_valid_or_revert(&snapshot, false) {
            return false;
        }

        let mut pushed = false;
        if let Some(push) = edge_push(
            &self.view,
            &self.crop.bounds(),
            image,
            &self.viewport,
            handle,
            Point::new(dx, dy),
            &self.config,
        ) {
            self.view = push.view;
            pushed = true;
            if let Some(active) = self.session.as_mut() {
                if active.escalate_to_edge() {
                    log::debug!("edge push engaged at pressure {:.3}", push.pressure);
                }
            }
        }

        self.crop.has_changed(&snapshot) || pushed
    }

    // ===== View auto-scale =====

    /// Zoom the view out, damped, when the crop extends past the quad.
    ///
    /// The target is the session's starting zoom (or the fitted zoom when
    /// idle) divided by the crop's shrink factor. The view only ever zooms
    /// out here, anchored at the crop centre.
    ///
    /// # Returns
    ///
    /// `true` if the view changed.
    pub fn auto_scale_view_to_fill_crop(&mut self) -> bool {
        let factor = min_scale_to_fit(&self.crop.bounds(), &self.quad);
        if !factor.is_finite() || factor <= 1.0 + self.config.fit_epsilon {
            return false;
        }

        let reference = self
            .session_zoom
            .unwrap_or_else(|| self.fitted_view().zoom);
        let target = reference / factor;
        let current = self.view.zoom;
        let next = self
            .damper
            .damp_shrink_only(current, target)
            .clamp(self.config.min_view_zoom, self.config.max_view_zoom)
            .min(current);
        if (current - next).abs() < 1e-12 {
            return false;
        }

        let image = self.logical_image_size();
        let anchor = self
            .view
            .to_screen(self.crop.bounds().center(), image, &self.viewport);
        self.view.zoom_about(anchor, next, &self.viewport);
        log::trace!("view auto-scale: zoom {:.4} -> {:.4}", current, next);
        true
    }

    // ===== Rotation =====

    /// Rotate the displayed image a quarter turn clockwise.
    pub fn rotate_clockwise(&mut self) -> Result<(), CropError> {
        self.rotate_to(self.params.rotate_steps.rotated_cw())
    }

    /// Rotate the displayed image a quarter turn counter-clockwise.
    pub fn rotate_counter_clockwise(&mut self) -> Result<(), CropError> {
        self.rotate_to(self.params.rotate_steps.rotated_ccw())
    }

    fn rotate_to(&mut self, steps: RotateSteps) -> Result<(), CropError> {
        self.ensure_no_session()?;
        self.reorient_crop(steps);
        self.params.rotate_steps = steps;
        self.refresh_geometry();
        self.enforce_passive();
        self.view = self.fitted_view();
        log::debug!("rotated to {} quarter turns", steps.get());
        Ok(())
    }

    /// Re-express the logical crop for a new rotation by going through
    /// texture space. An active session's baseline is turned with it.
    fn reorient_crop(&mut self, steps: RotateSteps) {
        let texture = logical_to_texture(&self.crop.bounds(), self.params.rotate_steps);
        let logical = texture_to_logical(&texture, steps);
        let c = logical.center();
        self.crop.set(c.x, c.y, logical.width(), logical.height());
        if steps.is_odd() != self.params.rotate_steps.is_odd() {
            if let Some(session) = self.session.as_mut() {
                session.transpose();
            }
        }
    }

    // ===== Output =====

    /// Per-frame values for the renderer.
    pub fn frame(&self) -> FrameDescriptor {
        FrameDescriptor {
            matrix: self.matrix,
            rotate_steps: self.params.rotate_steps,
            crop: self.crop.bounds(),
            view: self.view,
        }
    }

    /// Crop in texture space plus perspective values, for storage.
    pub fn commit(&self) -> CommitRecord {
        let texture = logical_to_texture(&self.crop.bounds(), self.params.rotate_steps);
        let record = CommitRecord::new(&texture, self.params);
        log::debug!(
            "commit: texture crop ({:.4}, {:.4}, {:.4}, {:.4})",
            record.crop_cx,
            record.crop_cy,
            record.crop_w,
            record.crop_h
        );
        record
    }

    /// The crop shrunk about its centre until every corner samples at
    /// least the configured padding inside the texture.
    pub fn texture_safe_crop(&self) -> NormalisedRect<Logical> {
        let size = self.logical_image_size();
        constrain_rect_to_uv_bounds(
            &self.crop.bounds(),
            &self.matrix,
            (size.width, size.height),
            SearchSettings::from(&self.config),
        )
    }

    /// Crop in source image pixels, or `None` for a full-image crop.
    pub fn crop_rect_pixels(&self) -> Option<PixelRect> {
        let texture = logical_to_texture(&self.crop.bounds(), self.params.rotate_steps);
        crop_rect_pixels(&texture, self.image.width, self.image.height)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::space::Texture;
    use proptest::prelude::*;

    proptest! {
        /// Property: a crop that already fits is left unchanged by passive
        /// enforcement.
        #[test]
        fn prop_passive_is_idempotent_for_fitting_crop(
            cx in 0.3f64..=0.7,
            cy in 0.3f64..=0.7,
            size in 0.05f64..=0.3,
        ) {
            let record = CommitRecord::new(
                &NormalisedRect::<Texture>::from_center(cx, cy, size, size),
                PerspectiveParams::default(),
            );
            let mut controller =
                CropController::from_record(&record, 1200, 800, InteractionConfig::default()).unwrap();
            let snapshot = controller.crop().snapshot();
            prop_assert!(!controller.enforce_passive());
            prop_assert!(!controller.crop().has_changed(&snapshot));
        }

        /// Property: during a perspective drag every update leaves the crop
        /// fitting the quad, up to the acceptance tolerance.
        #[test]
        fn prop_perspective_updates_keep_crop_inside(
            updates in prop::collection::vec(
                (-1.0f64..=1.0, -1.0f64..=1.0, -10.0f64..=10.0),
                1..8,
            ),
            flip in any::<bool>(),
        ) {
            let mut controller =
                CropController::new(1500, 1000, InteractionConfig::default()).unwrap();
            controller.begin_perspective_drag().unwrap();
            for (vertical, horizontal, straighten) in updates {
                controller.update_perspective(vertical, horizontal, straighten, RotateSteps::NONE, flip);
                let scale = min_scale_to_fit(&controller.crop_rect(), controller.quad());
                prop_assert!(scale <= 1.0 + 2e-4, "scale {}", scale);
            }
            controller.release();
            prop_assert_eq!(controller.state(), InteractionState::Idle);
        }
    }
}
