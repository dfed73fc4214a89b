//! Crop controller WASM bindings.
//!
//! One `JsCropController` per editing surface. The host forwards pointer
//! and slider events and reads back the crop, quad and matrix each frame.

use keystone_core::controller::{CropController, InteractionState};
use keystone_core::{
    CommitRecord, CropError, CropHandle, InteractionConfig, RotateSteps, ViewTransform, Viewport,
};
use serde::de::value::{Error as DeError, StrDeserializer};
use serde::de::IntoDeserializer;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

fn to_js_error(e: CropError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn config_from_js(config: JsValue) -> Result<InteractionConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(InteractionConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsValue::from_str(&format!("Invalid interaction config: {}", e)))
}

/// Parse a handle name as sent by the host (`"top_left"`, `"inside"`, ...).
///
/// Uses `CropHandle`'s serde names.
pub(crate) fn parse_handle(name: &str) -> Result<CropHandle, DeError> {
    let deserializer: StrDeserializer<'_, DeError> = name.into_deserializer();
    CropHandle::deserialize(deserializer)
}

pub(crate) fn state_name(state: InteractionState) -> &'static str {
    match state {
        InteractionState::Idle => "idle",
        InteractionState::DraggingFree => "dragging_free",
        InteractionState::DraggingPerspective => "dragging_perspective",
        InteractionState::DraggingEdge => "dragging_edge",
    }
}

/// Crop controller wrapper for JavaScript.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const crop = new JsCropController(6000, 4000, undefined);
/// crop.set_viewport(canvas.width, canvas.height, devicePixelRatio);
///
/// slider.onpointerdown = () => crop.begin_perspective_drag();
/// slider.oninput = () => crop.update_perspective(v, h, straighten, steps, flip);
/// slider.onpointerup = () => crop.release();
///
/// const [cx, cy, w, h] = crop.crop_rect();
/// gl.uniformMatrix3fv(loc, false, crop.matrix());
/// ```
#[wasm_bindgen]
pub struct JsCropController {
    inner: CropController,
}

#[wasm_bindgen]
impl JsCropController {
    /// Create a controller for an image of the given pixel size.
    ///
    /// `config` may be `undefined` for defaults, or a partial object of
    /// interaction settings.
    #[wasm_bindgen(constructor)]
    pub fn new(
        image_width: u32,
        image_height: u32,
        config: JsValue,
    ) -> Result<JsCropController, JsValue> {
        let config = config_from_js(config)?;
        Self::with_config(image_width, image_height, config).map_err(to_js_error)
    }

    /// Restore a controller from a record produced by `commit()`.
    pub fn from_record(
        record: JsValue,
        image_width: u32,
        image_height: u32,
        config: JsValue,
    ) -> Result<JsCropController, JsValue> {
        let record: CommitRecord = serde_wasm_bindgen::from_value(record)
            .map_err(|e| JsValue::from_str(&format!("Invalid crop record: {}", e)))?;
        let config = config_from_js(config)?;
        let inner = CropController::from_record(&record, image_width, image_height, config)
            .map_err(to_js_error)?;
        Ok(Self { inner })
    }

    /// Replace the interaction settings.
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config = config_from_js(config)?;
        self.inner.set_config(config).map_err(to_js_error)
    }

    /// Resize the drawing surface. Resets the view to fit the image.
    pub fn set_viewport(&mut self, width_px: f64, height_px: f64, device_pixel_ratio: f64) {
        self.inner
            .set_viewport(Viewport::new(width_px, height_px, device_pixel_ratio));
    }

    /// Get the current interaction state name
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        state_name(self.inner.state()).to_string()
    }

    /// Get the current 90° rotation step count (0 to 3)
    #[wasm_bindgen(getter)]
    pub fn rotate_steps(&self) -> u8 {
        self.inner.rotate_steps().get()
    }

    /// Crop in logical space as `[cx, cy, width, height]`.
    pub fn crop_rect(&self) -> Vec<f64> {
        let crop = self.inner.crop();
        vec![crop.cx, crop.cy, crop.width, crop.height]
    }

    /// Valid image region as `[x0, y0, x1, y1, x2, y2, x3, y3]` (TL, TR, BR, BL).
    pub fn quad(&self) -> Vec<f64> {
        self.inner
            .quad()
            .corners()
            .iter()
            .flat_map(|p| [p.x, p.y])
            .collect()
    }

    /// Sampling matrix as a column-major `Float32Array` for `uniformMatrix3fv`.
    pub fn matrix(&self) -> js_sys::Float32Array {
        let m = self.inner.matrix().to_column_major_f32();
        js_sys::Float32Array::from(&m[..])
    }

    /// View transform as `[zoom, pan_x, pan_y]`.
    pub fn view(&self) -> Vec<f64> {
        let view = self.inner.view();
        vec![view.zoom, view.pan_x, view.pan_y]
    }

    /// Set the view transform (zoom is clamped to the configured range).
    pub fn set_view(&mut self, zoom: f64, pan_x: f64, pan_y: f64) {
        self.inner.set_view(ViewTransform { zoom, pan_x, pan_y });
    }

    /// Fit the whole image into the viewport.
    pub fn reset_view(&mut self) {
        self.inner.reset_view();
    }

    /// Slider pressed.
    pub fn begin_perspective_drag(&mut self) -> Result<(), JsValue> {
        self.inner.begin_perspective_drag().map_err(to_js_error)
    }

    /// Slider moved. Returns `false` if nothing changed.
    pub fn update_perspective(
        &mut self,
        vertical: f64,
        horizontal: f64,
        straighten_degrees: f64,
        rotate_steps: i32,
        flip_horizontal: bool,
    ) -> bool {
        self.inner.update_perspective(
            vertical,
            horizontal,
            straighten_degrees,
            RotateSteps::new(rotate_steps),
            flip_horizontal,
        )
    }

    /// Handle pressed. `handle` is one of `top_left`, `top`, `top_right`,
    /// `right`, `bottom_right`, `bottom`, `bottom_left`, `left`, `inside`.
    pub fn begin_handle_drag(&mut self, handle: &str) -> Result<(), JsValue> {
        let handle = parse_handle(handle)
            .map_err(|e| JsValue::from_str(&format!("Unknown crop handle {}: {}", handle, e)))?;
        self.inner.begin_handle_drag(handle).map_err(to_js_error)
    }

    /// Pointer moved by `(dx, dy)` CSS pixels. Returns `true` if the crop
    /// or view changed.
    pub fn drag_handle(&mut self, dx: f64, dy: f64) -> bool {
        self.inner.drag_handle(dx, dy)
    }

    /// Pointer or slider released.
    pub fn release(&mut self) {
        self.inner.release();
    }

    /// One damped view zoom-out step toward showing the whole crop.
    /// Call once per frame while a drag is active.
    pub fn auto_scale_view(&mut self) -> bool {
        self.inner.auto_scale_view_to_fill_crop()
    }

    pub fn rotate_clockwise(&mut self) -> Result<(), JsValue> {
        self.inner.rotate_clockwise().map_err(to_js_error)
    }

    pub fn rotate_counter_clockwise(&mut self) -> Result<(), JsValue> {
        self.inner.rotate_counter_clockwise().map_err(to_js_error)
    }

    /// Crop shrunk to keep a texel safety margin, as `[cx, cy, width, height]`.
    pub fn texture_safe_crop(&self) -> Vec<f64> {
        let rect = self.inner.texture_safe_crop();
        let c = rect.center();
        vec![c.x, c.y, rect.width(), rect.height()]
    }

    /// Crop in source pixels as `[x, y, width, height]`, or `undefined` for a
    /// full-image crop.
    pub fn crop_rect_pixels(&self) -> Option<Vec<u32>> {
        self.inner
            .crop_rect_pixels()
            .map(|r| vec![r.x, r.y, r.width, r.height])
    }

    /// Serialize the crop (texture space) and perspective values for storage
    pub fn commit(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.commit())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl JsCropController {
    pub(crate) fn with_config(
        image_width: u32,
        image_height: u32,
        config: InteractionConfig,
    ) -> Result<Self, CropError> {
        let inner = CropController::new(image_width, image_height, config)?;
        Ok(Self { inner })
    }

    /// Get a reference to the wrapped controller
    pub(crate) fn inner(&self) -> &CropController {
        &self.inner
    }
}
