//! Keystone WASM - WebAssembly bindings for Keystone
//!
//! This crate exposes the keystone-core crop controller to a browser host,
//! which owns the event loop and the WebGL renderer.
//!
//! # Module Structure
//!
//! - `controller` - `JsCropController`, one per editing surface
//! - `geometry` - stateless coordinate conversions and matrix building
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropController } from '@keystone/wasm';
//!
//! await init();
//!
//! const crop = new JsCropController(image.width, image.height, undefined);
//! crop.begin_handle_drag('bottom_right');
//! crop.drag_handle(dx, dy);
//! crop.release();
//! save(crop.commit());
//! ```

use wasm_bindgen::prelude::*;

mod controller;
mod geometry;

pub use controller::JsCropController;
pub use geometry::{crop_fit_scale, logical_to_texture_rect, projection_matrix, texture_to_logical_rect};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
