//! flow-vignette
//!
//! Small 3D scene demos on a retained scene graph and a wgpu renderer that
//! run natively and in the browser (WASM + WebGL2). Each demo is a flow: it
//! builds its scene, configures the shared context and reacts to input and
//! asset completions while the event loop renders it.
//!
//! High-level modules
//! - `camera`: camera, projection, uniforms and pointer driven controllers
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene graph, geometry, materials and their GPU mirror
//! - `flow`: high level flow control (scenes / update loops)
//! - `pipelines`: the solid, point and sky pipelines and the light uniform
//! - `resources`: model/texture loading, primitive builders and the asset loader
//! - `render`: render composition for efficient pipeline reuse
//! - `animation`: clip playback through animation mixers
//! - `input`, `panel`, `audio`, `scatter`: interaction and scenery helpers
//! - `demos`: the primitive demos and the outdoor vignette
//!

pub mod animation;
pub mod audio;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod demos;
pub mod flow;
pub mod gui;
pub mod input;
pub mod panel;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scatter;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::WindowEvent;

/// Browser entry point: runs the demo called `name` on a canvas appended to
/// the document body.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn start_demo(name: &str) -> Result<(), wasm_bindgen::JsValue> {
    demos::run_demo(name).map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{:#}", e)))
}
