//! wgpu render backend for the woodgas engine.
//!
//! Opens a winit window, pumps its event loop from the caller's frame loop,
//! and draws instanced textured quads.
//!
//! # Invariants
//! - Quads are drawn in submission order; there is no depth buffer.
//! - Texture handle 0 is the built-in white texture.
//! - The event loop is only pumped from `poll_inputs` (and during startup).

mod gpu;
mod keymap;
mod shaders;
mod window;

pub use gpu::{QuadInstance, QuadPipeline};
pub use keymap::map_key;
pub use window::{WindowError, WindowRenderer};

pub fn crate_info() -> &'static str {
    "woodgas-render-wgpu v0.1.0"
}
