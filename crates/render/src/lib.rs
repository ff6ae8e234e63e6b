//! Rendering adapter: the immediate-mode quad API the engine and scripts draw with.
//!
//! # Invariants
//! - Projection, view, transform and bound texture persist until replaced.
//! - Every quad is drawn with `projection * view * transform`.
//! - Texture handle 0 is a 1x1 white texture and is always valid.
//!
//! The [`RenderBackend`] trait is stable; the headless backend records
//! commands for tests and CLI runs, the wgpu backend lives in its own crate.

mod backend;
mod headless;
mod shared;
mod transform;

pub use backend::{RenderBackend, RenderError, TextureHandle, validate_texture_data};
pub use headless::{HeadlessRenderer, RenderCommand};
pub use shared::SharedRenderer;
pub use transform::{Transform3D, orthographic, view};

pub fn crate_info() -> &'static str {
    "woodgas-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
