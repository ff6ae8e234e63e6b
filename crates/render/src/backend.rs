use glam::Mat4;
use woodgas_input::InputState;

/// Opaque texture handle issued by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    /// The built-in 1x1 white texture every backend creates up front.
    pub const WHITE: TextureHandle = TextureHandle(0);
}

impl Default for TextureHandle {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Errors from the render API.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid projection: {0}")]
    InvalidProjection(String),
    #[error("texture data for {width}x{height} must be {expected} RGBA bytes, got {actual}")]
    InvalidTextureData {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("unknown texture handle {0:?}")]
    UnknownTexture(TextureHandle),
    #[error("render backend error: {0}")]
    Backend(String),
}

/// Check that `len` bytes describe a `width` x `height` RGBA8 image.
pub fn validate_texture_data(width: u32, height: u32, len: usize) -> Result<(), RenderError> {
    let expected = width as usize * height as usize * 4;
    if width == 0 || height == 0 || len != expected {
        return Err(RenderError::InvalidTextureData {
            width,
            height,
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// Renderer-agnostic immediate-mode interface. All backends implement this trait.
///
/// State (projection, view, transform, bound texture) is sticky: it stays in
/// effect for every draw until replaced, including across frames.
pub trait RenderBackend {
    /// `false` once the window was closed (or the headless frame limit hit).
    fn is_window_open(&self) -> bool;

    /// Process pending window and keyboard events.
    fn poll_inputs(&mut self);

    /// Snapshot of the keys held down as of the last `poll_inputs`.
    fn input_state(&self) -> InputState;

    /// Start the next presented frame from the clear color.
    fn clear(&mut self);

    fn upload_orthographic(&mut self, projection: Mat4);

    fn upload_view(&mut self, view: Mat4);

    fn upload_transform(&mut self, transform: Mat4);

    /// Upload tightly packed RGBA8 pixels as a new texture.
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, RenderError>;

    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), RenderError>;

    /// Draw the unit quad with `projection * view * transform` and the bound texture.
    fn draw_quad(&mut self);

    fn begin_batch(&mut self);

    /// Draw one quad with its own model matrix and texture. Current state is untouched.
    fn batch_quad(&mut self, transform: Mat4, texture: TextureHandle) -> Result<(), RenderError>;

    fn end_batch(&mut self);

    /// Present the frame.
    fn swap_buffers(&mut self) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_data_must_match_dimensions() {
        assert!(validate_texture_data(2, 2, 16).is_ok());
        assert!(matches!(
            validate_texture_data(2, 2, 15),
            Err(RenderError::InvalidTextureData {
                expected: 16,
                actual: 15,
                ..
            })
        ));
        assert!(validate_texture_data(0, 4, 0).is_err());
    }

    #[test]
    fn white_is_default_handle() {
        assert_eq!(TextureHandle::default(), TextureHandle::WHITE);
        assert_eq!(TextureHandle::WHITE.0, 0);
    }
}
