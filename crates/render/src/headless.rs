use crate::{RenderBackend, RenderError, TextureHandle, validate_texture_data};
use glam::Mat4;
use std::collections::VecDeque;
use woodgas_input::{InputState, Key};

/// One recorded call against the headless backend.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Clear,
    UploadOrthographic(Mat4),
    UploadView(Mat4),
    UploadTransform(Mat4),
    BindTexture(TextureHandle),
    /// A drawn quad with its final `projection * view * model` matrix.
    DrawQuad { mvp: Mat4, texture: TextureHandle },
    BeginBatch,
    EndBatch,
}

/// Backend without a window or GPU.
///
/// Records the commands of the current frame, keeps the last presented frame
/// for inspection, and can close itself after a fixed number of frames so
/// scripted main loops terminate in tests and CLI runs.
#[derive(Debug)]
pub struct HeadlessRenderer {
    projection: Mat4,
    view: Mat4,
    transform: Mat4,
    bound: TextureHandle,
    /// Texture sizes, indexed by handle.
    textures: Vec<(u32, u32)>,
    frame: Vec<RenderCommand>,
    last_frame: Vec<RenderCommand>,
    frames_presented: u64,
    total_quads: u64,
    max_frames: Option<u64>,
    close_requested: bool,
    input: InputState,
    pending_keys: VecDeque<(Key, bool)>,
    polls: u64,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            transform: Mat4::IDENTITY,
            bound: TextureHandle::WHITE,
            textures: vec![(1, 1)],
            frame: Vec::new(),
            last_frame: Vec::new(),
            frames_presented: 0,
            total_quads: 0,
            max_frames: None,
            close_requested: false,
            input: InputState::new(),
            pending_keys: VecDeque::new(),
            polls: 0,
        }
    }

    /// Report the window as closed once `frames` frames were presented.
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Queue a key event, applied on the next `poll_inputs`.
    pub fn queue_key(&mut self, key: Key, down: bool) {
        self.pending_keys.push_back((key, down));
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn total_quads(&self) -> u64 {
        self.total_quads
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Commands recorded since the last `swap_buffers`.
    pub fn current_frame(&self) -> &[RenderCommand] {
        &self.frame
    }

    /// Commands of the most recently presented frame.
    pub fn last_frame(&self) -> &[RenderCommand] {
        &self.last_frame
    }

    /// Quads drawn in the most recently presented frame.
    pub fn last_frame_quads(&self) -> impl Iterator<Item = (Mat4, TextureHandle)> + '_ {
        self.last_frame.iter().filter_map(|cmd| match cmd {
            RenderCommand::DrawQuad { mvp, texture } => Some((*mvp, *texture)),
            _ => None,
        })
    }

    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(texture.0 as usize).copied()
    }

    pub fn current_transform(&self) -> Mat4 {
        self.transform
    }

    pub fn bound_texture(&self) -> TextureHandle {
        self.bound
    }

    fn check_texture(&self, texture: TextureHandle) -> Result<(), RenderError> {
        if (texture.0 as usize) < self.textures.len() {
            Ok(())
        } else {
            Err(RenderError::UnknownTexture(texture))
        }
    }

    fn push_quad(&mut self, model: Mat4, texture: TextureHandle) {
        self.frame.push(RenderCommand::DrawQuad {
            mvp: self.projection * self.view * model,
            texture,
        });
        self.total_quads += 1;
    }
}

impl RenderBackend for HeadlessRenderer {
    fn is_window_open(&self) -> bool {
        !self.close_requested
            && self
                .max_frames
                .is_none_or(|max| self.frames_presented < max)
    }

    fn poll_inputs(&mut self) {
        self.polls += 1;
        while let Some((key, down)) = self.pending_keys.pop_front() {
            self.input.set(key, down);
        }
    }

    fn input_state(&self) -> InputState {
        self.input.clone()
    }

    fn clear(&mut self) {
        self.frame.push(RenderCommand::Clear);
    }

    fn upload_orthographic(&mut self, projection: Mat4) {
        self.projection = projection;
        self.frame.push(RenderCommand::UploadOrthographic(projection));
    }

    fn upload_view(&mut self, view: Mat4) {
        self.view = view;
        self.frame.push(RenderCommand::UploadView(view));
    }

    fn upload_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.frame.push(RenderCommand::UploadTransform(transform));
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, RenderError> {
        validate_texture_data(width, height, rgba.len())?;
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push((width, height));
        tracing::debug!(?handle, width, height, "headless texture created");
        Ok(handle)
    }

    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), RenderError> {
        self.check_texture(texture)?;
        self.bound = texture;
        self.frame.push(RenderCommand::BindTexture(texture));
        Ok(())
    }

    fn draw_quad(&mut self) {
        self.push_quad(self.transform, self.bound);
    }

    fn begin_batch(&mut self) {
        self.frame.push(RenderCommand::BeginBatch);
    }

    fn batch_quad(&mut self, transform: Mat4, texture: TextureHandle) -> Result<(), RenderError> {
        self.check_texture(texture)?;
        self.push_quad(transform, texture);
        Ok(())
    }

    fn end_batch(&mut self) {
        self.frame.push(RenderCommand::EndBatch);
    }

    fn swap_buffers(&mut self) -> Result<(), RenderError> {
        self.last_frame = std::mem::take(&mut self.frame);
        self.frames_presented += 1;
        tracing::trace!(
            frame = self.frames_presented,
            commands = self.last_frame.len(),
            "headless frame presented"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Transform3D, orthographic};

    #[test]
    fn closes_after_max_frames() {
        let mut r = HeadlessRenderer::new().with_max_frames(2);
        assert!(r.is_window_open());
        r.swap_buffers().unwrap();
        assert!(r.is_window_open());
        r.swap_buffers().unwrap();
        assert!(!r.is_window_open());
        assert_eq!(r.frames_presented(), 2);
    }

    #[test]
    fn request_close() {
        let mut r = HeadlessRenderer::new();
        assert!(r.is_window_open());
        r.request_close();
        assert!(!r.is_window_open());
    }

    #[test]
    fn draw_uses_sticky_state() {
        let mut r = HeadlessRenderer::new();
        let proj = orthographic(-2.0, 2.0, -1.0, 1.0, 0.1, 100.0).unwrap();
        let model = Transform3D::new().translate(1.0, 0.0, 0.0).matrix();
        r.upload_orthographic(proj);
        r.upload_transform(model);
        r.draw_quad();
        r.swap_buffers().unwrap();
        // transform and projection persist into the next frame
        r.draw_quad();
        r.swap_buffers().unwrap();

        let quads: Vec<_> = r.last_frame_quads().collect();
        assert_eq!(quads, vec![(proj * model, TextureHandle::WHITE)]);
        assert_eq!(r.total_quads(), 2);
    }

    #[test]
    fn frame_is_recorded_and_reset() {
        let mut r = HeadlessRenderer::new();
        r.clear();
        r.draw_quad();
        assert_eq!(r.current_frame().len(), 2);
        r.swap_buffers().unwrap();
        assert!(r.current_frame().is_empty());
        assert_eq!(r.last_frame()[0], RenderCommand::Clear);
    }

    #[test]
    fn textures_are_validated() {
        let mut r = HeadlessRenderer::new();
        let tex = r.create_texture(2, 1, &[255; 8]).unwrap();
        assert_eq!(tex, TextureHandle(1));
        assert_eq!(r.texture_size(tex), Some((2, 1)));
        assert!(r.bind_texture(tex).is_ok());
        assert!(matches!(
            r.bind_texture(TextureHandle(9)),
            Err(RenderError::UnknownTexture(TextureHandle(9)))
        ));
        assert!(r.create_texture(2, 2, &[0; 3]).is_err());
    }

    #[test]
    fn batch_leaves_state_alone() {
        let mut r = HeadlessRenderer::new();
        let tex = r.create_texture(1, 1, &[0; 4]).unwrap();
        let model = Transform3D::new().translate(0.0, 3.0, 0.0).matrix();
        r.begin_batch();
        r.batch_quad(model, tex).unwrap();
        r.end_batch();

        assert_eq!(r.current_transform(), Mat4::IDENTITY);
        assert_eq!(r.bound_texture(), TextureHandle::WHITE);
        assert!(r.batch_quad(model, TextureHandle(5)).is_err());
    }

    #[test]
    fn queued_keys_apply_on_poll() {
        let mut r = HeadlessRenderer::new();
        r.queue_key(Key::Space, true);
        assert!(!r.input_state().is_key_down(Key::Space));
        r.poll_inputs();
        assert!(r.input_state().is_key_down(Key::Space));
        r.queue_key(Key::Space, false);
        r.poll_inputs();
        assert!(!r.input_state().is_key_down(Key::Space));
        assert_eq!(r.polls(), 2);
    }
}
