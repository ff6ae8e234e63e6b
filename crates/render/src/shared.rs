use crate::{RenderBackend, RenderError, TextureHandle};
use glam::Mat4;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use woodgas_input::InputState;

/// Clonable handle to one backend.
///
/// The game loop and the scripting bridge both draw through the same
/// backend. Each trait call borrows the backend for that call only, so
/// handles never hold a borrow across calls.
#[derive(Clone)]
pub struct SharedRenderer {
    inner: Rc<RefCell<dyn RenderBackend>>,
}

impl std::fmt::Debug for SharedRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRenderer")
            .field("handles", &Rc::strong_count(&self.inner))
            .finish()
    }
}

impl SharedRenderer {
    pub fn new(backend: impl RenderBackend + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(backend)),
        }
    }

    /// Wrap an existing handle; the caller keeps typed access to the backend.
    pub fn from_rc(inner: Rc<RefCell<dyn RenderBackend>>) -> Self {
        Self { inner }
    }

    /// Panics if the backend is mutably borrowed, which only happens inside
    /// another call on the same backend.
    pub fn borrow(&self) -> Ref<'_, dyn RenderBackend> {
        self.inner.borrow()
    }

    /// Mutable access through a shared handle, for callbacks that only get `&self`.
    pub fn borrow_mut(&self) -> RefMut<'_, dyn RenderBackend> {
        self.inner.borrow_mut()
    }
}

impl RenderBackend for SharedRenderer {
    fn is_window_open(&self) -> bool {
        self.inner.borrow().is_window_open()
    }

    fn poll_inputs(&mut self) {
        self.inner.borrow_mut().poll_inputs();
    }

    fn input_state(&self) -> InputState {
        self.inner.borrow().input_state()
    }

    fn clear(&mut self) {
        self.inner.borrow_mut().clear();
    }

    fn upload_orthographic(&mut self, projection: Mat4) {
        self.inner.borrow_mut().upload_orthographic(projection);
    }

    fn upload_view(&mut self, view: Mat4) {
        self.inner.borrow_mut().upload_view(view);
    }

    fn upload_transform(&mut self, transform: Mat4) {
        self.inner.borrow_mut().upload_transform(transform);
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, RenderError> {
        self.inner.borrow_mut().create_texture(width, height, rgba)
    }

    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), RenderError> {
        self.inner.borrow_mut().bind_texture(texture)
    }

    fn draw_quad(&mut self) {
        self.inner.borrow_mut().draw_quad();
    }

    fn begin_batch(&mut self) {
        self.inner.borrow_mut().begin_batch();
    }

    fn batch_quad(&mut self, transform: Mat4, texture: TextureHandle) -> Result<(), RenderError> {
        self.inner.borrow_mut().batch_quad(transform, texture)
    }

    fn end_batch(&mut self) {
        self.inner.borrow_mut().end_batch();
    }

    fn swap_buffers(&mut self) -> Result<(), RenderError> {
        self.inner.borrow_mut().swap_buffers()
    }
}
