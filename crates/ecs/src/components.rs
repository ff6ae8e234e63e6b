//! Built-in components for 2D scenes.

use crate::{Component, ComponentError, EntityView, FrameContext};
use glam::Vec3;
use woodgas_common::Transform;
use woodgas_render::{TextureHandle, Transform3D, orthographic, view};

/// Position of an entity in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformComponent {
    pub transform: Transform,
}

impl TransformComponent {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            transform: Transform::from_xy(x, y),
        }
    }

    pub fn x(&self) -> f32 {
        self.transform.position.x
    }

    pub fn y(&self) -> f32 {
        self.transform.position.y
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.transform.position += Vec3::new(dx, dy, 0.0);
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.transform.position.x = x;
        self.transform.position.y = y;
    }
}

impl Component for TransformComponent {
    fn init(&mut self, _: &EntityView<'_>, _: &mut FrameContext<'_>) -> Result<(), ComponentError> {
        Ok(())
    }

    fn update(&mut self, _: &EntityView<'_>, _: &mut FrameContext<'_>) -> Result<(), ComponentError> {
        Ok(())
    }

    fn is_unique(&self) -> bool {
        true
    }
}

/// What the active camera sees, published each frame for culling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub x: f32,
    pub y: f32,
    pub aspect_ratio: f32,
    pub scale: f32,
}

impl CameraView {
    /// Half the visible width in world units.
    pub fn half_width(&self) -> f32 {
        self.aspect_ratio * self.scale
    }

    /// Half the visible height in world units.
    pub fn half_height(&self) -> f32 {
        self.scale
    }
}

/// Orthographic camera following the entity's `TransformComponent`.
///
/// `scale` is the half-height of the view in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraComponent {
    aspect_ratio: f32,
    scale: f32,
}

impl CameraComponent {
    pub fn new(aspect_ratio: f32, scale: f32) -> Self {
        Self {
            aspect_ratio,
            scale,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }
}

impl Component for CameraComponent {
    fn init(&mut self, _: &EntityView<'_>, ctx: &mut FrameContext<'_>) -> Result<(), ComponentError> {
        let ar = self.aspect_ratio;
        let projection = orthographic(-ar, ar, -1.0, 1.0, 0.1, 100.0)?;
        ctx.renderer.upload_orthographic(projection);
        Ok(())
    }

    fn update(&mut self, entity: &EntityView<'_>, ctx: &mut FrameContext<'_>) -> Result<(), ComponentError> {
        let transform = entity.require::<TransformComponent>("CameraComponent")?;
        let (x, y) = (transform.x(), transform.y());
        ctx.renderer.upload_view(view(x, y, 0.0, 1.0 / self.scale));
        ctx.resources.insert(CameraView {
            x,
            y,
            aspect_ratio: self.aspect_ratio,
            scale: self.scale,
        });
        Ok(())
    }

    fn is_unique(&self) -> bool {
        true
    }
}

/// Draws one textured quad at the entity's `TransformComponent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteComponent {
    pub texture: TextureHandle,
    pub width: u16,
    pub height: u16,
    pub pixels_per_unit: f32,
}

impl SpriteComponent {
    pub fn new(texture: TextureHandle, width: u16, height: u16, pixels_per_unit: f32) -> Self {
        Self {
            texture,
            width,
            height,
            pixels_per_unit,
        }
    }

    /// Size in world units.
    pub fn world_size(&self) -> (f32, f32) {
        (
            self.width as f32 / self.pixels_per_unit,
            self.height as f32 / self.pixels_per_unit,
        )
    }
}

impl Component for SpriteComponent {
    fn init(&mut self, _: &EntityView<'_>, _: &mut FrameContext<'_>) -> Result<(), ComponentError> {
        Ok(())
    }

    fn update(&mut self, entity: &EntityView<'_>, ctx: &mut FrameContext<'_>) -> Result<(), ComponentError> {
        let transform = entity.require::<TransformComponent>("SpriteComponent")?;
        let (w, h) = self.world_size();
        let model = Transform3D::new()
            .translate(transform.x(), transform.y(), 0.0)
            .scale(w, h, 1.0);
        ctx.renderer.bind_texture(self.texture)?;
        ctx.renderer.upload_transform(model.matrix());
        ctx.renderer.draw_quad();
        Ok(())
    }

    fn is_unique(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EcsError, Game};
    use glam::{Mat4, Vec4};
    use woodgas_common::FrameTime;
    use woodgas_render::{HeadlessRenderer, RenderBackend, RenderCommand};

    #[test]
    fn transform_moves() {
        let mut t = TransformComponent::new(1.0, 2.0);
        t.move_by(0.5, -1.0);
        assert_eq!((t.x(), t.y()), (1.5, 1.0));
        t.set_position(0.0, 0.0);
        assert_eq!(t.transform.position, Vec3::ZERO);
    }

    #[test]
    fn camera_uploads_projection_and_view() {
        let mut game = Game::new();
        let mut cam = game.create_entity();
        cam.add_component(Box::new(TransformComponent::new(4.0, 2.0))).unwrap();
        cam.add_component(Box::new(CameraComponent::new(2.0, 5.0))).unwrap();
        game.add_entity(cam).unwrap();

        let mut renderer = HeadlessRenderer::new();
        game.init(&mut renderer, FrameTime::default()).unwrap();
        game.update(&mut renderer, FrameTime::default()).unwrap();

        let commands = renderer.current_frame();
        assert!(matches!(commands[0], RenderCommand::UploadOrthographic(_)));
        let RenderCommand::UploadView(v) = commands[1] else {
            panic!("expected view upload, got {:?}", commands[1]);
        };
        // camera position maps to the origin, one scale unit maps to 1
        let centre = v * Vec4::new(4.0, 2.0, 0.0, 1.0);
        assert!(centre.truncate().length() < 1e-5);
        let edge = v * Vec4::new(9.0, 2.0, 0.0, 1.0);
        assert!((edge.x - 1.0).abs() < 1e-5);

        let published = game.resources().get::<CameraView>().unwrap();
        assert_eq!(published.half_width(), 10.0);
        assert_eq!(published.half_height(), 5.0);
    }

    #[test]
    fn camera_without_transform_fails() {
        let mut game = Game::new();
        let mut cam = game.create_entity();
        cam.add_component(Box::new(CameraComponent::new(1.0, 1.0))).unwrap();
        game.add_entity(cam).unwrap();

        let mut renderer = HeadlessRenderer::new();
        game.init(&mut renderer, FrameTime::default()).unwrap();
        let err = game.update(&mut renderer, FrameTime::default()).unwrap_err();
        assert!(matches!(
            err,
            EcsError::Component {
                source: ComponentError::MissingSibling { .. },
                ..
            }
        ));
    }

    #[test]
    fn sprite_draws_at_transform() {
        let mut renderer = HeadlessRenderer::new();
        let tex = renderer.create_texture(1, 1, &[255; 4]).unwrap();

        let mut game = Game::new();
        let mut e = game.create_entity();
        e.add_component(Box::new(TransformComponent::new(3.0, 0.0))).unwrap();
        e.add_component(Box::new(SpriteComponent::new(tex, 32, 16, 16.0))).unwrap();
        game.add_entity(e).unwrap();
        game.update(&mut renderer, FrameTime::default()).unwrap();
        renderer.swap_buffers().unwrap();

        let quads: Vec<(Mat4, _)> = renderer.last_frame_quads().collect();
        assert_eq!(quads.len(), 1);
        let (mvp, texture) = quads[0];
        assert_eq!(texture, tex);
        let corner = mvp * Vec4::new(0.5, 0.5, 0.0, 1.0);
        assert!((corner.x - 4.0).abs() < 1e-5);
        assert!((corner.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn sprite_with_unknown_texture_fails() {
        let mut game = Game::new();
        let mut e = game.create_entity();
        e.add_component(Box::new(TransformComponent::default())).unwrap();
        e.add_component(Box::new(SpriteComponent::new(TextureHandle(42), 1, 1, 1.0)))
            .unwrap();
        game.add_entity(e).unwrap();

        let mut renderer = HeadlessRenderer::new();
        let err = game.update(&mut renderer, FrameTime::default()).unwrap_err();
        assert!(matches!(
            err,
            EcsError::Component {
                source: ComponentError::Render(_),
                ..
            }
        ));
    }
}
