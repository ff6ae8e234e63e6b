use crate::{EcsError, Entity, FrameContext, Resources};
use std::collections::BTreeMap;
use woodgas_common::{EntityId, FrameClock, FrameTime, FrameTimer};
use woodgas_render::RenderBackend;

/// Top-level container: entities by id plus shared resources.
#[derive(Debug, Default)]
pub struct Game {
    next_id: u64,
    entities: BTreeMap<EntityId, Entity>,
    resources: Resources,
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh entity with the next id. It is not part of the game until added.
    pub fn create_entity(&mut self) -> Entity {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        Entity::new(id)
    }

    pub fn add_entity(&mut self, entity: Entity) -> Result<EntityId, EcsError> {
        let id = entity.id();
        if self.entities.contains_key(&id) {
            return Err(EcsError::DuplicateEntity(id));
        }
        self.entities.insert(id, entity);
        tracing::debug!(entity = %id, "entity added");
        Ok(id)
    }

    pub fn get_entity(&self, id: EntityId) -> Result<&Entity, EcsError> {
        self.entities.get(&id).ok_or(EcsError::EntityNotFound(id))
    }

    pub fn get_entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, EcsError> {
        self.entities
            .get_mut(&id)
            .ok_or(EcsError::EntityNotFound(id))
    }

    /// Remove a top-level entity and its subtree.
    pub fn destroy_entity(&mut self, id: EntityId) -> Result<Entity, EcsError> {
        let entity = self
            .entities
            .remove(&id)
            .ok_or(EcsError::EntityNotFound(id))?;
        tracing::debug!(entity = %id, "entity destroyed");
        Ok(entity)
    }

    /// Top-level entities only; children are looked up through their parent.
    pub fn has_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    /// Run every enabled component's `init`, entities in id order.
    pub fn init(&mut self, renderer: &mut dyn RenderBackend, time: FrameTime) -> Result<(), EcsError> {
        let _span = tracing::debug_span!("game_init", entities = self.entities.len()).entered();
        let input = renderer.input_state();
        let mut ctx = FrameContext {
            renderer,
            input: &input,
            time,
            resources: &mut self.resources,
        };
        for entity in self.entities.values_mut() {
            entity.init(&mut ctx)?;
        }
        Ok(())
    }

    /// Run every enabled component's `update`, entities in id order.
    pub fn update(&mut self, renderer: &mut dyn RenderBackend, time: FrameTime) -> Result<(), EcsError> {
        let _span = tracing::trace_span!("game_update", entities = self.entities.len()).entered();
        let input = renderer.input_state();
        let mut ctx = FrameContext {
            renderer,
            input: &input,
            time,
            resources: &mut self.resources,
        };
        for entity in self.entities.values_mut() {
            entity.update(&mut ctx)?;
        }
        Ok(())
    }

    /// `init`, then poll, clear, update and present until the backend
    /// reports the window closed. Returns the number of frames presented.
    pub fn run(&mut self, renderer: &mut dyn RenderBackend) -> Result<u64, EcsError> {
        let mut clock = FrameClock::new();
        let mut timer = FrameTimer::new(120);
        self.init(renderer, clock.frame_time())?;

        let mut frames = 0;
        while renderer.is_window_open() {
            renderer.poll_inputs();
            renderer.clear();
            self.update(renderer, clock.frame_time())?;
            renderer.swap_buffers()?;
            timer.record(clock.frame_complete());
            frames += 1;
        }
        tracing::info!(
            frames,
            avg_ms = timer.average().as_secs_f64() * 1000.0,
            max_ms = timer.max().as_secs_f64() * 1000.0,
            fps = timer.fps(),
            "game loop finished"
        );
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, ComponentError, EntityView};
    use std::cell::RefCell;
    use std::rc::Rc;
    use glam::Mat4;
    use woodgas_input::InputState;
    use woodgas_render::{HeadlessRenderer, RenderError, TextureHandle};

    struct Tick {
        log: Rc<RefCell<Vec<(EntityId, &'static str)>>>,
    }

    impl Component for Tick {
        fn init(&mut self, entity: &EntityView<'_>, _: &mut FrameContext<'_>) -> Result<(), ComponentError> {
            self.log.borrow_mut().push((entity.id(), "init"));
            Ok(())
        }

        fn update(&mut self, entity: &EntityView<'_>, ctx: &mut FrameContext<'_>) -> Result<(), ComponentError> {
            self.log.borrow_mut().push((entity.id(), "update"));
            ctx.renderer.draw_quad();
            Ok(())
        }

        fn is_unique(&self) -> bool {
            false
        }
    }

    #[test]
    fn ids_are_sequential() {
        let mut game = Game::new();
        assert_eq!(game.create_entity().id(), EntityId(0));
        assert_eq!(game.create_entity().id(), EntityId(1));
    }

    #[test]
    fn add_get_destroy() {
        let mut game = Game::new();
        let entity = game.create_entity();
        let id = game.add_entity(entity).unwrap();
        assert!(game.has_entity(id));
        assert_eq!(game.entity_count(), 1);

        let dup = Entity::new(id);
        assert!(matches!(game.add_entity(dup), Err(EcsError::DuplicateEntity(_))));

        game.get_entity_mut(id).unwrap().set_active(false);
        assert!(!game.get_entity(id).unwrap().is_enabled());

        game.destroy_entity(id).unwrap();
        assert!(matches!(game.get_entity(id), Err(EcsError::EntityNotFound(_))));
        assert!(game.destroy_entity(id).is_err());
    }

    #[test]
    fn children_are_not_top_level() {
        let mut game = Game::new();
        let mut parent = game.create_entity();
        let child = game.create_entity();
        let child_id = child.id();
        parent.add_child(child).unwrap();
        game.add_entity(parent).unwrap();
        assert!(!game.has_entity(child_id));
    }

    #[test]
    fn lifecycle_runs_in_id_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut game = Game::new();
        let mut first = game.create_entity();
        let mut second = game.create_entity();
        first.add_component(Box::new(Tick { log: log.clone() })).unwrap();
        second.add_component(Box::new(Tick { log: log.clone() })).unwrap();
        // insertion order does not matter
        game.add_entity(second).unwrap();
        game.add_entity(first).unwrap();

        let mut renderer = HeadlessRenderer::new();
        game.init(&mut renderer, FrameTime::default()).unwrap();
        game.update(&mut renderer, FrameTime::default()).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                (EntityId(0), "init"),
                (EntityId(1), "init"),
                (EntityId(0), "update"),
                (EntityId(1), "update"),
            ]
        );
        assert_eq!(renderer.current_frame().len(), 2);
    }

    #[test]
    fn run_stops_when_window_closes() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut game = Game::new();
        let mut entity = game.create_entity();
        entity.add_component(Box::new(Tick { log: log.clone() })).unwrap();
        game.add_entity(entity).unwrap();

        let mut renderer = HeadlessRenderer::new().with_max_frames(4);
        assert_eq!(game.run(&mut renderer).unwrap(), 4);
        assert_eq!(renderer.frames_presented(), 4);
        assert_eq!(renderer.polls(), 4);
        assert_eq!(log.borrow().len(), 5);
        assert_eq!(renderer.last_frame_quads().count(), 1);
    }

    /// Headless backend whose surface is lost on the first present.
    struct LostSurface(HeadlessRenderer);

    impl RenderBackend for LostSurface {
        fn is_window_open(&self) -> bool {
            self.0.is_window_open()
        }

        fn poll_inputs(&mut self) {
            self.0.poll_inputs();
        }

        fn input_state(&self) -> InputState {
            self.0.input_state()
        }

        fn clear(&mut self) {
            self.0.clear();
        }

        fn upload_orthographic(&mut self, projection: Mat4) {
            self.0.upload_orthographic(projection);
        }

        fn upload_view(&mut self, view: Mat4) {
            self.0.upload_view(view);
        }

        fn upload_transform(&mut self, transform: Mat4) {
            self.0.upload_transform(transform);
        }

        fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureHandle, RenderError> {
            self.0.create_texture(width, height, rgba)
        }

        fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), RenderError> {
            self.0.bind_texture(texture)
        }

        fn draw_quad(&mut self) {
            self.0.draw_quad();
        }

        fn begin_batch(&mut self) {
            self.0.begin_batch();
        }

        fn batch_quad(&mut self, transform: Mat4, texture: TextureHandle) -> Result<(), RenderError> {
            self.0.batch_quad(transform, texture)
        }

        fn end_batch(&mut self) {
            self.0.end_batch();
        }

        fn swap_buffers(&mut self) -> Result<(), RenderError> {
            Err(RenderError::Backend("surface lost".into()))
        }
    }

    #[test]
    fn failed_present_stops_run() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut game = Game::new();
        let mut entity = game.create_entity();
        entity.add_component(Box::new(Tick { log: log.clone() })).unwrap();
        game.add_entity(entity).unwrap();

        let mut renderer = LostSurface(HeadlessRenderer::new().with_max_frames(10));
        let err = game.run(&mut renderer).unwrap_err();
        assert!(matches!(err, EcsError::Present(RenderError::Backend(_))));
        assert!(err.to_string().contains("surface lost"));
        // init plus the single update before the failed present
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(renderer.0.frames_presented(), 0);
        assert_eq!(renderer.0.polls(), 1);
    }
}
