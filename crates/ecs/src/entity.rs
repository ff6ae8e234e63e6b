use crate::component::short_type_name;
use crate::{Component, ComponentError, EcsError, FrameContext};
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use woodgas_common::EntityId;

/// A stored component and its enabled flag.
struct ComponentSlot {
    enabled: bool,
    component: Box<dyn Component>,
}

impl ComponentSlot {
    fn downcast_ref<T: Component>(&self) -> Option<&T> {
        // Deref first: `Box<dyn Component>` is itself `Any`.
        (*self.component).as_any().downcast_ref::<T>()
    }

    fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        (*self.component).as_any_mut().downcast_mut::<T>()
    }
}

/// All components of one concrete type, in insertion order.
struct ComponentGroup {
    type_id: TypeId,
    slots: Vec<ComponentSlot>,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Init,
    Update,
}

/// A node in the entity tree.
pub struct Entity {
    id: EntityId,
    enabled: bool,
    /// Groups in order of first insertion.
    components: Vec<ComponentGroup>,
    children: BTreeMap<EntityId, Entity>,
    parent: Option<EntityId>,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("enabled", &self.enabled)
            .field("components", &self.component_count())
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("parent", &self.parent)
            .finish()
    }
}

impl Entity {
    /// Usually obtained from `Game::create_entity`, which hands out fresh ids.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            enabled: true,
            components: Vec::new(),
            children: BTreeMap::new(),
            parent: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled entities skip their own components and their whole subtree.
    pub fn set_active(&mut self, state: bool) {
        self.enabled = state;
    }

    fn group(&self, type_id: TypeId) -> Option<&ComponentGroup> {
        self.components
            .iter()
            .find(|g| g.type_id == type_id && !g.slots.is_empty())
    }

    fn group_mut(&mut self, type_id: TypeId) -> Option<&mut ComponentGroup> {
        self.components
            .iter_mut()
            .find(|g| g.type_id == type_id && !g.slots.is_empty())
    }

    fn not_found<T: Component>(&self) -> EcsError {
        EcsError::ComponentNotFound {
            entity: self.id,
            component: short_type_name(std::any::type_name::<T>()),
        }
    }

    /// Attach a component. A second component of a type already present is
    /// appended, unless it is unique.
    pub fn add_component(&mut self, component: Box<dyn Component>) -> Result<(), EcsError> {
        let type_id = Any::type_id((*component).as_any());
        let name = component.name().to_string();
        match self.components.iter_mut().find(|g| g.type_id == type_id) {
            Some(group) if !group.slots.is_empty() && component.is_unique() => {
                return Err(EcsError::DuplicateUniqueComponent {
                    entity: self.id,
                    component: name,
                });
            }
            Some(group) => group.slots.push(ComponentSlot {
                enabled: true,
                component,
            }),
            None => self.components.push(ComponentGroup {
                type_id,
                slots: vec![ComponentSlot {
                    enabled: true,
                    component,
                }],
            }),
        }
        tracing::debug!(entity = %self.id, component = %name, "component added");
        Ok(())
    }

    pub fn has_component<T: Component>(&self) -> bool {
        self.group(TypeId::of::<T>()).is_some()
    }

    /// First component of type `T`.
    pub fn get_component<T: Component>(&self) -> Result<&T, EcsError> {
        self.group(TypeId::of::<T>())
            .and_then(|g| g.slots.first())
            .and_then(ComponentSlot::downcast_ref::<T>)
            .ok_or_else(|| self.not_found::<T>())
    }

    pub fn get_component_mut<T: Component>(&mut self) -> Result<&mut T, EcsError> {
        let err = self.not_found::<T>();
        self.group_mut(TypeId::of::<T>())
            .and_then(|g| g.slots.first_mut())
            .and_then(ComponentSlot::downcast_mut::<T>)
            .ok_or(err)
    }

    /// All components of type `T`, in insertion order.
    pub fn get_components<T: Component>(&self) -> Result<Vec<&T>, EcsError> {
        let group = self
            .group(TypeId::of::<T>())
            .ok_or_else(|| self.not_found::<T>())?;
        Ok(group
            .slots
            .iter()
            .filter_map(ComponentSlot::downcast_ref::<T>)
            .collect())
    }

    /// Remove every component of type `T`.
    pub fn remove_component<T: Component>(&mut self) -> Result<(), EcsError> {
        let type_id = TypeId::of::<T>();
        let index = self
            .components
            .iter()
            .position(|g| g.type_id == type_id && !g.slots.is_empty())
            .ok_or_else(|| self.not_found::<T>())?;
        self.components.remove(index);
        Ok(())
    }

    /// Enable or disable every component of type `T`.
    pub fn set_component_active<T: Component>(&mut self, state: bool) -> Result<(), EcsError> {
        let err = self.not_found::<T>();
        let group = self.group_mut(TypeId::of::<T>()).ok_or(err)?;
        for slot in &mut group.slots {
            slot.enabled = state;
        }
        Ok(())
    }

    /// Whether the first component of type `T` is enabled.
    pub fn is_component_active<T: Component>(&self) -> Result<bool, EcsError> {
        self.group(TypeId::of::<T>())
            .and_then(|g| g.slots.first())
            .map(|slot| slot.enabled)
            .ok_or_else(|| self.not_found::<T>())
    }

    pub fn component_count(&self) -> usize {
        self.components.iter().map(|g| g.slots.len()).sum()
    }

    /// Names of all attached components, in lifecycle order.
    pub fn component_names(&self) -> Vec<String> {
        self.components
            .iter()
            .flat_map(|g| g.slots.iter().map(|s| s.component.name().to_string()))
            .collect()
    }

    pub fn add_child(&mut self, mut child: Entity) -> Result<(), EcsError> {
        if self.children.contains_key(&child.id) {
            return Err(EcsError::DuplicateChild {
                parent: self.id,
                child: child.id,
            });
        }
        child.parent = Some(self.id);
        self.children.insert(child.id, child);
        Ok(())
    }

    pub fn get_child(&self, id: EntityId) -> Result<&Entity, EcsError> {
        self.children.get(&id).ok_or(EcsError::ChildNotFound {
            parent: self.id,
            child: id,
        })
    }

    pub fn get_child_mut(&mut self, id: EntityId) -> Result<&mut Entity, EcsError> {
        let parent = self.id;
        self.children
            .get_mut(&id)
            .ok_or(EcsError::ChildNotFound { parent, child: id })
    }

    /// Detach and return a child with its subtree.
    pub fn destroy_child(&mut self, id: EntityId) -> Result<Entity, EcsError> {
        let mut child = self.children.remove(&id).ok_or(EcsError::ChildNotFound {
            parent: self.id,
            child: id,
        })?;
        child.parent = None;
        Ok(child)
    }

    pub fn has_child(&self, id: EntityId) -> bool {
        self.children.contains_key(&id)
    }

    pub fn children(&self) -> impl Iterator<Item = &Entity> {
        self.children.values()
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub(crate) fn init(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), EcsError> {
        self.run(Phase::Init, ctx)
    }

    pub(crate) fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), EcsError> {
        self.run(Phase::Update, ctx)
    }

    fn run(&mut self, phase: Phase, ctx: &mut FrameContext<'_>) -> Result<(), EcsError> {
        if !self.enabled {
            return Ok(());
        }
        for index in 0..self.components.len() {
            // Detach the group so its components can read their siblings.
            let mut slots = std::mem::take(&mut self.components[index].slots);
            let result = self.run_slots(&mut slots, phase, ctx);
            self.components[index].slots = slots;
            result?;
        }
        for child in self.children.values_mut() {
            child.run(phase, ctx)?;
        }
        Ok(())
    }

    fn run_slots(
        &self,
        slots: &mut [ComponentSlot],
        phase: Phase,
        ctx: &mut FrameContext<'_>,
    ) -> Result<(), EcsError> {
        let view = EntityView { entity: self };
        for slot in slots.iter_mut().filter(|s| s.enabled) {
            let component = slot.component.as_mut();
            let result = match phase {
                Phase::Init => component.init(&view, ctx),
                Phase::Update => component.update(&view, ctx),
            };
            result.map_err(|source| EcsError::Component {
                entity: self.id,
                component: component.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Read access to an entity from inside one of its components.
///
/// The running component's own type group is detached, so it does not
/// appear here.
#[derive(Clone, Copy)]
pub struct EntityView<'a> {
    entity: &'a Entity,
}

impl<'a> EntityView<'a> {
    pub fn id(&self) -> EntityId {
        self.entity.id
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.entity.parent
    }

    pub fn has_component<T: Component>(&self) -> bool {
        self.entity.has_component::<T>()
    }

    pub fn get_component<T: Component>(&self) -> Option<&'a T> {
        self.entity.get_component::<T>().ok()
    }

    /// Like `get_component`, but reports which component needed it.
    pub fn require<T: Component>(&self, requester: &'static str) -> Result<&'a T, ComponentError> {
        self.get_component::<T>()
            .ok_or(ComponentError::MissingSibling {
                component: requester,
                missing: short_type_name(std::any::type_name::<T>()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityView, Resources};
    use std::cell::RefCell;
    use std::rc::Rc;
    use woodgas_common::FrameTime;
    use woodgas_input::InputState;
    use woodgas_render::HeadlessRenderer;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        label: &'static str,
        unique: bool,
        log: Log,
    }

    impl Component for Recorder {
        fn init(&mut self, _: &EntityView<'_>, _: &mut FrameContext<'_>) -> Result<(), ComponentError> {
            self.log.borrow_mut().push(format!("init {}", self.label));
            Ok(())
        }

        fn update(&mut self, entity: &EntityView<'_>, _: &mut FrameContext<'_>) -> Result<(), ComponentError> {
            self.log
                .borrow_mut()
                .push(format!("update {} on {}", self.label, entity.id()));
            Ok(())
        }

        fn is_unique(&self) -> bool {
            self.unique
        }
    }

    struct Marker(u32);

    impl Component for Marker {
        fn init(&mut self, _: &EntityView<'_>, _: &mut FrameContext<'_>) -> Result<(), ComponentError> {
            Ok(())
        }

        fn update(&mut self, entity: &EntityView<'_>, _: &mut FrameContext<'_>) -> Result<(), ComponentError> {
            // Marker reads its sibling; a missing Recorder is an error.
            entity.require::<Recorder>("Marker").map(|_| ())
        }

        fn is_unique(&self) -> bool {
            true
        }
    }

    fn recorder(label: &'static str, unique: bool, log: &Log) -> Box<dyn Component> {
        Box::new(Recorder {
            label,
            unique,
            log: log.clone(),
        })
    }

    fn run_update(entity: &mut Entity) -> Result<(), EcsError> {
        let mut renderer = HeadlessRenderer::new();
        let input = InputState::new();
        let mut resources = Resources::new();
        let mut ctx = FrameContext {
            renderer: &mut renderer,
            input: &input,
            time: FrameTime::default(),
            resources: &mut resources,
        };
        entity.update(&mut ctx)
    }

    #[test]
    fn unique_component_rejected_twice() {
        let mut e = Entity::new(EntityId(1));
        e.add_component(Box::new(Marker(1))).unwrap();
        let err = e.add_component(Box::new(Marker(2))).unwrap_err();
        assert!(matches!(err, EcsError::DuplicateUniqueComponent { .. }));
        assert_eq!(e.get_component::<Marker>().unwrap().0, 1);
    }

    #[test]
    fn non_unique_components_stack() {
        let log = Log::default();
        let mut e = Entity::new(EntityId(1));
        e.add_component(recorder("a", false, &log)).unwrap();
        e.add_component(recorder("b", false, &log)).unwrap();
        assert_eq!(e.get_components::<Recorder>().unwrap().len(), 2);
        assert_eq!(e.get_component::<Recorder>().unwrap().label, "a");
        assert_eq!(e.component_count(), 2);
    }

    #[test]
    fn missing_component_errors() {
        let mut e = Entity::new(EntityId(3));
        assert!(!e.has_component::<Marker>());
        assert!(matches!(
            e.get_component::<Marker>(),
            Err(EcsError::ComponentNotFound {
                component: "Marker",
                ..
            })
        ));
        assert!(e.remove_component::<Marker>().is_err());
        assert!(e.set_component_active::<Marker>(false).is_err());
    }

    #[test]
    fn remove_and_mutate() {
        let mut e = Entity::new(EntityId(1));
        e.add_component(Box::new(Marker(5))).unwrap();
        e.get_component_mut::<Marker>().unwrap().0 = 9;
        assert_eq!(e.get_component::<Marker>().unwrap().0, 9);
        e.remove_component::<Marker>().unwrap();
        assert!(!e.has_component::<Marker>());
        e.add_component(Box::new(Marker(1))).unwrap();
    }

    #[test]
    fn children_track_parent() {
        let mut parent = Entity::new(EntityId(1));
        parent.add_child(Entity::new(EntityId(2))).unwrap();
        assert!(parent.has_child(EntityId(2)));
        assert_eq!(parent.get_child(EntityId(2)).unwrap().parent(), Some(EntityId(1)));
        assert!(!parent.has_parent());

        let err = parent.add_child(Entity::new(EntityId(2))).unwrap_err();
        assert!(matches!(err, EcsError::DuplicateChild { .. }));

        let child = parent.destroy_child(EntityId(2)).unwrap();
        assert!(!child.has_parent());
        assert!(matches!(
            parent.get_child(EntityId(2)),
            Err(EcsError::ChildNotFound { .. })
        ));
        assert!(parent.destroy_child(EntityId(2)).is_err());
    }

    #[test]
    fn update_order_and_disabled_components() {
        let log = Log::default();
        let mut e = Entity::new(EntityId(1));
        e.add_component(recorder("a", false, &log)).unwrap();
        e.add_component(Box::new(Marker(0))).unwrap();
        let mut child = Entity::new(EntityId(2));
        child.add_component(recorder("child", false, &log)).unwrap();
        e.add_child(child).unwrap();

        run_update(&mut e).unwrap();
        assert_eq!(*log.borrow(), vec!["update a on #1", "update child on #2"]);

        log.borrow_mut().clear();
        e.set_component_active::<Recorder>(false).unwrap();
        assert!(!e.is_component_active::<Recorder>().unwrap());
        run_update(&mut e).unwrap();
        assert_eq!(*log.borrow(), vec!["update child on #2"]);
    }

    #[test]
    fn disabled_entity_skips_subtree() {
        let log = Log::default();
        let mut e = Entity::new(EntityId(1));
        e.add_component(recorder("a", false, &log)).unwrap();
        let mut child = Entity::new(EntityId(2));
        child.add_component(recorder("child", false, &log)).unwrap();
        e.add_child(child).unwrap();
        e.set_active(false);

        run_update(&mut e).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn component_error_names_entity() {
        let mut e = Entity::new(EntityId(4));
        e.add_component(Box::new(Marker(0))).unwrap();
        let err = run_update(&mut e).unwrap_err();
        match err {
            EcsError::Component {
                entity,
                component,
                source: ComponentError::MissingSibling { missing, .. },
            } => {
                assert_eq!(entity, EntityId(4));
                assert_eq!(component, "Marker");
                assert_eq!(missing, "Recorder");
            }
            other => panic!("unexpected error: {other}"),
        }
        // the detached group was restored
        assert!(e.has_component::<Marker>());
    }

    #[test]
    fn component_names_in_order() {
        let log = Log::default();
        let mut e = Entity::new(EntityId(1));
        e.add_component(Box::new(Marker(0))).unwrap();
        e.add_component(recorder("a", false, &log)).unwrap();
        assert_eq!(e.component_names(), vec!["Marker", "Recorder"]);
    }
}
