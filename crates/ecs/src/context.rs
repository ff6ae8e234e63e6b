use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use woodgas_common::FrameTime;
use woodgas_input::InputState;
use woodgas_render::RenderBackend;

/// Type-keyed singleton store shared by all components.
#[derive(Default)]
pub struct Resources {
    values: BTreeMap<TypeId, Box<dyn Any>>,
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("count", &self.values.len())
            .finish()
    }
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, returning the previous value of the same type.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.values
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut::<T>())
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything a component can reach during `init` and `update`.
pub struct FrameContext<'a> {
    pub renderer: &'a mut dyn RenderBackend,
    /// Keyboard state captured at the start of the pass.
    pub input: &'a InputState,
    pub time: FrameTime,
    pub resources: &'a mut Resources,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Score(u32);

    #[test]
    fn insert_get_replace() {
        let mut res = Resources::new();
        assert!(res.insert(Score(1)).is_none());
        assert_eq!(res.get::<Score>(), Some(&Score(1)));
        assert_eq!(res.insert(Score(2)), Some(Score(1)));

        res.get_mut::<Score>().unwrap().0 += 1;
        assert_eq!(res.get::<Score>(), Some(&Score(3)));
        assert_eq!(res.len(), 1);
    }

    #[test]
    fn remove_and_contains() {
        let mut res = Resources::new();
        res.insert(7u32);
        assert!(res.contains::<u32>());
        assert!(!res.contains::<Score>());
        assert_eq!(res.remove::<u32>(), Some(7));
        assert!(res.is_empty());
    }
}
