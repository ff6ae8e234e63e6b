use crate::{ComponentError, EntityView, FrameContext};
use std::any::Any;

/// Downcasting support for trait objects. Implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behaviour attached to an entity.
///
/// `init` runs once from `Game::init`, `update` once per frame from
/// `Game::update`. `entity` shows the owning entity's other components.
pub trait Component: AsAny {
    fn init(&mut self, entity: &EntityView<'_>, ctx: &mut FrameContext<'_>) -> Result<(), ComponentError>;

    fn update(&mut self, entity: &EntityView<'_>, ctx: &mut FrameContext<'_>) -> Result<(), ComponentError>;

    /// Unique components may appear at most once per entity.
    fn is_unique(&self) -> bool;

    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// `woodgas_ecs::components::TransformComponent` -> `TransformComponent`.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names() {
        assert_eq!(short_type_name("a::b::Camera"), "Camera");
        assert_eq!(short_type_name("Camera"), "Camera");
        assert_eq!(short_type_name("a::Wrapper<b::C>"), "Wrapper<b::C>");
    }
}
