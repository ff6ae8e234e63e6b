//! Entity/component model with `init`/`update` lifecycle hooks.
//!
//! Entities own their components and children. The game owns the top-level
//! entities and a type-keyed resource store shared by all components.
//!
//! # Invariants
//! - Entities and children iterate in id order (BTreeMap).
//! - A unique component type appears at most once per entity.
//! - Components never hold references to other entities; cross-entity data
//!   goes through [`Resources`].

mod component;
mod components;
mod context;
mod entity;
mod error;
mod game;

pub use component::{AsAny, Component};
pub use components::{CameraComponent, CameraView, SpriteComponent, TransformComponent};
pub use context::{FrameContext, Resources};
pub use entity::{Entity, EntityView};
pub use error::{ComponentError, EcsError};
pub use game::Game;

pub fn crate_info() -> &'static str {
    "woodgas-ecs v0.1.0"
}
