use woodgas_common::EntityId;
use woodgas_render::RenderError;

/// Errors raised by a component's lifecycle hooks.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    #[error("{component} needs a {missing} on the same entity")]
    MissingSibling {
        component: &'static str,
        missing: &'static str,
    },
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("{component}: {message}")]
    Failed { component: String, message: String },
}

impl ComponentError {
    pub fn failed(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Errors from entity and game operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    #[error("tried to add unique component {component} twice to entity {entity}")]
    DuplicateUniqueComponent {
        entity: EntityId,
        component: String,
    },
    #[error("entity {entity} has no {component}")]
    ComponentNotFound {
        entity: EntityId,
        component: &'static str,
    },
    #[error("entity {parent} already has child {child}")]
    DuplicateChild { parent: EntityId, child: EntityId },
    #[error("entity {parent} has no child {child}")]
    ChildNotFound { parent: EntityId, child: EntityId },
    #[error("entity {0} already exists")]
    DuplicateEntity(EntityId),
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("component {component} on entity {entity} failed: {source}")]
    Component {
        entity: EntityId,
        component: String,
        #[source]
        source: ComponentError,
    },
    #[error("frame could not be presented: {0}")]
    Present(#[from] RenderError),
}
