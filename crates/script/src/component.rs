use crate::host::ScriptRuntime;
use rhai::FnPtr;
use std::rc::Rc;
use woodgas_ecs::{Component, ComponentError, EntityView, FrameContext};

/// What `component(init, update)` returns inside a script.
#[derive(Debug, Clone)]
pub struct ComponentDef {
    pub init: FnPtr,
    pub update: FnPtr,
}

impl ComponentDef {
    pub fn new(init: FnPtr, update: FnPtr) -> Self {
        Self { init, update }
    }

    pub(crate) fn describe(&mut self) -> String {
        format!("Component({}, {})", self.init.fn_name(), self.update.fn_name())
    }
}

/// A script-declared component attached to an entity.
///
/// Named after the script variable that declared it. Several may share an
/// entity.
pub struct ScriptComponent {
    name: String,
    def: ComponentDef,
    runtime: Rc<ScriptRuntime>,
}

impl ScriptComponent {
    pub(crate) fn new(name: &str, def: ComponentDef, runtime: Rc<ScriptRuntime>) -> Self {
        Self {
            name: name.to_string(),
            def,
            runtime,
        }
    }

    pub fn def(&self) -> &ComponentDef {
        &self.def
    }
}

impl std::fmt::Debug for ScriptComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptComponent")
            .field("name", &self.name)
            .field("def", &self.def)
            .finish()
    }
}

impl Component for ScriptComponent {
    fn init(&mut self, _entity: &EntityView<'_>, ctx: &mut FrameContext<'_>) -> Result<(), ComponentError> {
        self.runtime
            .call_hook(&self.def.init, ctx.time)
            .map_err(|e| ComponentError::failed(&self.name, e.to_string()))
    }

    fn update(&mut self, _entity: &EntityView<'_>, ctx: &mut FrameContext<'_>) -> Result<(), ComponentError> {
        self.runtime
            .call_hook(&self.def.update, ctx.time)
            .map_err(|e| ComponentError::failed(&self.name, e.to_string()))
    }

    fn is_unique(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        &self.name
    }
}
