use crate::modules::{self, Shared};
use crate::{ComponentDef, ScriptComponent, ScriptError};
use rhai::{AST, CallFnOptions, Dynamic, Engine, FnPtr, INT, Scope};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use woodgas_common::FrameTime;
use woodgas_render::SharedRenderer;

/// Engine plus every function compiled so far. Shared with the components it
/// hands out.
pub(crate) struct ScriptRuntime {
    engine: Engine,
    functions: RefCell<AST>,
    shared: Rc<Shared>,
}

impl ScriptRuntime {
    pub(crate) fn call_hook(&self, hook: &FnPtr, time: FrameTime) -> Result<(), ScriptError> {
        self.shared.time.set(time);
        let functions = self.functions.borrow();
        hook.call::<Dynamic>(&self.engine, &functions, ())
            .map(|_| ())
            .map_err(|e| ScriptError::Runtime {
                name: hook.fn_name().to_string(),
                message: e.to_string(),
            })
    }
}

/// Loads script chunks and exposes what they declare.
pub struct ScriptHost {
    runtime: Rc<ScriptRuntime>,
    scope: Scope<'static>,
}

impl std::fmt::Debug for ScriptHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptHost")
            .field("variables", &self.scope.len())
            .field("functions", &self.runtime.functions.borrow().iter_functions().count())
            .finish()
    }
}

impl ScriptHost {
    pub fn new(renderer: SharedRenderer) -> Self {
        let shared = Rc::new(Shared::new(renderer));

        let mut engine = Engine::new();
        engine.on_print(|text| tracing::info!(target: "script", "{text}"));
        engine.on_debug(|text, source, pos| {
            tracing::debug!(target: "script", source = source.unwrap_or("<script>"), %pos, "{text}")
        });
        engine
            .register_type_with_name::<ComponentDef>("Component")
            .register_fn("component", ComponentDef::new)
            .register_fn("to_string", ComponentDef::describe)
            .register_fn("to_debug", ComponentDef::describe);
        engine.register_static_module("render", modules::render_module(&shared).into());
        engine.register_static_module("logger", modules::logger_module(&shared).into());
        engine.register_static_module("time", modules::time_module(&shared).into());

        Self {
            runtime: Rc::new(ScriptRuntime {
                engine,
                functions: RefCell::new(AST::empty()),
                shared,
            }),
            scope: Scope::new(),
        }
    }

    fn compile(&self, name: &str, source: &str) -> Result<AST, ScriptError> {
        let mut ast = self
            .runtime
            .engine
            .compile(source)
            .map_err(|e| ScriptError::Compile {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        ast.set_source(name);
        Ok(ast)
    }

    /// Compile without running anything.
    pub fn check(&self, name: &str, source: &str) -> Result<(), ScriptError> {
        self.compile(name, source).map(|_| ())
    }

    /// Compile a chunk and run its top-level statements in the persistent
    /// scope. Functions defined here stay callable from later chunks, hooks
    /// and `main`.
    pub fn add_code(&mut self, name: &str, source: &str) -> Result<(), ScriptError> {
        let chunk = self.compile(name, source)?;
        let runnable = self.runtime.functions.borrow().merge(&chunk);
        self.runtime
            .engine
            .run_ast_with_scope(&mut self.scope, &runnable)
            .map_err(|e| ScriptError::Runtime {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        let functions = runnable.clone_functions_only();
        tracing::debug!(
            %name,
            functions = functions.iter_functions().count(),
            variables = self.scope.len(),
            "script chunk loaded"
        );
        *self.runtime.functions.borrow_mut() = functions;
        Ok(())
    }

    /// Every top-level variable holding a component declaration, by name.
    pub fn load_components(&self) -> BTreeMap<String, ScriptComponent> {
        self.scope
            .iter()
            .filter_map(|(name, _, value)| {
                let def = value.try_cast::<ComponentDef>()?;
                Some((name.to_string(), ScriptComponent::new(name, def, self.runtime.clone())))
            })
            .collect()
    }

    pub fn has_main(&self) -> bool {
        self.runtime
            .functions
            .borrow()
            .iter_functions()
            .any(|f| f.name == "main" && f.params.is_empty())
    }

    /// Call `main()`. Returns `false` without running anything when no
    /// script defines it.
    pub fn start_main(&mut self) -> Result<bool, ScriptError> {
        if !self.has_main() {
            tracing::error!("no script defines main()");
            return Ok(false);
        }
        let runtime = self.runtime.clone();
        let functions = runtime.functions.borrow();
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        runtime
            .engine
            .call_fn_with_options::<Dynamic>(options, &mut self.scope, &functions, "main", ())
            .map(|_| ())
            .map_err(|e| ScriptError::Runtime {
                name: "main".to_string(),
                message: e.to_string(),
            })?;
        Ok(true)
    }

    /// A top-level script variable, if present and of type `T`.
    pub fn variable<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        self.scope.get_value::<T>(name)
    }

    /// Current `logger::set_log_level` threshold.
    pub fn log_level(&self) -> INT {
        self.runtime.shared.log_level.get()
    }
}
