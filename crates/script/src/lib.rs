//! Rhai scripting bridge.
//!
//! A [`ScriptHost`] owns one rhai engine with three native modules
//! registered: `render` (drawing through a [`woodgas_render::SharedRenderer`]),
//! `logger` and `time`. Scripts declare components with
//! `let Name = component(Fn("init"), Fn("update"));` and may define a
//! `main()` that drives its own render loop.
//!
//! # Invariants
//! - Functions from every chunk passed to [`ScriptHost::add_code`] stay
//!   callable; top-level variables live in one persistent scope.
//! - Script failures never panic the host; they surface as [`ScriptError`]
//!   or [`woodgas_ecs::ComponentError`].

mod component;
mod host;
mod modules;
mod runner;

pub use component::{ComponentDef, ScriptComponent};
pub use host::ScriptHost;
pub use modules::{LOG_DEBUG, LOG_ERROR, LOG_INFO, LOG_WARN};
pub use runner::{SceneOutcome, run_scene};

/// Errors from compiling or running scripts.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to compile {name}: {message}")]
    Compile { name: String, message: String },
    #[error("{name} failed: {message}")]
    Runtime { name: String, message: String },
    #[error(transparent)]
    Game(#[from] woodgas_ecs::EcsError),
}

pub fn crate_info() -> &'static str {
    "woodgas-script v0.1.0"
}
