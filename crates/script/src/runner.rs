use crate::{ScriptError, ScriptHost};
use woodgas_ecs::Game;
use woodgas_render::SharedRenderer;

/// How [`run_scene`] drove the loaded scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneOutcome {
    /// `main()` ran its own loop to completion.
    Main,
    /// Script components ran on one entity for this many frames.
    Components { frames: u64 },
    /// Nothing to run.
    Empty,
}

/// Run whatever the loaded scripts provide.
///
/// A script `main()` takes priority. Otherwise every declared component is
/// attached to a single entity and driven by [`Game::run`].
pub fn run_scene(host: &mut ScriptHost, renderer: &SharedRenderer) -> Result<SceneOutcome, ScriptError> {
    if host.has_main() {
        tracing::info!("running script main");
        host.start_main()?;
        return Ok(SceneOutcome::Main);
    }

    let components = host.load_components();
    if components.is_empty() {
        tracing::warn!("scripts define neither main() nor components");
        return Ok(SceneOutcome::Empty);
    }

    let mut game = Game::new();
    let mut entity = game.create_entity();
    for (name, component) in components {
        tracing::debug!(%name, "attaching script component");
        entity.add_component(Box::new(component))?;
    }
    game.add_entity(entity)?;

    let mut renderer = renderer.clone();
    let frames = game.run(&mut renderer)?;
    Ok(SceneOutcome::Components { frames })
}
