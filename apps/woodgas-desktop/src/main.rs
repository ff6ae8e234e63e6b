use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use woodgas_assets::AssetStore;
use woodgas_common::GameConfig;
use woodgas_ecs::{CameraComponent, Game, SpriteComponent, TransformComponent};
use woodgas_render::{RenderBackend, SharedRenderer};
use woodgas_render_wgpu::WindowRenderer;
use woodgas_script::{ScriptHost, run_scene};
use woodgas_tilemap::{Tile, TilemapComponent};

#[derive(Parser)]
#[command(name = "woodgas-desktop", about = "Woodgas desktop application")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML game configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene script to run
    #[arg(long)]
    script: Option<PathBuf>,

    /// Asset pack holding the scene script
    #[arg(long)]
    pack: Option<PathBuf>,

    /// Script resource inside the pack
    #[arg(long, default_value = "main.rhai")]
    entry: String,

    /// Built-in demo scene instead of a script
    #[arg(long, value_enum)]
    demo: Option<Demo>,

    /// Window width override
    #[arg(long)]
    width: Option<u32>,

    /// Window height override
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Demo {
    Tilemap,
}

/// What the window will show.
#[derive(Debug, PartialEq)]
enum Scene {
    Script { name: String, source: String },
    Tilemap,
}

impl Cli {
    fn apply(&self, config: &mut GameConfig) {
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        if self.script.is_some() {
            config.script = self.script.clone();
        }
        if self.pack.is_some() {
            config.pack = self.pack.clone();
        }
    }
}

/// Pick the scene before any window opens, so bad paths fail fast.
fn resolve_scene(demo: Option<Demo>, entry: &str, config: &GameConfig) -> Result<Scene> {
    if demo == Some(Demo::Tilemap) {
        return Ok(Scene::Tilemap);
    }
    if let Some(script) = &config.script {
        let source = std::fs::read_to_string(script)
            .with_context(|| format!("reading script {}", script.display()))?;
        return Ok(Scene::Script {
            name: script.display().to_string(),
            source,
        });
    }
    if let Some(pack) = &config.pack {
        let bytes = std::fs::read(pack).with_context(|| format!("reading pack {}", pack.display()))?;
        let root = pack.parent().map(PathBuf::from).unwrap_or_default();
        let store = AssetStore::from_pack(root, &bytes)
            .with_context(|| format!("opening pack {}", pack.display()))?;
        let source = store
            .generic(entry)
            .with_context(|| format!("pack {} has no entry script", pack.display()))?
            .as_string();
        return Ok(Scene::Script {
            name: entry.to_string(),
            source,
        });
    }
    bail!("nothing to run: pass --script, --pack or --demo tilemap")
}

const MAP_SIZE: u32 = 48;

/// Camera over a procedurally filled tilemap, with a marker sprite at the
/// camera position.
fn tilemap_demo(renderer: &mut dyn RenderBackend, aspect_ratio: f32) -> Result<Game> {
    let center = MAP_SIZE as f32 / 2.0;
    let mut game = Game::new();

    let mut camera = game.create_entity();
    camera.add_component(Box::new(TransformComponent::new(center, center)))?;
    camera.add_component(Box::new(CameraComponent::new(aspect_ratio, 8.0)))?;
    game.add_entity(camera)?;

    let grass = Tile::new(renderer.create_texture(1, 1, &[72, 150, 64, 255])?);
    let water = Tile::new(renderer.create_texture(1, 1, &[48, 96, 200, 255])?);
    let sand = Tile::new(renderer.create_texture(1, 1, &[220, 200, 130, 255])?);
    let mut map = TilemapComponent::new(8, 1.0)?;
    for tile in [grass, water, sand] {
        map.add_tile_type(tile)?;
    }
    for y in 0..MAP_SIZE {
        for x in 0..MAP_SIZE {
            let tile = match (x / 6 + y / 4) % 5 {
                0 => &water,
                1 => &sand,
                _ => &grass,
            };
            map.set_tile(x, y, tile)?;
        }
    }
    tracing::info!(chunks = map.chunk_count(), "tilemap built");
    let mut world = game.create_entity();
    world.add_component(Box::new(map))?;
    game.add_entity(world)?;

    let marker_pixels = [
        255, 255, 255, 255, 200, 40, 40, 255, //
        200, 40, 40, 255, 255, 255, 255, 255,
    ];
    let marker_texture = renderer.create_texture(2, 2, &marker_pixels)?;
    let mut marker = game.create_entity();
    marker.add_component(Box::new(TransformComponent::new(center, center)))?;
    marker.add_component(Box::new(SpriteComponent::new(marker_texture, 2, 2, 2.0)))?;
    game.add_entity(marker)?;

    Ok(game)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = GameConfig::load_or_default(cli.config.as_deref()).context("loading config")?;
    cli.apply(&mut config);
    config.validate()?;

    let filter = if cli.verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let scene = resolve_scene(cli.demo, &cli.entry, &config)?;
    let window = WindowRenderer::new(&config.window, config.clear_color).context("opening window")?;
    let renderer = SharedRenderer::new(window);

    match scene {
        Scene::Tilemap => {
            let mut backend = renderer.clone();
            let mut game = tilemap_demo(&mut backend, config.window.aspect_ratio())?;
            let frames = game.run(&mut backend)?;
            tracing::info!(frames, "tilemap demo closed");
        }
        Scene::Script { name, source } => {
            let mut host = ScriptHost::new(renderer.clone());
            host.add_code(&name, &source)?;
            let outcome = run_scene(&mut host, &renderer)?;
            tracing::info!(?outcome, "scene finished");
        }
    }

    Ok(())
}
