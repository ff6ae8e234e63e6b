use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;
use woodgas_assets::{AssetStore, BundleKind, bundle_folder};
use woodgas_render::{HeadlessRenderer, SharedRenderer};
use woodgas_script::{SceneOutcome, ScriptHost, run_scene};

#[derive(Parser)]
#[command(name = "woodgas-cli", about = "CLI tool for woodgas asset packs and scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Pack every file under a folder into one asset pack
    Bundle {
        /// Resource folder; names in the pack are relative to it
        folder: PathBuf,
        /// Output pack file
        #[arg(short, long, default_value = "assets.pak")]
        output: PathBuf,
    },
    /// List the resources in an asset pack
    Inspect {
        /// Pack file written by `bundle`
        pack: PathBuf,
    },
    /// Run a scene script on the headless renderer
    Run {
        /// Script file
        script: PathBuf,
        /// Frames to present before the window reports closed
        #[arg(short, long, default_value = "60")]
        frames: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("woodgas-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", woodgas_common::crate_info());
            println!("input: {}", woodgas_input::crate_info());
            println!("render: {}", woodgas_render::crate_info());
            println!("ecs: {}", woodgas_ecs::crate_info());
            println!("assets: {}", woodgas_assets::crate_info());
            println!("script: {}", woodgas_script::crate_info());
            println!("tilemap: {}", woodgas_tilemap::crate_info());
        }
        Commands::Bundle { folder, output } => {
            let bytes = bundle(&folder)?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote {} ({} bytes)", output.display(), bytes.len());
        }
        Commands::Inspect { pack } => {
            let bytes = std::fs::read(&pack).with_context(|| format!("reading {}", pack.display()))?;
            let store = AssetStore::from_pack(".", &bytes)
                .with_context(|| format!("opening {}", pack.display()))?;
            for line in describe(&store) {
                println!("{line}");
            }
        }
        Commands::Run { script, frames } => {
            let source = std::fs::read_to_string(&script)
                .with_context(|| format!("reading {}", script.display()))?;
            let headless = Rc::new(RefCell::new(HeadlessRenderer::new().with_max_frames(frames)));
            let renderer = SharedRenderer::from_rc(headless.clone());
            let mut host = ScriptHost::new(renderer.clone());
            host.add_code(&script.display().to_string(), &source)?;
            let outcome = run_scene(&mut host, &renderer)?;

            let headless = headless.borrow();
            match outcome {
                SceneOutcome::Main => println!("main() returned"),
                SceneOutcome::Components { frames } => println!("components ran for {frames} frames"),
                SceneOutcome::Empty => println!("nothing to run"),
            }
            println!(
                "frames={}, quads={}, last frame quads={}",
                headless.frames_presented(),
                headless.total_quads(),
                headless.last_frame_quads().count()
            );
        }
    }

    Ok(())
}

/// Bundle a folder, compiling every script on the way in.
fn bundle(folder: &Path) -> Result<Vec<u8>> {
    let checker = ScriptHost::new(SharedRenderer::new(HeadlessRenderer::new()));
    let (store, loaded) = bundle_folder(folder, |name, source| {
        checker.check(name, source).map_err(|e| e.to_string())
    })
    .with_context(|| format!("bundling {}", folder.display()))?;

    for (name, kind) in &loaded {
        tracing::info!(%name, ?kind, "added");
    }
    let scripts = loaded.iter().filter(|(_, k)| *k == BundleKind::Script).count();
    tracing::info!(resources = loaded.len(), scripts, "bundle complete");
    Ok(store.store()?)
}

fn describe(store: &AssetStore) -> Vec<String> {
    store
        .resource_names()
        .map(|name| match (store.image(name), store.generic(name)) {
            (Ok(image), _) => format!("{name}\timage {}x{}", image.width, image.height),
            (_, Ok(generic)) => format!("{name}\t{} bytes", generic.size()),
            _ => format!("{name}\tnot loaded"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_then_describe() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("scene.rhai"), "fn main() {}").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "hello").unwrap();

        let bytes = bundle(tmp.path()).unwrap();
        let store = AssetStore::from_pack(".", &bytes).unwrap();
        assert_eq!(
            describe(&store),
            vec!["notes.txt\t5 bytes".to_string(), "scene.rhai\t12 bytes".to_string()]
        );
    }

    #[test]
    fn bundle_rejects_broken_script() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("broken.rhai"), "fn main( {").unwrap();
        assert!(bundle(tmp.path()).is_err());
    }
}
