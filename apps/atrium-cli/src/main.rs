use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use atrium_assets::{
    AssetDecoder, FileSource, GltfDecoder, ProgressTracker, fetch_with_retry,
};
use atrium_engine::{HeadlessSurface, ImmediateServices, Services};
use atrium_runtime::{Backends, MeshTarget, Room, RoomConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "atrium-cli", about = "CLI tool for atrium rooms")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Room configuration (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the effective configuration as YAML
    Config,
    /// Decode the environment asset and check the wiring targets
    Inspect,
    /// Bootstrap the room headless and run some frames
    Run {
        /// Number of frames to run
        #[arg(short, long, default_value = "3")]
        frames: u64,
        /// Logical surface width
        #[arg(long, default_value = "800")]
        width: u32,
        /// Logical surface height
        #[arg(long, default_value = "600")]
        height: u32,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<RoomConfig> {
    Ok(match path {
        Some(path) => RoomConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => RoomConfig::default(),
    })
}

fn target_status(role: &str, target: &MeshTarget, names: &[String]) -> String {
    match target.resolve_among(names) {
        Some(i) => format!("{role}: {target} -> #{i} '{}'", names[i]),
        None => format!("{role}: {target} -> MISSING"),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("atrium-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("engine: {}", atrium_engine::crate_info());
            println!("assets: {}", atrium_assets::crate_info());
            println!("scene: {}", atrium_scene::crate_info());
            println!("runtime: {}", atrium_runtime::crate_info());
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
        Commands::Inspect => {
            let env = &config.environment;
            let path = env.asset_path();
            let progress = ProgressTracker::new(env.expected_size);
            let services = ImmediateServices;
            let bytes = futures::executor::block_on(fetch_with_retry(
                &FileSource::new(),
                &path,
                &progress,
                &config.retry,
                |d| services.sleep(d),
            ))
            .with_context(|| format!("fetch {path}"))?;
            let asset = GltfDecoder::new().decode(&path, &bytes)?;

            println!("asset {} ({} bytes, id {})", path, bytes.len(), asset.id);
            if let Some(p) = progress.latest().percent() {
                println!("  {p:.0}% of expected size");
            }
            for (i, mesh) in asset.meshes.iter().enumerate() {
                println!(
                    "  [{i:>2}] {:<24} verts={:<6} pos=({:.2}, {:.2}, {:.2})",
                    mesh.name, mesh.vertex_count, mesh.position.x, mesh.position.y, mesh.position.z
                );
            }
            println!("  {} transform nodes", asset.transform_nodes.len());

            let names: Vec<String> = asset.meshes.iter().map(|m| m.name.clone()).collect();
            if let Some(t) = &env.collision_exclusion {
                println!("{}", target_status("collision exclusion", t, &names));
            }
            println!("{}", target_status("floor", &env.floor, &names));
            println!("{}", target_status("display", &env.display, &names));
        }
        Commands::Run {
            frames,
            width,
            height,
        } => {
            let backends = Backends::headless(Rc::new(FileSource::new()));
            let mut room = Room::start(HeadlessSurface::new(width, height), &config, backends)?;
            for _ in 0..frames {
                room.tick();
            }
            let surface = room.engine().surface();
            println!(
                "ran {} frames at {}x{} (stage {:?})",
                surface.frames_presented(),
                room.engine().render_size().0,
                room.engine().render_size().1,
                room.stage()
            );
            if let Some(err) = room.bootstrap().error() {
                println!("environment error: {err}");
            }
            for event in room.scene().borrow().events() {
                println!("  {event}");
            }
            print!("{}", room.describe());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_status_prefers_names() {
        let names: Vec<String> = ["__root__", "Floor", "Screen"].iter().map(|s| s.to_string()).collect();
        assert!(target_status("floor", &MeshTarget::named("Floor", 0), &names).contains("#1"));
        assert!(target_status("display", &MeshTarget::at(2), &names).contains("'Screen'"));
        assert!(target_status("floor", &MeshTarget::at(12), &names).ends_with("MISSING"));
        assert!(target_status("floor", &MeshTarget::named("Carpet", 1), &names).ends_with("MISSING"));
        let lenient = MeshTarget::named("Carpet", 1).with_index_fallback();
        assert!(target_status("floor", &lenient, &names).contains("'Floor'"));
    }
}
