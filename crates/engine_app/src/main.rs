//! # engine_app
//!
//! Headless runtime. Loads prototype files, wires the managers and the
//! bundled systems, spawns the requested prototypes and runs the fixed-rate
//! frame loop.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments and initialise logging.
//! 2. Build the orchestrator with every component, enum and system.
//! 3. Start it: instantiate, inject, load prototypes, init systems.
//! 4. Enter the tick loop.

mod components;
mod systems;
mod tick;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use engine_math::Transform;
use engine_system::{Orchestrator, RuntimeConfig};
use engine_world::EntityRegistry;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use components::{RenderLayer, Sprite, Velocity};
use systems::{MotionSystem, SpawnList, SpawnSystem, SpriteSystem, TextureAllocator, TimeSystem};
use tick::{TickConfig, TickLoop};

#[derive(Parser, Debug)]
#[command(name = "engine_app", about = "Headless data-driven ECS runtime")]
struct Args {
    /// Prototype directory. Falls back to $ENGINE_PROTOTYPE_DIR, then `prototypes`.
    #[arg(short, long)]
    prototypes: Option<PathBuf>,

    /// Extension of prototype files.
    #[arg(long, default_value = "json")]
    extension: String,

    /// Target frames per second.
    #[arg(long, default_value_t = 60.0, value_parser = parse_tick_rate)]
    tick_rate: f64,

    /// Frames to run before exiting (0 = unlimited).
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Prototype ids to spawn at startup.
    #[arg(short, long = "spawn", default_values = ["player", "crate"])]
    spawn: Vec<String>,

    /// Log each loaded prototype and debug output from the engine crates.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_tick_rate(raw: &str) -> Result<f64, String> {
    let rate: f64 = raw.parse().map_err(|err| format!("{err}"))?;
    tick::frame_budget(rate).map_err(|err| err.to_string())?;
    Ok(rate)
}

/// The orchestrator with every component, enum and system of this binary.
fn build_runtime(config: RuntimeConfig, spawn: SpawnList) -> Orchestrator {
    Orchestrator::builder()
        .config(config)
        .component::<Transform>()
        .component::<Sprite>()
        .component::<Velocity>()
        .enumeration::<RenderLayer>()
        .system::<TimeSystem>()
        .system::<SpriteSystem>()
        .system::<MotionSystem>()
        .system::<SpawnSystem>()
        .lazy::<TextureAllocator>()
        .provide(Arc::new(spawn))
        .build()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "debug"
    } else {
        "engine_app=info,engine_system=info,engine_world=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();

    let config = args
        .prototypes
        .map_or_else(RuntimeConfig::from_env, RuntimeConfig::new)
        .with_extension(args.extension)
        .with_verbose(args.verbose);
    info!(prototype_dir = %config.prototype_dir.display(), "engine runtime starting");

    let mut runtime = build_runtime(config, SpawnList(args.spawn));
    let report = match runtime.start().await {
        Ok(report) => report,
        Err(err) => {
            error!(error = %err, "startup failed");
            return Err(err.into());
        }
    };
    if !report.failures.is_empty() {
        info!(skipped = report.failures.len(), "some prototype files were skipped");
    }

    let mut tick_loop = TickLoop::new(TickConfig {
        tick_rate: args.tick_rate,
        max_ticks: args.ticks,
    });
    tick_loop.run(&mut runtime).await.context("frame loop failed")?;

    let time = runtime.resolve::<TimeSystem>()?;
    info!(
        frames = runtime.frame(),
        simulated_secs = time.time(),
        average_frame_ms = time.average_frame_time() * 1000.0,
        entities = runtime.resolve::<EntityRegistry>()?.len(),
        textures = runtime.resolve::<TextureAllocator>()?.issued(),
        "engine runtime shut down"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use engine_math::Vec2;
    use engine_system::Phase;

    use super::*;

    fn bundled() -> RuntimeConfig {
        RuntimeConfig::new(concat!(env!("CARGO_MANIFEST_DIR"), "/prototypes"))
    }

    fn spawn(ids: &[&str]) -> SpawnList {
        SpawnList(ids.iter().map(|id| id.to_string()).collect())
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["engine_app"]);
        assert_eq!(args.prototypes, None);
        assert_eq!(args.extension, "json");
        assert_eq!(args.ticks, 600);
        assert_eq!(args.spawn, vec!["player", "crate"]);
        assert!(!args.verbose);

        let args = Args::parse_from(["engine_app", "-s", "torch", "-s", "crate", "--ticks", "0"]);
        assert_eq!(args.spawn, vec!["torch", "crate"]);
        assert_eq!(args.ticks, 0);
    }

    #[test]
    fn test_args_reject_bad_tick_rate() {
        for rate in ["0", "-5", "NaN", "inf", "fast"] {
            assert!(
                Args::try_parse_from(["engine_app", "--tick-rate", rate]).is_err(),
                "rate {rate} accepted"
            );
        }
        let args = Args::try_parse_from(["engine_app", "--tick-rate", "30"]).unwrap();
        assert_eq!(args.tick_rate, 30.0);
    }

    #[tokio::test]
    async fn test_bundled_prototypes_load_cleanly() {
        let mut runtime = build_runtime(bundled(), spawn(&["player", "crate", "torch"]));
        let report = runtime.start().await.unwrap();
        assert_eq!(report.loaded, 3);
        assert!(report.failures.is_empty());
        assert_eq!(
            runtime.system_names(),
            vec!["TimeSystem", "SpriteSystem", "SpawnSystem", "MotionSystem"]
        );

        let entities = runtime.resolve::<EntityRegistry>().unwrap();
        assert_eq!(entities.len(), 3);
        for entity in entities.entities() {
            let sprite = entity.component::<Sprite>().unwrap().get::<Sprite>().unwrap();
            assert_ne!(sprite.texture_id, 0, "{} has no texture", entity.name());
        }
    }

    #[tokio::test]
    async fn test_frames_move_and_animate_the_player() {
        let mut runtime = build_runtime(bundled(), spawn(&["player"]));
        runtime.start().await.unwrap();

        let player = runtime.resolve::<EntityRegistry>().unwrap().entities()[0].clone();
        let start = player.component::<Transform>().unwrap().get::<Transform>().unwrap();
        let velocity = player.component::<Velocity>().unwrap().get::<Velocity>().unwrap();

        let mut tick_loop = TickLoop::new(TickConfig {
            tick_rate: 1000.0,
            max_ticks: 500,
        });
        tick_loop.run(&mut runtime).await.unwrap();
        assert_eq!(runtime.phase(), Phase::Running);

        let end = player.component::<Transform>().unwrap().get::<Transform>().unwrap();
        let expected = start.position + velocity.velocity * 0.5;
        assert!((end.position - expected).length() < 1e-2);
        assert_ne!(end.position, Vec2::ZERO);

        let sprite = player.component::<Sprite>().unwrap().get::<Sprite>().unwrap();
        assert!(sprite.next_frame_at.is_some());
        assert!((runtime.resolve::<TimeSystem>().unwrap().time() - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_spawn_id_fails_startup() {
        let mut runtime = build_runtime(bundled(), spawn(&["dragon"]));
        let err = runtime.start().await.unwrap_err();
        assert!(err.to_string().contains("SpawnSystem"));
    }
}
