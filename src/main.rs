//! actorgraph-rs - headless actor graph host
//!
//! Usage: `actorgraph-rs [--config <config.toml>] [patch.agpatch]`
//!
//! Loads the optional patch and runs its actors until stdin is closed. While
//! running, stdin accepts `list`, `save <path>` and `quit`.

use actorgraph_rs::{
    actors::ActorFactory,
    config::{AppConfig, LoggingConfig},
    patch::PatchFile,
    system::ActorSystem,
};
use anyhow::Context;
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Headless host for actor graphs.
#[derive(Debug, Parser)]
#[command(name = "actorgraph-rs")]
#[command(about = "Run a patch of capability-driven actors", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, env = "ACTORGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Patch file to load on startup
    patch: Option<PathBuf>,
}

/// Install the global subscriber. The returned guard flushes the log file on drop.
fn init_logging(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match &logging.file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let dir = dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
            let prefix = path
                .file_name()
                .context("logging.file has no file name")?;
            let appender = tracing_appender::rolling::daily(dir, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter)))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

fn run_console(system: &ActorSystem) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("quit"), _) => break,
            (Some("list"), _) => match system.actor_ids() {
                Ok(ids) => {
                    for id in ids {
                        if let Ok(meta) = system.meta(id) {
                            println!("{} {} ({:.1}, {:.1})", id, meta.title, meta.xpos, meta.ypos);
                        }
                    }
                    for c in system.connections().unwrap_or_default() {
                        println!(
                            "{}.{} -> {}.{}",
                            c.source, c.source_slot, c.target, c.target_slot
                        );
                    }
                }
                Err(e) => tracing::warn!("{}", e),
            },
            (Some("save"), Some(path)) => {
                let result = PatchFile::capture(system, "console").and_then(|p| p.save(path));
                match result {
                    Ok(()) => tracing::info!("Saved patch to {}", path),
                    Err(e) => tracing::warn!("Failed to save patch: {}", e),
                }
            }
            (None, _) => {}
            (Some(other), _) => tracing::warn!("Unknown command '{}'", other),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load_or_default(args.config.as_deref());
    let _log_guard = init_logging(&config.logging)?;

    tracing::info!("Starting actorgraph-rs");

    let system = ActorSystem::new(config, ActorFactory::with_builtins());

    if let Some(path) = &args.patch {
        let patch = PatchFile::load(path).with_context(|| format!("Failed to load {:?}", path))?;
        patch
            .apply(&system)
            .with_context(|| format!("Failed to apply {:?}", path))?;
    }

    run_console(&system);

    tracing::info!("Shutting down");
    system.shutdown();
    Ok(())
}
