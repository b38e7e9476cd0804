//! Recolor landscape vertex colors and write the changed tiles to a patch file
//!
//! Run with: cargo run --bin landscape-recolor -- --world world.json.gz --output patch.json

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use landscape_recolor::runner::DEFAULT_THREADS;
use landscape_recolor::{run_patch, PatchMod, Plugin, RunOptions, Settings};

#[derive(Parser)]
#[command(name = "landscape-recolor")]
#[command(about = "Rewrite landscape vertex colors with per-channel formulas")]
struct Cli {
    /// World file to read (JSON, `.gz` for gzip)
    #[arg(long)]
    world: PathBuf,
    /// Patch file to write
    #[arg(long)]
    output: PathBuf,
    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_THREADS)]
    threads: usize,
    /// Strip vertex colors instead of recoloring
    #[arg(long)]
    remove_all: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> landscape_recolor::Result<()> {
    let mut settings = Settings::resolve(cli.settings.as_deref())?;
    settings.remove_all_vertex_colors |= cli.remove_all;

    let start = Instant::now();
    let plugin = Plugin::load(&cli.world)?;
    info!(
        "Loaded {} landscapes and {} textures from {} in {:.2?}",
        plugin.landscapes.len(),
        plugin.textures.len(),
        cli.world.display(),
        start.elapsed()
    );

    let patch = PatchMod::new();
    let summary = run_patch(&plugin, &patch, &settings, &RunOptions { threads: cli.threads })?;

    let output = patch.into_plugin();
    output.save(&cli.output)?;
    info!("Wrote {} landscapes to {}", output.landscapes.len(), cli.output.display());

    println!("{}", summary);
    Ok(())
}
