mod commands;
mod error;
mod options;
mod pipeline;
mod runner;
mod scene;
mod upload;

use anyhow::Context;
use clap::{Parser, builder::styling};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::error;
use pipeline::Pipeline;
use rig_config::RigConfig;
use runner::SystemRunner;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rig")]
#[command(about = "Drive the Blender to Roblox asset pipeline for a scene")]
#[command(version = env!("RIG_VERSION"))]
#[command(long_version = env!("RIG_VERSION"))]
#[command(
    styles = styling::Styles::styled()
        .header(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(styling::AnsiColor::Cyan.on_default() | styling::Effects::BOLD)
        .placeholder(styling::AnsiColor::Cyan.on_default())
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,

    /// Project root containing rig.toml, assets/ and scripts/
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Blender binary to use instead of the configured one
    #[arg(long, global = true, env = "BLENDER", value_name = "PATH")]
    blender: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn init_logging(verbose: &Verbosity<InfoLevel>) -> MultiProgress {
    let logger = env_logger::Builder::new()
        .filter_level(verbose.log_level_filter())
        .format_timestamp(None)
        .format_target(false)
        .build();
    let level = logger.filter();

    let progress = MultiProgress::new();
    if LogWrapper::new(progress.clone(), logger).try_init().is_ok() {
        log::set_max_level(level);
    }
    progress
}

fn run(cli: Cli, progress: MultiProgress) -> anyhow::Result<()> {
    let mut config = RigConfig::read_from(&cli.project)
        .with_context(|| format!("Failed to load config from {}", cli.project.display()))?;
    if let Some(blender) = cli.blender {
        config.tools.blender = blender;
    }

    let (action, scene, args) = cli.command.into_parts();
    let options = args.resolve(&config.render)?;

    let pipeline = Pipeline::new(cli.project, config, SystemRunner, progress);
    pipeline.dispatch(action, &scene, &options)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let progress = init_logging(&cli.verbose);

    let result = run(cli, progress);
    if let Err(e) = &result {
        error!("{e:#}");
    }

    std::process::exit(if result.is_ok() { 0 } else { 1 });
}
