//! Zenmix CLI
//!
//! Command-line front end for the zenmix audio engine.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zenmix::cli::commands;
use zenmix::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("zenmix v{}", env!("CARGO_PKG_VERSION"));

    let Some(command) = cli.command else {
        println!("zenmix v{}", env!("CARGO_PKG_VERSION"));
        println!("Use --help for available commands");
        return Ok(());
    };

    let config = commands::load_config(cli.config.as_deref());
    let catalog = commands::load_catalog(cli.catalog.as_deref())?;

    match command {
        Commands::List { category, json } => commands::list(&catalog, category.as_deref(), json),
        Commands::Render {
            sound,
            out,
            seconds,
            volume,
            once,
            output,
        } => commands::render(&catalog, config, &sound, &out, seconds, volume, once, output),
        Commands::RenderMix {
            mix,
            out,
            seconds,
            output,
        } => commands::render_mix(&catalog, config, &mix, &out, seconds, output),
        Commands::Inspect { sound, sample_rate } => {
            commands::inspect(&catalog, &sound, sample_rate)
        }
    }
}
