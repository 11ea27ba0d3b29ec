//! CLI Module
//!
//! Command-line front end for auditioning sounds and mixes offline.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Zenmix - procedural ambient sound renderer
#[derive(Parser, Debug)]
#[command(name = "zenmix-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine config file (JSON); defaults are used when absent
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Custom sound catalog (JSON); the builtin catalog otherwise
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the sounds in the catalog
    #[command(name = "list")]
    List {
        /// Only show one category (nature, ambient, focus, meditation, urban, instrument)
        #[arg(short, long)]
        category: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Render a single sound to a WAV file
    #[command(name = "render")]
    Render {
        /// Sound id
        sound: String,

        /// Output WAV file
        #[arg(short, long)]
        out: PathBuf,

        /// Length in seconds
        #[arg(short, long, default_value_t = 10.0)]
        seconds: f32,

        /// Voice volume (0..1), defaults to the sound's base volume
        #[arg(long)]
        volume: Option<f32>,

        /// Play once instead of looping
        #[arg(long)]
        once: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Render a saved mix to a WAV file
    #[command(name = "render-mix")]
    RenderMix {
        /// Mix file (JSON)
        mix: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        out: PathBuf,

        /// Length in seconds
        #[arg(short, long, default_value_t = 30.0)]
        seconds: f32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print signal statistics for a sound's generated audio
    #[command(name = "inspect")]
    Inspect {
        /// Sound id
        sound: String,

        /// Sample rate to synthesize at
        #[arg(long, default_value_t = 48000)]
        sample_rate: u32,
    },
}

/// Render output settings shared by the render commands
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct OutputArgs {
    /// Sample rate of the render
    #[arg(long, default_value_t = 48000)]
    pub sample_rate: u32,

    /// WAV bit depth (16, 24 or 32)
    #[arg(long, default_value_t = 24)]
    pub bit_depth: u16,
}
