//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// World generator preview arguments.
///
/// CLI values override settings loaded from `worldgen.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "nebula-worldgen", about = "Preview a scripted world generator")]
pub struct CliArgs {
    /// Generator definition script.
    #[arg(long)]
    pub generator: Option<PathBuf>,

    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Column height bounding the script's sea level.
    #[arg(long)]
    pub chunk_height: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref path) = args.generator {
            self.worldgen.generator = path.clone();
        }
        if let Some(seed) = args.seed {
            self.worldgen.seed = seed;
        }
        if let Some(height) = args.chunk_height {
            self.worldgen.chunk_height = height;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
