//! UTFGrid CLI - Command-line interface
//!
//! Fetches UTFGrid tiles, probes the feature under a point and manages
//! the configuration file.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use error::CliError;
use utfgrid::logging::{init_logging, LogOptions};

#[derive(Debug, Parser)]
#[command(name = "utfgrid", version, about = "Inspect UTFGrid interaction tiles")]
struct Cli {
    /// Tile URL template, overriding source.url from the config file
    #[arg(long, global = true)]
    url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch one tile and summarize its grid
    Tile {
        /// Zoom level
        z: u8,
        /// Tile column
        x: i64,
        /// Tile row
        y: i64,
    },

    /// Report the feature under a geographic point
    Probe {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Zoom level
        #[arg(long)]
        zoom: u8,
    },

    /// Encode feature indices as grid characters
    Encode {
        /// Indices into a tile's keys array
        #[arg(required = true)]
        indices: Vec<u32>,
    },

    /// Decode grid characters to feature indices
    Decode {
        /// Characters copied from a grid row
        text: String,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut options = LogOptions::default();
    if cli.verbose {
        options = options.with_directive("utfgrid=debug");
    }
    if let Some(path) = &cli.log_file {
        options = options.with_file(path);
    }

    let _guard = match init_logging(&options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", CliError::from(e));
            process::exit(1);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let url = cli.url;
    match cli.command {
        Commands::Tile { z, x, y } => commands::tile::run(url, z, x, y),
        Commands::Probe { lat, lon, zoom } => commands::probe::run(url, lat, lon, zoom),
        Commands::Encode { indices } => commands::codec::run_encode(&indices),
        Commands::Decode { text } => commands::codec::run_decode(&text),
        Commands::Config { command } => commands::config::run(command),
    }
}
