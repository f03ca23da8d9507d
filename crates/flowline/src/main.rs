// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flowline - real-time tracking of flow message deliveries.
//!
//! This is the binary entry point for the Flowline service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flowline_config::{ConfigError, FlowlineConfig};

/// Flowline - real-time tracking of flow message deliveries.
#[derive(Parser, Debug)]
#[command(name = "flowline", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the queue tracker and its HTTP gateway.
    Serve,
    /// Print the resolved configuration as TOML.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<FlowlineConfig, Vec<ConfigError>> {
    match path {
        Some(path) => flowline_config::load_and_validate_path(path),
        None => flowline_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            flowline_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("flowline: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("flowline: failed to render configuration: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("flowline: use --help for available commands");
        }
    }
}
