//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for adserver using clap's derive macros.

use clap::{Parser, Subcommand};

/// adserver - ad management and serving for video sites
#[derive(Parser)]
#[command(name = "adserver")]
#[command(version)]
#[command(about = "Ad management and serving service", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// List ads
    List {
        /// Only ads in this slot (1-5)
        #[arg(long)]
        slot: Option<String>,

        /// active | inactive
        #[arg(long)]
        status: Option<String>,

        /// image | video | google_ads
        #[arg(long = "type")]
        ad_type: Option<String>,
    },

    /// Show one ad with its statistics
    Show {
        id: i64,
    },

    /// Toggle an ad's active flag, or force it with --on / --off
    Toggle {
        id: i64,

        /// Activate regardless of the current state
        #[arg(long, conflicts_with = "off")]
        on: bool,

        /// Deactivate regardless of the current state
        #[arg(long)]
        off: bool,
    },

    /// Delete an ad together with its impressions and clicks
    Delete {
        id: i64,
    },

    /// Show dashboard totals
    Stats,

    /// Export ads to CSV or JSON
    Export {
        /// csv | json
        #[arg(long, default_value = "csv")]
        format: String,

        /// Output file path (default: ads_export_<timestamp>.<ext>)
        file_path: Option<String>,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file without asking
        #[arg(long)]
        force: bool,
    },
}
