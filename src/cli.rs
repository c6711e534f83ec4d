// src/cli.rs
//! CLI definitions for caravan
//!
//! This module contains all command-line interface definitions using
//! clap. The actual command implementations are in the `commands`
//! module.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "caravan")]
#[command(version)]
#[command(
    about = "Sync versioned configuration bundles between registries in dependency-first order",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download every bundle from a source registry into a directory
    Collect {
        /// Base URL of the source registry
        #[arg(long, default_value = "https://registry.example.com")]
        src_host: String,

        /// API token for the source registry
        #[arg(long)]
        src_token: String,

        /// Directory to write bundle sources into
        #[arg(short, long, default_value = "bundles")]
        out_dir: String,

        /// Also list bundles not marked certified
        #[arg(long)]
        include_uncertified: bool,

        /// Refs to fetch even if the listing hides them
        #[arg(long = "must-include")]
        must_include: Vec<String>,
    },

    /// Resolve a dependency-first order for collected bundles
    Resolve {
        /// Directory holding collected bundle sources
        #[arg(short, long, default_value = "bundles")]
        src_dir: String,

        /// Directory to write the ordered list and diagnostics into
        #[arg(short, long, default_value = ".")]
        out_dir: String,
    },

    /// Import a previously resolved list into a target registry
    Import {
        /// Path to the ordered ref list produced by resolve
        #[arg(short, long, default_value = "resolved-order.txt")]
        list: String,

        /// Directory holding collected bundle sources
        #[arg(short, long, default_value = "bundles")]
        src_dir: String,

        /// Base URL of the target registry
        #[arg(long)]
        dst_host: String,

        /// API token for the target registry
        #[arg(long)]
        dst_token: String,

        /// Attempts per bundle before dropping or aborting
        #[arg(long, default_value_t = caravan::registry::DEFAULT_MAX_ATTEMPTS)]
        max_attempts: u32,
    },

    /// Collect, resolve, and import in one run
    Sync {
        /// Base URL of the source registry
        #[arg(long, default_value = "https://registry.example.com")]
        src_host: String,

        /// API token for the source registry
        #[arg(long)]
        src_token: String,

        /// Base URL of the target registry
        #[arg(long)]
        dst_host: String,

        /// API token for the target registry
        #[arg(long)]
        dst_token: String,

        /// Also list bundles not marked certified
        #[arg(long)]
        include_uncertified: bool,

        /// Refs to fetch even if the listing hides them
        #[arg(long = "must-include")]
        must_include: Vec<String>,
    },
}
