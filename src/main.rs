// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            src_host,
            src_token,
            out_dir,
            include_uncertified,
            must_include,
        } => commands::cmd_collect(
            &src_host,
            &src_token,
            &out_dir,
            include_uncertified,
            &must_include,
        ),
        Commands::Resolve { src_dir, out_dir } => commands::cmd_resolve(&src_dir, &out_dir),
        Commands::Import {
            list,
            src_dir,
            dst_host,
            dst_token,
            max_attempts,
        } => commands::cmd_import(&list, &src_dir, &dst_host, &dst_token, max_attempts),
        Commands::Sync {
            src_host,
            src_token,
            dst_host,
            dst_token,
            include_uncertified,
            must_include,
        } => commands::cmd_sync(
            &src_host,
            &src_token,
            &dst_host,
            &dst_token,
            include_uncertified,
            &must_include,
        ),
    }
}
