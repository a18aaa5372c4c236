//! CLI entry point for the fragment dataset generator

use clap::Parser;
use shardset::io::cli::{Cli, run};
use tracing_subscriber::filter::LevelFilter;

fn main() -> shardset::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(cli.log_level()).into())
                .from_env_lossy(),
        )
        .init();

    run(cli)
}
