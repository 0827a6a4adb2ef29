// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! taskweave - orchestration engine for dynamically composed tool pipelines

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskweave::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskweave=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    match cli.command {
        Commands::Run {
            pipeline,
            format,
            tool_timeout,
            pipeline_timeout,
        } => taskweave::cli::run::run(pipeline, format, tool_timeout, pipeline_timeout, cli.verbose).await,
        Commands::Validate { pipeline } => taskweave::cli::validate::run(pipeline, cli.verbose).await,
        Commands::Graph { pipeline, format } => taskweave::cli::graph::run(pipeline, format, cli.verbose).await,
        Commands::Describe { tool } => taskweave::cli::describe::run(tool, cli.verbose).await,
    }
}
