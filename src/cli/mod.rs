// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for taskweave.

pub mod describe;
pub mod graph;
pub mod run;
pub mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Orchestration engine for dynamically composed, heterogeneous tool pipelines
#[derive(Parser, Debug)]
#[clap(
    name = "taskweave",
    version,
    about = "Orchestration engine for dynamically composed, heterogeneous tool pipelines",
    long_about = None,
    after_help = "Examples:\n\
        taskweave run pipeline.json        Execute a pipeline specification\n\
        taskweave validate pipeline.json   Check a pipeline specification\n\
        taskweave graph pipeline.json       Render the inferred dependency graph\n\
        taskweave describe                 List the tools registered with the engine\n\n\
        See 'taskweave <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a pipeline specification, streaming progress events to stdout
    Run {
        /// Pipeline specification file (JSON or YAML)
        pipeline: PathBuf,

        /// Progress event format
        #[clap(short, long, default_value = "ndjson", value_parser = ["ndjson", "sse", "text"])]
        format: EventFormat,

        /// Override the per-tool invocation timeout, in seconds
        #[clap(long)]
        tool_timeout: Option<u64>,

        /// Override the whole-pipeline timeout, in seconds
        #[clap(long)]
        pipeline_timeout: Option<u64>,
    },

    /// Validate a pipeline specification without executing it
    Validate {
        /// Pipeline specification file (JSON or YAML)
        pipeline: PathBuf,
    },

    /// Render the inferred dependency graph and execution order
    Graph {
        /// Pipeline specification file (JSON or YAML)
        pipeline: PathBuf,

        /// Output format
        #[clap(short, long, default_value = "text", value_parser = ["text", "dot", "mermaid"])]
        format: GraphFormat,
    },

    /// List the tools registered with the engine, or describe one in detail
    Describe {
        /// Tool name to describe; omit to list every registered tool
        tool: Option<String>,
    },
}

/// Progress-event serialization for `taskweave run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFormat {
    Ndjson,
    Sse,
    Text,
}

impl std::str::FromStr for EventFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ndjson" => Ok(Self::Ndjson),
            "sse" => Ok(Self::Sse),
            "text" => Ok(Self::Text),
            _ => Err(format!("Unknown event format: {}", s)),
        }
    }
}

/// Dependency-graph output format for `taskweave graph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}
