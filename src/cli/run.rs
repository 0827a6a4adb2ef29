// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Run command - execute a pipeline specification

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::AdapterCache;
use crate::config::EngineConfig;
use crate::context::RequestContext;
use crate::events::{to_ndjson, to_sse, Event, EventType};
use crate::pipeline::output_adapter::OutputAdapter;
use crate::pipeline::spec::PipelineSpec;
use crate::pipeline::PipelineExecutor;
use crate::registry::ToolRegistry;
use crate::utils::spinner;

use super::EventFormat;

/// Run the pipeline
pub async fn run(
    pipeline_path: PathBuf,
    format: EventFormat,
    tool_timeout: Option<u64>,
    pipeline_timeout: Option<u64>,
    verbose: bool,
) -> Result<()> {
    if !pipeline_path.exists() {
        return Err(miette::miette!(
            "Pipeline specification not found: {}",
            pipeline_path.display()
        ));
    }

    let loading = spinner::create_spinner("loading pipeline specification");
    let raw = std::fs::read_to_string(&pipeline_path)
        .map_err(|e| miette::miette!("Failed to read {}: {}", pipeline_path.display(), e))?;
    let spec = load_spec(&pipeline_path, &raw)?;
    loading.finish_and_clear();

    let mut config = EngineConfig::from_env_or_default();
    if let Some(secs) = tool_timeout {
        config.tool_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = pipeline_timeout {
        config.pipeline_timeout = Duration::from_secs(secs);
    }

    let registry = Arc::new(ToolRegistry::with_demo_tools());
    let cache = Arc::new(AdapterCache::new(config.adapter_cache_capacity));
    let adapter = Arc::new(OutputAdapter::new(cache, std::env::temp_dir()));
    let executor = PipelineExecutor::new(registry, adapter);

    let (ctx, mut events) = RequestContext::new(&config);
    let request_id = ctx.request_id.clone();

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event, format);
        }
    });

    let outcome = executor.execute(&spec, &ctx).await;
    let _ = printer.await;

    match outcome {
        Ok(result) => {
            if verbose {
                eprintln!(
                    "{}",
                    format!("request {} completed with {} node(s)", request_id, result.summaries.len()).dimmed()
                );
            }
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn load_spec(path: &PathBuf, raw: &str) -> Result<PipelineSpec> {
    let is_yaml = matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"));
    let parsed = if is_yaml { PipelineSpec::from_yaml(raw) } else { PipelineSpec::from_json(raw) };
    parsed.map_err(|e| miette::miette!("Failed to parse pipeline specification: {}", e))
}

fn print_event(event: &Event, format: EventFormat) {
    match format {
        EventFormat::Ndjson => print!("{}", to_ndjson(event)),
        EventFormat::Sse => print!("{}", to_sse(event)),
        EventFormat::Text => {
            let marker = match event.event_type {
                EventType::Error => "✗".red().to_string(),
                EventType::Result => "✓".green().to_string(),
                EventType::ToolStart => "▶".cyan().to_string(),
                EventType::ToolResult => "●".to_string(),
                EventType::Heartbeat => "·".dimmed().to_string(),
                _ => "-".to_string(),
            };
            println!("{} [{}] {}", marker, event.step, event.message);
        }
    }
}
