// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Validate command - check a pipeline specification

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::pipeline::spec::PipelineSpec;
use crate::pipeline::validation;
use crate::registry::ToolRegistry;
use crate::utils::colors;

/// Run the validate command
pub async fn run(pipeline_path: PathBuf, verbose: bool) -> Result<()> {
    colors::print_header("Validating pipeline specification");

    if !pipeline_path.exists() {
        return Err(miette::miette!(
            "Pipeline specification not found: {}",
            pipeline_path.display()
        ));
    }

    let raw = std::fs::read_to_string(&pipeline_path)
        .map_err(|e| miette::miette!("Failed to read {}: {}", pipeline_path.display(), e))?;
    let is_yaml = matches!(pipeline_path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"));
    let spec = if is_yaml { PipelineSpec::from_yaml(&raw) } else { PipelineSpec::from_json(&raw) };
    let spec = match spec {
        Ok(s) => s,
        Err(e) => {
            colors::print_error("failed to parse specification");
            return Err(miette::miette!("Parse error: {}", e));
        }
    };
    colors::print_success(&format!("specification parses cleanly ({} node(s))", spec.components.len()));

    if verbose {
        colors::print_section("Nodes");
        for node in &spec.components {
            println!("    - {} ({})", node.id, node.tool_type);
        }
    }

    let registry = ToolRegistry::with_demo_tools();
    match validation::validate(&spec, &registry) {
        Ok(warnings) => {
            if warnings.messages.is_empty() {
                colors::print_success("no structural issues found");
            } else {
                colors::print_section("Warnings");
                for message in &warnings.messages {
                    colors::print_warning(message);
                }
            }
            println!();
            println!("{}", "Pipeline specification is valid!".green().bold());
            Ok(())
        }
        Err(e) => {
            colors::print_section("Errors");
            colors::print_error(&e.to_string());
            Err(miette::miette!("Pipeline specification is invalid"))
        }
    }
}
