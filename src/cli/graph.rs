// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Graph command - render the inferred dependency graph

use miette::Result;
use std::path::PathBuf;

use super::GraphFormat;
use crate::pipeline::dag::{build_order, ExecutionPlan};
use crate::pipeline::dependency::{analyze, DependencyEdge};
use crate::pipeline::spec::PipelineSpec;
use crate::registry::ToolRegistry;

/// Run the graph command
pub async fn run(pipeline_path: PathBuf, format: GraphFormat, _verbose: bool) -> Result<()> {
    if !pipeline_path.exists() {
        return Err(miette::miette!(
            "Pipeline specification not found: {}",
            pipeline_path.display()
        ));
    }

    let raw = std::fs::read_to_string(&pipeline_path)
        .map_err(|e| miette::miette!("Failed to read {}: {}", pipeline_path.display(), e))?;
    let is_yaml = matches!(pipeline_path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"));
    let spec = if is_yaml { PipelineSpec::from_yaml(&raw) } else { PipelineSpec::from_json(&raw) }
        .map_err(|e| miette::miette!("Failed to parse pipeline specification: {}", e))?;

    let registry = ToolRegistry::with_demo_tools();
    let edges = analyze(&spec.components, &registry);
    let plan = build_order(&spec.components, &edges, &registry);

    let output = match format {
        GraphFormat::Text => to_text(&spec, &plan, &edges),
        GraphFormat::Dot => to_dot(&spec, &edges),
        GraphFormat::Mermaid => to_mermaid(&spec, &edges),
    };

    println!("{}", output);
    Ok(())
}

fn to_text(spec: &PipelineSpec, plan: &ExecutionPlan, edges: &[DependencyEdge]) -> String {
    let mut out = String::new();
    out.push_str(&format!("pipeline: {}\n", spec.pipeline_id));
    if plan.cycle_detected {
        out.push_str("warning: dependency cycle detected; heuristic order used\n");
    }
    out.push_str("execution order:\n");
    for (i, id) in plan.order.iter().enumerate() {
        let tool = spec.node(id).map(|n| n.tool_type.as_str()).unwrap_or("?");
        out.push_str(&format!("  {}. {} ({})\n", i + 1, id, tool));
    }
    if !edges.is_empty() {
        out.push_str("edges:\n");
        for edge in edges {
            out.push_str(&format!(
                "  {} -> {} [{:?}, confidence {:.2}]\n",
                edge.source, edge.target, edge.kind, edge.confidence
            ));
        }
    }
    out
}

fn to_dot(spec: &PipelineSpec, edges: &[DependencyEdge]) -> String {
    let mut out = String::from("digraph pipeline {\n");
    for node in &spec.components {
        out.push_str(&format!("  \"{}\" [label=\"{}\\n{}\"];\n", node.id, node.id, node.tool_type));
    }
    for edge in edges {
        out.push_str(&format!("  \"{}\" -> \"{}\" [label=\"{:.2}\"];\n", edge.source, edge.target, edge.confidence));
    }
    out.push_str("}\n");
    out
}

fn to_mermaid(spec: &PipelineSpec, edges: &[DependencyEdge]) -> String {
    let mut out = String::from("graph TD\n");
    for node in &spec.components {
        out.push_str(&format!("  {}[\"{} ({})\"]\n", node.id, node.id, node.tool_type));
    }
    for edge in edges {
        out.push_str(&format!("  {} --> {}\n", edge.source, edge.target));
    }
    out
}
