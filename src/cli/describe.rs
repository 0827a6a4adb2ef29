// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Describe command - list or inspect registered tools

use colored::Colorize;
use miette::Result;

use crate::registry::ToolRegistry;

/// Run the describe command
pub async fn run(tool: Option<String>, _verbose: bool) -> Result<()> {
    let registry = ToolRegistry::with_demo_tools();

    let Some(name) = tool else {
        println!("{}", "Registered tools:".bold());
        for descriptor in registry.list() {
            println!("  {} ({})", descriptor.name, descriptor.category);
        }
        return Ok(());
    };

    let Some(descriptor) = registry.get(&name) else {
        return Err(miette::miette!("Unknown tool: {}", name));
    };

    println!("{}", descriptor.name.bold());
    println!("  category: {}", descriptor.category);

    println!("  input schema:");
    let mut params: Vec<_> = descriptor.input_schema.iter().collect();
    params.sort_by(|a, b| a.0.cmp(b.0));
    for (param, ty) in params {
        println!("    {}: {}", param, ty);
    }

    println!("  output:");
    if let Some(primary) = &descriptor.output.primary {
        println!("    primary: {}", primary);
    }
    if !descriptor.output.secondary_keys.is_empty() {
        println!("    secondary: {}", descriptor.output.secondary_keys.join(", "));
    }
    if descriptor.output.produces_paths {
        println!("    produces_paths: true");
    }

    Ok(())
}
