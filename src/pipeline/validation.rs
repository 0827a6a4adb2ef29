// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Pipeline specification validation
//!
//! Structural checks that must pass before a single node executes
//! (§7 `bad_spec`): duplicate ids, unknown tool types, an empty pipeline.

use std::collections::HashSet;

use crate::errors::PipelineError;
use crate::pipeline::spec::PipelineSpec;
use crate::registry::ToolRegistry;

/// Non-fatal observations worth surfacing even when the spec is valid.
#[derive(Debug, Default)]
pub struct ValidationWarnings {
    pub messages: Vec<String>,
}

/// Validate `spec` against `registry`. Returns the first structural
/// violation found, or warnings for anything non-fatal.
pub fn validate(spec: &PipelineSpec, registry: &ToolRegistry) -> Result<ValidationWarnings, PipelineError> {
    let mut warnings = ValidationWarnings::default();

    if spec.components.is_empty() {
        warnings.messages.push("pipeline has no components; result will be an empty aggregation".into());
        return Ok(warnings);
    }

    let mut seen = HashSet::new();
    for node in &spec.components {
        if node.id.is_empty() || !seen.insert(node.id.clone()) {
            return Err(PipelineError::DuplicateNodeId { id: node.id.clone() });
        }
    }

    for node in &spec.components {
        if registry.get(&node.tool_type).is_none() {
            return Err(PipelineError::UnknownTool {
                node: node.id.clone(),
                tool_type: node.tool_type.clone(),
            });
        }
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::spec::NodeSpec;
    use serde_json::Map;

    fn node(id: &str, tool_type: &str) -> NodeSpec {
        NodeSpec {
            id: id.to_string(),
            tool_type: tool_type.to_string(),
            params: Map::new(),
            output: None,
        }
    }

    #[test]
    fn empty_pipeline_is_valid_with_a_warning() {
        let registry = ToolRegistry::with_demo_tools();
        let spec = PipelineSpec {
            pipeline_id: "p".into(),
            components: vec![],
        };
        let warnings = validate(&spec, &registry).unwrap();
        assert!(!warnings.messages.is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let registry = ToolRegistry::with_demo_tools();
        let spec = PipelineSpec {
            pipeline_id: "p".into(),
            components: vec![node("a", "search"), node("a", "search")],
        };
        let err = validate(&spec, &registry).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateNodeId { .. }));
    }

    #[test]
    fn unknown_tool_type_is_rejected() {
        let registry = ToolRegistry::with_demo_tools();
        let spec = PipelineSpec {
            pipeline_id: "p".into(),
            components: vec![node("a", "not_a_real_tool")],
        };
        let err = validate(&spec, &registry).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownTool { .. }));
    }

    #[test]
    fn valid_spec_has_no_warnings() {
        let registry = ToolRegistry::with_demo_tools();
        let spec = PipelineSpec {
            pipeline_id: "p".into(),
            components: vec![node("a", "search")],
        };
        let warnings = validate(&spec, &registry).unwrap();
        assert!(warnings.messages.is_empty());
    }
}
