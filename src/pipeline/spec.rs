// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Pipeline Specification data model (§3)
//!
//! The structured plan handed to the engine by the (external, out of
//! scope) natural-language parser. Deserialized straight off the wire —
//! JSON per §6, or YAML for on-disk fixtures.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A declarative plan: an ordered (but only advisory) sequence of nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub pipeline_id: String,
    pub components: Vec<NodeSpec>,
}

impl PipelineSpec {
    pub fn from_json(s: &str) -> Result<Self, crate::errors::PipelineError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_yaml(s: &str) -> Result<Self, crate::errors::PipelineError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.components.iter().find(|n| n.id == id)
    }
}

/// Descriptive output hint a planner may attach; used only as a hint by
/// C3's resolver and C7's adapter, never authoritative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputHint {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// One step: an invocation of `tool_type` with `params`, each of which may
/// be a literal value or a string containing placeholder tokens (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub tool_type: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputHint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_json_spec() {
        let json = r#"{
            "pipeline_id": "p1",
            "components": [
                {"id": "a", "tool_type": "search", "params": {"query": "rust"}}
            ]
        }"#;
        let spec = PipelineSpec::from_json(json).unwrap();
        assert_eq!(spec.pipeline_id, "p1");
        assert_eq!(spec.components.len(), 1);
        assert_eq!(spec.node("a").unwrap().tool_type, "search");
        assert!(spec.node("missing").is_none());
    }

    #[test]
    fn parses_yaml_spec() {
        let yaml = "pipeline_id: p2\ncomponents:\n  - id: a\n    tool_type: search\n    params:\n      query: rust\n";
        let spec = PipelineSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.pipeline_id, "p2");
    }
}
