// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Semantic Dependency Analyzer (C4)
//!
//! Infers edges among nodes from explicit placeholder references (Pass A)
//! and from tool-category input/output semantics when references are
//! absent, approximate, or mismatched (Pass B). §4.4.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::pipeline::spec::NodeSpec;
use crate::registry::{SemanticType, ToolCategory, ToolRegistry};

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\.output").unwrap());

const SUFFIXES: &[&str] = &["_node", "_tool", "_processor", "_handler", "_generator"];
const STOPWORDS: &[&str] = &["node", "tool", "processor", "handler", "generator", "the", "a"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    PlaceholderReference,
    DataFlowSemantic,
}

#[derive(Debug, Clone)]
pub struct DependencyEdge {
    pub source: String,
    pub target: String,
    pub confidence: f64,
    pub kind: EdgeKind,
    pub evidence: Vec<String>,
}

/// Collect every `$node_id.output` reference anywhere in `params`.
fn referenced_ids(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for caps in PLACEHOLDER_RE.captures_iter(s) {
                out.push(caps.get(1).unwrap().as_str().to_string());
            }
        }
        Value::Array(items) => items.iter().for_each(|v| referenced_ids(v, out)),
        Value::Object(map) => map.values().for_each(|v| referenced_ids(v, out)),
        _ => {}
    }
}

fn keywords(s: &str) -> HashSet<String> {
    s.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .map(|w| w.to_lowercase())
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

fn strip_suffix(s: &str) -> &str {
    for suffix in SUFFIXES {
        if let Some(stripped) = s.strip_suffix(suffix) {
            return stripped;
        }
    }
    s
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Best-effort match of a dangling reference to a real node id (§4.4 Pass A).
fn fuzzy_match(reference: &str, node_ids: &[&String]) -> Option<(String, f64)> {
    let stripped_ref = strip_suffix(reference);
    let ref_keywords = keywords(reference);

    let mut best: Option<(String, f64)> = None;
    for id in node_ids {
        let stripped_id = strip_suffix(id);
        let score = if stripped_ref == stripped_id {
            0.95
        } else if id.contains(reference) || reference.contains(id.as_str()) {
            0.85
        } else {
            jaccard(&ref_keywords, &keywords(id))
        };
        if best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
            best = Some(((*id).clone(), score));
        }
    }
    best.filter(|(_, score)| *score > 0.7)
}

fn category_fallback_match(
    reference: &str,
    node_ids: &[&String],
    categories: &HashMap<String, ToolCategory>,
) -> Option<(String, f64)> {
    let ref_keywords = keywords(reference);
    let mut best: Option<(String, f64)> = None;
    for id in node_ids {
        let cat = categories.get(*id).map(|c| c.to_string()).unwrap_or_default();
        let score = jaccard(&ref_keywords, &keywords(&cat));
        if score > 0.5 && best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
            best = Some(((*id).clone(), score));
        }
    }
    best
}

/// Pass A: placeholder-reference edges.
fn pass_a(nodes: &[NodeSpec], categories: &HashMap<String, ToolCategory>) -> Vec<DependencyEdge> {
    let node_ids: Vec<&String> = nodes.iter().map(|n| &n.id).collect();
    let id_set: HashSet<&str> = node_ids.iter().map(|s| s.as_str()).collect();

    let mut edges = Vec::new();
    for node in nodes {
        let mut refs = Vec::new();
        referenced_ids(&Value::Object(node.params.clone()), &mut refs);
        for reference in refs {
            if id_set.contains(reference.as_str()) {
                edges.push(DependencyEdge {
                    source: reference.clone(),
                    target: node.id.clone(),
                    confidence: 0.9,
                    kind: EdgeKind::PlaceholderReference,
                    evidence: vec![format!("explicit placeholder `${}.output`", reference)],
                });
                continue;
            }
            if let Some((matched, score)) = fuzzy_match(&reference, &node_ids) {
                edges.push(DependencyEdge {
                    source: matched.clone(),
                    target: node.id.clone(),
                    confidence: 0.9,
                    kind: EdgeKind::PlaceholderReference,
                    evidence: vec![format!(
                        "fuzzy-matched `${}.output` to '{}' (score {:.2})",
                        reference, matched, score
                    )],
                });
            } else if let Some((matched, score)) = category_fallback_match(&reference, &node_ids, categories) {
                edges.push(DependencyEdge {
                    source: matched.clone(),
                    target: node.id.clone(),
                    confidence: 0.7,
                    kind: EdgeKind::PlaceholderReference,
                    evidence: vec![format!(
                        "category-matched `${}.output` to '{}' (score {:.2})",
                        reference, matched, score
                    )],
                });
            }
            // else: unresolved reference, left to the placeholder resolver (§4.3).
        }
    }
    edges
}

fn compatible(from: &SemanticType, in_type: &SemanticType, to_category: ToolCategory) -> f64 {
    use SemanticType::*;
    match (from, in_type) {
        // Unconditional per the original analyzer's `_check_semantic_compatibility`:
        // a file_path producer feeding a file_content consumer scores 0.7-0.8
        // regardless of the consumer's tool category.
        (FilePath, FileContent) => 0.8,
        (FileContent, FilePath) if matches!(to_category, ToolCategory::FileOperator | ToolCategory::Storage) => 0.8,
        (ImageRef, ImageRef) if matches!(to_category, ToolCategory::DataProcessor) => 0.75,
        _ => 0.0,
    }
}

/// Pass B: data-flow semantic edges between tool categories.
fn pass_b(nodes: &[NodeSpec], registry: &ToolRegistry) -> Vec<DependencyEdge> {
    let mut edges = Vec::new();
    for a in nodes {
        let Some(desc_a) = registry.get(&a.tool_type) else {
            continue;
        };
        for b in nodes {
            if a.id == b.id {
                continue;
            }
            let Some(desc_b) = registry.get(&b.tool_type) else {
                continue;
            };

            let mut produced: Vec<SemanticType> = desc_a.output.primary.clone().into_iter().collect();
            if desc_a.output.produces_paths {
                produced.push(SemanticType::FilePath);
            }

            let mut best = 0.0_f64;
            let mut evidence = Vec::new();
            for out_type in &produced {
                for (param, in_type) in &desc_b.input_schema {
                    let score = if out_type == in_type {
                        0.9
                    } else {
                        compatible(out_type, in_type, desc_b.category)
                    };
                    if score > best {
                        best = score;
                        evidence = vec![format!(
                            "'{}' output ({}) feeds '{}' param '{}' ({})",
                            a.id, out_type, b.id, param, in_type
                        )];
                    }
                }
            }

            if best >= 0.6 {
                edges.push(DependencyEdge {
                    source: a.id.clone(),
                    target: b.id.clone(),
                    confidence: best,
                    kind: EdgeKind::DataFlowSemantic,
                    evidence,
                });
            }
        }
    }
    edges
}

/// Run both passes and dedupe by `(source, target)`, keeping the maximum
/// confidence and the union of evidence.
pub fn analyze(nodes: &[NodeSpec], registry: &ToolRegistry) -> Vec<DependencyEdge> {
    let categories: HashMap<String, ToolCategory> = nodes
        .iter()
        .filter_map(|n| registry.get(&n.tool_type).map(|d| (n.id.clone(), d.category)))
        .collect();

    let mut merged: HashMap<(String, String), DependencyEdge> = HashMap::new();
    for edge in pass_a(nodes, &categories).into_iter().chain(pass_b(nodes, registry)) {
        merged
            .entry((edge.source.clone(), edge.target.clone()))
            .and_modify(|existing| {
                if edge.confidence > existing.confidence {
                    existing.confidence = edge.confidence;
                }
                existing.evidence.extend(edge.evidence.clone());
            })
            .or_insert(edge);
    }
    let mut edges: Vec<_> = merged.into_values().collect();
    edges.sort_by(|a, b| (a.source.as_str(), a.target.as_str()).cmp(&(b.source.as_str(), b.target.as_str())));
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str, tool_type: &str, params: serde_json::Map<String, Value>) -> NodeSpec {
        NodeSpec {
            id: id.to_string(),
            tool_type: tool_type.to_string(),
            params,
            output: None,
        }
    }

    #[test]
    fn explicit_reference_produces_high_confidence_edge() {
        let registry = ToolRegistry::with_demo_tools();
        let mut params = serde_json::Map::new();
        params.insert("content".to_string(), json!("$a.output.data.primary"));
        let nodes = vec![
            node("a", "search", serde_json::Map::new()),
            node("b", "report_generator", params),
        ];
        let edges = analyze(&nodes, &registry);
        assert!(edges
            .iter()
            .any(|e| e.source == "a" && e.target == "b" && e.confidence >= 0.9));
    }

    #[test]
    fn fuzzy_reference_recovers_correct_node() {
        let registry = ToolRegistry::with_demo_tools();
        let mut params = serde_json::Map::new();
        params.insert(
            "file_content".to_string(),
            json!("$enhanced_report_node.output.data.primary"),
        );
        let nodes = vec![
            node("a", "search", serde_json::Map::new()),
            node("report_node", "report_generator", serde_json::Map::new()),
            node("c", "file_writer", params),
        ];
        let edges = analyze(&nodes, &registry);
        assert!(edges
            .iter()
            .any(|e| e.source == "report_node" && e.target == "c"));
    }

    #[test]
    fn data_flow_pass_links_writer_to_uploader() {
        let registry = ToolRegistry::with_demo_tools();
        let nodes = vec![
            node("w", "file_writer", serde_json::Map::new()),
            node("u", "object_store_uploader", serde_json::Map::new()),
        ];
        let edges = analyze(&nodes, &registry);
        assert!(edges
            .iter()
            .any(|e| e.source == "w" && e.target == "u" && e.kind == EdgeKind::DataFlowSemantic));
    }
}
