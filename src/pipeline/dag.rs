// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Execution Order Builder (C5)
//!
//! Combines C3's placeholder edges and C4's semantic edges into a
//! validated topological order. Unlike a hard scheduler, a cycle never
//! fails the request — it downgrades to a warning and a deterministic
//! heuristic order (§4.5, §9 "Cycle detection that raised exceptions").

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::pipeline::dependency::DependencyEdge;
use crate::pipeline::spec::NodeSpec;
use crate::registry::{ToolCategory, ToolRegistry};

/// Minimum edge confidence kept when building the DAG (§4.5 step 1).
const MIN_EDGE_CONFIDENCE: f64 = 0.3;

fn category_priority(category: ToolCategory) -> u8 {
    match category {
        ToolCategory::DataSource => 1,
        ToolCategory::DataProcessor => 2,
        ToolCategory::FileOperator => 3,
        ToolCategory::Storage => 4,
        ToolCategory::Other => 5,
    }
}

/// The computed node order, plus anything worth surfacing to the caller.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub order: Vec<String>,
    pub cycle_detected: bool,
    /// Edges whose source did not end up scheduled before its target —
    /// only possible when `cycle_detected` forced the heuristic order.
    pub order_violations: Vec<(String, String)>,
}

/// Build the execution order for `nodes` given the inferred `edges` (§4.5).
pub fn build_order(nodes: &[NodeSpec], edges: &[DependencyEdge], registry: &ToolRegistry) -> ExecutionPlan {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut index_of: HashMap<String, NodeIndex> = HashMap::new();
    for node in nodes {
        let idx = graph.add_node(node.id.clone());
        index_of.insert(node.id.clone(), idx);
    }

    for edge in edges {
        if edge.confidence < MIN_EDGE_CONFIDENCE {
            continue;
        }
        if let (Some(&src), Some(&dst)) = (index_of.get(&edge.source), index_of.get(&edge.target)) {
            graph.add_edge(src, dst, ());
        }
    }

    let (order, cycle_detected) = match toposort(&graph, None) {
        Ok(sorted) => (sorted.into_iter().map(|idx| graph[idx].clone()).collect(), false),
        Err(_) => (heuristic_order(nodes, registry), true),
    };

    let order_violations = if cycle_detected {
        violations(&order, edges)
    } else {
        Vec::new()
    };

    ExecutionPlan {
        order,
        cycle_detected,
        order_violations,
    }
}

/// §4.5 step 4: category priority, then in-degree/out-degree, then id.
fn heuristic_order(nodes: &[NodeSpec], registry: &ToolRegistry) -> Vec<String> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut out_degree: HashMap<&str, usize> = HashMap::new();
    for node in nodes {
        in_degree.entry(node.id.as_str()).or_insert(0);
        out_degree.entry(node.id.as_str()).or_insert(0);
    }

    let mut ranked: Vec<(u8, i64, usize, &str)> = nodes
        .iter()
        .map(|n| {
            let category = registry
                .get(&n.tool_type)
                .map(|d| d.category)
                .unwrap_or(ToolCategory::Other);
            let base = category_priority(category);
            let ind = *in_degree.get(n.id.as_str()).unwrap_or(&0) as i64;
            let outd = *out_degree.get(n.id.as_str()).unwrap_or(&0);
            (base, -ind, outd, n.id.as_str())
        })
        .collect();

    ranked.sort();
    ranked.into_iter().map(|(_, _, _, id)| id.to_string()).collect()
}

fn violations(order: &[String], edges: &[DependencyEdge]) -> Vec<(String, String)> {
    let position: HashMap<&str, usize> = order.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
    edges
        .iter()
        .filter_map(|e| {
            let src = position.get(e.source.as_str())?;
            let dst = position.get(e.target.as_str())?;
            if src >= dst {
                Some((e.source.clone(), e.target.clone()))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dependency::EdgeKind;

    fn node(id: &str, tool_type: &str) -> NodeSpec {
        NodeSpec {
            id: id.to_string(),
            tool_type: tool_type.to_string(),
            params: serde_json::Map::new(),
            output: None,
        }
    }

    fn edge(source: &str, target: &str, confidence: f64) -> DependencyEdge {
        DependencyEdge {
            source: source.to_string(),
            target: target.to_string(),
            confidence,
            kind: EdgeKind::PlaceholderReference,
            evidence: vec![],
        }
    }

    #[test]
    fn linear_chain_is_ordered_correctly() {
        let registry = ToolRegistry::with_demo_tools();
        let nodes = vec![node("a", "search"), node("b", "report_generator"), node("c", "file_writer")];
        let edges = vec![edge("a", "b", 0.9), edge("b", "c", 0.9)];
        let plan = build_order(&nodes, &edges, &registry);
        assert!(!plan.cycle_detected);
        assert_eq!(plan.order, vec!["a", "b", "c"]);
    }

    #[test]
    fn cycle_falls_back_to_heuristic_order_without_panicking() {
        let registry = ToolRegistry::with_demo_tools();
        let nodes = vec![node("x", "search"), node("y", "report_generator")];
        let edges = vec![edge("x", "y", 0.9), edge("y", "x", 0.9)];
        let plan = build_order(&nodes, &edges, &registry);
        assert!(plan.cycle_detected);
        assert_eq!(plan.order.len(), 2);
        assert!(plan.order.contains(&"x".to_string()));
        assert!(plan.order.contains(&"y".to_string()));
        // data_source (x) outranks data_processor (y) on category priority
        assert_eq!(plan.order[0], "x");
    }

    #[test]
    fn every_node_appears_exactly_once_even_with_gaps() {
        let registry = ToolRegistry::with_demo_tools();
        let nodes = vec![node("a", "search"), node("b", "report_generator"), node("c", "file_writer")];
        let edges = vec![edge("a", "b", 0.9)];
        let plan = build_order(&nodes, &edges, &registry);
        assert_eq!(plan.order.len(), 3);
        let mut sorted = plan.order.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "c"]);
    }
}
