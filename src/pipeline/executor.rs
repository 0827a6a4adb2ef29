// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Pipeline Executor (C8)
//!
//! Drives the ordered nodes: resolves placeholders (C3), adapts params
//! (C6), invokes the tool (C1), classifies tool failures (C11), and emits
//! the event stream (C9) for a request (§4.8).

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::context::RequestContext;
use crate::dependency_issue;
use crate::envelope::{Envelope, EnvelopeStatus};
use crate::errors::{ErrorKind, PipelineError, PipelineResult};
use crate::pipeline::dag::build_order;
use crate::pipeline::dependency::analyze;
use crate::pipeline::output_adapter::OutputAdapter;
use crate::pipeline::param_adapter;
use crate::pipeline::placeholder::{resolve_params, NodeOutputRecord};
use crate::pipeline::spec::PipelineSpec;
use crate::pipeline::validation;
use crate::registry::ToolRegistry;

/// A truncated, human-scannable record of what one node produced.
#[derive(Debug, Clone)]
pub struct NodeSummary {
    pub node_id: String,
    pub tool_type: String,
    pub status: String,
    pub primary_preview: Value,
}

/// Everything the caller needs once a request has produced a terminal event.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub request_id: String,
    pub node_outputs: HashMap<String, NodeOutputRecord>,
    pub summaries: Vec<NodeSummary>,
    pub final_projection: Value,
    pub cycle_warning: bool,
}

/// C8: the pipeline engine's execution loop.
pub struct PipelineExecutor {
    registry: Arc<ToolRegistry>,
    adapter: Arc<OutputAdapter>,
}

enum NodeOutcome {
    Envelope(Envelope),
    Timeout,
    Cancelled,
}

impl PipelineExecutor {
    pub fn new(registry: Arc<ToolRegistry>, adapter: Arc<OutputAdapter>) -> Self {
        Self { registry, adapter }
    }

    /// Run `spec` to completion (or to its first terminal failure),
    /// emitting the event stream on `ctx.sink` as it goes (§4.8).
    pub async fn execute(&self, spec: &PipelineSpec, ctx: &RequestContext) -> PipelineResult<PipelineOutcome> {
        let warnings = validation::validate(spec, &self.registry)?;
        for message in warnings.messages {
            ctx.sink.emit(crate::events::EventType::Status, "pipeline", message, None).await;
        }

        if spec.components.is_empty() {
            ctx.sink.terminal_result(serde_json::json!({"summaries": []})).await;
            return Ok(PipelineOutcome {
                request_id: ctx.request_id.clone(),
                node_outputs: HashMap::new(),
                summaries: Vec::new(),
                final_projection: Value::Null,
                cycle_warning: false,
            });
        }

        let edges = analyze(&spec.components, &self.registry);
        let plan = build_order(&spec.components, &edges, &self.registry);
        if plan.cycle_detected {
            warn!(order = ?plan.order, violations = ?plan.order_violations, "dependency cycle detected; proceeding with heuristic order");
            ctx.sink
                .emit(
                    crate::events::EventType::Status,
                    "pipeline",
                    "cycle detected among node dependencies; using heuristic execution order".to_string(),
                    Some(serde_json::json!({"order": plan.order})),
                )
                .await;
        }

        let mut node_outputs: HashMap<String, NodeOutputRecord> = HashMap::new();
        let mut summaries = Vec::new();
        let temp_dir = std::env::temp_dir();
        let pipeline_deadline = tokio::time::Instant::now() + ctx.pipeline_timeout;

        for node_id in &plan.order {
            if ctx.is_cancelled() {
                ctx.sink.terminal_error(ErrorKind::Cancelled, "pipeline cancelled", Some(node_id)).await;
                return Err(PipelineError::Cancelled);
            }

            if tokio::time::Instant::now() >= pipeline_deadline {
                ctx.sink
                    .terminal_error(ErrorKind::Timeout, format!("pipeline timed out before node '{}'", node_id), Some(node_id))
                    .await;
                return Err(PipelineError::Timeout {
                    node: node_id.clone(),
                    seconds: ctx.pipeline_timeout.as_secs(),
                });
            }

            let node = spec
                .node(node_id)
                .expect("execution order only ever contains ids present in the spec");

            ctx.sink.tool_start(&node.id, &node.tool_type).await;
            info!(node = %node.id, tool = %node.tool_type, "executing node");

            let (resolved, misses) = resolve_params(&node.params, &node_outputs, Some(self.adapter.as_ref()));
            for miss in &misses {
                debug!(node = %node.id, token = %miss.token, reason = %miss.reason, "unresolved placeholder");
            }

            let expected_types = self
                .registry
                .get(&node.tool_type)
                .map(|d| d.input_schema.clone())
                .unwrap_or_default();
            let (adapted_params, logs) = param_adapter::adapt_params(resolved, &expected_types, &temp_dir);
            for log in &logs {
                debug!(node = %node.id, param = %log.param_name, from = ?log.from, to = ?log.to, "adapted parameter");
            }

            let outcome = match tokio::time::timeout_at(
                pipeline_deadline,
                invoke_with_heartbeat(&self.registry, ctx, &node.id, &node.tool_type, &adapted_params),
            )
            .await
            {
                Ok(outcome) => outcome,
                Err(_elapsed) => {
                    ctx.sink
                        .terminal_error(ErrorKind::Timeout, format!("pipeline timed out while running node '{}'", node.id), Some(&node.id))
                        .await;
                    return Err(PipelineError::Timeout {
                        node: node.id.clone(),
                        seconds: ctx.pipeline_timeout.as_secs(),
                    });
                }
            };

            let envelope = match outcome {
                NodeOutcome::Envelope(env) => env,
                NodeOutcome::Timeout => {
                    ctx.sink
                        .terminal_error(ErrorKind::Timeout, format!("node '{}' timed out", node.id), Some(&node.id))
                        .await;
                    return Err(PipelineError::Timeout {
                        node: node.id.clone(),
                        seconds: ctx.tool_timeout.as_secs(),
                    });
                }
                NodeOutcome::Cancelled => {
                    ctx.sink.terminal_error(ErrorKind::Cancelled, "pipeline cancelled", Some(&node.id)).await;
                    return Err(PipelineError::Cancelled);
                }
            };

            if envelope.status == EnvelopeStatus::Error {
                let mut help = None;
                if let Some(detail) = &envelope.error {
                    if let Some(issue) = dependency_issue::classify(detail) {
                        ctx.sink
                            .dependency_issue(&node.id, serde_json::to_value(&issue).unwrap_or(Value::Null))
                            .await;
                        help = Some(issue.suggested_solutions.join("; "));
                    }
                }
                ctx.sink
                    .terminal_error(ErrorKind::ToolError, envelope.message.clone(), Some(&node.id))
                    .await;
                return Err(PipelineError::ToolExecutionFailed {
                    node: node.id.clone(),
                    tool: node.tool_type.clone(),
                    message: envelope.message.clone(),
                    help,
                });
            }

            let preview = truncated_preview(&envelope.primary_projection());
            let status = status_str(&envelope.status);
            ctx.sink
                .tool_result(&node.id, status, serde_json::json!({"preview": preview}))
                .await;

            summaries.push(NodeSummary {
                node_id: node.id.clone(),
                tool_type: node.tool_type.clone(),
                status: status.to_string(),
                primary_preview: preview,
            });

            node_outputs.insert(node.id.clone(), NodeOutputRecord::from_envelope(&node.id, &envelope));
        }

        let final_projection = plan
            .order
            .last()
            .and_then(|id| node_outputs.get(id))
            .map(|record| record.primary_projection())
            .unwrap_or(Value::Null);

        ctx.sink
            .terminal_result(serde_json::json!({
                "final": final_projection,
                "summaries": summaries.iter().map(|s| serde_json::json!({
                    "node_id": s.node_id,
                    "tool_type": s.tool_type,
                    "status": s.status,
                })).collect::<Vec<_>>(),
            }))
            .await;

        Ok(PipelineOutcome {
            request_id: ctx.request_id.clone(),
            node_outputs,
            summaries,
            final_projection,
            cycle_warning: plan.cycle_detected,
        })
    }
}

/// Invoke a tool while emitting heartbeats at the request's configured
/// interval and racing the request's cancellation token and tool timeout
/// (§4.8 step 4, §5 cancellation/backpressure).
async fn invoke_with_heartbeat(
    registry: &ToolRegistry,
    ctx: &RequestContext,
    node_id: &str,
    tool_type: &str,
    params: &Map<String, Value>,
) -> NodeOutcome {
    let invoke_fut = registry.invoke(tool_type, params);
    tokio::pin!(invoke_fut);

    let mut ticker = tokio::time::interval(ctx.heartbeat_interval);
    ticker.tick().await; // first tick fires immediately; consume it

    let deadline = tokio::time::sleep(ctx.tool_timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            envelope = &mut invoke_fut => return NodeOutcome::Envelope(envelope),
            _ = ctx.cancellation.cancelled() => return NodeOutcome::Cancelled,
            _ = &mut deadline => return NodeOutcome::Timeout,
            _ = ticker.tick() => {
                ctx.sink.heartbeat(node_id).await;
            }
        }
    }
}

fn truncated_preview(value: &Value) -> Value {
    const MAX_STRING: usize = 200;
    const MAX_ITEMS: usize = 5;
    match value {
        Value::String(s) if s.chars().count() > MAX_STRING => {
            let truncated: String = s.chars().take(MAX_STRING).collect();
            Value::String(format!("{}...", truncated))
        }
        Value::Array(items) if items.len() > MAX_ITEMS => Value::Array(items[..MAX_ITEMS].to_vec()),
        other => other.clone(),
    }
}

fn status_str(status: &EnvelopeStatus) -> &'static str {
    match status {
        EnvelopeStatus::Success => "success",
        EnvelopeStatus::PartialSuccess => "partial_success",
        EnvelopeStatus::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::AdapterCache;
    use crate::config::EngineConfig;
    use crate::pipeline::spec::NodeSpec;
    use serde_json::json;

    fn executor() -> PipelineExecutor {
        let registry = Arc::new(ToolRegistry::with_demo_tools());
        let cache = Arc::new(AdapterCache::new(64));
        let adapter = Arc::new(OutputAdapter::new(cache, std::env::temp_dir()));
        PipelineExecutor::new(registry, adapter)
    }

    fn node(id: &str, tool_type: &str, params: Map<String, Value>) -> NodeSpec {
        NodeSpec {
            id: id.to_string(),
            tool_type: tool_type.to_string(),
            params,
            output: None,
        }
    }

    #[tokio::test]
    async fn empty_pipeline_completes_immediately() {
        let exec = executor();
        let config = EngineConfig::default();
        let (ctx, mut rx) = RequestContext::new(&config);
        let spec = PipelineSpec {
            pipeline_id: "p".into(),
            components: vec![],
        };
        let outcome = exec.execute(&spec, &ctx).await.unwrap();
        assert!(outcome.summaries.is_empty());
        let mut saw_result = false;
        while let Ok(event) = rx.try_recv() {
            if event.event_type == crate::events::EventType::Result {
                saw_result = true;
            }
        }
        assert!(saw_result);
    }

    #[tokio::test]
    async fn linear_chain_executes_in_order_and_succeeds() {
        let exec = executor();
        let config = EngineConfig::default();
        let (ctx, _rx) = RequestContext::new(&config);

        let mut search_params = Map::new();
        search_params.insert("query".to_string(), json!("rust"));

        let mut report_params = Map::new();
        report_params.insert("title".to_string(), json!("Report"));
        report_params.insert("data".to_string(), json!("$a.output.data.primary"));

        let spec = PipelineSpec {
            pipeline_id: "p".into(),
            components: vec![
                node("a", "search", search_params),
                node("b", "report_generator", report_params),
            ],
        };

        let outcome = exec.execute(&spec, &ctx).await.unwrap();
        assert_eq!(outcome.summaries.len(), 2);
        assert_eq!(outcome.summaries[0].node_id, "a");
        assert_eq!(outcome.summaries[1].node_id, "b");
        assert!(outcome.summaries.iter().all(|s| s.status == "success"));
    }

    #[tokio::test]
    async fn missing_required_param_fails_the_node_and_halts() {
        let exec = executor();
        let config = EngineConfig::default();
        let (ctx, _rx) = RequestContext::new(&config);
        let spec = PipelineSpec {
            pipeline_id: "p".into(),
            components: vec![node("a", "search", Map::new())],
        };
        let result = exec.execute(&spec, &ctx).await;
        assert!(matches!(result, Err(PipelineError::ToolExecutionFailed { .. })));
    }

    #[tokio::test]
    async fn cancellation_before_a_node_halts_the_pipeline() {
        let exec = executor();
        let config = EngineConfig::default();
        let (ctx, _rx) = RequestContext::new(&config);
        ctx.cancel();
        let spec = PipelineSpec {
            pipeline_id: "p".into(),
            components: vec![node("a", "search", Map::new())],
        };
        let result = exec.execute(&spec, &ctx).await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[tokio::test]
    async fn expired_pipeline_timeout_halts_before_the_next_node() {
        let exec = executor();
        let config = EngineConfig::default();
        let (ctx, _rx) = RequestContext::new(&config);
        let ctx = ctx.with_pipeline_timeout(Duration::from_nanos(1));
        tokio::time::sleep(Duration::from_millis(5)).await;

        let mut search_params = Map::new();
        search_params.insert("query".to_string(), json!("rust"));
        let spec = PipelineSpec {
            pipeline_id: "p".into(),
            components: vec![node("a", "search", search_params)],
        };
        let result = exec.execute(&spec, &ctx).await;
        assert!(matches!(result, Err(PipelineError::Timeout { .. })));
    }
}
