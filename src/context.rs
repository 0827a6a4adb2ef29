// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Session/Request Context (C12)
//!
//! Opaque value threaded through the engine for one request: identifier,
//! cancellation token, event sink, and per-request timeout overrides. No
//! global state (§4.12, §9 "global singletons... replace with
//! constructor-injected dependencies").

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::events::{Event, EventSink};

/// Per-request state: no process-wide singletons, everything is
/// constructed and handed to the executor explicitly.
pub struct RequestContext {
    pub request_id: String,
    pub cancellation: CancellationToken,
    pub sink: Arc<EventSink>,
    pub tool_timeout: Duration,
    pub pipeline_timeout: Duration,
    pub heartbeat_interval: Duration,
}

impl RequestContext {
    /// Build a fresh context from engine defaults, returning the receiving
    /// end of its event channel for the caller to drain.
    pub fn new(config: &EngineConfig) -> (Self, tokio::sync::mpsc::Receiver<Event>) {
        let request_id = Uuid::new_v4().to_string();
        let (sink, receiver) = EventSink::new(request_id.clone());
        (
            Self {
                request_id,
                cancellation: CancellationToken::new(),
                sink: Arc::new(sink),
                tool_timeout: config.tool_timeout,
                pipeline_timeout: config.pipeline_timeout,
                heartbeat_interval: config.heartbeat_interval,
            },
            receiver,
        )
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_pipeline_timeout(mut self, timeout: Duration) -> Self {
        self.pipeline_timeout = timeout;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// A child token that is cancelled whenever the request is, for
    /// per-node scoping without letting a node cancel its siblings.
    pub fn child_token(&self) -> CancellationToken {
        self.cancellation.child_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_has_a_unique_request_id() {
        let config = EngineConfig::default();
        let (ctx_a, _rx_a) = RequestContext::new(&config);
        let (ctx_b, _rx_b) = RequestContext::new(&config);
        assert_ne!(ctx_a.request_id, ctx_b.request_id);
    }

    #[test]
    fn cancellation_propagates_to_child_tokens() {
        let config = EngineConfig::default();
        let (ctx, _rx) = RequestContext::new(&config);
        let child = ctx.child_token();
        assert!(!child.is_cancelled());
        ctx.cancel();
        assert!(child.is_cancelled());
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn overrides_replace_config_defaults() {
        let config = EngineConfig::default();
        let (ctx, _rx) = RequestContext::new(&config);
        let ctx = ctx.with_tool_timeout(Duration::from_secs(1));
        assert_eq!(ctx.tool_timeout, Duration::from_secs(1));
    }
}
