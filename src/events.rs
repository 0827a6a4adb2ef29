// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Event Stream (C9)
//!
//! The uniform progress-event schema consumed by transport layers (§4.9,
//! §6). Ordered, append-only, single producer per request; exactly one
//! terminal event closes the stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;

/// Kind of progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Progress,
    Status,
    ToolStart,
    ToolResult,
    Partial,
    Heartbeat,
    Result,
    Error,
}

impl EventType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result | Self::Error)
    }
}

/// One JSON object the engine emits per progress tick (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub step: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: f64,
    pub request_id: String,
}

/// Format one event as a Server-Sent-Events frame.
pub fn to_sse(event: &Event) -> String {
    format!(
        "event: {}\ndata: {}\n\n",
        serde_json::to_string(&event.event_type).unwrap_or_default().trim_matches('"'),
        serde_json::to_string(event).unwrap_or_default()
    )
}

/// Format one event as a newline-delimited-JSON line.
pub fn to_ndjson(event: &Event) -> String {
    format!("{}\n", serde_json::to_string(event).unwrap_or_default())
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// The single-producer-per-request side of the event channel. Enforces
/// timestamp monotonicity and the "exactly one terminal event" rule so
/// executor bugs can't violate §4.9/§8 by construction.
pub struct EventSink {
    sender: mpsc::Sender<Event>,
    request_id: String,
    last_timestamp: Mutex<f64>,
    closed: AtomicBool,
}

impl EventSink {
    pub fn new(request_id: impl Into<String>) -> (Self, mpsc::Receiver<Event>) {
        let (sender, receiver) = mpsc::channel(256);
        (
            Self {
                sender,
                request_id: request_id.into(),
                last_timestamp: Mutex::new(0.0),
                closed: AtomicBool::new(false),
            },
            receiver,
        )
    }

    fn next_timestamp(&self) -> f64 {
        let mut last = self.last_timestamp.lock().unwrap();
        let now = now_secs().max(*last + f64::EPSILON);
        *last = now;
        now
    }

    /// Emit a non-terminal event. Silently drops heartbeats/partials if the
    /// stream already closed (backpressure policy, §5); any other call
    /// after closure is a logic error and panics loudly in debug builds.
    pub async fn emit(&self, event_type: EventType, step: impl Into<String>, message: impl Into<String>, data: Option<Value>) {
        debug_assert!(
            !self.closed.load(Ordering::SeqCst) || matches!(event_type, EventType::Heartbeat | EventType::Partial),
            "event emitted after the terminal event closed the stream"
        );
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let event = Event {
            event_type,
            step: step.into(),
            message: message.into(),
            data,
            timestamp: self.next_timestamp(),
            request_id: self.request_id.clone(),
        };
        let is_terminal = event.event_type.is_terminal();
        if self.sender.send(event).await.is_ok() && is_terminal {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    pub async fn tool_start(&self, node_id: &str, tool_type: &str) {
        self.emit(
            EventType::ToolStart,
            node_id,
            format!("starting '{}'", tool_type),
            Some(serde_json::json!({"node_id": node_id, "tool_type": tool_type})),
        )
        .await;
    }

    pub async fn tool_result(&self, node_id: &str, status: &str, summary: Value) {
        self.emit(
            EventType::ToolResult,
            node_id,
            format!("'{}' finished: {}", node_id, status),
            Some(summary),
        )
        .await;
    }

    pub async fn heartbeat(&self, node_id: &str) {
        self.emit(EventType::Heartbeat, node_id, "still running".to_string(), None).await;
    }

    pub async fn dependency_issue(&self, node_id: &str, issue: Value) {
        self.emit(EventType::Status, node_id, "dependency issue classified".to_string(), Some(issue))
            .await;
    }

    pub async fn terminal_result(&self, summary: Value) {
        self.emit(EventType::Result, "pipeline", "pipeline completed".to_string(), Some(summary))
            .await;
    }

    pub async fn terminal_error(&self, kind: crate::errors::ErrorKind, message: impl Into<String>, failing_node: Option<&str>) {
        let data = serde_json::json!({
            "kind": kind,
            "failing_node": failing_node,
        });
        self.emit(EventType::Error, failing_node.unwrap_or("pipeline"), message.into(), Some(data))
            .await;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timestamps_are_monotonic_and_stream_closes_once() {
        let (sink, mut rx) = EventSink::new("req-1");
        sink.tool_start("a", "search").await;
        sink.heartbeat("a").await;
        sink.terminal_result(serde_json::json!({"ok": true})).await;
        sink.terminal_error(crate::errors::ErrorKind::Internal, "should be dropped", None).await;

        let mut events = Vec::new();
        while let Ok(e) = rx.try_recv() {
            events.push(e);
        }

        assert_eq!(events.len(), 3, "the post-terminal error must not be emitted");
        let mut last_ts = 0.0;
        for e in &events {
            assert!(e.timestamp >= last_ts);
            last_ts = e.timestamp;
        }
        assert_eq!(events.last().unwrap().event_type, EventType::Result);
        assert!(sink.is_closed());
    }

    #[test]
    fn sse_framing_includes_event_and_data_lines() {
        let event = Event {
            event_type: EventType::Heartbeat,
            step: "a".into(),
            message: "still running".into(),
            data: None,
            timestamp: 1.0,
            request_id: "r".into(),
        };
        let frame = to_sse(&event);
        assert!(frame.starts_with("event: heartbeat\n"));
        assert!(frame.contains("data: "));
        assert!(frame.ends_with("\n\n"));
    }

    #[test]
    fn ndjson_is_one_line_per_event() {
        let event = Event {
            event_type: EventType::Progress,
            step: "a".into(),
            message: "m".into(),
            data: None,
            timestamp: 1.0,
            request_id: "r".into(),
        };
        let line = to_ndjson(&event);
        assert_eq!(line.matches('\n').count(), 1);
    }
}
