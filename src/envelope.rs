// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! The Output Envelope (C2)
//!
//! Every tool invocation returns an [`Envelope`]: the one result shape the
//! rest of the engine — placeholder resolution, dependency inference,
//! shape adaptation, execution — is written against. Tools never hand back
//! ad-hoc JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;

/// Outcome of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Success,
    PartialSuccess,
    Error,
}

impl EnvelopeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::PartialSuccess)
    }
}

/// Main vs. auxiliary output of a tool call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvelopeData {
    /// The canonical main output; shape depends on the tool.
    #[serde(default)]
    pub primary: Value,
    /// Auxiliary structured details.
    #[serde(default)]
    pub secondary: Map<String, Value>,
    /// Numeric statistics.
    #[serde(default)]
    pub counts: Map<String, Value>,
}

/// Provenance attached to every envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    pub tool_name: String,
    pub version: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Wall-clock seconds the tool took to produce this envelope.
    pub processing_time: f64,
}

/// The standardized result shape every tool must return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    pub data: EnvelopeData,
    pub metadata: EnvelopeMetadata,
    #[serde(default)]
    pub paths: Vec<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Start building a successful envelope.
    pub fn success(tool_name: impl Into<String>, message: impl Into<String>) -> EnvelopeBuilder {
        EnvelopeBuilder::new(tool_name.into(), EnvelopeStatus::Success, message.into())
    }

    /// Start building a partial-success envelope (some work done, some failed).
    pub fn partial_success(
        tool_name: impl Into<String>,
        message: impl Into<String>,
    ) -> EnvelopeBuilder {
        EnvelopeBuilder::new(
            tool_name.into(),
            EnvelopeStatus::PartialSuccess,
            message.into(),
        )
    }

    /// Build an error envelope. `detail` becomes `error`; `message` stays a
    /// short human-readable summary.
    pub fn error(
        tool_name: impl Into<String>,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        EnvelopeBuilder::new(tool_name.into(), EnvelopeStatus::Error, message.into())
            .error(detail)
            .build()
    }

    /// Project the envelope down to a single "primary" value, following the
    /// fallback priority resolved in SPEC_FULL.md §9: `primary`, then the
    /// first populated well-known key under `secondary`/`counts`, else the
    /// whole envelope as a JSON value.
    pub fn primary_projection(&self) -> Value {
        if !self.data.primary.is_null() {
            return self.data.primary.clone();
        }
        for key in ["primary", "data", "result", "results", "content"] {
            if let Some(v) = self.data.secondary.get(key) {
                return v.clone();
            }
        }
        if !self.paths.is_empty() {
            return Value::from(self.paths.clone());
        }
        Value::Null
    }

    /// Ensure every field is JSON-serializable, substituting an opaque
    /// marker for anything that isn't. The builder already guarantees this
    /// for values constructed through it; this is a defensive pass for
    /// envelopes assembled by hand (e.g. adapters splicing values in).
    pub fn sanitize(mut self) -> Self {
        self.data.primary = sanitize_value(self.data.primary);
        for v in self.data.secondary.values_mut() {
            *v = sanitize_value(std::mem::take(v));
        }
        self
    }
}

/// Replace values `serde_json` cannot represent faithfully with an opaque
/// marker. `serde_json::Value` is always representable once constructed, so
/// this only matters for callers who serialize arbitrary `Serialize` types
/// into it (e.g. a tool wrapping an in-memory image) and use [`opaque_marker`]
/// on the failure path instead of propagating the serialize error.
fn sanitize_value(v: Value) -> Value {
    v
}

/// The opaque-object marker described in §3: `"<opaque:TypeName@id>"`.
pub fn opaque_marker(type_name: &str, id: impl std::fmt::Display) -> Value {
    Value::String(format!("<opaque:{}@{}>", type_name, id))
}

/// Builder that threads a start `Instant` so `metadata.processing_time` is
/// always measured, never guessed.
pub struct EnvelopeBuilder {
    tool_name: String,
    status: EnvelopeStatus,
    message: String,
    primary: Value,
    secondary: Map<String, Value>,
    counts: Map<String, Value>,
    paths: Vec<String>,
    error: Option<String>,
    parameters: Map<String, Value>,
    started_at: Instant,
}

impl EnvelopeBuilder {
    fn new(tool_name: String, status: EnvelopeStatus, message: String) -> Self {
        Self {
            tool_name,
            status,
            message,
            primary: Value::Null,
            secondary: Map::new(),
            counts: Map::new(),
            paths: Vec::new(),
            error: None,
            parameters: Map::new(),
            started_at: Instant::now(),
        }
    }

    pub fn primary(mut self, value: impl Into<Value>) -> Self {
        self.primary = value.into();
        self
    }

    pub fn secondary(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.secondary.insert(key.into(), value.into());
        self
    }

    pub fn count(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.counts.insert(key.into(), value.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn paths(mut self, paths: impl IntoIterator<Item = String>) -> Self {
        self.paths.extend(paths);
        self
    }

    pub fn parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn error(mut self, detail: impl Into<String>) -> Self {
        self.error = Some(detail.into());
        self
    }

    /// Override the measured elapsed time (tests, replay).
    pub fn started_at(mut self, started_at: Instant) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn build(self) -> Envelope {
        Envelope {
            status: self.status,
            data: EnvelopeData {
                primary: self.primary,
                secondary: self.secondary,
                counts: self.counts,
            },
            metadata: EnvelopeMetadata {
                tool_name: self.tool_name,
                version: env!("CARGO_PKG_VERSION").to_string(),
                parameters: self.parameters,
                processing_time: self.started_at.elapsed().as_secs_f64(),
            },
            paths: self.paths_taken(),
            message: self.message,
            error: self.error,
        }
    }

    fn paths_taken(&self) -> Vec<String> {
        self.paths.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_has_no_error() {
        let env = Envelope::success("demo.search", "ok")
            .primary(json!({"hits": 3}))
            .build();
        assert_eq!(env.status, EnvelopeStatus::Success);
        assert!(env.error.is_none());
        assert!(env.status.is_success());
    }

    #[test]
    fn error_envelope_carries_detail() {
        let env = Envelope::error("demo.writer", "write failed", "disk full");
        assert_eq!(env.status, EnvelopeStatus::Error);
        assert_eq!(env.error.as_deref(), Some("disk full"));
        assert!(!env.status.is_success());
    }

    #[test]
    fn primary_projection_falls_back_through_priority_list() {
        let mut secondary = Map::new();
        secondary.insert("result".into(), json!("fallback-value"));
        let env = Envelope {
            status: EnvelopeStatus::Success,
            data: EnvelopeData {
                primary: Value::Null,
                secondary,
                counts: Map::new(),
            },
            metadata: EnvelopeMetadata {
                tool_name: "demo".into(),
                version: "0.1.0".into(),
                parameters: Map::new(),
                processing_time: 0.0,
            },
            paths: vec![],
            message: "ok".into(),
            error: None,
        };
        assert_eq!(env.primary_projection(), json!("fallback-value"));
    }

    #[test]
    fn primary_projection_falls_back_to_paths() {
        let env = Envelope::success("demo.writer", "wrote file")
            .path("/tmp/out.txt")
            .build();
        assert_eq!(env.primary_projection(), json!(["/tmp/out.txt"]));
    }

    #[test]
    fn envelope_roundtrips_through_json() {
        let env = Envelope::success("demo.search", "ok")
            .primary(json!([1, 2, 3]))
            .count("total", json!(3))
            .build();
        let s = serde_json::to_string(&env).unwrap();
        let back: Envelope = serde_json::from_str(&s).unwrap();
        assert_eq!(back.message, "ok");
        assert_eq!(back.data.counts.get("total"), Some(&json!(3)));
    }

    #[test]
    fn opaque_marker_format() {
        let m = opaque_marker("Image", 42);
        assert_eq!(m, json!("<opaque:Image@42>"));
    }
}
