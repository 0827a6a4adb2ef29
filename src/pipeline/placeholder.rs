// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Placeholder Resolver (C3)
//!
//! Substitutes `$node.output[.key.path]` tokens in a node's params with
//! values read from prior nodes' envelopes (§4.3). Never hard-fails: a
//! miss is recorded and the raw token is left in place so the consumer
//! decides what to do with it.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::envelope::Envelope;

/// `$node_id.output(.key.path)?`
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\.output(?:\.([A-Za-z_][A-Za-z0-9_.]*))?").unwrap()
});

/// Keys emitted by older tool conventions, mapped onto the envelope path
/// that now carries the same data (§4.3 step 2c, §9 "centralize in one
/// configuration table").
fn legacy_field_map(key: &str) -> Option<&'static str> {
    match key {
        "results" => Some("data.primary"),
        "rotated_images" => Some("data.primary"),
        "paths" => Some("paths"),
        "content" => Some("data.primary"),
        _ => None,
    }
}

/// A node's recorded result, kept by the executor until the request ends.
#[derive(Debug, Clone)]
pub struct NodeOutputRecord {
    pub node_id: String,
    pub output_type: Option<String>,
    pub output_key: Option<String>,
    /// The full envelope, as a JSON value, so dotted-path lookups (`data.primary`,
    /// `paths`, ...) resolve uniformly.
    pub value: Value,
    pub description: String,
}

impl NodeOutputRecord {
    pub fn from_envelope(node_id: impl Into<String>, envelope: &Envelope) -> Self {
        let value = serde_json::to_value(envelope).unwrap_or(Value::Null);
        Self {
            node_id: node_id.into(),
            output_type: None,
            output_key: None,
            description: envelope.message.clone(),
            value,
        }
    }

    /// §9's resolved primary-projection rule: `data.primary` if non-null,
    /// else the first populated key of a fixed priority list, else the
    /// whole value.
    pub fn primary_projection(&self) -> Value {
        if let Some(primary) = self.value.pointer("/data/primary") {
            if !primary.is_null() {
                return primary.clone();
            }
        }
        for key in ["primary", "data", "result", "results", "content"] {
            if let Some(v) = self.value.get(key) {
                return v.clone();
            }
            if let Some(v) = self.value.pointer(&format!("/data/secondary/{}", key)) {
                return v.clone();
            }
        }
        self.value.clone()
    }
}

/// Synthesizes a value for a key a producer never supplied. Implemented by
/// the Tool-Output Adapter (C7); kept as a trait here so this module has no
/// dependency on C7's internals.
pub trait MissingKeyAdapter {
    fn adapt(&self, producer: &Value, key_path: &str) -> Option<Value>;
}

/// A placeholder that could not be fully resolved.
#[derive(Debug, Clone)]
pub struct ResolutionMiss {
    pub token: String,
    pub node_id: String,
    pub key_path: Option<String>,
    pub reason: String,
}

/// Resolve every placeholder token in `params`, recursing into nested maps
/// and lists. Returns the substituted tree plus any misses encountered.
pub fn resolve_params(
    params: &Map<String, Value>,
    outputs: &HashMap<String, NodeOutputRecord>,
    adapter: Option<&dyn MissingKeyAdapter>,
) -> (Map<String, Value>, Vec<ResolutionMiss>) {
    let mut misses = Vec::new();
    let mut resolved = Map::new();
    for (key, value) in params {
        resolved.insert(key.clone(), resolve_value(value, outputs, adapter, &mut misses));
    }
    (resolved, misses)
}

fn resolve_value(
    value: &Value,
    outputs: &HashMap<String, NodeOutputRecord>,
    adapter: Option<&dyn MissingKeyAdapter>,
    misses: &mut Vec<ResolutionMiss>,
) -> Value {
    match value {
        Value::String(s) => resolve_string(s, outputs, adapter, misses),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| resolve_value(v, outputs, adapter, misses))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k.clone(), resolve_value(v, outputs, adapter, misses));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn resolve_string(
    s: &str,
    outputs: &HashMap<String, NodeOutputRecord>,
    adapter: Option<&dyn MissingKeyAdapter>,
    misses: &mut Vec<ResolutionMiss>,
) -> Value {
    let is_whole_token = PLACEHOLDER_RE
        .find(s)
        .map(|m| m.start() == 0 && m.end() == s.len())
        .unwrap_or(false);

    if is_whole_token {
        let caps = PLACEHOLDER_RE.captures(s).unwrap();
        return substitute_token(&caps, outputs, adapter, misses);
    }

    if !PLACEHOLDER_RE.is_match(s) {
        return Value::String(s.to_string());
    }

    let mut out = String::new();
    let mut last = 0;
    for caps in PLACEHOLDER_RE.captures_iter(s) {
        let m = caps.get(0).unwrap();
        out.push_str(&s[last..m.start()]);
        let substituted = substitute_token(&caps, outputs, adapter, misses);
        out.push_str(&stringify(&substituted));
        last = m.end();
    }
    out.push_str(&s[last..]);
    Value::String(out)
}

fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn substitute_token(
    caps: &Captures,
    outputs: &HashMap<String, NodeOutputRecord>,
    adapter: Option<&dyn MissingKeyAdapter>,
    misses: &mut Vec<ResolutionMiss>,
) -> Value {
    let token = caps.get(0).unwrap().as_str().to_string();
    let node_id = caps.get(1).unwrap().as_str();
    let key_path = caps.get(2).map(|m| m.as_str().to_string());

    let Some(record) = outputs.get(node_id) else {
        misses.push(ResolutionMiss {
            token: token.clone(),
            node_id: node_id.to_string(),
            key_path: key_path.clone(),
            reason: format!("no prior node named '{}'", node_id),
        });
        return Value::String(token);
    };

    let Some(key_path) = key_path else {
        return record.primary_projection();
    };

    if let Some(v) = record.value.pointer(&to_pointer(&key_path)) {
        if !v.is_null() {
            return v.clone();
        }
    }
    if let Some(v) = record
        .value
        .pointer(&to_pointer(&format!("data.{}", key_path)))
    {
        if !v.is_null() {
            return v.clone();
        }
    }
    if let Some(mapped) = legacy_field_map(&key_path) {
        if let Some(v) = record.value.pointer(&to_pointer(mapped)) {
            if !v.is_null() {
                return v.clone();
            }
        }
    }
    if let Some(adapter) = adapter {
        if let Some(v) = adapter.adapt(&record.value, &key_path) {
            return v;
        }
    }

    misses.push(ResolutionMiss {
        token: token.clone(),
        node_id: node_id.to_string(),
        key_path: Some(key_path.clone()),
        reason: format!("key path '{}' not found on '{}' output", key_path, node_id),
    });
    Value::String(token)
}

fn to_pointer(dotted: &str) -> String {
    format!("/{}", dotted.replace('.', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(node_id: &str, envelope: Envelope) -> NodeOutputRecord {
        NodeOutputRecord::from_envelope(node_id, &envelope)
    }

    #[test]
    fn whole_string_placeholder_preserves_native_type() {
        let env = Envelope::success("search", "ok").primary(json!([1, 2, 3])).build();
        let mut outputs = HashMap::new();
        outputs.insert("a".to_string(), record("a", env));

        let mut params = Map::new();
        params.insert("items".to_string(), json!("$a.output.data.primary"));
        let (resolved, misses) = resolve_params(&params, &outputs, None);
        assert!(misses.is_empty());
        assert_eq!(resolved["items"], json!([1, 2, 3]));
    }

    #[test]
    fn embedded_placeholder_is_stringified() {
        let env = Envelope::success("writer", "ok").path("/tmp/r.md").build();
        let mut outputs = HashMap::new();
        outputs.insert("c".to_string(), record("c", env));

        let mut params = Map::new();
        params.insert(
            "summary".to_string(),
            json!("report at $c.output.paths"),
        );
        let (resolved, misses) = resolve_params(&params, &outputs, None);
        assert!(misses.is_empty());
        assert_eq!(resolved["summary"], json!("report at [\"/tmp/r.md\"]"));
    }

    #[test]
    fn unknown_node_is_a_miss_not_a_panic() {
        let outputs = HashMap::new();
        let mut params = Map::new();
        params.insert("x".to_string(), json!("$missing.output"));
        let (resolved, misses) = resolve_params(&params, &outputs, None);
        assert_eq!(misses.len(), 1);
        assert_eq!(resolved["x"], json!("$missing.output"));
    }

    #[test]
    fn no_placeholders_is_identity() {
        let outputs = HashMap::new();
        let mut params = Map::new();
        params.insert("k".to_string(), json!("literal"));
        params.insert("n".to_string(), json!(5));
        let (resolved, misses) = resolve_params(&params, &outputs, None);
        assert!(misses.is_empty());
        assert_eq!(resolved, params);
    }

    #[test]
    fn recurses_into_nested_maps_and_lists() {
        let env = Envelope::success("search", "ok").primary(json!("hit")).build();
        let mut outputs = HashMap::new();
        outputs.insert("a".to_string(), record("a", env));

        let mut nested = Map::new();
        nested.insert("value".to_string(), json!("$a.output.data.primary"));
        let mut params = Map::new();
        params.insert("list".to_string(), json!(["$a.output.data.primary", "literal"]));
        params.insert("map".to_string(), Value::Object(nested));

        let (resolved, misses) = resolve_params(&params, &outputs, None);
        assert!(misses.is_empty());
        assert_eq!(resolved["list"][0], json!("hit"));
        assert_eq!(resolved["map"]["value"], json!("hit"));
    }

    #[test]
    fn legacy_field_map_resolves_results_alias() {
        let env = Envelope::success("search", "ok").primary(json!(["a", "b"])).build();
        let mut outputs = HashMap::new();
        outputs.insert("a".to_string(), record("a", env));

        let mut params = Map::new();
        params.insert("items".to_string(), json!("$a.output.results"));
        let (resolved, misses) = resolve_params(&params, &outputs, None);
        assert!(misses.is_empty());
        assert_eq!(resolved["items"], json!(["a", "b"]));
    }
}
