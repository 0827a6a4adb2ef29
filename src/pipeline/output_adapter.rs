// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Tool-Output Adapter (C7)
//!
//! Runs when the executor discovers that a consumer needs an envelope key
//! the producer never supplied. Analyzes the shape mismatch, picks a
//! mapping from a fixed coercion catalogue, and synthesizes a value —
//! never runtime-generated code, just a typed dispatch table (§4.7, §9).

use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::AdapterCache;
use crate::pipeline::placeholder::MissingKeyAdapter;
use crate::registry::SemanticType;

/// The fixed coercion catalogue (§4.7 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coercion {
    Identity,
    ListToArray,
    ArrayToList,
    StringToNumber,
    NumberToString,
    DictToList,
    ListToDict,
    FlattenList,
    WrapSingle,
    UnwrapSingle,
}

impl Coercion {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::ListToArray => "list_to_array",
            Self::ArrayToList => "array_to_list",
            Self::StringToNumber => "string_to_number",
            Self::NumberToString => "number_to_string",
            Self::DictToList => "dict_to_list",
            Self::ListToDict => "list_to_dict",
            Self::FlattenList => "flatten_list",
            Self::WrapSingle => "wrap_single",
            Self::UnwrapSingle => "unwrap_single",
        }
    }

    pub fn apply(&self, value: &Value) -> Option<Value> {
        match self {
            Self::Identity => Some(value.clone()),
            Self::ListToArray | Self::ArrayToList => match value {
                Value::Array(_) => Some(value.clone()),
                _ => None,
            },
            Self::StringToNumber => value.as_str().and_then(|s| s.trim().parse::<f64>().ok()).map(|n| {
                serde_json::Number::from_f64(n)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }),
            Self::NumberToString => value.as_f64().map(|n| Value::String(n.to_string())),
            Self::DictToList => value
                .as_object()
                .map(|m| Value::Array(m.values().cloned().collect())),
            Self::ListToDict => value.as_array().map(|items| {
                let mut map = serde_json::Map::new();
                for (i, item) in items.iter().enumerate() {
                    map.insert(i.to_string(), item.clone());
                }
                Value::Object(map)
            }),
            Self::FlattenList => value.as_array().map(|items| {
                let mut flat = Vec::new();
                flatten_into(items, &mut flat);
                Value::Array(flat)
            }),
            Self::WrapSingle => match value {
                Value::Array(_) => None,
                other => Some(Value::Array(vec![other.clone()])),
            },
            Self::UnwrapSingle => match value.as_array() {
                Some(items) if items.len() == 1 => Some(items[0].clone()),
                _ => None,
            },
        }
    }
}

fn flatten_into(items: &[Value], out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::Array(nested) => flatten_into(nested, out),
            other => out.push(other.clone()),
        }
    }
}

/// Choose a coercion to reconcile `value`'s actual shape with `expected`.
fn choose_coercion(value: &Value, expected: &SemanticType) -> Coercion {
    match (value, expected) {
        (Value::String(_), SemanticType::Number) => Coercion::StringToNumber,
        (Value::Number(_), SemanticType::String) => Coercion::NumberToString,
        (Value::Object(_), SemanticType::List(_)) => Coercion::DictToList,
        (Value::Array(_), SemanticType::Map) => Coercion::ListToDict,
        (Value::Array(items), SemanticType::List(_)) if items.iter().any(|v| v.is_array()) => {
            Coercion::FlattenList
        }
        (Value::Array(items), expected) if items.len() == 1 && !matches!(expected, SemanticType::List(_)) => {
            Coercion::UnwrapSingle
        }
        (other, SemanticType::List(_)) if !other.is_array() => Coercion::WrapSingle,
        _ => Coercion::Identity,
    }
}

/// Result of comparing a producer's value against what a consumer expects.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityReport {
    pub missing_keys: Vec<String>,
    pub type_mismatches: Vec<(String, String)>,
    pub confidence: f64,
}

fn is_opaque_image(v: &Value) -> bool {
    v.as_str().map(|s| s.starts_with("<opaque:Image")).unwrap_or(false)
}

fn materialize_image(v: &Value, idx: usize, temp_dir: &Path) -> Option<String> {
    let marker = v.as_str()?;
    let path: PathBuf = temp_dir.join(format!("image_{}.bin", idx));
    std::fs::write(&path, marker).ok()?;
    Some(path.to_string_lossy().to_string())
}

fn char_set(s: &str) -> HashSet<char> {
    s.chars().collect()
}

fn key_similarity(requested: &str, candidate: &str) -> f64 {
    if requested == candidate {
        return 1.0;
    }
    if requested.contains(candidate) || candidate.contains(requested) {
        return 0.6;
    }
    let a = char_set(requested);
    let b = char_set(candidate);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(&b).count() as f64;
    let union = a.union(&b).count() as f64;
    intersection / union
}

fn best_key_match<'a>(requested: &str, candidates: impl Iterator<Item = &'a String>) -> Option<(&'a String, f64)> {
    candidates
        .map(|c| (c, key_similarity(requested, c)))
        .filter(|(_, score)| *score >= 0.3)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
}

/// Build a [`CompatibilityReport`] describing what a consumer requesting
/// `requested_key` would find in `producer_value` (§4.7 step 1).
pub fn analyze_compatibility(producer_value: &Value, requested_key: &str) -> CompatibilityReport {
    let mut report = CompatibilityReport::default();
    match producer_value {
        Value::Object(map) => {
            if map.contains_key(requested_key) {
                report.confidence = 1.0;
            } else if let Some((_, score)) = best_key_match(requested_key, map.keys()) {
                report.confidence = score;
            } else {
                report.missing_keys.push(requested_key.to_string());
            }
        }
        _ => {
            report.missing_keys.push(requested_key.to_string());
        }
    }
    report
}

/// Synthesize a value for `requested_key`, given the producer's full
/// envelope-as-JSON `producer_value` (§4.7 steps 2-3). Pure function: no
/// caching, no statistics — [`OutputAdapter`] wraps this with both.
pub fn synthesize(producer_value: &Value, requested_key: &str, temp_dir: &Path) -> Option<(Coercion, Value)> {
    if let Value::Object(map) = producer_value {
        if let Some(v) = map.get(requested_key) {
            return Some((Coercion::Identity, v.clone()));
        }
        if let Some((key, score)) = best_key_match(requested_key, map.keys()) {
            if score >= 0.3 {
                return Some((Coercion::Identity, map[key].clone()));
            }
        }
    }

    let primary = producer_value
        .pointer("/data/primary")
        .cloned()
        .unwrap_or_else(|| producer_value.clone());

    if let Value::Array(items) = &primary {
        if !items.is_empty() && items.iter().all(is_opaque_image) {
            let paths: Vec<Value> = items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| materialize_image(v, i, temp_dir).map(Value::String))
                .collect();
            if paths.len() == items.len() {
                if paths.len() == 1 && !requested_key.ends_with('s') {
                    return Some((Coercion::UnwrapSingle, paths[0].clone()));
                }
                return Some((Coercion::Identity, Value::Array(paths)));
            }
        }
    }
    if is_opaque_image(&primary) {
        if let Some(p) = materialize_image(&primary, 0, temp_dir) {
            return Some((Coercion::Identity, Value::String(p)));
        }
    }

    for key in ["data", "primary", "results", "items"] {
        if let Some(v) = producer_value.get(key) {
            return Some((Coercion::Identity, v.clone()));
        }
    }
    if !primary.is_null() {
        return Some((Coercion::Identity, primary));
    }
    None
}

/// C7 proper: caches compiled/applied adapters and tracks statistics,
/// wrapping the pure [`synthesize`]/[`Coercion`] logic above.
pub struct OutputAdapter {
    cache: Arc<AdapterCache>,
    temp_dir: PathBuf,
}

impl OutputAdapter {
    pub fn new(cache: Arc<AdapterCache>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache,
            temp_dir: temp_dir.into(),
        }
    }

    /// Adapt `value` (expected to satisfy `expected`) via the coercion
    /// catalogue, with cache + stats bookkeeping.
    pub fn coerce(&self, adapter_name: &str, value: &Value, expected: &SemanticType) -> Value {
        if let Some(cached) = self.cache.get(adapter_name, value) {
            return cached;
        }
        let start = Instant::now();
        let coercion = choose_coercion(value, expected);
        let result = coercion.apply(value);
        let (success, output) = match result {
            Some(v) => (true, v),
            None => (false, value.clone()),
        };
        self.cache.record_outcome(coercion.name(), success, start.elapsed());
        self.cache.put(adapter_name, value, output.clone());
        output
    }

    /// Produce a value for a key the producer didn't supply (§4.7 full
    /// procedure), used by the placeholder resolver's fallback path.
    pub fn adapt_missing_key(&self, producer_value: &Value, requested_key: &str) -> Option<Value> {
        let cache_key = format!("missing_key::{}", requested_key);
        if let Some(cached) = self.cache.get(&cache_key, producer_value) {
            return Some(cached);
        }
        let start = Instant::now();
        let result = synthesize(producer_value, requested_key, &self.temp_dir);
        match result {
            Some((coercion, value)) => {
                self.cache.record_outcome(coercion.name(), true, start.elapsed());
                self.cache.put(&cache_key, producer_value, value.clone());
                Some(value)
            }
            None => {
                self.cache.record_outcome("synthesize", false, start.elapsed());
                None
            }
        }
    }
}

impl MissingKeyAdapter for OutputAdapter {
    fn adapt(&self, producer: &Value, key_path: &str) -> Option<Value> {
        self.adapt_missing_key(producer, key_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn applying_same_coercion_twice_is_idempotent() {
        let cache = Arc::new(AdapterCache::new(16));
        let dir = tempfile::tempdir().unwrap();
        let adapter = OutputAdapter::new(cache, dir.path());
        let value = json!("42");
        let first = adapter.coerce("string_to_number", &value, &SemanticType::Number);
        let second = adapter.coerce("string_to_number", &value, &SemanticType::Number);
        assert_eq!(first, second);
    }

    #[test]
    fn synthesize_materializes_image_list_to_paths() {
        let dir = tempfile::tempdir().unwrap();
        let producer = json!({
            "status": "success",
            "data": {"primary": ["<opaque:Image@1>", "<opaque:Image@2>"]},
        });
        let (coercion, value) = synthesize(&producer, "images", dir.path()).unwrap();
        assert_eq!(coercion, Coercion::Identity);
        let paths = value.as_array().unwrap();
        assert_eq!(paths.len(), 2);
        for p in paths {
            assert!(Path::new(p.as_str().unwrap()).exists());
        }
    }

    #[test]
    fn synthesize_falls_back_to_well_known_keys() {
        let dir = tempfile::tempdir().unwrap();
        let producer = json!({"results": ["a", "b"]});
        let (_, value) = synthesize(&producer, "items", dir.path()).unwrap();
        assert_eq!(value, json!(["a", "b"]));
    }

    #[test]
    fn key_similarity_prefers_exact_then_substring() {
        assert_eq!(key_similarity("path", "path"), 1.0);
        assert!(key_similarity("file_path", "path") >= 0.6);
        assert!(key_similarity("xyz", "abc") < 0.3);
    }

    #[test]
    fn coercion_catalogue_wraps_and_unwraps_single() {
        assert_eq!(Coercion::WrapSingle.apply(&json!("x")), Some(json!(["x"])));
        assert_eq!(Coercion::UnwrapSingle.apply(&json!(["x"])), Some(json!("x")));
        assert_eq!(Coercion::UnwrapSingle.apply(&json!(["x", "y"])), None);
    }
}
