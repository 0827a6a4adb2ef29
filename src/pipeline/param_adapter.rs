// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Smart Parameter Adapter (C6)
//!
//! Runs after placeholder substitution (C3). Infers each resolved param's
//! semantic category from its name and shape, and coerces it toward what
//! the consuming tool declares it expects (§4.6).

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::registry::SemanticType;

/// Value-level semantic category, independent of a tool's declared
/// [`SemanticType`] — this is what C6 infers from the *value itself*.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    FilePath,
    FileContent,
    Url,
    Unknown,
}

const KNOWN_EXTENSIONS: &[&str] = &[
    ".txt", ".md", ".json", ".yaml", ".yml", ".csv", ".html", ".png", ".jpg", ".jpeg", ".pdf",
];

/// Infer a param's semantic category from its name (§4.6 name patterns).
fn infer_from_name(name: &str) -> Option<Category> {
    let lower = name.to_lowercase();
    if lower.contains("file") || lower.contains("path") {
        Some(Category::FilePath)
    } else if lower.contains("content") || lower.contains("text") || lower.contains("data") {
        Some(Category::FileContent)
    } else if lower.contains("url") || lower.contains("link") {
        Some(Category::Url)
    } else {
        None
    }
}

/// Infer a param's semantic category from its value shape (§4.6 value shape).
fn infer_from_value(value: &Value) -> Category {
    match value {
        Value::String(s) => {
            if s.starts_with("http://") || s.starts_with("https://") {
                Category::Url
            } else if (s.contains('/') || s.contains('\\'))
                && KNOWN_EXTENSIONS.iter().any(|ext| s.ends_with(ext))
            {
                Category::FilePath
            } else if s.len() > 200 {
                Category::FileContent
            } else {
                Category::Unknown
            }
        }
        Value::Object(map) => {
            if map.contains_key("file_path") {
                Category::FilePath
            } else if map.contains_key("content") || map.contains_key("text") {
                Category::FileContent
            } else {
                Category::Unknown
            }
        }
        _ => Category::Unknown,
    }
}

/// Infer the semantic category of a resolved param (name pattern first,
/// value shape as fallback/confirmation).
pub fn infer_category(param_name: &str, value: &Value) -> Category {
    infer_from_name(param_name).unwrap_or_else(|| infer_from_value(value))
}

/// A coercion that ran, for logging/debugging.
#[derive(Debug, Clone)]
pub struct AdaptationLog {
    pub param_name: String,
    pub from: Category,
    pub to: Category,
    pub applied: bool,
}

/// Extract a leading Markdown heading (`# Title`) to use as a filename stem.
fn heading_filename(content: &str) -> Option<String> {
    let first_line = content.lines().next()?.trim();
    let heading = first_line.strip_prefix('#')?.trim();
    if heading.is_empty() {
        return None;
    }
    let slug: String = heading
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    Some(format!("{}.md", slug.trim_matches('_')))
}

/// Walk a dict looking for a nested `file_path`/`path`/`file` string key.
fn extract_nested_path(value: &Value) -> Option<String> {
    if let Value::Object(map) = value {
        for key in ["file_path", "path", "file"] {
            if let Some(Value::String(s)) = map.get(key) {
                return Some(s.clone());
            }
        }
        for nested in map.values() {
            if let Some(found) = extract_nested_path(nested) {
                return Some(found);
            }
        }
    }
    None
}

/// Coerce `value` (whose inferred category is `from`) toward `expected`,
/// consulting the consuming tool's declared [`SemanticType`] for writer-like
/// targets. `temp_dir` is where `file_content -> file_path` adaptations
/// write their materialized file. Returns the (possibly unchanged) value and
/// a log entry; failed adaptations leave the value untouched (§4.6).
pub fn adapt(
    param_name: &str,
    value: Value,
    expected: &SemanticType,
    temp_dir: &Path,
) -> (Value, AdaptationLog) {
    let from = infer_category(param_name, &value);
    let to = match expected {
        SemanticType::FilePath => Category::FilePath,
        SemanticType::FileContent => Category::FileContent,
        SemanticType::Url => Category::Url,
        _ => Category::Unknown,
    };

    if from == to || to == Category::Unknown {
        return (
            value,
            AdaptationLog {
                param_name: param_name.to_string(),
                from,
                to,
                applied: false,
            },
        );
    }

    let adapted = match (from, to) {
        (Category::FileContent, Category::FilePath) => {
            content_to_path(param_name, &value, temp_dir)
        }
        (Category::FilePath, Category::FileContent) => path_to_content(&value),
        (Category::Unknown, Category::FilePath) => extract_nested_path(&value).map(Value::String),
        _ => None,
    };

    match adapted {
        Some(v) => (
            v,
            AdaptationLog {
                param_name: param_name.to_string(),
                from,
                to,
                applied: true,
            },
        ),
        None => (
            value,
            AdaptationLog {
                param_name: param_name.to_string(),
                from,
                to,
                applied: false,
            },
        ),
    }
}

fn content_to_path(param_name: &str, value: &Value, temp_dir: &Path) -> Option<Value> {
    let content = value.as_str()?;
    let filename = heading_filename(content).unwrap_or_else(|| format!("{}.txt", param_name));
    let path: PathBuf = temp_dir.join(filename);
    std::fs::write(&path, content).ok()?;
    Some(Value::String(path.to_string_lossy().to_string()))
}

fn path_to_content(value: &Value) -> Option<Value> {
    let path = value.as_str()?;
    match std::fs::read_to_string(path) {
        Ok(content) => Some(Value::String(content)),
        Err(_) => Some(value.clone()),
    }
}

/// Apply [`adapt`] to every entry of a resolved params map, given each
/// param's expected semantic type (keyed by param name).
pub fn adapt_params(
    params: Map<String, Value>,
    expected_types: &std::collections::HashMap<String, SemanticType>,
    temp_dir: &Path,
) -> (Map<String, Value>, Vec<AdaptationLog>) {
    let mut logs = Vec::new();
    let mut out = Map::new();
    for (name, value) in params {
        if let Some(expected) = expected_types.get(&name) {
            let (adapted, log) = adapt(&name, value, expected, temp_dir);
            if log.applied {
                logs.push(log);
            }
            out.insert(name, adapted);
        } else {
            out.insert(name, value);
        }
    }
    (out, logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn infers_file_path_from_name() {
        assert_eq!(infer_category("file_path", &json!("anything")), Category::FilePath);
    }

    #[test]
    fn infers_url_from_value_shape() {
        assert_eq!(
            infer_category("target", &json!("https://example.com")),
            Category::Url
        );
    }

    #[test]
    fn content_to_path_derives_filename_from_heading() {
        let dir = tempfile::tempdir().unwrap();
        let (adapted, log) = adapt(
            "report",
            json!("# My Report\n\nbody text here"),
            &SemanticType::FilePath,
            dir.path(),
        );
        assert!(log.applied);
        let path = adapted.as_str().unwrap();
        assert!(path.ends_with("My_Report.md"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# My Report\n\nbody text here");
    }

    #[test]
    fn path_to_content_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.txt");
        std::fs::write(&path, "hello").unwrap();
        let (adapted, log) = adapt(
            "file_path",
            json!(path.to_string_lossy()),
            &SemanticType::FileContent,
            dir.path(),
        );
        assert!(log.applied);
        assert_eq!(adapted, json!("hello"));
    }

    #[test]
    fn failed_adaptation_leaves_value_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (adapted, log) = adapt(
            "file_path",
            json!("/does/not/exist.txt"),
            &SemanticType::FileContent,
            dir.path(),
        );
        // path_to_content falls back to the literal path when the read fails
        assert!(log.applied);
        assert_eq!(adapted, json!("/does/not/exist.txt"));
    }

    #[test]
    fn dict_with_nested_path_is_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let value = json!({"wrapper": {"file_path": "/tmp/x.txt"}});
        let (adapted, log) = adapt("config", value, &SemanticType::FilePath, dir.path());
        assert!(log.applied);
        assert_eq!(adapted, json!("/tmp/x.txt"));
    }
}
