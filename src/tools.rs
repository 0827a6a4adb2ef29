// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Built-in demo tools
//!
//! A small, representative tool set grounded in the examples §1 names
//! (search, report generation, file I/O, object-store upload, image
//! transforms) — enough to exercise every adaptation path C6/C7 implement,
//! without standing up a general plugin marketplace (out of scope, §1).

use crate::envelope::{opaque_marker, Envelope};
use crate::registry::{Invoker, OutputShape, SemanticType, ToolCategory, ToolRegistry};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static IMAGE_ID: AtomicU64 = AtomicU64::new(1);

fn get_str(params: &Map<String, Value>, key: &str) -> Option<String> {
    params.get(key).and_then(|v| v.as_str()).map(String::from)
}

/// `search`: looks up a query and returns a list of hits. Stands in for any
/// external data-source tool (category `data_source`).
struct SearchTool;

#[async_trait]
impl Invoker for SearchTool {
    async fn invoke(&self, params: &Map<String, Value>) -> Result<Envelope, String> {
        let query = get_str(params, "query").ok_or("missing required parameter 'query'")?;
        let hits = json!([
            {"title": format!("Result for {}", query), "url": "https://example.com/1", "snippet": "..."},
            {"title": format!("More on {}", query), "url": "https://example.com/2", "snippet": "..."},
        ]);
        Ok(Envelope::success("search", format!("found 2 results for '{}'", query))
            .primary(hits)
            .count("total", json!(2))
            .build())
    }
}

/// `report_generator`: renders structured input data into a text report.
struct ReportGeneratorTool;

#[async_trait]
impl Invoker for ReportGeneratorTool {
    async fn invoke(&self, params: &Map<String, Value>) -> Result<Envelope, String> {
        let title = get_str(params, "title").unwrap_or_else(|| "Report".to_string());
        let data = params.get("data").cloned().unwrap_or(Value::Null);
        let body = format!("# {}\n\n{}", title, serde_json::to_string_pretty(&data).unwrap_or_default());
        Ok(Envelope::success("report_generator", "report generated")
            .primary(Value::String(body))
            .build())
    }
}

/// `file_writer`: writes `file_content` to `file_path` (category
/// `file_operator`). This is the canonical consumer C6 coerces in-memory
/// content toward when a producer handed back a path instead.
struct FileWriterTool;

#[async_trait]
impl Invoker for FileWriterTool {
    async fn invoke(&self, params: &Map<String, Value>) -> Result<Envelope, String> {
        let content = get_str(params, "file_content").ok_or("missing required parameter 'file_content'")?;
        let path = get_str(params, "file_path").ok_or("missing required parameter 'file_path'")?;
        tokio::fs::write(&path, &content)
            .await
            .map_err(|e| format!("failed to write {}: {}", path, e))?;
        Ok(Envelope::success("file_writer", format!("wrote {} bytes to {}", content.len(), path))
            .primary(json!({"status": "written"}))
            .path(path)
            .build())
    }
}

/// `file_reader`: reads `file_path` and returns its content as
/// `data.primary` (category `file_operator`).
struct FileReaderTool;

#[async_trait]
impl Invoker for FileReaderTool {
    async fn invoke(&self, params: &Map<String, Value>) -> Result<Envelope, String> {
        let path = get_str(params, "file_path").ok_or("missing required parameter 'file_path'")?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| format!("failed to read {}: {}", path, e))?;
        Ok(Envelope::success("file_reader", format!("read {} bytes from {}", content.len(), path))
            .primary(Value::String(content))
            .path(path)
            .build())
    }
}

/// `object_store_uploader`: uploads a local path to a (simulated) object
/// store and returns its URL (category `storage`).
struct ObjectStoreUploaderTool;

#[async_trait]
impl Invoker for ObjectStoreUploaderTool {
    async fn invoke(&self, params: &Map<String, Value>) -> Result<Envelope, String> {
        let path = get_str(params, "file_path").ok_or("missing required parameter 'file_path'")?;
        let bucket = get_str(params, "bucket").unwrap_or_else(|| "default".to_string());
        let key = path.rsplit('/').next().unwrap_or(&path);
        let url = format!("https://{}.objects.local/{}", bucket, key);
        Ok(Envelope::success("object_store_uploader", format!("uploaded to {}", url))
            .primary(Value::String(url.clone()))
            .secondary("bucket", Value::String(bucket))
            .build())
    }
}

/// `image_loader`: loads an image from a path or URL into an in-memory
/// reference (category `data_processor`). The image is never actually
/// decoded here — it is represented by an opaque handle so that C7's
/// materialize-to-path path has something realistic to adapt.
struct ImageLoaderTool;

#[async_trait]
impl Invoker for ImageLoaderTool {
    async fn invoke(&self, params: &Map<String, Value>) -> Result<Envelope, String> {
        let source = get_str(params, "file_path")
            .or_else(|| get_str(params, "url"))
            .ok_or("missing required parameter 'file_path' or 'url'")?;
        let id = IMAGE_ID.fetch_add(1, Ordering::Relaxed);
        Ok(Envelope::success("image_loader", format!("loaded image from {}", source))
            .primary(opaque_marker("Image", id))
            .secondary("source", Value::String(source))
            .build())
    }
}

/// `image_rotator`: rotates one or more in-memory images by `degrees`
/// (category `data_processor`).
struct ImageRotatorTool;

#[async_trait]
impl Invoker for ImageRotatorTool {
    async fn invoke(&self, params: &Map<String, Value>) -> Result<Envelope, String> {
        let degrees = params.get("degrees").and_then(|v| v.as_f64()).unwrap_or(90.0);
        let images = match params.get("image") {
            Some(Value::Array(items)) => items.clone(),
            Some(other) => vec![other.clone()],
            None => return Err("missing required parameter 'image'".to_string()),
        };
        let rotated: Vec<Value> = images
            .iter()
            .map(|_| opaque_marker("Image", IMAGE_ID.fetch_add(1, Ordering::Relaxed)))
            .collect();
        let primary = if rotated.len() == 1 {
            rotated[0].clone()
        } else {
            Value::Array(rotated)
        };
        Ok(Envelope::success(
            "image_rotator",
            format!("rotated {} image(s) by {}deg", images.len(), degrees),
        )
        .primary(primary)
        .build())
    }
}

pub(crate) fn register_demo_tools(registry: &mut ToolRegistry) {
    registry.register(
        "search",
        ToolCategory::DataSource,
        HashMap::from([("query".to_string(), SemanticType::String)]),
        OutputShape {
            primary: Some(SemanticType::List(Box::new(SemanticType::Map))),
            secondary_keys: vec![],
            produces_paths: false,
        },
        SearchTool,
    );

    registry.register(
        "report_generator",
        ToolCategory::DataProcessor,
        HashMap::from([
            ("title".to_string(), SemanticType::String),
            ("data".to_string(), SemanticType::Any),
        ]),
        OutputShape {
            primary: Some(SemanticType::FileContent),
            secondary_keys: vec![],
            produces_paths: false,
        },
        ReportGeneratorTool,
    );

    registry.register(
        "file_writer",
        ToolCategory::FileOperator,
        HashMap::from([
            ("file_content".to_string(), SemanticType::FileContent),
            ("file_path".to_string(), SemanticType::FilePath),
        ]),
        OutputShape {
            primary: Some(SemanticType::Map),
            secondary_keys: vec![],
            produces_paths: true,
        },
        FileWriterTool,
    );

    registry.register(
        "file_reader",
        ToolCategory::FileOperator,
        HashMap::from([("file_path".to_string(), SemanticType::FilePath)]),
        OutputShape {
            primary: Some(SemanticType::FileContent),
            secondary_keys: vec![],
            produces_paths: true,
        },
        FileReaderTool,
    );

    registry.register(
        "object_store_uploader",
        ToolCategory::Storage,
        HashMap::from([
            ("file_path".to_string(), SemanticType::FilePath),
            ("bucket".to_string(), SemanticType::String),
        ]),
        OutputShape {
            primary: Some(SemanticType::Url),
            secondary_keys: vec!["bucket".to_string()],
            produces_paths: false,
        },
        ObjectStoreUploaderTool,
    );

    registry.register(
        "image_loader",
        ToolCategory::DataProcessor,
        HashMap::from([
            ("file_path".to_string(), SemanticType::FilePath),
            ("url".to_string(), SemanticType::Url),
        ]),
        OutputShape {
            primary: Some(SemanticType::ImageRef),
            secondary_keys: vec!["source".to_string()],
            produces_paths: false,
        },
        ImageLoaderTool,
    );

    registry.register(
        "image_rotator",
        ToolCategory::DataProcessor,
        HashMap::from([
            ("image".to_string(), SemanticType::ImageRef),
            ("degrees".to_string(), SemanticType::Number),
        ]),
        OutputShape {
            primary: Some(SemanticType::ImageRef),
            secondary_keys: vec![],
            produces_paths: false,
        },
        ImageRotatorTool,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_requires_query() {
        let registry = ToolRegistry::with_demo_tools();
        let env = registry.invoke("search", &Map::new()).await;
        assert_eq!(env.status, crate::envelope::EnvelopeStatus::Error);
    }

    #[tokio::test]
    async fn search_returns_hits() {
        let registry = ToolRegistry::with_demo_tools();
        let mut params = Map::new();
        params.insert("query".to_string(), json!("rust"));
        let env = registry.invoke("search", &params).await;
        assert!(env.status.is_success());
        assert!(env.data.primary.as_array().unwrap().len() == 2);
    }

    #[tokio::test]
    async fn file_writer_then_reader_roundtrip() {
        let registry = ToolRegistry::with_demo_tools();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let mut write_params = Map::new();
        write_params.insert("file_content".to_string(), json!("hello"));
        write_params.insert("file_path".to_string(), json!(path.to_string_lossy()));
        let write_env = registry.invoke("file_writer", &write_params).await;
        assert!(write_env.status.is_success());
        assert_eq!(write_env.paths, vec![path.to_string_lossy().to_string()]);

        let mut read_params = Map::new();
        read_params.insert("file_path".to_string(), json!(path.to_string_lossy()));
        let read_env = registry.invoke("file_reader", &read_params).await;
        assert!(read_env.status.is_success());
        assert_eq!(read_env.data.primary, json!("hello"));
    }

    #[tokio::test]
    async fn image_rotator_produces_opaque_markers() {
        let registry = ToolRegistry::with_demo_tools();
        let mut params = Map::new();
        params.insert("image".to_string(), json!("<opaque:Image@1>"));
        params.insert("degrees".to_string(), json!(90));
        let env = registry.invoke("image_rotator", &params).await;
        assert!(env.status.is_success());
        assert!(env.data.primary.as_str().unwrap().starts_with("<opaque:Image@"));
    }
}
