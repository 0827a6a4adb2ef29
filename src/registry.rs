// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! The Tool Registry (C1)
//!
//! Enumerates the tools available to a pipeline, and is the one place that
//! knows how to actually invoke one. Registration is static: every built-in
//! tool registers an explicit [`ToolDescriptor`] plus an [`Invoker`] at
//! construction time. There is no directory walk or reflection-based
//! plugin discovery (see DESIGN.md, REDESIGN FLAGS).

use crate::envelope::Envelope;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Semantic type of a tool parameter or output key, independent of its JSON
/// wire representation. Drives C4's data-flow inference and C6's coercion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    String,
    Number,
    Boolean,
    FilePath,
    FileContent,
    Url,
    ImageRef,
    List(Box<SemanticType>),
    Map,
    Any,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::FilePath => write!(f, "file_path"),
            Self::FileContent => write!(f, "file_content"),
            Self::Url => write!(f, "url"),
            Self::ImageRef => write!(f, "image_ref"),
            Self::List(inner) => write!(f, "list<{}>", inner),
            Self::Map => write!(f, "map"),
            Self::Any => write!(f, "any"),
        }
    }
}

/// Broad grouping used by C4's data-flow pass to decide which tool-to-tool
/// pairings are plausible producer/consumer relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolCategory {
    DataSource,
    DataProcessor,
    FileOperator,
    Storage,
    Other,
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DataSource => "data_source",
            Self::DataProcessor => "data_processor",
            Self::FileOperator => "file_operator",
            Self::Storage => "storage",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Which envelope keys a tool is declared to populate. Hints for C4/C7, not
/// enforced at invocation time — a tool may legitimately under- or
/// over-populate relative to its declaration (see §4.7's need to exist).
#[derive(Debug, Clone, Default)]
pub struct OutputShape {
    pub primary: Option<SemanticType>,
    pub secondary_keys: Vec<String>,
    pub produces_paths: bool,
}

/// Static description of one registered tool.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub category: ToolCategory,
    pub input_schema: HashMap<String, SemanticType>,
    pub output: OutputShape,
    invoker: Arc<dyn Invoker>,
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Implemented by every tool body. Returning `Err` signals an unexpected
/// failure (panic-equivalent); the registry, not the tool, is responsible
/// for turning that into an error [`Envelope`] (§4.1).
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, params: &Map<String, Value>) -> Result<Envelope, String>;
}

/// C1: enumerate tools, expose their schemas, and invoke them by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Build a registry with the built-in demo tools registered (§4.1): a
    /// small but representative set chosen to exercise every adaptation
    /// path in §4.6/§4.7.
    pub fn with_demo_tools() -> Self {
        let mut registry = Self::new();
        crate::tools::register_demo_tools(&mut registry);
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        category: ToolCategory,
        input_schema: HashMap<String, SemanticType>,
        output: OutputShape,
        invoker: impl Invoker + 'static,
    ) {
        let name = name.into();
        self.tools.insert(
            name.clone(),
            ToolDescriptor {
                name,
                category,
                input_schema,
                output,
                invoker: Arc::new(invoker),
            },
        );
    }

    pub fn list(&self) -> Vec<&ToolDescriptor> {
        let mut tools: Vec<_> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Invoke a registered tool. Always returns an `Envelope` — a tool
    /// returning `Err` is wrapped into an error envelope rather than
    /// propagated, per §4.1.
    pub async fn invoke(&self, name: &str, params: &Map<String, Value>) -> Envelope {
        let Some(descriptor) = self.tools.get(name) else {
            return Envelope::error(
                name,
                format!("tool '{}' not found in registry", name),
                "ToolNotFound",
            );
        };

        match descriptor.invoker.invoke(params).await {
            Ok(envelope) => envelope.sanitize(),
            Err(detail) => Envelope::error(name, format!("tool '{}' raised", name), detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Invoker for Echo {
        async fn invoke(&self, params: &Map<String, Value>) -> Result<Envelope, String> {
            Ok(Envelope::success("echo", "ok")
                .primary(Value::Object(params.clone()))
                .build())
        }
    }

    struct Boom;

    #[async_trait]
    impl Invoker for Boom {
        async fn invoke(&self, _params: &Map<String, Value>) -> Result<Envelope, String> {
            Err("kaboom".to_string())
        }
    }

    #[tokio::test]
    async fn invoke_missing_tool_returns_error_envelope() {
        let registry = ToolRegistry::new();
        let env = registry.invoke("nope", &Map::new()).await;
        assert_eq!(env.status, crate::envelope::EnvelopeStatus::Error);
    }

    #[tokio::test]
    async fn invoke_wraps_tool_failure_into_envelope() {
        let mut registry = ToolRegistry::new();
        registry.register(
            "boom",
            ToolCategory::Other,
            HashMap::new(),
            OutputShape::default(),
            Boom,
        );
        let env = registry.invoke("boom", &Map::new()).await;
        assert_eq!(env.status, crate::envelope::EnvelopeStatus::Error);
        assert_eq!(env.error.as_deref(), Some("kaboom"));
    }

    #[tokio::test]
    async fn invoke_succeeds_and_lists_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(
            "echo",
            ToolCategory::Other,
            HashMap::new(),
            OutputShape::default(),
            Echo,
        );
        assert_eq!(registry.list().len(), 1);
        let env = registry.invoke("echo", &Map::new()).await;
        assert!(env.status.is_success());
    }
}
