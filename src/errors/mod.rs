// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Error types for the pipeline engine
//!
//! taskweave surfaces every engine-visible failure through one typed enum
//! so that CLI rendering, event payloads, and library callers all agree on
//! the same taxonomy (see `ErrorKind`).

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use thiserror::Error;

/// Result type for taskweave operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Engine-visible error kind, carried on terminal `error` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadSpec,
    UnresolvedPlaceholder,
    CycleDetected,
    ToolError,
    DependencyIssue,
    ShapeMismatchUnrecoverable,
    Timeout,
    Cancelled,
    Internal,
}

/// Main error type for taskweave
#[derive(Error, Debug, Diagnostic)]
pub enum PipelineError {
    // ─────────────────────────────────────────────────────────────────
    // Spec errors (fail before execution starts)
    // ─────────────────────────────────────────────────────────────────
    #[error("Pipeline node '{id}' has an empty id or a duplicate id")]
    #[diagnostic(
        code(taskweave::duplicate_node_id),
        help("Every node id in `components` must be non-empty and unique")
    )]
    DuplicateNodeId { id: String },

    #[error("Pipeline node '{node}' references unknown tool type '{tool_type}'")]
    #[diagnostic(code(taskweave::unknown_tool))]
    UnknownTool { node: String, tool_type: String },

    #[error("Invalid pipeline specification: {reason}")]
    #[diagnostic(code(taskweave::bad_spec))]
    BadSpec {
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────
    // Tool errors
    // ─────────────────────────────────────────────────────────────────
    #[error("Tool '{tool}' not found in registry")]
    #[diagnostic(
        code(taskweave::tool_not_found),
        help("Registered tools: use `taskweave describe` to list them")
    )]
    ToolNotFound { tool: String },

    #[error("Node '{node}' ({tool}) failed: {message}")]
    #[diagnostic(code(taskweave::tool_error))]
    ToolExecutionFailed {
        node: String,
        tool: String,
        message: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────
    // Execution errors
    // ─────────────────────────────────────────────────────────────────
    #[error("Node '{node}' timed out after {seconds}s")]
    #[diagnostic(code(taskweave::timeout))]
    Timeout { node: String, seconds: u64 },

    #[error("Pipeline execution was cancelled")]
    #[diagnostic(code(taskweave::cancelled))]
    Cancelled,

    #[error("Shape adaptation could not be synthesized for node '{node}': {reason}")]
    #[diagnostic(code(taskweave::shape_mismatch_unrecoverable))]
    ShapeMismatchUnrecoverable { node: String, reason: String },

    #[error("Internal engine error: {message}")]
    #[diagnostic(code(taskweave::internal))]
    Internal { message: String },

    // ─────────────────────────────────────────────────────────────────
    // Serialization / IO
    // ─────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(taskweave::io_error))]
    Io { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(taskweave::json_error))]
    Json { message: String },

    #[error("YAML error: {message}")]
    #[diagnostic(code(taskweave::yaml_error))]
    Yaml { message: String },
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json {
            message: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: e.to_string(),
        }
    }
}

impl PipelineError {
    /// The taxonomy kind this error maps to on a terminal event (§7).
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateNodeId { .. } | Self::UnknownTool { .. } | Self::BadSpec { .. } => {
                ErrorKind::BadSpec
            }
            Self::ToolNotFound { .. } | Self::ToolExecutionFailed { .. } => ErrorKind::ToolError,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::ShapeMismatchUnrecoverable { .. } => ErrorKind::ShapeMismatchUnrecoverable,
            Self::Internal { .. } => ErrorKind::Internal,
            Self::Io { .. } | Self::Json { .. } | Self::Yaml { .. } => ErrorKind::Internal,
        }
    }

    /// The node that was executing when this error occurred, if any.
    pub fn failing_node(&self) -> Option<&str> {
        match self {
            Self::DuplicateNodeId { id } => Some(id),
            Self::UnknownTool { node, .. } => Some(node),
            Self::ToolExecutionFailed { node, .. } => Some(node),
            Self::Timeout { node, .. } => Some(node),
            Self::ShapeMismatchUnrecoverable { node, .. } => Some(node),
            _ => None,
        }
    }
}
