// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors. Shared by
//! the dependency-issue classifier (`crate::dependency_issue`) and CLI
//! error rendering.

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
    /// Whether this is an automated fix
    pub auto_fixable: bool,
}

impl RecoverySuggestion {
    /// Suggest installing a missing native package, keyed by ecosystem guess.
    pub fn install_package(package: &str) -> Self {
        Self {
            action: format!("Install missing package '{}'", package),
            steps: vec![
                format!(
                    "A tool reported that '{}' is not installed or importable",
                    package
                ),
                "Install it for the runtime the failing tool uses".into(),
            ],
            commands: vec![
                format!("pip install {}", package),
                format!("# or, if this is a system package:"),
                format!("apt-get install {}", package),
            ],
            auto_fixable: false,
        }
    }

    /// Suggest fixing a circular dependency among pipeline nodes.
    pub fn fix_circular_dependency(nodes: &[String]) -> Self {
        Self {
            action: "Review circular node dependencies".into(),
            steps: vec![
                format!("Detected cycle: {}", nodes.join(" -> ")),
                "The engine proceeded using a heuristic execution order".into(),
                "Review placeholder references between these nodes".into(),
            ],
            commands: vec!["taskweave graph --format mermaid".into()],
            auto_fixable: false,
        }
    }

    /// Suggest remediation for a permission error surfaced by a tool.
    pub fn fix_permission_error(detail: &str) -> Self {
        Self {
            action: "Grant required permissions".into(),
            steps: vec![
                format!("Tool reported a permission error: {}", detail),
                "Check file/directory permissions and credentials".into(),
            ],
            commands: vec![],
            auto_fixable: false,
        }
    }

    /// Suggest remediation for a network error surfaced by a tool.
    pub fn fix_network_error(detail: &str) -> Self {
        Self {
            action: "Check network connectivity".into(),
            steps: vec![
                format!("Tool reported a network error: {}", detail),
                "Verify connectivity, proxy settings, and endpoint availability".into(),
            ],
            commands: vec![],
            auto_fixable: false,
        }
    }

    /// Suggest remediation for a reported version conflict between packages.
    pub fn fix_version_conflict(detail: &str) -> Self {
        Self {
            action: "Resolve package version conflict".into(),
            steps: vec![
                format!("Tool reported a version conflict: {}", detail),
                "Check compatibility between the conflicting package versions".into(),
                "Isolate dependencies in a virtual environment".into(),
                "Upgrade or downgrade the conflicting package".into(),
            ],
            commands: vec![],
            auto_fixable: false,
        }
    }

    /// Suggest remediation for an incompatible-version error with no
    /// package-specific fix known.
    pub fn fix_compatibility_issue(detail: &str) -> Self {
        Self {
            action: "Investigate version compatibility issue".into(),
            steps: vec![format!("Tool reported an incompatible version: {}", detail)],
            commands: vec![],
            auto_fixable: false,
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "-> {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}
