// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Dependency Issue Classifier (C11)
//!
//! Scans a failed tool's error string against known patterns and surfaces
//! remediation guidance (§4.11). Auto-install is never implicit — see
//! `EngineConfig::auto_install_dependencies`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::RecoverySuggestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyIssueKind {
    MissingPackage,
    VersionConflict,
    PermissionError,
    NetworkError,
    CompatibilityIssue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyIssue {
    pub package: String,
    pub kind: DependencyIssueKind,
    pub suggested_solutions: Vec<String>,
    pub install_commands: Vec<String>,
}

static MODULE_NOT_FOUND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:ModuleNotFoundError|ImportError):\s*No module named ['"]([\w.\-]+)['"]"#).unwrap());

static LOCALE_NOT_INSTALLED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\w.\-]+)\s*未安装").unwrap());

static PERMISSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)permission denied|access denied|not permitted").unwrap());

static NETWORK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)connection refused|network is unreachable|timed out connecting|could not resolve host")
        .unwrap()
});

static VERSION_CONFLICT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)version.*conflict").unwrap());

static INCOMPATIBLE_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)incompatible.*version").unwrap());

/// Classify a tool's `error` string into at most one [`DependencyIssue`]
/// (§4.11). Returns `None` when nothing matches a known pattern.
pub fn classify(error: &str) -> Option<DependencyIssue> {
    if let Some(caps) = MODULE_NOT_FOUND.captures(error).or_else(|| LOCALE_NOT_INSTALLED.captures(error)) {
        let package = caps.get(1).unwrap().as_str().to_string();
        let suggestion = RecoverySuggestion::install_package(&package);
        return Some(DependencyIssue {
            package,
            kind: DependencyIssueKind::MissingPackage,
            suggested_solutions: vec![suggestion.action.clone()],
            install_commands: suggestion.commands,
        });
    }

    if PERMISSION.is_match(error) {
        let suggestion = RecoverySuggestion::fix_permission_error(error);
        return Some(DependencyIssue {
            package: String::new(),
            kind: DependencyIssueKind::PermissionError,
            suggested_solutions: vec![suggestion.action],
            install_commands: vec![],
        });
    }

    if NETWORK.is_match(error) {
        let suggestion = RecoverySuggestion::fix_network_error(error);
        return Some(DependencyIssue {
            package: String::new(),
            kind: DependencyIssueKind::NetworkError,
            suggested_solutions: vec![suggestion.action],
            install_commands: vec![],
        });
    }

    if VERSION_CONFLICT.is_match(error) {
        let suggestion = RecoverySuggestion::fix_version_conflict(error);
        return Some(DependencyIssue {
            package: String::new(),
            kind: DependencyIssueKind::VersionConflict,
            suggested_solutions: suggestion.steps.clone(),
            install_commands: vec![],
        });
    }

    if INCOMPATIBLE_VERSION.is_match(error) {
        let suggestion = RecoverySuggestion::fix_compatibility_issue(error);
        return Some(DependencyIssue {
            package: String::new(),
            kind: DependencyIssueKind::CompatibilityIssue,
            suggested_solutions: vec![suggestion.action],
            install_commands: vec![],
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_python_module_not_found() {
        let issue = classify("ModuleNotFoundError: No module named 'baidusearch'").unwrap();
        assert_eq!(issue.package, "baidusearch");
        assert_eq!(issue.kind, DependencyIssueKind::MissingPackage);
        assert!(!issue.install_commands.is_empty());
    }

    #[test]
    fn classifies_import_error_variant() {
        let issue = classify("ImportError: No module named 'numpy'").unwrap();
        assert_eq!(issue.package, "numpy");
    }

    #[test]
    fn classifies_permission_error() {
        let issue = classify("OSError: Permission denied: '/var/lib/data'").unwrap();
        assert_eq!(issue.kind, DependencyIssueKind::PermissionError);
    }

    #[test]
    fn classifies_network_error() {
        let issue = classify("requests.ConnectionError: Connection refused").unwrap();
        assert_eq!(issue.kind, DependencyIssueKind::NetworkError);
    }

    #[test]
    fn classifies_version_conflict() {
        let issue = classify("ResolutionImpossible: version conflict between numpy and scipy").unwrap();
        assert_eq!(issue.kind, DependencyIssueKind::VersionConflict);
    }

    #[test]
    fn classifies_incompatible_version_as_compatibility_issue() {
        let issue = classify("RuntimeError: incompatible version of libssl found").unwrap();
        assert_eq!(issue.kind, DependencyIssueKind::CompatibilityIssue);
    }

    #[test]
    fn unrecognized_error_yields_no_classification() {
        assert!(classify("ValueError: bad input").is_none());
    }
}
