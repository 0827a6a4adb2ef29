// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Engine-wide configuration
//!
//! Ambient runtime knobs that are not part of any single pipeline
//! specification: heartbeat cadence, timeouts, and dependency-issue
//! auto-install policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration for the pipeline engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between heartbeat events while a node is in progress
    #[serde(default = "default_heartbeat_secs", with = "duration_secs")]
    pub heartbeat_interval: Duration,

    /// Default per-tool invocation timeout
    #[serde(default = "default_tool_timeout_secs", with = "duration_secs")]
    pub tool_timeout: Duration,

    /// Default per-pipeline timeout (whole request)
    #[serde(default = "default_pipeline_timeout_secs", with = "duration_secs")]
    pub pipeline_timeout: Duration,

    /// Whether the engine may act on classified dependency issues by running
    /// their install commands itself. Defaults to false: the classifier
    /// always reports, acting on it is a caller decision (see DESIGN.md).
    #[serde(default)]
    pub auto_install_dependencies: bool,

    /// Bound on the compiled-adapter / adapter-result LRU cache (C7)
    #[serde(default = "default_adapter_cache_capacity")]
    pub adapter_cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: default_heartbeat_secs(),
            tool_timeout: default_tool_timeout_secs(),
            pipeline_timeout: default_pipeline_timeout_secs(),
            auto_install_dependencies: false,
            adapter_cache_capacity: default_adapter_cache_capacity(),
        }
    }
}

impl EngineConfig {
    /// Load configuration, applying defaults for anything unset.
    ///
    /// There is no on-disk config format in this crate (credential/config
    /// loading is an explicit external collaborator per the spec); this is
    /// the single constructor call sites should use so a future loader can
    /// be slotted in without touching callers.
    pub fn from_env_or_default() -> Self {
        Self::default()
    }
}

fn default_heartbeat_secs() -> Duration {
    Duration::from_secs(5)
}

fn default_tool_timeout_secs() -> Duration {
    Duration::from_secs(120)
}

fn default_pipeline_timeout_secs() -> Duration {
    Duration::from_secs(600)
}

fn default_adapter_cache_capacity() -> usize {
    256
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        assert!(!config.auto_install_dependencies);
    }
}
