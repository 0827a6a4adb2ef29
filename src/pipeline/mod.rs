// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! The pipeline engine
//!
//! Everything that turns a [`spec::PipelineSpec`] into an executed request:
//! placeholder resolution (C3), dependency inference (C4), execution
//! ordering (C5), parameter adaptation (C6), output adaptation (C7), and
//! the executor (C8) that drives them.

pub mod dag;
pub mod dependency;
pub mod executor;
pub mod output_adapter;
pub mod param_adapter;
pub mod placeholder;
pub mod spec;
pub mod validation;

pub use dag::{build_order, ExecutionPlan};
pub use executor::{PipelineExecutor, PipelineOutcome};
pub use spec::{NodeSpec, OutputHint, PipelineSpec};
