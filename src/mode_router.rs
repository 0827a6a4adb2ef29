// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Mode Router (C10, thin)
//!
//! Decides whether an incoming request should run the pipeline engine or
//! short-circuit to a conversational reply. A cheap regex/keyword pass,
//! not a full NLU (§4.10).

use once_cell::sync::Lazy;
use regex::Regex;

/// Which handler a request should be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Conversational,
    Task,
}

/// Default ceiling (characters) under which a short, pattern-matching
/// input is treated as conversational rather than a pipeline request.
pub const DEFAULT_CONVERSATIONAL_MAX_LEN: usize = 40;

static GREETING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(hi|hello|hey|thanks|thank you|good (morning|afternoon|evening)|how are you|bye|goodbye)\b")
        .unwrap()
});

/// Classify `input` as conversational or a task for the pipeline engine.
pub fn classify(input: &str, max_conversational_len: usize) -> Mode {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Mode::Conversational;
    }
    if trimmed.chars().count() <= max_conversational_len && GREETING_RE.is_match(trimmed) {
        return Mode::Conversational;
    }
    let is_short_question = trimmed.chars().count() <= max_conversational_len && trimmed.ends_with('?');
    if is_short_question && !trimmed.to_lowercase().contains("pipeline") {
        return Mode::Conversational;
    }
    Mode::Task
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_is_conversational() {
        assert_eq!(classify("hi there", DEFAULT_CONVERSATIONAL_MAX_LEN), Mode::Conversational);
        assert_eq!(classify("Thanks!", DEFAULT_CONVERSATIONAL_MAX_LEN), Mode::Conversational);
    }

    #[test]
    fn long_request_is_a_task() {
        let input = "Search for recent papers on transformer architectures, summarize the top three, and write a report to disk";
        assert_eq!(classify(input, DEFAULT_CONVERSATIONAL_MAX_LEN), Mode::Task);
    }

    #[test]
    fn short_non_greeting_question_is_conversational() {
        assert_eq!(classify("What time is it?", DEFAULT_CONVERSATIONAL_MAX_LEN), Mode::Conversational);
    }

    #[test]
    fn empty_input_is_conversational() {
        assert_eq!(classify("   ", DEFAULT_CONVERSATIONAL_MAX_LEN), Mode::Conversational);
    }
}
