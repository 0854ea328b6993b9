// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Recording goes through the metrics-rs facade and is a no-op until a
//! recorder is installed.

use metrics::{describe_counter, describe_histogram};

/// Register all EZShop metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("ezshop_turns_total", "Turns handled, by modality and outcome");
    describe_histogram!("ezshop_turn_latency_seconds", "End-to-end turn latency in seconds");
    describe_counter!(
        "ezshop_retrieval_total",
        "Search calls, by outcome (hit, empty, fallback_hit, unavailable)"
    );
    describe_counter!(
        "ezshop_summary_cache_total",
        "Summary cache lookups, by result (hit, miss, dedup_hit, error)"
    );
    describe_counter!(
        "ezshop_summarizer_total",
        "Summarizer invocations, by outcome (updated, unavailable)"
    );
    describe_counter!(
        "ezshop_persistence_failures_total",
        "Best-effort writes that failed after the reply was sent"
    );
}

pub fn record_turn(modality: &'static str, outcome: &'static str) {
    metrics::counter!("ezshop_turns_total", "modality" => modality, "outcome" => outcome)
        .increment(1);
}

pub fn record_turn_latency(seconds: f64) {
    metrics::histogram!("ezshop_turn_latency_seconds").record(seconds);
}

pub fn record_retrieval(outcome: &'static str) {
    metrics::counter!("ezshop_retrieval_total", "outcome" => outcome).increment(1);
}

pub fn record_summary_cache(result: &'static str) {
    metrics::counter!("ezshop_summary_cache_total", "result" => result).increment(1);
}

pub fn record_summarizer(outcome: &'static str) {
    metrics::counter!("ezshop_summarizer_total", "outcome" => outcome).increment(1);
}

pub fn record_persistence_failure(target: &'static str) {
    metrics::counter!("ezshop_persistence_failures_total", "target" => target).increment(1);
}
