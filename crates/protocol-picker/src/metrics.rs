//! Picker metrics.
//!
//! Every event is published through the `metrics` facade and mirrored in
//! atomic counters so callers without an installed recorder can still read
//! a [`PickerMetricsSnapshot`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::Serialize;

use crate::decision::Decision;

#[derive(Debug)]
pub struct PickerMetrics {
    only_candidate: AtomicU64,
    explore: AtomicU64,
    exploit: AtomicU64,
    no_suitable: AtomicU64,

    requests: AtomicU64,
    request_failures: AtomicU64,
    /// Total request time in microseconds
    request_time_us: AtomicU64,

    start_time: Instant,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickerMetricsSnapshot {
    pub selections_total: u64,
    pub only_candidate: u64,
    pub explore: u64,
    pub exploit: u64,
    pub no_suitable: u64,
    pub requests: u64,
    pub request_failures: u64,
    pub avg_request_ms: f64,
    pub uptime_secs: u64,
}

impl PickerMetrics {
    pub fn new() -> Self {
        Self {
            only_candidate: AtomicU64::new(0),
            explore: AtomicU64::new(0),
            exploit: AtomicU64::new(0),
            no_suitable: AtomicU64::new(0),
            requests: AtomicU64::new(0),
            request_failures: AtomicU64::new(0),
            request_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record which branch a selection took.
    pub fn record_selection(&self, decision: Decision) {
        let slot = match decision {
            Decision::NoSuitable => {
                counter!("protocol_no_suitable_total").increment(1);
                &self.no_suitable
            }
            Decision::OnlyCandidate => &self.only_candidate,
            Decision::Explore => &self.explore,
            Decision::Exploit => &self.exploit,
        };
        slot.fetch_add(1, Ordering::Relaxed);
        counter!("protocol_selections_total", "decision" => decision.as_str()).increment(1);
    }

    /// Record a successful request through `protocol`.
    pub fn record_request(&self, protocol: &str, elapsed: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.request_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        histogram!("protocol_request_seconds", "protocol" => protocol.to_string())
            .record(elapsed.as_secs_f64());
    }

    /// Record a failed request through `protocol`.
    pub fn record_request_failure(&self, protocol: &str) {
        self.request_failures.fetch_add(1, Ordering::Relaxed);
        counter!("protocol_request_failures_total", "protocol" => protocol.to_string())
            .increment(1);
    }

    pub fn snapshot(&self) -> PickerMetricsSnapshot {
        let only_candidate = self.only_candidate.load(Ordering::Relaxed);
        let explore = self.explore.load(Ordering::Relaxed);
        let exploit = self.exploit.load(Ordering::Relaxed);
        let no_suitable = self.no_suitable.load(Ordering::Relaxed);
        let requests = self.requests.load(Ordering::Relaxed);
        let total_us = self.request_time_us.load(Ordering::Relaxed);

        PickerMetricsSnapshot {
            selections_total: only_candidate + explore + exploit + no_suitable,
            only_candidate,
            explore,
            exploit,
            no_suitable,
            requests,
            request_failures: self.request_failures.load(Ordering::Relaxed),
            avg_request_ms: if requests == 0 {
                0.0
            } else {
                (total_us as f64 / requests as f64) / 1000.0
            },
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for PickerMetrics {
    fn default() -> Self {
        Self::new()
    }
}
