use hdrhistogram::{CreationError, Histogram};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use crate::models::{ScanOutcome, ScanReport};

/// Fulfillment-pass statistics backed by HDR histograms
pub struct ScanLatencyTracker {
    /// Wall time of each trade callback, fills included
    pass_latency_ns: Histogram<u64>,

    /// Fills executed per pass
    fills_per_pass: Histogram<u64>,

    passes: u64,
    fills: u64,
    unchanged: u64,
    budget_exceeded: u64,
    absorbed: u64,
    failed: u64,
}

impl ScanLatencyTracker {
    pub fn new() -> Result<Self, CreationError> {
        // 1ns to 10 seconds, 3 significant figures
        Ok(Self {
            pass_latency_ns: Histogram::new_with_bounds(1, 10_000_000_000, 3)?,
            fills_per_pass: Histogram::new(3)?,
            passes: 0,
            fills: 0,
            unchanged: 0,
            budget_exceeded: 0,
            absorbed: 0,
            failed: 0,
        })
    }

    /// Record a finished pass
    pub fn record_pass(&mut self, report: &ScanReport, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX).max(1);
        self.pass_latency_ns.saturating_record(nanos);
        let _ = self.fills_per_pass.record(report.fills.len() as u64);
        self.passes += 1;
        self.fills += report.fills.len() as u64;

        match report.outcome {
            ScanOutcome::Unchanged => self.unchanged += 1,
            ScanOutcome::BudgetExceeded => self.budget_exceeded += 1,
            ScanOutcome::Absorbed => self.absorbed += 1,
            ScanOutcome::Completed => {}
        }
    }

    /// Record a pass that was rolled back
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn stats(&self) -> ScanStats {
        ScanStats {
            passes: self.passes,
            unchanged: self.unchanged,
            budget_exceeded: self.budget_exceeded,
            absorbed: self.absorbed,
            failed: self.failed,
            total_fills: self.fills,
            max_fills_per_pass: self.fills_per_pass.max(),
            p50_ns: self.pass_latency_ns.value_at_percentile(50.0),
            p95_ns: self.pass_latency_ns.value_at_percentile(95.0),
            p99_ns: self.pass_latency_ns.value_at_percentile(99.0),
            max_ns: self.pass_latency_ns.max(),
            mean_ns: self.pass_latency_ns.mean(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScanStats {
    pub passes: u64,
    pub unchanged: u64,
    pub budget_exceeded: u64,
    pub absorbed: u64,
    pub failed: u64,
    pub total_fills: u64,
    pub max_fills_per_pass: u64,
    pub p50_ns: u64,
    pub p95_ns: u64,
    pub p99_ns: u64,
    pub max_ns: u64,
    pub mean_ns: f64,
}

impl ScanStats {
    /// Convert nanoseconds to microseconds for display
    pub fn p50_us(&self) -> f64 {
        self.p50_ns as f64 / 1000.0
    }

    pub fn p99_us(&self) -> f64 {
        self.p99_ns as f64 / 1000.0
    }
}
