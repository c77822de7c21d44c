pub mod latency;

pub use latency::{ScanLatencyTracker, ScanStats};
