//! Benchmark module - tick latency tracking and post-run analysis

pub mod analysis;
pub mod metrics;
