use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hdrhistogram::Histogram;
use parking_lot::Mutex;

/// Thread-safe latency histograms for the phases of one control tick:
/// sample acquisition on the rig thread, safety check and PID compute on
/// the control thread, and sample-to-command end-to-end.
#[derive(Clone)]
pub struct TimingMetrics {
    acquisition_hist: Arc<Mutex<Histogram<u64>>>,
    safety_hist: Arc<Mutex<Histogram<u64>>>,
    control_hist: Arc<Mutex<Histogram<u64>>>,
    e2e_hist: Arc<Mutex<Histogram<u64>>>,
    missed_deadlines: Arc<AtomicU64>,
    rate_warnings: Arc<AtomicU64>,
}

impl TimingMetrics {
    pub fn new() -> Self {
        Self {
            acquisition_hist: Arc::new(Mutex::new(Histogram::new(3).unwrap())),
            safety_hist: Arc::new(Mutex::new(Histogram::new(3).unwrap())),
            control_hist: Arc::new(Mutex::new(Histogram::new(3).unwrap())),
            e2e_hist: Arc::new(Mutex::new(Histogram::new(3).unwrap())),
            missed_deadlines: Arc::new(AtomicU64::new(0)),
            rate_warnings: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_acquisition(&self, duration: Duration) {
        self.acquisition_hist.lock().record(duration.as_nanos() as u64).ok();
    }

    pub fn record_safety_check(&self, duration: Duration) {
        self.safety_hist.lock().record(duration.as_nanos() as u64).ok();
    }

    pub fn record_control(&self, duration: Duration, deadline_ns: u64) {
        let nanos = duration.as_nanos() as u64;
        self.control_hist.lock().record(nanos).ok();
        if nanos > deadline_ns {
            self.missed_deadlines.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_e2e(&self, duration: Duration) {
        self.e2e_hist.lock().record(duration.as_nanos() as u64).ok();
    }

    pub fn record_rate_warning(&self) {
        self.rate_warnings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self) -> MetricsReport {
        let acq = self.acquisition_hist.lock();
        let safety = self.safety_hist.lock();
        let control = self.control_hist.lock();
        let e2e = self.e2e_hist.lock();

        MetricsReport {
            acquisition_p50: Duration::from_nanos(acq.value_at_quantile(0.5)),
            acquisition_p99: Duration::from_nanos(acq.value_at_quantile(0.99)),
            safety_p50: Duration::from_nanos(safety.value_at_quantile(0.5)),
            safety_p99: Duration::from_nanos(safety.value_at_quantile(0.99)),
            control_p50: Duration::from_nanos(control.value_at_quantile(0.5)),
            control_p99: Duration::from_nanos(control.value_at_quantile(0.99)),
            e2e_p50: Duration::from_nanos(e2e.value_at_quantile(0.5)),
            e2e_p99: Duration::from_nanos(e2e.value_at_quantile(0.99)),
            missed_deadlines: self.missed_deadlines.load(Ordering::Relaxed),
            rate_warnings: self.rate_warnings.load(Ordering::Relaxed),
        }
    }
}

impl Default for TimingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MetricsReport {
    pub acquisition_p50: Duration,
    pub acquisition_p99: Duration,
    pub safety_p50: Duration,
    pub safety_p99: Duration,
    pub control_p50: Duration,
    pub control_p99: Duration,
    pub e2e_p50: Duration,
    pub e2e_p99: Duration,
    pub missed_deadlines: u64,
    pub rate_warnings: u64,
}
