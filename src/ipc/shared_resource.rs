use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::sensor::rig::SensorReading;

/// Single-slot cell holding the newest rig reading.
///
/// The rig thread publishes every sample; the control thread takes the
/// latest one each tick and ignores anything it missed. This replaces
/// the vendor-callback-mutates-a-shared-float pattern: the writer and
/// reader meet only at this lock.
#[derive(Clone, Default)]
pub struct LatestSample {
    slot: Arc<Mutex<Option<SensorReading>>>,
}

impl LatestSample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, reading: SensorReading) {
        *self.slot.lock() = Some(reading);
    }

    /// Remove and return the newest reading, if one arrived since the
    /// last take.
    pub fn take(&self) -> Option<SensorReading> {
        self.slot.lock().take()
    }

    /// Peek without consuming.
    pub fn peek(&self) -> Option<SensorReading> {
        *self.slot.lock()
    }
}

/// Bounded in-memory event log shared across threads. Safety trips and
/// experiment milestones land here for the post-run report.
#[derive(Clone)]
pub struct DiagnosticLog {
    entries: Arc<RwLock<VecDeque<String>>>,
    max_size: usize,
}

impl DiagnosticLog {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(max_size))),
            max_size,
        }
    }

    pub fn write(&self, message: String) {
        let mut log = self.entries.write();
        log.push_back(message);
        if log.len() > self.max_size {
            log.pop_front();
        }
    }

    pub fn read_all(&self) -> Vec<String> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Live experiment parameters shared between the supervisor and the
/// control thread; the setpoint can be retuned mid-run.
#[derive(Clone, Debug)]
pub struct LiveConfig {
    pub control_interval_ms: u64,
    pub target_force_n: f64,
    pub fail_safe_enabled: bool,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            control_interval_ms: 100,
            target_force_n: 50.0,
            fail_safe_enabled: true,
        }
    }
}

#[derive(Clone)]
pub struct ConfigBuffer {
    data: Arc<Mutex<LiveConfig>>,
}

impl ConfigBuffer {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(LiveConfig::default())),
        }
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut LiveConfig),
    {
        let mut config = self.data.lock();
        f(&mut *config);
    }

    pub fn get(&self) -> LiveConfig {
        self.data.lock().clone()
    }
}

impl Default for ConfigBuffer {
    fn default() -> Self {
        Self::new()
    }
}
