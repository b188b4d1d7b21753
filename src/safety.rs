//! Safety monitor - absolute and rate-of-change supervision of cell
//! voltage and stack force.
//!
//! Two layers of protection: a hard instantaneous limit on |voltage| and
//! |force| that trips on a single sample, and a rate check that compares
//! the current sample against one a fixed number of samples back and only
//! escalates after several consecutive violations. Once tripped the
//! monitor stays unsafe until `acknowledge` is called.

use std::collections::VecDeque;
use std::fmt;

/// Thresholds for the safety monitor. Voltages in volts, forces in
/// newtons, rates in units per second, timestamps in seconds.
#[derive(Debug, Clone, Copy)]
pub struct SafetyLimits {
    pub max_voltage: f64,
    pub max_force: f64,
    pub max_voltage_rate: f64,
    pub max_force_rate: f64,
    /// Number of samples between the two points of the rate comparison.
    pub window_size: usize,
    /// Consecutive rate violations tolerated before latching unsafe.
    pub max_consecutive_warnings: u32,
    pub history_capacity: usize,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_voltage: 5.0,
            max_force: 100.0,
            max_voltage_rate: 0.5,
            max_force_rate: 10.0,
            window_size: 5,
            max_consecutive_warnings: 3,
            history_capacity: 100,
        }
    }
}

/// The specific limit a sample violated, with the observed value so the
/// caller can log `observed vs. limit` for post-mortem diagnosis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Violation {
    OverVoltage { value: f64, limit: f64 },
    OverForce { value: f64, limit: f64 },
    VoltageRate { rate: f64, limit: f64 },
    ForceRate { rate: f64, limit: f64 },
    SustainedRate { warnings: u32 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::OverVoltage { value, limit } => {
                write!(f, "voltage {:.3} V exceeds limit {:.3} V", value, limit)
            }
            Violation::OverForce { value, limit } => {
                write!(f, "force {:.2} N exceeds limit {:.2} N", value, limit)
            }
            Violation::VoltageRate { rate, limit } => {
                write!(f, "voltage rate {:.3} V/s exceeds limit {:.3} V/s", rate, limit)
            }
            Violation::ForceRate { rate, limit } => {
                write!(f, "force rate {:.2} N/s exceeds limit {:.2} N/s", rate, limit)
            }
            Violation::SustainedRate { warnings } => {
                write!(f, "{} consecutive rate violations", warnings)
            }
        }
    }
}

/// Outcome of a single `check` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Safe,
    Unsafe(Violation),
}

impl Verdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, Verdict::Safe)
    }

    pub fn violation(&self) -> Option<Violation> {
        match self {
            Verdict::Safe => None,
            Verdict::Unsafe(v) => Some(*v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    voltage: f64,
    force: f64,
    timestamp: f64,
}

pub struct SafetyMonitor {
    limits: SafetyLimits,
    history: VecDeque<Sample>,
    consecutive_warnings: u32,
    is_safe: bool,
    last_violation: Option<Violation>,
}

impl SafetyMonitor {
    pub fn new(limits: SafetyLimits) -> Self {
        Self {
            history: VecDeque::with_capacity(limits.history_capacity),
            limits,
            consecutive_warnings: 0,
            is_safe: true,
            last_violation: None,
        }
    }

    /// Ingest one sample and return the safety verdict.
    ///
    /// The absolute check trips immediately and latches; it skips the
    /// rate machinery entirely, leaving the warning counter as it was.
    /// The rate check needs more than `window_size` samples of history
    /// and is skipped when the timestamps `window_size` apart are not
    /// strictly increasing.
    pub fn check(&mut self, voltage: f64, force: f64, timestamp: f64) -> Verdict {
        if self.history.len() == self.limits.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(Sample {
            voltage,
            force,
            timestamp,
        });

        if voltage.abs() > self.limits.max_voltage {
            return self.trip(Violation::OverVoltage {
                value: voltage,
                limit: self.limits.max_voltage,
            });
        }
        if force.abs() > self.limits.max_force {
            return self.trip(Violation::OverForce {
                value: force,
                limit: self.limits.max_force,
            });
        }

        match self.rate_violation(voltage, force, timestamp) {
            Some(violation) => {
                self.consecutive_warnings += 1;
                self.last_violation = Some(violation);
                if self.consecutive_warnings >= self.limits.max_consecutive_warnings {
                    let warnings = self.consecutive_warnings;
                    return self.trip(Violation::SustainedRate { warnings });
                }
            }
            None => self.consecutive_warnings = 0,
        }

        if self.is_safe {
            Verdict::Safe
        } else {
            // Latched by an earlier call; keep reporting the cause.
            Verdict::Unsafe(self.last_violation.unwrap_or(Violation::SustainedRate {
                warnings: self.consecutive_warnings,
            }))
        }
    }

    fn trip(&mut self, violation: Violation) -> Verdict {
        self.is_safe = false;
        self.last_violation = Some(violation);
        Verdict::Unsafe(violation)
    }

    fn rate_violation(&self, voltage: f64, force: f64, timestamp: f64) -> Option<Violation> {
        let len = self.history.len();
        if len <= self.limits.window_size {
            return None;
        }
        let past = &self.history[len - self.limits.window_size];

        let dt = timestamp - past.timestamp;
        if dt <= 0.0 {
            // Duplicate or out-of-order timestamps are a sampling
            // artifact, not an unsafe condition.
            return None;
        }

        let voltage_rate = (voltage - past.voltage).abs() / dt;
        if voltage_rate > self.limits.max_voltage_rate {
            return Some(Violation::VoltageRate {
                rate: voltage_rate,
                limit: self.limits.max_voltage_rate,
            });
        }

        let force_rate = (force - past.force).abs() / dt;
        if force_rate > self.limits.max_force_rate {
            return Some(Violation::ForceRate {
                rate: force_rate,
                limit: self.limits.max_force_rate,
            });
        }

        None
    }

    /// Whether the monitor is currently latched safe.
    pub fn is_safe(&self) -> bool {
        self.is_safe
    }

    /// Back-to-back rate violations seen so far.
    pub fn consecutive_warnings(&self) -> u32 {
        self.consecutive_warnings
    }

    /// Cause of the current latch, if any.
    pub fn last_violation(&self) -> Option<Violation> {
        self.last_violation
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Supervised recovery: clear the latch, the warning counter and the
    /// sample history. Meant for an operator who has inspected the trip,
    /// not for automatic retry; `check` never un-latches on its own.
    pub fn acknowledge(&mut self) {
        self.is_safe = true;
        self.consecutive_warnings = 0;
        self.last_violation = None;
        self.history.clear();
    }
}
