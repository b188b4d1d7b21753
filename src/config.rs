//! Runtime configuration loaded from TOML, with typed validation errors.

use serde::Deserialize;
use thiserror::Error;

use crate::control::pid::PidController;
use crate::safety::SafetyLimits;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("time step must be positive, got {0}")]
    InvalidTimeStep(f64),
    #[error("output limits are inverted: min {0} > max {1}")]
    InvalidOutputLimits(f64, f64),
    #[error("window size must be at least 1")]
    InvalidWindowSize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub control_interval_ms: u64,
    pub experiment_duration_s: u64,
    /// When true, a safety trip commands zero force before stopping.
    pub fail_safe_enabled: bool,
    pub filter_window: usize,
    pub pid: PidSettings,
    pub safety: SafetySettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            control_interval_ms: 100,
            experiment_duration_s: 10,
            fail_safe_enabled: true,
            filter_window: 5,
            pid: PidSettings::default(),
            safety: SafetySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PidSettings {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint_n: f64,
    pub time_step_s: f64,
    pub output_limits_n: Option<[f64; 2]>,
    pub history_capacity: usize,
}

impl Default for PidSettings {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.1,
            kd: 0.01,
            setpoint_n: 50.0,
            time_step_s: 0.1,
            output_limits_n: Some([0.0, 200.0]),
            history_capacity: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SafetySettings {
    pub max_voltage_v: f64,
    pub max_force_n: f64,
    pub max_voltage_rate_v_per_s: f64,
    pub max_force_rate_n_per_s: f64,
    pub window_size: usize,
    pub max_consecutive_warnings: u32,
    pub history_capacity: usize,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            max_voltage_v: 4.3,
            max_force_n: 100.0,
            max_voltage_rate_v_per_s: 0.2,
            max_force_rate_n_per_s: 10.0,
            window_size: 5,
            max_consecutive_warnings: 3,
            history_capacity: 100,
        }
    }
}

impl RuntimeConfig {
    /// Build the force PID from the configured tunings.
    pub fn controller(&self) -> Result<PidController, ConfigError> {
        let limits = self.pid.output_limits_n.map(|[min, max]| (min, max));
        let pid = PidController::new(
            self.pid.kp,
            self.pid.ki,
            self.pid.kd,
            self.pid.setpoint_n,
            self.pid.time_step_s,
            limits,
        )?;
        Ok(pid.with_history_capacity(self.pid.history_capacity))
    }

    pub fn safety_limits(&self) -> Result<SafetyLimits, ConfigError> {
        if self.safety.window_size == 0 {
            return Err(ConfigError::InvalidWindowSize);
        }
        Ok(SafetyLimits {
            max_voltage: self.safety.max_voltage_v,
            max_force: self.safety.max_force_n,
            max_voltage_rate: self.safety.max_voltage_rate_v_per_s,
            max_force_rate: self.safety.max_force_rate_n_per_s,
            window_size: self.safety.window_size,
            max_consecutive_warnings: self.safety.max_consecutive_warnings,
            history_capacity: self.safety.history_capacity,
        })
    }
}

/// Read a TOML config file, falling back to defaults when the file is
/// missing or malformed.
pub fn load_config(path: &str) -> RuntimeConfig {
    match std::fs::read_to_string(path) {
        Ok(s) => toml::from_str::<RuntimeConfig>(&s).unwrap_or_default(),
        Err(_) => RuntimeConfig::default(),
    }
}
