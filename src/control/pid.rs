use std::collections::VecDeque;

use crate::config::ConfigError;

/// Discrete PID controller with anti-windup back-calculation.
///
/// Runs on a fixed time step: one `update` call per control tick. The
/// integral accumulator and previous error persist across calls until
/// `reset` is called. Recent errors and outputs are kept in bounded
/// history buffers for post-experiment inspection; they take no part in
/// the control math.
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    setpoint: f64,
    dt: f64,
    output_limits: Option<(f64, f64)>,

    integral: f64,
    prev_error: f64,
    last_output: f64,

    error_history: VecDeque<f64>,
    output_history: VecDeque<f64>,
    max_history: usize,
}

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

impl PidController {
    /// Build a controller. `dt` is the control interval in seconds and
    /// must be positive; the derivative term divides by it.
    pub fn new(
        kp: f64,
        ki: f64,
        kd: f64,
        setpoint: f64,
        dt: f64,
        output_limits: Option<(f64, f64)>,
    ) -> Result<Self, ConfigError> {
        if !(dt > 0.0) {
            return Err(ConfigError::InvalidTimeStep(dt));
        }
        if let Some((min, max)) = output_limits {
            if min > max {
                return Err(ConfigError::InvalidOutputLimits(min, max));
            }
        }
        Ok(Self {
            kp,
            ki,
            kd,
            setpoint,
            dt,
            output_limits,
            integral: 0.0,
            prev_error: 0.0,
            last_output: 0.0,
            error_history: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY),
            output_history: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY),
            max_history: DEFAULT_HISTORY_CAPACITY,
        })
    }

    /// Override the history buffer capacity (default 100).
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.max_history = capacity.max(1);
        self
    }

    /// Compute the control output for one tick.
    pub fn update(&mut self, measured_value: f64) -> f64 {
        let error = self.setpoint - measured_value;
        push_bounded(&mut self.error_history, error, self.max_history);

        let p = self.kp * error;

        self.integral += error * self.dt;
        let i = self.ki * self.integral;

        let d = self.kd * (error - self.prev_error) / self.dt;

        let mut output = p + i + d;

        if let Some((min, max)) = self.output_limits {
            let clamped = output.clamp(min, max);
            if output != clamped && self.ki != 0.0 {
                // Back-calculate: unwind the portion of the integral that
                // pushed the output past the saturation bound.
                self.integral -= (output - clamped) * self.dt / self.ki;
            }
            output = clamped;
        }

        self.prev_error = error;
        self.last_output = output;
        push_bounded(&mut self.output_history, output, self.max_history);

        output
    }

    /// Zero the integral accumulator, previous error and history buffers.
    /// Gains, setpoint and limits are untouched.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.last_output = 0.0;
        self.error_history.clear();
        self.output_history.clear();
    }

    /// Update any subset of the gains in place. `None` keeps the current
    /// value. Takes effect on the next `update` call.
    pub fn set_tunings(&mut self, kp: Option<f64>, ki: Option<f64>, kd: Option<f64>) {
        if let Some(kp) = kp {
            self.kp = kp;
        }
        if let Some(ki) = ki {
            self.ki = ki;
        }
        if let Some(kd) = kd {
            self.kd = kd;
        }
    }

    /// Replace the target value. Integral state carries over unchanged.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn previous_error(&self) -> f64 {
        self.prev_error
    }

    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    pub fn error_history(&self) -> &VecDeque<f64> {
        &self.error_history
    }

    pub fn output_history(&self) -> &VecDeque<f64> {
        &self.output_history
    }
}

fn push_bounded(buf: &mut VecDeque<f64>, value: f64, capacity: usize) {
    buf.push_back(value);
    if buf.len() > capacity {
        buf.pop_front();
    }
}
