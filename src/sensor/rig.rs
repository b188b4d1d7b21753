use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One synchronized sample from the test stack: potentiostat cell
/// voltage, load-cell force and thermocouple temperature.
#[derive(Debug, Clone, Copy)]
pub struct SensorReading {
    pub timestamp: Instant,
    /// Seconds since the rig started sampling; the timebase used by the
    /// safety monitor's rate checks.
    pub elapsed_s: f64,
    pub voltage: f64,
    pub force: f64,
    pub temperature: f64,
    pub sequence_id: u64,
}

/// Simulated compression rig standing in for the hardware stack.
///
/// The stack force follows the commanded force with a first-order lag,
/// the cell voltage ramps at a configurable charge rate, and seeded noise
/// rides on both so filter and safety behavior can be exercised
/// deterministically.
pub struct RigSimulator {
    rng: StdRng,
    started: Instant,
    sequence_counter: u64,
    sample_interval_s: f64,

    cell_voltage: f64,
    stack_force: f64,
    commanded_force: f64,
    base_temp: f64,

    pub charge_rate_v_per_s: f64,
    /// Fraction of the force error closed per sample.
    pub force_response: f64,
    pub voltage_noise: f64,
    pub force_noise: f64,
}

impl RigSimulator {
    pub fn new(seed: u64, sample_interval_s: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            started: Instant::now(),
            sequence_counter: 0,
            sample_interval_s,
            cell_voltage: 3.2,
            stack_force: 0.0,
            commanded_force: 0.0,
            base_temp: 25.0,
            charge_rate_v_per_s: 0.001,
            force_response: 0.2,
            voltage_noise: 0.002,
            force_noise: 0.5,
        }
    }

    pub fn sample(&mut self) -> SensorReading {
        self.sequence_counter += 1;

        self.cell_voltage += self.charge_rate_v_per_s * self.sample_interval_s;
        self.stack_force += (self.commanded_force - self.stack_force) * self.force_response;

        SensorReading {
            timestamp: Instant::now(),
            elapsed_s: self.started.elapsed().as_secs_f64(),
            voltage: self.cell_voltage + self.noise(self.voltage_noise),
            force: self.stack_force + self.noise(self.force_noise),
            temperature: self.base_temp + self.noise(0.1),
            sequence_id: self.sequence_counter,
        }
    }

    /// Forward an actuator command: the simulated stack force starts
    /// converging toward this target on subsequent samples.
    pub fn apply_command(&mut self, target_force_n: f64) {
        self.commanded_force = target_force_n;
    }

    /// Step-change the underlying state, bypassing the lag. Used by
    /// fault-injection tests to provoke safety trips.
    pub fn inject_disturbance(&mut self, voltage_delta: f64, force_delta: f64) {
        self.cell_voltage += voltage_delta;
        self.stack_force += force_delta;
    }

    pub fn sequence(&self) -> u64 {
        self.sequence_counter
    }

    fn noise(&mut self, amplitude: f64) -> f64 {
        if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..amplitude)
        } else {
            0.0
        }
    }
}
