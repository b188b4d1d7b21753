use std::sync::Arc;
use std::time::Instant;

use crossbeam::channel::{bounded, Receiver, Sender};

use crate::sensor::rig::SensorReading;

/// Bounded channels wiring the rig thread to the control thread and the
/// control thread back to the rig (actuator commands) and to a
/// supervisor (feedback records).
#[derive(Clone)]
pub struct SystemChannels {
    pub reading_tx: Sender<SensorReading>,
    pub reading_rx: Arc<Receiver<SensorReading>>,

    pub command_tx: Sender<ActuatorCommand>,
    pub command_rx: Arc<Receiver<ActuatorCommand>>,

    pub feedback_tx: Sender<ControlFeedback>,
    pub feedback_rx: Arc<Receiver<ControlFeedback>>,
}

impl SystemChannels {
    pub fn new(buffer_size: usize) -> Self {
        let (reading_tx, reading_rx) = bounded(buffer_size);
        let (command_tx, command_rx) = bounded(buffer_size);
        let (feedback_tx, feedback_rx) = bounded(buffer_size);

        Self {
            reading_tx,
            reading_rx: Arc::new(reading_rx),
            command_tx,
            command_rx: Arc::new(command_rx),
            feedback_tx,
            feedback_rx: Arc::new(feedback_rx),
        }
    }
}

/// Force setpoint forwarded to the actuator driver.
#[derive(Clone, Copy, Debug)]
pub struct ActuatorCommand {
    pub target_force_n: f64,
    pub cycle_id: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlStatus {
    Normal,
    RateWarning,
    Tripped,
}

impl std::fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlStatus::Normal => write!(f, "Normal"),
            ControlStatus::RateWarning => write!(f, "RateWarning"),
            ControlStatus::Tripped => write!(f, "Tripped"),
        }
    }
}

/// Per-tick record emitted by the control thread.
#[derive(Clone, Copy, Debug)]
pub struct ControlFeedback {
    pub timestamp: Instant,
    pub error: f64,
    pub command: f64,
    pub status: ControlStatus,
    pub cycle_id: u64,
}
