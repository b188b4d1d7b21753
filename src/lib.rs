pub mod async_impl;
pub mod benchmark;
pub mod config;
pub mod control;
pub mod ipc;
pub mod safety;
pub mod sensor;
pub mod threaded_impl;
pub mod visualization;

pub use config::{load_config, ConfigError, RuntimeConfig};
pub use control::pid::PidController;
pub use ipc::channels::{ActuatorCommand, ControlFeedback, ControlStatus, SystemChannels};
pub use ipc::shared_resource::{ConfigBuffer, DiagnosticLog, LatestSample};
pub use safety::{SafetyLimits, SafetyMonitor, Verdict, Violation};
pub use sensor::filter::MovingAverageFilter;
pub use sensor::rig::{RigSimulator, SensorReading};
