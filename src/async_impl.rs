//! Tokio variant of the experiment loop, for embedding in async hosts.
//! Same core calls as `threaded_impl`, paced by `tokio::time::interval`.

pub mod control_task;
pub mod rig_task;
