//! Threaded experiment loop - one rig thread, one control thread

pub mod control_thread;
pub mod rig_thread;
