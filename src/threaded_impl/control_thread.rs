use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::benchmark::metrics::TimingMetrics;
use crate::control::pid::PidController;
use crate::ipc::channels::{ActuatorCommand, ControlFeedback, ControlStatus, SystemChannels};
use crate::ipc::shared_resource::{ConfigBuffer, DiagnosticLog, LatestSample};
use crate::safety::{SafetyMonitor, Verdict};

pub struct ControlStats {
    pub cycles: AtomicU64,
    pub rate_warnings: AtomicU64,
    pub missed_deadlines: AtomicU64,
    pub aborted: AtomicBool,
    pub shutdown: AtomicBool,
}

impl ControlStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cycles: AtomicU64::new(0),
            rate_warnings: AtomicU64::new(0),
            missed_deadlines: AtomicU64::new(0),
            aborted: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        })
    }
}

/// The tick loop: drain the newest reading, run the safety check, and on
/// a safe verdict feed the force measurement to the PID and forward the
/// bounded command to the actuator. A safety trip logs the violation,
/// releases the stack (when fail-safe is enabled) and ends the loop.
pub fn spawn_control_thread(
    mut pid: PidController,
    mut monitor: SafetyMonitor,
    channels: SystemChannels,
    latest: LatestSample,
    diagnostic_log: DiagnosticLog,
    config: ConfigBuffer,
    metrics: TimingMetrics,
) -> (thread::JoinHandle<()>, Arc<ControlStats>) {
    let stats = ControlStats::new();
    let stats_clone = stats.clone();

    let handle = thread::spawn(move || {
        let mut prev_warnings = 0u32;

        loop {
            if stats_clone.shutdown.load(Ordering::Relaxed) {
                break;
            }
            let cfg = config.get();
            let cycle_start = Instant::now();
            let interval = Duration::from_millis(cfg.control_interval_ms);

            let reading = match latest.take() {
                Some(r) => r,
                None => {
                    thread::sleep(interval / 4);
                    continue;
                }
            };
            let cycle_id = reading.sequence_id;
            stats_clone.cycles.fetch_add(1, Ordering::Relaxed);

            let safety_start = Instant::now();
            let verdict = monitor.check(reading.voltage, reading.force, reading.elapsed_s);
            metrics.record_safety_check(safety_start.elapsed());

            let warnings = monitor.consecutive_warnings();
            let mut status = ControlStatus::Normal;
            if warnings > prev_warnings {
                stats_clone.rate_warnings.fetch_add(1, Ordering::Relaxed);
                metrics.record_rate_warning();
                status = ControlStatus::RateWarning;
                if let Some(violation) = monitor.last_violation() {
                    diagnostic_log.write(format!(
                        "[SAFETY] warning {}/{}: {}",
                        warnings,
                        monitor.limits().max_consecutive_warnings,
                        violation
                    ));
                }
            }
            prev_warnings = warnings;

            if let Verdict::Unsafe(violation) = verdict {
                diagnostic_log.write(format!("[SAFETY] abort at cycle #{}: {}", cycle_id, violation));
                if cfg.fail_safe_enabled {
                    // Release the stack before stopping.
                    let _ = channels.command_tx.try_send(ActuatorCommand {
                        target_force_n: 0.0,
                        cycle_id,
                    });
                }
                let _ = channels.feedback_tx.try_send(ControlFeedback {
                    timestamp: Instant::now(),
                    error: pid.previous_error(),
                    command: 0.0,
                    status: ControlStatus::Tripped,
                    cycle_id,
                });
                stats_clone.aborted.store(true, Ordering::Relaxed);
                break;
            }

            pid.set_setpoint(cfg.target_force_n);

            let control_start = Instant::now();
            let command = pid.update(reading.force);
            metrics.record_control(control_start.elapsed(), interval.as_nanos() as u64);

            if channels
                .command_tx
                .try_send(ActuatorCommand {
                    target_force_n: command,
                    cycle_id,
                })
                .is_err()
            {
                diagnostic_log.write("[CONTROL] command channel full, dropping tick".to_string());
            }

            let _ = channels.feedback_tx.try_send(ControlFeedback {
                timestamp: Instant::now(),
                error: pid.previous_error(),
                command,
                status,
                cycle_id,
            });

            metrics.record_e2e(reading.timestamp.elapsed());

            let elapsed = cycle_start.elapsed();
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            } else {
                stats_clone.missed_deadlines.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    (handle, stats)
}
