use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::{interval, Duration, Instant};

use crate::benchmark::metrics::TimingMetrics;
use crate::control::pid::PidController;
use crate::ipc::channels::{ActuatorCommand, SystemChannels};
use crate::ipc::shared_resource::{DiagnosticLog, LatestSample};
use crate::safety::{SafetyMonitor, Verdict};

pub async fn control_task(
    mut pid: PidController,
    mut monitor: SafetyMonitor,
    channels: SystemChannels,
    latest: LatestSample,
    diagnostic_log: DiagnosticLog,
    metrics: TimingMetrics,
    interval_ms: u64,
    shutdown: Arc<AtomicBool>,
) {
    let mut ticker = interval(Duration::from_millis(interval_ms));

    loop {
        ticker.tick().await;
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        let reading = match latest.take() {
            Some(r) => r,
            None => continue,
        };

        let safety_start = Instant::now();
        let verdict = monitor.check(reading.voltage, reading.force, reading.elapsed_s);
        metrics.record_safety_check(safety_start.elapsed());

        if let Verdict::Unsafe(violation) = verdict {
            diagnostic_log.write(format!(
                "[SAFETY] abort at cycle #{}: {}",
                reading.sequence_id, violation
            ));
            let _ = channels.command_tx.try_send(ActuatorCommand {
                target_force_n: 0.0,
                cycle_id: reading.sequence_id,
            });
            shutdown.store(true, Ordering::Relaxed);
            break;
        }

        let control_start = Instant::now();
        let command = pid.update(reading.force);
        metrics.record_control(control_start.elapsed(), interval_ms * 1_000_000);

        let _ = channels.command_tx.try_send(ActuatorCommand {
            target_force_n: command,
            cycle_id: reading.sequence_id,
        });
        metrics.record_e2e(reading.timestamp.elapsed());
    }
}
