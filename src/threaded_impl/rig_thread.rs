use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::benchmark::metrics::TimingMetrics;
use crate::ipc::channels::SystemChannels;
use crate::ipc::shared_resource::{ConfigBuffer, DiagnosticLog, LatestSample};
use crate::sensor::filter::MovingAverageFilter;
use crate::sensor::rig::RigSimulator;

pub struct RigStats {
    pub samples: AtomicU64,
    pub shutdown: AtomicBool,
}

impl RigStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            samples: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        })
    }
}

/// Samples the rig at the configured interval, filters the readings, and
/// publishes them both to the reading channel and to the latest-sample
/// slot. Actuator commands arriving from the control thread are applied
/// to the simulated stack between samples.
pub fn spawn_rig_thread(
    mut rig: RigSimulator,
    filter_window: usize,
    channels: SystemChannels,
    latest: LatestSample,
    diagnostic_log: DiagnosticLog,
    config: ConfigBuffer,
    metrics: TimingMetrics,
) -> (thread::JoinHandle<()>, Arc<RigStats>) {
    let stats = RigStats::new();
    let stats_clone = stats.clone();

    let handle = thread::spawn(move || {
        let mut filter = MovingAverageFilter::new(filter_window);

        loop {
            if stats_clone.shutdown.load(Ordering::Relaxed) {
                break;
            }
            let cfg = config.get();
            let cycle_start = Instant::now();

            while let Ok(command) = channels.command_rx.try_recv() {
                rig.apply_command(command.target_force_n);
            }

            let acq_start = Instant::now();
            let reading = rig.sample();
            let filtered = filter.filter(&reading);
            metrics.record_acquisition(acq_start.elapsed());

            latest.publish(filtered);
            // Channel observers are best-effort; the latest-sample slot
            // is the control thread's source of truth.
            let _ = channels.reading_tx.try_send(filtered);

            let count = stats_clone.samples.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 100 == 0 {
                diagnostic_log.write(format!(
                    "[RIG] sample #{}: {:.3} V, {:.2} N",
                    filtered.sequence_id, filtered.voltage, filtered.force
                ));
            }

            let elapsed = cycle_start.elapsed();
            let interval = Duration::from_millis(cfg.control_interval_ms);
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            }
        }
    });

    (handle, stats)
}
