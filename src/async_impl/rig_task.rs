use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::{interval, Duration, Instant};

use crate::benchmark::metrics::TimingMetrics;
use crate::ipc::channels::SystemChannels;
use crate::ipc::shared_resource::LatestSample;
use crate::sensor::filter::MovingAverageFilter;
use crate::sensor::rig::RigSimulator;

pub async fn rig_task(
    mut rig: RigSimulator,
    filter_window: usize,
    channels: SystemChannels,
    latest: LatestSample,
    metrics: TimingMetrics,
    interval_ms: u64,
    shutdown: Arc<AtomicBool>,
) {
    let mut filter = MovingAverageFilter::new(filter_window);
    let mut ticker = interval(Duration::from_millis(interval_ms));

    loop {
        ticker.tick().await;
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        while let Ok(command) = channels.command_rx.try_recv() {
            rig.apply_command(command.target_force_n);
        }

        let acq_start = Instant::now();
        let reading = rig.sample();
        let filtered = filter.filter(&reading);
        metrics.record_acquisition(acq_start.elapsed());

        latest.publish(filtered);
        let _ = channels.reading_tx.try_send(filtered);
    }
}
