use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use cell_press_control::benchmark::metrics::TimingMetrics;
use cell_press_control::ipc::shared_resource::{ConfigBuffer, DiagnosticLog, LatestSample};
use cell_press_control::threaded_impl::{control_thread, rig_thread};
use cell_press_control::visualization::dashboard::render_report_charts;
use cell_press_control::{load_config, RigSimulator, SafetyMonitor, SystemChannels};

fn main() {
    println!("===========================================");
    println!("Starting Cell Press Control Loop");
    println!("===========================================\n");

    let file_cfg = load_config("config/system_config.toml");

    let pid = match file_cfg.controller() {
        Ok(pid) => pid,
        Err(e) => {
            eprintln!("Invalid PID configuration: {}", e);
            std::process::exit(1);
        }
    };
    let limits = match file_cfg.safety_limits() {
        Ok(limits) => limits,
        Err(e) => {
            eprintln!("Invalid safety configuration: {}", e);
            std::process::exit(1);
        }
    };
    let monitor = SafetyMonitor::new(limits);

    let cfg_buf = ConfigBuffer::new();
    cfg_buf.update(|cfg| {
        cfg.control_interval_ms = file_cfg.control_interval_ms;
        cfg.target_force_n = file_cfg.pid.setpoint_n;
        cfg.fail_safe_enabled = file_cfg.fail_safe_enabled;
    });

    let channels = SystemChannels::new(256);
    let latest = LatestSample::new();
    let diagnostic_log = DiagnosticLog::new(2000);
    let metrics = TimingMetrics::new();

    let rig = RigSimulator::new(42, file_cfg.control_interval_ms as f64 / 1000.0);

    let (rig_handle, rig_stats) = rig_thread::spawn_rig_thread(
        rig,
        file_cfg.filter_window,
        channels.clone(),
        latest.clone(),
        diagnostic_log.clone(),
        cfg_buf.clone(),
        metrics.clone(),
    );
    let (control_handle, control_stats) = control_thread::spawn_control_thread(
        pid,
        monitor,
        channels.clone(),
        latest.clone(),
        diagnostic_log.clone(),
        cfg_buf.clone(),
        metrics.clone(),
    );

    println!(
        "Regulating to {:.1} N for up to {} s...\n",
        file_cfg.pid.setpoint_n, file_cfg.experiment_duration_s
    );

    // Run until the duration elapses or the control thread aborts.
    let deadline = Instant::now() + Duration::from_secs(file_cfg.experiment_duration_s);
    while Instant::now() < deadline {
        if control_stats.aborted.load(Ordering::Relaxed) {
            println!("Safety abort detected, stopping early.");
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    println!("\n===========================================");
    println!("Experiment finished - initiating shutdown");
    rig_stats.shutdown.store(true, Ordering::Relaxed);
    control_stats.shutdown.store(true, Ordering::Relaxed);

    let _ = rig_handle.join();
    let _ = control_handle.join();

    let samples = rig_stats.samples.load(Ordering::Relaxed);
    let cycles = control_stats.cycles.load(Ordering::Relaxed);
    let warnings = control_stats.rate_warnings.load(Ordering::Relaxed);
    let missed = control_stats.missed_deadlines.load(Ordering::Relaxed);
    let aborted = control_stats.aborted.load(Ordering::Relaxed);

    println!("\nRig samples:        {}", samples);
    println!("Control cycles:     {}", cycles);
    println!("Rate warnings:      {}", warnings);
    println!("Missed deadlines:   {}", missed);
    println!(
        "Safety outcome:     {}",
        if aborted { "TRIPPED" } else { "clean" }
    );

    let report = metrics.report();
    println!("\n{:#?}", report);
    render_report_charts(&report);

    println!("\nDiagnostic log (most recent):");
    let entries = diagnostic_log.read_all();
    for line in entries.iter().rev().take(10).rev() {
        println!("  {}", line);
    }
}
