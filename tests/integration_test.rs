//! Integration tests for the cell press control core

use cell_press_control::{
    ConfigError, LatestSample, MovingAverageFilter, PidController, RigSimulator, RuntimeConfig,
    SafetyLimits, SafetyMonitor, SystemChannels, Verdict, Violation,
};
use std::time::Duration;

const TOL: f64 = 1e-9;

fn rate_limits(window_size: usize) -> SafetyLimits {
    // Absolute limits far out of the way so only the rate path fires.
    SafetyLimits {
        max_voltage: 50.0,
        max_force: 1000.0,
        max_voltage_rate: 0.1,
        max_force_rate: 1000.0,
        window_size,
        max_consecutive_warnings: 3,
        history_capacity: 100,
    }
}

// ============================================================================
// PID CONTROLLER TESTS
// ============================================================================

#[test]
fn test_pid_rejects_bad_time_step() {
    assert_eq!(
        PidController::new(1.0, 0.0, 0.0, 0.0, 0.0, None).err(),
        Some(ConfigError::InvalidTimeStep(0.0))
    );
    assert!(PidController::new(1.0, 0.0, 0.0, 0.0, -0.1, None).is_err());
    assert!(PidController::new(1.0, 0.0, 0.0, 0.0, f64::NAN, None).is_err());
}

#[test]
fn test_pid_rejects_inverted_output_limits() {
    assert_eq!(
        PidController::new(1.0, 0.0, 0.0, 0.0, 0.1, Some((10.0, -10.0))).err(),
        Some(ConfigError::InvalidOutputLimits(10.0, -10.0))
    );
}

#[test]
fn test_pid_pure_proportional_is_linear() {
    let mut pid = PidController::new(2.0, 0.0, 0.0, 10.0, 0.1, None).unwrap();

    for x in [-100.0, -3.5, 0.0, 10.0, 42.0, 1e6] {
        let output = pid.update(x);
        assert!(
            (output - 2.0 * (10.0 - x)).abs() < TOL,
            "P-only output should be kp * error, got {} for x = {}",
            output,
            x
        );
    }
}

#[test]
fn test_pid_integral_accumulates_linearly() {
    let mut pid = PidController::new(0.0, 0.5, 0.0, 1.0, 0.1, None).unwrap();

    // Constant error of 1.0 per call; output should be ki * e * dt * n.
    for n in 1..=50 {
        let output = pid.update(0.0);
        let expected = 0.5 * 1.0 * 0.1 * n as f64;
        assert!(
            (output - expected).abs() < TOL,
            "after {} calls expected {}, got {}",
            n,
            expected,
            output
        );
    }
}

#[test]
fn test_pid_anti_windup_bounds_output_and_integral() {
    let mut pid = PidController::new(0.0, 1.0, 0.0, 100.0, 1.0, Some((0.0, 10.0))).unwrap();

    for _ in 0..100 {
        let output = pid.update(0.0);
        assert!(output <= 10.0, "output must never exceed the upper limit");
        assert!(output >= 0.0, "output must never fall below the lower limit");
        assert!(
            pid.integral() <= 10.0 + TOL,
            "integral should stabilize at the windup-corrected value, got {}",
            pid.integral()
        );
    }

    // With ki = 1 and dt = 1 the back-calculation pins the integral at
    // exactly the saturation bound.
    assert!((pid.integral() - 10.0).abs() < TOL);
    assert!((pid.last_output() - 10.0).abs() < TOL);
}

#[test]
fn test_pid_no_windup_correction_when_ki_is_zero() {
    let mut pid = PidController::new(10.0, 0.0, 0.0, 100.0, 0.1, Some((0.0, 10.0))).unwrap();

    for _ in 0..10 {
        let output = pid.update(0.0);
        assert!((output - 10.0).abs() < TOL);
    }
    // The accumulator still tracks raw error sums; nothing unwinds it.
    assert!((pid.integral() - 100.0 * 0.1 * 10.0).abs() < TOL);
}

#[test]
fn test_pid_reset_matches_fresh_controller() {
    let mut used = PidController::new(0.5, 0.2, 0.1, 10.0, 0.1, None).unwrap();
    for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
        used.update(x);
    }
    used.reset();

    let mut fresh = PidController::new(0.5, 0.2, 0.1, 10.0, 0.1, None).unwrap();

    let a = used.update(3.0);
    let b = fresh.update(3.0);
    assert!((a - b).abs() < TOL, "reset controller should match fresh: {} vs {}", a, b);
    assert!(used.error_history().len() == 1);
    assert!(used.output_history().len() == 1);
}

#[test]
fn test_pid_setpoint_change_leaves_state_untouched() {
    let mut pid = PidController::new(0.5, 0.2, 0.1, 10.0, 0.1, None).unwrap();
    for x in [1.0, 2.0, 3.0] {
        pid.update(x);
    }

    let integral = pid.integral();
    let prev_error = pid.previous_error();

    pid.set_setpoint(25.0);

    assert_eq!(pid.setpoint(), 25.0);
    assert_eq!(pid.integral(), integral);
    assert_eq!(pid.previous_error(), prev_error);
}

#[test]
fn test_pid_partial_retuning() {
    let mut pid = PidController::new(1.0, 0.0, 0.0, 1.0, 1.0, None).unwrap();
    assert!((pid.update(0.0) - 1.0).abs() < TOL);

    // Only kp changes; ki and kd keep their zero values.
    pid.set_tunings(Some(2.0), None, None);
    assert!((pid.update(0.0) - 2.0).abs() < TOL);
}

#[test]
fn test_pid_history_is_bounded() {
    let mut pid = PidController::new(1.0, 0.0, 0.0, 0.0, 0.1, None)
        .unwrap()
        .with_history_capacity(10);

    for i in 0..100 {
        pid.update(i as f64);
    }
    assert_eq!(pid.error_history().len(), 10);
    assert_eq!(pid.output_history().len(), 10);
    // Oldest evicted first: front of the buffer is the 91st error.
    assert!((pid.error_history()[0] - (0.0 - 90.0)).abs() < TOL);
}

// ============================================================================
// SAFETY MONITOR TESTS
// ============================================================================

#[test]
fn test_safety_absolute_voltage_trip_latches() {
    let mut monitor = SafetyMonitor::new(SafetyLimits {
        max_voltage: 5.0,
        ..SafetyLimits::default()
    });

    let verdict = monitor.check(10.0, 0.0, 0.0);
    assert_eq!(
        verdict,
        Verdict::Unsafe(Violation::OverVoltage {
            value: 10.0,
            limit: 5.0
        })
    );
    assert!(!monitor.is_safe());
    // The absolute trip bypasses the rate machinery entirely.
    assert_eq!(monitor.consecutive_warnings(), 0);

    // The latch is one-way: perfectly safe samples stay unsafe.
    for t in 1..10 {
        let verdict = monitor.check(1.0, 0.0, t as f64);
        assert!(!verdict.is_safe(), "latched monitor must stay unsafe");
    }
}

#[test]
fn test_safety_absolute_force_trip_reports_observed_value() {
    let mut monitor = SafetyMonitor::new(SafetyLimits {
        max_force: 100.0,
        ..SafetyLimits::default()
    });

    let verdict = monitor.check(0.0, -150.0, 0.0);
    assert_eq!(
        verdict.violation(),
        Some(Violation::OverForce {
            value: -150.0,
            limit: 100.0
        })
    );
}

#[test]
fn test_safety_rate_trip_after_consecutive_warnings() {
    let mut monitor = SafetyMonitor::new(rate_limits(2));

    // Voltage climbs 0.5 V/s against a 0.1 V/s limit. The first two
    // samples only seed the window.
    assert!(monitor.check(0.0, 0.0, 0.0).is_safe());
    assert!(monitor.check(0.5, 0.0, 1.0).is_safe());
    assert_eq!(monitor.consecutive_warnings(), 0);

    assert!(monitor.check(1.0, 0.0, 2.0).is_safe());
    assert_eq!(monitor.consecutive_warnings(), 1);

    assert!(monitor.check(1.5, 0.0, 3.0).is_safe());
    assert_eq!(monitor.consecutive_warnings(), 2);

    let verdict = monitor.check(2.0, 0.0, 4.0);
    assert_eq!(verdict, Verdict::Unsafe(Violation::SustainedRate { warnings: 3 }));
    assert!(!monitor.is_safe());

    // Latched: a flat sample afterwards is still unsafe.
    assert!(!monitor.check(2.0, 0.0, 5.0).is_safe());
}

#[test]
fn test_safety_single_warning_recovers() {
    let mut monitor = SafetyMonitor::new(rate_limits(2));

    monitor.check(0.0, 0.0, 0.0);
    monitor.check(0.0, 0.0, 1.0);

    // One violating jump...
    assert!(monitor.check(1.0, 0.0, 2.0).is_safe());
    assert_eq!(monitor.consecutive_warnings(), 1);

    // ...followed by a compliant sample resets the counter without
    // tripping the latch.
    assert!(monitor.check(1.0, 0.0, 3.0).is_safe());
    assert_eq!(monitor.consecutive_warnings(), 0);
    assert!(monitor.is_safe());
}

#[test]
fn test_safety_zero_dt_skips_rate_check() {
    let mut monitor = SafetyMonitor::new(rate_limits(2));

    // Identical timestamps would divide by zero in the rate math; the
    // check is skipped instead.
    for v in [0.0, 10.0, 20.0, 30.0, 40.0] {
        let verdict = monitor.check(v, 0.0, 0.0);
        assert!(verdict.is_safe());
    }
    assert_eq!(monitor.consecutive_warnings(), 0);

    // Decreasing timestamps are equally tolerated.
    let mut monitor = SafetyMonitor::new(rate_limits(2));
    for (v, t) in [(0.0, 5.0), (10.0, 4.0), (20.0, 3.0), (30.0, 2.0)] {
        assert!(monitor.check(v, 0.0, t).is_safe());
    }
}

#[test]
fn test_safety_history_is_bounded() {
    let mut monitor = SafetyMonitor::new(SafetyLimits {
        history_capacity: 10,
        ..rate_limits(2)
    });

    for i in 0..100 {
        monitor.check(0.0, 0.0, i as f64);
    }
    assert_eq!(monitor.history_len(), 10);
}

#[test]
fn test_safety_acknowledge_clears_latch() {
    let mut monitor = SafetyMonitor::new(SafetyLimits::default());

    assert!(!monitor.check(10.0, 0.0, 0.0).is_safe());
    assert!(!monitor.is_safe());

    monitor.acknowledge();

    assert!(monitor.is_safe());
    assert_eq!(monitor.history_len(), 0);
    assert_eq!(monitor.last_violation(), None);
    assert!(monitor.check(1.0, 0.0, 1.0).is_safe());
}

// ============================================================================
// FILTER TESTS
// ============================================================================

#[test]
fn test_moving_average_smooths_force() {
    let mut rig = RigSimulator::new(42, 0.01);
    let mut filter = MovingAverageFilter::new(5);

    let mut raw = Vec::new();
    let mut filtered = Vec::new();
    for _ in 0..50 {
        let reading = rig.sample();
        raw.push(reading.force);
        filtered.push(filter.filter(&reading).force);
    }

    let variance = |xs: &[f64]| {
        let mean = xs.iter().sum::<f64>() / xs.len() as f64;
        xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / xs.len() as f64
    };

    assert!(
        variance(&filtered) <= variance(&raw),
        "filter should reduce variance"
    );
}

// ============================================================================
// RIG SIMULATION TESTS
// ============================================================================

#[test]
fn test_rig_sequence_increments() {
    let mut rig = RigSimulator::new(42, 0.01);
    for expected in 1..=10 {
        assert_eq!(rig.sample().sequence_id, expected);
    }
}

#[test]
fn test_rig_force_tracks_command() {
    let mut rig = RigSimulator::new(42, 0.01);
    rig.apply_command(50.0);

    let mut last = 0.0;
    for _ in 0..50 {
        last = rig.sample().force;
    }
    assert!(
        (last - 50.0).abs() < 5.0,
        "simulated force should converge on the command, got {}",
        last
    );
}

#[test]
fn test_rig_timestamps_increase() {
    let mut rig = RigSimulator::new(7, 0.001);
    let a = rig.sample().elapsed_s;
    std::thread::sleep(Duration::from_millis(2));
    let b = rig.sample().elapsed_s;
    assert!(b > a);
}

// ============================================================================
// IPC TESTS
// ============================================================================

#[test]
fn test_channels_transmit_readings() {
    let channels = SystemChannels::new(10);
    let mut rig = RigSimulator::new(42, 0.01);

    let reading = rig.sample();
    channels.reading_tx.send(reading).expect("send should succeed");

    let received = channels
        .reading_rx
        .recv_timeout(Duration::from_millis(100))
        .expect("receive should succeed");

    assert_eq!(received.sequence_id, reading.sequence_id);
    assert_eq!(received.force, reading.force);
}

#[test]
fn test_latest_sample_keeps_newest_only() {
    let slot = LatestSample::new();
    let mut rig = RigSimulator::new(42, 0.01);

    slot.publish(rig.sample());
    let newer = rig.sample();
    slot.publish(newer);

    let taken = slot.take().expect("slot should hold a reading");
    assert_eq!(taken.sequence_id, newer.sequence_id);
    assert!(slot.take().is_none(), "take should drain the slot");
}

// ============================================================================
// CONFIG TESTS
// ============================================================================

#[test]
fn test_config_parses_toml() {
    let cfg: RuntimeConfig = toml::from_str(
        r#"
        control_interval_ms = 50
        [pid]
        kp = 2.0
        time_step_s = 0.05
        [safety]
        max_force_n = 80.0
        "#,
    )
    .expect("config should parse");

    assert_eq!(cfg.control_interval_ms, 50);
    assert_eq!(cfg.pid.kp, 2.0);
    assert_eq!(cfg.safety.max_force_n, 80.0);
    // Unspecified fields keep their defaults.
    assert_eq!(cfg.safety.window_size, 5);

    let limits = cfg.safety_limits().expect("limits should be valid");
    assert_eq!(limits.max_force, 80.0);
}

#[test]
fn test_config_rejects_zero_time_step() {
    let cfg: RuntimeConfig = toml::from_str(
        r#"
        [pid]
        time_step_s = 0.0
        "#,
    )
    .expect("config should parse");

    assert!(cfg.controller().is_err());
}

#[test]
fn test_config_rejects_zero_window() {
    let cfg: RuntimeConfig = toml::from_str(
        r#"
        [safety]
        window_size = 0
        "#,
    )
    .expect("config should parse");

    assert_eq!(cfg.safety_limits().err(), Some(ConfigError::InvalidWindowSize));
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let cfg = cell_press_control::load_config("does/not/exist.toml");
    assert_eq!(cfg.control_interval_ms, 100);
    assert!(cfg.controller().is_ok());
}
