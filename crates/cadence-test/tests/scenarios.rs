//! End-to-end clock scenarios over scripted and simulated sources

use std::sync::Arc;

use cadence_core::{
    AdjustableClock, Clock, ClockHandle, FrameBasedClock, ManualReference, TimeReference,
};
use cadence_test::{init_tracing, RangedTestClock, ReadOnlyTestClock, SimulatedTrack, TestClock};
use cadence_time::{
    CompositeClock, CouplingState, DecouplingClock, DecouplingConfig, FramedConfig,
    FramedDecouplingClock, InterpolatingFramedClock, InterpolationConfig,
};
use parking_lot::Mutex;
use proptest::prelude::*;

fn composite(
    source: ClockHandle,
    allow_decoupling: bool,
    manual: &ManualReference,
) -> CompositeClock {
    CompositeClock::with_config(
        source,
        DecouplingConfig { allow_decoupling },
        InterpolationConfig::default(),
        TimeReference::manual(manual),
    )
    .unwrap()
}

fn reactive(
    source: ClockHandle,
    allow_decoupling: bool,
    manual: &ManualReference,
) -> DecouplingClock {
    DecouplingClock::with_config(
        source,
        DecouplingConfig { allow_decoupling },
        TimeReference::manual(manual),
    )
}

fn track(manual: &ManualReference, length: f64) -> (Arc<Mutex<SimulatedTrack>>, ClockHandle) {
    let track = Arc::new(Mutex::new(SimulatedTrack::new(
        TimeReference::manual(manual),
        length,
    )));
    let handle = ClockHandle::shared(&track);
    (track, handle)
}

#[test]
fn test_passthrough_seek() {
    init_tracing();
    let manual = ManualReference::new();
    let (source, handle) = RangedTestClock::new().shared();
    let mut clock = composite(handle, false, &manual);

    assert!(clock.seek(1000.0));
    assert_eq!(clock.current_time(), 1000.0);
    assert_eq!(source.lock().time, 1000.0);
}

#[test]
fn test_decoupled_seek_outside_source_range() {
    init_tracing();
    let manual = ManualReference::new();
    let (source, handle) = RangedTestClock::new().shared();
    let mut clock = composite(handle, true, &manual);

    assert!(clock.seek(-1000.0));
    assert_eq!(clock.current_time(), -1000.0);
    assert_eq!(source.lock().time, 0.0);
    assert!(!source.lock().running);
}

#[test]
fn test_coarse_source_interpolation() {
    let manual = ManualReference::new();
    let (source, handle) = TestClock::new().shared();
    let mut clock = composite(handle, true, &manual);
    let allowable = clock.allowable_error_ms();

    source.lock().running = true;
    clock.process_frame();

    let mut interpolated = 0;
    for _ in 0..100 {
        source.lock().time += allowable / 2.0 + 5.0;
        clock.process_frame();

        let source_time = source.lock().time;
        assert!(clock.current_time() <= source_time + allowable);
        if clock.is_interpolating() {
            interpolated += 1;
        }

        manual.advance(allowable / 2.0);
    }

    assert!(interpolated > 10);
}

#[test]
fn test_change_source_to_stopped() {
    let manual = ManualReference::new();
    let (_, running) = TestClock::running_at(256_000.0).shared();
    let mut clock = composite(running, true, &manual);

    clock.process_frame();
    assert!(clock.is_running());
    assert_eq!(clock.current_time(), 256_000.0);

    let (_, stopped) = TestClock::at(128_000.0).shared();
    clock.change_source(stopped);

    assert!(!clock.is_running());
    assert_eq!(clock.current_time(), 128_000.0);

    clock.process_frame();
    assert!(!clock.is_running());
    assert_eq!(clock.current_time(), 128_000.0);
}

#[test]
fn test_reactive_change_source_to_stopped() {
    let manual = ManualReference::new();
    let (_, running) = TestClock::running_at(256_000.0).shared();
    let mut clock = reactive(running, true, &manual);
    assert!(clock.is_running());

    let (_, stopped) = TestClock::at(128_000.0).shared();
    clock.change_source(stopped);

    assert!(!clock.is_running());
    assert_eq!(clock.current_time(), 128_000.0);
}

#[test]
fn test_change_source_while_free_running() {
    let manual = ManualReference::new();
    let (_, ranged) = RangedTestClock::new().shared();
    let mut clock = reactive(ranged, true, &manual);

    clock.seek(-500.0);
    clock.start();
    assert_eq!(clock.state(), CouplingState::DecoupledRunning);

    let (_, replacement) = TestClock::running_at(500.0).shared();
    clock.change_source(replacement);

    assert_eq!(clock.state(), CouplingState::Coupled);
    assert_eq!(clock.current_time(), 500.0);
    assert!(clock.is_running());
}

#[test]
fn test_passthrough_fidelity() {
    let manual = ManualReference::new();
    let (source, handle) = RangedTestClock::with_range(0.0, 1000.0).shared();
    let mut clock = reactive(handle, false, &manual);

    for position in [250.0, -100.0, 1000.0, 1.0e6, 0.0] {
        let expected = source.lock().contains(position);
        assert_eq!(clock.seek(position), expected);
        assert_eq!(clock.current_time(), source.lock().time);
    }
}

#[test]
fn test_handoff_over_zero() {
    init_tracing();
    let manual = ManualReference::new();
    let (track, handle) = track(&manual, 10_000.0);
    let mut clock = reactive(handle, true, &manual);

    assert!(clock.seek(-50.0));
    clock.start();
    assert_eq!(clock.state(), CouplingState::DecoupledRunning);

    for k in 1..=20 {
        manual.advance(7.0);
        let expected = -50.0 + 7.0 * k as f64;
        assert!((clock.current_time() - expected).abs() < 1e-9);
    }

    assert_eq!(clock.state(), CouplingState::Coupled);
    assert!(track.lock().is_running());
    assert!((track.lock().current_time() - 90.0).abs() < 1e-9);
}

#[test]
fn test_runs_past_end_of_track() {
    let manual = ManualReference::new();
    let (track, handle) = track(&manual, 100.0);
    let mut clock = reactive(handle, true, &manual);

    clock.start();
    let mut last = clock.current_time();
    for _ in 0..10 {
        manual.advance(16.0);
        let time = clock.current_time();
        assert!(time >= last);
        last = time;
    }

    assert_eq!(clock.state(), CouplingState::DecoupledRunning);
    assert!(clock.is_running());
    assert!(!track.lock().is_running());
    assert!(clock.current_time() > 100.0);

    // Seeking back into the track hands authority straight back.
    assert!(clock.seek(50.0));
    assert_eq!(clock.state(), CouplingState::Coupled);
    assert!(track.lock().is_running());

    manual.advance(10.0);
    assert_eq!(clock.current_time(), 60.0);
}

#[test]
fn test_backward_playback_past_start() {
    let manual = ManualReference::new();
    let (track, handle) = track(&manual, 1000.0);
    let mut clock = reactive(handle, true, &manual);

    assert!(clock.seek(200.0));
    clock.set_rate(-1.0);
    clock.start();
    assert_eq!(clock.state(), CouplingState::Coupled);

    let mut last = clock.current_time();
    for _ in 0..20 {
        manual.advance(16.0);
        let time = clock.current_time();
        assert!(time <= last);
        last = time;
    }

    assert!(clock.current_time() < 0.0);
    assert!(clock.is_running());
    assert_eq!(clock.rate(), -1.0);
    assert!(!track.lock().is_running());
}

#[test]
fn test_read_only_source_decoupled() {
    let manual = ManualReference::new();
    let (_, handle) = ReadOnlyTestClock::at(300.0).shared();
    let mut clock = composite(handle, true, &manual);

    assert!(clock.seek(0.0));
    assert_eq!(clock.current_time(), 0.0);

    clock.start();
    manual.advance(16.0);
    clock.process_frame();

    assert!(clock.is_running());
    assert!(clock.current_time() > 0.0);
}

#[test]
fn test_seek_over_running_read_only_source() {
    let manual = ManualReference::new();
    let (source, handle) = ReadOnlyTestClock::at(300.0).shared();
    source.lock().running = true;
    let mut clock = reactive(handle, true, &manual);
    assert_eq!(clock.current_time(), 300.0);

    assert!(clock.seek(0.0));
    assert_eq!(clock.current_time(), 0.0);
    assert_eq!(clock.state(), CouplingState::DecoupledRunning);

    // The source keeps running at its own position; the wrapper keeps its own.
    source.lock().time = 316.0;
    manual.advance(16.0);
    assert_eq!(clock.current_time(), 16.0);
    assert_eq!(clock.state(), CouplingState::DecoupledRunning);
}

#[test]
fn test_passthrough_non_finite_seek() {
    let manual = ManualReference::new();
    let (source, handle) = TestClock::at(100.0).shared();
    let mut clock = reactive(handle, false, &manual);

    assert!(clock.seek(f64::INFINITY));
    assert_eq!(source.lock().time, f64::INFINITY);
    assert_eq!(clock.current_time(), f64::INFINITY);

    let (source, handle) = RangedTestClock::with_range(0.0, 1000.0).shared();
    let mut clock = reactive(handle, false, &manual);

    assert!(!clock.seek(f64::NAN));
    assert_eq!(clock.current_time(), source.lock().time);
}

#[test]
fn test_read_only_source_passthrough() {
    let manual = ManualReference::new();
    let (_, handle) = ReadOnlyTestClock::at(300.0).shared();
    let mut clock = composite(handle, false, &manual);

    assert!(!clock.seek(0.0));
    assert_eq!(clock.current_time(), 300.0);

    clock.start();
    assert!(!clock.is_running());
}

#[test]
fn test_nested_framed_stack() {
    let manual = ManualReference::new();
    let reference = TimeReference::manual(&manual);
    let (_, handle) = track(&manual, 10_000.0);

    let decoupler = Arc::new(Mutex::new(FramedDecouplingClock::with_config(
        handle,
        DecouplingConfig::default(),
        FramedConfig::default(),
        reference.clone(),
    )));
    let mut clock = InterpolatingFramedClock::with_config(
        ClockHandle::shared(&decoupler),
        InterpolationConfig::default(),
        reference,
    )
    .unwrap();

    assert!(clock.seek(-100.0));
    clock.start();

    for _ in 0..10 {
        manual.advance(16.0);
        clock.process_frame();
    }

    assert!((clock.current_time() - 60.0).abs() < 1e-9);
    assert_eq!(decoupler.lock().state(), CouplingState::Coupled);
}

proptest! {
    #[test]
    fn prop_decoupled_seek_never_fails(position in -1.0e6f64..1.0e6) {
        let manual = ManualReference::new();
        let (_, handle) = RangedTestClock::with_range(0.0, 1000.0).shared();
        let mut clock = reactive(handle, true, &manual);

        prop_assert!(clock.seek(position));
        prop_assert_eq!(clock.current_time(), position);
    }

    #[test]
    fn prop_lead_in_never_rewinds(
        lead_in in 0.0f64..500.0,
        frames in prop::collection::vec(1.0f64..40.0, 1..100),
    ) {
        let manual = ManualReference::new();
        let (_, handle) = track(&manual, 10_000.0);
        let mut clock = composite(handle, true, &manual);

        prop_assert!(clock.seek(-lead_in));
        clock.start();
        clock.process_frame();

        let mut last = clock.current_time();
        for dt in frames {
            manual.advance(dt);
            clock.process_frame();

            let time = clock.current_time();
            prop_assert!(time >= last);
            last = time;
        }
    }
}
