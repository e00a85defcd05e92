//! Playback Simulator - Frame-loop harness for clock stacks
//!
//! Simulates:
//! - A playback track that only reports its position every few milliseconds
//! - Report intervals and frame intervals with seeded random jitter
//! - A [`CompositeClock`] driven once per frame on a manual time reference
//!
//! Each frame the smoothed time is compared against the track's true
//! position.

use std::sync::Arc;

use cadence_core::{
    AdjustableClock, Clock, ClockHandle, ClockResult, FrameBasedClock, ManualReference,
    TimeReference,
};
use cadence_time::{CompositeClock, CouplingState, DecouplingConfig, InterpolationConfig};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::SimulatedTrack;

/// Random jitter around a nominal interval.
#[derive(Clone, Debug, PartialEq)]
pub struct IntervalModel {
    /// Nominal interval (milliseconds)
    pub interval_ms: f64,
    /// Maximum deviation either side of the interval (milliseconds)
    pub jitter_ms: f64,
}

impl IntervalModel {
    pub fn new(interval_ms: f64, jitter_ms: f64) -> Self {
        IntervalModel {
            interval_ms,
            jitter_ms,
        }
    }

    /// 60Hz with no jitter
    pub fn steady_60hz() -> Self {
        Self::new(1000.0 / 60.0, 0.0)
    }

    /// 60Hz with up to half a frame of jitter
    pub fn jittery_60hz() -> Self {
        Self::new(1000.0 / 60.0, 8.0)
    }

    /// Sample one interval. Never shorter than 0.1ms.
    pub fn sample(&self, rng: &mut StdRng) -> f64 {
        let jitter = if self.jitter_ms > 0.0 {
            rng.gen_range(-self.jitter_ms..=self.jitter_ms)
        } else {
            0.0
        };
        (self.interval_ms + jitter).max(0.1)
    }
}

/// Track wrapper that republishes its position only at report intervals.
///
/// Explicit control is applied to the track immediately and republished, so
/// seeks are visible on the next read.
pub struct CoarseSource {
    track: SimulatedTrack,
    reference: TimeReference,
    reports: IntervalModel,
    rng: StdRng,
    reported: f64,
    next_report_at: f64,
}

impl CoarseSource {
    pub fn new(
        track: SimulatedTrack,
        reference: TimeReference,
        reports: IntervalModel,
        seed: u64,
    ) -> Self {
        let reported = track.current_time();
        let next_report_at = reference.now_ms();
        CoarseSource {
            track,
            reference,
            reports,
            rng: StdRng::seed_from_u64(seed),
            reported,
            next_report_at,
        }
    }

    /// Publish a new position if a report is due.
    pub fn update(&mut self) {
        let now = self.reference.now_ms();
        if now >= self.next_report_at {
            self.reported = self.track.current_time();
            self.next_report_at = now + self.reports.sample(&mut self.rng);
        }
    }

    pub fn track(&self) -> &SimulatedTrack {
        &self.track
    }

    fn republish(&mut self) {
        self.reported = self.track.current_time();
    }
}

impl Clock for CoarseSource {
    fn current_time(&self) -> f64 {
        self.reported
    }

    fn rate(&self) -> f64 {
        self.track.rate()
    }

    fn is_running(&self) -> bool {
        self.track.is_running()
    }

    fn as_adjustable(&mut self) -> Option<&mut dyn AdjustableClock> {
        Some(self)
    }
}

impl AdjustableClock for CoarseSource {
    fn start(&mut self) {
        self.track.start();
        self.republish();
    }

    fn stop(&mut self) {
        self.track.stop();
        self.republish();
    }

    fn reset(&mut self) {
        self.track.reset();
        self.republish();
    }

    fn seek(&mut self, position: f64) -> bool {
        let accepted = self.track.seek(position);
        self.republish();
        accepted
    }

    fn set_rate(&mut self, rate: f64) {
        self.track.set_rate(rate);
    }

    fn reset_speed_adjustments(&mut self) {
        self.track.reset_speed_adjustments();
    }
}

/// Playback simulation configuration
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Track length (milliseconds)
    pub track_length_ms: f64,
    /// How often the track reports its position
    pub reports: IntervalModel,
    /// Frame pacing of the consumer
    pub frames: IntervalModel,
    pub decoupling: DecouplingConfig,
    pub interpolation: InterpolationConfig,
    /// RNG seed
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            track_length_ms: 60_000.0,
            reports: IntervalModel::new(10.0, 0.0),
            frames: IntervalModel::steady_60hz(),
            decoupling: DecouplingConfig::default(),
            interpolation: InterpolationConfig::default(),
            seed: 0,
        }
    }
}

/// Frame-loop simulator over a coarse track
pub struct PlaybackSimulator {
    manual: ManualReference,
    source: Arc<Mutex<CoarseSource>>,
    clock: CompositeClock,
    frames: IntervalModel,
    rng: StdRng,
    elapsed_ms: f64,
}

impl PlaybackSimulator {
    pub fn new(config: SimulationConfig) -> ClockResult<Self> {
        let manual = ManualReference::new();
        let reference = TimeReference::manual(&manual);

        let track = SimulatedTrack::new(reference.clone(), config.track_length_ms);
        let source = Arc::new(Mutex::new(CoarseSource::new(
            track,
            reference.clone(),
            config.reports,
            config.seed,
        )));

        let clock = CompositeClock::with_config(
            ClockHandle::shared(&source),
            config.decoupling,
            config.interpolation,
            reference,
        )?;

        Ok(PlaybackSimulator {
            manual,
            source,
            clock,
            frames: config.frames,
            rng: StdRng::seed_from_u64(config.seed.wrapping_add(1)),
            elapsed_ms: 0.0,
        })
    }

    pub fn clock(&self) -> &CompositeClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut CompositeClock {
        &mut self.clock
    }

    /// Unclamped position of the underlying track.
    pub fn track_position(&self) -> f64 {
        self.source.lock().track().position()
    }

    pub fn track_running(&self) -> bool {
        self.source.lock().track().is_running()
    }

    /// Real time simulated so far
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Run frames until `duration_ms` of real time has passed.
    pub fn run(&mut self, duration_ms: f64) -> SimulationResult {
        let mut result = SimulationResult::new();
        let end = self.elapsed_ms + duration_ms;
        let mut last = self.clock.current_time();

        while self.elapsed_ms < end {
            self.frame();

            let time = self.clock.current_time();
            let state = self.clock.coupling_state();
            // A track started during lead-in plays at its own position until handoff.
            let tracked = if state == CouplingState::Coupled && self.track_running() {
                Some(self.track_position())
            } else {
                None
            };
            result.record_frame(
                time,
                last,
                self.clock.rate(),
                tracked,
                self.clock.is_interpolating(),
                state,
            );
            last = time;
        }

        result.finalize();
        debug!(
            frames = result.total_frames,
            interpolated = result.interpolated_frames,
            decoupled = result.decoupled_frames,
            max_error_ms = result.max_error_ms,
            "simulation finished"
        );
        result
    }

    /// Execute one frame
    fn frame(&mut self) {
        let dt = self.frames.sample(&mut self.rng);
        self.manual.advance(dt);
        self.elapsed_ms += dt;

        self.source.lock().update();
        self.clock.process_frame();
    }
}

/// Simulation result and statistics
#[derive(Debug, Default)]
pub struct SimulationResult {
    /// Total frames executed
    pub total_frames: u64,
    /// Frames where the smoothed time was a prediction
    pub interpolated_frames: u64,
    /// Frames spent decoupled from the track
    pub decoupled_frames: u64,
    /// Frames where time moved against the rate
    pub backward_jumps: u64,
    /// Maximum distance from the true track position (milliseconds)
    pub max_error_ms: f64,
    /// Average distance from the true track position (milliseconds)
    pub avg_error_ms: f64,
    /// Error samples, taken while coupled to a playing track
    error_samples: Vec<f64>,
}

impl SimulationResult {
    pub fn new() -> Self {
        SimulationResult::default()
    }

    fn record_frame(
        &mut self,
        time: f64,
        last: f64,
        rate: f64,
        track: Option<f64>,
        interpolating: bool,
        state: CouplingState,
    ) {
        self.total_frames += 1;

        if cadence_core::is_against_rate(rate, last, time) {
            self.backward_jumps += 1;
        }
        if interpolating {
            self.interpolated_frames += 1;
        }
        if state != CouplingState::Coupled {
            self.decoupled_frames += 1;
        }
        if let Some(track) = track {
            let error = (time - track).abs();
            self.error_samples.push(error);
            self.max_error_ms = self.max_error_ms.max(error);
        }
    }

    /// Calculate final statistics
    pub fn finalize(&mut self) {
        if !self.error_samples.is_empty() {
            let sum: f64 = self.error_samples.iter().sum();
            self.avg_error_ms = sum / self.error_samples.len() as f64;
        }
    }

    /// Fraction of frames spent interpolating
    pub fn interpolation_ratio(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.interpolated_frames as f64 / self.total_frames as f64
    }
}

/// Predefined test scenarios
pub mod scenarios {
    use super::*;

    /// Fine-grained track at steady 60Hz
    pub fn steady_playback() -> ClockResult<PlaybackSimulator> {
        PlaybackSimulator::new(SimulationConfig::default())
    }

    /// Track that reports roughly every 50ms
    pub fn coarse_source() -> ClockResult<PlaybackSimulator> {
        PlaybackSimulator::new(SimulationConfig {
            reports: IntervalModel::new(50.0, 5.0),
            interpolation: InterpolationConfig::lenient(),
            seed: 7,
            ..Default::default()
        })
    }

    /// Consumer frames arriving with heavy jitter
    pub fn jittery_frames() -> ClockResult<PlaybackSimulator> {
        PlaybackSimulator::new(SimulationConfig {
            frames: IntervalModel::jittery_60hz(),
            seed: 11,
            ..Default::default()
        })
    }

    /// Short track, for running past the end
    pub fn short_track(length_ms: f64) -> ClockResult<PlaybackSimulator> {
        PlaybackSimulator::new(SimulationConfig {
            track_length_ms: length_ms,
            ..Default::default()
        })
    }
}
