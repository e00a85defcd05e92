//! Frame-based snapshot clock

use cadence_core::{
    Clock, ClockHandle, ClockResult, ClockSnapshot, FrameBasedClock, FrameStatistics,
    FrameTimeInfo,
};
use tracing::trace;

use crate::{FramedConfig, StopwatchClock};

/// Takes one snapshot of its source per frame.
///
/// All reads between two `process_frame` calls return the same values, and
/// frame-rate statistics are tracked over the source's own time.
pub struct FramedClock {
    source: ClockHandle,
    config: FramedConfig,
    current: ClockSnapshot,
    last_frame_time: f64,
    stats: FrameStatistics,
}

impl FramedClock {
    pub fn new(source: ClockHandle) -> Self {
        let config = FramedConfig::default();
        let stats = FrameStatistics::new(config.fps_window_ms, config.jitter_window);
        Self::build(source, config, stats)
    }

    pub fn with_config(source: ClockHandle, config: FramedConfig) -> ClockResult<Self> {
        config.validate()?;
        let stats = FrameStatistics::new(config.fps_window_ms, config.jitter_window);
        Ok(Self::build(source, config, stats))
    }

    fn build(source: ClockHandle, config: FramedConfig, stats: FrameStatistics) -> Self {
        let current = source.snapshot();
        FramedClock {
            source,
            config,
            last_frame_time: current.current_time,
            current,
            stats,
        }
    }

    pub fn source(&self) -> &ClockHandle {
        &self.source
    }

    /// Replace the source. The next frame reports the new source's time.
    pub fn change_source(&mut self, source: ClockHandle) {
        self.source = source;
        self.current = self.source.snapshot();
        self.last_frame_time = self.current.current_time;
    }

    /// Time at the previous frame
    pub fn last_frame_time(&self) -> f64 {
        self.last_frame_time
    }

    pub fn frames_per_second(&self) -> f64 {
        self.stats.frames_per_second()
    }

    pub fn average_frame_time(&self) -> f64 {
        self.stats.average_frame_time()
    }

    pub fn jitter(&self) -> f64 {
        self.stats.jitter()
    }

    pub fn total_frames(&self) -> u64 {
        self.stats.total_frames()
    }
}

impl Default for FramedClock {
    fn default() -> Self {
        Self::new(ClockHandle::new(StopwatchClock::started(
            cadence_core::TimeReference::system(),
        )))
    }
}

impl Clock for FramedClock {
    fn current_time(&self) -> f64 {
        self.current.current_time
    }

    fn rate(&self) -> f64 {
        self.current.rate
    }

    fn is_running(&self) -> bool {
        self.current.is_running
    }

    fn snapshot(&self) -> ClockSnapshot {
        self.current
    }

    fn as_frame_based(&mut self) -> Option<&mut dyn FrameBasedClock> {
        Some(self)
    }
}

impl FrameBasedClock for FramedClock {
    fn process_frame(&mut self) {
        if self.config.process_source {
            self.source.process_frame();
        }

        self.last_frame_time = self.current.current_time;
        self.current = self.source.snapshot();

        let elapsed = self.elapsed_frame_time();
        self.stats.record(elapsed);
        trace!(time = self.current.current_time, elapsed, "frame processed");
    }

    fn elapsed_frame_time(&self) -> f64 {
        self.current.current_time - self.last_frame_time
    }

    fn frame_time_info(&self) -> FrameTimeInfo {
        FrameTimeInfo {
            elapsed: self.elapsed_frame_time(),
            current: self.current.current_time,
        }
    }
}
