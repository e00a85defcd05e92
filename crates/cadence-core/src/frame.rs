//! Frame timing primitives

use std::collections::VecDeque;

/// Time of the current frame and how far it moved since the previous one.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTimeInfo {
    /// Elapsed time since the previous frame (negative when running backward)
    pub elapsed: f64,
    /// Current time
    pub current: f64,
}

/// Rolling frame-rate and frame-time jitter statistics.
///
/// Frames per second is recomputed once per `fps_window_ms` of accumulated
/// frame time. Jitter is the standard deviation of the last `jitter_window`
/// frame times.
#[derive(Clone, Debug)]
pub struct FrameStatistics {
    fps_window_ms: f64,
    jitter_window: usize,
    recent: VecDeque<f64>,
    time_until_next: f64,
    time_since_last: f64,
    frames_since_last: u32,
    frames_per_second: f64,
    average_frame_time: f64,
    jitter: f64,
    total_frames: u64,
}

impl FrameStatistics {
    pub fn new(fps_window_ms: f64, jitter_window: usize) -> Self {
        FrameStatistics {
            fps_window_ms,
            jitter_window: jitter_window.max(1),
            recent: VecDeque::with_capacity(jitter_window.max(1)),
            time_until_next: 0.0,
            time_since_last: 0.0,
            frames_since_last: 0,
            frames_per_second: 0.0,
            average_frame_time: 0.0,
            jitter: 0.0,
            total_frames: 0,
        }
    }

    /// Record one frame's elapsed time.
    pub fn record(&mut self, elapsed: f64) {
        let magnitude = elapsed.abs();

        if self.recent.len() == self.jitter_window {
            self.recent.pop_front();
        }
        self.recent.push_back(magnitude);
        self.total_frames += 1;

        if self.time_until_next <= 0.0 {
            self.time_until_next += self.fps_window_ms;

            if self.frames_since_last == 0 || self.time_since_last <= 0.0 {
                self.frames_per_second = 0.0;
            } else {
                self.frames_per_second =
                    (self.frames_since_last as f64 * 1000.0 / self.time_since_last).ceil();
            }

            self.average_frame_time = mean(&self.recent);
            self.jitter = std_dev(&self.recent, self.average_frame_time);

            self.time_since_last = 0.0;
            self.frames_since_last = 0;
        }

        self.frames_since_last += 1;
        self.time_until_next -= magnitude;
        self.time_since_last += magnitude;
    }

    /// Frames per second over the last completed window
    pub fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    /// Mean frame time over the jitter window (ms)
    pub fn average_frame_time(&self) -> f64 {
        self.average_frame_time
    }

    /// Standard deviation of frame time over the jitter window (ms)
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Frames recorded since construction
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

impl Default for FrameStatistics {
    fn default() -> Self {
        Self::new(1000.0, 128)
    }
}

fn mean(values: &VecDeque<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &VecDeque<f64>, mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
