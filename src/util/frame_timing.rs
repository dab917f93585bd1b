//! Frame-rate tracking for debug logging.

use web_time::Instant;

/// Smoothed FPS tracker with periodic reporting.
pub struct FrameTiming {
    /// Last frame timestamp
    last_frame: Instant,
    /// Smoothed FPS using exponential moving average
    smoothed_fps: f32,
    /// Smoothing factor (lower = smoother, 0.0-1.0)
    smoothing: f32,
    /// Frames since construction
    frames: u64,
    /// Report every this many frames (0 = never)
    report_interval: u32,
}

impl FrameTiming {
    /// Create a tracker that reports every `report_interval` frames
    /// (0 disables reporting).
    #[must_use]
    pub fn new(report_interval: u32) -> Self {
        Self {
            last_frame: Instant::now(),
            smoothed_fps: 60.0,
            smoothing: 0.05,
            frames: 0,
            report_interval,
        }
    }

    /// Call after each presented frame. Returns the smoothed FPS when a
    /// report is due.
    pub fn end_frame(&mut self) -> Option<f32> {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.record(frame_time)
    }

    fn record(&mut self, frame_time: f32) -> Option<f32> {
        if frame_time > 0.0 {
            let instant_fps = 1.0 / frame_time;
            self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
                + instant_fps * self.smoothing;
        }
        self.frames += 1;
        let interval = u64::from(self.report_interval);
        (interval > 0 && self.frames % interval == 0).then_some(self.smoothed_fps)
    }

    /// Current FPS (smoothed).
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }

    /// Frames recorded so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_on_interval() {
        let mut timing = FrameTiming::new(3);
        assert_eq!(timing.record(1.0 / 30.0), None);
        assert_eq!(timing.record(1.0 / 30.0), None);
        assert!(timing.record(1.0 / 30.0).is_some());
        assert_eq!(timing.frames(), 3);
    }

    #[test]
    fn smooths_toward_observed_rate() {
        let mut timing = FrameTiming::new(0);
        for _ in 0..500 {
            assert_eq!(timing.record(1.0 / 30.0), None);
        }
        assert!((timing.fps() - 30.0).abs() < 0.5);
    }

    #[test]
    fn zero_frame_time_is_ignored() {
        let mut timing = FrameTiming::new(0);
        let _ = timing.record(0.0);
        assert_eq!(timing.fps(), 60.0);
    }
}
