//! Frame counting for the window read-out.
//!
//! The simulation advances one step per displayed frame and never scales by
//! elapsed time; this clock only measures how fast frames are arriving.

use std::time::{Duration, Instant};

/// Frame counter with a periodically refreshed FPS estimate.
#[derive(Debug)]
pub struct FrameClock {
    /// Total frames since start.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Time of last FPS calculation.
    fps_update_time: Instant,
    /// How often to update FPS calculation.
    fps_update_interval: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_millis(500))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: Instant::now(),
            fps_update_interval: interval,
        }
    }

    /// Count one frame. Returns `true` when the FPS estimate was refreshed.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> bool {
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed < self.fps_update_interval {
            return false;
        }
        let frames_since = self.frame_count - self.fps_frame_count;
        self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
        self.fps_frame_count = self.frame_count;
        self.fps_update_time = now;
        true
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Calculated frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_frames() {
        let mut clock = FrameClock::with_interval(Duration::from_secs(3600));
        for _ in 0..5 {
            assert!(!clock.tick());
        }
        assert_eq!(clock.frame(), 5);
        assert_eq!(clock.fps(), 0.0);
    }

    #[test]
    fn fps_refreshes_after_interval() {
        let mut clock = FrameClock::with_interval(Duration::from_millis(500));
        let start = clock.fps_update_time;
        for i in 1..30 {
            assert!(!clock.tick_at(start + Duration::from_millis(i * 10)));
        }
        assert!(clock.tick_at(start + Duration::from_millis(500)));
        assert!((clock.fps() - 60.0).abs() < 1e-3);
        assert_eq!(clock.frame(), 30);
    }
}
