use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Timing snapshot for one frame, handed to components.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous frame completed.
    pub delta: f64,
    /// Seconds since the clock was created.
    pub elapsed: f64,
}

/// Wall clock for the frame loop.
///
/// `delta_time` measures from the last `frame_complete` call, so it grows
/// while a frame is in progress and resets at the frame boundary.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    prev_frame: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            prev_frame: now,
        }
    }

    /// Seconds since the clock was created.
    pub fn current(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Seconds since the previous frame boundary.
    pub fn delta_time(&self) -> f64 {
        self.prev_frame.elapsed().as_secs_f64()
    }

    /// Mark the end of a frame. Returns the duration of the frame that just ended.
    pub fn frame_complete(&mut self) -> Duration {
        let now = Instant::now();
        let frame = now - self.prev_frame;
        self.prev_frame = now;
        frame
    }

    pub fn frame_time(&self) -> FrameTime {
        FrameTime {
            delta: self.delta_time(),
            elapsed: self.current(),
        }
    }
}

/// Rolling window over the most recent frame durations.
#[derive(Debug)]
pub struct FrameTimer {
    window: VecDeque<Duration>,
    capacity: usize,
}

impl FrameTimer {
    /// Keeps the last `capacity` frames; a zero capacity keeps one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(dt);
    }

    pub fn average(&self) -> Duration {
        match u32::try_from(self.window.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.window.iter().sum::<Duration>() / n,
        }
    }

    pub fn max(&self) -> Duration {
        self.window.iter().copied().max().unwrap_or_default()
    }

    pub fn min(&self) -> Duration {
        self.window.iter().copied().min().unwrap_or_default()
    }

    /// Frames per second implied by the average; zero before any frame.
    pub fn fps(&self) -> f64 {
        let avg = self.average().as_secs_f64();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    pub fn count(&self) -> usize {
        self.window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_delta_resets_on_frame_complete() {
        let mut clock = FrameClock::new();
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.delta_time() >= 0.005);
        let frame = clock.frame_complete();
        assert!(frame >= Duration::from_millis(5));
        assert!(clock.delta_time() < frame.as_secs_f64());
        assert!(clock.current() >= 0.005);
    }

    #[test]
    fn frame_time_snapshot() {
        let clock = FrameClock::new();
        let t = clock.frame_time();
        assert!(t.elapsed >= 0.0);
        assert!(t.delta >= 0.0);
    }

    #[test]
    fn sixty_hz_frames_average_out() {
        let mut timer = FrameTimer::new(120);
        for ms in [16, 17, 17, 16, 17, 17] {
            timer.record(Duration::from_millis(ms));
        }
        assert_eq!(timer.count(), 6);
        assert_eq!(timer.average(), Duration::from_nanos(16_666_666));
        assert_eq!(timer.min(), Duration::from_millis(16));
        assert_eq!(timer.max(), Duration::from_millis(17));
        assert!((timer.fps() - 60.0).abs() < 0.1);
    }

    #[test]
    fn slow_frame_leaves_the_window() {
        let mut timer = FrameTimer::new(3);
        timer.record(Duration::from_millis(100));
        for _ in 0..3 {
            timer.record(Duration::from_millis(10));
        }
        assert_eq!(timer.count(), 3);
        assert_eq!(timer.max(), Duration::from_millis(10));
        assert_eq!(timer.average(), Duration::from_millis(10));
    }

    #[test]
    fn zero_capacity_keeps_last_frame() {
        let mut timer = FrameTimer::new(0);
        assert_eq!(timer.fps(), 0.0);
        assert_eq!(timer.min(), Duration::ZERO);
        timer.record(Duration::from_millis(5));
        timer.record(Duration::from_millis(8));
        assert_eq!(timer.count(), 1);
        assert_eq!(timer.average(), Duration::from_millis(8));
    }
}
