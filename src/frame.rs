use std::time::Instant;

use params_isomorphic::Params;
use tracing::debug;

use crate::clock::FrameClock;

/// Produces one `Params` per frame from the clock and the drawable size.
#[derive(Clone, Debug)]
pub struct FrameParams {
    clock: FrameClock,
    width: u32,
    height: u32,
    current: Params,
}

impl FrameParams {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_clock(FrameClock::new(), width, height)
    }

    pub fn with_clock(clock: FrameClock, width: u32, height: u32) -> Self {
        Self {
            clock,
            width,
            height,
            current: Params::default(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        debug!(width, height, "drawable resized");
        self.width = width;
        self.height = height;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// A minimised window reports a zero-sized drawable; don't render into it.
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn advance(&mut self) -> Params {
        self.advance_at(Instant::now())
    }

    pub fn advance_at(&mut self, now: Instant) -> Params {
        let delta_time = self.clock.tick_at(now);
        self.current = Params {
            time: self.clock.total(),
            delta_time,
            width: self.width as f32,
            height: self.height as f32,
        };
        debug!(params = ?self.current, "frame params");
        self.current
    }

    /// Params produced by the last `advance`, zeroed before the first frame.
    pub fn current(&self) -> Params {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_advance_fills_all_fields() {
        let t0 = Instant::now();
        let mut frames = FrameParams::with_clock(FrameClock::starting_at(t0), 1920, 1080);
        assert_eq!(frames.current(), Params::default());

        let p = frames.advance_at(t0 + Duration::from_millis(500));
        assert_eq!(p, Params::new(0.5, 0.5, 1920.0, 1080.0));
        assert_eq!(frames.current(), p);

        let p = frames.advance_at(t0 + Duration::from_millis(750));
        assert_eq!(p.time, 0.75);
        assert_eq!(p.delta_time, 0.25);
    }

    #[test]
    fn test_time_never_decreases() {
        let t0 = Instant::now();
        let mut frames = FrameParams::with_clock(FrameClock::starting_at(t0), 64, 64);

        let mut last = 0.0;
        for ms in [10, 30, 20, 20, 90, 5] {
            let p = frames.advance_at(t0 + Duration::from_millis(ms));
            assert!(p.time >= last);
            assert!(p.delta_time >= 0.0);
            last = p.time;
        }
    }

    #[test]
    fn test_resize_applies_to_next_frame() {
        let t0 = Instant::now();
        let mut frames = FrameParams::with_clock(FrameClock::starting_at(t0), 800, 600);
        frames.advance_at(t0);

        frames.resize(0, 600);
        assert!(!frames.is_drawable());
        assert_eq!(frames.current().width, 800.0);

        frames.resize(1024, 768);
        let p = frames.advance_at(t0 + Duration::from_millis(16));
        assert_eq!((p.width, p.height), (1024.0, 768.0));
        assert!(frames.is_drawable());
    }
}
