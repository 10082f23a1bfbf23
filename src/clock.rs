use std::time::Instant;

/// Keeps animation time for the shaders.
///
/// `total` only ever grows by the deltas handed out from [`FrameClock::tick`],
/// so it is non-decreasing even if the caller feeds instants out of order.
#[derive(Clone, Debug)]
pub struct FrameClock {
    last: Instant,
    total: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(t0: Instant) -> Self {
        Self {
            last: t0,
            total: 0.0,
        }
    }

    /// Advances the clock to now, returning seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = self.peek_delta_at(now);
        if now > self.last {
            self.last = now;
        }
        self.total += delta;
        delta
    }

    /// Seconds since the previous tick, without advancing.
    pub fn peek_delta(&self) -> f32 {
        self.peek_delta_at(Instant::now())
    }

    pub fn peek_delta_at(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.last).as_secs_f32()
    }

    pub fn total(&self) -> f32 {
        self.total
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
