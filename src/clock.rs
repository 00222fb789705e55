use crate::TICK_RATE_MS;

/// Countdown driving both the visible timer and the deadline auto-submit.
///
/// The clock is advanced by the event loop's tick and has no thread of its
/// own, so it stops with the loop. Elapsed time is counted in whole ticks to
/// keep the deadline exact. Expiry is a latch: `poll_expired` reports it
/// exactly once no matter how many ticks arrive afterwards.
#[derive(Debug)]
pub struct Clock {
    deadline_secs: u64,
    elapsed_ticks: u64,
    expiry_reported: bool,
}

impl Clock {
    pub fn new(deadline_secs: u64) -> Self {
        Self {
            deadline_secs,
            elapsed_ticks: 0,
            expiry_reported: false,
        }
    }

    pub fn on_tick(&mut self) {
        self.elapsed_ticks += 1;
    }

    pub fn deadline_secs(&self) -> u64 {
        self.deadline_secs
    }

    fn remaining_ms(&self) -> u64 {
        (self.deadline_secs * 1000).saturating_sub(self.elapsed_ticks * TICK_RATE_MS)
    }

    /// Whole seconds left, clamped at zero, for mm:ss display.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_ms().div_ceil(1000)
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_ms() == 0
    }

    /// Returns true the first time the countdown has run out, then never
    /// again. The caller wires this to the auto-submit path.
    pub fn poll_expired(&mut self) -> bool {
        if self.expiry_reported || !self.is_expired() {
            return false;
        }
        self.expiry_reported = true;
        true
    }
}
