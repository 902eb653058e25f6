//! Virtual Clock.

use crate::soc::traits::Clock;

/// Virtual millisecond clock.
///
/// Delays advance time instantly, so completion timeouts are exact and cost
/// no wall time.
#[derive(Debug, Default, Clone)]
pub struct VirtualClock {
    now_ms: u64,
}

impl VirtualClock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now_ms += u64::from(ms);
    }
}
