use serde::Serialize;
use std::time::Duration;

/// Fixed-rate tick configuration.
///
/// The counter advances once every `ticks_per_advance` ticks, so one
/// "second" of game time is `tick_period * ticks_per_advance`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ClockConfig {
    pub tick_period: Duration,
    pub ticks_per_advance: u32,
}

impl ClockConfig {
    pub fn new(tick_period: Duration, ticks_per_advance: u32) -> Self {
        Self {
            tick_period,
            ticks_per_advance,
        }
    }

    /// One slow tick per counter step
    pub fn classic() -> Self {
        Self::new(Duration::from_millis(1200), 1)
    }

    /// 60 ticks per second, counter steps once per second
    pub fn smooth() -> Self {
        Self::new(Duration::from_micros(16_667), 60)
    }

    /// Position of `ticker` inside the current second
    pub fn position(&self, ticker: u64) -> u64 {
        ticker % u64::from(self.ticks_per_advance.max(1))
    }

    pub fn is_boundary(&self, ticker: u64) -> bool {
        self.position(ticker) == 0
    }

    pub fn advance_period(&self) -> Duration {
        self.tick_period * self.ticks_per_advance
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::smooth()
    }
}
