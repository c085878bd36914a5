use serde::Serialize;
use std::time::Duration;

use crate::clock::ClockConfig;
use crate::error::ConfigError;

pub const DEFAULT_REACTION_DELAY_MS: u64 = 300;
pub const DEFAULT_REACTION_TICKS: u32 = 20;

/// Where the tick-based grace window restarts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum GraceAnchor {
    /// Only at each second boundary
    #[default]
    SecondStart,
    /// At each second boundary and after every input change
    SecondStartOrInput,
}

/// Which reaction policy judges the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum ReactionMode {
    #[strum(serialize = "debounced")]
    Debounced { reaction_delay: Duration },
    #[strum(serialize = "window")]
    Window {
        reaction_ticks: u32,
        anchor: GraceAnchor,
    },
}

impl ReactionMode {
    pub fn debounced() -> Self {
        ReactionMode::Debounced {
            reaction_delay: Duration::from_millis(DEFAULT_REACTION_DELAY_MS),
        }
    }

    pub fn window() -> Self {
        ReactionMode::Window {
            reaction_ticks: DEFAULT_REACTION_TICKS,
            anchor: GraceAnchor::default(),
        }
    }
}

impl Default for ReactionMode {
    fn default() -> Self {
        Self::debounced()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GameConfig {
    pub clock: ClockConfig,
    pub mode: ReactionMode,
    /// Display-only: hide the hold/release prompt
    pub hard_mode: bool,
}

impl GameConfig {
    pub fn new(clock: ClockConfig, mode: ReactionMode) -> Self {
        Self {
            clock,
            mode,
            hard_mode: false,
        }
    }

    pub fn with_hard_mode(mut self, hard_mode: bool) -> Self {
        self.hard_mode = hard_mode;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock.tick_period.is_zero() {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if self.clock.ticks_per_advance == 0 {
            return Err(ConfigError::ZeroTicksPerAdvance);
        }
        match self.mode {
            ReactionMode::Debounced { reaction_delay } if reaction_delay.is_zero() => {
                Err(ConfigError::ZeroReactionDelay)
            }
            ReactionMode::Window { reaction_ticks, .. }
                if reaction_ticks >= self.clock.ticks_per_advance =>
            {
                Err(ConfigError::GraceCoversWholeSecond {
                    reaction_ticks,
                    ticks_per_advance: self.clock.ticks_per_advance,
                })
            }
            _ => Ok(()),
        }
    }
}
