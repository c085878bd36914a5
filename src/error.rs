//! Errors raised while validating a game configuration.
//!
//! The running engine itself has no failure modes; losing every life is a
//! terminal state, not an error.

/// A configuration the engine cannot run with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The clock would never advance.
    #[error("tick period must be greater than zero")]
    ZeroTickPeriod,

    /// Every second needs at least one tick.
    #[error("ticks per advance must be at least 1")]
    ZeroTicksPerAdvance,

    /// A debounced latch without delay is an immediate latch with no grace.
    #[error("reaction delay must be greater than zero")]
    ZeroReactionDelay,

    /// The grace window would forgive every tick of every second.
    #[error(
        "reaction window of {reaction_ticks} ticks covers the whole second ({ticks_per_advance} ticks)"
    )]
    GraceCoversWholeSecond {
        /// Ticks forgiven at the start of each second.
        reaction_ticks: u32,
        /// Ticks in one second.
        ticks_per_advance: u32,
    },
}
