//! Reaction policies: when a mismatch between effective input and the
//! required state is allowed to cost a life.
//!
//! Two strategies exist and a session uses exactly one of them:
//! - [`DebouncedEdge`]: input becomes effective after a reaction delay and
//!   only the edge from correct to incorrect is penalized, outside a grace
//!   period that follows every commit, every counter advance, and every raw
//!   input change made while an advance is still in grace.
//! - [`GraceWindow`]: input is effective immediately, the first
//!   `reaction_ticks` ticks of every second are forgiven and at most one
//!   life is lost per second.

use std::fmt::Debug;
use std::time::Duration;

use crate::config::{GraceAnchor, ReactionMode};

/// Everything a policy needs to judge one evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Moment {
    pub now: Duration,
    /// Index of the tick being processed (or about to be, between ticks)
    pub ticker: u64,
    /// Position of `ticker` inside the current second
    pub position: u64,
    pub correct: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Inside a reaction window, nothing recorded
    Grace,
    /// Judged, no penalty
    Spare,
    Penalize,
}

pub trait ReactionPolicy: Debug {
    fn name(&self) -> &'static str;

    /// Delay before raw input becomes effective. `None` latches immediately.
    fn latch_delay(&self) -> Option<Duration>;

    /// Back to the state expected at session start
    fn reset(&mut self);

    fn on_advance(&mut self, now: Duration);

    /// Raw input changed; it may not be effective yet
    fn on_raw_change(&mut self, _now: Duration) {}

    fn on_commit(&mut self, now: Duration, ticker: u64);

    /// When the current time-based grace period runs out, if the policy has one
    fn grace_ends_at(&self) -> Option<Duration> {
        None
    }

    fn judge(&mut self, moment: &Moment) -> Verdict;
}

pub fn policy_for(mode: &ReactionMode) -> Box<dyn ReactionPolicy> {
    match *mode {
        ReactionMode::Debounced { reaction_delay } => Box::new(DebouncedEdge::new(reaction_delay)),
        ReactionMode::Window {
            reaction_ticks,
            anchor,
        } => Box::new(GraceWindow::new(reaction_ticks, anchor)),
    }
}

#[derive(Debug, Clone)]
pub struct DebouncedEdge {
    reaction_delay: Duration,
    last_commit: Option<Duration>,
    last_advance: Option<Duration>,
    last_reaction: Option<Duration>,
    last_was_correct: bool,
}

impl DebouncedEdge {
    pub fn new(reaction_delay: Duration) -> Self {
        Self {
            reaction_delay,
            last_commit: None,
            last_advance: None,
            last_reaction: None,
            last_was_correct: false,
        }
    }

    fn within(&self, anchor: Option<Duration>, now: Duration) -> bool {
        anchor.is_some_and(|at| now.saturating_sub(at) < self.reaction_delay)
    }

    pub fn in_grace(&self, now: Duration) -> bool {
        self.within(self.last_commit, now)
            || self.within(self.last_advance, now)
            || self.within(self.last_reaction, now)
    }

    pub fn last_was_correct(&self) -> bool {
        self.last_was_correct
    }
}

impl ReactionPolicy for DebouncedEdge {
    fn name(&self) -> &'static str {
        "debounced"
    }

    fn latch_delay(&self) -> Option<Duration> {
        Some(self.reaction_delay)
    }

    fn reset(&mut self) {
        self.last_commit = None;
        self.last_advance = None;
        self.last_reaction = None;
        // the first judged evaluation can't count as a regression
        self.last_was_correct = false;
    }

    fn on_advance(&mut self, now: Duration) {
        self.last_advance = Some(now);
    }

    fn on_raw_change(&mut self, now: Duration) {
        // a reaction to the latest advance keeps grace open until its commit lands
        if self.within(self.last_advance, now) {
            self.last_reaction = Some(now);
        }
    }

    fn on_commit(&mut self, now: Duration, _ticker: u64) {
        self.last_commit = Some(now);
    }

    fn grace_ends_at(&self) -> Option<Duration> {
        self.last_commit
            .into_iter()
            .chain(self.last_advance)
            .chain(self.last_reaction)
            .max()
            .map(|at| at + self.reaction_delay)
    }

    fn judge(&mut self, moment: &Moment) -> Verdict {
        if self.in_grace(moment.now) {
            return Verdict::Grace;
        }

        let regressed = !moment.correct && self.last_was_correct;
        self.last_was_correct = moment.correct;
        if regressed {
            Verdict::Penalize
        } else {
            Verdict::Spare
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraceWindow {
    reaction_ticks: u32,
    anchor: GraceAnchor,
    last_input_tick: Option<u64>,
    life_lost_this_second: bool,
}

impl GraceWindow {
    pub fn new(reaction_ticks: u32, anchor: GraceAnchor) -> Self {
        Self {
            reaction_ticks,
            anchor,
            last_input_tick: None,
            life_lost_this_second: false,
        }
    }

    pub fn life_lost_this_second(&self) -> bool {
        self.life_lost_this_second
    }

    pub fn in_grace(&self, moment: &Moment) -> bool {
        let window = u64::from(self.reaction_ticks);
        if moment.position < window {
            return true;
        }
        match (self.anchor, self.last_input_tick) {
            (GraceAnchor::SecondStartOrInput, Some(at)) => {
                moment.ticker.saturating_sub(at) < window
            }
            _ => false,
        }
    }
}

impl ReactionPolicy for GraceWindow {
    fn name(&self) -> &'static str {
        "window"
    }

    fn latch_delay(&self) -> Option<Duration> {
        None
    }

    fn reset(&mut self) {
        self.last_input_tick = None;
        self.life_lost_this_second = false;
    }

    fn on_advance(&mut self, _now: Duration) {
        self.life_lost_this_second = false;
    }

    fn on_commit(&mut self, _now: Duration, ticker: u64) {
        self.last_input_tick = Some(ticker);
    }

    fn judge(&mut self, moment: &Moment) -> Verdict {
        if self.in_grace(moment) {
            return Verdict::Grace;
        }
        if moment.correct || self.life_lost_this_second {
            return Verdict::Spare;
        }
        self.life_lost_this_second = true;
        Verdict::Penalize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn at(now: u64, correct: bool) -> Moment {
        Moment {
            now: ms(now),
            ticker: 0,
            position: 0,
            correct,
        }
    }

    fn tick(ticker: u64, correct: bool) -> Moment {
        Moment {
            now: Duration::ZERO,
            ticker,
            position: ticker % 60,
            correct,
        }
    }

    #[test]
    fn test_debounced_first_mismatch_is_not_a_regression() {
        let mut p = DebouncedEdge::new(ms(300));
        p.reset();
        assert_eq!(p.judge(&at(1000, false)), Verdict::Spare);
        assert_eq!(p.judge(&at(1016, false)), Verdict::Spare);
    }

    #[test]
    fn test_debounced_penalizes_only_the_edge() {
        let mut p = DebouncedEdge::new(ms(300));
        p.reset();
        assert_eq!(p.judge(&at(1000, true)), Verdict::Spare);
        assert_eq!(p.judge(&at(1100, false)), Verdict::Penalize);
        assert_eq!(p.judge(&at(1200, false)), Verdict::Spare);
        assert_eq!(p.judge(&at(1300, true)), Verdict::Spare);
        assert_eq!(p.judge(&at(1400, false)), Verdict::Penalize);
    }

    #[test]
    fn test_debounced_grace_keeps_baseline() {
        let mut p = DebouncedEdge::new(ms(300));
        p.reset();
        assert_eq!(p.judge(&at(100, true)), Verdict::Spare);

        p.on_advance(ms(1000));
        assert_eq!(p.judge(&at(1000, false)), Verdict::Grace);
        assert_eq!(p.judge(&at(1299, false)), Verdict::Grace);
        assert!(p.last_was_correct());
        // grace over and still wrong: that is the edge
        assert_eq!(p.judge(&at(1300, false)), Verdict::Penalize);
    }

    #[test]
    fn test_debounced_grace_ends_at_latest_anchor() {
        let mut p = DebouncedEdge::new(ms(300));
        assert_eq!(p.grace_ends_at(), None);
        p.on_advance(ms(1000));
        assert_eq!(p.grace_ends_at(), Some(ms(1300)));
        p.on_commit(ms(1100), 0);
        assert_eq!(p.grace_ends_at(), Some(ms(1400)));
        assert!(p.in_grace(ms(1350)));
        assert!(!p.in_grace(ms(1400)));
    }

    #[test]
    fn test_debounced_late_reaction_is_covered_until_commit() {
        let mut p = DebouncedEdge::new(ms(300));
        p.reset();
        assert_eq!(p.judge(&at(500, true)), Verdict::Spare);

        p.on_advance(ms(1000));
        p.on_raw_change(ms(1250));
        // commit for the 1250 change lands at 1550
        assert_eq!(p.judge(&at(1400, false)), Verdict::Grace);
        assert_eq!(p.grace_ends_at(), Some(ms(1550)));
        p.on_commit(ms(1550), 0);
        assert_eq!(p.judge(&at(1850, true)), Verdict::Spare);
    }

    #[test]
    fn test_debounced_raw_change_outside_advance_grace_is_not_a_reaction() {
        let mut p = DebouncedEdge::new(ms(300));
        p.reset();
        p.on_advance(ms(1000));
        p.on_raw_change(ms(1400));
        assert!(!p.in_grace(ms(1400)));
        assert_eq!(p.grace_ends_at(), Some(ms(1300)));
    }

    #[test]
    fn test_window_grace_covers_start_of_second() {
        let mut p = GraceWindow::new(20, GraceAnchor::SecondStart);
        for t in 60..80 {
            assert_eq!(p.judge(&tick(t, false)), Verdict::Grace);
        }
        assert_eq!(p.judge(&tick(80, false)), Verdict::Penalize);
    }

    #[test]
    fn test_window_at_most_one_life_per_second() {
        let mut p = GraceWindow::new(20, GraceAnchor::SecondStart);
        let penalties = (80..120)
            .filter(|t| p.judge(&tick(*t, false)) == Verdict::Penalize)
            .count();
        assert_eq!(penalties, 1);
        assert!(p.life_lost_this_second());

        p.on_advance(Duration::ZERO);
        assert!(!p.life_lost_this_second());
        let penalties = (140..180)
            .filter(|t| p.judge(&tick(*t, false)) == Verdict::Penalize)
            .count();
        assert_eq!(penalties, 1);
    }

    #[test]
    fn test_window_input_anchor_extends_grace() {
        let mut by_second = GraceWindow::new(20, GraceAnchor::SecondStart);
        let mut by_input = GraceWindow::new(20, GraceAnchor::SecondStartOrInput);
        by_second.on_commit(Duration::ZERO, 90);
        by_input.on_commit(Duration::ZERO, 90);

        assert_eq!(by_second.judge(&tick(95, false)), Verdict::Penalize);
        assert_eq!(by_input.judge(&tick(95, false)), Verdict::Grace);
        assert_eq!(by_input.judge(&tick(109, false)), Verdict::Grace);
        assert_eq!(by_input.judge(&tick(110, false)), Verdict::Penalize);
    }

    #[test]
    fn test_policy_for_picks_strategy() {
        let debounced = policy_for(&ReactionMode::Debounced {
            reaction_delay: ms(300),
        });
        assert_eq!(debounced.name(), "debounced");
        assert_eq!(debounced.latch_delay(), Some(ms(300)));

        let window = policy_for(&ReactionMode::Window {
            reaction_ticks: 20,
            anchor: GraceAnchor::SecondStart,
        });
        assert_eq!(window.name(), "window");
        assert_eq!(window.latch_delay(), None);
    }
}
