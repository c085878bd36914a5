use log::{debug, info};
use serde::Serialize;
use std::time::Duration;

use crate::config::GameConfig;
use crate::latch::InputLatch;
use crate::policy::{policy_for, Moment, ReactionPolicy, Verdict};
use crate::prime::RequiredState;
use crate::timer::{Fired, TimerId, TimerKind, Timers};

pub const STARTING_LIVES: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, strum_macros::Display)]
pub enum SessionState {
    #[default]
    Stopped,
    Running,
    GameOver,
}

/// Read-only view of everything the presentation layer may show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub counter: u64,
    pub lives: u8,
    pub state: SessionState,
    pub effective_input: bool,
    pub raw_input: bool,
    pub required: RequiredState,
    pub hard_mode: bool,
    /// Whether the hold/release prompt should be displayed
    pub show_prompt: bool,
}

/// One game of Prime Breathing.
///
/// Owns the counter, lives, input latch, the active reaction policy and
/// every scheduled timer. All mutation goes through the clock tick, the
/// latch commit and the grace check callbacks, or the raw input handlers;
/// the owner serializes them by calling `advance_to` before delivering input.
#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    state: SessionState,
    counter: u64,
    lives: u8,
    ticker: u64,
    latch: InputLatch,
    policy: Box<dyn ReactionPolicy>,
    timers: Timers,
    clock_timer: Option<TimerId>,
    grace_timer: Option<TimerId>,
}

impl Session {
    pub fn new(config: GameConfig) -> Self {
        Self {
            policy: policy_for(&config.mode),
            config,
            state: SessionState::Stopped,
            counter: 0,
            lives: STARTING_LIVES,
            ticker: 1,
            latch: InputLatch::new(),
            timers: Timers::new(),
            clock_timer: None,
            grace_timer: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn ticker(&self) -> u64 {
        self.ticker
    }

    pub fn raw_input(&self) -> bool {
        self.latch.raw()
    }

    pub fn effective_input(&self) -> bool {
        self.latch.effective()
    }

    pub fn required_state(&self) -> RequiredState {
        RequiredState::for_counter(self.counter)
    }

    pub fn hard_mode(&self) -> bool {
        self.config.hard_mode
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Virtual time of the last delivered event, relative to the session epoch
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn clock_handle(&self) -> Option<TimerId> {
        self.clock_timer
    }

    pub fn latch_handle(&self) -> Option<TimerId> {
        self.latch.pending().map(|p| p.timer)
    }

    pub fn grace_handle(&self) -> Option<TimerId> {
        self.grace_timer
    }

    pub fn has_scheduled_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            counter: self.counter,
            lives: self.lives,
            state: self.state,
            effective_input: self.latch.effective(),
            raw_input: self.latch.raw(),
            required: self.required_state(),
            hard_mode: self.config.hard_mode,
            show_prompt: !self.config.hard_mode,
        }
    }

    /// Fresh game: clears everything and starts the clock. Safe to call at any time.
    pub fn start(&mut self) {
        self.halt();
        self.clear();
        self.state = SessionState::Running;
        self.clock_timer = Some(
            self.timers
                .schedule_interval(self.config.clock.tick_period, TimerKind::ClockTick),
        );
        info!(
            "session started: policy={}, tick={:?}, ticks/advance={}",
            self.policy.name(),
            self.config.clock.tick_period,
            self.config.clock.ticks_per_advance
        );
    }

    /// Cancel every timer. Nothing scheduled before this call will run.
    pub fn stop(&mut self) {
        self.halt();
        if self.state != SessionState::Stopped {
            info!(
                "session stopped at counter {} with {} lives",
                self.counter, self.lives
            );
        }
        self.state = SessionState::Stopped;
    }

    /// Stop and zero the state without starting the clock
    pub fn reset(&mut self) {
        self.stop();
        self.clear();
        debug!("session reset");
    }

    pub fn on_raw_input_down(&mut self) {
        self.on_raw_input(true);
    }

    pub fn on_raw_input_up(&mut self) {
        self.on_raw_input(false);
    }

    pub fn on_raw_input(&mut self, pressed: bool) {
        if !self.is_running() {
            return;
        }
        let changed = if pressed {
            self.latch.press()
        } else {
            self.latch.release()
        };
        let Some(pressed) = changed else {
            return;
        };

        let now = self.timers.now();
        self.policy.on_raw_change(now);

        match self.policy.latch_delay() {
            Some(delay) => {
                if let Some(previous) = self.latch.take_pending() {
                    self.timers.cancel(previous.timer);
                }
                let id = self
                    .timers
                    .schedule_timeout(delay, TimerKind::LatchCommit { pressed });
                self.latch.defer(id, pressed);
                self.arm_grace_check();
            }
            None => self.commit(pressed),
        }
    }

    /// Move time forward to `t`, firing every timer due on the way in order
    pub fn advance_to(&mut self, t: Duration) {
        while self.is_running() {
            match self.timers.pop_due(t) {
                Some(fired) => self.fire(fired),
                None => break,
            }
        }
        self.timers.advance_to(t);
    }

    /// Dispatch a fired timer. Stale handles and fires outside a running
    /// session are dropped.
    pub fn fire(&mut self, fired: Fired) {
        if !self.is_running() {
            debug!("dropping {:?} outside a running session", fired.kind);
            return;
        }
        match fired.kind {
            TimerKind::ClockTick if self.clock_timer == Some(fired.id) => self.on_clock_tick(),
            TimerKind::LatchCommit { pressed } if self.latch.is_pending(fired.id) => {
                self.commit(pressed)
            }
            TimerKind::GraceCheck if self.grace_timer == Some(fired.id) => {
                self.grace_timer = None;
                self.evaluate();
            }
            kind => debug!("dropping stale {kind:?}"),
        }
    }

    /// Compare effective input with the required state and apply the verdict
    pub fn evaluate(&mut self) {
        if !self.is_running() {
            return;
        }
        let moment = Moment {
            now: self.timers.now(),
            ticker: self.ticker,
            position: self.config.clock.position(self.ticker),
            correct: self.latch.effective() == self.required_state().wants_pressed(),
        };
        if self.policy.judge(&moment) == Verdict::Penalize {
            self.lose_life();
        }
    }

    pub fn lose_life(&mut self) {
        if !self.is_running() {
            return;
        }
        self.lives = self.lives.saturating_sub(1);
        info!(
            "life lost at counter {} ({}), {} left",
            self.counter,
            self.required_state(),
            self.lives
        );
        if self.lives == 0 {
            self.game_over();
        }
    }

    fn on_clock_tick(&mut self) {
        if self.config.clock.is_boundary(self.ticker) {
            self.counter += 1;
            self.policy.on_advance(self.timers.now());
            self.arm_grace_check();
            debug!("counter -> {} ({})", self.counter, self.required_state());
        }
        self.evaluate();
        self.ticker += 1;
    }

    fn commit(&mut self, pressed: bool) {
        let now = self.timers.now();
        if self.latch.commit(pressed) {
            debug!("input -> {}", if pressed { "held" } else { "released" });
        }
        self.policy.on_commit(now, self.ticker);
        self.arm_grace_check();
        self.evaluate();
    }

    /// Keep one grace-check timer pointed at the end of the current grace period
    fn arm_grace_check(&mut self) {
        if let Some(id) = self.grace_timer.take() {
            self.timers.cancel(id);
        }
        if let Some(at) = self.policy.grace_ends_at() {
            if at > self.timers.now() {
                self.grace_timer = Some(self.timers.schedule_at(at, TimerKind::GraceCheck));
            }
        }
    }

    fn game_over(&mut self) {
        self.halt();
        self.state = SessionState::GameOver;
        info!("game over at counter {}", self.counter);
    }

    fn halt(&mut self) {
        if let Some(id) = self.clock_timer.take() {
            self.timers.cancel(id);
        }
        if let Some(pending) = self.latch.take_pending() {
            self.timers.cancel(pending.timer);
        }
        if let Some(id) = self.grace_timer.take() {
            self.timers.cancel(id);
        }
    }

    fn clear(&mut self) {
        self.counter = 0;
        self.lives = STARTING_LIVES;
        self.ticker = 1;
        self.latch.clear();
        self.policy.reset();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockConfig;
    use crate::config::ReactionMode;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn window_session() -> Session {
        Session::new(GameConfig::new(ClockConfig::smooth(), ReactionMode::window()))
    }

    #[test]
    fn test_new_session_is_stopped() {
        let s = Session::default();
        assert_eq!(s.state(), SessionState::Stopped);
        assert_eq!(s.counter(), 0);
        assert_eq!(s.lives(), STARTING_LIVES);
        assert!(!s.has_scheduled_timers());
    }

    #[test]
    fn test_start_resets_and_runs() {
        let mut s = Session::default();
        s.start();
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.counter(), 0);
        assert_eq!(s.lives(), 3);
        assert_eq!(s.ticker(), 1);
        assert!(!s.effective_input());
        assert!(s.clock_handle().is_some());
    }

    #[test]
    fn test_input_ignored_when_not_running() {
        let mut s = Session::default();
        s.on_raw_input_down();
        assert!(!s.raw_input());
        assert!(!s.has_scheduled_timers());
    }

    #[test]
    fn test_debounced_input_becomes_effective_after_delay() {
        let mut s = Session::default();
        s.start();
        s.advance_to(ms(10));
        s.on_raw_input_down();
        assert!(s.raw_input());
        assert!(!s.effective_input());
        assert!(s.latch_handle().is_some());

        s.advance_to(ms(309));
        assert!(!s.effective_input());
        s.advance_to(ms(310));
        assert!(s.effective_input());
        assert_eq!(s.latch_handle(), None);
    }

    #[test]
    fn test_debounced_new_transition_replaces_pending_commit() {
        let mut s = Session::default();
        s.start();
        s.on_raw_input_down();
        let first = s.latch_handle();
        s.advance_to(ms(100));
        s.on_raw_input_up();
        assert_ne!(s.latch_handle(), first);

        s.advance_to(ms(350));
        assert!(!s.effective_input());
        s.advance_to(ms(400));
        assert!(!s.effective_input());
        assert!(!s.raw_input());
    }

    #[test]
    fn test_window_input_is_immediate() {
        let mut s = window_session();
        s.start();
        s.on_raw_input_down();
        assert!(s.effective_input());
        assert_eq!(s.latch_handle(), None);
    }

    #[test]
    fn test_counter_advances_once_per_second() {
        let mut s = window_session();
        s.start();
        s.on_raw_input_down();
        s.advance_to(ms(999));
        assert_eq!(s.counter(), 0);
        s.advance_to(ms(1001));
        assert_eq!(s.counter(), 1);
        s.advance_to(ms(3001));
        assert_eq!(s.counter(), 3);
    }

    #[test]
    fn test_classic_clock_advances_every_tick() {
        let mut s = Session::new(GameConfig::new(
            ClockConfig::classic(),
            ReactionMode::debounced(),
        ));
        s.start();
        s.advance_to(ms(1199));
        assert_eq!(s.counter(), 0);
        s.advance_to(ms(1200));
        assert_eq!(s.counter(), 1);
        s.advance_to(ms(3600));
        assert_eq!(s.counter(), 3);
    }

    #[test]
    fn test_grace_check_judges_after_an_advance() {
        let mut s = Session::new(GameConfig::new(
            ClockConfig::classic(),
            ReactionMode::debounced(),
        ));
        s.start();
        // held through 0 and 1, still held when 2 asks for a release
        s.on_raw_input_down();
        s.advance_to(ms(2400));
        assert_eq!(s.counter(), 2);
        assert!(s.effective_input());
        assert!(s.grace_handle().is_some());
        assert_eq!(s.next_deadline(), Some(ms(2700)));

        s.advance_to(ms(2699));
        assert_eq!(s.lives(), 3);
        s.advance_to(ms(2700));
        assert_eq!(s.lives(), 2);
        assert_eq!(s.grace_handle(), None);
        assert_eq!(s.next_deadline(), Some(ms(3600)));
    }

    #[test]
    fn test_stale_grace_check_is_dropped() {
        let mut s = Session::new(GameConfig::new(
            ClockConfig::classic(),
            ReactionMode::debounced(),
        ));
        s.start();
        s.on_raw_input_down();
        s.advance_to(ms(1200));
        let stale = s.grace_handle().unwrap();
        s.advance_to(ms(2400));
        assert_ne!(s.grace_handle(), Some(stale));

        // an old handle must not take the live grace check with it
        s.fire(Fired::new(stale, TimerKind::GraceCheck));
        assert_eq!(s.lives(), 3);
        assert!(s.grace_handle().is_some());
    }

    #[test]
    fn test_lose_life_and_evaluate_are_noops_when_stopped() {
        let mut s = Session::default();
        s.lose_life();
        s.evaluate();
        assert_eq!(s.lives(), 3);

        s.start();
        s.stop();
        s.lose_life();
        assert_eq!(s.lives(), 3);
    }

    #[test]
    fn test_three_lives_lost_is_game_over() {
        let mut s = Session::default();
        s.start();
        s.lose_life();
        s.lose_life();
        assert_eq!(s.state(), SessionState::Running);
        s.lose_life();
        assert_eq!(s.lives(), 0);
        assert_eq!(s.state(), SessionState::GameOver);
        assert!(!s.has_scheduled_timers());
        s.lose_life();
        assert_eq!(s.lives(), 0);
    }

    #[test]
    fn test_stop_cancels_every_handle() {
        let mut s = Session::default();
        s.start();
        s.advance_to(ms(1001));
        s.on_raw_input_down();
        assert!(s.has_scheduled_timers());
        s.stop();
        assert_eq!(s.state(), SessionState::Stopped);
        assert_eq!(s.clock_handle(), None);
        assert_eq!(s.latch_handle(), None);
        assert_eq!(s.grace_handle(), None);
        assert!(!s.has_scheduled_timers());
    }

    #[test]
    fn test_stop_after_game_over_returns_to_stopped() {
        let mut s = Session::default();
        s.start();
        for _ in 0..3 {
            s.lose_life();
        }
        assert_eq!(s.state(), SessionState::GameOver);
        s.stop();
        assert_eq!(s.state(), SessionState::Stopped);
        assert_eq!(s.lives(), 0);
    }

    #[test]
    fn test_restart_is_idempotent() {
        let mut s = window_session();
        s.start();
        s.advance_to(ms(2500));
        s.on_raw_input_down();
        s.start();
        assert_eq!(s.counter(), 0);
        assert_eq!(s.lives(), 3);
        assert!(!s.raw_input());
        assert!(!s.effective_input());
        assert_eq!(s.ticker(), 1);
        assert_eq!(s.state(), SessionState::Running);
    }

    #[test]
    fn test_snapshot_follows_hard_mode() {
        let s = Session::new(GameConfig::default().with_hard_mode(true));
        let snap = s.snapshot();
        assert!(snap.hard_mode);
        assert!(!snap.show_prompt);
        assert_eq!(snap.required, RequiredState::Hold);
    }
}
