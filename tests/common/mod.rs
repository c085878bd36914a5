#![allow(dead_code)]

use std::time::Duration;

use prime_breathing::Session;

pub fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Drive `session` in 1ms steps until `until`, letting `player` decide after
/// every step whether the key should be held.
pub fn play<F>(session: &mut Session, until: Duration, mut player: F)
where
    F: FnMut(&Session) -> bool,
{
    let step = ms(1);
    let mut t = session.now();
    while t < until {
        t += step;
        session.advance_to(t);
        if !session.is_running() {
            continue;
        }
        let want = player(session);
        if want != session.raw_input() {
            session.on_raw_input(want);
        }
    }
}

pub fn perfect(session: &Session) -> bool {
    session.required_state().wants_pressed()
}

pub fn contrary(session: &Session) -> bool {
    !session.required_state().wants_pressed()
}

/// A player that matches the required state `delay` after each counter change
pub struct LatePlayer {
    delay: Duration,
    counter: u64,
    changed_at: Duration,
}

impl LatePlayer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            counter: 0,
            changed_at: Duration::ZERO,
        }
    }

    pub fn decide(&mut self, session: &Session) -> bool {
        if session.counter() != self.counter {
            self.counter = session.counter();
            self.changed_at = session.now();
        }
        if session.now() >= self.changed_at + self.delay {
            perfect(session)
        } else {
            session.raw_input()
        }
    }
}
