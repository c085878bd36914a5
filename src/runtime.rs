use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use log::warn;

use crate::session::Session;

/// What one runner step woke up for
#[derive(Clone, Debug)]
pub enum BreathEvent {
    Key(KeyEvent),
    Resize,
    /// Nothing arrived before the next frame or session deadline
    Tick,
    /// The input side is gone; no key will ever arrive again
    Closed,
}

pub trait BreathEventSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<BreathEvent, RecvTimeoutError>;
}

/// Events delivered over an mpsc channel, either by the terminal reader
/// thread or directly by a test.
pub struct ChannelEventSource {
    rx: Receiver<BreathEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<BreathEvent>) -> Self {
        Self { rx }
    }

    /// Spawn a thread forwarding key and resize events from the terminal
    pub fn terminal() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || forward_terminal_events(&tx));
        Self::new(rx)
    }
}

impl BreathEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<BreathEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

fn forward_terminal_events(tx: &Sender<BreathEvent>) {
    loop {
        let ev = match event::read() {
            Ok(CtEvent::Key(key)) => BreathEvent::Key(key),
            Ok(CtEvent::Resize(_, _)) => BreathEvent::Resize,
            Ok(_) => continue,
            Err(e) => {
                warn!("terminal reader stopped: {e}");
                return;
            }
        };
        // receiver dropped: the runner is gone
        if tx.send(ev).is_err() {
            return;
        }
    }
}

/// Runner that maps wall-clock time onto a session's virtual time.
///
/// Each step waits for the next terminal event, redraw frame, or session
/// timer deadline, whichever comes first, then fires every session timer
/// that became due. Events are returned to the caller after the session
/// has caught up, so input always lands on an up-to-date state.
pub struct Runner<E: BreathEventSource> {
    event_source: E,
    frame: Duration,
    epoch: Instant,
}

impl<E: BreathEventSource> Runner<E> {
    pub fn new(event_source: E, frame: Duration) -> Self {
        Self {
            event_source,
            frame,
            epoch: Instant::now(),
        }
    }

    /// Wall-clock time since the runner was created
    pub fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }

    pub fn step(&self, session: &mut Session) -> BreathEvent {
        let mut timeout = self.frame;
        if let Some(deadline) = session.next_deadline() {
            timeout = timeout.min(deadline.saturating_sub(self.elapsed()));
        }

        let ev = match self.event_source.recv_timeout(timeout) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => BreathEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => BreathEvent::Closed,
        };
        session.advance_to(self.elapsed());
        ev
    }
}
