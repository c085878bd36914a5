use std::time::Duration;

/// Handle to a scheduled timer. Handles are never reused within one `Timers`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// What a timer does when it fires
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    ClockTick,
    LatchCommit { pressed: bool },
    GraceCheck,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub kind: TimerKind,
}

impl Fired {
    pub fn new(id: TimerId, kind: TimerKind) -> Self {
        Self { id, kind }
    }
}

#[derive(Clone, Debug)]
struct Entry {
    id: TimerId,
    deadline: Duration,
    period: Option<Duration>,
    kind: TimerKind,
}

/// Virtual-time timer queue.
///
/// Time only moves when the owner calls `advance_to` or `pop_due`, which
/// keeps every fire serialized with input handling on one thread.
#[derive(Debug, Default)]
pub struct Timers {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn schedule_timeout(&mut self, delay: Duration, kind: TimerKind) -> TimerId {
        self.insert(delay, None, kind)
    }

    pub fn schedule_interval(&mut self, period: Duration, kind: TimerKind) -> TimerId {
        self.insert(period, Some(period), kind)
    }

    /// Schedule a timeout at an absolute time; past times fire on the next poll
    pub fn schedule_at(&mut self, at: Duration, kind: TimerKind) -> TimerId {
        let delay = at.saturating_sub(self.now);
        self.insert(delay, None, kind)
    }

    fn insert(&mut self, delay: Duration, period: Option<Duration>, kind: TimerKind) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            deadline: self.now + delay,
            period,
            kind,
        });
        id
    }

    /// Returns false if the handle already fired (timeouts) or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Move time forward without firing anything. Time never goes backwards.
    pub fn advance_to(&mut self, t: Duration) {
        if t > self.now {
            self.now = t;
        }
    }

    /// Pop the earliest timer due at or before `until`.
    ///
    /// Time is moved to the timer's deadline; intervals are re-armed one
    /// period later. Equal deadlines fire in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= until)
            .min_by_key(|(_, e)| (e.deadline, e.id.0))
            .map(|(i, _)| i)?;

        let deadline = self.entries[idx].deadline;
        self.advance_to(deadline);

        let entry = &self.entries[idx];
        let fired = Fired::new(entry.id, entry.kind);
        let period = entry.period;
        match period {
            Some(period) if !period.is_zero() => self.entries[idx].deadline += period,
            _ => {
                self.entries.remove(idx);
            }
        }
        Some(fired)
    }
}
