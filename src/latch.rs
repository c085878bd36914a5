use crate::timer::TimerId;

/// Raw vs effective player input.
///
/// `raw` follows the key/pointer immediately. `effective` is what the judge
/// compares against the required state; it either follows `raw` at once or
/// after a reaction delay, depending on the active policy.
#[derive(Debug, Default, Clone)]
pub struct InputLatch {
    raw: bool,
    effective: bool,
    pending: Option<PendingCommit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCommit {
    pub timer: TimerId,
    pub pressed: bool,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> bool {
        self.raw
    }

    pub fn effective(&self) -> bool {
        self.effective
    }

    pub fn pending(&self) -> Option<PendingCommit> {
        self.pending
    }

    /// Returns the new raw state only when it actually changed
    pub fn press(&mut self) -> Option<bool> {
        self.set_raw(true)
    }

    pub fn release(&mut self) -> Option<bool> {
        self.set_raw(false)
    }

    fn set_raw(&mut self, pressed: bool) -> Option<bool> {
        if self.raw == pressed {
            return None;
        }
        self.raw = pressed;
        Some(pressed)
    }

    /// Record a scheduled commit, handing back the one it replaces
    pub fn defer(&mut self, timer: TimerId, pressed: bool) -> Option<PendingCommit> {
        self.pending.replace(PendingCommit { timer, pressed })
    }

    pub fn take_pending(&mut self) -> Option<PendingCommit> {
        self.pending.take()
    }

    /// Whether `timer` is the commit currently waiting to land
    pub fn is_pending(&self, timer: TimerId) -> bool {
        self.pending.is_some_and(|p| p.timer == timer)
    }

    /// Make `pressed` effective. Returns true if the effective state changed.
    pub fn commit(&mut self, pressed: bool) -> bool {
        self.pending = None;
        let changed = self.effective != pressed;
        self.effective = pressed;
        changed
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
