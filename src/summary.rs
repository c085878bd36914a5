use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

use crate::session::{Session, SessionState};

/// End-of-session result, printed when the harness exits
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub counter_reached: u64,
    pub lives_left: u8,
    pub state: SessionState,
    pub mode: String,
    pub hard_mode: bool,
    pub finished_at: DateTime<Local>,
}

impl SessionSummary {
    pub fn from_session(session: &Session) -> Self {
        Self::at(session, Local::now())
    }

    pub fn at(session: &Session, finished_at: DateTime<Local>) -> Self {
        Self {
            counter_reached: session.counter(),
            lives_left: session.lives(),
            state: session.state(),
            mode: session.policy_name().to_string(),
            hard_mode: session.hard_mode(),
            finished_at,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {} with {} {} left ({} mode{})",
            self.finished_at.format("%Y-%m-%d %H:%M:%S"),
            self.state,
            self.counter_reached,
            self.lives_left,
            if self.lives_left == 1 { "life" } else { "lives" },
            self.mode,
            if self.hard_mode { ", hard" } else { "" }
        )
    }
}
