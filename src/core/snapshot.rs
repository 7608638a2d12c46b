use chrono::{DateTime, Utc};

use crate::api::frank_energie::{SessionWindow, Summary, models::Session};

/// Last successfully fetched data of a single battery.
#[must_use]
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub summary: Option<Summary>,
    pub sessions: Option<SessionWindow>,
    pub refreshed_at: DateTime<Utc>,

    /// Problems with the response that did not fail the refresh.
    pub diagnostics: Vec<String>,
}

impl Snapshot {
    pub fn current_trading_result(&self) -> Option<f64> {
        self.sessions.as_ref()?.current_trading_result()
    }

    pub fn last_session(&self) -> Option<&Session> {
        self.sessions.as_ref()?.last_session()
    }

    pub fn n_sessions(&self) -> usize {
        self.sessions.as_ref().map_or(0, |window| window.sessions.len())
    }
}
