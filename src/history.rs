use crate::{
    store::{self, Storage},
    timer::Mode,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

const DATE_FMT: &str = "%b %-d, %-I:%M %p";

/// One completed focus or break interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub mode: Mode,
    /// Configured minutes for `mode` at the moment it completed.
    pub duration: u32,
    /// Display string, e.g. `Oct 15, 3:04 PM`.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Local>>,
}

impl Session {
    pub fn new(mode: Mode, duration: u32, at: DateTime<Local>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mode,
            duration,
            date: at.format(DATE_FMT).to_string(),
            completed_at: Some(at),
        }
    }
}

/// Newest-first log of completed sessions. Append and clear only.
pub struct HistoryLog {
    sessions: Vec<Session>,
    storage: Rc<dyn Storage>,
}

impl HistoryLog {
    pub fn load(storage: Rc<dyn Storage>) -> Self {
        let sessions = store::load(storage.as_ref(), store::HISTORY).unwrap_or_default();
        Self { sessions, storage }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn append(&mut self, session: Session) {
        self.sessions.insert(0, session);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.persist();
        tracing::info!("history cleared");
    }

    fn persist(&self) {
        store::persist(self.storage.as_ref(), store::HISTORY, &self.sessions);
    }
}
