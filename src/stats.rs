use chrono::NaiveDate;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::universe::EventKind;

/// Counters shared between the generator loop and the progress reporter.
#[derive(Debug, Default)]
pub struct Stats {
    quotes: AtomicU64,
    trades: AtomicU64,
    sessions: AtomicU64,
    session_date: RwLock<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub events: u64,
    pub quotes: u64,
    pub trades: u64,
    pub sessions: u64,
    pub session_date: Option<NaiveDate>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self, kind: EventKind) {
        match kind {
            EventKind::Quote => self.quotes.fetch_add(1, Ordering::Relaxed),
            EventKind::Trade => self.trades.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_session(&self, date: NaiveDate) {
        self.sessions.fetch_add(1, Ordering::Relaxed);
        *self.session_date.write() = Some(date);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let quotes = self.quotes.load(Ordering::Relaxed);
        let trades = self.trades.load(Ordering::Relaxed);
        StatsSnapshot {
            events: quotes + trades,
            quotes,
            trades,
            sessions: self.sessions.load(Ordering::Relaxed),
            session_date: *self.session_date.read(),
        }
    }
}
