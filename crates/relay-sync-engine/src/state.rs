//! State shared between the engine and its two loops.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifiers assigned by the server at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentifiers {
    pub enterprise_id: String,
    pub user_id: String,
}

impl SessionIdentifiers {
    pub fn new(enterprise_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            enterprise_id: enterprise_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub errors: u64,
    pub uploads: u64,
    pub downloads: u64,
}

/// Process-lifetime activity counters. Only ever incremented.
#[derive(Debug, Default)]
pub struct Counters {
    errors: AtomicU64,
    uploads: AtomicU64,
    downloads: AtomicU64,
}

impl Counters {
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload(&self) {
        self.uploads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_download(&self) {
        self.downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            errors: self.errors.load(Ordering::Relaxed),
            uploads: self.uploads.load(Ordering::Relaxed),
            downloads: self.downloads.load(Ordering::Relaxed),
        }
    }
}

/// Counters plus the session identifiers, shared by reference count.
///
/// Identifiers are written by login only; both loops read them.
#[derive(Debug, Default)]
pub struct SharedState {
    counters: Counters,
    session: RwLock<Option<SessionIdentifiers>>,
}

impl SharedState {
    pub fn new(session: Option<SessionIdentifiers>) -> Self {
        Self {
            counters: Counters::default(),
            session: RwLock::new(session),
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn session(&self) -> Option<SessionIdentifiers> {
        self.session.read().clone()
    }

    pub fn set_session(&self, session: SessionIdentifiers) {
        *self.session.write() = Some(session);
    }
}
