//! Per-command failure attempts of the inbound poller.

use std::collections::HashMap;

/// Failed attempts after which a command is reported as permanently failed.
pub const MAX_ATTEMPTS: u32 = 3;

/// Attempt counts keyed by command id.
///
/// An id is absent until its first failure and removed again once its
/// terminal failure report is accepted. Counts saturate at [`MAX_ATTEMPTS`].
#[derive(Debug, Default)]
pub struct FailureLedger {
    attempts: HashMap<String, u32>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self, id: &str) -> u32 {
        self.attempts.get(id).copied().unwrap_or(0)
    }

    /// Record one failed attempt and return the new count.
    pub fn record_failure(&mut self, id: &str) -> u32 {
        let count = self.attempts.entry(id.to_string()).or_insert(0);
        *count = (*count + 1).min(MAX_ATTEMPTS);
        *count
    }

    /// Whether `id` is waiting for its terminal failure report.
    pub fn is_exhausted(&self, id: &str) -> bool {
        self.attempts(id) >= MAX_ATTEMPTS
    }

    pub fn clear(&mut self, id: &str) {
        self.attempts.remove(id);
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}
