//! Notification seam between the engine and whatever displays its activity.

use crate::state::CounterSnapshot;

/// Kind of notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipCategory {
    Notify,
    Info,
    Warning,
    Error,
}

impl TipCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipCategory::Notify => "notify",
            TipCategory::Info => "info",
            TipCategory::Warning => "warning",
            TipCategory::Error => "error",
        }
    }
}

/// Severity of a notification; lower is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TipLevel {
    Critical = 1,
    Error = 2,
    Info = 3,
    Debug = 4,
}

impl TipLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Receives engine notifications and counter updates.
pub trait Presenter: Send + Sync {
    fn tip(&self, category: TipCategory, level: TipLevel, message: &str);
    fn set_counters(&self, snapshot: CounterSnapshot);
}

/// Routes notifications to `tracing`.
///
/// Tips above the configured threshold are dropped; a threshold of 0
/// silences them entirely.
#[derive(Debug, Clone)]
pub struct TracingPresenter {
    threshold: u8,
}

impl TracingPresenter {
    pub fn new(debug_level: u8) -> Self {
        Self {
            threshold: debug_level,
        }
    }

    pub fn accepts(&self, level: TipLevel) -> bool {
        self.threshold != 0 && level.as_u8() <= self.threshold
    }
}

impl Presenter for TracingPresenter {
    fn tip(&self, category: TipCategory, level: TipLevel, message: &str) {
        if !self.accepts(level) {
            return;
        }
        let category = category.as_str();
        match level {
            TipLevel::Critical | TipLevel::Error => tracing::error!(category, message),
            TipLevel::Info => tracing::info!(category, message),
            TipLevel::Debug => tracing::debug!(category, message),
        }
    }

    fn set_counters(&self, snapshot: CounterSnapshot) {
        tracing::info!(
            errors = snapshot.errors,
            uploads = snapshot.uploads,
            downloads = snapshot.downloads,
            "counters updated"
        );
    }
}
