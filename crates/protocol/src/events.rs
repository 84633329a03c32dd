//! Change events produced by the monitor's diff pass.
//!
//! Each event renders to one human-readable notification block via `Display`.
//! The monitor concatenates all events of a cycle into a single outgoing
//! message, so ordering here is ordering in the delivered text.

use serde::{Deserialize, Serialize};

/// One changed aggregate counter: `previous -> current (signed delta)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDelta {
    pub name: String,
    pub previous: i64,
    pub current: i64,
}

impl CounterDelta {
    pub fn delta(&self) -> i64 {
        self.current - self.previous
    }
}

impl std::fmt::Display for CounterDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} -> {} ({:+})",
            self.name,
            self.previous,
            self.current,
            self.delta()
        )
    }
}

/// A single notification-worthy change observed between two polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ChangeEvent {
    /// The session's tracked admin came online. Always first in a cycle.
    TrackedJoined { login: String },
    /// The session's tracked admin went offline. Always first in a cycle.
    TrackedLeft { login: String },
    /// An admin appeared in the online set.
    Joined { login: String, level: u8 },
    /// An admin disappeared from the online set.
    Left { login: String },
    /// One or more aggregate report counters changed this cycle.
    StatsChanged { changes: Vec<CounterDelta> },
    /// An admin's report count went up.
    ReportsGained { login: String, delta: u32, total: u32 },
    /// An admin's report count went down.
    ReportsClosed { login: String, delta: u32, total: u32 },
}

impl std::fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrackedJoined { login } => write!(f, "Tracked admin {} joined!", login),
            Self::TrackedLeft { login } => write!(f, "Tracked admin {} left!", login),
            Self::Joined { login, level } => write!(f, "+ {} joined (Level {})", login, level),
            Self::Left { login } => write!(f, "- {} left", login),
            Self::StatsChanged { changes } => {
                write!(f, "Stats changed:")?;
                for change in changes {
                    write!(f, "\n  {}", change)?;
                }
                Ok(())
            }
            Self::ReportsGained {
                login,
                delta,
                total,
            } => write!(f, "{} +{} report (total: {})", login, delta, total),
            Self::ReportsClosed {
                login,
                delta,
                total,
            } => write!(f, "{} closed {} (left: {})", login, delta, total),
        }
    }
}

/// Join a cycle's events into the outgoing notification payload.
/// Returns `None` when there is nothing to deliver.
pub fn render_notification(events: &[ChangeEvent]) -> Option<String> {
    if events.is_empty() {
        return None;
    }
    let body = events
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n\n");
    Some(format!("Notifications\n\n{}", body))
}
