//! Sync run history model

use serde::{Deserialize, Serialize};

/// Final state of a recorded sync pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncRunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl SyncRunStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            _ => Self::Running,
        }
    }
}

/// Recorded catalog sync pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRun {
    /// Row identifier
    pub id: i64,
    /// Pass epoch (unix ms)
    pub started_at: i64,
    /// Completion timestamp (unix ms), unset while running
    pub finished_at: Option<i64>,
    pub status: SyncRunStatus,
    pub sets_processed: i64,
    pub cards_processed: i64,
    pub sets_removed: i64,
    pub holdings_migrated: i64,
    pub warnings: i64,
}
