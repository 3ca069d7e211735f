//! Progress events of a catalog sync pass.
//!
//! The engine only talks to a [`ProgressReporter`]; transports (SSE, a CLI
//! printer, a status table) live with the caller. A pass emits exactly one
//! `starting`, any number of `progress` and `warning` events, and one terminal
//! `complete` or `error`.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::sync::SyncReport;

/// One status event. Serialized with a `status` tag so each event is a
/// self-describing JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SyncEvent {
    Starting {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Progress {
        message: String,
        /// Completion percentage, never decreasing within a pass
        progress: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        processed_sets: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total_sets: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total_cards: Option<usize>,
    },
    /// Non-fatal; the pass goes on
    #[serde(rename_all = "camelCase")]
    Warning {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        set_id: Option<String>,
    },
    Complete {
        message: String,
        stats: SyncReport,
    },
    Error {
        message: String,
    },
}

impl SyncEvent {
    /// True for `complete` and `error`
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Starting { message }
            | Self::Progress { message, .. }
            | Self::Warning { message, .. }
            | Self::Complete { message, .. }
            | Self::Error { message } => message,
        }
    }
}

/// Receives pass events in emission order
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: SyncEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn report(&self, _event: SyncEvent) {}
}

/// Forwards events into an unbounded channel.
///
/// A dropped receiver is not an error: the pass keeps running and its events
/// are discarded.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, event: SyncEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Progress receiver dropped");
        }
    }
}

/// Keeps reported percentages monotonic and within `0..=100`
#[derive(Debug, Default)]
pub(crate) struct ProgressGauge {
    last: u8,
}

impl ProgressGauge {
    /// Percentage for `done` of `total` units mapped onto `[from, to]`
    pub(crate) fn advance(&mut self, from: u8, to: u8, done: usize, total: usize) -> u8 {
        let span = usize::from(to.saturating_sub(from));
        let step = if total == 0 {
            span
        } else {
            span * done.min(total) / total
        };
        let value = usize::from(from) + step;
        let value = u8::try_from(value.min(100)).unwrap_or(100);
        self.last = self.last.max(value);
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn progress_event_serializes_with_status_tag() {
        let event = SyncEvent::Progress {
            message: "Synced Base Set".to_string(),
            progress: 42,
            processed_sets: Some(3),
            total_sets: Some(10),
            total_cards: Some(250),
        };

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "status": "progress",
                "message": "Synced Base Set",
                "progress": 42,
                "processedSets": 3,
                "totalSets": 10,
                "totalCards": 250
            })
        );
    }

    #[test]
    fn warning_omits_missing_set() {
        let event = SyncEvent::Warning {
            message: "Reconcile batch 2 failed".to_string(),
            set_id: None,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"status": "warning", "message": "Reconcile batch 2 failed"})
        );
        assert!(!event.is_terminal());
    }

    #[test]
    fn complete_carries_stats() {
        let event = SyncEvent::Complete {
            message: "done".to_string(),
            stats: SyncReport {
                sets_processed: 2,
                ..SyncReport::default()
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["status"], "complete");
        assert_eq!(value["stats"]["setsProcessed"], 2);
        assert!(event.is_terminal());
    }

    #[test]
    fn gauge_never_goes_backwards() {
        let mut gauge = ProgressGauge::default();
        assert_eq!(gauge.advance(5, 90, 1, 2), 47);
        assert_eq!(gauge.advance(5, 90, 0, 2), 47);
        assert_eq!(gauge.advance(90, 99, 0, 0), 99);
        assert_eq!(gauge.advance(100, 100, 0, 0), 100);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn channel_reporter_preserves_order() {
        let (reporter, mut rx) = ChannelReporter::new();
        reporter.report(SyncEvent::Starting {
            message: "a".to_string(),
        });
        reporter.report(SyncEvent::Error {
            message: "b".to_string(),
        });
        drop(reporter);

        let mut messages = Vec::new();
        while let Some(event) = rx.recv().await {
            messages.push(event.message().to_string());
        }
        assert_eq!(messages, vec!["a", "b"]);
    }
}
