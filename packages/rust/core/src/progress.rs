//! Progress reporting for pipeline runs.
//!
//! The pipeline emits [`ProgressEvent`]s at every stage boundary and for
//! every member. Reporters must be cheap and infallible: a slow or absent
//! observer never holds up a run.

use std::fmt;

use rosterlink_shared::{ProfileUrl, RecordId};
use tokio::sync::broadcast;

use crate::pipeline::PipelineState;

/// Default buffer of [`BroadcastProgress`] before slow observers start lagging.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// A pipeline milestone. `Display` renders the human-readable log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The pipeline moved to a new phase.
    State(PipelineState),
    CollectingMembers,
    MembersCollected { total: usize, team: String },
    MembersFiltered { eligible: usize },
    /// `index` is 1-based.
    MemberStarted { name: String, index: usize, total: usize },
    FallbackSearch { name: String },
    ResolutionFailed { name: String, error: String },
    MemberResolved {
        name: String,
        index: usize,
        total: usize,
        profile_url: ProfileUrl,
    },
    RecordPersisted { name: String, record_id: RecordId },
    Exported { records: usize },
    Completed { store_link: Option<String> },
    Failed { error: String },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State(state) => write!(f, "Pipeline state: {state}"),
            Self::CollectingMembers => f.write_str("Collecting all members of the workspace..."),
            Self::MembersCollected { total, team } => {
                write!(f, "Collected {total} members from {team}")
            }
            Self::MembersFiltered { eligible } => write!(f, "Processing {eligible} members..."),
            Self::MemberStarted { name, index, total } => {
                write!(f, "Processing user {name} ({index}/{total})...")
            }
            Self::FallbackSearch { name } => write!(
                f,
                "No search results found for {name}. Performing an alternative search..."
            ),
            Self::ResolutionFailed { name, error } => {
                write!(f, "An error occurred while processing user {name}: {error}")
            }
            Self::MemberResolved {
                name,
                index,
                total,
                profile_url,
            } => write!(f, "Resolved {name} ({index}/{total}): {profile_url}"),
            Self::RecordPersisted { name, record_id } => {
                write!(f, "Record saved for {name}: {record_id}")
            }
            Self::Exported { records } => write!(f, "Exported {records} records to CSV"),
            Self::Completed { store_link: Some(link) } => {
                write!(f, "Process completed successfully. Records: {link}")
            }
            Self::Completed { store_link: None } => f.write_str("Process completed successfully."),
            Self::Failed { error } => write!(f, "Process failed: {error}"),
        }
    }
}

/// Receives pipeline milestones.
pub trait ProgressReporter: Send + Sync {
    /// Deliver one event. Must not block and must not fail.
    fn report(&self, event: &ProgressEvent);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn report(&self, _event: &ProgressEvent) {}
}

/// Fans rendered events out to any number of subscribers.
///
/// Delivery order matches emission order. Sending never waits: with no
/// subscribers the event is dropped, and a subscriber that falls more than
/// `capacity` events behind skips ahead (observing `RecvError::Lagged`).
#[derive(Clone)]
pub struct BroadcastProgress {
    tx: broadcast::Sender<String>,
}

impl BroadcastProgress {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Attach a new observer; it sees events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastProgress {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST_CAPACITY)
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: &ProgressEvent) {
        // An error only means nobody is listening.
        let _ = self.tx.send(event.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_lines_match_log_format() {
        let started = ProgressEvent::MemberStarted {
            name: "Ada Lovelace".into(),
            index: 2,
            total: 7,
        };
        assert_eq!(started.to_string(), "Processing user Ada Lovelace (2/7)...");

        let filtered = ProgressEvent::MembersFiltered { eligible: 7 };
        assert_eq!(filtered.to_string(), "Processing 7 members...");

        let resolved = ProgressEvent::MemberResolved {
            name: "Ada Lovelace".into(),
            index: 2,
            total: 7,
            profile_url: ProfileUrl::NotFound,
        };
        assert!(resolved.to_string().ends_with("Not found"));
    }

    #[tokio::test]
    async fn broadcast_delivers_in_order() {
        let progress = BroadcastProgress::new(16);
        let mut rx = progress.subscribe();

        progress.report(&ProgressEvent::CollectingMembers);
        progress.report(&ProgressEvent::MembersFiltered { eligible: 3 });

        assert_eq!(
            rx.recv().await.unwrap(),
            "Collecting all members of the workspace..."
        );
        assert_eq!(rx.recv().await.unwrap(), "Processing 3 members...");
    }

    #[test]
    fn broadcast_without_observers_does_not_fail() {
        let progress = BroadcastProgress::default();
        assert_eq!(progress.observer_count(), 0);
        progress.report(&ProgressEvent::Exported { records: 0 });
    }

    #[tokio::test]
    async fn lagging_observer_does_not_block() {
        let progress = BroadcastProgress::new(2);
        let mut rx = progress.subscribe();

        for eligible in 0..10 {
            progress.report(&ProgressEvent::MembersFiltered { eligible });
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert_eq!(rx.recv().await.unwrap(), "Processing 8 members...");
    }
}
