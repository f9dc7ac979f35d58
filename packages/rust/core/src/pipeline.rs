//! End-to-end member resolution: roster → filter → resolve → persist → export.

use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use rosterlink_directory::DirectoryService;
use rosterlink_search::SearchClient;
use rosterlink_shared::{EnrichedRecord, Member, Result, RosterLinkError, RunId, RunSummary};
use rosterlink_storage::PersistenceSink;

use crate::filter::eligible_members;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::resolver::ProfileResolver;

/// Phase of an [`EnrichmentPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Filtering,
    /// `current` is 1-based.
    Resolving { current: usize, total: usize },
    Persisting,
    Exporting,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Filtering => f.write_str("filtering"),
            Self::Resolving { current, total } => write!(f, "resolving ({current}/{total})"),
            Self::Persisting => f.write_str("persisting"),
            Self::Exporting => f.write_str("exporting"),
            Self::Done => f.write_str("done"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Resolves a roster and hands the records to a [`PersistenceSink`].
///
/// Members are resolved strictly one at a time, in roster order. Records are
/// written to the remote store in that same order; the first failed write
/// stops the run and nothing is exported.
pub struct EnrichmentPipeline<'a> {
    search: &'a dyn SearchClient,
    sink: &'a dyn PersistenceSink,
    reporter: &'a dyn ProgressReporter,
    state: PipelineState,
}

impl<'a> EnrichmentPipeline<'a> {
    pub fn new(
        search: &'a dyn SearchClient,
        sink: &'a dyn PersistenceSink,
        reporter: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            search,
            sink,
            reporter,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Filter, resolve, persist and export `raw_members`.
    ///
    /// Per-member lookup failures never fail the run; they show up as
    /// `Error` profile URLs. A failed write returns
    /// [`RosterLinkError::Persistence`] and a failed export returns
    /// [`RosterLinkError::Export`].
    #[instrument(skip_all, fields(team = %team_name, members = raw_members.len()))]
    pub async fn run(
        &mut self,
        raw_members: &[Member],
        team_name: &str,
    ) -> Result<Vec<EnrichedRecord>> {
        let outcome = self.execute(raw_members, team_name).await;
        match &outcome {
            Ok(records) => {
                info!(records = records.len(), "pipeline complete");
                self.transition(PipelineState::Done);
            }
            Err(e) => {
                warn!(error = %e, state = %self.state, "pipeline failed");
                self.transition(PipelineState::Failed);
            }
        }
        outcome
    }

    async fn execute(
        &mut self,
        raw_members: &[Member],
        team_name: &str,
    ) -> Result<Vec<EnrichedRecord>> {
        // --- Filter ---
        self.transition(PipelineState::Filtering);
        let members = eligible_members(raw_members);
        let total = members.len();
        info!(eligible = total, skipped = raw_members.len() - total, "filtered roster");
        self.reporter
            .report(&ProgressEvent::MembersFiltered { eligible: total });

        // --- Resolve ---
        let resolver = ProfileResolver::new(self.search, self.reporter);
        let mut records = Vec::with_capacity(total);
        for (i, member) in members.iter().enumerate() {
            let index = i + 1;
            self.transition(PipelineState::Resolving {
                current: index,
                total,
            });
            self.reporter.report(&ProgressEvent::MemberStarted {
                name: member.name().to_string(),
                index,
                total,
            });

            let result = resolver.resolve(member, team_name).await;

            self.reporter.report(&ProgressEvent::MemberResolved {
                name: result.name.clone(),
                index,
                total,
                profile_url: result.profile_url.clone(),
            });
            records.push(EnrichedRecord::from_resolution(member, result));
        }

        // --- Persist ---
        self.transition(PipelineState::Persisting);
        for (i, record) in records.iter().enumerate() {
            let record_id = self.sink.persist_one(record).await.map_err(|e| {
                RosterLinkError::Persistence {
                    position: i + 1,
                    name: record.name.clone(),
                    message: e.to_string(),
                }
            })?;
            debug!(name = %record.name, %record_id, "record persisted");
            self.reporter.report(&ProgressEvent::RecordPersisted {
                name: record.name.clone(),
                record_id,
            });
        }

        // --- Export ---
        self.transition(PipelineState::Exporting);
        self.sink.export_all(&records).await.map_err(|e| match e {
            RosterLinkError::Export(_) => e,
            other => RosterLinkError::Export(other.to_string()),
        })?;
        self.reporter.report(&ProgressEvent::Exported {
            records: records.len(),
        });

        Ok(records)
    }

    /// Move to `next`. Only a change of phase is reported; advancing the
    /// member counter within `Resolving` is covered by member events.
    fn transition(&mut self, next: PipelineState) {
        let previous = mem::replace(&mut self.state, next);
        if mem::discriminant(&previous) != mem::discriminant(&next) {
            debug!(from = %previous, to = %next, "state transition");
            self.reporter.report(&ProgressEvent::State(next));
        }
    }
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

/// Extra behavior for [`run_roster`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Write a member snapshot (id, name, automated flag, profile fields)
    /// as JSON here before resolving.
    pub members_snapshot: Option<PathBuf>,
}

/// Collect the roster from `directory`, verify `sink`, then run the
/// [`EnrichmentPipeline`].
///
/// Directory and sink credential failures abort before any search page is
/// opened. Completion or failure is reported to `reporter`.
#[instrument(skip_all)]
pub async fn run_roster(
    directory: &dyn DirectoryService,
    search: &dyn SearchClient,
    sink: &dyn PersistenceSink,
    reporter: &dyn ProgressReporter,
    options: &RunOptions,
) -> Result<RunSummary> {
    let run_id = RunId::new();
    info!(%run_id, "starting run");

    match execute_run(run_id, directory, search, sink, reporter, options).await {
        Ok(summary) => {
            info!(
                run_id = %summary.run_id,
                records = summary.records.len(),
                found = summary.found(),
                elapsed_ms = summary.elapsed.as_millis() as u64,
                "run complete"
            );
            reporter.report(&ProgressEvent::Completed {
                store_link: sink.store_link(),
            });
            Ok(summary)
        }
        Err(e) => {
            reporter.report(&ProgressEvent::Failed {
                error: e.to_string(),
            });
            Err(e)
        }
    }
}

async fn execute_run(
    run_id: RunId,
    directory: &dyn DirectoryService,
    search: &dyn SearchClient,
    sink: &dyn PersistenceSink,
    reporter: &dyn ProgressReporter,
    options: &RunOptions,
) -> Result<RunSummary> {
    let started_at = Utc::now();
    let start = Instant::now();

    // --- Collect ---
    reporter.report(&ProgressEvent::CollectingMembers);
    let members = directory.list_members().await?;
    let team_name = directory.team_name().await?;
    info!(members = members.len(), team = %team_name, "roster collected");
    reporter.report(&ProgressEvent::MembersCollected {
        total: members.len(),
        team: team_name.clone(),
    });

    if let Some(path) = &options.members_snapshot {
        write_snapshot(path, &members)?;
    }

    // --- Pre-flight ---
    sink.verify().await?;

    // --- Pipeline ---
    let mut pipeline = EnrichmentPipeline::new(search, sink, reporter);
    let records = pipeline.run(&members, &team_name).await?;

    Ok(RunSummary {
        run_id,
        team_name,
        members_total: members.len(),
        records,
        store_link: sink.store_link().unwrap_or_default(),
        started_at,
        elapsed: start.elapsed(),
    })
}

/// Write the parsed members as pretty-printed JSON, creating parent
/// directories. Directory fields outside [`Member`] are not kept.
fn write_snapshot(path: &Path, members: &[Member]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| RosterLinkError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(members)
        .map_err(|e| RosterLinkError::parse(format!("failed to serialize roster: {e}")))?;
    std::fs::write(path, json).map_err(|e| RosterLinkError::io(path, e))?;
    debug!(path = %path.display(), "member snapshot written");
    Ok(())
}
