//! In-memory collaborators for pipeline and resolver tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rosterlink_directory::DirectoryService;
use rosterlink_search::{SearchClient, SearchHit, SearchPage};
use rosterlink_shared::{
    EnrichedRecord, Member, MemberProfile, RecordId, Result, RosterLinkError,
};
use rosterlink_storage::PersistenceSink;

use crate::progress::{ProgressEvent, ProgressReporter};

pub fn member(id: &str, name: &str, email: &str) -> Member {
    Member {
        id: id.into(),
        real_name: Some(name.into()),
        is_automated: false,
        profile: MemberProfile {
            title: Some("Engineer".into()),
            email: Some(email.into()),
            image_url: Some(format!("https://avatars.example.com/{id}.png")),
        },
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Once,
    UntilResults,
}

pub enum Reply {
    Hits(Vec<SearchHit>),
    Fail(String),
}

impl Reply {
    pub fn hits(hrefs: &[&str]) -> Self {
        Self::Hits(hrefs.iter().map(|h| SearchHit::new(*h)).collect())
    }

    pub fn fail(message: &str) -> Self {
        Self::Fail(message.into())
    }
}

#[derive(Default)]
struct SearchLog {
    calls: Vec<(SearchMode, String)>,
    opened: usize,
    closed: usize,
    live: usize,
    max_live: usize,
}

enum Behavior {
    /// Every query yields one profile link slugged from the member name.
    Echo,
    /// Replies are consumed in order; once exhausted, queries yield nothing.
    Scripted(Mutex<VecDeque<Reply>>),
    /// Pages cannot be opened.
    Unavailable,
}

pub struct StubSearch {
    behavior: Arc<Behavior>,
    log: Arc<Mutex<SearchLog>>,
}

impl StubSearch {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior: Arc::new(behavior),
            log: Arc::default(),
        }
    }

    pub fn echo() -> Self {
        Self::with(Behavior::Echo)
    }

    pub fn scripted(replies: Vec<Reply>) -> Self {
        Self::with(Behavior::Scripted(Mutex::new(replies.into())))
    }

    pub fn unavailable() -> Self {
        Self::with(Behavior::Unavailable)
    }

    pub fn calls(&self) -> Vec<(SearchMode, String)> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn opened(&self) -> usize {
        self.log.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.log.lock().unwrap().closed
    }

    pub fn max_live_pages(&self) -> usize {
        self.log.lock().unwrap().max_live
    }
}

#[async_trait]
impl SearchClient for StubSearch {
    async fn open_page(&self) -> Result<Box<dyn SearchPage>> {
        if matches!(*self.behavior, Behavior::Unavailable) {
            return Err(RosterLinkError::Network("connection refused".into()));
        }
        let mut log = self.log.lock().unwrap();
        log.opened += 1;
        log.live += 1;
        log.max_live = log.max_live.max(log.live);
        Ok(Box::new(StubPage {
            behavior: Arc::clone(&self.behavior),
            log: Arc::clone(&self.log),
        }))
    }
}

struct StubPage {
    behavior: Arc<Behavior>,
    log: Arc<Mutex<SearchLog>>,
}

impl StubPage {
    fn answer(&self, mode: SearchMode, query: &str) -> Result<Vec<SearchHit>> {
        self.log
            .lock()
            .unwrap()
            .calls
            .push((mode, query.to_string()));

        let hits = match &*self.behavior {
            Behavior::Echo => {
                let name = query.split(" site:").next().unwrap_or_default();
                let slug = name.to_lowercase().replace(' ', "-");
                Ok(vec![SearchHit::new(format!(
                    "https://www.linkedin.com/in/{slug}"
                ))])
            }
            Behavior::Scripted(replies) => match replies.lock().unwrap().pop_front() {
                Some(Reply::Hits(hits)) => Ok(hits),
                Some(Reply::Fail(message)) => Err(RosterLinkError::Search(message)),
                None => Ok(Vec::new()),
            },
            Behavior::Unavailable => unreachable!("no page is opened when unavailable"),
        }?;

        // Mirrors the HTML client: an empty fallback page is a timeout.
        if mode == SearchMode::UntilResults && hits.is_empty() {
            return Err(RosterLinkError::Search("no results before timeout".into()));
        }
        Ok(hits)
    }
}

#[async_trait]
impl SearchPage for StubPage {
    async fn search(&mut self, query: &str) -> Result<Vec<SearchHit>> {
        self.answer(SearchMode::Once, query)
    }

    async fn search_until_results(&mut self, query: &str) -> Result<Vec<SearchHit>> {
        self.answer(SearchMode::UntilResults, query)
    }

    async fn close(self: Box<Self>) {
        let mut log = self.log.lock().unwrap();
        log.closed += 1;
        log.live -= 1;
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Verify,
    Persist(String),
    Export(Vec<String>),
}

#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    /// 1-based position of the write that fails.
    fail_at: Option<usize>,
    reject_credentials: bool,
    fail_export: bool,
    link: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(mut self, position: usize) -> Self {
        self.fail_at = Some(position);
        self
    }

    pub fn rejecting_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }

    pub fn failing_export(mut self) -> Self {
        self.fail_export = true;
        self
    }

    pub fn with_link(mut self, link: &str) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn persisted(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SinkCall::Persist(_)))
            .count()
    }
}

#[async_trait]
impl PersistenceSink for RecordingSink {
    async fn verify(&self) -> Result<()> {
        self.calls.lock().unwrap().push(SinkCall::Verify);
        if self.reject_credentials {
            return Err(RosterLinkError::auth("airtable", "HTTP 401"));
        }
        Ok(())
    }

    async fn persist_one(&self, record: &EnrichedRecord) -> Result<RecordId> {
        let position = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(SinkCall::Persist(record.name.clone()));
            calls
                .iter()
                .filter(|c| matches!(c, SinkCall::Persist(_)))
                .count()
        };
        if self.fail_at == Some(position) {
            return Err(RosterLinkError::Storage("HTTP 422: INVALID_VALUE_FOR_COLUMN".into()));
        }
        Ok(RecordId(format!("rec{position:03}")))
    }

    async fn export_all(&self, records: &[EnrichedRecord]) -> Result<()> {
        self.calls.lock().unwrap().push(SinkCall::Export(
            records.iter().map(|r| r.name.clone()).collect(),
        ));
        if self.fail_export {
            return Err(RosterLinkError::io(
                "Output/linkedin_profiles.csv",
                std::io::Error::other("disk full"),
            ));
        }
        Ok(())
    }

    fn store_link(&self) -> Option<String> {
        self.link.clone()
    }
}

// ---------------------------------------------------------------------------
// Directory / progress
// ---------------------------------------------------------------------------

pub struct StubDirectory {
    members: Vec<Member>,
    team: String,
    reject_credentials: bool,
}

impl StubDirectory {
    pub fn new(members: Vec<Member>, team: &str) -> Self {
        Self {
            members,
            team: team.into(),
            reject_credentials: false,
        }
    }

    pub fn rejecting_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }
}

#[async_trait]
impl DirectoryService for StubDirectory {
    async fn list_members(&self) -> Result<Vec<Member>> {
        if self.reject_credentials {
            return Err(RosterLinkError::auth("slack", "invalid_auth"));
        }
        Ok(self.members.clone())
    }

    async fn team_name(&self) -> Result<String> {
        Ok(self.team.clone())
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
