//! Profile resolution: find a member's public LinkedIn profile via web search.

use rosterlink_search::{SearchClient, SearchHit, SearchPage};
use rosterlink_shared::{Member, ProfileUrl, ResolutionResult, Result, RosterLinkError};
use tracing::{debug, instrument, warn};

use crate::organization::infer_organization;
use crate::progress::{ProgressEvent, ProgressReporter};

/// Path fragment every profile URL contains.
pub const PROFILE_PATH: &str = "linkedin.com/in/";

/// Unqualified query: the member's name restricted to profile pages.
pub fn fallback_query(name: &str) -> String {
    format!("{name} site:{PROFILE_PATH}")
}

/// Query qualified by the inferred organization, or by the team alone.
pub fn primary_query(name: &str, organization: Option<&str>, team_name: &str) -> String {
    let base = fallback_query(name);
    match organization {
        Some(org) => format!("{base} ({org} OR {team_name})"),
        None => format!("{base} {team_name}"),
    }
}

/// The first hit pointing at a profile page.
pub fn first_profile_url(hits: &[SearchHit]) -> Option<&str> {
    hits.iter()
        .map(|hit| hit.href.as_str())
        .find(|href| href.contains(PROFILE_PATH))
}

/// Resolves members one at a time against a [`SearchClient`].
pub struct ProfileResolver<'a> {
    search: &'a dyn SearchClient,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> ProfileResolver<'a> {
    pub fn new(search: &'a dyn SearchClient, reporter: &'a dyn ProgressReporter) -> Self {
        Self { search, reporter }
    }

    /// Resolve one member. Never fails: lookup errors become
    /// [`ProfileUrl::Error`] and are reported, not returned.
    ///
    /// One search page is opened per call and closed before returning.
    #[instrument(skip_all, fields(member = %member.name()))]
    pub async fn resolve(&self, member: &Member, team_name: &str) -> ResolutionResult {
        let name = member.name().to_string();

        let outcome = match self.search.open_page().await {
            Ok(mut page) => {
                let outcome = self.lookup(page.as_mut(), member, team_name).await;
                page.close().await;
                outcome
            }
            Err(e) => Err(e),
        };

        let profile_url = match outcome {
            Ok(Some(href)) => ProfileUrl::found(href),
            Ok(None) => {
                debug!("no profile link in results");
                ProfileUrl::NotFound
            }
            Err(e) => {
                self.report_failure(&name, &e);
                ProfileUrl::Error
            }
        };

        ResolutionResult { name, profile_url }
    }

    /// Primary query, then the unqualified fallback at most once.
    async fn lookup(
        &self,
        page: &mut dyn SearchPage,
        member: &Member,
        team_name: &str,
    ) -> Result<Option<String>> {
        let organization = infer_organization(member.email());
        debug!(organization = ?organization, "inferred organization");

        let query = primary_query(member.name(), organization.as_deref(), team_name);
        debug!(%query, "primary search");
        let mut hits = page.search(&query).await?;

        if hits.is_empty() {
            self.reporter.report(&ProgressEvent::FallbackSearch {
                name: member.name().to_string(),
            });
            let query = fallback_query(member.name());
            debug!(%query, "fallback search");
            hits = page.search_until_results(&query).await?;
        }

        Ok(first_profile_url(&hits).map(str::to_owned))
    }

    fn report_failure(&self, name: &str, error: &RosterLinkError) {
        warn!(error = %error, "profile lookup failed");
        self.reporter.report(&ProgressEvent::ResolutionFailed {
            name: name.to_string(),
            error: error.to_string(),
        });
    }
}
