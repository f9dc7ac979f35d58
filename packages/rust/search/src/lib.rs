//! Web search capability used to locate public profiles.
//!
//! This crate provides:
//! - [`SearchClient`] / [`SearchPage`]: the minimal browser-like capability the
//!   resolver needs: open a page, run a query, read result hrefs, close the page
//! - [`HtmlSearchClient`]: an implementation that fetches a search engine's
//!   result markup over HTTP and extracts result links with `scraper`

pub mod html;

use async_trait::async_trait;
use rosterlink_shared::Result;

pub use html::{HtmlSearchClient, HtmlSearchPage, parse_results};

/// One link taken from a search result block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Absolute target URL of the result link.
    pub href: String,
}

impl SearchHit {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

/// Factory for scoped search pages.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Open a fresh page. The caller must [`SearchPage::close`] it when done.
    async fn open_page(&self) -> Result<Box<dyn SearchPage>>;
}

/// A single browser-tab-like session.
#[async_trait]
pub trait SearchPage: Send {
    /// Run `query` and return every result link, in page order.
    /// An empty vector means the engine returned no results.
    async fn search(&mut self, query: &str) -> Result<Vec<SearchHit>>;

    /// Like [`search`](Self::search), but the query must yield at least one
    /// result within the implementation's wait timeout. The query is sent
    /// once; an empty or late page is a search error.
    async fn search_until_results(&mut self, query: &str) -> Result<Vec<SearchHit>>;

    /// Release the page.
    async fn close(self: Box<Self>);
}
