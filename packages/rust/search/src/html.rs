//! HTTP search client that scrapes result links out of rendered markup.
//!
//! Each [`HtmlSearchPage`] owns its own cookie-carrying HTTP session, so two
//! pages never share consent or session cookies. Requests are spaced by the
//! configured rate limit.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rosterlink_shared::{Result, RosterLinkError, SearchOptions};
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{SearchClient, SearchHit, SearchPage};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("RosterLink/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// HtmlSearchClient
// ---------------------------------------------------------------------------

/// Search client for engines serving `<base_url>/search?q=...` as HTML.
pub struct HtmlSearchClient {
    opts: SearchOptions,
    search_url: Url,
    result_selector: Selector,
}

impl HtmlSearchClient {
    /// Validate the options and build a client.
    pub fn new(opts: SearchOptions) -> Result<Self> {
        let base = Url::parse(&opts.base_url).map_err(|e| {
            RosterLinkError::config(format!("invalid search base url '{}': {e}", opts.base_url))
        })?;
        let search_url = base.join("/search").map_err(|e| {
            RosterLinkError::config(format!("invalid search base url '{}': {e}", opts.base_url))
        })?;

        let result_selector = Selector::parse(&opts.result_selector).map_err(|e| {
            RosterLinkError::config(format!(
                "invalid result selector '{}': {e}",
                opts.result_selector
            ))
        })?;

        Ok(Self {
            opts,
            search_url,
            result_selector,
        })
    }
}

#[async_trait]
impl SearchClient for HtmlSearchClient {
    async fn open_page(&self) -> Result<Box<dyn SearchPage>> {
        let user_agent = self.opts.user_agent.as_deref().unwrap_or(USER_AGENT);

        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(self.opts.timeout_secs))
            .build()
            .map_err(|e| {
                RosterLinkError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Box::new(HtmlSearchPage {
            client,
            search_url: self.search_url.clone(),
            result_selector: self.result_selector.clone(),
            rate_limit: Duration::from_millis(self.opts.rate_limit_ms),
            wait_timeout: Duration::from_secs(self.opts.wait_timeout_secs),
            navigations: 0,
        }))
    }
}

// ---------------------------------------------------------------------------
// HtmlSearchPage
// ---------------------------------------------------------------------------

/// One search session opened by [`HtmlSearchClient`].
pub struct HtmlSearchPage {
    client: Client,
    search_url: Url,
    result_selector: Selector,
    rate_limit: Duration,
    wait_timeout: Duration,
    navigations: usize,
}

impl HtmlSearchPage {
    fn query_url(&self, query: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut().append_pair("q", query);
        url
    }

    /// Fetch the result page for `query` and return its raw markup.
    /// `deadline` replaces the client timeout for this request when set.
    async fn navigate(
        &mut self,
        query: &str,
        deadline: Option<Duration>,
    ) -> Result<(Url, String)> {
        if !self.rate_limit.is_zero() {
            tokio::time::sleep(self.rate_limit).await;
        }

        let url = self.query_url(query);
        self.navigations += 1;
        debug!(%url, navigation = self.navigations, "fetching search results");

        let mut request = self.client.get(url.as_str());
        if let Some(deadline) = deadline {
            request = request.timeout(deadline);
        }
        let response = request.send().await.map_err(|e| match deadline {
            Some(deadline) if e.is_timeout() => RosterLinkError::Search(format!(
                "timed out after {}s waiting for search results",
                deadline.as_secs()
            )),
            _ => RosterLinkError::Network(format!("search request failed: {e}")),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RosterLinkError::Search(
                "search engine is rate limiting requests (HTTP 429)".into(),
            ));
        }
        if !status.is_success() {
            return Err(RosterLinkError::Network(format!(
                "search request failed: HTTP {status}"
            )));
        }

        // Relative result links resolve against wherever redirects landed.
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| RosterLinkError::Network(format!("search body read failed: {e}")))?;

        Ok((final_url, body))
    }
}

#[async_trait]
impl SearchPage for HtmlSearchPage {
    #[instrument(skip(self))]
    async fn search(&mut self, query: &str) -> Result<Vec<SearchHit>> {
        let (page_url, body) = self.navigate(query, None).await?;
        let hits = parse_results(&body, &self.result_selector, &page_url);
        debug!(hits = hits.len(), "parsed search results");
        Ok(hits)
    }

    /// One navigation bounded by the wait timeout. Result markup is complete
    /// once the response arrives, so an empty page is not retried.
    #[instrument(skip(self))]
    async fn search_until_results(&mut self, query: &str) -> Result<Vec<SearchHit>> {
        let (page_url, body) = self.navigate(query, Some(self.wait_timeout)).await?;
        let hits = parse_results(&body, &self.result_selector, &page_url);
        if hits.is_empty() {
            warn!(
                timeout_secs = self.wait_timeout.as_secs(),
                "no search results before timeout"
            );
            return Err(RosterLinkError::Search(format!(
                "no results before timeout ({}s)",
                self.wait_timeout.as_secs()
            )));
        }
        debug!(hits = hits.len(), "parsed search results");
        Ok(hits)
    }

    async fn close(self: Box<Self>) {
        debug!(navigations = self.navigations, "closing search page");
    }
}

// ---------------------------------------------------------------------------
// Result extraction
// ---------------------------------------------------------------------------

/// Extract result links from search markup.
///
/// Only anchors inside elements matching `result_selector` count, so
/// navigation chrome is ignored. Redirect wrappers of the form
/// `/url?q=<target>` are unwrapped, relative links are resolved against
/// `page_url`, and duplicates are dropped while preserving order.
pub fn parse_results(html: &str, result_selector: &Selector, page_url: &Url) -> Vec<SearchHit> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("a[href]").expect("static selector");
    let mut hits: Vec<SearchHit> = Vec::new();

    for block in doc.select(result_selector) {
        for anchor in block.select(&link_sel) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(target) = resolve_href(href, page_url) else {
                continue;
            };
            if !hits.iter().any(|h| h.href == target) {
                hits.push(SearchHit::new(target));
            }
        }
    }

    hits
}

/// Turn a raw result href into an absolute target URL.
fn resolve_href(href: &str, page_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
    {
        return None;
    }

    let resolved = page_url.join(href).ok()?;

    if resolved.path() == "/url" {
        let target = resolved
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
            .map(|(_, value)| value.into_owned())?;
        return Url::parse(&target).ok().map(String::from);
    }

    match resolved.scheme() {
        "http" | "https" => Some(resolved.into()),
        _ => None,
    }
}
