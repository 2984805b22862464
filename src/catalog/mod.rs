//! Caller-facing catalog operations.
//!
//! [`Catalog`] turns logical queries (a listing page, a title's details, a
//! search) into [`RequestSpec`]s, picks the freshness window for each, and
//! routes everything through the shared [`Gateway`]. Caller contract
//! violations are rejected here, before any gateway activity.
//!
//! Result records stay opaque JSON; only the paging envelope is typed.

mod kinds;

pub use kinds::{ListCategory, MediaKind, SearchKind};

use std::sync::Arc;

use reelgate_core::{Error, RequestSpec, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::{CacheClass, TtlPolicy};
use crate::gateway::Gateway;

/// Highest page number the upstream serves.
pub const MAX_PAGE: u32 = 500;

/// Number of entries returned by [`Catalog::suggest`].
pub const SUGGESTION_LIMIT: usize = 8;

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub results: Vec<Value>,
}

pub type ListResult = Page;
pub type SearchResult = Page;

/// Joined detail view of a single title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailResult {
    pub kind: MediaKind,
    pub id: u64,
    pub details: Value,
    pub credits: Value,
    pub videos: Value,
}

pub struct Catalog {
    gateway: Arc<Gateway>,
    ttl: TtlPolicy,
}

impl Catalog {
    pub fn new(gateway: Arc<Gateway>, ttl: TtlPolicy) -> Self {
        Self { gateway, ttl }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// One page of a listing endpoint.
    pub async fn fetch_list(&self, category: ListCategory, page: u32) -> Result<ListResult> {
        check_page(page)?;
        let spec = RequestSpec::get(category.path()).param("page", page);
        debug!(category = %category, page, "Fetching list");

        let value = self
            .gateway
            .fetch(spec, self.ttl.ttl_for(CacheClass::List))
            .await?;
        parse_page(category.path(), value)
    }

    /// Detail, credits and videos for one title, fetched concurrently.
    ///
    /// Any failing leg fails the whole call.
    pub async fn fetch_details(&self, kind: MediaKind, id: u64) -> Result<DetailResult> {
        let base = format!("/{}/{id}", kind.as_str());
        let ttl = self.ttl.ttl_for(CacheClass::Details);
        debug!(kind = %kind, id, "Fetching details");

        let (details, credits, videos) = tokio::try_join!(
            self.gateway.fetch(RequestSpec::get(base.clone()), ttl),
            self.gateway
                .fetch(RequestSpec::get(format!("{base}/credits")), ttl),
            self.gateway
                .fetch(RequestSpec::get(format!("{base}/videos")), ttl),
        )?;

        Ok(DetailResult {
            kind,
            id,
            details,
            credits,
            videos,
        })
    }

    /// Search titles. Blank queries are rejected without touching the gateway.
    pub async fn search(&self, query: &str, page: u32, kind: SearchKind) -> Result<SearchResult> {
        let query = normalize_query(query)?;
        check_page(page)?;
        let spec = RequestSpec::get(kind.path())
            .param("query", query)
            .param("page", page);
        debug!(query, page, kind = %kind, "Searching");

        let value = self
            .gateway
            .fetch(spec, self.ttl.ttl_for(CacheClass::Search))
            .await?;
        parse_page(kind.path(), value)
    }

    /// Short list of multi-search matches for type-ahead.
    pub async fn suggest(&self, query: &str) -> Result<Vec<Value>> {
        let query = normalize_query(query)?;
        let spec = RequestSpec::get(SearchKind::Multi.path())
            .param("query", query)
            .param("page", 1);

        let value = self
            .gateway
            .fetch(spec, self.ttl.ttl_for(CacheClass::Suggestions))
            .await?;
        let mut page = parse_page(SearchKind::Multi.path(), value)?;
        page.results.truncate(SUGGESTION_LIMIT);
        Ok(page.results)
    }
}

fn normalize_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("search query must not be empty"));
    }
    Ok(trimmed)
}

fn check_page(page: u32) -> Result<()> {
    if page == 0 || page > MAX_PAGE {
        return Err(Error::validation(format!(
            "page must be between 1 and {MAX_PAGE}, got {page}"
        )));
    }
    Ok(())
}

fn parse_page(path: &str, value: Value) -> Result<Page> {
    serde_json::from_value(value)
        .map_err(|e| Error::upstream(None, format!("{path}: unexpected page shape: {e}")))
}
