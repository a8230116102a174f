use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Metadata scraped from one page of the managed site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMetadata {
    pub url: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<String>,
}

/// Indexing health as reported by the search console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingSignals {
    pub indexed_pages: u64,
    pub noindex_detected: bool,
    pub blocked_by_robots: u64,
    pub canonical_errors: u64,
}

/// Result of probing the XML sitemap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapCheck {
    pub reachable: bool,
    pub url_count: u64,
    pub last_modified: Option<String>,
}

/// One day of search query volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryVolume {
    pub date: String,
    pub clicks: u64,
    pub impressions: u64,
}

/// Boundary abstraction over the external site/search-console connectors.
/// Used only inside enrichment steps; errors are strings because a failed
/// fetch is a finding, not an engine error.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn fetch_page_metadata(
        &self,
        base_url: &str,
        limit: usize,
    ) -> Result<Vec<PageMetadata>, String>;

    async fn fetch_indexing_signals(&self, base_url: &str) -> Result<IndexingSignals, String>;

    async fn check_sitemap(&self, base_url: &str) -> Result<SitemapCheck, String>;

    async fn fetch_query_history(
        &self,
        site_id: &str,
        metric_key: &str,
        window: &str,
    ) -> Result<Vec<QueryVolume>, String>;
}
