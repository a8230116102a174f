use async_trait::async_trait;

use warden_core::{MetricSample, Result, WebsiteRecord};

/// The external website registry. The engine refuses any work for a website
/// the directory does not report as active.
#[async_trait]
pub trait WebsiteDirectory: Send + Sync {
    async fn lookup(&self, website_id: &str) -> Result<Option<WebsiteRecord>>;
}

/// The external metrics warehouse: timestamped `(metric_key, value)`
/// snapshots keyed by site and window label ("24h", "7d", "28d").
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn snapshot(&self, site_id: &str, window: &str) -> Result<Vec<MetricSample>>;
}
