use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use warden_core::{ActionCode, Anomaly};

/// One evidence-gathering step in an action's enrichment plan. The `key`
/// selects the connector call; the description feeds the run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentStep {
    pub key: String,
    pub description: String,
}

impl EnrichmentStep {
    fn new(key: &str, description: &str) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
        }
    }
}

/// Builds the enrichment plan for one action code. Implementations are
/// registered in the [`EnrichmentRegistry`]; adding an action type means
/// adding a builder, not editing a dispatcher.
pub trait EnrichmentPlanBuilder: Send + Sync {
    fn action_code(&self) -> &str;
    fn build(&self, anomaly: &Anomaly) -> Vec<EnrichmentStep>;
}

/// Registry of plan builders keyed by action code, with a fallback plan for
/// codes that ship without a dedicated builder.
pub struct EnrichmentRegistry {
    builders: HashMap<ActionCode, Box<dyn EnrichmentPlanBuilder>>,
}

impl Default for EnrichmentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EnrichmentRegistry {
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Registry pre-loaded with builders for the built-in action catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.add(Box::new(MetaDescriptionBuilder));
        registry.add(Box::new(IndexingFixBuilder));
        registry.add(Box::new(SitemapBuilder));
        registry
    }

    pub fn add(&mut self, builder: Box<dyn EnrichmentPlanBuilder>) {
        debug!(action = builder.action_code(), "registering enrichment builder");
        self.builders.insert(builder.action_code().to_string(), builder);
    }

    /// The plan for an action code. Codes without a dedicated builder get the
    /// full diagnostic sweep.
    pub fn plan_for(&self, action_code: &str, anomaly: &Anomaly) -> Vec<EnrichmentStep> {
        match self.builders.get(action_code) {
            Some(builder) => builder.build(anomaly),
            None => default_plan(anomaly),
        }
    }

    pub fn has_builder(&self, action_code: &str) -> bool {
        self.builders.contains_key(action_code)
    }
}

/// The full sweep: run every probe we have for the anomaly's site.
fn default_plan(anomaly: &Anomaly) -> Vec<EnrichmentStep> {
    vec![
        EnrichmentStep::new("fetch_top_pages", "Fetch metadata for the top pages"),
        EnrichmentStep::new("check_indexing", "Check indexing signals"),
        EnrichmentStep::new("check_sitemap", "Check sitemap reachability"),
        EnrichmentStep::new(
            "fetch_gsc_queries",
            &format!(
                "Pull query volumes around the '{}' anomaly window",
                anomaly.metric_key
            ),
        ),
    ]
}

// ── Built-in builders ──────────────────────────────────────────

/// Enrichment for missing/weak meta descriptions: which pages, and whether
/// the traffic drop lines up with them.
struct MetaDescriptionBuilder;

impl EnrichmentPlanBuilder for MetaDescriptionBuilder {
    fn action_code(&self) -> &str {
        "seo.add_meta_descriptions"
    }

    fn build(&self, anomaly: &Anomaly) -> Vec<EnrichmentStep> {
        vec![
            EnrichmentStep::new("fetch_top_pages", "Fetch metadata for the top pages"),
            EnrichmentStep::new(
                "fetch_gsc_queries",
                &format!(
                    "Pull query volumes around the '{}' anomaly window",
                    anomaly.metric_key
                ),
            ),
        ]
    }
}

/// Enrichment for indexing problems: signals first, then whether the sitemap
/// still points the crawler at the right pages.
struct IndexingFixBuilder;

impl EnrichmentPlanBuilder for IndexingFixBuilder {
    fn action_code(&self) -> &str {
        "seo.fix_noindex"
    }

    fn build(&self, anomaly: &Anomaly) -> Vec<EnrichmentStep> {
        vec![
            EnrichmentStep::new("check_indexing", "Check indexing signals"),
            EnrichmentStep::new("check_sitemap", "Check sitemap reachability"),
            EnrichmentStep::new(
                "fetch_gsc_queries",
                &format!(
                    "Pull query volumes around the '{}' anomaly window",
                    anomaly.metric_key
                ),
            ),
        ]
    }
}

struct SitemapBuilder;

impl EnrichmentPlanBuilder for SitemapBuilder {
    fn action_code(&self) -> &str {
        "sitemap.resubmit"
    }

    fn build(&self, _anomaly: &Anomaly) -> Vec<EnrichmentStep> {
        vec![
            EnrichmentStep::new("check_sitemap", "Check sitemap reachability"),
            EnrichmentStep::new("check_indexing", "Check indexing signals"),
        ]
    }
}
