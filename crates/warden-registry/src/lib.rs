//! # warden-registry
//!
//! The static risk catalog: every automatable action the engine may be asked
//! to govern has an [`ActionRiskProfile`] here. The catalog is seeded once at
//! startup and never mutated at runtime — new actions ship with a redeploy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use warden_core::{ActionCategory, ActionCode, BlastRadius, RiskLevel, TrustLevel};

/// Risk metadata for a single automatable action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRiskProfile {
    pub action_code: ActionCode,
    pub action_category: ActionCategory,
    pub risk_level: RiskLevel,
    pub blast_radius: BlastRadius,
    pub rollback_possible: bool,
    /// Minimum trust level before the action may execute unattended.
    pub min_trust_level: TrustLevel,
    /// When true the action always queues for human approval, regardless of trust.
    pub requires_approval: bool,
    pub description: String,
}

/// The action risk catalog. Consulted before any execution decision.
pub struct RiskRegistry {
    profiles: HashMap<ActionCode, ActionRiskProfile>,
}

impl Default for RiskRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RiskRegistry {
    /// An empty registry. Used by tests and by deployments that seed their
    /// own catalog.
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// The built-in catalog of governed actions.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ActionRiskProfile {
            action_code: "seo.add_meta_descriptions".into(),
            action_category: "seo_metadata".into(),
            risk_level: RiskLevel::Low,
            blast_radius: BlastRadius::Page,
            rollback_possible: true,
            min_trust_level: TrustLevel::Assisted,
            requires_approval: false,
            description: "Add missing meta descriptions to pages".into(),
        });
        registry.register(ActionRiskProfile {
            action_code: "seo.rewrite_title_tags".into(),
            action_category: "seo_metadata".into(),
            risk_level: RiskLevel::Medium,
            blast_radius: BlastRadius::Section,
            rollback_possible: true,
            min_trust_level: TrustLevel::Assisted,
            requires_approval: false,
            description: "Rewrite weak or duplicate title tags".into(),
        });
        registry.register(ActionRiskProfile {
            action_code: "seo.fix_noindex".into(),
            action_category: "technical_seo".into(),
            risk_level: RiskLevel::High,
            blast_radius: BlastRadius::Site,
            rollback_possible: true,
            min_trust_level: TrustLevel::Autonomous,
            requires_approval: true,
            description: "Remove stray noindex directives blocking indexing".into(),
        });
        registry.register(ActionRiskProfile {
            action_code: "robots.update_rules".into(),
            action_category: "technical_seo".into(),
            risk_level: RiskLevel::High,
            blast_radius: BlastRadius::Site,
            rollback_possible: true,
            min_trust_level: TrustLevel::Autonomous,
            requires_approval: true,
            description: "Edit robots.txt crawl rules".into(),
        });
        registry.register(ActionRiskProfile {
            action_code: "sitemap.resubmit".into(),
            action_category: "technical_seo".into(),
            risk_level: RiskLevel::Low,
            blast_radius: BlastRadius::Site,
            rollback_possible: true,
            min_trust_level: TrustLevel::Recommend,
            requires_approval: false,
            description: "Regenerate and resubmit the XML sitemap".into(),
        });
        registry.register(ActionRiskProfile {
            action_code: "content.refresh_stale_pages".into(),
            action_category: "content".into(),
            risk_level: RiskLevel::Medium,
            blast_radius: BlastRadius::Section,
            rollback_possible: true,
            min_trust_level: TrustLevel::Autonomous,
            requires_approval: false,
            description: "Refresh dated copy on underperforming pages".into(),
        });
        registry.register(ActionRiskProfile {
            action_code: "redirects.repair_broken_links".into(),
            action_category: "technical_seo".into(),
            risk_level: RiskLevel::Medium,
            blast_radius: BlastRadius::Page,
            rollback_possible: true,
            min_trust_level: TrustLevel::Assisted,
            requires_approval: false,
            description: "Point broken internal links at live targets".into(),
        });
        registry.register(ActionRiskProfile {
            action_code: "schema.add_structured_data".into(),
            action_category: "seo_metadata".into(),
            risk_level: RiskLevel::Low,
            blast_radius: BlastRadius::Page,
            rollback_possible: true,
            min_trust_level: TrustLevel::Assisted,
            requires_approval: false,
            description: "Add structured-data markup to eligible pages".into(),
        });
        registry
    }

    /// Register a profile. Later registrations with the same code replace
    /// earlier ones — the catalog is assembled once, before serving.
    pub fn register(&mut self, profile: ActionRiskProfile) {
        debug!(action = %profile.action_code, "registering risk profile");
        self.profiles.insert(profile.action_code.clone(), profile);
    }

    pub fn get(&self, action_code: &str) -> Option<&ActionRiskProfile> {
        self.profiles.get(action_code)
    }

    pub fn contains(&self, action_code: &str) -> bool {
        self.profiles.contains_key(action_code)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// All known action codes, sorted.
    pub fn codes(&self) -> Vec<ActionCode> {
        let mut codes: Vec<ActionCode> = self.profiles.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// The distinct action categories in the catalog, sorted. A website is
    /// onboarded with one Observe-level trust record per category.
    pub fn categories(&self) -> Vec<ActionCategory> {
        let mut categories: Vec<ActionCategory> = self
            .profiles
            .values()
            .map(|p| p.action_category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }
}
