#[cfg(test)]
mod tests {
    use warden_core::{RiskLevel, TrustLevel};
    use warden_registry::{ActionRiskProfile, RiskRegistry};

    #[test]
    fn test_builtin_catalog_is_populated() {
        let registry = RiskRegistry::builtin();
        assert!(!registry.is_empty());
        assert!(registry.contains("seo.add_meta_descriptions"));
        assert!(registry.contains("sitemap.resubmit"));
    }

    #[test]
    fn test_high_risk_actions_require_approval() {
        let registry = RiskRegistry::builtin();
        let noindex = registry.get("seo.fix_noindex").unwrap();
        assert_eq!(noindex.risk_level, RiskLevel::High);
        assert!(noindex.requires_approval);
        let robots = registry.get("robots.update_rules").unwrap();
        assert!(robots.requires_approval);
    }

    #[test]
    fn test_unknown_code_is_absent() {
        let registry = RiskRegistry::builtin();
        assert!(registry.get("seo.delete_everything").is_none());
    }

    #[test]
    fn test_categories_are_distinct_and_sorted() {
        let registry = RiskRegistry::builtin();
        let categories = registry.categories();
        let mut sorted = categories.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(categories, sorted);
        assert!(categories.contains(&"seo_metadata".to_string()));
        assert!(categories.contains(&"technical_seo".to_string()));
    }

    #[test]
    fn test_register_replaces_same_code() {
        let mut registry = RiskRegistry::new();
        let mut profile = ActionRiskProfile {
            action_code: "custom.tweak".into(),
            action_category: "custom".into(),
            risk_level: RiskLevel::Low,
            blast_radius: warden_core::BlastRadius::Page,
            rollback_possible: true,
            min_trust_level: TrustLevel::Recommend,
            requires_approval: false,
            description: "v1".into(),
        };
        registry.register(profile.clone());
        profile.description = "v2".into();
        registry.register(profile);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("custom.tweak").unwrap().description, "v2");
    }
}
