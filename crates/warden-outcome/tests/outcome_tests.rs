#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;
    use warden_config::schema::{OutcomeConfig, TrustConfig};
    use warden_core::{MetricSample, Severity, TrustLevel};
    use warden_outcome::{
        detect_breakages, AttributedAction, KnowledgeStatus, OutcomeProcessor, OutcomeType,
    };
    use warden_trust::{TrustLedger, TrustRecord};

    fn sample(key: &str, value: f64) -> MetricSample {
        MetricSample {
            metric_key: key.into(),
            value,
            captured_at: Utc::now(),
        }
    }

    fn attribution(confidence: f64) -> AttributedAction {
        AttributedAction {
            action_run_id: Uuid::new_v4(),
            action_code: "seo.rewrite_title_tags".into(),
            action_category: "seo_metadata".into(),
            confidence,
        }
    }

    // ── Breakage detection ─────────────────────────────────────

    mod detection {
        use super::*;

        #[test]
        fn test_lcp_past_severe_is_breakage() {
            let events = detect_breakages(
                "site_1",
                &[sample("lcp", 4200.0)],
                &[sample("lcp", 2000.0)],
                None,
                "24h",
                &OutcomeConfig::default(),
            );
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].event_type, OutcomeType::Breakage);
            assert_eq!(events[0].severity, Severity::High);
            assert_eq!(events[0].delta, 2200.0);
        }

        #[test]
        fn test_lcp_past_poor_is_medium_regression() {
            let events = detect_breakages(
                "site_1",
                &[sample("lcp", 2600.0)],
                &[sample("lcp", 2000.0)],
                None,
                "24h",
                &OutcomeConfig::default(),
            );
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].event_type, OutcomeType::Regression);
            assert_eq!(events[0].severity, Severity::Medium);
        }

        #[test]
        fn test_lcp_within_budget_is_quiet() {
            let events = detect_breakages(
                "site_1",
                &[sample("lcp", 2300.0)],
                &[sample("lcp", 2000.0)],
                None,
                "24h",
                &OutcomeConfig::default(),
            );
            assert!(events.is_empty());
        }

        #[test]
        fn test_lcp_recovery_is_improvement() {
            let events = detect_breakages(
                "site_1",
                &[sample("lcp", 1900.0)],
                &[sample("lcp", 3100.0)],
                None,
                "24h",
                &OutcomeConfig::default(),
            );
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].event_type, OutcomeType::Improvement);
        }

        #[test]
        fn test_clicks_35_percent_drop_is_breakage() {
            // Base 15%, high multiple 2x: a 35% drop crosses the 30% bar
            let events = detect_breakages(
                "site_1",
                &[sample("clicks", 650.0)],
                &[sample("clicks", 1000.0)],
                None,
                "7d",
                &OutcomeConfig::default(),
            );
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].event_type, OutcomeType::Breakage);
            assert_eq!(events[0].severity, Severity::High);
            assert!((events[0].percent_change + 35.0).abs() < 0.01);
        }

        #[test]
        fn test_clicks_20_percent_drop_is_regression() {
            let events = detect_breakages(
                "site_1",
                &[sample("clicks", 800.0)],
                &[sample("clicks", 1000.0)],
                None,
                "7d",
                &OutcomeConfig::default(),
            );
            assert_eq!(events[0].event_type, OutcomeType::Regression);
            assert_eq!(events[0].severity, Severity::Medium);
        }

        #[test]
        fn test_clicks_rise_is_improvement() {
            let events = detect_breakages(
                "site_1",
                &[sample("clicks", 1250.0)],
                &[sample("clicks", 1000.0)],
                None,
                "7d",
                &OutcomeConfig::default(),
            );
            assert_eq!(events[0].event_type, OutcomeType::Improvement);
        }

        #[test]
        fn test_metric_missing_from_baseline_is_ignored() {
            let events = detect_breakages(
                "site_1",
                &[sample("clicks", 100.0), sample("impressions", 4000.0)],
                &[sample("clicks", 1000.0)],
                None,
                "7d",
                &OutcomeConfig::default(),
            );
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].metric_key, "clicks");
        }

        #[test]
        fn test_intervention_lands_in_context() {
            let run_id = Uuid::new_v4();
            let events = detect_breakages(
                "site_1",
                &[sample("clicks", 600.0)],
                &[sample("clicks", 1000.0)],
                Some(run_id),
                "7d",
                &OutcomeConfig::default(),
            );
            assert_eq!(events[0].context.intervention_id, Some(run_id));
        }
    }

    // ── Knowledge promotion ────────────────────────────────────

    mod promotion {
        use super::*;

        fn regression_event() -> warden_outcome::OutcomeEvent {
            detect_breakages(
                "site_1",
                &[sample("clicks", 600.0)],
                &[sample("clicks", 1000.0)],
                Some(Uuid::new_v4()),
                "7d",
                &OutcomeConfig::default(),
            )
            .remove(0)
        }

        fn ledger_with_record() -> TrustLedger {
            let ledger = TrustLedger::new(TrustConfig::default());
            let mut record = TrustRecord::new("site_1".into(), "seo_metadata".into());
            record.trust_level = TrustLevel::Assisted;
            record.confidence = 80.0;
            ledger.upsert(record).unwrap();
            ledger
        }

        #[test]
        fn test_regression_promotes_avoid_action_with_guardrail() {
            let processor = OutcomeProcessor::new(OutcomeConfig::default());
            let ledger = ledger_with_record();
            let event = regression_event();
            let entry = processor
                .process(&event, &attribution(0.85), &ledger)
                .unwrap()
                .unwrap();
            assert!(entry.avoid_action.is_some());
            assert!(entry.recommended_action.is_none());
            assert!(entry.guardrail.as_deref().unwrap().contains("7d"));
            assert_eq!(entry.status, KnowledgeStatus::Draft);
        }

        #[test]
        fn test_improvement_promotes_recommended_action() {
            let processor = OutcomeProcessor::new(OutcomeConfig::default());
            let ledger = ledger_with_record();
            let event = detect_breakages(
                "site_1",
                &[sample("clicks", 1400.0)],
                &[sample("clicks", 1000.0)],
                Some(Uuid::new_v4()),
                "7d",
                &OutcomeConfig::default(),
            )
            .remove(0);
            let entry = processor
                .process(&event, &attribution(0.9), &ledger)
                .unwrap()
                .unwrap();
            assert!(entry.recommended_action.is_some());
            assert!(entry.avoid_action.is_none());
        }

        #[test]
        fn test_low_confidence_attribution_not_promoted() {
            let processor = OutcomeProcessor::new(OutcomeConfig::default());
            let ledger = ledger_with_record();
            let event = regression_event();
            let promoted = processor
                .process(&event, &attribution(0.5), &ledger)
                .unwrap();
            assert!(promoted.is_none());
            // Trust still took the hit
            let record = ledger.get("site_1", "seo_metadata").unwrap();
            assert_eq!(record.failure_count, 1);
        }

        #[test]
        fn test_corroboration_blends_confidence_until_active() {
            let processor = OutcomeProcessor::new(OutcomeConfig::default());
            let ledger = ledger_with_record();
            let event = regression_event();

            let first = processor
                .process(&event, &attribution(0.85), &ledger)
                .unwrap()
                .unwrap();
            assert_eq!(first.status, KnowledgeStatus::Draft);

            // 0.7 * 0.85 + 0.3 * 0.95 = 0.88 — still a draft
            let second = processor
                .process(&event, &attribution(0.95), &ledger)
                .unwrap()
                .unwrap();
            assert_eq!(second.entry_id, first.entry_id, "same event must not duplicate");
            assert!((second.confidence - 0.88).abs() < 1e-9);
            assert_eq!(second.status, KnowledgeStatus::Draft);

            // 0.7 * 0.88 + 0.3 * 0.95 = 0.901 — crosses 0.9 and activates
            let third = processor
                .process(&event, &attribution(0.95), &ledger)
                .unwrap()
                .unwrap();
            assert!(third.confidence >= 0.9);
            assert_eq!(third.status, KnowledgeStatus::Active);
            assert_eq!(processor.knowledge().all().len(), 1);
        }

        #[test]
        fn test_guardrail_window_tracks_metric_speed() {
            let processor = OutcomeProcessor::new(OutcomeConfig::default());
            let ledger = ledger_with_record();

            let fast = detect_breakages(
                "site_1",
                &[sample("lcp", 4200.0)],
                &[sample("lcp", 2000.0)],
                Some(Uuid::new_v4()),
                "24h",
                &OutcomeConfig::default(),
            )
            .remove(0);
            let entry = processor
                .process(&fast, &attribution(0.85), &ledger)
                .unwrap()
                .unwrap();
            assert!(entry.guardrail.as_deref().unwrap().contains("24h"));
        }

        #[test]
        fn test_outcomes_feed_trust_ledger() {
            let processor = OutcomeProcessor::new(OutcomeConfig::default());
            let ledger = ledger_with_record();

            let regression = regression_event();
            processor
                .process(&regression, &attribution(0.85), &ledger)
                .unwrap();
            let record = ledger.get("site_1", "seo_metadata").unwrap();
            assert_eq!(record.failure_count, 1);
            assert!(record.last_failure_at.is_some());

            let improvement = detect_breakages(
                "site_1",
                &[sample("clicks", 1400.0)],
                &[sample("clicks", 1000.0)],
                Some(Uuid::new_v4()),
                "7d",
                &OutcomeConfig::default(),
            )
            .remove(0);
            processor
                .process(&improvement, &attribution(0.85), &ledger)
                .unwrap();
            let record = ledger.get("site_1", "seo_metadata").unwrap();
            assert_eq!(record.success_count, 1);
        }
    }
}
