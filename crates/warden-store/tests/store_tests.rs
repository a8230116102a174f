#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use warden_core::{Severity, TrustLevel};
    use warden_outcome::{
        KnowledgeEntry, KnowledgeEvidence, KnowledgeStatus, OutcomeContext, OutcomeEvent,
        OutcomeType,
    };
    use warden_proposal::{ChangeProposal, ProposalAction, ProposalStatus};
    use warden_runner::{ActionRun, RunOutput, RunStatus};
    use warden_safety::SafetyAuditEntry;
    use warden_store::WardenStore;
    use warden_trust::TrustRecord;

    fn proposal(fingerprint: &str, status: ProposalStatus) -> ChangeProposal {
        let now = Utc::now();
        ChangeProposal {
            proposal_id: Uuid::new_v4(),
            fingerprint: fingerprint.to_string(),
            website_id: "site_1".into(),
            service_key: "gsc".into(),
            kind: "missing_meta".into(),
            target: "/pricing".into(),
            status,
            risk_level: warden_core::RiskLevel::Low,
            title: "Add meta descriptions".into(),
            description: "12 pages lack meta descriptions".into(),
            rationale: "CTR is suffering on affected pages".into(),
            evidence: json!({"pages": 12}),
            change_plan: vec!["generate descriptions".into(), "publish".into()],
            verification_plan: vec!["re-crawl affected pages".into()],
            rollback_plan: vec!["restore previous head tags".into()],
            blocking: false,
            tags: vec!["seo".into()],
            created_at: now,
            updated_at: now,
        }
    }

    // ── Trust records ──────────────────────────────────────────

    mod trust_records {
        use super::*;

        #[test]
        fn test_trust_record_roundtrip() {
            let store = WardenStore::open_in_memory().unwrap();
            let mut record = TrustRecord::new("site_1".into(), "seo_metadata".into());
            record.trust_level = TrustLevel::Assisted;
            record.confidence = 82.5;
            record.success_count = 7;
            record.last_success_at = Some(Utc::now());

            store.persist_trust_record(&record).unwrap();
            let loaded = store.trust_record("site_1", "seo_metadata").unwrap().unwrap();

            assert_eq!(loaded.trust_level, TrustLevel::Assisted);
            assert_eq!(loaded.confidence, 82.5);
            assert_eq!(loaded.success_count, 7);
            assert!(loaded.last_success_at.is_some());
            assert!(loaded.last_failure_at.is_none());
        }

        #[test]
        fn test_upsert_supersedes_in_place() {
            let store = WardenStore::open_in_memory().unwrap();
            let mut record = TrustRecord::new("site_1".into(), "content".into());
            store.persist_trust_record(&record).unwrap();

            record.trust_level = TrustLevel::Recommend;
            record.failure_count = 2;
            store.persist_trust_record(&record).unwrap();

            let all = store.load_trust_records().unwrap();
            assert_eq!(all.len(), 1);
            assert_eq!(all[0].trust_level, TrustLevel::Recommend);
            assert_eq!(all[0].failure_count, 2);
        }

        #[test]
        fn test_missing_record_is_none() {
            let store = WardenStore::open_in_memory().unwrap();
            assert!(store.trust_record("nope", "seo_metadata").unwrap().is_none());
        }

        #[test]
        fn test_survives_reopen() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("warden.db");
            {
                let store = WardenStore::open(&path).unwrap();
                let record = TrustRecord::new("site_9".into(), "technical".into());
                store.persist_trust_record(&record).unwrap();
            }
            let store = WardenStore::open(&path).unwrap();
            assert!(store.trust_record("site_9", "technical").unwrap().is_some());
        }
    }

    // ── Proposals & action log ─────────────────────────────────

    mod proposals {
        use super::*;

        #[test]
        fn test_proposal_roundtrip() {
            let store = WardenStore::open_in_memory().unwrap();
            let original = proposal("fp_abc", ProposalStatus::Open);
            store.persist_proposal(&original).unwrap();

            let loaded = store.proposal(original.proposal_id).unwrap().unwrap();
            assert_eq!(loaded.fingerprint, "fp_abc");
            assert_eq!(loaded.status, ProposalStatus::Open);
            assert_eq!(loaded.evidence["pages"], 12);
            assert_eq!(loaded.change_plan.len(), 2);
        }

        #[test]
        fn test_open_fingerprint_lookup() {
            let store = WardenStore::open_in_memory().unwrap();
            store.persist_proposal(&proposal("fp_open", ProposalStatus::Open)).unwrap();
            store.persist_proposal(&proposal("fp_closed", ProposalStatus::Rejected)).unwrap();

            assert!(store.open_proposal_by_fingerprint("fp_open").unwrap().is_some());
            // Rejected proposals do not count as open
            assert!(store.open_proposal_by_fingerprint("fp_closed").unwrap().is_none());
        }

        #[test]
        fn test_second_open_proposal_with_same_fingerprint_rejected() {
            let store = WardenStore::open_in_memory().unwrap();
            store.persist_proposal(&proposal("fp_dup", ProposalStatus::Open)).unwrap();

            // A different proposal id with the same open fingerprint violates
            // the unique index
            let err = store.persist_proposal(&proposal("fp_dup", ProposalStatus::Open));
            assert!(err.is_err());
        }

        #[test]
        fn test_closed_duplicate_fingerprint_allowed() {
            let store = WardenStore::open_in_memory().unwrap();
            store.persist_proposal(&proposal("fp_re", ProposalStatus::Superseded)).unwrap();
            // The index only guards open rows; history may repeat a fingerprint
            store.persist_proposal(&proposal("fp_re", ProposalStatus::Open)).unwrap();
        }

        #[test]
        fn test_action_log_ordered_by_seq() {
            let store = WardenStore::open_in_memory().unwrap();
            let p = proposal("fp_log", ProposalStatus::Open);
            store.persist_proposal(&p).unwrap();

            for (seq, action) in [(1, "opened"), (2, "updated"), (3, "approved")] {
                store
                    .append_proposal_action(&ProposalAction {
                        proposal_id: p.proposal_id,
                        seq,
                        actor: if action == "opened" { "system" } else { "alice" }.into(),
                        action: action.into(),
                        reason: String::new(),
                        at: Utc::now(),
                    })
                    .unwrap();
            }

            let log = store.proposal_actions(p.proposal_id).unwrap();
            assert_eq!(log.len(), 3);
            assert_eq!(log[0].action, "opened");
            assert_eq!(log[2].action, "approved");
            assert!(log.windows(2).all(|w| w[0].seq < w[1].seq));
        }

        #[test]
        fn test_duplicate_seq_rejected() {
            let store = WardenStore::open_in_memory().unwrap();
            let p = proposal("fp_seq", ProposalStatus::Open);
            store.persist_proposal(&p).unwrap();

            let entry = ProposalAction {
                proposal_id: p.proposal_id,
                seq: 1,
                actor: "system".into(),
                action: "opened".into(),
                reason: String::new(),
                at: Utc::now(),
            };
            store.append_proposal_action(&entry).unwrap();
            assert!(store.append_proposal_action(&entry).is_err());
        }
    }

    // ── Action runs ────────────────────────────────────────────

    mod action_runs {
        use super::*;

        #[test]
        fn test_run_written_at_start_and_terminal() {
            let store = WardenStore::open_in_memory().unwrap();
            let mut run = ActionRun {
                run_id: Uuid::new_v4(),
                anomaly_id: "anom_1".into(),
                website_id: "site_1".into(),
                action_code: "seo.add_meta_descriptions".into(),
                status: RunStatus::Running,
                plan: vec![],
                output: RunOutput::default(),
                started_at: Utc::now(),
                completed_at: None,
                error_text: None,
            };
            store.persist_action_run(&run).unwrap();
            assert_eq!(
                store.action_run(run.run_id).unwrap().unwrap().status,
                RunStatus::Running
            );

            run.status = RunStatus::Failed;
            run.error_text = Some("enrichment plan is empty".into());
            run.completed_at = Some(Utc::now());
            store.persist_action_run(&run).unwrap();

            let loaded = store.action_run(run.run_id).unwrap().unwrap();
            assert_eq!(loaded.status, RunStatus::Failed);
            assert!(loaded.error_text.is_some());
            assert!(loaded.completed_at.is_some());
        }

        #[test]
        fn test_runs_for_anomaly() {
            let store = WardenStore::open_in_memory().unwrap();
            for _ in 0..2 {
                store
                    .persist_action_run(&ActionRun {
                        run_id: Uuid::new_v4(),
                        anomaly_id: "anom_x".into(),
                        website_id: "site_1".into(),
                        action_code: "seo.fix_indexing".into(),
                        status: RunStatus::Completed,
                        plan: vec![],
                        output: RunOutput::default(),
                        started_at: Utc::now(),
                        completed_at: Some(Utc::now()),
                        error_text: None,
                    })
                    .unwrap();
            }
            assert_eq!(store.action_runs_for_anomaly("anom_x").unwrap().len(), 2);
            assert!(store.action_runs_for_anomaly("anom_other").unwrap().is_empty());
        }
    }

    // ── Outcome events & knowledge ─────────────────────────────

    mod outcomes {
        use super::*;

        fn event(site: &str) -> OutcomeEvent {
            OutcomeEvent {
                event_id: Uuid::new_v4(),
                site_id: site.into(),
                metric_key: "lcp".into(),
                old_value: 2000.0,
                new_value: 4200.0,
                delta: 2200.0,
                percent_change: 110.0,
                severity: Severity::High,
                event_type: OutcomeType::Breakage,
                window: "7d".into(),
                context: OutcomeContext {
                    intervention_id: Some(Uuid::new_v4()),
                    note: String::new(),
                },
                detected_at: Utc::now(),
            }
        }

        #[test]
        fn test_event_append_and_fetch() {
            let store = WardenStore::open_in_memory().unwrap();
            let e = event("site_1");
            store.append_outcome_event(&e).unwrap();
            store.append_outcome_event(&event("site_2")).unwrap();

            let events = store.outcome_events("site_1", 10).unwrap();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].event_type, OutcomeType::Breakage);
            assert_eq!(events[0].severity, Severity::High);
            assert_eq!(events[0].context.intervention_id, e.context.intervention_id);
        }

        #[test]
        fn test_knowledge_upsert_by_source_event() {
            let store = WardenStore::open_in_memory().unwrap();
            let source_event_id = Uuid::new_v4();
            let now = Utc::now();
            let mut entry = KnowledgeEntry {
                entry_id: Uuid::new_v4(),
                source_event_id,
                confidence: 0.85,
                status: KnowledgeStatus::Draft,
                recommended_action: None,
                avoid_action: Some("avoid aggressive redirects on site_1".into()),
                guardrail: Some("monitor 'lcp' for 24h after applying this action".into()),
                evidence: KnowledgeEvidence {
                    event_id: source_event_id,
                    action_run_ids: vec![Uuid::new_v4()],
                    attribution_confidence: 0.85,
                    before: 2000.0,
                    after: 4200.0,
                },
                tags: vec!["lcp".into()],
                created_at: now,
                updated_at: now,
            };
            store.persist_knowledge_entry(&entry).unwrap();

            // Corroboration lands on the same row
            entry.confidence = 0.92;
            entry.status = KnowledgeStatus::Active;
            store.persist_knowledge_entry(&entry).unwrap();

            let all = store.load_knowledge_entries().unwrap();
            assert_eq!(all.len(), 1);
            assert_eq!(all[0].status, KnowledgeStatus::Active);
            assert!((all[0].confidence - 0.92).abs() < 1e-9);
        }
    }

    // ── Safety audit ───────────────────────────────────────────

    mod safety_audit {
        use super::*;

        #[test]
        fn test_audit_append_and_read() {
            let store = WardenStore::open_in_memory().unwrap();
            for (seq, command) in [(1u64, "activate_kill_switch"), (2, "pause_website")] {
                store
                    .append_safety_audit(&SafetyAuditEntry {
                        seq,
                        at: Utc::now(),
                        actor: "ops@example.com".into(),
                        command: command.into(),
                        detail: "incident response drill under way".into(),
                    })
                    .unwrap();
            }
            let trail = store.safety_audit(10).unwrap();
            assert_eq!(trail.len(), 2);
            // Newest first
            assert_eq!(trail[0].command, "pause_website");
        }
    }
}
