#[cfg(test)]
mod tests {
    use warden_config::schema::SafetyConfig;
    use warden_safety::{SafetyCheckRequest, SafetyControlPlane, SystemMode};

    fn plane() -> SafetyControlPlane {
        SafetyControlPlane::new(SafetyConfig::default())
    }

    // ── Kill switch ────────────────────────────────────────────

    mod kill_switch {
        use super::*;

        #[test]
        fn test_activation_requires_long_reason() {
            let plane = plane();
            let result = plane.activate_kill_switch("oops", "ops@example.com");
            assert!(result.is_err());
            assert!(!plane.kill_switch_active());
        }

        #[test]
        fn test_activation_requires_actor() {
            let plane = plane();
            let result = plane.activate_kill_switch("rollout went sideways", "  ");
            assert!(result.is_err());
        }

        #[test]
        fn test_activate_then_deactivate() {
            let plane = plane();
            plane
                .activate_kill_switch("rollout went sideways", "ops@example.com")
                .unwrap();
            assert!(plane.kill_switch_active());
            let state = plane.state();
            assert_eq!(state.kill_switch.triggered_by.as_deref(), Some("ops@example.com"));
            assert!(state.kill_switch.activated_at.is_some());

            plane.deactivate_kill_switch("ops@example.com").unwrap();
            assert!(!plane.kill_switch_active());
            assert!(plane.state().kill_switch.reason.is_none());
        }

        #[test]
        fn test_active_switch_fails_every_check() {
            let plane = plane();
            plane
                .activate_kill_switch("rollout went sideways", "ops@example.com")
                .unwrap();
            let result = plane.perform_safety_check(&SafetyCheckRequest::default());
            assert!(!result.passed);
            assert!(result.failures[0].contains("kill switch"));
        }
    }

    // ── System mode ────────────────────────────────────────────

    mod mode {
        use super::*;

        #[test]
        fn test_maintenance_blocks_changes_only() {
            let plane = plane();
            plane
                .set_system_mode(SystemMode::Maintenance, "ops@example.com")
                .unwrap();

            // Read-only work keeps passing
            let read_only = plane.perform_safety_check(&SafetyCheckRequest {
                requires_changes: false,
                ..Default::default()
            });
            assert!(read_only.passed);

            // Change-requiring work fails
            let mutating = plane.perform_safety_check(&SafetyCheckRequest {
                requires_changes: true,
                ..Default::default()
            });
            assert!(!mutating.passed);
            assert!(mutating.failures[0].contains("Maintenance"));
        }
    }

    // ── Service & website interlocks ───────────────────────────

    mod interlocks {
        use super::*;

        #[test]
        fn test_disabled_service_fails_check() {
            let plane = plane();
            plane
                .disable_service("gsc", "quota exhausted upstream", "ops@example.com")
                .unwrap();
            let result = plane.perform_safety_check(&SafetyCheckRequest {
                service_name: Some("gsc".into()),
                ..Default::default()
            });
            assert!(!result.passed);

            plane.enable_service("gsc", "ops@example.com").unwrap();
            let result = plane.perform_safety_check(&SafetyCheckRequest {
                service_name: Some("gsc".into()),
                ..Default::default()
            });
            assert!(result.passed);
        }

        #[test]
        fn test_paused_website_fails_check() {
            let plane = plane();
            plane
                .pause_website("site_1", "customer requested freeze", "support@example.com")
                .unwrap();
            let result = plane.perform_safety_check(&SafetyCheckRequest {
                website_id: Some("site_1".into()),
                ..Default::default()
            });
            assert!(!result.passed);
            assert!(result.failures[0].contains("site_1"));

            // Other websites are unaffected
            let other = plane.perform_safety_check(&SafetyCheckRequest {
                website_id: Some("site_2".into()),
                ..Default::default()
            });
            assert!(other.passed);
        }

        #[test]
        fn test_failures_accumulate() {
            let plane = plane();
            plane
                .activate_kill_switch("rollout went sideways", "ops@example.com")
                .unwrap();
            plane
                .pause_website("site_1", "customer requested freeze", "support@example.com")
                .unwrap();
            let result = plane.perform_safety_check(&SafetyCheckRequest {
                website_id: Some("site_1".into()),
                requires_changes: true,
                ..Default::default()
            });
            assert_eq!(result.failures.len(), 2);
        }
    }

    // ── Audit trail ────────────────────────────────────────────

    mod audit {
        use super::*;

        #[test]
        fn test_every_mutation_is_audited_in_order() {
            let plane = plane();
            plane
                .activate_kill_switch("rollout went sideways", "ops@example.com")
                .unwrap();
            plane.deactivate_kill_switch("ops@example.com").unwrap();
            plane
                .pause_website("site_1", "customer requested freeze", "support@example.com")
                .unwrap();

            let trail = plane.audit_trail();
            assert_eq!(trail.len(), 3);
            assert_eq!(trail[0].command, "activate_kill_switch");
            assert_eq!(trail[1].command, "deactivate_kill_switch");
            assert_eq!(trail[2].command, "pause_website");
            assert!(trail.windows(2).all(|w| w[0].seq < w[1].seq));
        }

        #[test]
        fn test_rejected_mutation_is_not_audited() {
            let plane = plane();
            let _ = plane.activate_kill_switch("bad", "ops@example.com");
            assert!(plane.audit_trail().is_empty());
        }

        #[test]
        fn test_audit_retention_bound() {
            let plane = SafetyControlPlane::new(SafetyConfig {
                min_reason_len: 10,
                audit_retention: 5,
            });
            for i in 0..8 {
                plane
                    .set_system_mode(SystemMode::Normal, &format!("ops{i}@example.com"))
                    .unwrap();
            }
            let trail = plane.audit_trail();
            assert_eq!(trail.len(), 5);
            // Oldest entries were dropped, ordering preserved
            assert_eq!(trail.first().unwrap().seq, 4);
            assert_eq!(trail.last().unwrap().seq, 8);
        }
    }
}
