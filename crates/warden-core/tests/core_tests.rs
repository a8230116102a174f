#[cfg(test)]
mod tests {
    // ── Trust levels ───────────────────────────────────────────

    mod trust_level {
        use warden_core::TrustLevel;

        #[test]
        fn test_from_u8() {
            assert_eq!(TrustLevel::from_u8(0), TrustLevel::Observe);
            assert_eq!(TrustLevel::from_u8(1), TrustLevel::Recommend);
            assert_eq!(TrustLevel::from_u8(2), TrustLevel::Assisted);
            assert_eq!(TrustLevel::from_u8(3), TrustLevel::Autonomous);
            // Out of range defaults to Observe
            assert_eq!(TrustLevel::from_u8(4), TrustLevel::Observe);
            assert_eq!(TrustLevel::from_u8(255), TrustLevel::Observe);
        }

        #[test]
        fn test_ordering() {
            assert!(TrustLevel::Observe < TrustLevel::Recommend);
            assert!(TrustLevel::Recommend < TrustLevel::Assisted);
            assert!(TrustLevel::Assisted < TrustLevel::Autonomous);
        }

        #[test]
        fn test_downgrade_saturates() {
            assert_eq!(TrustLevel::Assisted.downgraded(), TrustLevel::Recommend);
            assert_eq!(TrustLevel::Observe.downgraded(), TrustLevel::Observe);
        }

        #[test]
        fn test_upgrade_saturates() {
            assert_eq!(TrustLevel::Recommend.upgraded(), TrustLevel::Assisted);
            assert_eq!(TrustLevel::Autonomous.upgraded(), TrustLevel::Autonomous);
        }

        #[test]
        fn test_display() {
            let s = format!("{}", TrustLevel::Assisted);
            assert!(s.contains("T2"));
            assert!(s.contains("Assisted"));
        }

        #[test]
        fn test_serde_roundtrip() {
            let level = TrustLevel::Autonomous;
            let json = serde_json::to_string(&level).unwrap();
            let restored: TrustLevel = serde_json::from_str(&json).unwrap();
            assert_eq!(restored, level);
        }
    }

    // ── Errors ─────────────────────────────────────────────────

    mod error {
        use warden_core::WardenError;

        #[test]
        fn test_lock_held_message() {
            let err = WardenError::LockHeld {
                job_id: "anom_1".into(),
                holder: "runner-a".into(),
            };
            let msg = err.to_string();
            assert!(msg.contains("anom_1"));
            assert!(msg.contains("runner-a"));
        }

        #[test]
        fn test_validation_message() {
            let err = WardenError::Validation {
                field: "confidence".into(),
                reason: "out of range".into(),
            };
            assert!(err.to_string().contains("confidence"));
        }
    }

    // ── Event bus ──────────────────────────────────────────────

    mod event_bus {
        use warden_core::{EventBus, GovernanceEvent};

        #[tokio::test]
        async fn test_publish_subscribe() {
            let bus = EventBus::new(16);
            let mut rx = bus.subscribe();
            bus.publish(GovernanceEvent::KillSwitchActivated {
                triggered_by: "ops@example.com".into(),
                reason: "incident response drill".into(),
            });
            let event = rx.recv().await.unwrap();
            match event {
                GovernanceEvent::KillSwitchActivated { triggered_by, .. } => {
                    assert_eq!(triggered_by, "ops@example.com");
                }
                other => panic!("unexpected event {other:?}"),
            }
        }

        #[test]
        fn test_publish_without_subscribers_is_silent() {
            let bus = EventBus::default();
            bus.publish(GovernanceEvent::Shutdown);
        }
    }
}
