use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use warden_core::{RiskLevel, TrustLevel};
use warden_registry::RiskRegistry;

use crate::ledger::TrustLedger;

/// The verdict of the eligibility gate. A denial is a value, not an error —
/// the `reason` is always human-readable and auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub allowed: bool,
    pub reason: String,
    pub current_trust_level: TrustLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_trust_level: Option<TrustLevel>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

impl EligibilityResult {
    fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            current_trust_level: TrustLevel::Observe,
            required_trust_level: None,
            confidence: 0.0,
            risk_level: None,
        }
    }
}

/// Pure decision function over the risk catalog and the trust ledger.
///
/// The safety control plane is deliberately NOT consulted here: read-only
/// enrichment must keep working during maintenance, so safety gates the
/// implementation step boundary instead (see warden-runner).
pub struct EligibilityGate {
    registry: Arc<RiskRegistry>,
    ledger: TrustLedger,
}

impl EligibilityGate {
    pub fn new(registry: Arc<RiskRegistry>, ledger: TrustLedger) -> Self {
        Self { registry, ledger }
    }

    /// May this action execute unattended for this website? Side-effect free
    /// and deterministic against unchanged backing state; first failing check
    /// wins.
    pub fn can_auto_execute(
        &self,
        website_id: &str,
        action_code: &str,
        action_category: &str,
    ) -> EligibilityResult {
        let Some(record) = self.ledger.get(website_id, action_category) else {
            debug!(website = website_id, category = action_category, "no trust record");
            return EligibilityResult::denied(format!(
                "no trust record for website '{website_id}' and category '{action_category}'"
            ));
        };

        let Some(profile) = self.registry.get(action_code) else {
            return EligibilityResult {
                current_trust_level: record.trust_level,
                confidence: record.confidence,
                ..EligibilityResult::denied(format!(
                    "action '{action_code}' not found in risk registry"
                ))
            };
        };

        let denied = |reason: String| EligibilityResult {
            allowed: false,
            reason,
            current_trust_level: record.trust_level,
            required_trust_level: Some(profile.min_trust_level),
            confidence: record.confidence,
            risk_level: Some(profile.risk_level),
        };

        if profile.requires_approval {
            return denied(format!("action '{action_code}' requires manual approval"));
        }

        if record.trust_level < profile.min_trust_level {
            return denied(format!(
                "trust level {} is below required {}",
                record.trust_level, profile.min_trust_level
            ));
        }

        if record.trust_level >= TrustLevel::Autonomous
            && record.confidence < self.ledger.config().confidence_floor
        {
            return denied(format!(
                "confidence {:.0} below threshold {:.0}",
                record.confidence,
                self.ledger.config().confidence_floor
            ));
        }

        if record.recently_failed() {
            return denied("recent failure — temporarily downgraded".to_string());
        }

        EligibilityResult {
            allowed: true,
            reason: "eligible for autonomous execution".into(),
            current_trust_level: record.trust_level,
            required_trust_level: Some(profile.min_trust_level),
            confidence: record.confidence,
            risk_level: Some(profile.risk_level),
        }
    }
}
