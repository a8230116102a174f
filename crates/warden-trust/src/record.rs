use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_core::{ActionCategory, Result, TrustLevel, WardenError, WebsiteId};

/// Earned-autonomy state for one (website, action category) pair.
///
/// Records are created at onboarding with [`TrustLevel::Observe`] and are
/// never deleted — a superseding write replaces the row, the history lives in
/// the counts and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustRecord {
    pub website_id: WebsiteId,
    pub action_category: ActionCategory,
    pub trust_level: TrustLevel,
    /// Confidence in the current trust level, 0-100.
    pub confidence: f64,
    pub success_count: u32,
    pub failure_count: u32,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Last manual review (upgrade or override).
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrustRecord {
    /// A fresh Observe-level record, as created at website onboarding.
    pub fn new(website_id: WebsiteId, action_category: ActionCategory) -> Self {
        let now = Utc::now();
        Self {
            website_id,
            action_category,
            trust_level: TrustLevel::Observe,
            confidence: 50.0,
            success_count: 0,
            failure_count: 0,
            last_success_at: None,
            last_failure_at: None,
            last_reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_actions(&self) -> u32 {
        self.success_count + self.failure_count
    }

    /// Fraction of successful actions, None until any action ran.
    pub fn success_rate(&self) -> Option<f64> {
        let total = self.total_actions();
        if total == 0 {
            None
        } else {
            Some(f64::from(self.success_count) / f64::from(total))
        }
    }

    /// Whether the most recent outcome was a failure. A single new success
    /// clears this, because the comparison is by timestamp.
    pub fn recently_failed(&self) -> bool {
        match (self.last_failure_at, self.last_success_at) {
            (Some(failure), Some(success)) => failure > success,
            (Some(_), None) => true,
            _ => false,
        }
    }

    /// Range checks applied before any write reaches the ledger.
    pub fn validate(&self) -> Result<()> {
        if !self.confidence.is_finite() || !(0.0..=100.0).contains(&self.confidence) {
            return Err(WardenError::Validation {
                field: "confidence".into(),
                reason: format!("must be within 0..=100, got {}", self.confidence),
            });
        }
        Ok(())
    }
}
