use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_core::{ActionCategory, ActionCode, Severity, WebsiteId};

/// Classification of a detected metric shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeType {
    /// A high-severity regression plausibly caused by a recent action.
    Breakage,
    Regression,
    Improvement,
}

/// What the shift is tied to, if anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeContext {
    /// The action run suspected of causing the shift.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervention_id: Option<Uuid>,
    #[serde(default)]
    pub note: String,
}

/// One detected metric shift. Events are append-only: one row per shift,
/// never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub event_id: Uuid,
    pub site_id: WebsiteId,
    pub metric_key: String,
    pub old_value: f64,
    pub new_value: f64,
    pub delta: f64,
    pub percent_change: f64,
    pub severity: Severity,
    pub event_type: OutcomeType,
    /// Window the shift was measured over, e.g. "7d".
    pub window: String,
    pub context: OutcomeContext,
    pub detected_at: DateTime<Utc>,
}

/// An executed action held responsible for an outcome, with how confident the
/// attribution is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributedAction {
    pub action_run_id: Uuid,
    pub action_code: ActionCode,
    pub action_category: ActionCategory,
    /// Attribution confidence in [0, 1].
    pub confidence: f64,
}
