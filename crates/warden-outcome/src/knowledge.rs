use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use warden_config::schema::OutcomeConfig;

use crate::event::{AttributedAction, OutcomeEvent, OutcomeType};

/// Weights for blending corroborating evidence into an existing entry's
/// confidence. History dominates any single new observation.
const CONFIDENCE_HISTORY_WEIGHT: f64 = 0.7;
const CONFIDENCE_NEW_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeStatus {
    Draft,
    Active,
}

/// Where a knowledge entry came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEvidence {
    pub event_id: Uuid,
    pub action_run_ids: Vec<Uuid>,
    pub attribution_confidence: f64,
    pub before: f64,
    pub after: f64,
}

/// A promoted, reusable pattern: "doing X tends to cause Y". Regressions
/// yield an avoid-action plus a guardrail; improvements yield a
/// recommended action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub entry_id: Uuid,
    /// The outcome event this entry was first promoted from; corroborating
    /// attributions for the same event update this entry instead of
    /// creating a duplicate.
    pub source_event_id: Uuid,
    pub confidence: f64,
    pub status: KnowledgeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardrail: Option<String>,
    pub evidence: KnowledgeEvidence,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory knowledge base, deduplicated by originating event.
#[derive(Clone)]
pub struct KnowledgeBase {
    entries: Arc<Mutex<HashMap<Uuid, KnowledgeEntry>>>,
    config: OutcomeConfig,
}

impl KnowledgeBase {
    pub fn new(config: OutcomeConfig) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Promote an attributed outcome. A first promotion creates a draft
    /// entry; corroborating promotions for the same event blend confidence
    /// as a weighted average and may flip the entry active.
    pub fn promote(&self, event: &OutcomeEvent, attribution: &AttributedAction) -> KnowledgeEntry {
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.get_mut(&event.event_id) {
            existing.confidence = CONFIDENCE_HISTORY_WEIGHT * existing.confidence
                + CONFIDENCE_NEW_WEIGHT * attribution.confidence;
            if !existing
                .evidence
                .action_run_ids
                .contains(&attribution.action_run_id)
            {
                existing.evidence.action_run_ids.push(attribution.action_run_id);
            }
            if existing.status == KnowledgeStatus::Draft
                && existing.confidence >= self.config.activation_confidence
            {
                existing.status = KnowledgeStatus::Active;
                info!(entry = %existing.entry_id, confidence = existing.confidence, "knowledge entry activated");
            }
            existing.updated_at = Utc::now();
            return existing.clone();
        }

        let now = Utc::now();
        let (recommended_action, avoid_action, guardrail) = match event.event_type {
            OutcomeType::Improvement => (
                Some(format!(
                    "'{}' improved '{}' on {}; prefer it for similar anomalies",
                    attribution.action_code, event.metric_key, event.site_id
                )),
                None,
                None,
            ),
            OutcomeType::Regression | OutcomeType::Breakage => (
                None,
                Some(format!(
                    "'{}' regressed '{}' on {}; avoid without review",
                    attribution.action_code, event.metric_key, event.site_id
                )),
                Some(self.guardrail_for(&event.metric_key)),
            ),
        };

        let mut entry = KnowledgeEntry {
            entry_id: Uuid::new_v4(),
            source_event_id: event.event_id,
            confidence: attribution.confidence,
            status: KnowledgeStatus::Draft,
            recommended_action,
            avoid_action,
            guardrail,
            evidence: KnowledgeEvidence {
                event_id: event.event_id,
                action_run_ids: vec![attribution.action_run_id],
                attribution_confidence: attribution.confidence,
                before: event.old_value,
                after: event.new_value,
            },
            tags: vec![event.metric_key.clone(), attribution.action_category.clone()],
            created_at: now,
            updated_at: now,
        };
        if entry.confidence >= self.config.activation_confidence {
            entry.status = KnowledgeStatus::Active;
        }
        info!(entry = %entry.entry_id, event = %event.event_id, "knowledge entry promoted");
        entries.insert(event.event_id, entry.clone());
        entry
    }

    /// Recommended monitoring window by how fast the metric settles.
    fn guardrail_for(&self, metric_key: &str) -> String {
        let window = if self.config.fast_metrics.iter().any(|m| m == metric_key) {
            "24h"
        } else if self.config.slow_metrics.iter().any(|m| m == metric_key) {
            "14d"
        } else {
            "7d"
        };
        format!("monitor '{metric_key}' for {window} after applying this action")
    }

    pub fn get_by_event(&self, event_id: Uuid) -> Option<KnowledgeEntry> {
        self.entries.lock().get(&event_id).cloned()
    }

    pub fn all(&self) -> Vec<KnowledgeEntry> {
        self.entries.lock().values().cloned().collect()
    }

    pub fn active(&self) -> Vec<KnowledgeEntry> {
        self.entries
            .lock()
            .values()
            .filter(|e| e.status == KnowledgeStatus::Active)
            .cloned()
            .collect()
    }
}
