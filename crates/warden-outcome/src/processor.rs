use tracing::{debug, info};

use warden_config::schema::OutcomeConfig;
use warden_core::Result;
use warden_trust::TrustLedger;

use crate::event::{AttributedAction, OutcomeEvent, OutcomeType};
use crate::knowledge::{KnowledgeBase, KnowledgeEntry};

/// Closes the loop: attributed outcomes adjust the trust ledger and, when
/// the attribution is confident enough, become reusable knowledge.
pub struct OutcomeProcessor {
    config: OutcomeConfig,
    knowledge: KnowledgeBase,
}

impl OutcomeProcessor {
    pub fn new(config: OutcomeConfig) -> Self {
        let knowledge = KnowledgeBase::new(config.clone());
        Self { config, knowledge }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Feed one attributed outcome back into the system. Regressions and
    /// breakages count as failures against the attributed category,
    /// improvements as successes; either side is promoted to knowledge once
    /// the attribution clears the confidence bar.
    pub fn process(
        &self,
        event: &OutcomeEvent,
        attribution: &AttributedAction,
        ledger: &TrustLedger,
    ) -> Result<Option<KnowledgeEntry>> {
        let success = matches!(event.event_type, OutcomeType::Improvement);
        let record = ledger.record_outcome(&event.site_id, &attribution.action_category, success)?;
        debug!(
            site = %event.site_id,
            category = %attribution.action_category,
            success,
            level = %record.trust_level,
            "trust ledger updated from outcome"
        );

        if attribution.confidence < self.config.promotion_confidence {
            debug!(
                event = %event.event_id,
                confidence = attribution.confidence,
                "attribution below promotion confidence, not promoted"
            );
            return Ok(None);
        }

        let entry = self.knowledge.promote(event, attribution);
        info!(
            event = %event.event_id,
            entry = %entry.entry_id,
            confidence = entry.confidence,
            "outcome promoted to knowledge"
        );
        Ok(Some(entry))
    }

    /// Process a batch against a single attribution (one intervention, many
    /// shifted metrics). Returns the promoted entries.
    pub fn process_batch(
        &self,
        events: &[OutcomeEvent],
        attribution: &AttributedAction,
        ledger: &TrustLedger,
    ) -> Result<Vec<KnowledgeEntry>> {
        let mut promoted = Vec::new();
        for event in events {
            if let Some(entry) = self.process(event, attribution, ledger)? {
                promoted.push(entry);
            }
        }
        Ok(promoted)
    }
}
