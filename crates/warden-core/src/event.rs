use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::sync::Arc;
use tokio::sync::broadcast;

/// Events flowing through the governance engine — every consequential
/// decision is observable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GovernanceEvent {
    // ── Safety lifecycle ───────────────────────────────────────
    KillSwitchActivated {
        triggered_by: String,
        reason: String,
    },
    KillSwitchDeactivated {
        triggered_by: String,
    },
    SystemModeChanged {
        mode: String,
        triggered_by: String,
    },
    ServiceDisabled {
        service: String,
        triggered_by: String,
    },
    WebsitePaused {
        website_id: String,
        triggered_by: String,
    },

    // ── Proposal lifecycle ─────────────────────────────────────
    ProposalOpened {
        proposal_id: Uuid,
        fingerprint: String,
    },
    ProposalUpdated {
        proposal_id: Uuid,
        fingerprint: String,
    },
    ProposalTransitioned {
        proposal_id: Uuid,
        status: String,
        actor: String,
    },

    // ── Action lifecycle ───────────────────────────────────────
    ActionDenied {
        website_id: String,
        action_code: String,
        reason: String,
    },
    ActionRunStarted {
        run_id: Uuid,
        action_code: String,
    },
    ActionRunCompleted {
        run_id: Uuid,
        findings: usize,
    },
    ActionRunFailed {
        run_id: Uuid,
        error: String,
    },

    // ── Outcome / trust lifecycle ──────────────────────────────
    OutcomeDetected {
        event_id: Uuid,
        metric_key: String,
        event_type: String,
        severity: String,
    },
    TrustAdjusted {
        website_id: String,
        category: String,
        level: u8,
        success: bool,
    },
    KnowledgePromoted {
        entry_id: Uuid,
        confidence: f64,
    },

    // ── System ─────────────────────────────────────────────────
    Heartbeat {
        timestamp: DateTime<Utc>,
    },
    Shutdown,
}

/// A broadcast-based event bus for system-wide pub/sub.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<GovernanceEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn publish(&self, event: GovernanceEvent) {
        // Ignore send errors (no subscribers).
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GovernanceEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(4096)
    }
}
