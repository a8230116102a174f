use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_core::{RiskLevel, ServiceKey, WebsiteId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Open,
    Approved,
    Rejected,
    Applied,
    Superseded,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Applied => "applied",
            Self::Superseded => "superseded",
        }
    }

    /// Which statuses a proposal may move to from here. Rejected, Applied,
    /// and Superseded are terminal.
    pub fn can_transition_to(&self, to: ProposalStatus) -> bool {
        matches!(
            (self, to),
            (Self::Open, Self::Approved)
                | (Self::Open, Self::Rejected)
                | (Self::Open, Self::Superseded)
                | (Self::Approved, Self::Applied)
                | (Self::Approved, Self::Superseded)
        )
    }
}

/// A change awaiting (or past) human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeProposal {
    pub proposal_id: Uuid,
    pub fingerprint: String,
    pub website_id: WebsiteId,
    pub service_key: ServiceKey,
    /// Problem kind, e.g. "missing_meta", "broken_redirect".
    pub kind: String,
    /// What the change touches, e.g. a path or page group.
    pub target: String,
    pub status: ProposalStatus,
    pub risk_level: RiskLevel,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub evidence: serde_json::Value,
    /// Ordered implementation steps.
    pub change_plan: Vec<String>,
    pub verification_plan: Vec<String>,
    pub rollback_plan: Vec<String>,
    /// Blocks dependent automation until resolved.
    pub blocking: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of a proposal's append-only audit log. Rows are only ever added,
/// with strictly increasing `seq` per proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalAction {
    pub proposal_id: Uuid,
    pub seq: u64,
    pub actor: String,
    /// What happened: "opened", "updated", "approved", ...
    pub action: String,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Everything a detector hands over when it wants a change reviewed.
#[derive(Debug, Clone)]
pub struct ProposalInput {
    pub website_id: WebsiteId,
    pub service_key: ServiceKey,
    pub kind: String,
    pub target: String,
    pub risk_level: RiskLevel,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub evidence: serde_json::Value,
    pub change_plan: Vec<String>,
    pub verification_plan: Vec<String>,
    pub rollback_plan: Vec<String>,
    pub blocking: bool,
    pub tags: Vec<String>,
}

/// Outcome of [`crate::ProposalManager::create_or_update`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalDecision {
    pub proposal_id: Uuid,
    pub is_new: bool,
}
