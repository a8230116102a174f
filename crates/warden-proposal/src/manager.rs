use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use warden_core::{Result, WardenError};

use crate::fingerprint::proposal_fingerprint;
use crate::proposal::{
    ChangeProposal, ProposalAction, ProposalDecision, ProposalInput, ProposalStatus,
};

struct Inner {
    proposals: HashMap<Uuid, ChangeProposal>,
    /// Append-only action log per proposal, ordered by seq.
    logs: HashMap<Uuid, Vec<ProposalAction>>,
    /// fingerprint -> proposal id, for proposals whose status is Open.
    open_index: HashMap<String, Uuid>,
}

/// Owns the proposal set. All writes go through one lock, which is what
/// guarantees at most one open proposal per fingerprint even when several
/// detectors race on the same problem.
#[derive(Clone)]
pub struct ProposalManager {
    inner: Arc<Mutex<Inner>>,
}

impl Default for ProposalManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                proposals: HashMap::new(),
                logs: HashMap::new(),
                open_index: HashMap::new(),
            })),
        }
    }

    /// Converge repeated detections of the same problem onto one open
    /// proposal: update it in place when the fingerprint is already open,
    /// create it otherwise.
    pub fn create_or_update(&self, input: ProposalInput) -> ProposalDecision {
        let fingerprint = proposal_fingerprint(
            &input.website_id,
            &input.service_key,
            &input.kind,
            &input.target,
        );
        let mut inner = self.inner.lock();

        if let Some(&existing_id) = inner.open_index.get(&fingerprint) {
            let proposal = inner
                .proposals
                .get_mut(&existing_id)
                .expect("open index points at a live proposal");
            proposal.risk_level = input.risk_level;
            proposal.title = input.title;
            proposal.description = input.description;
            proposal.rationale = input.rationale;
            proposal.evidence = input.evidence;
            proposal.change_plan = input.change_plan;
            proposal.verification_plan = input.verification_plan;
            proposal.rollback_plan = input.rollback_plan;
            proposal.blocking = input.blocking;
            proposal.tags = input.tags;
            proposal.updated_at = Utc::now();
            Self::append_action(
                &mut inner,
                existing_id,
                "system",
                "updated",
                "repeat detection refreshed the open proposal",
            );
            debug!(proposal_id = %existing_id, fingerprint = %fingerprint, "proposal updated in place");
            return ProposalDecision {
                proposal_id: existing_id,
                is_new: false,
            };
        }

        let proposal_id = Uuid::new_v4();
        let now = Utc::now();
        let proposal = ChangeProposal {
            proposal_id,
            fingerprint: fingerprint.clone(),
            website_id: input.website_id,
            service_key: input.service_key,
            kind: input.kind,
            target: input.target,
            status: ProposalStatus::Open,
            risk_level: input.risk_level,
            title: input.title,
            description: input.description,
            rationale: input.rationale,
            evidence: input.evidence,
            change_plan: input.change_plan,
            verification_plan: input.verification_plan,
            rollback_plan: input.rollback_plan,
            blocking: input.blocking,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        };
        inner.proposals.insert(proposal_id, proposal);
        inner.open_index.insert(fingerprint.clone(), proposal_id);
        Self::append_action(&mut inner, proposal_id, "system", "opened", "");
        info!(proposal_id = %proposal_id, fingerprint = %fingerprint, "proposal opened");
        ProposalDecision {
            proposal_id,
            is_new: true,
        }
    }

    /// Drive a proposal through its review lifecycle. Illegal transitions are
    /// rejected without touching state; legal ones append to the action log.
    pub fn transition(
        &self,
        proposal_id: Uuid,
        to: ProposalStatus,
        actor: &str,
        reason: &str,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        let proposal = inner
            .proposals
            .get_mut(&proposal_id)
            .ok_or_else(|| WardenError::Validation {
                field: "proposal_id".into(),
                reason: format!("unknown proposal {proposal_id}"),
            })?;

        if !proposal.status.can_transition_to(to) {
            return Err(WardenError::ProposalTransition {
                from: proposal.status.as_str().into(),
                to: to.as_str().into(),
            });
        }

        let was_open = proposal.status == ProposalStatus::Open;
        let fingerprint = proposal.fingerprint.clone();
        proposal.status = to;
        proposal.updated_at = Utc::now();
        if was_open {
            inner.open_index.remove(&fingerprint);
        }
        Self::append_action(&mut inner, proposal_id, actor, to.as_str(), reason);
        info!(proposal_id = %proposal_id, status = to.as_str(), actor, "proposal transitioned");
        Ok(())
    }

    pub fn get(&self, proposal_id: Uuid) -> Option<ChangeProposal> {
        self.inner.lock().proposals.get(&proposal_id).cloned()
    }

    /// The action log for a proposal, oldest first. The returned rows are a
    /// copy; there is no API that mutates an existing row.
    pub fn actions(&self, proposal_id: Uuid) -> Vec<ProposalAction> {
        self.inner
            .lock()
            .logs
            .get(&proposal_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn find_open_by_fingerprint(&self, fingerprint: &str) -> Option<ChangeProposal> {
        let inner = self.inner.lock();
        inner
            .open_index
            .get(fingerprint)
            .and_then(|id| inner.proposals.get(id))
            .cloned()
    }

    pub fn open_proposals(&self) -> Vec<ChangeProposal> {
        self.inner
            .lock()
            .proposals
            .values()
            .filter(|p| p.status == ProposalStatus::Open)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().proposals.len()
    }

    fn append_action(inner: &mut Inner, proposal_id: Uuid, actor: &str, action: &str, reason: &str) {
        let log = inner.logs.entry(proposal_id).or_default();
        let seq = log.last().map_or(1, |last| last.seq + 1);
        log.push(ProposalAction {
            proposal_id,
            seq,
            actor: actor.to_string(),
            action: action.to_string(),
            reason: reason.to_string(),
            at: Utc::now(),
        });
    }
}
