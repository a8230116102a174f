use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use warden_config::WardenConfig;
use warden_core::{
    Anomaly, EventBus, GovernanceEvent, JobId, Result, TrustLevel, WardenError, WebsiteRecord,
    WebsiteStatus,
};
use warden_outcome::{
    AttributedAction, KnowledgeBase, OutcomeEvent, OutcomeProcessor, OutcomeType, detect_breakages,
};
use warden_plan::{PlanRunner, RunPlan, RunPlanExecution, ServiceExecutor};
use warden_proposal::{ProposalDecision, ProposalInput, ProposalManager, ProposalStatus};
use warden_registry::RiskRegistry;
use warden_runner::{
    ActionRun, ActionRunner, Connector, EnrichmentRegistry, JobLockManager, JobLockStatus,
    RunStatus,
};
use warden_safety::{SafetyControlPlane, SystemMode};
use warden_store::WardenStore;
use warden_trust::{EligibilityGate, EligibilityResult, TrustLedger};

use crate::boundary::{MetricsSource, WebsiteDirectory};
use crate::status::SystemStatus;

/// The governance engine facade.
///
/// Owns every subsystem and the event bus; collaborators reach the engine
/// through the operations below rather than the subsystems directly. The
/// safety control plane and trust ledger are injected into the components
/// that consult them — there are no ambient globals.
pub struct GovernanceEngine {
    config: WardenConfig,
    registry: Arc<RiskRegistry>,
    ledger: TrustLedger,
    gate: EligibilityGate,
    safety: SafetyControlPlane,
    proposals: ProposalManager,
    runner: ActionRunner,
    outcomes: OutcomeProcessor,
    directory: Arc<dyn WebsiteDirectory>,
    metrics: Arc<dyn MetricsSource>,
    store: Option<WardenStore>,
    events: EventBus,
    started_at: DateTime<Utc>,
}

impl GovernanceEngine {
    /// Wire a new engine from config and the boundary collaborators. State
    /// starts empty; attach persistence with [`Self::with_store`].
    pub fn new(
        config: WardenConfig,
        directory: Arc<dyn WebsiteDirectory>,
        metrics: Arc<dyn MetricsSource>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let registry = Arc::new(RiskRegistry::builtin());
        let ledger = TrustLedger::new(config.trust.clone());
        let gate = EligibilityGate::new(Arc::clone(&registry), ledger.clone());
        let safety = SafetyControlPlane::new(config.safety.clone());
        let locks = JobLockManager::new(config.locks.lease_secs);
        let runner = ActionRunner::new(
            Arc::new(EnrichmentRegistry::builtin()),
            connector,
            safety.clone(),
            locks,
        );
        let outcomes = OutcomeProcessor::new(config.outcome.clone());

        info!(
            actions = registry.len(),
            categories = registry.categories().len(),
            "governance engine wired"
        );

        Self {
            config,
            registry,
            ledger,
            gate,
            safety,
            proposals: ProposalManager::new(),
            runner,
            outcomes,
            directory,
            metrics,
            store: None,
            events: EventBus::default(),
            started_at: Utc::now(),
        }
    }

    /// Attach the SQLite store and warm the trust ledger from it.
    pub fn with_store(mut self, store: WardenStore) -> Result<Self> {
        let records = store.load_trust_records()?;
        let loaded = records.len();
        for record in records {
            self.ledger.upsert(record)?;
        }
        if loaded > 0 {
            info!(loaded, "trust ledger warmed from store");
        }
        self.store = Some(store);
        Ok(self)
    }

    // ── Eligibility ────────────────────────────────────────────

    /// May this action execute unattended? Deterministic against unchanged
    /// backing state; denials are published to the event bus so they remain
    /// auditable.
    pub fn can_auto_execute(
        &self,
        website_id: &str,
        action_code: &str,
        action_category: &str,
    ) -> EligibilityResult {
        let verdict = self
            .gate
            .can_auto_execute(website_id, action_code, action_category);
        if !verdict.allowed {
            info!(
                website = website_id,
                action = action_code,
                reason = %verdict.reason,
                "action denied by eligibility gate"
            );
            self.events.publish(GovernanceEvent::ActionDenied {
                website_id: website_id.to_string(),
                action_code: action_code.to_string(),
                reason: verdict.reason.clone(),
            });
        }
        verdict
    }

    // ── Onboarding ─────────────────────────────────────────────

    /// Create an Observe-level trust record for every catalog category for a
    /// newly managed website. Returns how many records were created.
    pub async fn onboard_website(&self, website_id: &str) -> Result<usize> {
        self.lookup_active(website_id).await?;
        let categories = self.registry.categories();
        let created = self.ledger.onboard_website(website_id, &categories);
        for record in self.ledger.for_website(website_id) {
            self.persist(|store| store.persist_trust_record(&record))?;
        }
        Ok(created)
    }

    // ── Proposals ──────────────────────────────────────────────

    /// Hand a detected problem over for human review. Repeated detections of
    /// the same problem converge onto one open proposal.
    pub fn create_or_update_proposal(&self, input: ProposalInput) -> Result<ProposalDecision> {
        let decision = self.proposals.create_or_update(input);
        self.persist_proposal_state(decision.proposal_id)?;

        if let Some(proposal) = self.proposals.get(decision.proposal_id) {
            let event = if decision.is_new {
                GovernanceEvent::ProposalOpened {
                    proposal_id: decision.proposal_id,
                    fingerprint: proposal.fingerprint,
                }
            } else {
                GovernanceEvent::ProposalUpdated {
                    proposal_id: decision.proposal_id,
                    fingerprint: proposal.fingerprint,
                }
            };
            self.events.publish(event);
        }
        Ok(decision)
    }

    /// Drive a proposal through its review lifecycle on behalf of a reviewer.
    pub fn transition_proposal(
        &self,
        proposal_id: Uuid,
        to: ProposalStatus,
        actor: &str,
        reason: &str,
    ) -> Result<()> {
        self.proposals.transition(proposal_id, to, actor, reason)?;
        self.persist_proposal_state(proposal_id)?;
        self.events.publish(GovernanceEvent::ProposalTransitioned {
            proposal_id,
            status: to.as_str().to_string(),
            actor: actor.to_string(),
        });
        Ok(())
    }

    /// Mirror the in-memory proposal and its newest log row into the store.
    fn persist_proposal_state(&self, proposal_id: Uuid) -> Result<()> {
        let Some(proposal) = self.proposals.get(proposal_id) else {
            return Ok(());
        };
        self.persist(|store| store.persist_proposal(&proposal))?;
        if let Some(action) = self.proposals.actions(proposal_id).last() {
            self.persist(|store| store.append_proposal_action(action))?;
        }
        Ok(())
    }

    // ── Diagnostics & actions ──────────────────────────────────

    /// Run a validated diagnostic plan through the scheduler. Diagnostics
    /// are read-only, so the safety control plane is not consulted here.
    pub async fn execute_plan(
        &self,
        plan: &RunPlan,
        executor: Arc<dyn ServiceExecutor>,
    ) -> Result<RunPlanExecution> {
        PlanRunner::execute(plan, executor).await
    }

    /// Execute one action for one anomaly against an active website, and
    /// record the terminal run.
    pub async fn run_action(
        &self,
        website_id: &str,
        anomaly: &Anomaly,
        action_code: &str,
    ) -> Result<ActionRun> {
        let site = self.lookup_active(website_id).await?;
        let run = self
            .runner
            .run_action(website_id, &site.base_url, anomaly, action_code)
            .await?;
        self.persist(|store| store.persist_action_run(&run))?;

        self.events.publish(GovernanceEvent::ActionRunStarted {
            run_id: run.run_id,
            action_code: action_code.to_string(),
        });
        match run.status {
            RunStatus::Completed => self.events.publish(GovernanceEvent::ActionRunCompleted {
                run_id: run.run_id,
                findings: run.output.findings.len(),
            }),
            RunStatus::Failed => self.events.publish(GovernanceEvent::ActionRunFailed {
                run_id: run.run_id,
                error: run.error_text.clone().unwrap_or_default(),
            }),
            RunStatus::Running => {}
        }
        Ok(run)
    }

    // ── Outcome feedback ───────────────────────────────────────

    /// Compare a site's current metrics window against a baseline window,
    /// record every classified shift, and — when the shifts are attributed
    /// to an executed action — close the loop into trust and knowledge.
    pub async fn evaluate_outcomes(
        &self,
        site_id: &str,
        current_window: &str,
        baseline_window: &str,
        attribution: Option<&AttributedAction>,
    ) -> Result<Vec<OutcomeEvent>> {
        let current = self.metrics.snapshot(site_id, current_window).await?;
        let baseline = self.metrics.snapshot(site_id, baseline_window).await?;
        let events = detect_breakages(
            site_id,
            &current,
            &baseline,
            attribution.map(|a| a.action_run_id),
            current_window,
            &self.config.outcome,
        );

        for event in &events {
            self.persist(|store| store.append_outcome_event(event))?;
            self.events.publish(GovernanceEvent::OutcomeDetected {
                event_id: event.event_id,
                metric_key: event.metric_key.clone(),
                event_type: format!("{:?}", event.event_type).to_lowercase(),
                severity: format!("{:?}", event.severity).to_lowercase(),
            });
        }

        if let Some(attribution) = attribution {
            for event in &events {
                let promoted = self.outcomes.process(event, attribution, &self.ledger)?;

                if let Some(record) = self.ledger.get(site_id, &attribution.action_category) {
                    self.persist(|store| store.persist_trust_record(&record))?;
                    self.events.publish(GovernanceEvent::TrustAdjusted {
                        website_id: site_id.to_string(),
                        category: attribution.action_category.clone(),
                        level: record.trust_level as u8,
                        success: matches!(event.event_type, OutcomeType::Improvement),
                    });
                }

                if let Some(entry) = promoted {
                    self.persist(|store| store.persist_knowledge_entry(&entry))?;
                    self.events.publish(GovernanceEvent::KnowledgePromoted {
                        entry_id: entry.entry_id,
                        confidence: entry.confidence,
                    });
                }
            }
        }
        Ok(events)
    }

    // ── Trust administration ───────────────────────────────────

    /// Explicit one-level upgrade for an eligible (website, category) pair.
    pub fn upgrade_trust(&self, website_id: &str, category: &str, actor: &str) -> Result<TrustLevel> {
        let level = self.ledger.upgrade(website_id, category, actor)?;
        self.persist_trust(website_id, category)?;
        Ok(level)
    }

    /// Manual override to an arbitrary trust level.
    pub fn override_trust(
        &self,
        website_id: &str,
        category: &str,
        level: TrustLevel,
        actor: &str,
    ) -> Result<()> {
        self.ledger.override_level(website_id, category, level, actor)?;
        self.persist_trust(website_id, category)
    }

    fn persist_trust(&self, website_id: &str, category: &str) -> Result<()> {
        if let Some(record) = self.ledger.get(website_id, category) {
            self.persist(|store| store.persist_trust_record(&record))?;
        }
        Ok(())
    }

    // ── Safety control plane ───────────────────────────────────

    pub fn activate_kill_switch(&self, reason: &str, triggered_by: &str) -> Result<()> {
        self.safety.activate_kill_switch(reason, triggered_by)?;
        self.persist_last_audit()?;
        self.events.publish(GovernanceEvent::KillSwitchActivated {
            triggered_by: triggered_by.to_string(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    pub fn deactivate_kill_switch(&self, triggered_by: &str) -> Result<()> {
        self.safety.deactivate_kill_switch(triggered_by)?;
        self.persist_last_audit()?;
        self.events.publish(GovernanceEvent::KillSwitchDeactivated {
            triggered_by: triggered_by.to_string(),
        });
        Ok(())
    }

    pub fn set_system_mode(&self, mode: SystemMode, triggered_by: &str) -> Result<()> {
        self.safety.set_system_mode(mode, triggered_by)?;
        self.persist_last_audit()?;
        self.events.publish(GovernanceEvent::SystemModeChanged {
            mode: format!("{mode:?}").to_lowercase(),
            triggered_by: triggered_by.to_string(),
        });
        Ok(())
    }

    pub fn disable_service(&self, service: &str, reason: &str, triggered_by: &str) -> Result<()> {
        self.safety.disable_service(service, reason, triggered_by)?;
        self.persist_last_audit()?;
        self.events.publish(GovernanceEvent::ServiceDisabled {
            service: service.to_string(),
            triggered_by: triggered_by.to_string(),
        });
        Ok(())
    }

    pub fn enable_service(&self, service: &str, triggered_by: &str) -> Result<()> {
        self.safety.enable_service(service, triggered_by)?;
        self.persist_last_audit()
    }

    pub fn pause_website(&self, website_id: &str, reason: &str, triggered_by: &str) -> Result<()> {
        self.safety.pause_website(website_id, reason, triggered_by)?;
        self.persist_last_audit()?;
        self.events.publish(GovernanceEvent::WebsitePaused {
            website_id: website_id.to_string(),
            triggered_by: triggered_by.to_string(),
        });
        Ok(())
    }

    pub fn resume_website(&self, website_id: &str, triggered_by: &str) -> Result<()> {
        self.safety.resume_website(website_id, triggered_by)?;
        self.persist_last_audit()
    }

    fn persist_last_audit(&self) -> Result<()> {
        let trail = self.safety.audit_trail();
        if let Some(entry) = trail.last() {
            self.persist(|store| store.append_safety_audit(entry))?;
        }
        Ok(())
    }

    // ── Status surfaces ────────────────────────────────────────

    pub fn system_status(&self) -> SystemStatus {
        let state = self.safety.state();
        let mut disabled_services: Vec<String> = state.disabled_services.into_iter().collect();
        disabled_services.sort();
        let mut paused_websites: Vec<String> = state.paused_websites.into_iter().collect();
        paused_websites.sort();

        SystemStatus {
            mode: state.mode,
            kill_switch_active: state.kill_switch.active,
            disabled_services,
            paused_websites,
            trust_records: self.ledger.all().len(),
            open_proposals: self.proposals.open_proposals().len(),
            held_job_locks: self.runner.locks().held_count(),
            knowledge_entries: self.outcomes.knowledge().all().len(),
            uptime_secs: (Utc::now() - self.started_at).num_seconds(),
        }
    }

    pub fn job_lock_status(&self, job_id: &str) -> JobLockStatus {
        self.runner.locks().status(job_id)
    }

    /// Sweep expired job leases, returning the recovered job ids.
    pub fn recover_expired_locks(&self) -> Vec<JobId> {
        self.runner.locks().recover_expired()
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    pub fn ledger(&self) -> &TrustLedger {
        &self.ledger
    }

    pub fn safety(&self) -> &SafetyControlPlane {
        &self.safety
    }

    pub fn proposals(&self) -> &ProposalManager {
        &self.proposals
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        self.outcomes.knowledge()
    }

    pub fn registry(&self) -> &RiskRegistry {
        &self.registry
    }

    // ── Internals ──────────────────────────────────────────────

    async fn lookup_active(&self, website_id: &str) -> Result<WebsiteRecord> {
        let site = self
            .directory
            .lookup(website_id)
            .await?
            .ok_or_else(|| WardenError::Validation {
                field: "website_id".into(),
                reason: format!("unknown website '{website_id}'"),
            })?;
        if site.status != WebsiteStatus::Active {
            return Err(WardenError::Validation {
                field: "website_id".into(),
                reason: format!("website '{website_id}' is not active"),
            });
        }
        Ok(site)
    }

    fn persist(&self, write: impl FnOnce(&WardenStore) -> Result<()>) -> Result<()> {
        match &self.store {
            Some(store) => write(store),
            None => Ok(()),
        }
    }
}
