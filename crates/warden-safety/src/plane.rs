use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use warden_config::schema::SafetyConfig;
use warden_core::{Result, WardenError};

use crate::audit::SafetyAuditEntry;
use crate::state::{SafetyCheckRequest, SafetyCheckResult, SafetyState, SystemMode};

struct Inner {
    state: SafetyState,
    audit: Vec<SafetyAuditEntry>,
    next_seq: u64,
}

/// Coordinator owning the safety state. Cheap to clone; all clones share the
/// same state, so a kill switch flipped anywhere is seen everywhere.
#[derive(Clone)]
pub struct SafetyControlPlane {
    inner: Arc<RwLock<Inner>>,
    config: SafetyConfig,
}

impl SafetyControlPlane {
    pub fn new(config: SafetyConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                state: SafetyState::default(),
                audit: Vec::new(),
                next_seq: 1,
            })),
            config,
        }
    }

    // ── Mutators (all audited) ─────────────────────────────────

    pub fn activate_kill_switch(&self, reason: &str, triggered_by: &str) -> Result<()> {
        self.require_reason(reason)?;
        self.require_actor(triggered_by)?;
        let mut inner = self.inner.write();
        inner.state.kill_switch.active = true;
        inner.state.kill_switch.reason = Some(reason.to_string());
        inner.state.kill_switch.triggered_by = Some(triggered_by.to_string());
        inner.state.kill_switch.activated_at = Some(Utc::now());
        Self::append_audit(&mut inner, &self.config, triggered_by, "activate_kill_switch", reason);
        warn!(triggered_by, reason, "kill switch ACTIVATED — all automated execution halted");
        Ok(())
    }

    pub fn deactivate_kill_switch(&self, triggered_by: &str) -> Result<()> {
        self.require_actor(triggered_by)?;
        let mut inner = self.inner.write();
        inner.state.kill_switch.active = false;
        inner.state.kill_switch.reason = None;
        inner.state.kill_switch.triggered_by = None;
        inner.state.kill_switch.activated_at = None;
        Self::append_audit(&mut inner, &self.config, triggered_by, "deactivate_kill_switch", "");
        info!(triggered_by, "kill switch deactivated");
        Ok(())
    }

    pub fn set_system_mode(&self, mode: SystemMode, triggered_by: &str) -> Result<()> {
        self.require_actor(triggered_by)?;
        let mut inner = self.inner.write();
        inner.state.mode = mode;
        Self::append_audit(
            &mut inner,
            &self.config,
            triggered_by,
            "set_system_mode",
            &format!("{mode:?}"),
        );
        info!(triggered_by, ?mode, "system mode changed");
        Ok(())
    }

    pub fn disable_service(&self, service: &str, reason: &str, triggered_by: &str) -> Result<()> {
        self.require_reason(reason)?;
        self.require_actor(triggered_by)?;
        let mut inner = self.inner.write();
        inner.state.disabled_services.insert(service.to_string());
        Self::append_audit(
            &mut inner,
            &self.config,
            triggered_by,
            "disable_service",
            &format!("{service}: {reason}"),
        );
        warn!(service, triggered_by, reason, "service disabled");
        Ok(())
    }

    pub fn enable_service(&self, service: &str, triggered_by: &str) -> Result<()> {
        self.require_actor(triggered_by)?;
        let mut inner = self.inner.write();
        inner.state.disabled_services.remove(service);
        Self::append_audit(&mut inner, &self.config, triggered_by, "enable_service", service);
        info!(service, triggered_by, "service enabled");
        Ok(())
    }

    pub fn pause_website(&self, website_id: &str, reason: &str, triggered_by: &str) -> Result<()> {
        self.require_reason(reason)?;
        self.require_actor(triggered_by)?;
        let mut inner = self.inner.write();
        inner.state.paused_websites.insert(website_id.to_string());
        Self::append_audit(
            &mut inner,
            &self.config,
            triggered_by,
            "pause_website",
            &format!("{website_id}: {reason}"),
        );
        warn!(website = website_id, triggered_by, reason, "website paused");
        Ok(())
    }

    pub fn resume_website(&self, website_id: &str, triggered_by: &str) -> Result<()> {
        self.require_actor(triggered_by)?;
        let mut inner = self.inner.write();
        inner.state.paused_websites.remove(website_id);
        Self::append_audit(&mut inner, &self.config, triggered_by, "resume_website", website_id);
        info!(website = website_id, triggered_by, "website resumed");
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────

    /// Aggregate every interlock relevant to the request. Failures accumulate
    /// so the result names every reason at once.
    pub fn perform_safety_check(&self, request: &SafetyCheckRequest) -> SafetyCheckResult {
        let inner = self.inner.read();
        let mut failures = Vec::new();

        if inner.state.kill_switch.active {
            let reason = inner
                .state
                .kill_switch
                .reason
                .as_deref()
                .unwrap_or("no reason recorded");
            failures.push(format!("kill switch active: {reason}"));
        }

        if request.requires_changes && inner.state.mode != SystemMode::Normal {
            failures.push(format!(
                "system mode is {:?}; changes are blocked",
                inner.state.mode
            ));
        }

        if let Some(service) = &request.service_name {
            if inner.state.disabled_services.contains(service) {
                failures.push(format!("service '{service}' is disabled"));
            }
        }

        if let Some(website_id) = &request.website_id {
            if inner.state.paused_websites.contains(website_id) {
                failures.push(format!("website '{website_id}' is paused"));
            }
        }

        SafetyCheckResult {
            passed: failures.is_empty(),
            failures,
        }
    }

    pub fn state(&self) -> SafetyState {
        self.inner.read().state.clone()
    }

    pub fn kill_switch_active(&self) -> bool {
        self.inner.read().state.kill_switch.active
    }

    /// The audit trail, oldest first.
    pub fn audit_trail(&self) -> Vec<SafetyAuditEntry> {
        self.inner.read().audit.clone()
    }

    // ── Internals ──────────────────────────────────────────────

    fn require_reason(&self, reason: &str) -> Result<()> {
        if reason.trim().len() < self.config.min_reason_len {
            return Err(WardenError::Validation {
                field: "reason".into(),
                reason: format!(
                    "must be at least {} characters",
                    self.config.min_reason_len
                ),
            });
        }
        Ok(())
    }

    fn require_actor(&self, triggered_by: &str) -> Result<()> {
        if triggered_by.trim().is_empty() {
            return Err(WardenError::Validation {
                field: "triggered_by".into(),
                reason: "a human-attributable identity is required".into(),
            });
        }
        Ok(())
    }

    fn append_audit(
        inner: &mut Inner,
        config: &SafetyConfig,
        actor: &str,
        command: &str,
        detail: &str,
    ) {
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.audit.push(SafetyAuditEntry {
            seq,
            at: Utc::now(),
            actor: actor.to_string(),
            command: command.to_string(),
            detail: detail.to_string(),
        });
        // Bound memory; the persistent trail lives in the store.
        if inner.audit.len() > config.audit_retention {
            let excess = inner.audit.len() - config.audit_retention;
            inner.audit.drain(..excess);
        }
    }
}
