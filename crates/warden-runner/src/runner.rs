use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use warden_core::{Anomaly, Result, WardenError};
use warden_safety::{SafetyCheckRequest, SafetyControlPlane};

use crate::connector::Connector;
use crate::enrichment::{EnrichmentRegistry, EnrichmentStep};
use crate::locks::JobLockManager;
use crate::run::{ActionRun, ChangeRecord, Finding, RunOutput, RunStatus};

/// Executes an approved or auto-eligible action against one website.
///
/// Enrichment steps run sequentially and tolerate individual failures; only
/// an error escaping the whole execution marks the run failed. The safety
/// control plane is consulted immediately before each implementation step —
/// never during enrichment, so diagnostics keep flowing in maintenance mode.
pub struct ActionRunner {
    registry: Arc<EnrichmentRegistry>,
    connector: Arc<dyn Connector>,
    safety: SafetyControlPlane,
    locks: JobLockManager,
}

impl ActionRunner {
    pub fn new(
        registry: Arc<EnrichmentRegistry>,
        connector: Arc<dyn Connector>,
        safety: SafetyControlPlane,
        locks: JobLockManager,
    ) -> Self {
        Self {
            registry,
            connector,
            safety,
            locks,
        }
    }

    pub fn locks(&self) -> &JobLockManager {
        &self.locks
    }

    /// Run one action for one anomaly. Returns the terminal [`ActionRun`];
    /// the only hard error is a refused job lease.
    pub async fn run_action(
        &self,
        website_id: &str,
        base_url: &str,
        anomaly: &Anomaly,
        action_code: &str,
    ) -> Result<ActionRun> {
        let run_id = Uuid::new_v4();
        self.locks.acquire(&anomaly.anomaly_id, &run_id.to_string())?;

        let plan = self.registry.plan_for(action_code, anomaly);
        let mut run = ActionRun {
            run_id,
            anomaly_id: anomaly.anomaly_id.clone(),
            website_id: website_id.to_string(),
            action_code: action_code.to_string(),
            status: RunStatus::Running,
            plan: plan.clone(),
            output: RunOutput::default(),
            started_at: Utc::now(),
            completed_at: None,
            error_text: None,
        };
        info!(run_id = %run_id, action = action_code, anomaly = %anomaly.anomaly_id, "action run started");

        match self
            .execute_enrichment(&plan, website_id, base_url, anomaly)
            .await
        {
            Ok(findings) => {
                let next_steps = derive_next_steps(&findings, anomaly);
                let changes = self.authorize_changes(website_id, &findings);
                let errors = findings.iter().filter(|f| f.is_error()).count();
                let summary = format!(
                    "Ran {} enrichment steps for anomaly '{}' on {} ({} succeeded, {} failed); {} follow-ups identified",
                    findings.len(),
                    anomaly.anomaly_id,
                    website_id,
                    findings.len() - errors,
                    errors,
                    next_steps.len()
                );
                run.output = RunOutput {
                    findings,
                    changes,
                    next_steps,
                    summary,
                };
                run.status = RunStatus::Completed;
                run.completed_at = Some(Utc::now());
                info!(run_id = %run_id, "action run completed");
            }
            Err(e) => {
                run.status = RunStatus::Failed;
                run.error_text = Some(e.to_string());
                run.completed_at = Some(Utc::now());
                warn!(run_id = %run_id, error = %e, "action run failed");
            }
        }

        self.locks.release(&anomaly.anomaly_id, &run_id.to_string());
        Ok(run)
    }

    /// Execute every step in order. A failing step becomes a findings entry
    /// with an error summary and execution continues.
    async fn execute_enrichment(
        &self,
        plan: &[EnrichmentStep],
        website_id: &str,
        base_url: &str,
        anomaly: &Anomaly,
    ) -> Result<Vec<Finding>> {
        if plan.is_empty() {
            return Err(WardenError::Validation {
                field: "plan".into(),
                reason: "enrichment plan is empty".into(),
            });
        }

        let mut findings = Vec::with_capacity(plan.len());
        for step in plan {
            let finding = match self.execute_step(step, website_id, base_url, anomaly).await {
                Ok((summary, data)) => Finding {
                    step: step.key.clone(),
                    summary,
                    data,
                    error: None,
                },
                Err(e) => {
                    warn!(step = %step.key, error = %e, "enrichment step failed, continuing");
                    Finding {
                        step: step.key.clone(),
                        summary: format!("{} failed", step.description),
                        data: None,
                        error: Some(e),
                    }
                }
            };
            findings.push(finding);
        }
        Ok(findings)
    }

    async fn execute_step(
        &self,
        step: &EnrichmentStep,
        website_id: &str,
        base_url: &str,
        anomaly: &Anomaly,
    ) -> std::result::Result<(String, Option<serde_json::Value>), String> {
        match step.key.as_str() {
            "fetch_top_pages" => {
                let pages = self.connector.fetch_page_metadata(base_url, 25).await?;
                let missing_meta = pages
                    .iter()
                    .filter(|p| p.meta_description.is_none())
                    .count();
                let missing_title = pages.iter().filter(|p| p.title.is_none()).count();
                Ok((
                    format!(
                        "Fetched {} pages; {} missing meta descriptions, {} missing titles",
                        pages.len(),
                        missing_meta,
                        missing_title
                    ),
                    Some(serde_json::json!({
                        "pages": pages.len(),
                        "missing_meta": missing_meta,
                        "missing_title": missing_title,
                    })),
                ))
            }
            "check_indexing" => {
                let signals = self.connector.fetch_indexing_signals(base_url).await?;
                Ok((
                    format!(
                        "{} pages indexed; noindex detected: {}; {} blocked by robots",
                        signals.indexed_pages, signals.noindex_detected, signals.blocked_by_robots
                    ),
                    Some(serde_json::to_value(&signals).map_err(|e| e.to_string())?),
                ))
            }
            "check_sitemap" => {
                let check = self.connector.check_sitemap(base_url).await?;
                Ok((
                    if check.reachable {
                        format!("Sitemap reachable with {} urls", check.url_count)
                    } else {
                        "Sitemap is not reachable".to_string()
                    },
                    Some(serde_json::to_value(&check).map_err(|e| e.to_string())?),
                ))
            }
            "fetch_gsc_queries" => {
                let history = self
                    .connector
                    .fetch_query_history(website_id, &anomaly.metric_key, &anomaly.window)
                    .await?;
                let first = history.first().map_or(0, |d| d.clicks);
                let last = history.last().map_or(0, |d| d.clicks);
                Ok((
                    format!(
                        "Pulled {} days of query history; clicks moved {} -> {}",
                        history.len(),
                        first,
                        last
                    ),
                    Some(serde_json::json!({
                        "days": history.len(),
                        "first_clicks": first,
                        "last_clicks": last,
                    })),
                ))
            }
            other => Err(format!("no executor for enrichment step '{other}'")),
        }
    }

    /// Turn the findings into implementation intents, taking the safety
    /// verdict synchronously immediately before each would-be step. Once a
    /// step is authorized there is no mid-flight interruption.
    fn authorize_changes(&self, website_id: &str, findings: &[Finding]) -> Vec<ChangeRecord> {
        let mut changes = Vec::new();
        for intent in derive_change_intents(findings) {
            let verdict = self.safety.perform_safety_check(&SafetyCheckRequest {
                service_name: None,
                website_id: Some(website_id.to_string()),
                requires_changes: true,
            });
            if verdict.passed {
                changes.push(ChangeRecord {
                    description: intent,
                    authorized: true,
                    denial_reason: None,
                });
            } else {
                let reason = verdict.failures.join("; ");
                info!(website = website_id, reason = %reason, "implementation step denied by safety check");
                changes.push(ChangeRecord {
                    description: intent,
                    authorized: false,
                    denial_reason: Some(reason),
                });
            }
        }
        changes
    }
}

/// Which implementation steps the findings justify.
fn derive_change_intents(findings: &[Finding]) -> Vec<String> {
    let mut intents = Vec::new();
    for finding in findings {
        let Some(data) = &finding.data else { continue };
        match finding.step.as_str() {
            "fetch_top_pages" => {
                let missing = data["missing_meta"].as_u64().unwrap_or(0);
                if missing > 0 {
                    intents.push(format!("Add meta descriptions to {missing} pages"));
                }
            }
            "check_indexing" => {
                if data["noindex_detected"].as_bool().unwrap_or(false) {
                    intents.push("Remove stray noindex directives".to_string());
                }
            }
            "check_sitemap" => {
                if !data["reachable"].as_bool().unwrap_or(true) {
                    intents.push("Regenerate and resubmit the sitemap".to_string());
                }
            }
            _ => {}
        }
    }
    intents
}

/// Rule-based follow-ups from whichever findings fired. Always non-empty:
/// a run with nothing actionable still recommends monitoring.
fn derive_next_steps(findings: &[Finding], anomaly: &Anomaly) -> Vec<String> {
    let mut steps = Vec::new();
    for finding in findings {
        let Some(data) = &finding.data else { continue };
        match finding.step.as_str() {
            "fetch_top_pages" => {
                let missing = data["missing_meta"].as_u64().unwrap_or(0);
                if missing > 0 {
                    steps.push(format!("Add meta descriptions to {missing} pages"));
                }
            }
            "check_indexing" => {
                if data["noindex_detected"].as_bool().unwrap_or(false) {
                    steps.push("Urgent: remove noindex directives blocking indexing".to_string());
                }
                if data["blocked_by_robots"].as_u64().unwrap_or(0) > 0 {
                    steps.push("Review robots.txt rules blocking crawlable pages".to_string());
                }
            }
            "check_sitemap" => {
                if !data["reachable"].as_bool().unwrap_or(true) {
                    steps.push("Restore sitemap availability and resubmit it".to_string());
                }
            }
            "fetch_gsc_queries" => {
                let first = data["first_clicks"].as_u64().unwrap_or(0);
                let last = data["last_clicks"].as_u64().unwrap_or(0);
                if last < first {
                    steps.push("Review top losing queries for ranking drops".to_string());
                }
            }
            _ => {}
        }
    }
    if steps.is_empty() {
        steps.push(format!(
            "No automated fix identified; keep monitoring '{}'",
            anomaly.metric_key
        ));
    }
    steps
}
