use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_core::{ActionCode, JobId, WebsiteId};

use crate::enrichment::EnrichmentStep;

/// Lifecycle of an action run: `Running -> Completed | Failed`, terminal
/// after that. Individual step errors do NOT fail a run — only an error
/// escaping the whole execution does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// One enrichment step's recorded outcome. A failed step carries its error
/// summary here instead of aborting the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub step: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Finding {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A change the run wants made to the site, with the safety verdict that was
/// taken immediately before it would execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub description: String,
    /// False when the safety control plane denied the implementation step.
    pub authorized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<String>,
}

/// What an action run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOutput {
    pub findings: Vec<Finding>,
    pub changes: Vec<ChangeRecord>,
    pub next_steps: Vec<String>,
    pub summary: String,
}

/// The audit record of one action execution. Created `Running`, mutated
/// exactly once at completion, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRun {
    pub run_id: Uuid,
    pub anomaly_id: JobId,
    pub website_id: WebsiteId,
    pub action_code: ActionCode,
    pub status: RunStatus,
    pub plan: Vec<EnrichmentStep>,
    pub output: RunOutput,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
}
