use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use warden_core::ServiceKey;

/// Terminal status of a whole plan execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Every service that was supposed to run completed.
    Completed,
    /// All required services completed, but optional work was lost to a
    /// failure or the plan deadline.
    Degraded,
    /// A required service failed, timed out, or never got to run.
    Failed,
}

/// Terminal status of one service within an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Completed,
    Failed,
    TimedOut,
    /// Never started: a dependency failed, or the plan stopped first.
    Skipped,
}

/// The recorded outcome of one service task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResult {
    pub service: ServiceKey,
    pub status: ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// One execution of a [`crate::RunPlan`], tracking what each service did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlanExecution {
    pub execution_id: Uuid,
    pub plan_id: Uuid,
    pub plan_name: String,
    pub status: PlanStatus,
    pub results: HashMap<ServiceKey, ServiceResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunPlanExecution {
    pub fn result(&self, service: &str) -> Option<&ServiceResult> {
        self.results.get(service)
    }

    pub fn completed_services(&self) -> Vec<&ServiceKey> {
        self.results
            .iter()
            .filter(|(_, r)| r.status == ServiceStatus::Completed)
            .map(|(k, _)| k)
            .collect()
    }
}
