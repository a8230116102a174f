use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use warden_core::{Result, ServiceKey};

use crate::execution::{PlanStatus, RunPlanExecution, ServiceResult, ServiceStatus};
use crate::plan::RunPlan;

/// Anything that can run one diagnostic service and return its findings.
/// Errors are strings, not [`warden_core::WardenError`]: a service failure is
/// data for the plan, not an exception for the caller.
#[async_trait]
pub trait ServiceExecutor: Send + Sync {
    async fn run_service(&self, service: &str) -> std::result::Result<serde_json::Value, String>;
}

enum TaskOutcome {
    Output(serde_json::Value),
    Error(String),
    TimedOut,
}

/// Executes a validated [`RunPlan`]: repeatedly computes the ready frontier
/// and dispatches every ready service concurrently, each under its own
/// timeout.
pub struct PlanRunner;

impl PlanRunner {
    pub async fn execute(
        plan: &RunPlan,
        executor: Arc<dyn ServiceExecutor>,
    ) -> Result<RunPlanExecution> {
        plan.validate()?;

        let started_at = Utc::now();
        let deadline = Instant::now() + Duration::from_millis(plan.max_run_duration_ms);

        let mut results: HashMap<ServiceKey, ServiceResult> = HashMap::new();
        let mut completed: HashSet<ServiceKey> = HashSet::new();
        // Failed, timed out, or skipped — anything a dependent cannot build on.
        let mut unsuccessful: HashSet<ServiceKey> = HashSet::new();
        let mut started: HashSet<ServiceKey> = HashSet::new();
        let mut plan_failed = false;
        let mut deadline_hit = false;

        let mut join_set: JoinSet<(ServiceKey, TaskOutcome, u64)> = JoinSet::new();

        loop {
            // Propagate skips: a service whose dependency did not complete
            // never starts, transitively.
            loop {
                let mut changed = false;
                for task in &plan.services {
                    if started.contains(&task.service) || results.contains_key(&task.service) {
                        continue;
                    }
                    if task.depends_on.iter().any(|d| unsuccessful.contains(d)) {
                        debug!(service = %task.service, "skipping service, dependency did not complete");
                        results.insert(
                            task.service.clone(),
                            ServiceResult {
                                service: task.service.clone(),
                                status: ServiceStatus::Skipped,
                                output: None,
                                error: Some("dependency did not complete".into()),
                                duration_ms: 0,
                            },
                        );
                        unsuccessful.insert(task.service.clone());
                        if task.required {
                            plan_failed = true;
                        }
                        changed = true;
                    }
                }
                if !changed {
                    break;
                }
            }

            if plan_failed || deadline_hit {
                // Nothing new starts once the plan is lost or out of time;
                // whatever never started is recorded as skipped.
                for task in &plan.services {
                    if started.contains(&task.service) || results.contains_key(&task.service) {
                        continue;
                    }
                    results.insert(
                        task.service.clone(),
                        ServiceResult {
                            service: task.service.clone(),
                            status: ServiceStatus::Skipped,
                            output: None,
                            error: Some("plan stopped before this service started".into()),
                            duration_ms: 0,
                        },
                    );
                    unsuccessful.insert(task.service.clone());
                    if task.required {
                        plan_failed = true;
                    }
                }
            } else {
                // Dispatch the ready frontier.
                for task in &plan.services {
                    if started.contains(&task.service) || results.contains_key(&task.service) {
                        continue;
                    }
                    if task.depends_on.iter().all(|d| completed.contains(d)) {
                        started.insert(task.service.clone());
                        let service = task.service.clone();
                        let timeout = Duration::from_millis(task.timeout_ms);
                        let executor = Arc::clone(&executor);
                        debug!(service = %service, timeout_ms = task.timeout_ms, "dispatching service");
                        join_set.spawn(async move {
                            let begun = Instant::now();
                            let outcome = match tokio::time::timeout(
                                timeout,
                                executor.run_service(&service),
                            )
                            .await
                            {
                                Ok(Ok(value)) => TaskOutcome::Output(value),
                                Ok(Err(e)) => TaskOutcome::Error(e),
                                Err(_) => TaskOutcome::TimedOut,
                            };
                            (service, outcome, begun.elapsed().as_millis() as u64)
                        });
                    }
                }
            }

            if join_set.is_empty() {
                break;
            }

            // Wait for the next service to finish, bounded by the plan deadline.
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, join_set.join_next()).await {
                Ok(Some(Ok((service, outcome, duration_ms)))) => {
                    let required = plan.get(&service).is_some_and(|t| t.required);
                    let result = match outcome {
                        TaskOutcome::Output(value) => {
                            completed.insert(service.clone());
                            ServiceResult {
                                service: service.clone(),
                                status: ServiceStatus::Completed,
                                output: Some(value),
                                error: None,
                                duration_ms,
                            }
                        }
                        TaskOutcome::Error(e) => {
                            warn!(service = %service, error = %e, required, "service failed");
                            unsuccessful.insert(service.clone());
                            if required {
                                plan_failed = true;
                            }
                            ServiceResult {
                                service: service.clone(),
                                status: ServiceStatus::Failed,
                                output: None,
                                error: Some(e),
                                duration_ms,
                            }
                        }
                        TaskOutcome::TimedOut => {
                            warn!(service = %service, required, "service timed out");
                            unsuccessful.insert(service.clone());
                            if required {
                                plan_failed = true;
                            }
                            ServiceResult {
                                service: service.clone(),
                                status: ServiceStatus::TimedOut,
                                output: None,
                                error: Some("service timed out".into()),
                                duration_ms,
                            }
                        }
                    };
                    results.insert(service, result);
                }
                Ok(Some(Err(join_err))) => {
                    // A service task panicked; the name surfaces in the
                    // started-without-result sweep below.
                    warn!(error = %join_err, "service task aborted abnormally");
                }
                Ok(None) => {}
                Err(_) => {
                    // Plan deadline exceeded: abort whatever is still running.
                    deadline_hit = true;
                    warn!(plan = %plan.name, "plan deadline exceeded, aborting in-flight services");
                    join_set.abort_all();
                    while let Some(res) = join_set.join_next().await {
                        if let Ok((service, outcome, duration_ms)) = res {
                            // Finished right at the wire; record it faithfully.
                            let result = match outcome {
                                TaskOutcome::Output(value) => {
                                    completed.insert(service.clone());
                                    ServiceResult {
                                        service: service.clone(),
                                        status: ServiceStatus::Completed,
                                        output: Some(value),
                                        error: None,
                                        duration_ms,
                                    }
                                }
                                TaskOutcome::Error(e) => {
                                    unsuccessful.insert(service.clone());
                                    ServiceResult {
                                        service: service.clone(),
                                        status: ServiceStatus::Failed,
                                        output: None,
                                        error: Some(e),
                                        duration_ms,
                                    }
                                }
                                TaskOutcome::TimedOut => {
                                    unsuccessful.insert(service.clone());
                                    ServiceResult {
                                        service: service.clone(),
                                        status: ServiceStatus::TimedOut,
                                        output: None,
                                        error: Some("service timed out".into()),
                                        duration_ms,
                                    }
                                }
                            };
                            results.insert(service, result);
                        }
                    }
                    // Anything started but unfinished was cut off by the deadline.
                    for task in &plan.services {
                        if started.contains(&task.service) && !results.contains_key(&task.service) {
                            unsuccessful.insert(task.service.clone());
                            if task.required {
                                plan_failed = true;
                            }
                            results.insert(
                                task.service.clone(),
                                ServiceResult {
                                    service: task.service.clone(),
                                    status: ServiceStatus::TimedOut,
                                    output: None,
                                    error: Some("plan deadline exceeded".into()),
                                    duration_ms: plan.max_run_duration_ms,
                                },
                            );
                        }
                    }
                }
            }
        }

        // A started task that panicked leaves no result; record the gap.
        for task in &plan.services {
            if !results.contains_key(&task.service) {
                if task.required {
                    plan_failed = true;
                }
                results.insert(
                    task.service.clone(),
                    ServiceResult {
                        service: task.service.clone(),
                        status: ServiceStatus::Failed,
                        output: None,
                        error: Some("service task ended without a result".into()),
                        duration_ms: 0,
                    },
                );
            }
        }

        let all_completed = plan
            .services
            .iter()
            .all(|t| completed.contains(&t.service));
        let status = if plan_failed {
            PlanStatus::Failed
        } else if all_completed {
            PlanStatus::Completed
        } else {
            PlanStatus::Degraded
        };

        info!(
            plan = %plan.name,
            ?status,
            services = plan.services.len(),
            completed = completed.len(),
            "plan execution finished"
        );

        Ok(RunPlanExecution {
            execution_id: Uuid::new_v4(),
            plan_id: plan.plan_id,
            plan_name: plan.name.clone(),
            status,
            results,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
