use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use warden_core::{Result, ServiceKey, WardenError};

/// One diagnostic service task inside a run plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTask {
    pub service: ServiceKey,
    /// Services that must complete before this one may start.
    #[serde(default)]
    pub depends_on: Vec<ServiceKey>,
    /// A required task failing or timing out fails the whole plan.
    pub required: bool,
    pub timeout_ms: u64,
}

/// A dependency-ordered batch of diagnostic tasks. Static per template;
/// instantiated fresh per execution as a
/// [`crate::execution::RunPlanExecution`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlan {
    pub plan_id: Uuid,
    pub name: String,
    pub services: Vec<ServiceTask>,
    /// Wall-clock ceiling for the whole execution.
    pub max_run_duration_ms: u64,
}

impl RunPlan {
    pub fn new(name: impl Into<String>, services: Vec<ServiceTask>, max_run_duration_ms: u64) -> Self {
        Self {
            plan_id: Uuid::new_v4(),
            name: name.into(),
            services,
            max_run_duration_ms,
        }
    }

    /// Reject duplicate ids, unknown dependencies, and cycles before any
    /// execution is attempted. Cycle detection is a depth-first traversal
    /// with an explicit recursion stack.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for task in &self.services {
            if !ids.insert(task.service.as_str()) {
                return Err(WardenError::PlanInvalid(format!(
                    "duplicate service id '{}'",
                    task.service
                )));
            }
        }

        let adjacency: HashMap<&str, &Vec<ServiceKey>> = self
            .services
            .iter()
            .map(|t| (t.service.as_str(), &t.depends_on))
            .collect();

        for task in &self.services {
            for dep in &task.depends_on {
                if !adjacency.contains_key(dep.as_str()) {
                    return Err(WardenError::PlanInvalid(format!(
                        "service '{}' depends on unknown service '{}'",
                        task.service, dep
                    )));
                }
            }
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut in_stack: HashSet<&str> = HashSet::new();
        for task in &self.services {
            if Self::has_cycle(task.service.as_str(), &adjacency, &mut visited, &mut in_stack) {
                return Err(WardenError::PlanInvalid(format!(
                    "dependency cycle involving service '{}'",
                    task.service
                )));
            }
        }
        Ok(())
    }

    fn has_cycle<'a>(
        node: &'a str,
        adjacency: &HashMap<&'a str, &'a Vec<ServiceKey>>,
        visited: &mut HashSet<&'a str>,
        in_stack: &mut HashSet<&'a str>,
    ) -> bool {
        if in_stack.contains(node) {
            return true;
        }
        if visited.contains(node) {
            return false;
        }
        visited.insert(node);
        in_stack.insert(node);
        if let Some(deps) = adjacency.get(node) {
            for dep in deps.iter() {
                if Self::has_cycle(dep.as_str(), adjacency, visited, in_stack) {
                    return true;
                }
            }
        }
        in_stack.remove(node);
        false
    }

    pub fn get(&self, service: &str) -> Option<&ServiceTask> {
        self.services.iter().find(|t| t.service == service)
    }

    // ── Built-in plan templates ────────────────────────────────

    /// The full diagnostic sweep run for a detected anomaly.
    pub fn standard(timeout_ms: u64, max_run_duration_ms: u64) -> Self {
        Self::new(
            "standard",
            vec![
                ServiceTask {
                    service: "crawl_health".into(),
                    depends_on: vec![],
                    required: true,
                    timeout_ms,
                },
                ServiceTask {
                    service: "gsc_snapshot".into(),
                    depends_on: vec![],
                    required: true,
                    timeout_ms,
                },
                ServiceTask {
                    service: "indexing_signals".into(),
                    depends_on: vec!["gsc_snapshot".into()],
                    required: true,
                    timeout_ms,
                },
                ServiceTask {
                    service: "sitemap_audit".into(),
                    depends_on: vec!["crawl_health".into()],
                    required: false,
                    timeout_ms,
                },
                ServiceTask {
                    service: "core_web_vitals".into(),
                    depends_on: vec!["crawl_health".into()],
                    required: false,
                    timeout_ms,
                },
                ServiceTask {
                    service: "backlink_profile".into(),
                    depends_on: vec![],
                    required: false,
                    timeout_ms,
                },
            ],
            max_run_duration_ms,
        )
    }

    /// A trimmed sweep for frequent re-checks.
    pub fn quick(timeout_ms: u64, max_run_duration_ms: u64) -> Self {
        Self::new(
            "quick",
            vec![
                ServiceTask {
                    service: "gsc_snapshot".into(),
                    depends_on: vec![],
                    required: true,
                    timeout_ms,
                },
                ServiceTask {
                    service: "indexing_signals".into(),
                    depends_on: vec!["gsc_snapshot".into()],
                    required: false,
                    timeout_ms,
                },
            ],
            max_run_duration_ms,
        )
    }

    /// First contact with a newly managed website.
    pub fn onboarding(timeout_ms: u64, max_run_duration_ms: u64) -> Self {
        Self::new(
            "onboarding",
            vec![
                ServiceTask {
                    service: "crawl_health".into(),
                    depends_on: vec![],
                    required: true,
                    timeout_ms,
                },
                ServiceTask {
                    service: "sitemap_audit".into(),
                    depends_on: vec!["crawl_health".into()],
                    required: true,
                    timeout_ms,
                },
                ServiceTask {
                    service: "gsc_snapshot".into(),
                    depends_on: vec![],
                    required: false,
                    timeout_ms,
                },
                ServiceTask {
                    service: "baseline_metrics".into(),
                    depends_on: vec!["crawl_health".into(), "gsc_snapshot".into()],
                    required: false,
                    timeout_ms,
                },
            ],
            max_run_duration_ms,
        )
    }
}
