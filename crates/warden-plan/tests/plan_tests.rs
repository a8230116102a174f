#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use warden_plan::{
        PlanRunner, PlanStatus, RunPlan, ServiceExecutor, ServiceStatus, ServiceTask,
    };

    #[derive(Clone)]
    enum Behavior {
        Ok,
        Fail(&'static str),
        SleepMs(u64),
    }

    /// Scripted executor: each service behaves as configured and every
    /// invocation is recorded.
    struct MockExecutor {
        behaviors: HashMap<String, Behavior>,
        calls: Mutex<Vec<String>>,
    }

    impl MockExecutor {
        fn new(behaviors: &[(&str, Behavior)]) -> Arc<Self> {
            Arc::new(Self {
                behaviors: behaviors
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn called(&self, service: &str) -> bool {
            self.calls.lock().iter().any(|c| c == service)
        }
    }

    #[async_trait]
    impl ServiceExecutor for MockExecutor {
        async fn run_service(&self, service: &str) -> Result<serde_json::Value, String> {
            self.calls.lock().push(service.to_string());
            match self.behaviors.get(service).unwrap_or(&Behavior::Ok) {
                Behavior::Ok => Ok(serde_json::json!({ "service": service })),
                Behavior::Fail(msg) => Err((*msg).to_string()),
                Behavior::SleepMs(ms) => {
                    tokio::time::sleep(std::time::Duration::from_millis(*ms)).await;
                    Ok(serde_json::json!({ "service": service }))
                }
            }
        }
    }

    fn task(service: &str, deps: &[&str], required: bool, timeout_ms: u64) -> ServiceTask {
        ServiceTask {
            service: service.into(),
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            required,
            timeout_ms,
        }
    }

    // ── Validation ─────────────────────────────────────────────

    mod validation {
        use super::*;

        #[test]
        fn test_cycle_rejected() {
            let plan = RunPlan::new(
                "cyclic",
                vec![
                    task("a", &["b"], true, 1000),
                    task("b", &["a"], true, 1000),
                ],
                10_000,
            );
            assert!(plan.validate().is_err());
        }

        #[test]
        fn test_self_cycle_rejected() {
            let plan = RunPlan::new("selfish", vec![task("a", &["a"], true, 1000)], 10_000);
            assert!(plan.validate().is_err());
        }

        #[test]
        fn test_unknown_dependency_rejected() {
            let plan = RunPlan::new("dangling", vec![task("a", &["ghost"], true, 1000)], 10_000);
            assert!(plan.validate().is_err());
        }

        #[test]
        fn test_duplicate_service_rejected() {
            let plan = RunPlan::new(
                "dupes",
                vec![task("a", &[], true, 1000), task("a", &[], false, 1000)],
                10_000,
            );
            assert!(plan.validate().is_err());
        }

        #[test]
        fn test_builtin_templates_are_valid() {
            RunPlan::standard(5000, 60_000).validate().unwrap();
            RunPlan::quick(5000, 60_000).validate().unwrap();
            RunPlan::onboarding(5000, 60_000).validate().unwrap();
        }

        #[tokio::test]
        async fn test_cyclic_plan_never_executes() {
            let plan = RunPlan::new(
                "cyclic",
                vec![
                    task("a", &["b"], true, 1000),
                    task("b", &["a"], true, 1000),
                ],
                10_000,
            );
            let executor = MockExecutor::new(&[]);
            let result = PlanRunner::execute(&plan, executor.clone()).await;
            assert!(result.is_err());
            assert!(executor.calls.lock().is_empty());
        }
    }

    // ── Execution ──────────────────────────────────────────────

    mod execution {
        use super::*;

        #[tokio::test]
        async fn test_linear_chain_completes() {
            let plan = RunPlan::new(
                "chain",
                vec![
                    task("a", &[], true, 1000),
                    task("b", &["a"], true, 1000),
                    task("c", &["b"], true, 1000),
                ],
                10_000,
            );
            let executor = MockExecutor::new(&[]);
            let execution = PlanRunner::execute(&plan, executor.clone()).await.unwrap();
            assert_eq!(execution.status, PlanStatus::Completed);
            let calls = executor.calls.lock().clone();
            assert_eq!(calls, vec!["a", "b", "c"]);
        }

        #[tokio::test]
        async fn test_independent_services_all_run() {
            let plan = RunPlan::new(
                "fanout",
                vec![
                    task("a", &[], true, 1000),
                    task("b", &[], true, 1000),
                    task("c", &[], false, 1000),
                ],
                10_000,
            );
            let executor = MockExecutor::new(&[]);
            let execution = PlanRunner::execute(&plan, executor.clone()).await.unwrap();
            assert_eq!(execution.status, PlanStatus::Completed);
            assert_eq!(execution.completed_services().len(), 3);
        }

        #[tokio::test]
        async fn test_optional_failure_skips_dependent_only() {
            // y fails (optional); x depends on y; z is independent
            let plan = RunPlan::new(
                "partial",
                vec![
                    task("y", &[], false, 1000),
                    task("x", &["y"], false, 1000),
                    task("z", &[], true, 1000),
                ],
                10_000,
            );
            let executor = MockExecutor::new(&[("y", Behavior::Fail("connector exploded"))]);
            let execution = PlanRunner::execute(&plan, executor.clone()).await.unwrap();

            assert_eq!(execution.result("y").unwrap().status, ServiceStatus::Failed);
            assert_eq!(execution.result("x").unwrap().status, ServiceStatus::Skipped);
            assert!(!executor.called("x"), "x must never start");
            assert_eq!(execution.result("z").unwrap().status, ServiceStatus::Completed);
            // Required work finished; optional work was lost
            assert_eq!(execution.status, PlanStatus::Degraded);
        }

        #[tokio::test]
        async fn test_required_failure_fails_plan() {
            let plan = RunPlan::new(
                "hard_fail",
                vec![
                    task("y", &[], true, 1000),
                    task("x", &["y"], false, 1000),
                ],
                10_000,
            );
            let executor = MockExecutor::new(&[("y", Behavior::Fail("no auth"))]);
            let execution = PlanRunner::execute(&plan, executor.clone()).await.unwrap();
            assert_eq!(execution.status, PlanStatus::Failed);
            assert_eq!(execution.result("x").unwrap().status, ServiceStatus::Skipped);
            assert!(!executor.called("x"));
        }

        #[tokio::test]
        async fn test_required_timeout_fails_plan() {
            let plan = RunPlan::new(
                "slow_required",
                vec![task("slow", &[], true, 20)],
                10_000,
            );
            let executor = MockExecutor::new(&[("slow", Behavior::SleepMs(200))]);
            let execution = PlanRunner::execute(&plan, executor).await.unwrap();
            assert_eq!(execution.status, PlanStatus::Failed);
            assert_eq!(
                execution.result("slow").unwrap().status,
                ServiceStatus::TimedOut
            );
        }

        #[tokio::test]
        async fn test_optional_timeout_degrades_plan() {
            let plan = RunPlan::new(
                "slow_optional",
                vec![
                    task("fast", &[], true, 1000),
                    task("slow", &[], false, 20),
                ],
                10_000,
            );
            let executor = MockExecutor::new(&[("slow", Behavior::SleepMs(200))]);
            let execution = PlanRunner::execute(&plan, executor).await.unwrap();
            assert_eq!(execution.status, PlanStatus::Degraded);
            assert_eq!(
                execution.result("fast").unwrap().status,
                ServiceStatus::Completed
            );
        }

        #[tokio::test]
        async fn test_plan_deadline_aborts_optionals_and_degrades() {
            // Required finishes instantly; optional would run far past the
            // plan ceiling but has a generous per-service timeout.
            let plan = RunPlan::new(
                "deadline",
                vec![
                    task("required_fast", &[], true, 1000),
                    task("optional_slow", &[], false, 5000),
                ],
                60,
            );
            let executor = MockExecutor::new(&[("optional_slow", Behavior::SleepMs(2000))]);
            let execution = PlanRunner::execute(&plan, executor).await.unwrap();
            assert_eq!(execution.status, PlanStatus::Degraded);
            assert_eq!(
                execution.result("required_fast").unwrap().status,
                ServiceStatus::Completed
            );
            let slow = execution.result("optional_slow").unwrap();
            assert_eq!(slow.status, ServiceStatus::TimedOut);
            assert_eq!(slow.error.as_deref(), Some("plan deadline exceeded"));
        }

        #[tokio::test]
        async fn test_plan_deadline_with_unfinished_required_fails() {
            let plan = RunPlan::new(
                "deadline_required",
                vec![task("required_slow", &[], true, 5000)],
                60,
            );
            let executor = MockExecutor::new(&[("required_slow", Behavior::SleepMs(2000))]);
            let execution = PlanRunner::execute(&plan, executor).await.unwrap();
            assert_eq!(execution.status, PlanStatus::Failed);
        }

        #[tokio::test]
        async fn test_diamond_dependency_runs_once_each() {
            let plan = RunPlan::new(
                "diamond",
                vec![
                    task("root", &[], true, 1000),
                    task("left", &["root"], true, 1000),
                    task("right", &["root"], true, 1000),
                    task("join", &["left", "right"], true, 1000),
                ],
                10_000,
            );
            let executor = MockExecutor::new(&[]);
            let execution = PlanRunner::execute(&plan, executor.clone()).await.unwrap();
            assert_eq!(execution.status, PlanStatus::Completed);
            let calls = executor.calls.lock().clone();
            assert_eq!(calls.len(), 4);
            assert_eq!(calls[0], "root");
            assert_eq!(calls[3], "join");
        }
    }
}
