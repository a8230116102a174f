//! # warden-plan
//!
//! The run plan scheduler: a batch of diagnostic service tasks forms a DAG,
//! validated for cycles up front and executed frontier-by-frontier with
//! per-service timeouts. Required services fail the plan; optional services
//! fail alone. A plan-level deadline degrades rather than fails a plan whose
//! required work finished in time.

pub mod execution;
pub mod plan;
pub mod runner;

pub use execution::{PlanStatus, RunPlanExecution, ServiceResult, ServiceStatus};
pub use plan::{RunPlan, ServiceTask};
pub use runner::{PlanRunner, ServiceExecutor};
