//! # warden-runner
//!
//! The action runner: given an anomaly and an action code, it builds an
//! enrichment plan from a registry of per-action builders, executes the steps
//! sequentially with per-step failure tolerance, derives next steps and a
//! summary, and leaves a terminal [`ActionRun`] record behind. A job-lease
//! table prevents two concurrent runs against the same anomaly.

pub mod connector;
pub mod enrichment;
pub mod locks;
pub mod run;
pub mod runner;

pub use connector::{Connector, IndexingSignals, PageMetadata, QueryVolume, SitemapCheck};
pub use enrichment::{EnrichmentPlanBuilder, EnrichmentRegistry, EnrichmentStep};
pub use locks::{JobLease, JobLockManager, JobLockStatus};
pub use run::{ActionRun, ChangeRecord, Finding, RunOutput, RunStatus};
pub use runner::ActionRunner;
