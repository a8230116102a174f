//! # warden-runtime
//!
//! The governance engine — the facade that wires the risk catalog, trust
//! ledger, safety control plane, proposal manager, action runner, and
//! outcome feedback loop into one coherent surface.
//!
//! ## Architecture
//!
//! ```text
//!            ┌────────────────┐
//!            │  Collaborators  │  ← monitoring agents, admin surfaces
//!            └───────┬─────────┘
//!                    │ anomaly / verdict request / review action
//!                    ▼
//!            ┌─────────────────┐
//!            │ GovernanceEngine │
//!            │                 │
//!            │  1. Gate        │  ← risk catalog + trust ledger
//!            │  2. Guard       │  ← safety control plane
//!            │  3. Diagnose    │  ← run plan scheduler
//!            │  4. Act         │  ← action runner (+ job leases)
//!            │  5. Propose     │  ← proposal lifecycle (dedup)
//!            │  6. Measure     │  ← outcome feedback loop
//!            │  7. Learn       │  ← trust adjustment + knowledge
//!            └───────┬─────────┘
//!                    │
//!         ┌──────────┼──────────┐
//!         ▼          ▼          ▼
//!    ┌────────┐ ┌─────────┐ ┌────────┐
//!    │ SQLite │ │ Event   │ │ Bound- │
//!    │ store  │ │ bus     │ │ aries  │
//!    └────────┘ └─────────┘ └────────┘
//! ```

pub mod boundary;
pub mod engine;
pub mod status;
pub mod telemetry;

pub use boundary::{MetricsSource, WebsiteDirectory};
pub use engine::GovernanceEngine;
pub use status::SystemStatus;
pub use telemetry::init_tracing;
