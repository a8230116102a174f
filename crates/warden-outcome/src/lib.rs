//! # warden-outcome
//!
//! The outcome feedback loop: compares post-action metrics to a baseline,
//! classifies regressions and improvements into append-only outcome events,
//! adjusts the trust ledger for attributed interventions, and promotes
//! durable attributions into reusable knowledge entries.

pub mod detect;
pub mod event;
pub mod knowledge;
pub mod processor;

pub use detect::detect_breakages;
pub use event::{AttributedAction, OutcomeContext, OutcomeEvent, OutcomeType};
pub use knowledge::{KnowledgeBase, KnowledgeEntry, KnowledgeEvidence, KnowledgeStatus};
pub use processor::OutcomeProcessor;
