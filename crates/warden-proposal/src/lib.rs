//! # warden-proposal
//!
//! Human-reviewable change proposals. Repeated detection of the same
//! underlying problem converges onto one open proposal via a stable
//! fingerprint; every lifecycle transition appends to an immutable action
//! log that is never retroactively edited.

pub mod fingerprint;
pub mod manager;
pub mod proposal;

pub use fingerprint::proposal_fingerprint;
pub use manager::ProposalManager;
pub use proposal::{
    ChangeProposal, ProposalAction, ProposalDecision, ProposalInput, ProposalStatus,
};
