//! # warden-trust
//!
//! The graduated-autonomy state machine. A [`TrustRecord`] per
//! (website, action category) tracks earned autonomy and performance history;
//! the [`EligibilityGate`] combines the ledger with the risk catalog into a
//! single pure decision: may this action execute unattended?

pub mod gate;
pub mod ledger;
pub mod record;

pub use gate::{EligibilityGate, EligibilityResult};
pub use ledger::TrustLedger;
pub use record::TrustRecord;
