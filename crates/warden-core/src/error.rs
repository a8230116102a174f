use thiserror::Error;

/// Unified error type for the entire Warden engine.
///
/// Safety denials and eligibility denials are NOT errors — they are ordinary
/// return values carrying a reason string. Errors are reserved for
/// configuration problems, invalid input, and infrastructure failures.
#[derive(Error, Debug)]
pub enum WardenError {
    // ── Configuration errors ───────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    #[error("action code not found in risk registry: {0}")]
    Registry(String),

    #[error("no trust record for website '{website_id}' category '{category}'")]
    TrustRecordMissing { website_id: String, category: String },

    // ── Validation errors ──────────────────────────────────────
    #[error("validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("invalid run plan: {0}")]
    PlanInvalid(String),

    #[error("proposal transition not allowed: {from} -> {to}")]
    ProposalTransition { from: String, to: String },

    // ── Execution errors ───────────────────────────────────────
    #[error("job lock held: {job_id} by {holder}")]
    LockHeld { job_id: String, holder: String },

    #[error("connector failure: {service}: {reason}")]
    Connector { service: String, reason: String },

    // ── Storage errors ─────────────────────────────────────────
    #[error("store error: {0}")]
    Store(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, WardenError>;
