use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a managed website, e.g. "site_1".
pub type WebsiteId = String;

/// Unique identifier for an automatable action, e.g. "seo.add_meta_descriptions".
pub type ActionCode = String;

/// Category an action belongs to, e.g. "seo_metadata", "content", "technical".
pub type ActionCategory = String;

/// Identifier for a diagnostic service in a run plan, e.g. "gsc", "crawler".
pub type ServiceKey = String;

/// Identifier for a lockable background job (usually an anomaly id).
pub type JobId = String;

/// Graduated autonomy tiers, from watch-only to unattended execution:
///
/// - **Observe (0)**: the engine only records what it would have done.
/// - **Recommend (1)**: changes are surfaced as proposals, never executed.
/// - **Assisted (2)**: low-risk changes execute after one-click approval.
/// - **Autonomous (3)**: eligible changes execute unattended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TrustLevel {
    Observe = 0,
    Recommend = 1,
    Assisted = 2,
    Autonomous = 3,
}

impl TrustLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Observe,
            1 => Self::Recommend,
            2 => Self::Assisted,
            3 => Self::Autonomous,
            _ => Self::Observe, // safe default
        }
    }

    /// One level down, saturating at Observe.
    pub fn downgraded(&self) -> Self {
        Self::from_u8((*self as u8).saturating_sub(1))
    }

    /// One level up, saturating at Autonomous.
    pub fn upgraded(&self) -> Self {
        match self {
            Self::Autonomous => Self::Autonomous,
            other => Self::from_u8(*other as u8 + 1),
        }
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{} ({})", *self as u8, match self {
            Self::Observe => "Observe",
            Self::Recommend => "Recommend",
            Self::Assisted => "Assisted",
            Self::Autonomous => "Autonomous",
        })
    }
}

/// Risk classification of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Scope of impact of an action on the managed site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlastRadius {
    Page,
    Section,
    Site,
}

/// Severity of a detected metric shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A detected anomaly that triggers diagnostics and, potentially, an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub anomaly_id: JobId,
    pub site_id: WebsiteId,
    /// Metric that moved, e.g. "clicks", "lcp".
    pub metric_key: String,
    /// Signed percent change against the comparison window.
    pub change_percent: f64,
    /// Window label the change was measured over ("24h", "7d", "28d").
    pub window: String,
    pub detected_at: DateTime<Utc>,
}

/// A single timestamped metric observation from the metrics source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub metric_key: String,
    pub value: f64,
    pub captured_at: DateTime<Utc>,
}

/// A managed website as known to the external registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteRecord {
    pub website_id: WebsiteId,
    pub base_url: String,
    pub status: WebsiteStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsiteStatus {
    Active,
    Suspended,
    Offboarded,
}
