use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use warden_core::{ServiceKey, WebsiteId};

/// Operating mode of the whole governance instance. Anything other than
/// Normal blocks change-requiring work; read-only diagnostics keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemMode {
    Normal,
    Maintenance,
    Emergency,
}

/// The global emergency stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KillSwitch {
    pub active: bool,
    pub reason: Option<String>,
    pub triggered_by: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self {
            active: false,
            reason: None,
            triggered_by: None,
            activated_at: None,
        }
    }
}

/// The complete safety state, owned by [`crate::SafetyControlPlane`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyState {
    pub kill_switch: KillSwitch,
    pub mode: SystemMode,
    pub disabled_services: HashSet<ServiceKey>,
    pub paused_websites: HashSet<WebsiteId>,
}

impl Default for SafetyState {
    fn default() -> Self {
        Self {
            kill_switch: KillSwitch::default(),
            mode: SystemMode::Normal,
            disabled_services: HashSet::new(),
            paused_websites: HashSet::new(),
        }
    }
}

/// What a caller is about to do, for [`crate::SafetyControlPlane::perform_safety_check`].
#[derive(Debug, Clone, Default)]
pub struct SafetyCheckRequest {
    pub service_name: Option<ServiceKey>,
    pub website_id: Option<WebsiteId>,
    /// True when the caller is about to mutate the managed site (an
    /// implementation step); read-only enrichment passes false.
    pub requires_changes: bool,
}

/// Aggregated verdict. Failure reasons accumulate rather than short-circuit
/// so operators see every active interlock at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyCheckResult {
    pub passed: bool,
    pub failures: Vec<String>,
}
