use serde::Serialize;

use warden_safety::SystemMode;

/// Point-in-time snapshot of the whole governance instance, for health-check
/// and admin surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub mode: SystemMode,
    pub kill_switch_active: bool,
    pub disabled_services: Vec<String>,
    pub paused_websites: Vec<String>,
    pub trust_records: usize,
    pub open_proposals: usize,
    pub held_job_locks: usize,
    pub knowledge_entries: usize,
    pub uptime_secs: i64,
}
