use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audited safety command. The trail is append-only: entries are added
/// with a strictly increasing `seq` and never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyAuditEntry {
    pub seq: u64,
    pub at: DateTime<Utc>,
    /// Human identity that issued the command.
    pub actor: String,
    /// Command name, e.g. "activate_kill_switch", "pause_website".
    pub command: String,
    pub detail: String,
}
