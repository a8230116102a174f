use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use warden_core::{JobId, Result, WardenError};

/// A held lease on a job. Leases expire rather than live forever, so a
/// crashed runner cannot wedge an anomaly permanently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLease {
    pub job_id: JobId,
    pub holder: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl JobLease {
    pub fn expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Externally visible lock state for a job, for admin surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobLockStatus {
    Unlocked,
    Held { holder: String, expires_at: DateTime<Utc> },
    Expired { holder: String, expires_at: DateTime<Utc> },
}

/// Lease table preventing two concurrent action runs against the same job.
#[derive(Clone)]
pub struct JobLockManager {
    leases: Arc<DashMap<JobId, JobLease>>,
    lease_secs: u64,
}

impl JobLockManager {
    pub fn new(lease_secs: u64) -> Self {
        Self {
            leases: Arc::new(DashMap::new()),
            lease_secs,
        }
    }

    /// Acquire the lease for a job. A held, unexpired lease is refused; an
    /// expired lease is taken over.
    pub fn acquire(&self, job_id: &str, holder: &str) -> Result<JobLease> {
        let mut refused: Option<String> = None;
        let entry = self
            .leases
            .entry(job_id.to_string())
            .and_modify(|lease| {
                if lease.expired() {
                    warn!(job = job_id, previous = %lease.holder, "taking over expired lease");
                    *lease = Self::fresh_lease(job_id, holder, self.lease_secs);
                } else if lease.holder != holder {
                    refused = Some(lease.holder.clone());
                }
            })
            .or_insert_with(|| Self::fresh_lease(job_id, holder, self.lease_secs));

        if let Some(current_holder) = refused {
            return Err(WardenError::LockHeld {
                job_id: job_id.to_string(),
                holder: current_holder,
            });
        }
        debug!(job = job_id, holder, "job lease acquired");
        Ok(entry.clone())
    }

    /// Release a lease. Only the holder may release; anyone else's release is
    /// ignored and reported false.
    pub fn release(&self, job_id: &str, holder: &str) -> bool {
        let removed = self
            .leases
            .remove_if(job_id, |_, lease| lease.holder == holder)
            .is_some();
        if removed {
            debug!(job = job_id, holder, "job lease released");
        }
        removed
    }

    pub fn status(&self, job_id: &str) -> JobLockStatus {
        match self.leases.get(job_id) {
            None => JobLockStatus::Unlocked,
            Some(lease) if lease.expired() => JobLockStatus::Expired {
                holder: lease.holder.clone(),
                expires_at: lease.expires_at,
            },
            Some(lease) => JobLockStatus::Held {
                holder: lease.holder.clone(),
                expires_at: lease.expires_at,
            },
        }
    }

    /// Sweep out expired leases, returning the job ids that were recovered.
    pub fn recover_expired(&self) -> Vec<JobId> {
        let expired: Vec<JobId> = self
            .leases
            .iter()
            .filter(|entry| entry.value().expired())
            .map(|entry| entry.key().clone())
            .collect();
        for job_id in &expired {
            self.leases.remove_if(job_id, |_, lease| lease.expired());
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "recovered expired job leases");
        }
        expired
    }

    pub fn held_count(&self) -> usize {
        self.leases.iter().filter(|e| !e.value().expired()).count()
    }

    fn fresh_lease(job_id: &str, holder: &str, lease_secs: u64) -> JobLease {
        let now = Utc::now();
        JobLease {
            job_id: job_id.to_string(),
            holder: holder.to_string(),
            acquired_at: now,
            expires_at: now + Duration::seconds(lease_secs as i64),
        }
    }
}
