use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use warden_config::schema::TrustConfig;
use warden_core::{ActionCategory, Result, TrustLevel, WardenError, WebsiteId};

use crate::record::TrustRecord;

/// How much a single outcome moves the confidence score. Failures cost more
/// than successes earn, so confidence recovers slower than it erodes.
const CONFIDENCE_GAIN_ON_SUCCESS: f64 = 5.0;
const CONFIDENCE_LOSS_ON_FAILURE: f64 = 15.0;

/// Mutable trust state for every (website, action category) pair, behind one
/// lock so outcome writes are read-modify-write with the freshest record.
#[derive(Clone)]
pub struct TrustLedger {
    records: Arc<RwLock<HashMap<(WebsiteId, ActionCategory), TrustRecord>>>,
    config: TrustConfig,
}

impl TrustLedger {
    pub fn new(config: TrustConfig) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Create an Observe-level record per category for a newly managed
    /// website. Existing records are left untouched.
    pub fn onboard_website(&self, website_id: &str, categories: &[ActionCategory]) -> usize {
        let mut records = self.records.write();
        let mut created = 0;
        for category in categories {
            let key = (website_id.to_string(), category.clone());
            if !records.contains_key(&key) {
                records.insert(
                    key,
                    TrustRecord::new(website_id.to_string(), category.clone()),
                );
                created += 1;
            }
        }
        info!(website = website_id, created, "onboarded website into trust ledger");
        created
    }

    pub fn get(&self, website_id: &str, category: &str) -> Option<TrustRecord> {
        self.records
            .read()
            .get(&(website_id.to_string(), category.to_string()))
            .cloned()
    }

    /// Insert or replace a record, validating ranges first. Invalid input is
    /// discarded and the prior state is untouched.
    pub fn upsert(&self, record: TrustRecord) -> Result<()> {
        record.validate()?;
        let key = (record.website_id.clone(), record.action_category.clone());
        self.records.write().insert(key, record);
        Ok(())
    }

    /// Record an executed action's outcome and re-evaluate the auto-downgrade
    /// rule. The whole sequence holds the write lock, so concurrent outcomes
    /// for the same pair serialize.
    pub fn record_outcome(&self, website_id: &str, category: &str, success: bool) -> Result<TrustRecord> {
        let mut records = self.records.write();
        let key = (website_id.to_string(), category.to_string());
        let record = records
            .get_mut(&key)
            .ok_or_else(|| WardenError::TrustRecordMissing {
                website_id: website_id.to_string(),
                category: category.to_string(),
            })?;

        let now = Utc::now();
        if success {
            record.success_count += 1;
            record.last_success_at = Some(now);
            record.confidence = (record.confidence + CONFIDENCE_GAIN_ON_SUCCESS).min(100.0);
        } else {
            record.failure_count += 1;
            record.last_failure_at = Some(now);
            record.confidence = (record.confidence - CONFIDENCE_LOSS_ON_FAILURE).max(0.0);
        }
        record.updated_at = now;

        if let Some(downgraded) = Self::downgrade_if_warranted(record, &self.config) {
            warn!(
                website = website_id,
                category,
                level = %downgraded,
                "trust auto-downgraded after sustained failures"
            );
        }

        Ok(record.clone())
    }

    /// Apply the auto-downgrade rule to the freshest record: total actions at
    /// or above the floor and success rate below the configured minimum drops
    /// the level by one, bottoming out at Observe.
    pub fn maybe_auto_downgrade(&self, website_id: &str, category: &str) -> Result<Option<TrustLevel>> {
        let mut records = self.records.write();
        let key = (website_id.to_string(), category.to_string());
        let record = records
            .get_mut(&key)
            .ok_or_else(|| WardenError::TrustRecordMissing {
                website_id: website_id.to_string(),
                category: category.to_string(),
            })?;
        Ok(Self::downgrade_if_warranted(record, &self.config))
    }

    fn downgrade_if_warranted(record: &mut TrustRecord, config: &TrustConfig) -> Option<TrustLevel> {
        if record.total_actions() < config.downgrade_min_actions {
            return None;
        }
        let rate = record.success_rate()?;
        if rate >= config.downgrade_success_rate {
            return None;
        }
        if record.trust_level == TrustLevel::Observe {
            return None;
        }
        record.trust_level = record.trust_level.downgraded();
        record.updated_at = Utc::now();
        Some(record.trust_level)
    }

    /// Advisory check: has this pair earned an upgrade? The upgrade itself
    /// requires a separate explicit call.
    pub fn upgrade_eligible(&self, website_id: &str, category: &str) -> bool {
        let records = self.records.read();
        let Some(record) = records.get(&(website_id.to_string(), category.to_string())) else {
            return false;
        };
        record.success_count >= self.config.upgrade_min_successes
            && record.success_rate().is_some_and(|r| r >= self.config.upgrade_success_rate)
            && record.trust_level < TrustLevel::Autonomous
    }

    /// Explicit upgrade, one level. Refused unless the pair is eligible.
    pub fn upgrade(&self, website_id: &str, category: &str, actor: &str) -> Result<TrustLevel> {
        if !self.upgrade_eligible(website_id, category) {
            return Err(WardenError::Validation {
                field: "trust_level".into(),
                reason: format!("({website_id}, {category}) is not upgrade-eligible"),
            });
        }
        let mut records = self.records.write();
        let key = (website_id.to_string(), category.to_string());
        let record = records
            .get_mut(&key)
            .ok_or_else(|| WardenError::TrustRecordMissing {
                website_id: website_id.to_string(),
                category: category.to_string(),
            })?;
        record.trust_level = record.trust_level.upgraded();
        record.last_reviewed_at = Some(Utc::now());
        record.updated_at = Utc::now();
        info!(website = website_id, category, actor, level = %record.trust_level, "trust upgraded");
        Ok(record.trust_level)
    }

    /// Manual override to an arbitrary level, stamping the review time.
    pub fn override_level(
        &self,
        website_id: &str,
        category: &str,
        level: TrustLevel,
        actor: &str,
    ) -> Result<()> {
        let mut records = self.records.write();
        let key = (website_id.to_string(), category.to_string());
        let record = records
            .get_mut(&key)
            .ok_or_else(|| WardenError::TrustRecordMissing {
                website_id: website_id.to_string(),
                category: category.to_string(),
            })?;
        record.trust_level = level;
        record.last_reviewed_at = Some(Utc::now());
        record.updated_at = Utc::now();
        info!(website = website_id, category, actor, level = %level, "trust level overridden");
        Ok(())
    }

    /// Snapshot of every record, for status surfaces and persistence.
    pub fn all(&self) -> Vec<TrustRecord> {
        self.records.read().values().cloned().collect()
    }

    pub fn for_website(&self, website_id: &str) -> Vec<TrustRecord> {
        self.records
            .read()
            .values()
            .filter(|r| r.website_id == website_id)
            .cloned()
            .collect()
    }

    pub fn config(&self) -> &TrustConfig {
        &self.config
    }
}
