use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration — maps to `warden.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub trust: TrustConfig,
    pub safety: SafetyConfig,
    pub scheduler: SchedulerConfig,
    pub locks: LockConfig,
    pub outcome: OutcomeConfig,
    pub logging: LoggingConfig,
}

impl WardenConfig {
    /// Validate the config. Returns warnings for suspicious-but-legal values,
    /// errors for values the engine cannot run with.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();

        if !(0.0..=100.0).contains(&self.trust.confidence_floor) {
            return Err(format!(
                "trust.confidence_floor must be within 0..=100, got {}",
                self.trust.confidence_floor
            ));
        }
        if !(0.0..=1.0).contains(&self.trust.downgrade_success_rate) {
            return Err(format!(
                "trust.downgrade_success_rate must be within 0..=1, got {}",
                self.trust.downgrade_success_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.trust.upgrade_success_rate) {
            return Err(format!(
                "trust.upgrade_success_rate must be within 0..=1, got {}",
                self.trust.upgrade_success_rate
            ));
        }
        if self.locks.lease_secs == 0 {
            return Err("locks.lease_secs must be greater than zero".into());
        }
        if self.safety.min_reason_len < 10 {
            warnings.push(format!(
                "safety.min_reason_len is {} — audit reasons shorter than 10 chars are rarely useful",
                self.safety.min_reason_len
            ));
        }
        if self.scheduler.max_run_duration_ms < self.scheduler.default_service_timeout_ms {
            warnings.push(
                "scheduler.max_run_duration_ms is below the default service timeout — \
                 most plans will be cut short"
                    .into(),
            );
        }
        for (key, t) in &self.outcome.absolute_metrics {
            if t.severe <= t.poor {
                return Err(format!(
                    "outcome.absolute_metrics.{key}: severe ({}) must exceed poor ({})",
                    t.severe, t.poor
                ));
            }
        }
        if self.outcome.regression_percent <= 0.0 {
            return Err("outcome.regression_percent must be positive".into());
        }
        Ok(warnings)
    }
}

// ── Trust ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Minimum confidence for Autonomous-level unattended execution (0-100).
    pub confidence_floor: f64,
    /// Minimum total actions before the auto-downgrade rule applies.
    pub downgrade_min_actions: u32,
    /// Success rate below which a record is downgraded one level.
    pub downgrade_success_rate: f64,
    /// Successes required before an upgrade becomes advisory-eligible.
    pub upgrade_min_successes: u32,
    /// Success rate required for upgrade eligibility.
    pub upgrade_success_rate: f64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 70.0,
            downgrade_min_actions: 5,
            downgrade_success_rate: 0.6,
            upgrade_min_successes: 10,
            upgrade_success_rate: 0.9,
        }
    }
}

// ── Safety ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Minimum length of the `reason` on kill-switch / disable / pause commands.
    pub min_reason_len: usize,
    /// How many audit entries to retain in memory.
    pub audit_retention: usize,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            min_reason_len: 10,
            audit_retention: 1000,
        }
    }
}

// ── Run plan scheduler ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Timeout applied to a service task that does not carry its own.
    pub default_service_timeout_ms: u64,
    /// Wall-clock ceiling for an entire plan execution.
    pub max_run_duration_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_service_timeout_ms: 30_000,
            max_run_duration_ms: 300_000,
        }
    }
}

// ── Job locks ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Lease duration for a job lock before it is considered expired.
    pub lease_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self { lease_secs: 600 }
    }
}

// ── Outcome detection ──────────────────────────────────────────

/// Absolute thresholds for a latency/stability-style metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AbsoluteThreshold {
    /// Past this value the metric is considered regressed.
    pub poor: f64,
    /// Past this value the regression is a high-severity breakage.
    pub severe: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    /// Metrics judged by absolute value, with their poor/severe thresholds.
    pub absolute_metrics: HashMap<String, AbsoluteThreshold>,
    /// Negative percent change signalling a regression on relative metrics.
    pub regression_percent: f64,
    /// Multiple of `regression_percent` at which severity escalates to high.
    pub high_severity_multiple: f64,
    /// Positive percent change signalling an improvement on relative metrics.
    pub improvement_percent: f64,
    /// Attribution confidence required before knowledge promotion.
    pub promotion_confidence: f64,
    /// Knowledge entries flip draft -> active at this confidence.
    pub activation_confidence: f64,
    /// Metrics that settle within a day (guardrail window 24h).
    pub fast_metrics: Vec<String>,
    /// Metrics that take weeks to settle (guardrail window 14d).
    pub slow_metrics: Vec<String>,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        let mut absolute_metrics = HashMap::new();
        absolute_metrics.insert("lcp".to_string(), AbsoluteThreshold { poor: 2500.0, severe: 4000.0 });
        absolute_metrics.insert("inp".to_string(), AbsoluteThreshold { poor: 200.0, severe: 500.0 });
        absolute_metrics.insert("cls".to_string(), AbsoluteThreshold { poor: 0.1, severe: 0.25 });
        absolute_metrics.insert("ttfb".to_string(), AbsoluteThreshold { poor: 800.0, severe: 1800.0 });
        Self {
            absolute_metrics,
            regression_percent: 15.0,
            high_severity_multiple: 2.0,
            improvement_percent: 15.0,
            promotion_confidence: 0.8,
            activation_confidence: 0.9,
            fast_metrics: vec![
                "lcp".to_string(),
                "inp".to_string(),
                "cls".to_string(),
                "ttfb".to_string(),
                "error_rate".to_string(),
            ],
            slow_metrics: vec![
                "position".to_string(),
                "referring_domains".to_string(),
                "domain_authority".to_string(),
            ],
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter, e.g. "info", "warden_runner=debug,info".
    pub level: String,
    /// Emit JSON-formatted log lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}
