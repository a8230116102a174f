use chrono::Utc;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use warden_config::schema::OutcomeConfig;
use warden_core::{MetricSample, Severity};

use crate::event::{OutcomeContext, OutcomeEvent, OutcomeType};

/// Compare the current snapshot against the baseline and classify every
/// meaningful shift. Metrics present in only one snapshot are ignored.
///
/// Latency/stability metrics (configured in `absolute_metrics`) are judged by
/// absolute value against poor/severe thresholds; everything else is judged
/// by percent change.
pub fn detect_breakages(
    site_id: &str,
    current: &[MetricSample],
    baseline: &[MetricSample],
    intervention: Option<Uuid>,
    window: &str,
    thresholds: &OutcomeConfig,
) -> Vec<OutcomeEvent> {
    let current_values = latest_by_key(current);
    let baseline_values = latest_by_key(baseline);

    let mut events = Vec::new();
    for (metric_key, &new_value) in &current_values {
        let Some(&old_value) = baseline_values.get(metric_key) else {
            continue;
        };

        let classified = if let Some(abs) = thresholds.absolute_metrics.get(metric_key.as_str()) {
            classify_absolute(new_value, old_value, abs.poor, abs.severe)
        } else {
            classify_relative(new_value, old_value, thresholds)
        };

        let Some((event_type, severity)) = classified else {
            continue;
        };

        let delta = new_value - old_value;
        let percent_change = if old_value != 0.0 {
            delta / old_value * 100.0
        } else {
            0.0
        };
        debug!(
            site = site_id,
            metric = metric_key.as_str(),
            old = old_value,
            new = new_value,
            ?event_type,
            ?severity,
            "metric shift detected"
        );
        events.push(OutcomeEvent {
            event_id: Uuid::new_v4(),
            site_id: site_id.to_string(),
            metric_key: metric_key.clone(),
            old_value,
            new_value,
            delta,
            percent_change,
            severity,
            event_type,
            window: window.to_string(),
            context: OutcomeContext {
                intervention_id: intervention,
                note: String::new(),
            },
            detected_at: Utc::now(),
        });
    }
    events
}

fn latest_by_key(samples: &[MetricSample]) -> HashMap<String, f64> {
    let mut map: HashMap<String, (f64, chrono::DateTime<Utc>)> = HashMap::new();
    for sample in samples {
        match map.get(&sample.metric_key) {
            Some((_, at)) if *at >= sample.captured_at => {}
            _ => {
                map.insert(sample.metric_key.clone(), (sample.value, sample.captured_at));
            }
        }
    }
    map.into_iter().map(|(k, (v, _))| (k, v)).collect()
}

/// Absolute rules: lower is better. Past `severe` the regression is a
/// breakage; past `poor` it is a medium regression; dropping back out of the
/// poor band counts as an improvement.
fn classify_absolute(
    new_value: f64,
    old_value: f64,
    poor: f64,
    severe: f64,
) -> Option<(OutcomeType, Severity)> {
    let worsened = new_value > old_value;
    if worsened && new_value >= severe {
        return Some((OutcomeType::Breakage, Severity::High));
    }
    if worsened && new_value >= poor {
        return Some((OutcomeType::Regression, Severity::Medium));
    }
    if !worsened && old_value >= poor && new_value < poor {
        return Some((OutcomeType::Improvement, Severity::Low));
    }
    None
}

/// Relative rules: higher is better. A drop past the base percent is a
/// regression, escalating to a breakage at the configured multiple; a rise
/// past the base percent is an improvement.
fn classify_relative(
    new_value: f64,
    old_value: f64,
    thresholds: &OutcomeConfig,
) -> Option<(OutcomeType, Severity)> {
    if old_value == 0.0 {
        return None;
    }
    let pct = (new_value - old_value) / old_value * 100.0;
    let base = thresholds.regression_percent;
    let high = base * thresholds.high_severity_multiple;

    if pct <= -high {
        return Some((OutcomeType::Breakage, Severity::High));
    }
    if pct <= -base {
        return Some((OutcomeType::Regression, Severity::Medium));
    }
    if pct >= thresholds.improvement_percent * thresholds.high_severity_multiple {
        return Some((OutcomeType::Improvement, Severity::Medium));
    }
    if pct >= thresholds.improvement_percent {
        return Some((OutcomeType::Improvement, Severity::Low));
    }
    None
}
