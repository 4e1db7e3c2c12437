//! Alert decision for one validator
//!
//! Pure functions over a [`ValidatorSnapshot`]: no I/O, no state carried
//! between cycles.

use crate::monitoring::heartbeat::{HeartbeatStatus, ValidatorSnapshot};
use serde::Deserialize;
use std::fmt;

/// Liveness limits; exceeding either one raises an alert
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Seconds allowed since the last successful heartbeat
    pub max_since_last_success: f64,
    /// Seconds allowed for the last acknowledgment round-trip
    pub max_last_ack_duration: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            max_since_last_success: 40.0,
            max_last_ack_duration: 0.02,
        }
    }
}

/// Why an alert fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertReason {
    SinceLastSuccessExceeded,
    AckDurationExceeded,
    AckMissing,
    NegativeValue,
    /// The address has no entry in `heartbeat_statuses`
    ValidatorNotReporting,
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AlertReason::SinceLastSuccessExceeded => "since_last_success above threshold",
            AlertReason::AckDurationExceeded => "last_ack_duration above threshold",
            AlertReason::AckMissing => "no acknowledgment recorded",
            AlertReason::NegativeValue => "negative heartbeat value",
            AlertReason::ValidatorNotReporting => "validator missing from heartbeat_statuses",
        };
        f.write_str(text)
    }
}

/// A decided alert, ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub validator_address: String,
    /// Log line timestamp, verbatim
    pub timestamp: String,
    pub since_last_success: Option<f64>,
    pub last_ack_duration: Option<f64>,
    pub reasons: Vec<AlertReason>,
}

impl Alert {
    /// One-line summary for the monitor's own log output
    pub fn summary(&self) -> String {
        format!(
            "Alert for validator {}: {}",
            self.validator_address,
            self.reasons_text()
        )
    }

    /// Full plain-text message sent to every channel
    pub fn message(&self) -> String {
        format!(
            "Alert for validator {} at {}:\nsince_last_success = {}, last_ack_duration = {}\nreason: {}",
            self.validator_address,
            self.timestamp,
            render_seconds(self.since_last_success),
            render_seconds(self.last_ack_duration),
            self.reasons_text()
        )
    }

    fn reasons_text(&self) -> String {
        self.reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn render_seconds(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}

/// Decide whether `address` needs an alert in this snapshot
pub fn evaluate(
    snapshot: &ValidatorSnapshot,
    address: &str,
    thresholds: &AlertThresholds,
) -> Option<Alert> {
    let Some(status) = snapshot.status_for(address) else {
        return Some(Alert {
            validator_address: address.to_string(),
            timestamp: snapshot.timestamp.clone(),
            since_last_success: None,
            last_ack_duration: None,
            reasons: vec![AlertReason::ValidatorNotReporting],
        });
    };

    let reasons = breached_limits(status, thresholds);
    if reasons.is_empty() {
        return None;
    }

    Some(Alert {
        validator_address: address.to_string(),
        timestamp: snapshot.timestamp.clone(),
        since_last_success: Some(status.since_last_success),
        last_ack_duration: status.last_ack_duration,
        reasons,
    })
}

fn breached_limits(status: &HeartbeatStatus, thresholds: &AlertThresholds) -> Vec<AlertReason> {
    let mut reasons = Vec::new();

    if status.since_last_success > thresholds.max_since_last_success {
        reasons.push(AlertReason::SinceLastSuccessExceeded);
    }

    match status.last_ack_duration {
        Some(duration) if duration > thresholds.max_last_ack_duration => {
            reasons.push(AlertReason::AckDurationExceeded)
        }
        Some(_) => {}
        None => reasons.push(AlertReason::AckMissing),
    }

    let negative = status.since_last_success < 0.0
        || status.last_ack_duration.is_some_and(|d| d < 0.0);
    if negative {
        reasons.push(AlertReason::NegativeValue);
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const ADDRESS: &str = "0xvalidator";

    fn snapshot_with(since_last_success: f64, last_ack_duration: Option<f64>) -> ValidatorSnapshot {
        let mut heartbeat_statuses = HashMap::new();
        heartbeat_statuses.insert(
            ADDRESS.to_string(),
            HeartbeatStatus {
                since_last_success,
                last_ack_duration,
            },
        );
        ValidatorSnapshot {
            timestamp: "2024-01-02T10:00:00".to_string(),
            home_validator: "0xhome".to_string(),
            validators_missing_heartbeat: vec![],
            heartbeat_statuses,
        }
    }

    fn reasons_for(
        since_last_success: f64,
        last_ack_duration: Option<f64>,
    ) -> Option<Vec<AlertReason>> {
        evaluate(
            &snapshot_with(since_last_success, last_ack_duration),
            ADDRESS,
            &AlertThresholds::default(),
        )
        .map(|alert| alert.reasons)
    }

    #[test]
    fn should_alert_when_since_last_success_exceeded() {
        assert_eq!(
            reasons_for(41.0, Some(0.01)),
            Some(vec![AlertReason::SinceLastSuccessExceeded])
        );
    }

    #[test]
    fn should_alert_when_ack_duration_exceeded() {
        assert_eq!(
            reasons_for(10.0, Some(0.03)),
            Some(vec![AlertReason::AckDurationExceeded])
        );
    }

    #[test]
    fn should_alert_when_ack_missing() {
        assert_eq!(reasons_for(10.0, None), Some(vec![AlertReason::AckMissing]));
    }

    #[test]
    fn should_not_alert_when_healthy() {
        assert_eq!(reasons_for(10.0, Some(0.01)), None);
    }

    #[test]
    fn should_not_alert_at_exact_thresholds() {
        assert_eq!(reasons_for(40.0, Some(0.02)), None);
    }

    #[test]
    fn should_alert_on_negative_values() {
        assert_eq!(
            reasons_for(-1.0, Some(0.01)),
            Some(vec![AlertReason::NegativeValue])
        );
        assert_eq!(
            reasons_for(5.0, Some(-0.5)),
            Some(vec![AlertReason::NegativeValue])
        );
    }

    #[test]
    fn should_collect_every_breached_limit() {
        assert_eq!(
            reasons_for(120.0, None),
            Some(vec![
                AlertReason::SinceLastSuccessExceeded,
                AlertReason::AckMissing
            ])
        );
    }

    #[test]
    fn should_alert_when_address_not_found() {
        // Arrange
        let snapshot = snapshot_with(1.0, Some(0.001));

        // Act
        let alert = evaluate(&snapshot, "0xunknown", &AlertThresholds::default())
            .expect("absent validator should alert");

        // Assert
        assert_eq!(alert.validator_address, "0xunknown");
        assert_eq!(alert.reasons, vec![AlertReason::ValidatorNotReporting]);
        assert_eq!(alert.since_last_success, None);
        assert_eq!(alert.last_ack_duration, None);
    }

    #[test]
    fn should_respect_custom_thresholds() {
        // Arrange
        let thresholds = AlertThresholds {
            max_since_last_success: 100.0,
            max_last_ack_duration: 0.5,
        };

        // Act
        let alert = evaluate(&snapshot_with(41.0, Some(0.03)), ADDRESS, &thresholds);

        // Assert
        assert!(alert.is_none());
    }

    #[test]
    fn should_render_message_with_none_for_absent_ack() {
        // Arrange
        let alert = evaluate(&snapshot_with(10.0, None), ADDRESS, &AlertThresholds::default())
            .expect("absent ack should alert");

        // Act
        let message = alert.message();

        // Assert
        assert_eq!(
            message,
            "Alert for validator 0xvalidator at 2024-01-02T10:00:00:\n\
             since_last_success = 10, last_ack_duration = none\n\
             reason: no acknowledgment recorded"
        );
    }

    #[test]
    fn should_render_summary_with_all_reasons() {
        // Arrange
        let alert = evaluate(&snapshot_with(50.0, Some(0.5)), ADDRESS, &AlertThresholds::default())
            .expect("should alert");

        // Act
        let summary = alert.summary();

        // Assert
        assert_eq!(
            summary,
            "Alert for validator 0xvalidator: since_last_success above threshold; last_ack_duration above threshold"
        );
    }
}
