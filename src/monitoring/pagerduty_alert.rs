//! PagerDuty alert service for validator incidents
//!
//! Triggers critical incidents through the Events API v2.

use crate::monitoring::channel::AlertChannel;
use crate::monitoring::evaluator::Alert;
use crate::utils::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

/// Default Events API v2 endpoint
pub const PAGERDUTY_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

/// Fixed incident source label
pub const EVENT_SOURCE: &str = "validator-monitoring-script";

/// Fixed incident component label
pub const EVENT_COMPONENT: &str = "Validator Monitoring";

/// Events API limit on `payload.summary`
const MAX_SUMMARY_CHARS: usize = 1024;

/// Events API v2 request body
#[derive(Debug, Serialize)]
pub struct PagerDutyEvent {
    pub routing_key: String,
    pub event_action: &'static str,
    pub payload: PagerDutyPayload,
}

/// Incident payload
#[derive(Debug, Serialize)]
pub struct PagerDutyPayload {
    pub summary: String,
    pub source: &'static str,
    pub severity: &'static str,
    pub component: &'static str,
    /// Timestamp (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl PagerDutyEvent {
    /// Build a critical `trigger` event
    pub fn trigger(routing_key: impl Into<String>, description: &str) -> Self {
        Self {
            routing_key: routing_key.into(),
            event_action: "trigger",
            payload: PagerDutyPayload {
                summary: truncate_summary(description),
                source: EVENT_SOURCE,
                severity: "critical",
                component: EVENT_COMPONENT,
                timestamp: Some(chrono::Utc::now().to_rfc3339()),
            },
        }
    }
}

fn truncate_summary(description: &str) -> String {
    description.chars().take(MAX_SUMMARY_CHARS).collect()
}

/// PagerDuty alert service
#[derive(Debug, Clone)]
pub struct PagerDutyAlert {
    /// Integration routing key
    routing_key: String,
    /// Events endpoint
    events_url: String,
    /// HTTP client
    client: Client,
}

impl PagerDutyAlert {
    /// Create a new PagerDuty alert service
    pub fn new(routing_key: impl Into<String>) -> Self {
        Self {
            routing_key: routing_key.into(),
            events_url: PAGERDUTY_EVENTS_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Override the events endpoint (for testing)
    pub fn with_events_url(mut self, events_url: impl Into<String>) -> Self {
        self.events_url = events_url.into();
        self
    }

    /// Create a disabled alert service (for testing)
    pub fn disabled() -> Self {
        Self::new(String::new())
    }

    /// Get the events endpoint
    pub fn events_url(&self) -> &str {
        &self.events_url
    }

    /// Trigger a critical incident with the given description
    #[instrument(skip(self, description))]
    pub async fn trigger(&self, description: &str) -> Result<(), AppError> {
        if !self.is_enabled() {
            debug!("PagerDuty alerts disabled, skipping");
            return Ok(());
        }

        let event = PagerDutyEvent::trigger(&self.routing_key, description);

        let response = self
            .client
            .post(&self.events_url)
            .json(&event)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send PagerDuty event");
                AppError::notification(format!("Failed to send PagerDuty event: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "PagerDuty API returned error");
            return Err(AppError::notification(format!(
                "PagerDuty API error: {} - {}",
                status, body
            )));
        }

        info!("PagerDuty incident triggered");
        Ok(())
    }
}

#[async_trait]
impl AlertChannel for PagerDutyAlert {
    fn name(&self) -> &'static str {
        "pagerduty"
    }

    fn is_enabled(&self) -> bool {
        !self.routing_key.is_empty()
    }

    async fn send(&self, alert: &Alert) -> Result<(), AppError> {
        self.trigger(&alert.message()).await
    }
}
