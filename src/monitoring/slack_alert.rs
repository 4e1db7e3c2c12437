//! Slack alert service for validator notifications
//!
//! Posts plain-text alerts with the Web API `chat.postMessage` method.

use crate::monitoring::channel::AlertChannel;
use crate::monitoring::evaluator::Alert;
use crate::utils::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

/// Default Slack Web API base URL
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// `chat.postMessage` request body
#[derive(Debug, Serialize)]
pub struct SlackMessage {
    /// Channel ID or name
    pub channel: String,
    /// Plain text body
    pub text: String,
}

/// `chat.postMessage` response body
#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack alert service
#[derive(Debug, Clone)]
pub struct SlackAlert {
    /// Bot token
    token: String,
    /// Destination channel
    channel: String,
    /// Web API base URL
    api_base: String,
    /// HTTP client
    client: Client,
}

impl SlackAlert {
    /// Create a new Slack alert service
    pub fn new(token: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            channel: channel.into(),
            api_base: SLACK_API_BASE.to_string(),
            client: Client::new(),
        }
    }

    /// Point the client at a different API base (for testing)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Create a disabled alert service (for testing)
    pub fn disabled() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Get the destination channel
    pub fn channel(&self) -> &str {
        &self.channel
    }

    fn post_message_url(&self) -> String {
        format!("{}/chat.postMessage", self.api_base.trim_end_matches('/'))
    }

    /// Post a plain-text message to the configured channel
    #[instrument(skip(self, text), fields(channel = %self.channel))]
    pub async fn post_message(&self, text: &str) -> Result<(), AppError> {
        if !self.is_enabled() {
            debug!("Slack alerts disabled, skipping");
            return Ok(());
        }

        let payload = SlackMessage {
            channel: self.channel.clone(),
            text: text.to_string(),
        };

        let response = self
            .client
            .post(self.post_message_url())
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send Slack message");
                AppError::notification(format!("Failed to send Slack message: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Slack API returned error status");
            return Err(AppError::notification(format!(
                "Slack API error: {} - {}",
                status, body
            )));
        }

        let body: SlackResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to read Slack API response");
            AppError::notification(format!("Invalid Slack API response: {}", e))
        })?;

        if !body.ok {
            let reason = body.error.unwrap_or_else(|| "unknown_error".to_string());
            error!(reason = %reason, "Slack API rejected message");
            return Err(AppError::notification(format!(
                "Slack API error: {}",
                reason
            )));
        }

        info!("Slack alert sent successfully");
        Ok(())
    }
}

#[async_trait]
impl AlertChannel for SlackAlert {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn is_enabled(&self) -> bool {
        !self.token.is_empty() && !self.channel.is_empty()
    }

    async fn send(&self, alert: &Alert) -> Result<(), AppError> {
        self.post_message(&alert.message()).await
    }
}
