pub mod config;
pub mod monitoring;
pub mod utils;

use config::AppConfig;
use monitoring::{AlertChannel, PagerDutyAlert, SlackAlert};

/// Build the notification channels once for the process lifetime
pub fn build_channels(config: &AppConfig) -> Vec<Box<dyn AlertChannel>> {
    vec![
        Box::new(SlackAlert::new(&config.slack_token, &config.slack_channel))
            as Box<dyn AlertChannel>,
        Box::new(PagerDutyAlert::new(&config.pagerduty_api_key)),
    ]
}
