//! Validator heartbeat monitoring
//!
//! - Latest log file lookup
//! - Heartbeat record decoding
//! - Alert evaluation
//! - Slack and PagerDuty notifications
//! - Poll loop

pub mod channel;
pub mod evaluator;
pub mod heartbeat;
pub mod log_locator;
pub mod pagerduty_alert;
pub mod processor;
pub mod slack_alert;

pub use channel::AlertChannel;
pub use evaluator::{evaluate, Alert, AlertReason, AlertThresholds};
pub use heartbeat::{decode_line, DecodeError, HeartbeatStatus, ValidatorSnapshot};
pub use log_locator::find_latest_log_file;
pub use pagerduty_alert::PagerDutyAlert;
pub use processor::{CycleOutcome, HeartbeatMonitor};
pub use slack_alert::SlackAlert;
