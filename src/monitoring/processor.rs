//! Poll loop for the heartbeat monitor
//!
//! Each cycle reads the current log file, keeps only its last array-shaped
//! line, decodes and evaluates it, and dispatches a decided alert to every
//! configured channel.

use crate::config::AppConfig;
use crate::monitoring::channel::AlertChannel;
use crate::monitoring::evaluator::{evaluate, Alert, AlertThresholds};
use crate::monitoring::heartbeat::decode_line;
use crate::monitoring::log_locator::find_latest_log_file;
use crate::utils::AppError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Result of one poll cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The log file could not be opened or read
    FileUnavailable,
    /// The file held no array-shaped line
    NoRecord,
    /// The last array-shaped line did not match the expected shape
    DecodeFailed,
    /// The validator is within thresholds
    Healthy,
    /// An alert was decided and dispatched
    Alerted(Alert),
}

/// Heartbeat monitor driving the poll loop
pub struct HeartbeatMonitor {
    /// Base directory of the log tree
    base_path: PathBuf,
    /// Log file currently being read
    log_file: PathBuf,
    /// Validator being watched
    validator_address: String,
    thresholds: AlertThresholds,
    /// Notification channels, in dispatch order
    channels: Vec<Box<dyn AlertChannel>>,
    check_interval: Duration,
    /// Fixed delay after a failed file open
    file_retry_delay: Duration,
    relocate_each_cycle: bool,
}

impl HeartbeatMonitor {
    /// Create a monitor reading `log_file`
    pub fn new(
        config: &AppConfig,
        log_file: PathBuf,
        channels: Vec<Box<dyn AlertChannel>>,
    ) -> Self {
        Self {
            base_path: config.base_path.clone(),
            log_file,
            validator_address: config.validator_address.clone(),
            thresholds: config.thresholds,
            channels,
            check_interval: Duration::from_secs(config.check_interval),
            file_retry_delay: Duration::from_secs(config.file_retry_secs),
            relocate_each_cycle: config.relocate_each_cycle,
        }
    }

    /// Set the poll interval
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Set the delay used after a failed file open
    pub fn with_file_retry_delay(mut self, delay: Duration) -> Self {
        self.file_retry_delay = delay;
        self
    }

    /// Get the log file being read
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Run a single poll cycle without sleeping
    #[instrument(skip(self), fields(validator = %self.validator_address))]
    pub async fn process_once(&mut self) -> CycleOutcome {
        if self.relocate_each_cycle {
            self.relocate();
        }

        let raw_line = match read_last_array_line(&self.log_file) {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!(log_file = %self.log_file.display(), "No array-shaped record in log file");
                return CycleOutcome::NoRecord;
            }
            Err(e) => {
                error!(error = %e, "Error opening log file");
                return CycleOutcome::FileUnavailable;
            }
        };

        debug!(raw = %raw_line, "Last log record");

        let snapshot = match decode_line(raw_line.as_bytes()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let e = AppError::from(e);
                error!(
                    error_code = e.error_code(),
                    error = %e,
                    "Could not decode log record as expected array"
                );
                return CycleOutcome::DecodeFailed;
            }
        };

        info!(
            timestamp = %snapshot.timestamp,
            statuses = snapshot.heartbeat_statuses.len(),
            "Evaluating heartbeat record"
        );
        debug!(
            missing = ?snapshot.validators_missing_heartbeat,
            "Validators missing heartbeat"
        );

        match evaluate(&snapshot, &self.validator_address, &self.thresholds) {
            Some(alert) => {
                warn!(summary = %alert.summary(), "Heartbeat threshold breached");
                self.dispatch(&alert).await;
                CycleOutcome::Alerted(alert)
            }
            None => {
                debug!("Validator heartbeat healthy");
                CycleOutcome::Healthy
            }
        }
    }

    /// Send an alert to every enabled channel. Failures are logged only.
    pub async fn dispatch(&self, alert: &Alert) {
        for channel in &self.channels {
            if !channel.is_enabled() {
                debug!(channel = channel.name(), "Channel disabled, skipping");
                continue;
            }

            if let Err(e) = channel.send(alert).await {
                error!(
                    channel = channel.name(),
                    error_code = e.error_code(),
                    error = %e,
                    "Failed to deliver alert"
                );
            }
        }
    }

    /// Run the poll loop indefinitely
    #[instrument(skip(self), level = "info")]
    pub async fn run_loop(&mut self) {
        info!(
            log_file = %self.log_file.display(),
            check_interval_secs = self.check_interval.as_secs(),
            "Starting heartbeat monitor loop"
        );

        loop {
            let outcome = self.process_once().await;
            tokio::time::sleep(self.delay_after(&outcome)).await;
        }
    }

    /// Run the poll loop for a limited number of cycles
    ///
    /// Useful for testing
    pub async fn run_iterations(&mut self, max_iterations: usize) -> Vec<CycleOutcome> {
        let mut outcomes = Vec::with_capacity(max_iterations);

        for i in 0..max_iterations {
            let outcome = self.process_once().await;
            let delay = self.delay_after(&outcome);
            outcomes.push(outcome);
            if i + 1 < max_iterations {
                tokio::time::sleep(delay).await;
            }
        }

        outcomes
    }

    fn delay_after(&self, outcome: &CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::FileUnavailable => self.file_retry_delay,
            _ => self.check_interval,
        }
    }

    fn relocate(&mut self) {
        match find_latest_log_file(&self.base_path) {
            Ok(path) => {
                if path != self.log_file {
                    info!(
                        previous = %self.log_file.display(),
                        current = %path.display(),
                        "Switched to newer log file"
                    );
                    self.log_file = path;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to re-locate latest log file, keeping previous");
            }
        }
    }
}

/// Read `path` and return the last line that parses as a JSON array.
///
/// Blank lines are ignored. Lines that are not JSON, including lines with
/// invalid UTF-8, are logged and skipped. Only a failed read is an error.
pub fn read_last_array_line(path: &Path) -> Result<Option<String>, AppError> {
    let file = File::open(path).map_err(|e| AppError::io(path, e))?;
    let mut reader = BufReader::new(file);

    let mut last_array = None;
    let mut buf = Vec::new();
    let mut line_num = 0;
    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).map_err(|e| {
            error!(error = %e, line = line_num + 1, "Failed to read line");
            AppError::io(path, e)
        })?;
        if read == 0 {
            break;
        }
        line_num += 1;

        let trimmed = buf.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_slice::<serde_json::Value>(trimmed) {
            Ok(value) if value.is_array() => {
                last_array = Some(String::from_utf8_lossy(trimmed).into_owned())
            }
            Ok(_) => debug!(line = line_num, "Skipping non-array log line"),
            Err(e) => warn!(line = line_num, error = %e, "Error decoding JSON line, skipping"),
        }
    }

    Ok(last_array)
}
