//! Heartbeat record decoder
//!
//! Normalizes one line of the validator status log into a [`ValidatorSnapshot`].
//! Each line is a positional pair `[timestamp, validator_data]`, and
//! `validator_data.heartbeat_statuses` is written as a list of
//! `[address, status]` pairs instead of an object. The pair list is folded into
//! a map here and never leaves this module.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use tracing::trace;

/// Liveness snapshot for a single validator
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeartbeatStatus {
    /// Seconds since the last acknowledged heartbeat
    pub since_last_success: f64,
    /// Round-trip of the last acknowledgment; `None` when no ack has been observed
    #[serde(default)]
    pub last_ack_duration: Option<f64>,
}

/// One decoded log record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatorSnapshot {
    /// Capture time of the log line, kept verbatim
    pub timestamp: String,
    pub home_validator: String,
    pub validators_missing_heartbeat: Vec<String>,
    pub heartbeat_statuses: HashMap<String, HeartbeatStatus>,
}

impl ValidatorSnapshot {
    /// Look up the heartbeat state of one validator address
    pub fn status_for(&self, address: &str) -> Option<&HeartbeatStatus> {
        self.heartbeat_statuses.get(address)
    }
}

/// Outer-shape failures. These mean the producer's format changed and are
/// worth logging loudly.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("line is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("expected a [timestamp, validator_data] array")]
    NotAnArray,
    #[error("expected a 2-element array, got {0} elements")]
    WrongLength(usize),
    #[error("expected timestamp string as first element, got {0}")]
    TimestampNotString(Value),
    #[error("validator data could not be decoded: {0}")]
    InvalidValidatorData(#[source] serde_json::Error),
}

/// Wire shape of the second array element
#[derive(Debug, Deserialize)]
struct RawValidatorData {
    #[serde(default, deserialize_with = "null_as_default")]
    home_validator: String,
    #[serde(default, deserialize_with = "null_as_default")]
    validators_missing_heartbeat: Vec<String>,
    #[serde(default, deserialize_with = "pair_list_to_map")]
    heartbeat_statuses: HashMap<String, HeartbeatStatus>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fold `[[address, status], ...]` into a map.
///
/// Entries with the wrong arity, a non-string key, or an undecodable status
/// are dropped without error. Later duplicates overwrite earlier ones.
fn pair_list_to_map<'de, D>(deserializer: D) -> Result<HashMap<String, HeartbeatStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(collect_heartbeat_pairs(entries.unwrap_or_default()))
}

fn collect_heartbeat_pairs(entries: Vec<Value>) -> HashMap<String, HeartbeatStatus> {
    let mut statuses = HashMap::with_capacity(entries.len());

    for entry in entries {
        let Value::Array(mut pair) = entry else {
            trace!("Skipping heartbeat entry that is not an array");
            continue;
        };
        if pair.len() != 2 {
            trace!(len = pair.len(), "Skipping heartbeat entry with wrong arity");
            continue;
        }

        let status = pair.pop().unwrap_or(Value::Null);
        let Some(Value::String(address)) = pair.pop() else {
            trace!("Skipping heartbeat entry with non-string key");
            continue;
        };

        match serde_json::from_value::<HeartbeatStatus>(status) {
            Ok(status) => {
                statuses.insert(address, status);
            }
            Err(e) => {
                trace!(address = %address, error = %e, "Skipping undecodable heartbeat status");
            }
        }
    }

    statuses
}

/// Decode one raw log line
pub fn decode_line(line: &[u8]) -> Result<ValidatorSnapshot, DecodeError> {
    let value: Value = serde_json::from_slice(line).map_err(DecodeError::InvalidJson)?;
    decode_value(value)
}

/// Decode an already-parsed log value
pub fn decode_value(value: Value) -> Result<ValidatorSnapshot, DecodeError> {
    let Value::Array(elements) = value else {
        return Err(DecodeError::NotAnArray);
    };
    let [timestamp, validator_data]: [Value; 2] = elements
        .try_into()
        .map_err(|rest: Vec<Value>| DecodeError::WrongLength(rest.len()))?;

    let Value::String(timestamp) = timestamp else {
        return Err(DecodeError::TimestampNotString(timestamp));
    };

    let raw: RawValidatorData =
        serde_json::from_value(validator_data).map_err(DecodeError::InvalidValidatorData)?;

    Ok(ValidatorSnapshot {
        timestamp,
        home_validator: raw.home_validator,
        validators_missing_heartbeat: raw.validators_missing_heartbeat,
        heartbeat_statuses: raw.heartbeat_statuses,
    })
}
