//! Notification channel abstraction

use crate::monitoring::evaluator::Alert;
use crate::utils::AppError;
use async_trait::async_trait;

/// An outbound alert destination.
///
/// Implementations make a single attempt per call; retries are not part of
/// the contract.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Disabled channels are skipped by the dispatcher
    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, alert: &Alert) -> Result<(), AppError>;
}
