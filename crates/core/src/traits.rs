use crate::models::*;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while loading bars or alert state.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Data not found: {0}")]
    NotFound(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Store error: {0}")]
    StoreError(String),
}

// ---------------------------------------------------------------------------
// Bar History Provider
// ---------------------------------------------------------------------------

/// Supplies price history for one stock.
#[async_trait]
pub trait BarHistoryProvider: Send + Sync {
    /// The most recent `limit` bars for `stock_id`, ascending by date.
    async fn recent_bars(&self, stock_id: &str, limit: usize) -> Result<Vec<Bar>, DataError>;
}

// ---------------------------------------------------------------------------
// Alert Store
// ---------------------------------------------------------------------------

/// Holds alert definitions and their trigger history.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Definitions that are active and not yet triggered.
    async fn pending_alerts(&self) -> Result<Vec<AlertDefinition>, DataError>;

    /// Flag the alert named by `record.alert_id` as triggered and append the
    /// record to its history.
    async fn mark_triggered(&self, record: AlertHistoryRecord) -> Result<(), DataError>;
}
