use crate::params::ma_period;
use crate::rules::{evaluate, AlertError, Evaluation};
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use twstock_core::*;
use twstock_indicators::DEFAULT_RSI_PERIOD;
use uuid::Uuid;

/// Settings for one scheduled alert run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Alerts evaluated at the same time.
    pub concurrency: usize,
    /// Bars loaded for RSI alerts. More history than the 15-bar minimum lets
    /// Wilder's smoothing settle.
    pub rsi_lookback: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            rsi_lookback: 100,
        }
    }
}

/// The alerts a run may evaluate: active and not yet triggered.
pub fn select_pending(definitions: Vec<AlertDefinition>) -> Vec<AlertDefinition> {
    definitions.into_iter().filter(AlertDefinition::is_pending).collect()
}

/// How many recent bars `definition` needs.
pub fn history_window(definition: &AlertDefinition, config: &EngineConfig) -> Result<usize, AlertError> {
    Ok(match definition.alert_type {
        AlertType::PriceAbove | AlertType::PriceBelow => 1,
        AlertType::RsiAbove | AlertType::RsiBelow => config.rsi_lookback.max(DEFAULT_RSI_PERIOD + 1),
        AlertType::MaCrossAbove | AlertType::MaCrossBelow => {
            ma_period(definition.condition_params.as_ref())? + 1
        }
    })
}

/// What happened to one alert in a run.
#[derive(Debug)]
pub struct Outcome {
    pub alert_id: Uuid,
    pub stock_id: String,
    pub alert_type: AlertType,
    pub result: Result<Evaluation, AlertError>,
}

/// Counts per outcome kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub checked: usize,
    pub triggered: usize,
    pub not_fired: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Checked {} alerts, {} triggered ({} not fired, {} skipped, {} failed)",
            self.checked, self.triggered, self.not_fired, self.skipped, self.failed
        )
    }
}

/// Outcomes of a run, in the order the store returned the alerts.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<Outcome>,
}

impl RunReport {
    pub fn triggered_ids(&self) -> Vec<Uuid> {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok(e) if e.fired()))
            .map(|o| o.alert_id)
            .collect()
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            checked: self.outcomes.len(),
            ..Default::default()
        };
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(Evaluation::Fired(_)) => summary.triggered += 1,
                Ok(Evaluation::NotFired) => summary.not_fired += 1,
                Ok(Evaluation::InsufficientData { .. }) => summary.skipped += 1,
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Run every pending alert once.
///
/// Each alert loads its own history, is evaluated, and when it fires is
/// marked triggered in `store` with a history record stamped `now`. A failure
/// at any of those steps is kept in that alert's [`Outcome`]; only failing to
/// list the alerts fails the run.
pub async fn check_alerts(
    store: &dyn AlertStore,
    provider: &dyn BarHistoryProvider,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<RunReport, DataError> {
    let pending = select_pending(store.pending_alerts().await?);
    info!(alerts = pending.len(), "Checking alerts");

    let outcomes = stream::iter(pending)
        .map(|definition| check_one(store, provider, config, definition, now))
        .buffered(config.concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    let report = RunReport { outcomes };
    info!(summary = %report.summary(), "Alert check complete");
    Ok(report)
}

async fn check_one(
    store: &dyn AlertStore,
    provider: &dyn BarHistoryProvider,
    config: &EngineConfig,
    definition: AlertDefinition,
    now: DateTime<Utc>,
) -> Outcome {
    let result = evaluate_and_record(store, provider, config, &definition, now).await;

    match &result {
        Ok(Evaluation::Fired(trigger)) => info!(
            alert_id = %definition.id,
            stock_id = %definition.stock_id,
            "Alert triggered: {}",
            trigger.message
        ),
        Ok(Evaluation::InsufficientData { required, available }) => debug!(
            alert_id = %definition.id,
            stock_id = %definition.stock_id,
            required,
            available,
            "Not enough history, skipping alert"
        ),
        Ok(Evaluation::NotFired) => {}
        Err(e) => warn!(
            alert_id = %definition.id,
            stock_id = %definition.stock_id,
            error = %e,
            "Alert evaluation failed"
        ),
    }

    Outcome {
        alert_id: definition.id,
        stock_id: definition.stock_id,
        alert_type: definition.alert_type,
        result,
    }
}

async fn evaluate_and_record(
    store: &dyn AlertStore,
    provider: &dyn BarHistoryProvider,
    config: &EngineConfig,
    definition: &AlertDefinition,
    now: DateTime<Utc>,
) -> Result<Evaluation, AlertError> {
    let window = history_window(definition, config)?;
    let bars = provider.recent_bars(&definition.stock_id, window).await?;
    let evaluation = evaluate(definition, &bars)?;

    if let Evaluation::Fired(trigger) = &evaluation {
        store
            .mark_triggered(AlertHistoryRecord {
                id: Uuid::new_v4(),
                alert_id: definition.id,
                stock_id: definition.stock_id.clone(),
                triggered_at: now,
                trigger_price: trigger.trigger_price,
                message: trigger.message.clone(),
            })
            .await?;
    }

    Ok(evaluation)
}
