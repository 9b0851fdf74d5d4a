use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;
use twstock_core::{AlertDefinition, AlertHistoryRecord, AlertStore, DataError};
use uuid::Uuid;

/// On-disk layout of an alert file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertFile {
    #[serde(default)]
    pub alerts: Vec<AlertDefinition>,
    #[serde(default)]
    pub history: Vec<AlertHistoryRecord>,
}

/// [`AlertStore`] backed by a single JSON file.
///
/// Changes are held in memory until [`JsonAlertStore::save`] writes them back.
pub struct JsonAlertStore {
    path: PathBuf,
    state: Mutex<AlertFile>,
}

impl JsonAlertStore {
    /// Load `path`. A missing file opens as an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DataError> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                DataError::ParseError(format!("Invalid alert file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AlertFile::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self) -> Result<(), DataError> {
        let state = self.state.lock().await;
        let json = serde_json::to_vec_pretty(&*state)
            .map_err(|e| DataError::StoreError(format!("Failed to serialize alerts: {}", e)))?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Re-arm a triggered alert so the next run evaluates it again.
    pub async fn reset(&self, alert_id: Uuid) -> Result<(), DataError> {
        let mut state = self.state.lock().await;
        let alert = state
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| DataError::NotFound(format!("Alert {}", alert_id)))?;
        alert.reset();
        info!(alert_id = %alert_id, stock_id = %alert.stock_id, "Alert reset");
        Ok(())
    }

    pub async fn alerts(&self) -> Vec<AlertDefinition> {
        self.state.lock().await.alerts.clone()
    }

    pub async fn history(&self) -> Vec<AlertHistoryRecord> {
        self.state.lock().await.history.clone()
    }
}

#[async_trait]
impl AlertStore for JsonAlertStore {
    async fn pending_alerts(&self) -> Result<Vec<AlertDefinition>, DataError> {
        let state = self.state.lock().await;
        Ok(state.alerts.iter().filter(|a| a.is_pending()).cloned().collect())
    }

    async fn mark_triggered(&self, record: AlertHistoryRecord) -> Result<(), DataError> {
        let mut state = self.state.lock().await;
        let alert = state
            .alerts
            .iter_mut()
            .find(|a| a.id == record.alert_id)
            .ok_or_else(|| DataError::NotFound(format!("Alert {}", record.alert_id)))?;
        alert.mark_triggered(record.triggered_at);
        state.history.push(record);
        Ok(())
    }
}
