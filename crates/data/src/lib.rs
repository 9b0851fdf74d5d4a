pub mod alert_file;
pub mod csv_loader;

pub use alert_file::{AlertFile, JsonAlertStore};

use async_trait::async_trait;
use std::path::PathBuf;
use twstock_core::{Bar, BarHistoryProvider, DataError};

/// Serves price history from a directory of `<stock_id>.csv` files.
pub struct CsvDataProvider {
    pub directory: PathBuf,
}

impl CsvDataProvider {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl BarHistoryProvider for CsvDataProvider {
    async fn recent_bars(&self, stock_id: &str, limit: usize) -> Result<Vec<Bar>, DataError> {
        // Ids become file names inside `directory`.
        if stock_id.is_empty() || !stock_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DataError::ParseError(format!("Invalid stock id: '{}'", stock_id)));
        }
        let file_path = self.directory.join(format!("{}.csv", stock_id));
        if !file_path.exists() {
            return Err(DataError::NotFound(format!(
                "CSV file not found: {}",
                file_path.display()
            )));
        }
        let mut bars = csv_loader::load_bars_from_csv(&file_path)?;
        let skip = bars.len().saturating_sub(limit);
        bars.drain(..skip);
        Ok(bars)
    }
}
