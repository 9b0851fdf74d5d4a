mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::AppConfig;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use twstock_alerts::{check_alerts, Evaluation};
use twstock_core::{AlertType, Bar};
use twstock_data::{csv_loader, CsvDataProvider, JsonAlertStore};
use twstock_indicators::IndicatorSet;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "twstock")]
#[command(about = "Technical indicators and price alerts for Taiwan-listed stocks")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// TOML config file
    #[arg(short, long, env = "TWSTOCK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute chart indicators for one stock and print them as JSON
    Indicators {
        /// Path to the stock's daily CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Only print the most recent N trading days
        #[arg(long)]
        days: Option<usize>,
    },

    /// Evaluate every pending alert once
    CheckAlerts {
        /// Path to the alert JSON file
        #[arg(short, long)]
        alerts: PathBuf,

        /// Directory of <stock_id>.csv files
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Re-arm a triggered alert
    ResetAlert {
        /// Path to the alert JSON file
        #[arg(short, long)]
        alerts: PathBuf,

        /// Alert id
        #[arg(long)]
        id: Uuid,
    },

    /// List supported alert types
    AlertTypes,
}

#[derive(Serialize)]
struct LatestQuote {
    date: chrono::NaiveDate,
    close: Decimal,
    spread: Decimal,
    change_percent: Decimal,
}

impl From<&Bar> for LatestQuote {
    fn from(bar: &Bar) -> Self {
        Self {
            date: bar.date,
            close: bar.close,
            spread: bar.spread,
            change_percent: bar.change_percent().round_dp(2),
        }
    }
}

#[derive(Serialize)]
struct IndicatorReport {
    stock_id: String,
    bars: usize,
    latest: LatestQuote,
    indicators: IndicatorSet,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Indicators { data, days } => print_indicators(data, days, &config)?,
        Commands::CheckAlerts { alerts, data } => run_alert_check(alerts, data, &config).await?,
        Commands::ResetAlert { alerts, id } => {
            let store = JsonAlertStore::open(alerts).await?;
            store.reset(id).await?;
            store.save().await?;
            println!("Alert {} reset", id);
        }
        Commands::AlertTypes => {
            println!("Supported alert types:");
            for alert_type in AlertType::ALL {
                println!("  {:<15} - {}", alert_type.as_str(), describe(alert_type));
            }
        }
    }

    Ok(())
}

fn describe(alert_type: AlertType) -> &'static str {
    match alert_type {
        AlertType::PriceAbove => "close rises above condition_value",
        AlertType::PriceBelow => "close falls below condition_value",
        AlertType::RsiAbove => "RSI(14) rises above condition_value",
        AlertType::RsiBelow => "RSI(14) falls below condition_value",
        AlertType::MaCrossAbove => "close crosses above its MA (condition_params.ma_period, default 20)",
        AlertType::MaCrossBelow => "close crosses below its MA (condition_params.ma_period, default 20)",
    }
}

fn print_indicators(data: PathBuf, days: Option<usize>, config: &AppConfig) -> Result<()> {
    let bars = csv_loader::load_bars_from_csv(&data)?;
    tracing::info!(data = %data.display(), bars = bars.len(), "Loaded price history");

    let Some(last) = bars.last() else {
        anyhow::bail!("No bars loaded from CSV file");
    };

    let mut indicators = IndicatorSet::compute(&bars, &config.indicators);
    if let Some(days) = days {
        indicators = indicators.tail(days);
    }

    let report = IndicatorReport {
        stock_id: last.stock_id.clone(),
        bars: bars.len(),
        latest: LatestQuote::from(last),
        indicators: indicators.present_only(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_alert_check(alerts: PathBuf, data: PathBuf, config: &AppConfig) -> Result<()> {
    let store = JsonAlertStore::open(alerts).await?;
    let provider = CsvDataProvider::new(data);

    let report = check_alerts(&store, &provider, &config.alerts, chrono::Utc::now()).await?;

    if !report.triggered_ids().is_empty() {
        store.save().await?;
        tracing::info!(path = %store.path().display(), "Saved alert state");
    }

    for outcome in &report.outcomes {
        if let Ok(Evaluation::Fired(trigger)) = &outcome.result {
            println!("[{}] {}", outcome.alert_type, trigger.message);
        }
    }
    println!("{}", report.summary());
    Ok(())
}
