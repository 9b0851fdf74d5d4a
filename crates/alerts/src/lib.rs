pub mod engine;
pub mod params;
pub mod rules;

pub use engine::{check_alerts, history_window, select_pending, EngineConfig, Outcome, RunReport, RunSummary};
pub use rules::{evaluate, AlertError, Evaluation, Trigger};
