use metrics_exporter_prometheus::PrometheusHandle;
use signal_score::error::AppError;
use signal_score::scoring::router::ScoreRequest;
use signal_score::scoring::AggregationKind;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_kind(raw: &str) -> Result<AggregationKind, String> {
    raw.trim().parse().map_err(|err| format!("{err}"))
}

/// Read a `{ formulaType, signals }` document from disk.
pub(crate) fn load_score_request(path: &Path) -> Result<ScoreRequest, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let request = serde_json::from_str(&raw)?;
    Ok(request)
}
