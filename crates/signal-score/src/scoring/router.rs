use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::evaluate::{resolve, Resolution, ResolvedSignal};
use super::kind::{formula_catalog, AggregationKind, FormulaInfo};
use super::signal::Signal;

/// Router exposing stateless score evaluation and the formula catalog.
pub fn scoring_router() -> Router {
    Router::new()
        .route("/api/v1/score", post(score_handler))
        .route("/api/v1/formulas", get(formulas_handler))
}

/// A tree snapshot submitted for scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub formula_type: AggregationKind,
    #[serde(default)]
    pub signals: Vec<Signal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub formula_type: AggregationKind,
    pub label: &'static str,
    /// Serialized as `null` when the score is not a number. Inputs are not range
    /// checked, so a probabilistic OR over a value above 1 with a fractional weight
    /// share produces NaN.
    pub score: f64,
    pub signals: Vec<ResolvedSignal>,
}

impl From<Resolution> for ScoreResponse {
    fn from(resolution: Resolution) -> Self {
        Self {
            formula_type: resolution.formula_type,
            label: resolution.formula_type.label(),
            score: resolution.score,
            signals: resolution.signals,
        }
    }
}

pub(crate) async fn score_handler(payload: Result<Json<ScoreRequest>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(request)) => {
            let resolution = resolve(request.formula_type, &request.signals);
            (StatusCode::OK, Json(ScoreResponse::from(resolution))).into_response()
        }
        Err(rejection) => {
            let payload = json!({
                "error": rejection.body_text(),
            });
            (rejection.status(), Json(payload)).into_response()
        }
    }
}

pub(crate) async fn formulas_handler() -> Json<Vec<FormulaInfo>> {
    Json(formula_catalog())
}
