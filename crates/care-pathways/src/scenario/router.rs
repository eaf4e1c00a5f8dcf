use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ScenarioEngine, ScenarioParameters, ScenarioResults, ValidationError};
use crate::workbook::ScenarioWorkbookImporter;

/// Router builder exposing HTTP endpoints for scenario runs and exports.
pub fn scenario_router(engine: Arc<ScenarioEngine>) -> Router {
    Router::new()
        .route("/api/v1/scenarios/results", post(results_handler))
        .route("/api/v1/scenarios/rscript", post(rscript_handler))
        .route("/api/v1/scenarios/workbook", post(workbook_handler))
        .with_state(engine)
}

#[derive(Debug, Deserialize)]
pub struct ScenarioRunRequest {
    #[serde(default = "default_scenario_name")]
    pub name: String,
    pub parameters: ScenarioParameters,
}

#[derive(Debug, Serialize)]
pub struct ScenarioRunResponse {
    pub name: String,
    pub results: ScenarioResults,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioScriptRequest {
    #[serde(default = "default_scenario_name")]
    pub name: String,
    /// Date stamped into the script header; defaults to today.
    #[serde(default)]
    pub generated_on: Option<NaiveDate>,
    pub parameters: ScenarioParameters,
}

#[derive(Debug, Deserialize)]
pub struct WorkbookRunRequest {
    pub workbook_csv: String,
}

#[derive(Debug, Serialize)]
pub struct WorkbookRunResponse {
    pub scenarios: Vec<ScenarioRunResponse>,
    pub skipped: Vec<SkippedScenarioView>,
    pub failed: Vec<FailedScenarioView>,
}

#[derive(Debug, Serialize)]
pub struct SkippedScenarioView {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct FailedScenarioView {
    pub name: String,
    pub error: String,
}

fn default_scenario_name() -> String {
    "scenario".to_string()
}

pub(crate) async fn results_handler(
    State(engine): State<Arc<ScenarioEngine>>,
    axum::Json(request): axum::Json<ScenarioRunRequest>,
) -> Response {
    match engine.run(&request.parameters) {
        Ok(results) => {
            let view = ScenarioRunResponse {
                name: request.name,
                results,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => rejection(&request.name, &error),
    }
}

pub(crate) async fn rscript_handler(
    State(engine): State<Arc<ScenarioEngine>>,
    axum::Json(request): axum::Json<ScenarioScriptRequest>,
) -> Response {
    let generated_on = request
        .generated_on
        .unwrap_or_else(|| Local::now().date_naive());
    match engine.rscript(&request.name, generated_on, &request.parameters) {
        Ok(script) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            script,
        )
            .into_response(),
        Err(error) => rejection(&request.name, &error),
    }
}

pub(crate) async fn workbook_handler(
    State(engine): State<Arc<ScenarioEngine>>,
    axum::Json(request): axum::Json<WorkbookRunRequest>,
) -> Response {
    let workbook = match ScenarioWorkbookImporter::from_reader(request.workbook_csv.as_bytes()) {
        Ok(workbook) => workbook,
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let mut scenarios = Vec::new();
    let mut failed = Vec::new();
    for scenario in workbook.scenarios {
        match engine.run(&scenario.parameters) {
            Ok(results) => scenarios.push(ScenarioRunResponse {
                name: scenario.name,
                results,
            }),
            Err(error) => failed.push(FailedScenarioView {
                name: scenario.name,
                error: error.to_string(),
            }),
        }
    }
    let skipped = workbook
        .skipped
        .into_iter()
        .map(|scenario| SkippedScenarioView {
            name: scenario.name,
            reason: scenario.reason.to_string(),
        })
        .collect();

    let view = WorkbookRunResponse {
        scenarios,
        skipped,
        failed,
    };
    (StatusCode::OK, axum::Json(view)).into_response()
}

fn rejection(name: &str, error: &ValidationError) -> Response {
    let payload = json!({
        "scenario": name,
        "error": error.to_string(),
    });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}
