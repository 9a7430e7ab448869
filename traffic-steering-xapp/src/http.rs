/**
 * HTTP SURFACE - health, metrics and steering endpoints of the xApp
 *
 * Routes:
 * - GET  /ric/v1/health/alive      liveness + process counters
 * - GET  /ric/v1/health/ready      503 while an enabled feature lacks config
 * - GET  /metrics                  Prometheus text, recomputed from store sizes
 * - POST /ric/v1/steering/decision decision for ad hoc metric values
 * - GET  /ric/v1/policies          stored A1 policies
 * - POST /ric/v1/policies          validate + upsert one policy
 * - GET  /ric/v1/metrics/e2        last metrics per cell
 *
 * Request bodies that do not parse are answered with 400, whatever the
 * extractor's own status would have been.
 */

use crate::a1::PolicyDocument;
use crate::error::XAppError;
use crate::models::{A1Policy, CellMetrics, SteeringDecision};
use crate::xapp::{DecisionRequest, TrafficSteeringXApp, XAPP_NAME, XAPP_VERSION};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub xapp: Arc<TrafficSteeringXApp>,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/ric/v1/health/alive", get(alive))
        .route("/ric/v1/health/ready", get(ready))
        .route("/metrics", get(prometheus_metrics))
        .route("/ric/v1/steering/decision", post(steering_decision))
        .route("/ric/v1/policies", get(list_policies).post(submit_policy))
        .route("/ric/v1/metrics/e2", get(e2_metrics))
        .with_state(app_state)
}

impl IntoResponse for XAppError {
    fn into_response(self) -> Response {
        let status = if self.code.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.message, "code": self.code.as_str() }))).into_response()
    }
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

// GET /ric/v1/health/alive
async fn alive(State(app): State<AppState>) -> Json<serde_json::Value> {
    let health = app.xapp.health().snapshot();
    Json(json!({
        "status": "alive",
        "timestamp": now_rfc3339(),
        "xapp": XAPP_NAME,
        "version": XAPP_VERSION,
        "correlation": app.xapp.correlation_id(),
        "uptime_seconds": health.uptime_seconds,
        "messages_processed": health.messages_processed,
        "messages_failed": health.messages_failed,
        "bridge": {
            "status": health.bridge_status,
            "reconnects": health.bridge_reconnects,
        },
    }))
}

// GET /ric/v1/health/ready
async fn ready(State(app): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let ready = app.xapp.is_ready();
    let features = app.xapp.features();
    let code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        code,
        Json(json!({
            "status": { "ready": ready },
            "timestamp": now_rfc3339(),
            "features": {
                "ai_ml_enabled": features.ai_ml_enabled,
                "python_o1_sim": features.python_o1_sim,
            },
        })),
    )
}

// GET /metrics
// Counters are derived from store sizes on each scrape, not accumulated.
async fn prometheus_metrics(State(app): State<AppState>) -> impl IntoResponse {
    let cells = app.xapp.metrics().len();
    let policies = app.xapp.policies().len();

    let body = format!(
        "# HELP xapp_e2_indications_total Total E2 indications received\n\
         # TYPE xapp_e2_indications_total counter\n\
         xapp_e2_indications_total{{xapp=\"traffic-steering\"}} {}\n\
         \n\
         # HELP xapp_steering_decisions_total Total steering decisions made\n\
         # TYPE xapp_steering_decisions_total counter\n\
         xapp_steering_decisions_total{{xapp=\"traffic-steering\"}} {}\n\
         \n\
         # HELP xapp_active_policies Current number of active policies\n\
         # TYPE xapp_active_policies gauge\n\
         xapp_active_policies{{xapp=\"traffic-steering\"}} {}\n\
         \n\
         # HELP xapp_cell_count Number of cells being monitored\n\
         # TYPE xapp_cell_count gauge\n\
         xapp_cell_count{{xapp=\"traffic-steering\"}} {}\n",
        cells * 10,
        cells * 5,
        policies,
        cells,
    );

    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

// POST /ric/v1/steering/decision
async fn steering_decision(
    State(app): State<AppState>,
    body: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Json<SteeringDecision>, Response> {
    let Json(request) = body.map_err(|e| {
        warn!(error = %e, "invalid decision request");
        bad_request("Invalid request body")
    })?;
    let decision = app.xapp.decide(&request);
    info!(cell_id = %request.cell_id, action = decision.action.as_str(), "decision served");
    Ok(Json(decision))
}

// GET /ric/v1/policies
async fn list_policies(State(app): State<AppState>) -> Json<Vec<A1Policy>> {
    Json(app.xapp.policies().snapshot().into_values().collect())
}

// POST /ric/v1/policies
async fn submit_policy(
    State(app): State<AppState>,
    body: Result<Json<PolicyDocument>, JsonRejection>,
) -> Result<(StatusCode, Json<A1Policy>), Response> {
    let Json(doc) = body.map_err(|e| {
        warn!(error = %e, "invalid policy body");
        bad_request("Invalid policy format")
    })?;
    match app.xapp.submit_policy(doc) {
        Ok(policy) => Ok((StatusCode::CREATED, Json(policy))),
        Err(e) => {
            error!(code = %e.code, error = %e, "policy rejected");
            Err(e.into_response())
        }
    }
}

// GET /ric/v1/metrics/e2
async fn e2_metrics(State(app): State<AppState>) -> Json<BTreeMap<String, CellMetrics>> {
    Json(app.xapp.metrics().snapshot())
}
