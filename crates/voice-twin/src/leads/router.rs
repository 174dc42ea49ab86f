use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::repository::LeadRepository;
use super::service::{IntakeError, LeadIntake};

#[derive(Debug, Deserialize)]
pub(crate) struct LeadRequest {
    email: String,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AffiliateRequest {
    name: String,
    email: String,
    channel: String,
    #[serde(default)]
    audience_size: Option<u64>,
}

/// Router builder for the unauthenticated intake endpoints.
pub fn leads_router<R>(intake: Arc<LeadIntake<R>>) -> Router
where
    R: LeadRepository + 'static,
{
    Router::new()
        .route("/api/v1/leads", post(lead_handler::<R>))
        .route("/api/v1/affiliates", post(affiliate_handler::<R>))
        .with_state(intake)
}

pub(crate) async fn lead_handler<R>(
    State(intake): State<Arc<LeadIntake<R>>>,
    Json(request): Json<LeadRequest>,
) -> Response
where
    R: LeadRepository + 'static,
{
    match intake.capture_lead(request.email, request.source, Utc::now()) {
        Ok(lead) => (StatusCode::ACCEPTED, Json(lead)).into_response(),
        Err(error) => intake_failure(error),
    }
}

pub(crate) async fn affiliate_handler<R>(
    State(intake): State<Arc<LeadIntake<R>>>,
    Json(request): Json<AffiliateRequest>,
) -> Response
where
    R: LeadRepository + 'static,
{
    match intake.apply_affiliate(
        request.name,
        request.email,
        request.channel,
        request.audience_size,
        Utc::now(),
    ) {
        Ok(application) => (StatusCode::ACCEPTED, Json(application)).into_response(),
        Err(error) => intake_failure(error),
    }
}

fn intake_failure(error: IntakeError) -> Response {
    match error {
        // Shape failures are malformed input, not business rejections.
        IntakeError::Rejected(rejection) => {
            let payload = json!({ "error": rejection.to_string() });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        IntakeError::Store(store) => {
            tracing::error!(error = %store, "intake store failure");
            let payload = json!({ "error": "internal error" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
