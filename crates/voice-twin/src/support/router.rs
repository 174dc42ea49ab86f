use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{TicketId, TicketPatch};
use super::repository::{TicketRepository, TicketStoreError};
use super::service::{MessageOutcome, SupportService};

/// Identity of the session owner, inserted by the service crate's auth
/// layer after the session token is verified.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

#[derive(Debug, Deserialize)]
pub(crate) struct OpenTicketRequest {
    subject: String,
    body: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddMessageRequest {
    body: String,
}

/// Router builder for the ticket endpoints. Auth is layered on by the
/// service crate; handlers assume `AuthenticatedUser` is present.
pub fn support_router<R>(service: Arc<SupportService<R>>) -> Router
where
    R: TicketRepository + 'static,
{
    Router::new()
        .route("/api/v1/support/tickets", post(open_handler::<R>))
        .route(
            "/api/v1/support/tickets/:ticket_id",
            get(get_handler::<R>).patch(patch_handler::<R>),
        )
        .route(
            "/api/v1/support/tickets/:ticket_id/messages",
            post(add_message_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn open_handler<R>(
    State(service): State<Arc<SupportService<R>>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<OpenTicketRequest>,
) -> Response
where
    R: TicketRepository + 'static,
{
    if request.subject.trim().is_empty() || request.body.trim().is_empty() {
        let payload = json!({ "error": "subject and body are required" });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    match service.open(user.0, request.subject, request.body, Utc::now()) {
        Ok(ticket) => (StatusCode::CREATED, Json(ticket)).into_response(),
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<SupportService<R>>>,
    Path(ticket_id): Path<String>,
) -> Response
where
    R: TicketRepository + 'static,
{
    match service.get(&TicketId(ticket_id)) {
        Ok(Some(ticket)) => (StatusCode::OK, Json(ticket)).into_response(),
        Ok(None) => not_found(),
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn patch_handler<R>(
    State(service): State<Arc<SupportService<R>>>,
    Path(ticket_id): Path<String>,
    Json(patch): Json<TicketPatch>,
) -> Response
where
    R: TicketRepository + 'static,
{
    if patch.is_empty() {
        let payload = json!({ "error": "nothing to update" });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    match service.patch(&TicketId(ticket_id), patch, Utc::now()) {
        Ok(Some(ticket)) => (StatusCode::OK, Json(ticket)).into_response(),
        Ok(None) => not_found(),
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn add_message_handler<R>(
    State(service): State<Arc<SupportService<R>>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(ticket_id): Path<String>,
    Json(request): Json<AddMessageRequest>,
) -> Response
where
    R: TicketRepository + 'static,
{
    if request.body.trim().is_empty() {
        let payload = json!({ "error": "message body is required" });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    match service.add_message(&TicketId(ticket_id), user.0, request.body, Utc::now()) {
        Ok(MessageOutcome::Appended(ticket)) => (StatusCode::OK, Json(ticket)).into_response(),
        // Well-formed request, failed business condition: still a 200.
        Ok(MessageOutcome::TicketClosed) => {
            let payload = json!({ "error": "closed tickets do not accept new messages" });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(MessageOutcome::NotFound) => not_found(),
        Err(error) => store_failure(error),
    }
}

fn not_found() -> Response {
    let payload = json!({ "error": "ticket not found" });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

fn store_failure(error: TicketStoreError) -> Response {
    tracing::error!(error = %error, "ticket store failure");
    let payload = json!({ "error": "internal error" });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
