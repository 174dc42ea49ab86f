use crate::infra::SessionStore;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use voice_twin::support::AuthenticatedUser;

pub(crate) const SESSION_HEADER: &str = "x-session-token";

/// Resolves the session token header and stashes the owning user as a
/// request extension. Requests without a known session stop here.
pub(crate) async fn require_session(
    State(sessions): State<Arc<dyn SessionStore>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|token| sessions.user_for(token));

    match user {
        Some(user) => {
            request.extensions_mut().insert(AuthenticatedUser(user));
            next.run(request).await
        }
        None => {
            let payload = json!({ "error": "a valid session is required" });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        }
    }
}
