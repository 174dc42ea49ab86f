use crate::auth::require_session;
use crate::infra::{AppState, SessionStore};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use voice_twin::billing::checkout::{
    BillingEvent, CheckoutRecorder, DownloadDenial, DownloadOutcome, DownloadToken,
    PurchaseRepository, ReceiptNotifier,
};
use voice_twin::billing::discount::{DiscountCatalog, DiscountService, DiscountVerdict};
use voice_twin::leads::{leads_router, LeadIntake, LeadRepository};
use voice_twin::support::{support_router, SupportService, TicketRepository};
use voice_twin::transcription::{
    CheckoutGateway, TranscribeOutcome, TranscriptionProvider, TranscriptionService,
    UploadDescriptor,
};

/// Shared state for the transcribe endpoint: the service itself plus the
/// recorder used to check whether a checkout session settled.
pub(crate) struct TranscribeState<G, P, R, N> {
    transcription: Arc<TranscriptionService<G, P>>,
    recorder: Arc<CheckoutRecorder<R, N>>,
}

impl<G, P, R, N> Clone for TranscribeState<G, P, R, N> {
    fn clone(&self) -> Self {
        Self {
            transcription: self.transcription.clone(),
            recorder: self.recorder.clone(),
        }
    }
}

/// Assemble the full application router. Ticket and transcribe routes sit
/// behind the session layer; everything else is public.
pub(crate) fn api_router<C, R, N, G, P, T, L>(
    discount: Arc<DiscountService<C>>,
    recorder: Arc<CheckoutRecorder<R, N>>,
    transcription: Arc<TranscriptionService<G, P>>,
    support: Arc<SupportService<T>>,
    intake: Arc<LeadIntake<L>>,
    sessions: Arc<dyn SessionStore>,
) -> Router
where
    C: DiscountCatalog + 'static,
    R: PurchaseRepository + 'static,
    N: ReceiptNotifier + 'static,
    G: CheckoutGateway + 'static,
    P: TranscriptionProvider + 'static,
    T: TicketRepository + 'static,
    L: LeadRepository + 'static,
{
    let transcribe_state = TranscribeState {
        transcription,
        recorder: recorder.clone(),
    };

    let authed = Router::new()
        .route(
            "/api/v1/transcribe",
            post(transcribe_endpoint::<G, P, R, N>),
        )
        .with_state(transcribe_state)
        .merge(support_router(support))
        .layer(middleware::from_fn_with_state(sessions, require_session));

    let discount_routes = Router::new()
        .route("/api/v1/discount/validate", post(validate_discount::<C>))
        .with_state(discount);

    let billing_routes = Router::new()
        .route("/api/v1/webhooks/stripe", post(stripe_webhook::<R, N>))
        .route("/api/v1/downloads/:token", get(redeem_download::<R, N>))
        .with_state(recorder);

    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .merge(discount_routes)
        .merge(billing_routes)
        .merge(leads_router(intake))
        .merge(authed)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiscountValidateRequest {
    code: String,
    amount_cents: u64,
    #[serde(default)]
    product: Option<String>,
}

pub(crate) async fn validate_discount<C>(
    State(discount): State<Arc<DiscountService<C>>>,
    Json(request): Json<DiscountValidateRequest>,
) -> Response
where
    C: DiscountCatalog + 'static,
{
    if request.code.trim().is_empty() {
        let payload = json!({ "error": "code is required" });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    match discount.validate(&request.code, request.amount_cents, request.product.as_deref()) {
        Ok(DiscountVerdict::Valid(quote)) => {
            let payload = json!({
                "valid": true,
                "code": quote.code,
                "discount_type": quote.discount_type,
                "discount_value": quote.discount_value,
                "original_amount_cents": quote.original_amount_cents,
                "discount_amount_cents": quote.discount_amount_cents,
                "final_amount_cents": quote.final_amount_cents,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(DiscountVerdict::Invalid(rejection)) => {
            let payload = json!({ "valid": false, "error": rejection.user_message() });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => infra_failure("discount catalog lookup failed", error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranscribeRequest {
    file_name: String,
    mime_type: String,
    size_bytes: u64,
    duration_seconds: u32,
    /// Checkout session presented as proof of payment, if any.
    #[serde(default)]
    checkout_session_id: Option<String>,
}

pub(crate) async fn transcribe_endpoint<G, P, R, N>(
    State(state): State<TranscribeState<G, P, R, N>>,
    Json(request): Json<TranscribeRequest>,
) -> Response
where
    G: CheckoutGateway + 'static,
    P: TranscriptionProvider + 'static,
    R: PurchaseRepository + 'static,
    N: ReceiptNotifier + 'static,
{
    if request.file_name.trim().is_empty() {
        let payload = json!({ "error": "file_name is required" });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    let payment_confirmed = match &request.checkout_session_id {
        Some(session_id) => match state.recorder.purchase_for_session(session_id) {
            Ok(purchase) => purchase.is_some(),
            Err(error) => return infra_failure("purchase lookup failed", error),
        },
        None => false,
    };

    let upload = UploadDescriptor {
        file_name: request.file_name,
        mime_type: request.mime_type,
        size_bytes: request.size_bytes,
        duration_seconds: request.duration_seconds,
    };

    match state.transcription.handle(&upload, payment_confirmed) {
        Ok(TranscribeOutcome::Rejected(rejection)) => {
            let payload = json!({ "status": "rejected", "error": rejection.user_message() });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => infra_failure("transcription failed", error),
    }
}

pub(crate) async fn stripe_webhook<R, N>(
    State(recorder): State<Arc<CheckoutRecorder<R, N>>>,
    Json(event): Json<BillingEvent>,
) -> Response
where
    R: PurchaseRepository + 'static,
    N: ReceiptNotifier + 'static,
{
    match recorder.record(event) {
        Ok(outcome) => {
            let payload = json!({ "received": true, "outcome": outcome });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => infra_failure("billing event not recorded", error),
    }
}

pub(crate) async fn redeem_download<R, N>(
    State(recorder): State<Arc<CheckoutRecorder<R, N>>>,
    Path(token): Path<String>,
) -> Response
where
    R: PurchaseRepository + 'static,
    N: ReceiptNotifier + 'static,
{
    match recorder.redeem_download(&DownloadToken(token), Utc::now()) {
        Ok(DownloadOutcome::Granted(grant)) => (StatusCode::OK, Json(grant)).into_response(),
        Ok(DownloadOutcome::Denied(DownloadDenial::UnknownToken)) => {
            let payload = json!({ "error": DownloadDenial::UnknownToken.user_message() });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        // Expired or over quota: the link exists, the business condition failed.
        Ok(DownloadOutcome::Denied(denial)) => {
            let payload = json!({ "error": denial.user_message() });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => infra_failure("download redemption failed", error),
    }
}

fn infra_failure(context: &'static str, error: impl std::fmt::Display) -> Response {
    tracing::error!(error = %error, context, "request failed");
    let payload = json!({ "error": "internal error" });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SESSION_HEADER;
    use crate::infra::{
        seeded_discount_catalog, InMemoryCheckoutGateway, InMemoryIntake, InMemorySessions,
        InMemoryPurchases, InMemoryTickets, InMemoryTranscriber, LoggingReceipts,
    };
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use voice_twin::config::TranscriptionPricingConfig;

    struct TestApp {
        router: Router,
        receipts: Arc<LoggingReceipts>,
    }

    fn build_app() -> TestApp {
        let discount = Arc::new(DiscountService::new(Arc::new(seeded_discount_catalog())));
        let purchases = Arc::new(InMemoryPurchases::default());
        let receipts = Arc::new(LoggingReceipts::default());
        let recorder = Arc::new(CheckoutRecorder::new(purchases, receipts.clone()));
        let transcription = Arc::new(TranscriptionService::new(
            Arc::new(InMemoryCheckoutGateway::default()),
            Arc::new(InMemoryTranscriber),
            TranscriptionPricingConfig {
                per_minute_cents: 15,
                minimum_cents: 500,
            },
        ));
        let support = Arc::new(SupportService::new(Arc::new(InMemoryTickets::default())));
        let intake = Arc::new(LeadIntake::new(Arc::new(InMemoryIntake::default())));
        let sessions = InMemorySessions::default();
        sessions.grant("tok-1", "user-1");

        let router = api_router(
            discount,
            recorder,
            transcription,
            support,
            intake,
            Arc::new(sessions) as Arc<dyn SessionStore>,
        );

        TestApp { router, receipts }
    }

    fn post_json(uri: &str, payload: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap()
    }

    fn post_json_with_session(uri: &str, payload: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(SESSION_HEADER, "tok-1")
            .body(Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap()
    }

    async fn read_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn discount_validate_quotes_a_percentage_code() {
        let app = build_app();

        let response = app
            .router
            .oneshot(post_json(
                "/api/v1/discount/validate",
                json!({ "code": "welcome10", "amount_cents": 9_900 }),
            ))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["valid"], true);
        assert_eq!(payload["discount_amount_cents"], 990);
        assert_eq!(payload["final_amount_cents"], 8_910);
    }

    #[tokio::test]
    async fn unknown_discount_code_is_a_200_with_valid_false() {
        let app = build_app();

        let response = app
            .router
            .oneshot(post_json(
                "/api/v1/discount/validate",
                json!({ "code": "NOPE", "amount_cents": 9_900 }),
            ))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["valid"], false);
        assert_eq!(payload["error"], "Invalid discount code");
    }

    #[tokio::test]
    async fn webhook_replay_keeps_one_purchase_and_the_token_downloads() {
        let app = build_app();
        let event = json!({
            "type": "checkout.session.completed",
            "session_id": "cs_test_1",
            "email": "buyer@example.com",
            "product": "voice-twin-pro",
            "amount_cents": 24_900,
        });

        let first = app
            .router
            .clone()
            .oneshot(post_json("/api/v1/webhooks/stripe", event.clone()))
            .await
            .expect("route executes");
        assert_eq!(read_json(first).await["outcome"], "purchase_recorded");

        let second = app
            .router
            .clone()
            .oneshot(post_json("/api/v1/webhooks/stripe", event))
            .await
            .expect("route executes");
        assert_eq!(read_json(second).await["outcome"], "duplicate_ignored");

        let receipts = app.receipts.sent();
        assert_eq!(receipts.len(), 1, "one receipt for one purchase row");

        let token = receipts[0].download_token.0.clone();
        let download = app
            .router
            .oneshot(
                Request::get(format!("/api/v1/downloads/{token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(download.status(), StatusCode::OK);
        let payload = read_json(download).await;
        assert_eq!(payload["download_count"], 1);
        assert_eq!(payload["product"], "voice-twin-pro");
    }

    #[tokio::test]
    async fn unknown_download_token_is_a_404() {
        let app = build_app();

        let response = app
            .router
            .oneshot(
                Request::get("/api/v1/downloads/not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transcribe_without_a_session_is_a_401() {
        let app = build_app();

        let response = app
            .router
            .oneshot(post_json(
                "/api/v1/transcribe",
                json!({
                    "file_name": "standup.mp3",
                    "mime_type": "audio/mpeg",
                    "size_bytes": 1_024,
                    "duration_seconds": 120,
                }),
            ))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unpaid_transcribe_returns_a_checkout_url() {
        let app = build_app();

        let response = app
            .router
            .oneshot(post_json_with_session(
                "/api/v1/transcribe",
                json!({
                    "file_name": "standup.mp3",
                    "mime_type": "audio/mpeg",
                    "size_bytes": 1_024,
                    "duration_seconds": 40 * 60,
                }),
            ))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["status"], "payment_required");
        assert_eq!(payload["amount_cents"], 600);
        assert!(payload["checkout_url"].as_str().unwrap().starts_with("https://"));
    }

    #[tokio::test]
    async fn paid_transcribe_returns_the_transcript() {
        let app = build_app();

        let webhook = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/v1/webhooks/stripe",
                json!({
                    "type": "checkout.session.completed",
                    "session_id": "cs_paid",
                    "email": "buyer@example.com",
                    "product": "transcription",
                }),
            ))
            .await
            .expect("route executes");
        assert_eq!(webhook.status(), StatusCode::OK);

        let response = app
            .router
            .oneshot(post_json_with_session(
                "/api/v1/transcribe",
                json!({
                    "file_name": "standup.mp3",
                    "mime_type": "audio/mpeg",
                    "size_bytes": 1_024,
                    "duration_seconds": 120,
                    "checkout_session_id": "cs_paid",
                }),
            ))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["status"], "transcribed");
        assert_eq!(payload["text"], "[transcript of standup.mp3]");
    }

    #[tokio::test]
    async fn rejected_upload_is_a_200_with_an_error() {
        let app = build_app();

        let response = app
            .router
            .oneshot(post_json_with_session(
                "/api/v1/transcribe",
                json!({
                    "file_name": "slides.pdf",
                    "mime_type": "application/pdf",
                    "size_bytes": 1_024,
                    "duration_seconds": 60,
                }),
            ))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["status"], "rejected");
        assert!(payload["error"].as_str().unwrap().contains("Unsupported"));
    }

    #[tokio::test]
    async fn support_routes_require_a_session() {
        let app = build_app();

        let missing = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/v1/support/tickets",
                json!({ "subject": "S", "body": "B" }),
            ))
            .await
            .expect("route executes");
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let created = app
            .router
            .oneshot(post_json_with_session(
                "/api/v1/support/tickets",
                json!({ "subject": "S", "body": "B" }),
            ))
            .await
            .expect("route executes");
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(read_json(created).await["requester"], "user-1");
    }

    #[tokio::test]
    async fn lead_capture_is_public() {
        let app = build_app();

        let response = app
            .router
            .oneshot(post_json(
                "/api/v1/leads",
                json!({ "email": "reader@example.com" }),
            ))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
