pub mod recorder;
pub mod repository;

pub use recorder::{
    CheckoutError, CheckoutRecorder, DownloadDenial, DownloadGrant, DownloadOutcome,
    RecordedOutcome,
};
pub use repository::{
    CountOutcome, InsertOutcome, NotifyError, PurchaseReceipt, PurchaseRepository,
    ReceiptNotifier, StoreError, SubscriptionRecord,
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Download quota issued with every purchase.
pub const DEFAULT_MAX_DOWNLOADS: u32 = 5;
/// Days a download token stays redeemable.
pub const DOWNLOAD_WINDOW_DAYS: i64 = 7;

/// Verified payment-processor event, already checked against the webhook
/// signature by the edge deployment. Only the fields the recorder copies
/// are modeled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BillingEvent {
    #[serde(rename = "checkout.session.completed")]
    CheckoutCompleted(CheckoutSession),
    #[serde(rename = "customer.subscription.created")]
    SubscriptionCreated(SubscriptionState),
    #[serde(rename = "customer.subscription.updated")]
    SubscriptionUpdated(SubscriptionState),
    #[serde(rename = "customer.subscription.deleted")]
    SubscriptionDeleted(SubscriptionState),
    #[serde(rename = "invoice.payment_succeeded")]
    InvoicePaymentSucceeded(InvoiceState),
    #[serde(rename = "invoice.payment_failed")]
    InvoicePaymentFailed(InvoiceState),
}

/// Completed checkout session metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub email: String,
    pub product: String,
    #[serde(default)]
    pub amount_cents: Option<u64>,
}

/// Subscription lifecycle snapshot mirrored without derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionState {
    pub subscription_id: String,
    pub email: String,
    pub status: String,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
}

/// Invoice outcome tied to a subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceState {
    pub subscription_id: String,
    pub email: String,
    pub status: String,
}

/// Opaque identifier granting time- and count-limited deliverable access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadToken(pub String);

impl DownloadToken {
    pub fn issue() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

/// One row per completed checkout session, idempotent on `stripe_session_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub email: String,
    pub product: String,
    pub stripe_session_id: String,
    pub download_token: DownloadToken,
    pub download_count: u32,
    pub max_downloads: u32,
    pub expires_at: DateTime<Utc>,
}

impl Purchase {
    pub fn from_session(session: &CheckoutSession, now: DateTime<Utc>) -> Self {
        Self {
            email: session.email.clone(),
            product: session.product.clone(),
            stripe_session_id: session.session_id.clone(),
            download_token: DownloadToken::issue(),
            download_count: 0,
            max_downloads: DEFAULT_MAX_DOWNLOADS,
            expires_at: now + Duration::days(DOWNLOAD_WINDOW_DAYS),
        }
    }
}
