use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DownloadToken, Purchase};

/// Result of the atomic insert used for webhook idempotency. The store
/// keys on the session id with a conflict-ignore, so concurrent
/// deliveries of the same event collapse to a single row.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Purchase),
    AlreadyRecorded,
}

/// Result of the guarded download counter. The store checks the row's
/// quota and increments under one lock, so concurrent redemptions
/// cannot push `download_count` past `max_downloads`.
#[derive(Debug, Clone, PartialEq)]
pub enum CountOutcome {
    Counted(u32),
    QuotaExhausted { max_downloads: u32 },
}

/// Mirrored subscription status row, a direct field copy of the latest
/// lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub subscription_id: String,
    pub email: String,
    pub status: String,
    pub plan: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Storage abstraction over purchases and mirrored subscriptions.
pub trait PurchaseRepository: Send + Sync {
    /// Insert keyed on `stripe_session_id`; an existing row wins.
    fn insert_if_absent(&self, purchase: Purchase) -> Result<InsertOutcome, StoreError>;
    fn find_by_session(&self, session_id: &str) -> Result<Option<Purchase>, StoreError>;
    fn find_by_token(&self, token: &DownloadToken) -> Result<Option<Purchase>, StoreError>;
    /// Compare-and-increment on `download_count` against the row's quota.
    fn count_download(&self, token: &DownloadToken) -> Result<CountOutcome, StoreError>;
    fn upsert_subscription(&self, record: SubscriptionRecord) -> Result<(), StoreError>;
    fn subscription(&self, subscription_id: &str) -> Result<Option<SubscriptionRecord>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("purchase store unavailable: {0}")]
    Unavailable(String),
    #[error("purchase record not found")]
    NotFound,
}

/// Transactional email sent when a purchase row is first created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub template: String,
    pub email: String,
    pub product: String,
    pub download_token: DownloadToken,
    pub expires_at: DateTime<Utc>,
}

impl PurchaseReceipt {
    pub fn for_purchase(purchase: &Purchase) -> Self {
        Self {
            template: "purchase_receipt".to_string(),
            email: purchase.email.clone(),
            product: purchase.product.clone(),
            download_token: purchase.download_token.clone(),
            expires_at: purchase.expires_at,
        }
    }
}

/// Outbound transactional-email seam.
pub trait ReceiptNotifier: Send + Sync {
    fn send(&self, receipt: PurchaseReceipt) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("email transport unavailable: {0}")]
    Transport(String),
}
