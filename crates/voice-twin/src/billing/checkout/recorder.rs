use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::repository::{
    CountOutcome, InsertOutcome, NotifyError, PurchaseReceipt, PurchaseRepository,
    ReceiptNotifier, StoreError, SubscriptionRecord,
};
use super::{BillingEvent, DownloadToken, InvoiceState, Purchase, SubscriptionState};

/// Applies verified billing events to the purchase store.
///
/// Checkout completions are recorded exactly once per session id;
/// subscription lifecycle events are mirrored with a plain field copy.
pub struct CheckoutRecorder<R, N> {
    purchases: Arc<R>,
    notifier: Arc<N>,
}

/// What the recorder did with an event, for webhook acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordedOutcome {
    PurchaseRecorded,
    DuplicateIgnored,
    SubscriptionMirrored,
}

/// Error raised by the recorder; both variants are infrastructure
/// failures the webhook platform will retry.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl<R, N> CheckoutRecorder<R, N>
where
    R: PurchaseRepository + 'static,
    N: ReceiptNotifier + 'static,
{
    pub fn new(purchases: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            purchases,
            notifier,
        }
    }

    pub fn record(&self, event: BillingEvent) -> Result<RecordedOutcome, CheckoutError> {
        self.record_at(event, Utc::now())
    }

    pub fn record_at(
        &self,
        event: BillingEvent,
        now: DateTime<Utc>,
    ) -> Result<RecordedOutcome, CheckoutError> {
        match event {
            BillingEvent::CheckoutCompleted(session) => {
                let purchase = Purchase::from_session(&session, now);
                match self.purchases.insert_if_absent(purchase)? {
                    InsertOutcome::Inserted(stored) => {
                        self.notifier.send(PurchaseReceipt::for_purchase(&stored))?;
                        info!(session_id = %session.session_id, product = %stored.product, "purchase recorded");
                        Ok(RecordedOutcome::PurchaseRecorded)
                    }
                    InsertOutcome::AlreadyRecorded => {
                        info!(session_id = %session.session_id, "duplicate checkout event ignored");
                        Ok(RecordedOutcome::DuplicateIgnored)
                    }
                }
            }
            BillingEvent::SubscriptionCreated(state)
            | BillingEvent::SubscriptionUpdated(state)
            | BillingEvent::SubscriptionDeleted(state) => {
                self.mirror_subscription(state, now)?;
                Ok(RecordedOutcome::SubscriptionMirrored)
            }
            BillingEvent::InvoicePaymentSucceeded(invoice)
            | BillingEvent::InvoicePaymentFailed(invoice) => {
                self.mirror_invoice(invoice, now)?;
                Ok(RecordedOutcome::SubscriptionMirrored)
            }
        }
    }

    fn mirror_subscription(
        &self,
        state: SubscriptionState,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.purchases.upsert_subscription(SubscriptionRecord {
            subscription_id: state.subscription_id,
            email: state.email,
            status: state.status,
            plan: state.plan,
            current_period_end: state.current_period_end,
            updated_at: now,
        })
    }

    fn mirror_invoice(&self, invoice: InvoiceState, now: DateTime<Utc>) -> Result<(), StoreError> {
        // Invoice events carry no plan/period fields; keep whatever the
        // last subscription event wrote.
        let existing = self.purchases.subscription(&invoice.subscription_id)?;
        self.purchases.upsert_subscription(SubscriptionRecord {
            subscription_id: invoice.subscription_id,
            email: invoice.email,
            status: invoice.status,
            plan: existing.as_ref().and_then(|record| record.plan.clone()),
            current_period_end: existing.and_then(|record| record.current_period_end),
            updated_at: now,
        })
    }

    /// Redeem a download token, counting the download when the quota and
    /// expiry allow it. Denials are business rejections, not errors.
    pub fn redeem_download(
        &self,
        token: &DownloadToken,
        now: DateTime<Utc>,
    ) -> Result<DownloadOutcome, CheckoutError> {
        let purchase = match self.purchases.find_by_token(token)? {
            Some(purchase) => purchase,
            None => return Ok(DownloadOutcome::Denied(DownloadDenial::UnknownToken)),
        };

        if purchase.expires_at < now {
            return Ok(DownloadOutcome::Denied(DownloadDenial::Expired {
                expired_at: purchase.expires_at,
            }));
        }

        // Quota check and increment happen inside the store, under one
        // lock.
        match self.purchases.count_download(token)? {
            CountOutcome::QuotaExhausted { max_downloads } => Ok(DownloadOutcome::Denied(
                DownloadDenial::QuotaExhausted { max_downloads },
            )),
            CountOutcome::Counted(download_count) => Ok(DownloadOutcome::Granted(DownloadGrant {
                product: purchase.product,
                email: purchase.email,
                download_count,
                max_downloads: purchase.max_downloads,
                expires_at: purchase.expires_at,
            })),
        }
    }

    pub fn purchase_for_session(&self, session_id: &str) -> Result<Option<Purchase>, CheckoutError> {
        Ok(self.purchases.find_by_session(session_id)?)
    }
}

/// Outcome of a download-token redemption.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DownloadOutcome {
    Granted(DownloadGrant),
    Denied(DownloadDenial),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadGrant {
    pub product: String,
    pub email: String,
    pub download_count: u32,
    pub max_downloads: u32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DownloadDenial {
    UnknownToken,
    Expired { expired_at: DateTime<Utc> },
    QuotaExhausted { max_downloads: u32 },
}

impl DownloadDenial {
    pub fn user_message(&self) -> String {
        match self {
            DownloadDenial::UnknownToken => "Unknown download link".to_string(),
            DownloadDenial::Expired { expired_at } => format!(
                "This download link expired on {}",
                expired_at.format("%Y-%m-%d")
            ),
            DownloadDenial::QuotaExhausted { max_downloads } => format!(
                "This download link has reached its limit of {max_downloads} downloads"
            ),
        }
    }
}
