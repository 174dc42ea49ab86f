use chrono::{TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use voice_twin::billing::checkout::{
    CountOutcome, DownloadToken, InsertOutcome, NotifyError, Purchase, PurchaseReceipt,
    PurchaseRepository, ReceiptNotifier, StoreError, SubscriptionRecord,
};
use voice_twin::billing::discount::{normalize_code, CatalogError, DiscountCatalog, DiscountCode, DiscountType};
use voice_twin::leads::{AffiliateApplication, IntakeStoreError, Lead, LeadRepository};
use voice_twin::support::{Ticket, TicketId, TicketRepository, TicketStoreError};
use voice_twin::transcription::{
    CheckoutGateway, GatewayError, ProviderError, Transcript, TranscriptionProvider,
    UploadDescriptor,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Session-token lookup backing the auth layer.
pub(crate) trait SessionStore: Send + Sync {
    fn user_for(&self, token: &str) -> Option<String>;
}

#[derive(Default)]
pub(crate) struct InMemorySessions {
    sessions: Mutex<HashMap<String, String>>,
}

impl InMemorySessions {
    pub(crate) fn grant(&self, token: &str, user: &str) {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        guard.insert(token.to_string(), user.to_string());
    }
}

impl SessionStore for InMemorySessions {
    fn user_for(&self, token: &str) -> Option<String> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        guard.get(token).cloned()
    }
}

#[derive(Default)]
pub(crate) struct InMemoryDiscountCatalog {
    codes: Mutex<HashMap<String, DiscountCode>>,
}

impl InMemoryDiscountCatalog {
    pub(crate) fn with_codes(codes: Vec<DiscountCode>) -> Self {
        let keyed = codes
            .into_iter()
            .map(|code| (normalize_code(&code.code), code))
            .collect();
        Self {
            codes: Mutex::new(keyed),
        }
    }
}

impl DiscountCatalog for InMemoryDiscountCatalog {
    fn find(&self, normalized_code: &str) -> Result<Option<DiscountCode>, CatalogError> {
        let guard = self.codes.lock().expect("catalog mutex poisoned");
        Ok(guard.get(normalized_code).cloned())
    }

    fn record_redemption(&self, normalized_code: &str) -> Result<(), CatalogError> {
        let mut guard = self.codes.lock().expect("catalog mutex poisoned");
        if let Some(row) = guard.get_mut(normalized_code) {
            row.current_uses += 1;
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryPurchases {
    purchases: Mutex<HashMap<String, Purchase>>,
    subscriptions: Mutex<HashMap<String, SubscriptionRecord>>,
}

impl PurchaseRepository for InMemoryPurchases {
    fn insert_if_absent(&self, purchase: Purchase) -> Result<InsertOutcome, StoreError> {
        let mut guard = self.purchases.lock().expect("purchase mutex poisoned");
        if guard.contains_key(&purchase.stripe_session_id) {
            return Ok(InsertOutcome::AlreadyRecorded);
        }
        guard.insert(purchase.stripe_session_id.clone(), purchase.clone());
        Ok(InsertOutcome::Inserted(purchase))
    }

    fn find_by_session(&self, session_id: &str) -> Result<Option<Purchase>, StoreError> {
        let guard = self.purchases.lock().expect("purchase mutex poisoned");
        Ok(guard.get(session_id).cloned())
    }

    fn find_by_token(&self, token: &DownloadToken) -> Result<Option<Purchase>, StoreError> {
        let guard = self.purchases.lock().expect("purchase mutex poisoned");
        Ok(guard
            .values()
            .find(|purchase| &purchase.download_token == token)
            .cloned())
    }

    fn count_download(&self, token: &DownloadToken) -> Result<CountOutcome, StoreError> {
        let mut guard = self.purchases.lock().expect("purchase mutex poisoned");
        let purchase = guard
            .values_mut()
            .find(|purchase| &purchase.download_token == token)
            .ok_or(StoreError::NotFound)?;
        if purchase.download_count >= purchase.max_downloads {
            return Ok(CountOutcome::QuotaExhausted {
                max_downloads: purchase.max_downloads,
            });
        }
        purchase.download_count += 1;
        Ok(CountOutcome::Counted(purchase.download_count))
    }

    fn upsert_subscription(&self, record: SubscriptionRecord) -> Result<(), StoreError> {
        let mut guard = self.subscriptions.lock().expect("subscription mutex poisoned");
        guard.insert(record.subscription_id.clone(), record);
        Ok(())
    }

    fn subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let guard = self.subscriptions.lock().expect("subscription mutex poisoned");
        Ok(guard.get(subscription_id).cloned())
    }
}

/// Records receipts and logs them instead of talking to an email vendor.
#[derive(Default)]
pub(crate) struct LoggingReceipts {
    sent: Mutex<Vec<PurchaseReceipt>>,
}

#[cfg(test)]
impl LoggingReceipts {
    pub(crate) fn sent(&self) -> Vec<PurchaseReceipt> {
        self.sent.lock().expect("receipt mutex poisoned").clone()
    }
}

impl ReceiptNotifier for LoggingReceipts {
    fn send(&self, receipt: PurchaseReceipt) -> Result<(), NotifyError> {
        tracing::info!(email = %receipt.email, template = %receipt.template, "receipt queued");
        let mut guard = self.sent.lock().expect("receipt mutex poisoned");
        guard.push(receipt);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryTickets {
    rows: Mutex<HashMap<TicketId, Ticket>>,
}

impl TicketRepository for InMemoryTickets {
    fn insert(&self, ticket: Ticket) -> Result<Ticket, TicketStoreError> {
        let mut guard = self.rows.lock().expect("ticket mutex poisoned");
        guard.insert(ticket.id.clone(), ticket.clone());
        Ok(ticket)
    }

    fn update(&self, ticket: Ticket) -> Result<(), TicketStoreError> {
        let mut guard = self.rows.lock().expect("ticket mutex poisoned");
        if !guard.contains_key(&ticket.id) {
            return Err(TicketStoreError::NotFound);
        }
        guard.insert(ticket.id.clone(), ticket);
        Ok(())
    }

    fn fetch(&self, id: &TicketId) -> Result<Option<Ticket>, TicketStoreError> {
        let guard = self.rows.lock().expect("ticket mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryIntake {
    leads: Mutex<Vec<Lead>>,
    applications: Mutex<Vec<AffiliateApplication>>,
}

impl LeadRepository for InMemoryIntake {
    fn insert_lead(&self, lead: Lead) -> Result<(), IntakeStoreError> {
        self.leads.lock().expect("lead mutex poisoned").push(lead);
        Ok(())
    }

    fn insert_application(
        &self,
        application: AffiliateApplication,
    ) -> Result<AffiliateApplication, IntakeStoreError> {
        self.applications
            .lock()
            .expect("application mutex poisoned")
            .push(application.clone());
        Ok(application)
    }
}

/// Hands out deterministic hosted-checkout URLs in place of the payment
/// processor.
#[derive(Default)]
pub(crate) struct InMemoryCheckoutGateway {
    counter: AtomicU64,
}

impl CheckoutGateway for InMemoryCheckoutGateway {
    fn create_session(
        &self,
        amount_cents: u64,
        description: &str,
    ) -> Result<String, GatewayError> {
        let id = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(amount_cents, description, "checkout session created");
        Ok(format!(
            "https://checkout.example.test/pay/cs_{id}?amount={amount_cents}"
        ))
    }
}

/// Stands in for the speech-to-text vendor.
#[derive(Default)]
pub(crate) struct InMemoryTranscriber;

impl TranscriptionProvider for InMemoryTranscriber {
    fn transcribe(&self, upload: &UploadDescriptor) -> Result<Transcript, ProviderError> {
        Ok(Transcript {
            text: format!("[transcript of {}]", upload.file_name),
            duration_seconds: upload.duration_seconds,
            language: None,
        })
    }
}

pub(crate) fn seeded_discount_catalog() -> InMemoryDiscountCatalog {
    let launch = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single();
    let Some(valid_from) = launch else {
        return InMemoryDiscountCatalog::default();
    };

    InMemoryDiscountCatalog::with_codes(vec![
        DiscountCode {
            code: "WELCOME10".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 10,
            max_uses: None,
            current_uses: 0,
            min_purchase_cents: None,
            applicable_products: Vec::new(),
            valid_from,
            valid_until: None,
            is_active: true,
        },
        DiscountCode {
            code: "CREATOR50".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: 5_000,
            max_uses: Some(500),
            current_uses: 0,
            min_purchase_cents: Some(24_900),
            applicable_products: vec!["voice-twin-pro".to_string()],
            valid_from,
            valid_until: None,
            is_active: true,
        },
    ])
}
