use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::billing::checkout::{
    BillingEvent, CheckoutRecorder, CheckoutSession, CountOutcome, DownloadToken, InsertOutcome,
    NotifyError, Purchase, PurchaseReceipt, PurchaseRepository, ReceiptNotifier, StoreError,
    SubscriptionRecord,
};
use crate::billing::discount::{
    CatalogError, DiscountCatalog, DiscountCode, DiscountService, DiscountType,
};

pub(super) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

pub(super) fn percentage_code(code: &str, value: u32) -> DiscountCode {
    DiscountCode {
        code: code.to_string(),
        discount_type: DiscountType::Percentage,
        discount_value: value,
        max_uses: None,
        current_uses: 0,
        min_purchase_cents: None,
        applicable_products: Vec::new(),
        valid_from: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        valid_until: None,
        is_active: true,
    }
}

pub(super) fn checkout_event(session_id: &str) -> BillingEvent {
    BillingEvent::CheckoutCompleted(CheckoutSession {
        session_id: session_id.to_string(),
        email: "buyer@example.com".to_string(),
        product: "voice-twin".to_string(),
        amount_cents: Some(9_900),
    })
}

#[derive(Default, Clone)]
pub(super) struct MemoryCatalog {
    codes: Arc<Mutex<HashMap<String, DiscountCode>>>,
}

impl MemoryCatalog {
    pub(super) fn with_codes(codes: Vec<DiscountCode>) -> Self {
        let map = codes
            .into_iter()
            .map(|code| (code.code.clone(), code))
            .collect();
        Self {
            codes: Arc::new(Mutex::new(map)),
        }
    }

    pub(super) fn uses(&self, code: &str) -> u32 {
        self.codes
            .lock()
            .expect("catalog mutex poisoned")
            .get(code)
            .map(|row| row.current_uses)
            .unwrap_or(0)
    }
}

impl DiscountCatalog for MemoryCatalog {
    fn find(&self, normalized_code: &str) -> Result<Option<DiscountCode>, CatalogError> {
        let guard = self.codes.lock().expect("catalog mutex poisoned");
        Ok(guard.get(normalized_code).cloned())
    }

    fn record_redemption(&self, normalized_code: &str) -> Result<(), CatalogError> {
        let mut guard = self.codes.lock().expect("catalog mutex poisoned");
        match guard.get_mut(normalized_code) {
            Some(row) => {
                row.current_uses += 1;
                Ok(())
            }
            None => Err(CatalogError::Unavailable(format!(
                "unknown code {normalized_code}"
            ))),
        }
    }
}

pub(super) struct UnavailableCatalog;

impl DiscountCatalog for UnavailableCatalog {
    fn find(&self, _normalized_code: &str) -> Result<Option<DiscountCode>, CatalogError> {
        Err(CatalogError::Unavailable("database offline".to_string()))
    }

    fn record_redemption(&self, _normalized_code: &str) -> Result<(), CatalogError> {
        Err(CatalogError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryPurchases {
    purchases: Arc<Mutex<HashMap<String, Purchase>>>,
    subscriptions: Arc<Mutex<HashMap<String, SubscriptionRecord>>>,
}

impl MemoryPurchases {
    pub(super) fn purchase_count(&self) -> usize {
        self.purchases.lock().expect("purchase mutex poisoned").len()
    }

    pub(super) fn token_for_session(&self, session_id: &str) -> Option<DownloadToken> {
        self.purchases
            .lock()
            .expect("purchase mutex poisoned")
            .get(session_id)
            .map(|purchase| purchase.download_token.clone())
    }
}

impl PurchaseRepository for MemoryPurchases {
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
        let mut guard = self
            .subscriptions
            .lock()
            .expect("subscription mutex poisoned");
        guard.insert(record.subscription_id.clone(), record);
        Ok(())
    }

    fn subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let guard = self
            .subscriptions
            .lock()
            .expect("subscription mutex poisoned");
        Ok(guard.get(subscription_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    sent: Arc<Mutex<Vec<PurchaseReceipt>>>,
}

impl MemoryNotifier {
    pub(super) fn sent(&self) -> Vec<PurchaseReceipt> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl ReceiptNotifier for MemoryNotifier {
    fn send(&self, receipt: PurchaseReceipt) -> Result<(), NotifyError> {
        self.sent.lock().expect("notifier mutex poisoned").push(receipt);
        Ok(())
    }
}

pub(super) fn build_recorder() -> (
    CheckoutRecorder<MemoryPurchases, MemoryNotifier>,
    Arc<MemoryPurchases>,
    Arc<MemoryNotifier>,
) {
    let purchases = Arc::new(MemoryPurchases::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let recorder = CheckoutRecorder::new(purchases.clone(), notifier.clone());
    (recorder, purchases, notifier)
}

pub(super) fn build_discount_service(
    codes: Vec<DiscountCode>,
) -> (DiscountService<MemoryCatalog>, MemoryCatalog) {
    let catalog = MemoryCatalog::with_codes(codes);
    let service = DiscountService::new(Arc::new(catalog.clone()));
    (service, catalog)
}
