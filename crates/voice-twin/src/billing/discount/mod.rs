mod evaluate;

pub use evaluate::{evaluate, DiscountQuote, DiscountRejection, DiscountVerdict};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a code subtracts a percentage of the amount or a fixed sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// Operator-issued coupon row. Codes are never deleted, only deactivated;
/// `current_uses` moves only through redemption recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountCode {
    pub code: String,
    pub discount_type: DiscountType,
    /// Percent (0-100) for percentage codes, cents for fixed codes.
    pub discount_value: u32,
    pub max_uses: Option<u32>,
    pub current_uses: u32,
    pub min_purchase_cents: Option<u64>,
    /// Empty means the code applies to every product.
    pub applicable_products: Vec<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Codes are matched case-insensitively; the catalog stores them uppercase.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Storage abstraction over the discount-code table.
pub trait DiscountCatalog: Send + Sync {
    fn find(&self, normalized_code: &str) -> Result<Option<DiscountCode>, CatalogError>;
    /// Increment `current_uses` after a successful redemption.
    fn record_redemption(&self, normalized_code: &str) -> Result<(), CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("discount catalog unavailable: {0}")]
    Unavailable(String),
}

/// Couples catalog lookup with the pure evaluation routine.
///
/// Validation has no side effects; redemption counting is a separate
/// call made by the checkout flow once payment succeeds.
pub struct DiscountService<C> {
    catalog: Arc<C>,
}

impl<C> DiscountService<C>
where
    C: DiscountCatalog + 'static,
{
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    pub fn validate(
        &self,
        code: &str,
        amount_cents: u64,
        product: Option<&str>,
    ) -> Result<DiscountVerdict, CatalogError> {
        self.validate_at(code, amount_cents, product, Utc::now())
    }

    pub fn validate_at(
        &self,
        code: &str,
        amount_cents: u64,
        product: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DiscountVerdict, CatalogError> {
        let normalized = normalize_code(code);
        let row = match self.catalog.find(&normalized)? {
            Some(row) => row,
            None => return Ok(DiscountVerdict::Invalid(DiscountRejection::NotFound)),
        };

        Ok(evaluate(&row, amount_cents, product, now))
    }

    pub fn record_redemption(&self, code: &str) -> Result<(), CatalogError> {
        self.catalog.record_redemption(&normalize_code(code))
    }
}
