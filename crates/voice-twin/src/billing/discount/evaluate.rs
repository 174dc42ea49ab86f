use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DiscountCode, DiscountType};

/// Outcome of validating a code against a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiscountVerdict {
    Valid(DiscountQuote),
    Invalid(DiscountRejection),
}

impl DiscountVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, DiscountVerdict::Valid(_))
    }

    pub fn quote(&self) -> Option<&DiscountQuote> {
        match self {
            DiscountVerdict::Valid(quote) => Some(quote),
            DiscountVerdict::Invalid(_) => None,
        }
    }
}

/// Computed pricing for a valid code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountQuote {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: u32,
    pub original_amount_cents: u64,
    pub discount_amount_cents: u64,
    pub final_amount_cents: u64,
}

/// Reason a code was rejected. These are expected business conditions,
/// surfaced to the caller as data rather than errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DiscountRejection {
    NotFound,
    NotYetActive { starts_at: DateTime<Utc> },
    Expired { expired_at: DateTime<Utc> },
    UsageLimitReached { used: u32, max: u32 },
    BelowMinimumPurchase { required_cents: u64 },
    ProductNotEligible,
}

impl DiscountRejection {
    pub fn user_message(&self) -> String {
        match self {
            DiscountRejection::NotFound => "Invalid discount code".to_string(),
            DiscountRejection::NotYetActive { starts_at } => format!(
                "This discount code is not active until {}",
                starts_at.format("%Y-%m-%d")
            ),
            DiscountRejection::Expired { .. } => "This discount code has expired".to_string(),
            DiscountRejection::UsageLimitReached { .. } => {
                "This discount code has reached its usage limit".to_string()
            }
            DiscountRejection::BelowMinimumPurchase { required_cents } => format!(
                "Minimum purchase of ${:.2} required",
                *required_cents as f64 / 100.0
            ),
            DiscountRejection::ProductNotEligible => {
                "This discount code is not valid for this product".to_string()
            }
        }
    }
}

impl std::fmt::Display for DiscountRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

/// Single-pass validation and pricing of a catalog row.
///
/// Eligibility checks run in a fixed order so the caller always sees the
/// most specific rejection; the computed discount is capped so the final
/// amount never goes below zero.
pub fn evaluate(
    row: &DiscountCode,
    amount_cents: u64,
    product: Option<&str>,
    now: DateTime<Utc>,
) -> DiscountVerdict {
    if !row.is_active {
        return DiscountVerdict::Invalid(DiscountRejection::NotFound);
    }

    if row.valid_from > now {
        return DiscountVerdict::Invalid(DiscountRejection::NotYetActive {
            starts_at: row.valid_from,
        });
    }

    if let Some(valid_until) = row.valid_until {
        if valid_until < now {
            return DiscountVerdict::Invalid(DiscountRejection::Expired {
                expired_at: valid_until,
            });
        }
    }

    if let Some(max) = row.max_uses {
        if row.current_uses >= max {
            return DiscountVerdict::Invalid(DiscountRejection::UsageLimitReached {
                used: row.current_uses,
                max,
            });
        }
    }

    if let Some(min) = row.min_purchase_cents {
        if amount_cents < min {
            return DiscountVerdict::Invalid(DiscountRejection::BelowMinimumPurchase {
                required_cents: min,
            });
        }
    }

    if !row.applicable_products.is_empty() {
        let eligible = product
            .map(|p| row.applicable_products.iter().any(|allowed| allowed == p))
            .unwrap_or(false);
        if !eligible {
            return DiscountVerdict::Invalid(DiscountRejection::ProductNotEligible);
        }
    }

    let raw_discount = match row.discount_type {
        // Integer rounding half away from zero on cents. Widened to
        // u128 so an arbitrary caller-supplied amount cannot overflow
        // the multiply; the cap brings the result back into u64 range.
        DiscountType::Percentage => {
            (amount_cents as u128 * row.discount_value as u128 + 50) / 100
        }
        DiscountType::Fixed => row.discount_value as u128,
    };
    let discount_amount_cents = raw_discount.min(amount_cents as u128) as u64;

    DiscountVerdict::Valid(DiscountQuote {
        code: row.code.clone(),
        discount_type: row.discount_type,
        discount_value: row.discount_value,
        original_amount_cents: amount_cents,
        discount_amount_cents,
        final_amount_cents: amount_cents - discount_amount_cents,
    })
}
