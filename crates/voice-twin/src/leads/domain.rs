use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A marketing lead captured from the public site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffiliateStatus {
    Pending,
    Approved,
    Rejected,
}

/// An affiliate program application. Always enters review as pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliateApplication {
    pub id: String,
    pub name: String,
    pub email: String,
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience_size: Option<u64>,
    pub status: AffiliateStatus,
    pub submitted_at: DateTime<Utc>,
}

impl AffiliateApplication {
    pub fn pending(
        name: String,
        email: String,
        channel: String,
        audience_size: Option<u64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("aff-{}", Uuid::new_v4().simple()),
            name,
            email,
            channel,
            audience_size,
            status: AffiliateStatus::Pending,
            submitted_at: now,
        }
    }
}

/// Shape-only address check. Deliverability is not our problem; we only
/// refuse strings that cannot be an address at all.
pub fn looks_like_email(candidate: &str) -> bool {
    let trimmed = candidate.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    if trimmed.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.split_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
