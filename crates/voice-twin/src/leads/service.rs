use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{looks_like_email, AffiliateApplication, Lead};
use super::repository::{IntakeStoreError, LeadRepository};

/// Public intake operations. Validation here is shape-only; anything
/// past "could be an address" is left to downstream tooling.
pub struct LeadIntake<R> {
    store: Arc<R>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntakeRejection {
    #[error("a valid email address is required")]
    InvalidEmail,
    #[error("name is required")]
    MissingName,
    #[error("channel is required")]
    MissingChannel,
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Rejected(#[from] IntakeRejection),
    #[error(transparent)]
    Store(#[from] IntakeStoreError),
}

impl<R> LeadIntake<R>
where
    R: LeadRepository + 'static,
{
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }

    pub fn capture_lead(
        &self,
        email: String,
        source: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Lead, IntakeError> {
        if !looks_like_email(&email) {
            return Err(IntakeRejection::InvalidEmail.into());
        }

        let lead = Lead {
            email: email.trim().to_ascii_lowercase(),
            source,
            captured_at: now,
        };
        self.store.insert_lead(lead.clone())?;
        tracing::info!(email = %lead.email, "lead captured");
        Ok(lead)
    }

    pub fn apply_affiliate(
        &self,
        name: String,
        email: String,
        channel: String,
        audience_size: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<AffiliateApplication, IntakeError> {
        if name.trim().is_empty() {
            return Err(IntakeRejection::MissingName.into());
        }
        if !looks_like_email(&email) {
            return Err(IntakeRejection::InvalidEmail.into());
        }
        if channel.trim().is_empty() {
            return Err(IntakeRejection::MissingChannel.into());
        }

        let application = AffiliateApplication::pending(
            name.trim().to_string(),
            email.trim().to_ascii_lowercase(),
            channel.trim().to_string(),
            audience_size,
            now,
        );
        let stored = self.store.insert_application(application)?;
        tracing::info!(application = %stored.id, "affiliate application received");
        Ok(stored)
    }
}
