use super::domain::{AffiliateApplication, Lead};

/// Storage abstraction over the public intake tables.
pub trait LeadRepository: Send + Sync {
    fn insert_lead(&self, lead: Lead) -> Result<(), IntakeStoreError>;
    fn insert_application(
        &self,
        application: AffiliateApplication,
    ) -> Result<AffiliateApplication, IntakeStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeStoreError {
    #[error("intake store unavailable: {0}")]
    Unavailable(String),
}
