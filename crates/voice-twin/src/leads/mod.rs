//! Public intake: marketing leads and affiliate applications.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{looks_like_email, AffiliateApplication, AffiliateStatus, Lead};
pub use repository::{IntakeStoreError, LeadRepository};
pub use router::leads_router;
pub use service::{IntakeError, IntakeRejection, LeadIntake};
