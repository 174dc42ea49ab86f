//! Domain logic for the Voice Twin writing-style service.
//!
//! The crate is organized around the business areas the HTTP service
//! exposes: `billing` (discount codes and checkout webhook recording),
//! `coverage` (sample-collection bookkeeping for the questionnaire),
//! `transcription` (upload gating and pricing), `support` (tickets),
//! and `leads` (public intake). Storage and outbound integrations are
//! traits implemented by the service crate.

pub mod billing;
pub mod config;
pub mod coverage;
pub mod error;
pub mod leads;
pub mod support;
pub mod telemetry;
pub mod transcription;
