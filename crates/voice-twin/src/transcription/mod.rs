//! Audio upload gating, per-minute pricing, and transcription dispatch.
//!
//! The speech-to-text engine and the payment processor sit behind
//! traits; this module decides whether an upload is acceptable and
//! whether it still needs to be paid for.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::TranscriptionPricingConfig;

/// Hard cap on uploaded file size.
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;
/// Longest recording accepted, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 180;
/// Audio types the transcription provider accepts.
pub const ACCEPTED_AUDIO_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp4",
    "audio/wav",
    "audio/webm",
    "audio/ogg",
    "audio/flac",
];

/// Metadata describing an upload; the payload itself streams to the
/// provider out of band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadDescriptor {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub duration_seconds: u32,
}

/// Why an upload was turned away. Expected conditions, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UploadRejection {
    UnsupportedMediaType { mime_type: String },
    FileTooLarge { size_bytes: u64, max_bytes: u64 },
    RecordingTooLong { duration_minutes: u32, max_minutes: u32 },
}

impl UploadRejection {
    pub fn user_message(&self) -> String {
        match self {
            UploadRejection::UnsupportedMediaType { mime_type } => {
                format!("Unsupported audio type '{mime_type}'")
            }
            UploadRejection::FileTooLarge { max_bytes, .. } => {
                format!("File exceeds the {} MB upload limit", max_bytes / (1024 * 1024))
            }
            UploadRejection::RecordingTooLong { max_minutes, .. } => {
                format!("Recordings longer than {max_minutes} minutes are not supported")
            }
        }
    }
}

/// Gate an upload against type, size, and duration limits.
pub fn validate_upload(upload: &UploadDescriptor) -> Result<(), UploadRejection> {
    let accepted = upload
        .mime_type
        .parse::<mime::Mime>()
        .ok()
        .map(|parsed| ACCEPTED_AUDIO_TYPES.contains(&parsed.essence_str()))
        .unwrap_or(false);
    if !accepted {
        return Err(UploadRejection::UnsupportedMediaType {
            mime_type: upload.mime_type.clone(),
        });
    }

    if upload.size_bytes > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::FileTooLarge {
            size_bytes: upload.size_bytes,
            max_bytes: MAX_UPLOAD_BYTES,
        });
    }

    let duration_minutes = billable_minutes(upload.duration_seconds);
    if duration_minutes > MAX_DURATION_MINUTES {
        return Err(UploadRejection::RecordingTooLong {
            duration_minutes,
            max_minutes: MAX_DURATION_MINUTES,
        });
    }

    Ok(())
}

/// Minutes round up; a 61-second clip bills as two minutes.
pub fn billable_minutes(duration_seconds: u32) -> u32 {
    duration_seconds.div_ceil(60)
}

/// Per-minute price floored at the minimum charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TranscriptionQuote {
    pub billable_minutes: u32,
    pub amount_cents: u64,
}

pub fn quote(duration_seconds: u32, pricing: &TranscriptionPricingConfig) -> TranscriptionQuote {
    let billable_minutes = billable_minutes(duration_seconds);
    let metered = billable_minutes as u64 * pricing.per_minute_cents as u64;
    TranscriptionQuote {
        billable_minutes,
        amount_cents: metered.max(pricing.minimum_cents as u64),
    }
}

/// Completed transcription returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub duration_seconds: u32,
    #[serde(default)]
    pub language: Option<String>,
}

/// Speech-to-text provider seam.
pub trait TranscriptionProvider: Send + Sync {
    fn transcribe(&self, upload: &UploadDescriptor) -> Result<Transcript, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("transcription provider failed: {0}")]
    Failed(String),
}

/// Payment-processor seam for creating hosted checkout sessions.
pub trait CheckoutGateway: Send + Sync {
    fn create_session(&self, amount_cents: u64, description: &str)
        -> Result<String, GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("checkout gateway unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// What the transcribe endpoint replies with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranscribeOutcome {
    Rejected(UploadRejection),
    PaymentRequired {
        checkout_url: String,
        amount_cents: u64,
        billable_minutes: u32,
    },
    Transcribed(Transcript),
}

/// Gates uploads, prices them, and dispatches paid work to the provider.
pub struct TranscriptionService<G, P> {
    gateway: Arc<G>,
    provider: Arc<P>,
    pricing: TranscriptionPricingConfig,
}

impl<G, P> TranscriptionService<G, P>
where
    G: CheckoutGateway + 'static,
    P: TranscriptionProvider + 'static,
{
    pub fn new(gateway: Arc<G>, provider: Arc<P>, pricing: TranscriptionPricingConfig) -> Self {
        Self {
            gateway,
            provider,
            pricing,
        }
    }

    /// Handle one upload. `payment_confirmed` is true when the caller
    /// presented a checkout session that settled; failed transcriptions
    /// are not retried here.
    pub fn handle(
        &self,
        upload: &UploadDescriptor,
        payment_confirmed: bool,
    ) -> Result<TranscribeOutcome, TranscriptionError> {
        if let Err(rejection) = validate_upload(upload) {
            return Ok(TranscribeOutcome::Rejected(rejection));
        }

        if !payment_confirmed {
            let quote = quote(upload.duration_seconds, &self.pricing);
            let description = format!("Transcription of {}", upload.file_name);
            let checkout_url = self
                .gateway
                .create_session(quote.amount_cents, &description)?;
            return Ok(TranscribeOutcome::PaymentRequired {
                checkout_url,
                amount_cents: quote.amount_cents,
                billable_minutes: quote.billable_minutes,
            });
        }

        let transcript = self.provider.transcribe(upload)?;
        Ok(TranscribeOutcome::Transcribed(transcript))
    }
}
