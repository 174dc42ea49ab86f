use crate::infra::seeded_discount_catalog;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use voice_twin::billing::discount::{DiscountService, DiscountVerdict};
use voice_twin::coverage::{
    coverage_matrix, CommunicationContext, StyleQuestionnaire, WritingSample,
    SECTION_COMPLETE_THRESHOLD,
};
use voice_twin::error::AppError;

#[derive(Args, Debug)]
pub(crate) struct DiscountCheckArgs {
    /// Discount code to evaluate
    #[arg(long)]
    pub(crate) code: String,
    /// Purchase amount in cents
    #[arg(long)]
    pub(crate) amount_cents: u64,
    /// Product identifier the purchase is for
    #[arg(long)]
    pub(crate) product: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct CoverageDemoArgs {
    /// Primary language for the questionnaire
    #[arg(long, default_value = "English")]
    pub(crate) language: String,
    /// Additional languages (repeatable)
    #[arg(long = "also")]
    pub(crate) additional_languages: Vec<String>,
    /// Communication contexts (repeatable: email, chat, documents, social, presentations)
    #[arg(long = "context", value_parser = parse_context)]
    pub(crate) contexts: Vec<CommunicationContext>,
    /// Audience targets (repeatable)
    #[arg(long = "audience")]
    pub(crate) audiences: Vec<String>,
    /// JSON file holding an array of writing samples to score
    #[arg(long)]
    pub(crate) samples: Option<PathBuf>,
}

pub(crate) fn run_discount_check(args: DiscountCheckArgs) -> Result<(), AppError> {
    let service = DiscountService::new(Arc::new(seeded_discount_catalog()));

    let verdict = match service.validate(&args.code, args.amount_cents, args.product.as_deref()) {
        Ok(verdict) => verdict,
        Err(error) => {
            eprintln!("catalog unavailable: {error}");
            return Ok(());
        }
    };

    match verdict {
        DiscountVerdict::Valid(quote) => {
            println!("Code {} is valid", quote.code);
            println!(
                "  {} -> {} cents ({} cents off)",
                quote.original_amount_cents, quote.final_amount_cents, quote.discount_amount_cents
            );
        }
        DiscountVerdict::Invalid(rejection) => {
            println!("Code rejected: {}", rejection.user_message());
        }
    }

    Ok(())
}

pub(crate) fn run_coverage_demo(args: CoverageDemoArgs) -> Result<(), AppError> {
    let questionnaire = StyleQuestionnaire {
        primary_language: args.language,
        additional_languages: args.additional_languages,
        contexts: args.contexts,
        audiences: args.audiences,
    };

    let samples: Vec<WritingSample> = match args.samples {
        Some(path) => {
            let raw = std::fs::read(path)?;
            match serde_json::from_slice(&raw) {
                Ok(samples) => samples,
                Err(error) => {
                    eprintln!("could not parse samples file: {error}");
                    return Ok(());
                }
            }
        }
        None => Vec::new(),
    };

    let matrix = coverage_matrix(&questionnaire, &samples);
    let complete = matrix.iter().filter(|status| status.complete).count();

    println!(
        "Coverage: {complete}/{} sections complete ({} samples scored)",
        matrix.len(),
        samples.len()
    );
    for status in &matrix {
        let marker = if status.complete { "done" } else { "open" };
        println!(
            "- [{marker}] {}: {}/{}",
            status.label, status.matched_samples, SECTION_COMPLETE_THRESHOLD
        );
    }

    Ok(())
}

fn parse_context(raw: &str) -> Result<CommunicationContext, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "email" => Ok(CommunicationContext::Email),
        "chat" => Ok(CommunicationContext::Chat),
        "documents" | "docs" => Ok(CommunicationContext::Documents),
        "social" => Ok(CommunicationContext::Social),
        "presentations" | "talks" => Ok(CommunicationContext::Presentations),
        other => Err(format!("unknown context '{other}'")),
    }
}
