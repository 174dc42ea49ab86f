use serde::Serialize;

use super::domain::{implied_context, CommunicationContext, StyleQuestionnaire, WritingSample};

/// Samples needed before a section counts as complete.
pub const SECTION_COMPLETE_THRESHOLD: usize = 5;

/// One (language, context, audience) combination tracked for completeness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixSection {
    pub language: String,
    pub context: CommunicationContext,
    pub audience: String,
}

impl MatrixSection {
    pub fn label(&self) -> String {
        format!(
            "{} / {} / {}",
            self.language,
            self.context.label(),
            self.audience
        )
    }
}

/// Section annotated with its match count and completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionStatus {
    #[serde(flatten)]
    pub section: MatrixSection,
    pub label: String,
    pub matched_samples: usize,
    pub complete: bool,
}

/// Synonym table per audience category, consulted when raw substring
/// containment fails.
const AUDIENCE_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "executives",
        &["ceo", "cfo", "coo", "cto", "vp", "director", "board", "leadership"],
    ),
    (
        "clients",
        &["client", "customer", "account", "prospect", "buyer"],
    ),
    (
        "colleagues",
        &["colleague", "coworker", "co-worker", "teammate", "peer", "team", "staff"],
    ),
    ("direct reports", &["report", "mentee", "intern"]),
    (
        "general public",
        &["everyone", "public", "reader", "audience", "community", "follower"],
    ),
];

fn audience_synonyms(audience: &str) -> &'static [&'static str] {
    let normalized = audience.trim().to_ascii_lowercase();
    AUDIENCE_SYNONYMS
        .iter()
        .find(|(category, _)| *category == normalized)
        .map(|(_, synonyms)| *synonyms)
        .unwrap_or(&[])
}

/// Audience match heuristic: an empty sample audience matches anything;
/// otherwise raw substring containment in either direction, then the
/// synonym table for the section's audience category.
fn matches_audience(sample_audience: &str, section_audience: &str) -> bool {
    let sample = sample_audience.trim().to_ascii_lowercase();
    if sample.is_empty() {
        return true;
    }

    let section = section_audience.trim().to_ascii_lowercase();
    if sample.contains(&section) || section.contains(&sample) {
        return true;
    }

    audience_synonyms(section_audience)
        .iter()
        .any(|synonym| sample.contains(synonym))
}

fn matches_section(sample: &WritingSample, section: &MatrixSection) -> bool {
    if !sample.language.eq_ignore_ascii_case(&section.language) {
        return false;
    }
    if implied_context(&sample.sample_type) != Some(section.context) {
        return false;
    }
    matches_audience(&sample.audience, &section.audience)
}

/// Derive the coverage matrix for a questionnaire and sample set.
///
/// Sections come out in Cartesian-product order: languages outer,
/// contexts middle, audiences inner. Dimensions the user left empty
/// fall back to a singleton default so the matrix is never empty.
pub fn coverage_matrix(
    questionnaire: &StyleQuestionnaire,
    samples: &[WritingSample],
) -> Vec<SectionStatus> {
    let languages = {
        let languages = questionnaire.languages();
        if languages.is_empty() || languages.iter().all(|language| language.trim().is_empty()) {
            vec!["English".to_string()]
        } else {
            languages
        }
    };

    let contexts = if questionnaire.contexts.is_empty() {
        vec![CommunicationContext::Email]
    } else {
        questionnaire.contexts.clone()
    };

    let audiences = if questionnaire.audiences.is_empty() {
        vec!["General public".to_string()]
    } else {
        questionnaire.audiences.clone()
    };

    let mut statuses =
        Vec::with_capacity(languages.len() * contexts.len() * audiences.len());
    for language in &languages {
        for context in &contexts {
            for audience in &audiences {
                let section = MatrixSection {
                    language: language.clone(),
                    context: *context,
                    audience: audience.clone(),
                };
                let matched_samples = samples
                    .iter()
                    .filter(|sample| matches_section(sample, &section))
                    .count();
                statuses.push(SectionStatus {
                    label: section.label(),
                    matched_samples,
                    complete: matched_samples >= SECTION_COMPLETE_THRESHOLD,
                    section,
                });
            }
        }
    }

    statuses
}
