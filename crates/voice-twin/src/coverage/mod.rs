//! Sample-collection bookkeeping for the style questionnaire.
//!
//! Nothing here is persisted: the matrix is re-derived from the
//! questionnaire answers and the user's samples on every request.

mod domain;
mod matrix;

pub use domain::{
    implied_context, CommunicationContext, StyleQuestionnaire, WritingSample,
};
pub use matrix::{coverage_matrix, MatrixSection, SectionStatus, SECTION_COMPLETE_THRESHOLD};
