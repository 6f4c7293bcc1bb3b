//! Personality-trait aggregation contract.
//!
//! The engine hands every built answer set to a calculator and persists the
//! payload it returns, but the trait-aggregation formula itself is supplied
//! by the embedding application. Implementations typically fold each
//! answer's `wa_sum` into its question's `trait_key` bucket.

use std::collections::HashMap;

use crate::keys::VersionKey;
use crate::submission::Answer;
use crate::template::{Question, TemplateType};

/// Strategy that turns weighted answers into a trait payload.
///
/// Returning `None` means the submission carries no personality result.
pub trait PersonalityScoreCalculator: Send + Sync {
    fn calculate(
        &self,
        answers: &[Answer],
        question_by_key: &HashMap<VersionKey, &Question>,
        template_type: TemplateType,
    ) -> Option<serde_json::Value>;
}

/// Default calculator for deployments without personality scoring.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPersonalityCalculator;

impl PersonalityScoreCalculator for NullPersonalityCalculator {
    fn calculate(
        &self,
        _answers: &[Answer],
        _question_by_key: &HashMap<VersionKey, &Question>,
        _template_type: TemplateType,
    ) -> Option<serde_json::Value> {
        None
    }
}
