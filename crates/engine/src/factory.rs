//! Builds fresh version-1 question and option rows from incoming payloads.

use uuid::Uuid;

use candor_core::input::{OptionInput, QuestionInput};
use candor_core::template::{Question, QuestionOption};
use candor_core::types::Timestamp;

/// First version of every new lineage.
pub const INITIAL_VERSION: i32 = 1;

pub struct EntityFactory;

impl EntityFactory {
    /// Build a new question at version 1. The caller resolves the name
    /// (explicit, or generated from the template and question text).
    pub fn create_question(
        input: &QuestionInput,
        name: String,
        section_id: Uuid,
        now: Timestamp,
    ) -> Question {
        Question {
            name,
            version: INITIAL_VERSION,
            section_id,
            order: input.order,
            is_active: true,
            is_deleted: false,
            question_type: input.question_type,
            text: input.text.trim().to_string(),
            is_required: input.is_required,
            weight: input.weight,
            trait_key: normalize_optional(input.trait_key.as_deref()),
            created_at: now,
            updated_at: now,
            options: Vec::new(),
        }
    }

    /// Build a new option at version 1 under the given question row. The
    /// caller resolves a unique name first.
    pub fn create_option(
        input: &OptionInput,
        name: String,
        question: &Question,
        now: Timestamp,
    ) -> QuestionOption {
        QuestionOption {
            name,
            version: INITIAL_VERSION,
            question_name: question.name.clone(),
            question_version: question.version,
            order: input.order,
            label: input.label.trim().to_string(),
            is_correct: input.is_correct,
            score: input.score,
            weight: input.weight,
            wa: input.wa,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    let trimmed = value.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
