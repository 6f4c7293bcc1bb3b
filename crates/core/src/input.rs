//! Incoming edit and submission payloads.
//!
//! Admin-side inputs (`TemplateInput` and children) drive the sync cascade;
//! candidate-side inputs (`SubmitRequest` and children) drive scoring.
//! Structural validation (lengths, ranges) lives here via `validator`;
//! semantic validation (references, cardinality) lives in
//! [`crate::submission_checks`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::keys::VersionKey;
use crate::template::{QuestionType, TemplateStatus, TemplateType};
use crate::types::Score;

// ---------------------------------------------------------------------------
// Admin inputs
// ---------------------------------------------------------------------------

/// Full template payload for create/update.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TemplateInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 1))]
    pub version: i32,
    pub template_type: TemplateType,
    pub status: TemplateStatus,
    #[validate(length(max = 500))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub time_limit_seconds: Option<i64>,
    /// When set, the update forks the whole template to version + 1 instead
    /// of editing in place.
    #[serde(default)]
    pub should_update_version: bool,
    #[validate(nested)]
    #[serde(default)]
    pub sections: Vec<SectionInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SectionInput {
    pub id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub order: i32,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub description: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionInput {
    /// Absent for brand-new questions; a name is generated on create.
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub order: i32,
    pub question_type: QuestionType,
    #[validate(length(min = 1))]
    pub text: String,
    #[serde(default)]
    pub is_required: bool,
    pub weight: Option<Score>,
    pub trait_key: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub options: Vec<OptionInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OptionInput {
    /// Absent for brand-new options; a name is derived from the label.
    pub name: Option<String>,
    #[validate(range(min = 1))]
    pub order: i32,
    #[validate(length(min = 1, max = 500))]
    pub label: String,
    pub is_correct: Option<bool>,
    pub score: Option<Score>,
    pub weight: Option<Score>,
    pub wa: Option<Score>,
}

/// Options for duplicating a template under a new name.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DuplicateRequest {
    #[validate(length(min = 1, max = 200))]
    pub new_name: String,
    #[serde(default)]
    pub include_title: bool,
    #[serde(default)]
    pub include_description: bool,
    #[serde(default)]
    pub include_questions: bool,
}

// ---------------------------------------------------------------------------
// Candidate inputs
// ---------------------------------------------------------------------------

/// A candidate's full answer set for one submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_name: String,
    pub question_version: i32,
    pub answer_text: Option<String>,
    #[serde(default)]
    pub selected_options: Vec<OptionRef>,
}

impl AnswerInput {
    pub fn question_key(&self) -> VersionKey {
        VersionKey::new(self.question_name.clone(), self.question_version)
    }
}

/// Reference to a selected option by its pinned key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionRef {
    pub option_name: String,
    pub option_version: i32,
}

impl OptionRef {
    pub fn key(&self) -> VersionKey {
        VersionKey::new(self.option_name.clone(), self.option_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_input_requires_name() {
        let input = TemplateInput {
            name: String::new(),
            version: 1,
            template_type: TemplateType::Form,
            status: TemplateStatus::Draft,
            title: None,
            description: None,
            time_limit_seconds: None,
            should_update_version: false,
            sections: Vec::new(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn template_input_rejects_zero_version() {
        let input = TemplateInput {
            name: "t".to_string(),
            version: 0,
            template_type: TemplateType::Form,
            status: TemplateStatus::Draft,
            title: None,
            description: None,
            time_limit_seconds: None,
            should_update_version: false,
            sections: Vec::new(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn nested_section_title_is_validated() {
        let input = TemplateInput {
            name: "t".to_string(),
            version: 1,
            template_type: TemplateType::Form,
            status: TemplateStatus::Draft,
            title: None,
            description: None,
            time_limit_seconds: None,
            should_update_version: false,
            sections: vec![SectionInput {
                id: None,
                order: 1,
                title: String::new(),
                description: None,
                questions: Vec::new(),
            }],
        };
        assert!(input.validate().is_err());
    }
}
