//! Questionnaire template aggregate: template → section → question → option.
//!
//! Templates and their questions/options are versioned by (name, version);
//! sections are positional (identified by order within one template version)
//! and are not independently versioned. The aggregate is fully owned: a
//! `Template` owns its sections, each section its questions, each question
//! its options. Sync logic mutates one owned aggregate at a time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::keys::VersionKey;
use crate::types::{Score, Timestamp};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    Form,
    Quiz,
    Personality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultiChoice,
    Likert,
    Radio,
    Checkbox,
    Dropdown,
    FreeText,
}

impl QuestionType {
    /// Whether answers to this type are option selections rather than text.
    pub fn is_option_based(self) -> bool {
        !matches!(self, QuestionType::FreeText)
    }

    /// Types that admit at most one selected option.
    pub fn is_single_select(self) -> bool {
        matches!(
            self,
            QuestionType::SingleChoice
                | QuestionType::Radio
                | QuestionType::Dropdown
                | QuestionType::Likert
        )
    }

    /// True multi-select types.
    pub fn is_multi_select(self) -> bool {
        matches!(self, QuestionType::MultiChoice | QuestionType::Checkbox)
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Root questionnaire definition, versioned by (name, version).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub version: i32,
    pub template_type: TemplateType,
    pub status: TemplateStatus,
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_limit_seconds: Option<i64>,
    pub published_at: Option<Timestamp>,
    pub is_deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub sections: Vec<Section>,
}

/// A section within one template version. Identity is positional:
/// (template name, template version, order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub template_name: String,
    pub template_version: i32,
    pub order: i32,
    pub title: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub questions: Vec<Question>,
}

/// A versioned question. One active row per (section, order); superseded
/// versions stay in the section with `is_active = false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub name: String,
    pub version: i32,
    pub section_id: Uuid,
    pub order: i32,
    pub is_active: bool,
    pub is_deleted: bool,
    pub question_type: QuestionType,
    pub text: String,
    pub is_required: bool,
    /// Question weight (Ws) for Likert / personality scoring.
    pub weight: Option<Score>,
    pub trait_key: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub options: Vec<QuestionOption>,
}

/// A versioned answer option. `wa` is the Likert scale anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub name: String,
    pub version: i32,
    pub question_name: String,
    pub question_version: i32,
    pub order: i32,
    pub label: String,
    pub is_correct: Option<bool>,
    pub score: Option<Score>,
    pub weight: Option<Score>,
    pub wa: Option<Score>,
    pub is_deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Aggregate helpers
// ---------------------------------------------------------------------------

impl Template {
    pub fn key(&self) -> VersionKey {
        VersionKey::new(self.name.clone(), self.version)
    }

    /// Active, non-deleted questions across all sections, keyed by
    /// (name, version). This is the lookup submissions are validated and
    /// scored against.
    pub fn active_question_map(&self) -> HashMap<VersionKey, &Question> {
        self.sections
            .iter()
            .flat_map(|s| s.questions.iter())
            .filter(|q| q.is_active && !q.is_deleted)
            .map(|q| (q.key(), q))
            .collect()
    }

    pub fn section_by_order(&self, order: i32) -> Option<&Section> {
        self.sections.iter().find(|s| s.order == order)
    }
}

impl Section {
    /// Active, non-deleted questions in this section.
    pub fn active_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.is_active && !q.is_deleted)
    }
}

impl Question {
    pub fn key(&self) -> VersionKey {
        VersionKey::new(self.name.clone(), self.version)
    }

    /// Options that have not been soft-deleted.
    pub fn live_options(&self) -> impl Iterator<Item = &QuestionOption> {
        self.options.iter().filter(|o| !o.is_deleted)
    }
}

impl QuestionOption {
    pub fn key(&self) -> VersionKey {
        VersionKey::new(self.name.clone(), self.version)
    }
}
