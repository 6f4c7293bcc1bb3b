//! The template sync cascade: sections → questions → options.
//!
//! Each handler reconciles one level of an owned template aggregate against
//! an incoming payload. While a template version is not in use, edits land in
//! place; once it is in use, content changes fork the smallest affected
//! entity and the cascade stops at the first fork. Callers re-invoke until
//! [`SyncOutcome::Continue`] comes back; each pass makes monotonic progress,
//! so multi-change payloads converge.
//!
//! The `in_use` predicate is computed once per top-level call and threaded
//! down unchanged; handlers never recompute it mid-cascade.

mod options;
mod questions;
mod sections;

pub use options::OptionSyncHandler;
pub use questions::QuestionSyncHandler;
pub use sections::SectionSyncHandler;

use candor_core::input::{OptionInput, QuestionInput, SectionInput};
use candor_core::keys::strip_legacy_prefix;
use candor_core::template::{Question, QuestionOption, Section, Template};
use candor_core::types::Timestamp;

/// Result of one sync pass.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// All incoming items reconciled; nothing forked.
    Continue,
    /// A fork happened; the snapshot carries the updated aggregate. Remaining
    /// incoming items were deferred; re-invoke to pick them up.
    Forked(Template),
}

impl SyncOutcome {
    pub fn is_forked(&self) -> bool {
        matches!(self, SyncOutcome::Forked(_))
    }
}

/// Find the live option an incoming (normalized) name refers to.
///
/// Exact case-insensitive match first, then the legacy spelling where the
/// stored name carries a `{question_name}_` prefix.
pub(crate) fn find_live_option(question: &Question, normalized_name: &str) -> Option<usize> {
    let direct = question
        .options
        .iter()
        .position(|o| !o.is_deleted && o.name.eq_ignore_ascii_case(normalized_name));
    if direct.is_some() {
        return direct;
    }

    question.options.iter().position(|o| {
        !o.is_deleted
            && strip_legacy_prefix(&o.name, &question.name)
                .is_some_and(|stripped| stripped.eq_ignore_ascii_case(normalized_name))
    })
}

pub(crate) fn apply_section_fields(section: &mut Section, input: &SectionInput, now: Timestamp) {
    section.title = input.title.trim().to_string();
    section.description = input.description.clone();
    section.updated_at = now;
}

pub(crate) fn apply_question_fields(question: &mut Question, input: &QuestionInput, now: Timestamp) {
    question.order = input.order;
    question.question_type = input.question_type;
    question.text = input.text.trim().to_string();
    question.is_required = input.is_required;
    question.weight = input.weight;
    question.trait_key = input
        .trait_key
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    question.updated_at = now;
}

pub(crate) fn apply_option_fields(option: &mut QuestionOption, input: &OptionInput, now: Timestamp) {
    option.order = input.order;
    option.label = input.label.trim().to_string();
    option.is_correct = input.is_correct;
    option.score = input.score;
    option.weight = input.weight;
    option.wa = input.wa;
    option.updated_at = now;
}
