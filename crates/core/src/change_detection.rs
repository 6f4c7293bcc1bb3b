//! Field-by-field change detection for sync.
//!
//! Pure comparisons with no side effects, so re-running a sync against
//! identical input is a no-op. String fields are compared trimmed, with a
//! missing value equal to an empty one; nullable numerics compare exactly.

use crate::input::{OptionInput, QuestionInput, SectionInput, TemplateInput};
use crate::template::{Question, QuestionOption, Section, Template};

/// Trimmed string equality where `None` and `""` are the same value.
fn text_eq(a: Option<&str>, b: Option<&str>) -> bool {
    a.map(str::trim).unwrap_or("") == b.map(str::trim).unwrap_or("")
}

/// Root-level template fields an update payload can carry.
pub fn template_fields_changed(existing: &Template, incoming: &TemplateInput) -> bool {
    existing.template_type != incoming.template_type
        || existing.status != incoming.status
        || !text_eq(existing.title.as_deref(), incoming.title.as_deref())
        || !text_eq(
            existing.description.as_deref(),
            incoming.description.as_deref(),
        )
        || existing.time_limit_seconds != incoming.time_limit_seconds
}

/// Section fields; order is identity, not content.
pub fn section_changed(existing: &Section, incoming: &SectionInput) -> bool {
    !text_eq(Some(&existing.title), Some(&incoming.title))
        || !text_eq(
            existing.description.as_deref(),
            incoming.description.as_deref(),
        )
}

/// All externally editable question fields.
pub fn question_changed(existing: &Question, incoming: &QuestionInput) -> bool {
    existing.order != incoming.order
        || existing.question_type != incoming.question_type
        || !text_eq(Some(&existing.text), Some(&incoming.text))
        || existing.is_required != incoming.is_required
        || existing.weight != incoming.weight
        || !text_eq(
            existing.trait_key.as_deref(),
            incoming.trait_key.as_deref(),
        )
}

/// All externally editable option fields.
pub fn option_changed(existing: &QuestionOption, incoming: &OptionInput) -> bool {
    existing.order != incoming.order
        || !text_eq(Some(&existing.label), Some(&incoming.label))
        || existing.is_correct != incoming.is_correct
        || existing.score != incoming.score
        || existing.weight != incoming.weight
        || existing.wa != incoming.wa
}
