//! Section-level reconciliation, the top of the cascade.
//!
//! Sections match by order (positional identity within one template version)
//! and are not independently versioned, so a real field edit on an in-use
//! section is a hard error; only edits that leave the stored values
//! textually identical pass. The first fork surfaced by a lower level
//! short-circuits the whole call.

use std::collections::HashSet;

use uuid::Uuid;

use candor_core::change_detection::section_changed;
use candor_core::input::SectionInput;
use candor_core::template::{Section, Template};
use candor_core::types::Timestamp;

use crate::error::EngineError;
use crate::sync::{apply_section_fields, QuestionSyncHandler, SyncOutcome};

pub struct SectionSyncHandler {
    questions: QuestionSyncHandler,
}

impl SectionSyncHandler {
    pub fn new(questions: QuestionSyncHandler) -> Self {
        Self { questions }
    }

    /// Reconcile a template's section list against the incoming payload.
    ///
    /// `in_use` must be computed once by the caller for this template
    /// version and is threaded down the whole cascade unchanged.
    pub async fn sync_sections(
        &self,
        template: &mut Template,
        incoming: &[SectionInput],
        in_use: bool,
        now: Timestamp,
    ) -> Result<SyncOutcome, EngineError> {
        // Delete phase: sections at orders absent from the payload.
        let incoming_orders: HashSet<i32> = incoming.iter().map(|s| s.order).collect();
        if template
            .sections
            .iter()
            .any(|s| !incoming_orders.contains(&s.order))
        {
            if in_use {
                return Err(EngineError::invariant(
                    "Sections cannot be removed from an in-use template. \
                     Version the template first.",
                ));
            }
            template.sections.retain(|s| incoming_orders.contains(&s.order));
            template.updated_at = now;
        }

        for input in incoming {
            let section_idx = match template
                .sections
                .iter()
                .position(|s| s.order == input.order)
            {
                Some(idx) => {
                    if section_changed(&template.sections[idx], input) {
                        if in_use {
                            return Err(EngineError::invariant(
                                "Sections of an in-use template cannot be edited. \
                                 Version the template first.",
                            ));
                        }
                        apply_section_fields(&mut template.sections[idx], input, now);
                    }
                    idx
                }
                None => {
                    if in_use {
                        return Err(EngineError::invariant(
                            "Sections cannot be added to an in-use template. \
                             Version the template first.",
                        ));
                    }
                    template.sections.push(Section {
                        id: input.id.unwrap_or_else(Uuid::new_v4),
                        template_name: template.name.clone(),
                        template_version: template.version,
                        order: input.order,
                        title: input.title.trim().to_string(),
                        description: input.description.clone(),
                        created_at: now,
                        updated_at: now,
                        questions: Vec::new(),
                    });
                    template.sections.len() - 1
                }
            };

            let outcome = self
                .questions
                .sync_questions(template, section_idx, &input.questions, in_use, now)
                .await?;
            if outcome.is_forked() {
                return Ok(outcome);
            }
        }

        Ok(SyncOutcome::Continue)
    }
}
