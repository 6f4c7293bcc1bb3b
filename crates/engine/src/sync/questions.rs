//! Question-level reconciliation.
//!
//! Questions match by name only; sync always targets the active row of a
//! lineage, never a specific version. A matched content change on an in-use
//! template forks the question and rebuilds its options from the pre-fork
//! map; anything else updates in place and delegates to the option handler,
//! propagating its outcome unchanged.

use std::sync::Arc;

use candor_core::change_detection::question_changed;
use candor_core::input::QuestionInput;
use candor_core::template::Template;
use candor_core::types::Timestamp;

use crate::error::EngineError;
use crate::factory::EntityFactory;
use crate::naming::{generate_question_name, OptionNameNormalizer};
use crate::sync::{apply_question_fields, OptionSyncHandler, SyncOutcome};
use crate::versioning::VersioningService;

pub struct QuestionSyncHandler {
    versioning: Arc<VersioningService>,
    normalizer: Arc<OptionNameNormalizer>,
    options: OptionSyncHandler,
}

impl QuestionSyncHandler {
    pub fn new(versioning: Arc<VersioningService>, normalizer: Arc<OptionNameNormalizer>) -> Self {
        let options = OptionSyncHandler::new(versioning.clone(), normalizer.clone());
        Self {
            versioning,
            normalizer,
            options,
        }
    }

    /// Reconcile the question list of `sections[section_idx]`.
    pub async fn sync_questions(
        &self,
        template: &mut Template,
        section_idx: usize,
        incoming: &[QuestionInput],
        in_use: bool,
        now: Timestamp,
    ) -> Result<SyncOutcome, EngineError> {
        let incoming_names: Vec<String> = incoming
            .iter()
            .filter_map(|q| q.name.as_deref())
            .map(|n| n.trim().to_ascii_lowercase())
            .filter(|n| !n.is_empty())
            .collect();

        // Delete phase: active lineages absent from the incoming payload.
        {
            let section = &template.sections[section_idx];
            let removing: Vec<String> = section
                .active_questions()
                .filter(|q| !incoming_names.contains(&q.name.to_ascii_lowercase()))
                .map(|q| q.name.to_ascii_lowercase())
                .collect();
            if !removing.is_empty() {
                if in_use {
                    return Err(EngineError::invariant(
                        "Questions cannot be removed from an in-use template. \
                         Version the template first.",
                    ));
                }
                let section = &mut template.sections[section_idx];
                section
                    .questions
                    .retain(|q| !removing.contains(&q.name.to_ascii_lowercase()));
                section.updated_at = now;
            }
        }

        for input in incoming {
            let name = input.name.as_deref().map(str::trim).unwrap_or("");
            let matched_idx = if name.is_empty() {
                None
            } else {
                template.sections[section_idx]
                    .questions
                    .iter()
                    .position(|q| {
                        q.is_active && !q.is_deleted && q.name.eq_ignore_ascii_case(name)
                    })
            };

            match matched_idx {
                Some(question_idx) => {
                    let changed = question_changed(
                        &template.sections[section_idx].questions[question_idx],
                        input,
                    );

                    if changed && in_use {
                        let snapshot = self
                            .fork_question(template, section_idx, question_idx, input, now)
                            .await?;
                        return Ok(SyncOutcome::Forked(snapshot));
                    }

                    if changed {
                        let question =
                            &mut template.sections[section_idx].questions[question_idx];
                        apply_question_fields(question, input, now);
                    }

                    let outcome = self
                        .options
                        .sync_options(
                            template,
                            section_idx,
                            question_idx,
                            &input.options,
                            in_use,
                            now,
                        )
                        .await?;
                    if outcome.is_forked() {
                        return Ok(outcome);
                    }
                }
                None => {
                    if in_use {
                        // Asymmetric with options on purpose: a new option
                        // folds into a question fork, but a new question
                        // requires the caller to version the template root.
                        return Err(EngineError::invariant(
                            "Questions cannot be added to an in-use template. \
                             Version the template first.",
                        ));
                    }
                    self.create_question(template, section_idx, input, now).await?;
                }
            }
        }

        Ok(SyncOutcome::Continue)
    }

    /// Fork a question whose own fields changed while the template is in
    /// use, then rebuild its options from the incoming payload.
    async fn fork_question(
        &self,
        template: &mut Template,
        section_idx: usize,
        question_idx: usize,
        input: &QuestionInput,
        now: Timestamp,
    ) -> Result<Template, EngineError> {
        let pre_fork = template.sections[section_idx].questions[question_idx].clone();
        let mut forked = self
            .versioning
            .version_question(&pre_fork, pre_fork.section_id, now)
            .await?;
        apply_question_fields(&mut forked, input, now);

        self.options
            .carry_options_into_fork(&pre_fork, &mut forked, &input.options, now)
            .await?;

        let section = &mut template.sections[section_idx];
        let predecessor = &mut section.questions[question_idx];
        predecessor.is_active = false;
        predecessor.updated_at = now;
        section.questions.push(forked);

        Ok(template.clone())
    }

    /// Create a brand-new question lineage (not-in-use templates only).
    async fn create_question(
        &self,
        template: &mut Template,
        section_idx: usize,
        input: &QuestionInput,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let explicit = input.name.as_deref().map(str::trim).unwrap_or("");
        let name = if explicit.is_empty() {
            generate_question_name(&template.name, template.version, input.text.trim())
        } else {
            explicit.to_string()
        };

        let section_id = template.sections[section_idx].id;
        let mut question = EntityFactory::create_question(input, name, section_id, now);

        for option_input in &input.options {
            let desired = self.normalizer.normalize_option_name(option_input, &question);
            let option_name = self.normalizer.ensure_unique_option_name_v1(&desired).await?;
            let option = EntityFactory::create_option(option_input, option_name, &question, now);
            question.options.push(option);
        }

        template.sections[section_idx].questions.push(question);
        Ok(())
    }
}
