//! Option-level reconciliation.
//!
//! Operates on one question's option list. On a not-in-use template, edits
//! land in place and removals are immediate. On an in-use template, removals
//! are rejected outright, and any content change (an edited option or a new
//! one) forks the *owning question*: the fork carries every live option
//! forward at version + 1, merges in the triggering change, deactivates the
//! predecessor and returns. At most one fork per call; the caller re-invokes
//! for the rest.

use std::collections::HashSet;
use std::sync::Arc;

use candor_core::change_detection::option_changed;
use candor_core::input::OptionInput;
use candor_core::template::{Question, Template};
use candor_core::types::Timestamp;

use crate::error::EngineError;
use crate::factory::EntityFactory;
use crate::naming::OptionNameNormalizer;
use crate::sync::{apply_option_fields, find_live_option, SyncOutcome};
use crate::versioning::VersioningService;

pub struct OptionSyncHandler {
    versioning: Arc<VersioningService>,
    normalizer: Arc<OptionNameNormalizer>,
}

impl OptionSyncHandler {
    pub fn new(versioning: Arc<VersioningService>, normalizer: Arc<OptionNameNormalizer>) -> Self {
        Self {
            versioning,
            normalizer,
        }
    }

    /// Reconcile the option list of the question at
    /// `sections[section_idx].questions[question_idx]`.
    pub async fn sync_options(
        &self,
        template: &mut Template,
        section_idx: usize,
        question_idx: usize,
        incoming: &[OptionInput],
        in_use: bool,
        now: Timestamp,
    ) -> Result<SyncOutcome, EngineError> {
        let normalized: Vec<String> = {
            let question = &template.sections[section_idx].questions[question_idx];
            incoming
                .iter()
                .map(|input| self.normalizer.normalize_option_name(input, question))
                .collect()
        };

        // Delete phase: live options absent from the incoming payload.
        {
            let question = &template.sections[section_idx].questions[question_idx];
            let matched: HashSet<String> = normalized
                .iter()
                .filter_map(|name| {
                    find_live_option(question, name).map(|i| question.options[i].name.clone())
                })
                .collect();
            let has_removals = question.live_options().any(|o| !matched.contains(&o.name));
            if has_removals {
                if in_use {
                    return Err(EngineError::invariant(
                        "Options cannot be removed from an in-use template. \
                         Version the template first.",
                    ));
                }
                let question = &mut template.sections[section_idx].questions[question_idx];
                question
                    .options
                    .retain(|o| o.is_deleted || matched.contains(&o.name));
                question.updated_at = now;
            }
        }

        for (input, normalized_name) in incoming.iter().zip(&normalized) {
            let question = &template.sections[section_idx].questions[question_idx];
            match find_live_option(question, normalized_name) {
                Some(option_idx) => {
                    if !option_changed(&question.options[option_idx], input) {
                        continue;
                    }
                    if in_use {
                        let matched_name = question.options[option_idx].name.clone();
                        let snapshot = self
                            .fork_owning_question(
                                template,
                                section_idx,
                                question_idx,
                                input,
                                Some(&matched_name),
                                now,
                            )
                            .await?;
                        return Ok(SyncOutcome::Forked(snapshot));
                    }
                    let question = &mut template.sections[section_idx].questions[question_idx];
                    apply_option_fields(&mut question.options[option_idx], input, now);
                }
                None => {
                    if in_use {
                        let snapshot = self
                            .fork_owning_question(
                                template,
                                section_idx,
                                question_idx,
                                input,
                                None,
                                now,
                            )
                            .await?;
                        return Ok(SyncOutcome::Forked(snapshot));
                    }
                    let name = self
                        .normalizer
                        .ensure_unique_option_name_v1(normalized_name)
                        .await?;
                    let option = {
                        let question = &template.sections[section_idx].questions[question_idx];
                        EntityFactory::create_option(input, name, question, now)
                    };
                    template.sections[section_idx].questions[question_idx]
                        .options
                        .push(option);
                }
            }
        }

        Ok(SyncOutcome::Continue)
    }

    /// Fork the owning question because one of its options changed (or a new
    /// one arrived) while the template is in use.
    ///
    /// Every live option is carried forward at version + 1; the triggering
    /// input is merged into its carried row, or created fresh when it matched
    /// nothing. The predecessor question stays in the section, deactivated.
    async fn fork_owning_question(
        &self,
        template: &mut Template,
        section_idx: usize,
        question_idx: usize,
        input: &OptionInput,
        matched_option_name: Option<&str>,
        now: Timestamp,
    ) -> Result<Template, EngineError> {
        let pre_fork = template.sections[section_idx].questions[question_idx].clone();
        let mut forked = self
            .versioning
            .version_question(&pre_fork, pre_fork.section_id, now)
            .await?;

        for option in pre_fork.live_options() {
            let mut carried = self
                .versioning
                .version_option(option, &forked.name, forked.version, now)
                .await?;
            if matched_option_name.is_some_and(|name| name.eq_ignore_ascii_case(&option.name)) {
                apply_option_fields(&mut carried, input, now);
            }
            forked.options.push(carried);
        }

        if matched_option_name.is_none() {
            let desired = self.normalizer.normalize_option_name(input, &forked);
            let name = self.normalizer.ensure_unique_option_name_v1(&desired).await?;
            let option = EntityFactory::create_option(input, name, &forked, now);
            forked.options.push(option);
        }

        let section = &mut template.sections[section_idx];
        let predecessor = &mut section.questions[question_idx];
        predecessor.is_active = false;
        predecessor.updated_at = now;
        section.questions.push(forked);

        Ok(template.clone())
    }

    /// Rebuild a forked question's option set from an incoming payload
    /// against the pre-fork option map: exact-or-normalized-name matches are
    /// carried forward via the versioning service, true new options are
    /// created fresh. Used by the question-level handler.
    pub(crate) async fn carry_options_into_fork(
        &self,
        pre_fork: &Question,
        forked: &mut Question,
        incoming: &[OptionInput],
        now: Timestamp,
    ) -> Result<(), EngineError> {
        for input in incoming {
            let normalized = self.normalizer.normalize_option_name(input, pre_fork);
            match find_live_option(pre_fork, &normalized) {
                Some(option_idx) => {
                    let mut carried = self
                        .versioning
                        .version_option(
                            &pre_fork.options[option_idx],
                            &forked.name,
                            forked.version,
                            now,
                        )
                        .await?;
                    apply_option_fields(&mut carried, input, now);
                    forked.options.push(carried);
                }
                None => {
                    let name = self.normalizer.ensure_unique_option_name_v1(&normalized).await?;
                    let option = EntityFactory::create_option(input, name, forked, now);
                    forked.options.push(option);
                }
            }
        }
        Ok(())
    }
}
