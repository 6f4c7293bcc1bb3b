//! Admin-facing template operations.
//!
//! `TemplateService` is the entry point the sync cascade hangs off: create,
//! in-place update (with the in-use gate), whole-template version fork,
//! publish, archive/delete, restore, and duplicate-under-a-new-name.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use candor_core::change_detection::template_fields_changed;
use candor_core::input::{DuplicateRequest, TemplateInput};
use candor_core::template::{Question, QuestionOption, Section, Template, TemplateStatus};
use candor_core::types::Timestamp;

use crate::error::EngineError;
use crate::factory::{EntityFactory, INITIAL_VERSION};
use crate::naming::{generate_question_name, OptionNameNormalizer};
use crate::store::{OptionStore, QuestionStore, StepStore, SubmissionStore, TemplateStore};
use crate::sync::{
    apply_question_fields, OptionSyncHandler, QuestionSyncHandler, SectionSyncHandler, SyncOutcome,
};
use crate::versioning::VersioningService;

/// What `delete` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// The version was in use; it was archived (soft-deleted).
    Archived,
    /// Nothing referenced the version; the row is gone.
    Deleted,
}

pub struct TemplateService {
    templates: Arc<dyn TemplateStore>,
    submissions: Arc<dyn SubmissionStore>,
    steps: Arc<dyn StepStore>,
    versioning: Arc<VersioningService>,
    normalizer: Arc<OptionNameNormalizer>,
    sections: SectionSyncHandler,
    option_sync: OptionSyncHandler,
}

impl TemplateService {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        questions: Arc<dyn QuestionStore>,
        options: Arc<dyn OptionStore>,
        submissions: Arc<dyn SubmissionStore>,
        steps: Arc<dyn StepStore>,
    ) -> Self {
        let versioning = Arc::new(VersioningService::new(questions, options.clone()));
        let normalizer = Arc::new(OptionNameNormalizer::new(options));
        let sections = SectionSyncHandler::new(QuestionSyncHandler::new(
            versioning.clone(),
            normalizer.clone(),
        ));
        let option_sync = OptionSyncHandler::new(versioning.clone(), normalizer.clone());
        Self {
            templates,
            submissions,
            steps,
            versioning,
            normalizer,
            sections,
            option_sync,
        }
    }

    /// Create a new template lineage at version 1, Draft.
    pub async fn create(&self, input: &TemplateInput) -> Result<Template, EngineError> {
        validate_input(input)?;

        let name = input.name.trim().to_string();
        if self.templates.name_exists(&name).await? {
            return Err(EngineError::conflict(format!(
                "A questionnaire template named '{name}' already exists. \
                 Use a different name, or update it to create a new version."
            )));
        }

        let now = Utc::now();
        let mut template = new_template_shell(&name, INITIAL_VERSION, input, now);
        for section_input in &input.sections {
            let mut section = new_section(&template, section_input, now);
            for question_input in &section_input.questions {
                let question = self
                    .build_new_question(&template, section.id, question_input, now)
                    .await?;
                section.questions.push(question);
            }
            template.sections.push(section);
        }

        self.templates.insert(&template).await?;
        tracing::info!(name = %template.name, "created questionnaire template");
        Ok(template)
    }

    /// Update a template version.
    ///
    /// With `should_update_version` set, the whole template forks to the next
    /// version. Otherwise the edit lands in place, gated by the in-use rules,
    /// and the section cascade runs; a fork surfaced by the cascade is
    /// persisted and returned in place of the in-place result.
    pub async fn update(&self, input: &TemplateInput) -> Result<Template, EngineError> {
        validate_input(input)?;

        if input.should_update_version {
            return self.fork_template(input).await;
        }

        let name = input.name.trim();
        let mut existing = self
            .templates
            .find(name, input.version)
            .await?
            .ok_or_else(|| {
                EngineError::not_found("template", format!("{name} v{}", input.version))
            })?;

        let in_use = self
            .submissions
            .count_for_template(&existing.name, existing.version)
            .await?
            > 0;

        let now = Utc::now();
        if template_fields_changed(&existing, input) {
            if in_use {
                return Err(EngineError::invariant(
                    "Template is in use. Template fields cannot be edited. \
                     Version the template first.",
                ));
            }
            existing.template_type = input.template_type;
            existing.status = input.status;
            existing.title = trim_optional(input.title.as_deref());
            existing.description = input.description.clone();
            existing.time_limit_seconds = input.time_limit_seconds;
        }
        existing.updated_at = now;

        let outcome = self
            .sections
            .sync_sections(&mut existing, &input.sections, in_use, now)
            .await?;

        let result = match outcome {
            SyncOutcome::Forked(forked) => {
                tracing::info!(
                    name = %forked.name,
                    version = forked.version,
                    "sync forked a question on an in-use template"
                );
                forked
            }
            SyncOutcome::Continue => existing,
        };

        self.templates.update(&result).await?;
        Ok(result)
    }

    /// Fork a whole template to the next version.
    ///
    /// Every question lineage named in the payload that exists in the source
    /// is versioned forward (options alongside) into fresh section rows; no
    /// row is shared between the two template versions. The source stays
    /// untouched, so pinned submissions keep resolving.
    async fn fork_template(&self, input: &TemplateInput) -> Result<Template, EngineError> {
        let name = input.name.trim();
        let source = self
            .templates
            .find(name, input.version)
            .await?
            .ok_or_else(|| {
                EngineError::not_found("template", format!("{name} v{}", input.version))
            })?;

        let now = Utc::now();
        let next_version = self
            .templates
            .latest_version(&source.name)
            .await?
            .unwrap_or(source.version)
            + 1;

        let mut fork = new_template_shell(&source.name, next_version, input, now);
        for section_input in &input.sections {
            let mut section = new_section(&fork, section_input, now);
            for question_input in &section_input.questions {
                let source_question = question_input
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .and_then(|n| {
                        source
                            .sections
                            .iter()
                            .flat_map(|s| s.questions.iter())
                            .find(|q| {
                                q.is_active && !q.is_deleted && q.name.eq_ignore_ascii_case(n)
                            })
                    });

                let question = match source_question {
                    Some(src) => {
                        let mut forked_question = self
                            .versioning
                            .version_question(src, section.id, now)
                            .await?;
                        apply_question_fields(&mut forked_question, question_input, now);
                        self.option_sync
                            .carry_options_into_fork(
                                src,
                                &mut forked_question,
                                &question_input.options,
                                now,
                            )
                            .await?;
                        forked_question
                    }
                    None => {
                        self.build_new_question(&fork, section.id, question_input, now)
                            .await?
                    }
                };
                section.questions.push(question);
            }
            fork.sections.push(section);
        }

        self.templates.insert(&fork).await?;
        tracing::info!(name = %fork.name, version = fork.version, "forked template");
        Ok(fork)
    }

    /// Publish a draft. Idempotent: publishing a published version is a
    /// no-op.
    pub async fn publish(&self, name: &str, version: i32) -> Result<(), EngineError> {
        let mut template = self
            .templates
            .find(name, version)
            .await?
            .ok_or_else(|| EngineError::not_found("template", format!("{name} v{version}")))?;

        if template.status == TemplateStatus::Published {
            return Ok(());
        }

        let now = Utc::now();
        template.status = TemplateStatus::Published;
        template.published_at = Some(now);
        template.updated_at = now;
        self.templates.update(&template).await?;
        tracing::info!(name = %name, version, "published questionnaire template");
        Ok(())
    }

    /// Delete a template version: archive when anything references it,
    /// hard-delete otherwise.
    pub async fn delete(&self, name: &str, version: i32) -> Result<DeleteMode, EngineError> {
        let mut template = self
            .templates
            .find(name, version)
            .await?
            .ok_or_else(|| EngineError::not_found("template", format!("{name} v{version}")))?;

        let in_use_by_steps = self.steps.count_for_template(name, version).await? > 0;
        let in_use_by_submissions =
            self.submissions.count_for_template(name, version).await? > 0;

        if in_use_by_steps || in_use_by_submissions {
            template.is_deleted = true;
            template.updated_at = Utc::now();
            self.templates.update(&template).await?;
            return Ok(DeleteMode::Archived);
        }

        self.templates.delete(name, version).await?;
        Ok(DeleteMode::Deleted)
    }

    /// Undo an archive. No-op if the version is not archived.
    pub async fn restore(&self, name: &str, version: i32) -> Result<(), EngineError> {
        let mut template = self
            .templates
            .find(name, version)
            .await?
            .ok_or_else(|| EngineError::not_found("template", format!("{name} v{version}")))?;

        if !template.is_deleted {
            return Ok(());
        }

        template.is_deleted = false;
        template.updated_at = Utc::now();
        self.templates.update(&template).await?;
        Ok(())
    }

    /// Copy a template under a new name at version 1, Draft. Question and
    /// option lineages get brand-new generated names so the copy never
    /// collides with the source's history.
    pub async fn duplicate(
        &self,
        source_name: &str,
        source_version: i32,
        request: &DuplicateRequest,
    ) -> Result<Template, EngineError> {
        request
            .validate()
            .map_err(|e| EngineError::validation(e.to_string()))?;

        let new_name = request.new_name.trim().to_string();
        if self.templates.name_exists(&new_name).await? {
            return Err(EngineError::conflict(format!(
                "A questionnaire template named '{new_name}' already exists."
            )));
        }

        let source = self
            .templates
            .find(source_name, source_version)
            .await?
            .ok_or_else(|| {
                EngineError::not_found("template", format!("{source_name} v{source_version}"))
            })?;

        let now = Utc::now();
        let mut copy = Template {
            name: new_name.clone(),
            version: INITIAL_VERSION,
            template_type: source.template_type,
            status: TemplateStatus::Draft,
            title: request.include_title.then(|| source.title.clone()).flatten(),
            description: request
                .include_description
                .then(|| source.description.clone())
                .flatten(),
            time_limit_seconds: source.time_limit_seconds,
            published_at: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
            sections: Vec::new(),
        };

        if request.include_questions {
            for section in &source.sections {
                let section_id = Uuid::new_v4();
                let mut questions = Vec::new();
                for question in section.active_questions() {
                    questions.push(copy_question(question, section_id, now));
                }
                copy.sections.push(Section {
                    id: section_id,
                    template_name: copy.name.clone(),
                    template_version: copy.version,
                    order: section.order,
                    title: section.title.clone(),
                    description: section.description.clone(),
                    created_at: now,
                    updated_at: now,
                    questions,
                });
            }
        }

        self.templates.insert(&copy).await?;
        tracing::info!(source = %source_name, name = %copy.name, "duplicated questionnaire template");
        Ok(copy)
    }

    /// Build a brand-new question (with options) for create and fork flows.
    async fn build_new_question(
        &self,
        template: &Template,
        section_id: Uuid,
        input: &candor_core::input::QuestionInput,
        now: Timestamp,
    ) -> Result<Question, EngineError> {
        let explicit = input.name.as_deref().map(str::trim).unwrap_or("");
        let name = if explicit.is_empty() {
            generate_question_name(&template.name, template.version, input.text.trim())
        } else {
            explicit.to_string()
        };

        let mut question = EntityFactory::create_question(input, name, section_id, now);
        for option_input in &input.options {
            let desired = self.normalizer.normalize_option_name(option_input, &question);
            let option_name = self.normalizer.ensure_unique_option_name_v1(&desired).await?;
            let option = EntityFactory::create_option(option_input, option_name, &question, now);
            question.options.push(option);
        }
        Ok(question)
    }
}

fn validate_input(input: &TemplateInput) -> Result<(), EngineError> {
    input
        .validate()
        .map_err(|e| EngineError::validation(e.to_string()))
}

fn trim_optional(value: Option<&str>) -> Option<String> {
    let trimmed = value.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn new_template_shell(
    name: &str,
    version: i32,
    input: &TemplateInput,
    now: Timestamp,
) -> Template {
    Template {
        name: name.to_string(),
        version,
        template_type: input.template_type,
        status: TemplateStatus::Draft,
        title: trim_optional(input.title.as_deref()),
        description: input.description.clone(),
        time_limit_seconds: input.time_limit_seconds,
        published_at: None,
        is_deleted: false,
        created_at: now,
        updated_at: now,
        sections: Vec::new(),
    }
}

fn new_section(
    template: &Template,
    input: &candor_core::input::SectionInput,
    now: Timestamp,
) -> Section {
    Section {
        id: input.id.unwrap_or_else(Uuid::new_v4),
        template_name: template.name.clone(),
        template_version: template.version,
        order: input.order,
        title: input.title.trim().to_string(),
        description: input.description.clone(),
        created_at: now,
        updated_at: now,
        questions: Vec::new(),
    }
}

/// Deep-copy a question for duplication: fresh generated names, version 1.
fn copy_question(source: &Question, section_id: Uuid, now: Timestamp) -> Question {
    let name = Uuid::new_v4().to_string();
    let options = source
        .live_options()
        .map(|o| QuestionOption {
            name: Uuid::new_v4().to_string(),
            version: INITIAL_VERSION,
            question_name: name.clone(),
            question_version: INITIAL_VERSION,
            order: o.order,
            label: o.label.clone(),
            is_correct: o.is_correct,
            score: o.score,
            weight: o.weight,
            wa: o.wa,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        })
        .collect();

    Question {
        name,
        version: INITIAL_VERSION,
        section_id,
        order: source.order,
        is_active: true,
        is_deleted: false,
        question_type: source.question_type,
        text: source.text.clone(),
        is_required: source.is_required,
        weight: source.weight,
        trait_key: source.trait_key.clone(),
        created_at: now,
        updated_at: now,
        options,
    }
}
