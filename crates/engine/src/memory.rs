//! In-memory store implementing every store trait.
//!
//! Persistence proper lives outside this workspace; this implementation
//! backs the test suites and doubles as a reference for what the traits
//! expect. Template aggregates are stored whole, keyed by (name, version);
//! version lookups scan every stored aggregate so forked rows in any
//! template version count toward a lineage's latest version.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use candor_core::submission::{Answer, JobApplicationStep, Submission};
use candor_core::template::Template;

use crate::store::{
    OptionStore, QuestionStore, StepStore, StoreError, SubmissionStore, TemplateStore,
};

#[derive(Default)]
struct State {
    templates: HashMap<(String, i32), Template>,
    submissions: HashMap<Uuid, Submission>,
    answers: Vec<Answer>,
    steps: HashMap<Uuid, JobApplicationStep>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a job application step (steps are created by workflows outside
    /// this engine).
    pub fn put_step(&self, step: JobApplicationStep) {
        self.state().steps.insert(step.id, step);
    }

    /// Direct submission seeding for tests that need a pre-existing draft.
    pub fn put_submission(&self, submission: Submission) {
        self.state().submissions.insert(submission.id, submission);
    }
}

#[async_trait]
impl TemplateStore for InMemoryStore {
    async fn find(&self, name: &str, version: i32) -> Result<Option<Template>, StoreError> {
        Ok(self
            .state()
            .templates
            .get(&(name.to_string(), version))
            .cloned())
    }

    async fn name_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self
            .state()
            .templates
            .keys()
            .any(|(n, _)| n.eq_ignore_ascii_case(name)))
    }

    async fn latest_version(&self, name: &str) -> Result<Option<i32>, StoreError> {
        Ok(self
            .state()
            .templates
            .keys()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
            .max())
    }

    async fn insert(&self, template: &Template) -> Result<(), StoreError> {
        let key = (template.name.clone(), template.version);
        let mut state = self.state();
        if state.templates.contains_key(&key) {
            return Err(StoreError::new(
                "template.insert",
                format!("duplicate key {} v{}", template.name, template.version),
            ));
        }
        state.templates.insert(key, template.clone());
        Ok(())
    }

    async fn update(&self, template: &Template) -> Result<(), StoreError> {
        let key = (template.name.clone(), template.version);
        let mut state = self.state();
        if !state.templates.contains_key(&key) {
            return Err(StoreError::new(
                "template.update",
                format!("missing row {} v{}", template.name, template.version),
            ));
        }
        state.templates.insert(key, template.clone());
        Ok(())
    }

    async fn delete(&self, name: &str, version: i32) -> Result<(), StoreError> {
        self.state()
            .templates
            .remove(&(name.to_string(), version));
        Ok(())
    }
}

#[async_trait]
impl QuestionStore for InMemoryStore {
    async fn latest_version(&self, name: &str) -> Result<Option<i32>, StoreError> {
        Ok(self
            .state()
            .templates
            .values()
            .flat_map(|t| t.sections.iter())
            .flat_map(|s| s.questions.iter())
            .filter(|q| q.name.eq_ignore_ascii_case(name))
            .map(|q| q.version)
            .max())
    }
}

#[async_trait]
impl OptionStore for InMemoryStore {
    async fn latest_version(&self, name: &str) -> Result<Option<i32>, StoreError> {
        Ok(self
            .state()
            .templates
            .values()
            .flat_map(|t| t.sections.iter())
            .flat_map(|s| s.questions.iter())
            .flat_map(|q| q.options.iter())
            .filter(|o| o.name.eq_ignore_ascii_case(name))
            .map(|o| o.version)
            .max())
    }

    async fn name_taken(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self
            .state()
            .templates
            .values()
            .flat_map(|t| t.sections.iter())
            .flat_map(|s| s.questions.iter())
            .flat_map(|q| q.options.iter())
            .any(|o| o.version == 1 && o.name.eq_ignore_ascii_case(name)))
    }
}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    async fn find_by_step(&self, step_id: Uuid) -> Result<Option<Submission>, StoreError> {
        Ok(self
            .state()
            .submissions
            .values()
            .find(|s| s.job_application_step_id == step_id)
            .cloned())
    }

    async fn insert(&self, submission: &Submission) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.submissions.contains_key(&submission.id) {
            return Err(StoreError::new(
                "submission.insert",
                format!("duplicate key {}", submission.id),
            ));
        }
        state.submissions.insert(submission.id, submission.clone());
        Ok(())
    }

    async fn update(&self, submission: &Submission) -> Result<(), StoreError> {
        let mut state = self.state();
        if !state.submissions.contains_key(&submission.id) {
            return Err(StoreError::new(
                "submission.update",
                format!("missing row {}", submission.id),
            ));
        }
        state.submissions.insert(submission.id, submission.clone());
        Ok(())
    }

    async fn insert_answers(&self, answers: &[Answer]) -> Result<(), StoreError> {
        self.state().answers.extend(answers.iter().cloned());
        Ok(())
    }

    async fn answers_for(&self, submission_id: Uuid) -> Result<Vec<Answer>, StoreError> {
        Ok(self
            .state()
            .answers
            .iter()
            .filter(|a| a.submission_id == submission_id)
            .cloned()
            .collect())
    }

    async fn count_for_template(&self, name: &str, version: i32) -> Result<i64, StoreError> {
        Ok(self
            .state()
            .submissions
            .values()
            .filter(|s| {
                s.template_name.eq_ignore_ascii_case(name) && s.template_version == version
            })
            .count() as i64)
    }
}

#[async_trait]
impl StepStore for InMemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<JobApplicationStep>, StoreError> {
        Ok(self.state().steps.get(&id).cloned())
    }

    async fn update(&self, step: &JobApplicationStep) -> Result<(), StoreError> {
        let mut state = self.state();
        if !state.steps.contains_key(&step.id) {
            return Err(StoreError::new(
                "step.update",
                format!("missing row {}", step.id),
            ));
        }
        state.steps.insert(step.id, step.clone());
        Ok(())
    }

    async fn count_for_template(&self, name: &str, version: i32) -> Result<i64, StoreError> {
        Ok(self
            .state()
            .steps
            .values()
            .filter(|s| {
                s.template_name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
                    && s.template_version == Some(version)
            })
            .count() as i64)
    }
}
