//! Store traits: the persistence seam.
//!
//! The engine never talks to a database directly. Each entity family gets a
//! narrow trait, implemented by the embedding application (and by
//! [`crate::memory::InMemoryStore`] for tests). Implementations are expected
//! to run every call of one engine operation inside one caller-owned
//! transaction.

use async_trait::async_trait;
use uuid::Uuid;

use candor_core::submission::{Answer, JobApplicationStep, Submission};
use candor_core::template::Template;

/// Infrastructure failure, wrapped with the operation that hit it.
#[derive(Debug, thiserror::Error)]
#[error("storage operation '{operation}' failed: {message}")]
pub struct StoreError {
    pub operation: &'static str,
    pub message: String,
}

impl StoreError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Template aggregates, stored whole per (name, version).
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn find(&self, name: &str, version: i32) -> Result<Option<Template>, StoreError>;

    /// Whether any version of this template name exists.
    async fn name_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Highest version persisted for this template name.
    async fn latest_version(&self, name: &str) -> Result<Option<i32>, StoreError>;

    async fn insert(&self, template: &Template) -> Result<(), StoreError>;

    /// Replace the stored aggregate for `(template.name, template.version)`.
    async fn update(&self, template: &Template) -> Result<(), StoreError>;

    async fn delete(&self, name: &str, version: i32) -> Result<(), StoreError>;
}

/// Version lookups across every question lineage.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Highest version ever persisted for this question name, across all
    /// template versions.
    async fn latest_version(&self, name: &str) -> Result<Option<i32>, StoreError>;
}

/// Version and name lookups across every option lineage.
#[async_trait]
pub trait OptionStore: Send + Sync {
    async fn latest_version(&self, name: &str) -> Result<Option<i32>, StoreError>;

    /// Whether a version-1 option row already claims this name.
    async fn name_taken(&self, name: &str) -> Result<bool, StoreError>;
}

/// Candidate submissions and their answer rows.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn find_by_step(&self, step_id: Uuid) -> Result<Option<Submission>, StoreError>;

    async fn insert(&self, submission: &Submission) -> Result<(), StoreError>;

    async fn update(&self, submission: &Submission) -> Result<(), StoreError>;

    async fn insert_answers(&self, answers: &[Answer]) -> Result<(), StoreError>;

    async fn answers_for(&self, submission_id: Uuid) -> Result<Vec<Answer>, StoreError>;

    /// How many submissions reference this template version. Non-zero means
    /// the version is in use.
    async fn count_for_template(&self, name: &str, version: i32) -> Result<i64, StoreError>;
}

/// Job application steps, as far as step completion needs them.
#[async_trait]
pub trait StepStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<JobApplicationStep>, StoreError>;

    async fn update(&self, step: &JobApplicationStep) -> Result<(), StoreError>;

    /// How many steps are assigned this template version.
    async fn count_for_template(&self, name: &str, version: i32) -> Result<i64, StoreError>;
}
