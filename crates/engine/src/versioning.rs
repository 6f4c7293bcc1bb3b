//! Copy-on-write forking of questions and options.
//!
//! A fork creates a fresh active row at (name, latest-known version + 1);
//! the predecessor row is left untouched here; deactivating it is the
//! caller's move, inside the same sync step, so a cancelled call never
//! leaves a forked child without its reparented predecessor.

use std::sync::Arc;

use uuid::Uuid;

use candor_core::template::{Question, QuestionOption};
use candor_core::types::Timestamp;

use crate::error::EngineError;
use crate::store::{OptionStore, QuestionStore};

pub struct VersioningService {
    questions: Arc<dyn QuestionStore>,
    options: Arc<dyn OptionStore>,
}

impl VersioningService {
    pub fn new(questions: Arc<dyn QuestionStore>, options: Arc<dyn OptionStore>) -> Self {
        Self { questions, options }
    }

    /// Fork a question to the next version under the given section.
    ///
    /// The new row starts active with an empty option set; the caller
    /// rebuilds the options it should carry.
    pub async fn version_question(
        &self,
        source: &Question,
        section_id: Uuid,
        now: Timestamp,
    ) -> Result<Question, EngineError> {
        let latest = self.questions.latest_version(&source.name).await?;
        let next_version = latest.unwrap_or(source.version) + 1;

        Ok(Question {
            name: source.name.clone(),
            version: next_version,
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
            options: Vec::new(),
        })
    }

    /// Fork an option to the next version, attached to a (freshly forked)
    /// question row.
    pub async fn version_option(
        &self,
        source: &QuestionOption,
        new_question_name: &str,
        new_question_version: i32,
        now: Timestamp,
    ) -> Result<QuestionOption, EngineError> {
        let latest = self.options.latest_version(&source.name).await?;
        let next_version = latest.unwrap_or(source.version) + 1;

        Ok(QuestionOption {
            name: source.name.clone(),
            version: next_version,
            question_name: new_question_name.to_string(),
            question_version: new_question_version,
            order: source.order,
            label: source.label.clone(),
            is_correct: source.is_correct,
            score: source.score,
            weight: source.weight,
            wa: source.wa,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use candor_core::template::QuestionType;
    use chrono::Utc;

    use crate::store::StoreError;

    struct FixedVersions {
        question: Option<i32>,
        option: Option<i32>,
    }

    #[async_trait]
    impl QuestionStore for FixedVersions {
        async fn latest_version(&self, _name: &str) -> Result<Option<i32>, StoreError> {
            Ok(self.question)
        }
    }

    #[async_trait]
    impl OptionStore for FixedVersions {
        async fn latest_version(&self, _name: &str) -> Result<Option<i32>, StoreError> {
            Ok(self.option)
        }

        async fn name_taken(&self, _name: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    fn service(question: Option<i32>, option: Option<i32>) -> VersioningService {
        let store = Arc::new(FixedVersions { question, option });
        VersioningService::new(store.clone(), store)
    }

    fn source_question() -> Question {
        let now = Utc::now();
        Question {
            name: "q1".to_string(),
            version: 1,
            section_id: Uuid::new_v4(),
            order: 2,
            is_active: true,
            is_deleted: false,
            question_type: QuestionType::SingleChoice,
            text: "Pick".to_string(),
            is_required: true,
            weight: None,
            trait_key: Some("openness".to_string()),
            created_at: now,
            updated_at: now,
            options: Vec::new(),
        }
    }

    #[tokio::test]
    async fn fork_uses_latest_known_version() {
        // Another template version already carries q1 v3.
        let svc = service(Some(3), None);
        let forked = svc
            .version_question(&source_question(), Uuid::new_v4(), Utc::now())
            .await
            .unwrap();
        assert_eq!(forked.version, 4);
        assert!(forked.is_active);
        assert!(forked.options.is_empty());
    }

    #[tokio::test]
    async fn fork_falls_back_to_source_version() {
        let svc = service(None, None);
        let forked = svc
            .version_question(&source_question(), Uuid::new_v4(), Utc::now())
            .await
            .unwrap();
        assert_eq!(forked.version, 2);
        assert_eq!(forked.trait_key.as_deref(), Some("openness"));
    }

    #[tokio::test]
    async fn option_fork_repoints_at_new_question_row() {
        let svc = service(None, Some(5));
        let now = Utc::now();
        let source = QuestionOption {
            name: "q1_a".to_string(),
            version: 2,
            question_name: "q1".to_string(),
            question_version: 1,
            order: 1,
            label: "A".to_string(),
            is_correct: Some(true),
            score: None,
            weight: None,
            wa: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        let forked = svc.version_option(&source, "q1", 2, now).await.unwrap();
        assert_eq!(forked.version, 6);
        assert_eq!(forked.question_name, "q1");
        assert_eq!(forked.question_version, 2);
        assert_eq!(forked.is_correct, Some(true));
    }
}
