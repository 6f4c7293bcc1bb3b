//! Candidate submission processing.
//!
//! One atomic pass: validate → build answers → create-or-reuse the
//! submission → persist answers → finalize status and scores → mark the
//! owning step completed. User-input failures come back as a validation
//! error list; only infrastructure failures propagate as errors. A
//! step-completion failure after the answers are durable is logged and
//! swallowed; persisted answers are never rolled back.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use candor_core::answer_builder::build_answers;
use candor_core::personality::PersonalityScoreCalculator;
use candor_core::submission::{StepStatus, Submission, SubmissionStatus};
use candor_core::submission_checks::{
    validate_request, validate_submission_status, ValidationError,
};
use candor_core::input::SubmitRequest;
use candor_core::template::{Template, TemplateType};
use candor_core::types::Timestamp;

use crate::error::EngineError;
use crate::store::{StepStore, StoreError, SubmissionStore};

/// What the caller gets back from a successful submission.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub status: SubmissionStatus,
    pub submitted_at: Option<Timestamp>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The request failed validation; nothing was persisted.
    #[error("submission rejected with {} validation error(s)", .0.len())]
    Invalid(Vec<ValidationError>),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<StoreError> for SubmitError {
    fn from(e: StoreError) -> Self {
        SubmitError::Engine(e.into())
    }
}

pub struct SubmissionOrchestrator {
    submissions: Arc<dyn SubmissionStore>,
    steps: Arc<dyn StepStore>,
    personality: Arc<dyn PersonalityScoreCalculator>,
}

impl SubmissionOrchestrator {
    pub fn new(
        submissions: Arc<dyn SubmissionStore>,
        steps: Arc<dyn StepStore>,
        personality: Arc<dyn PersonalityScoreCalculator>,
    ) -> Self {
        Self {
            submissions,
            steps,
            personality,
        }
    }

    /// Process one candidate submission against the template version pinned
    /// to the step.
    pub async fn process_submission(
        &self,
        step_id: Uuid,
        candidate_id: Uuid,
        request: &SubmitRequest,
        template: &Template,
    ) -> Result<SubmissionReceipt, SubmitError> {
        if step_id.is_nil() {
            return Err(SubmitError::Invalid(vec![ValidationError::new(
                "Job application step id is required.",
            )]));
        }
        if candidate_id.is_nil() {
            return Err(SubmitError::Invalid(vec![ValidationError::new(
                "Candidate id is required.",
            )]));
        }

        let now = Utc::now();
        let question_by_key = template.active_question_map();

        let errors = validate_request(request, &question_by_key);
        if !errors.is_empty() {
            return Err(SubmitError::Invalid(errors));
        }

        let existing = self.submissions.find_by_step(step_id).await?;
        if let Some(error) = validate_submission_status(existing.as_ref(), template, now) {
            return Err(SubmitError::Invalid(vec![error]));
        }

        let build = build_answers(
            &request.answers,
            &question_by_key,
            template.template_type,
            now,
        );

        let mut submission = match existing {
            Some(submission) => submission,
            None => {
                let submission = Submission {
                    id: Uuid::new_v4(),
                    job_application_step_id: step_id,
                    template_name: template.name.clone(),
                    template_version: template.version,
                    template_type: template.template_type,
                    status: SubmissionStatus::Draft,
                    started_at: Some(now),
                    last_saved_at: Some(now),
                    submitted_at: None,
                    total_score: None,
                    max_score: None,
                    personality_result: None,
                };
                self.submissions.insert(&submission).await?;
                submission
            }
        };

        let mut answers = build.answers;
        for answer in &mut answers {
            answer.submission_id = submission.id;
        }
        self.submissions.insert_answers(&answers).await?;

        let personality_result =
            self.personality
                .calculate(&answers, &question_by_key, template.template_type);

        submission.last_saved_at = Some(now);
        submission.submitted_at = Some(now);
        let is_quiz = submission.template_type == TemplateType::Quiz;
        submission.status = if is_quiz || build.has_scored_questions {
            SubmissionStatus::AutoScored
        } else {
            SubmissionStatus::Submitted
        };
        if build.has_scored_questions {
            submission.total_score = Some(build.total_score);
            submission.max_score = Some(build.max_score);
        }
        if let Some(payload) = personality_result {
            if !payload.is_null() {
                submission.personality_result = Some(payload);
            }
        }

        self.submissions.update(&submission).await?;

        // Answers are durable past this point; a failed step update must not
        // undo them.
        self.mark_step_completed(step_id, now).await;

        Ok(SubmissionReceipt {
            submission_id: submission.id,
            status: submission.status,
            submitted_at: submission.submitted_at,
        })
    }

    async fn mark_step_completed(&self, step_id: Uuid, now: Timestamp) {
        let result: Result<(), StoreError> = async {
            let Some(mut step) = self.steps.find(step_id).await? else {
                tracing::warn!(%step_id, "step not found for completion");
                return Ok(());
            };
            step.status = StepStatus::Completed;
            step.completed_at = Some(now);
            self.steps.update(&step).await
        }
        .await;

        if let Err(error) = result {
            tracing::error!(
                %step_id,
                %error,
                "failed to mark step completed; submission answers are already persisted"
            );
        }
    }
}
