//! Candidate submission records: submission → answers → selected options.
//!
//! Answers and their selected options snapshot the exact (name, version) keys
//! and scoring fields that were active at submission time. A submission in a
//! terminal status is immutable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::keys::VersionKey;
use crate::template::{QuestionType, TemplateType};
use crate::types::{Score, Timestamp};

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Draft,
    Submitted,
    AutoScored,
    Reviewed,
}

impl SubmissionStatus {
    /// Terminal statuses freeze the submission.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            SubmissionStatus::Submitted | SubmissionStatus::AutoScored | SubmissionStatus::Reviewed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// One candidate's submission against a pinned template version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub job_application_step_id: Uuid,
    pub template_name: String,
    pub template_version: i32,
    /// Snapshot of the template type at submission time.
    pub template_type: TemplateType,
    pub status: SubmissionStatus,
    pub started_at: Option<Timestamp>,
    pub last_saved_at: Option<Timestamp>,
    pub submitted_at: Option<Timestamp>,
    pub total_score: Option<Score>,
    pub max_score: Option<Score>,
    pub personality_result: Option<serde_json::Value>,
}

impl Submission {
    pub fn template_key(&self) -> VersionKey {
        VersionKey::new(self.template_name.clone(), self.template_version)
    }
}

/// One answered question within a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub question_name: String,
    pub question_version: i32,
    pub question_type: QuestionType,
    pub question_order: i32,
    pub answer_text: Option<String>,
    pub score_awarded: Option<Score>,
    /// Weighted Likert anchor sum (Wa × Ws), when applicable.
    pub wa_sum: Option<Score>,
    pub answered_at: Timestamp,
    pub selected_options: Vec<AnswerOption>,
}

impl Answer {
    pub fn question_key(&self) -> VersionKey {
        VersionKey::new(self.question_name.clone(), self.question_version)
    }
}

/// One selected option, with scoring fields snapshotted at selection time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: Uuid,
    pub answer_id: Uuid,
    pub option_name: String,
    pub option_version: i32,
    pub is_correct: Option<bool>,
    pub score: Option<Score>,
    pub wa: Option<Score>,
}

/// The owning workflow step, reduced to what this engine touches: the
/// questionnaire assignment and completion bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobApplicationStep {
    pub id: Uuid,
    pub template_name: Option<String>,
    pub template_version: Option<i32>,
    pub status: StepStatus,
    pub completed_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_is_not_final() {
        assert!(!SubmissionStatus::Draft.is_final());
    }

    #[test]
    fn terminal_statuses_are_final() {
        assert!(SubmissionStatus::Submitted.is_final());
        assert!(SubmissionStatus::AutoScored.is_final());
        assert!(SubmissionStatus::Reviewed.is_final());
    }
}
