//! Pre-write validation for candidate submissions.
//!
//! Failures are returned as a list of [`ValidationError`] values, never
//! thrown: user input problems are data, not exceptions. The checks run in
//! two passes: required coverage first, then referential and cardinality
//! checks per answer.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::input::{AnswerInput, SubmitRequest};
use crate::keys::VersionKey;
use crate::submission::Submission;
use crate::template::{Question, Template};
use crate::types::Timestamp;

/// One user-facing validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Validate a submission request against the active question lookup.
///
/// Duplicate answers for one question key collapse to the last one before the
/// required check runs (last wins). The per-answer pass stops at the first
/// structural problem; the caller persists nothing unless the list is empty.
pub fn validate_request(
    request: &SubmitRequest,
    question_by_key: &HashMap<VersionKey, &Question>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut incoming_by_key: HashMap<VersionKey, &AnswerInput> = HashMap::new();
    for answer in &request.answers {
        incoming_by_key.insert(answer.question_key(), answer);
    }

    // Pass 1: every required question must carry a real answer.
    let mut required: Vec<&&Question> = question_by_key
        .values()
        .filter(|q| q.is_required)
        .collect();
    required.sort_by_key(|q| q.order);

    for question in required {
        let missing_message = format!("Question '{}' is required.", question.text);
        let Some(incoming) = incoming_by_key.get(&question.key()) else {
            errors.push(ValidationError::new(missing_message));
            continue;
        };

        let has_answer = if question.question_type.is_option_based() {
            !incoming.selected_options.is_empty()
        } else {
            incoming
                .answer_text
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty())
        };

        if !has_answer {
            errors.push(ValidationError::new(missing_message));
        }
    }

    // Pass 2: referential and cardinality checks.
    for answer in &request.answers {
        let Some(question) = question_by_key.get(&answer.question_key()) else {
            errors.push(ValidationError::new(
                "One or more answers reference an invalid question.",
            ));
            break;
        };

        let selected = &answer.selected_options;

        let distinct: HashSet<VersionKey> = selected.iter().map(|o| o.key()).collect();
        if distinct.len() != selected.len() {
            errors.push(ValidationError::new(
                "Duplicate selected options are not allowed.",
            ));
            return errors;
        }

        if !question.question_type.is_option_based() {
            if !selected.is_empty() {
                errors.push(ValidationError::new(
                    "Selected options are not allowed for this question type.",
                ));
                return errors;
            }
            continue;
        }

        if question.question_type.is_single_select() && selected.len() > 1 {
            errors.push(ValidationError::new(
                "Only one option can be selected for this question.",
            ));
            return errors;
        }

        let option_keys: HashSet<VersionKey> =
            question.live_options().map(|o| o.key()).collect();
        if selected.iter().any(|s| !option_keys.contains(&s.key())) {
            errors.push(ValidationError::new(
                "One or more answers reference an invalid option.",
            ));
            return errors;
        }
    }

    errors
}

/// Gate on submission status and template time limit.
pub fn validate_submission_status(
    existing: Option<&Submission>,
    template: &Template,
    now: Timestamp,
) -> Option<ValidationError> {
    if let Some(submission) = existing {
        if submission.status.is_final() {
            return Some(ValidationError::new(
                "This assessment has already been submitted and cannot be modified.",
            ));
        }

        if let (Some(limit), Some(started_at)) =
            (template.time_limit_seconds, submission.started_at)
        {
            let elapsed = (now - started_at).num_seconds();
            if elapsed > limit {
                return Some(ValidationError::new(
                    "Time limit for this assessment has expired.",
                ));
            }
        }
    }

    None
}
