//! Builds scored answer rows from raw candidate input.
//!
//! Deterministic: given the answers and the exact question/option versions in
//! effect at submission time, the same scores always come out. Unknown
//! question references are skipped here; rejecting them is the validator's
//! job.
//!
//! Quiz scoring rule: when correctness is configured (at least one option on
//! the question carries an explicit flag), only correct selections score. When
//! it is not configured, a positive score marks the option correct (common in
//! older data).

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::input::AnswerInput;
use crate::keys::VersionKey;
use crate::submission::{Answer, AnswerOption};
use crate::template::{Question, QuestionOption, QuestionType, TemplateType};
use crate::types::{Score, Timestamp};

/// Aggregate result of one build pass.
#[derive(Debug, Clone)]
pub struct AnswerBuildResult {
    pub total_score: Score,
    pub max_score: Score,
    pub has_scored_questions: bool,
    pub answers: Vec<Answer>,
}

/// Turn raw answers into scored `Answer` rows against the given question
/// lookup. `submission_id` is stamped by the caller once the owning
/// submission exists.
pub fn build_answers(
    incoming: &[AnswerInput],
    question_by_key: &HashMap<VersionKey, &Question>,
    template_type: TemplateType,
    now: Timestamp,
) -> AnswerBuildResult {
    let mut total_score = Decimal::ZERO;
    let mut max_score = Decimal::ZERO;
    let mut has_scored_questions = false;
    let mut answers = Vec::new();

    let is_quiz = template_type == TemplateType::Quiz;
    let is_personality = template_type == TemplateType::Personality;

    for input in incoming {
        let Some(question) = question_by_key.get(&input.question_key()) else {
            continue;
        };

        let mut answer = Answer {
            id: Uuid::new_v4(),
            submission_id: Uuid::nil(),
            question_name: question.name.clone(),
            question_version: question.version,
            question_type: question.question_type,
            question_order: question.order,
            answer_text: normalize_text(input.answer_text.as_deref()),
            score_awarded: None,
            wa_sum: None,
            answered_at: now,
            selected_options: Vec::new(),
        };

        if question.question_type.is_option_based() {
            score_selections(
                &mut answer,
                input,
                question,
                is_quiz,
                is_personality,
                &mut total_score,
                &mut max_score,
                &mut has_scored_questions,
            );
        }

        answers.push(answer);
    }

    AnswerBuildResult {
        total_score,
        max_score,
        has_scored_questions,
        answers,
    }
}

#[allow(clippy::too_many_arguments)]
fn score_selections(
    answer: &mut Answer,
    input: &AnswerInput,
    question: &Question,
    is_quiz: bool,
    is_personality: bool,
    total_score: &mut Score,
    max_score: &mut Score,
    has_scored_questions: &mut bool,
) {
    let option_by_key: HashMap<VersionKey, &QuestionOption> =
        question.live_options().map(|o| (o.key(), o)).collect();

    let correctness_configured =
        is_quiz && option_by_key.values().any(|o| o.is_correct.is_some());
    let question_weight = question.weight.unwrap_or(Decimal::ONE);
    let is_likert = question.question_type == QuestionType::Likert;
    let is_single_select = question.question_type.is_single_select();
    let is_scored_question = option_by_key.values().any(|o| o.score.is_some());

    let wa_sum = if is_likert || is_personality {
        weighted_anchor(input, &option_by_key, question_weight, is_single_select)
    } else {
        None
    };

    let mut answer_score = Decimal::ZERO;
    for selection in &input.selected_options {
        let Some(option) = option_by_key.get(&selection.key()) else {
            continue;
        };

        let derived_is_correct = if correctness_configured {
            option.is_correct
        } else if is_quiz {
            Some(option.score.is_some_and(|s| s > Decimal::ZERO))
        } else {
            option.is_correct
        };

        answer.selected_options.push(AnswerOption {
            id: Uuid::new_v4(),
            answer_id: answer.id,
            option_name: option.name.clone(),
            option_version: option.version,
            is_correct: derived_is_correct,
            score: option.score,
            wa: option.wa,
        });

        if let Some(score) = option.score {
            // Configured-incorrect selections never score, even with a
            // stored Score.
            if !is_quiz || !correctness_configured || derived_is_correct == Some(true) {
                answer_score += score;
            }
        }
    }

    if is_likert || is_personality {
        answer.wa_sum = wa_sum;
    }

    if is_scored_question {
        *has_scored_questions = true;
        answer.score_awarded = Some(answer_score);
        *total_score += answer_score;
        *max_score += question_max_score(question, is_quiz);
    }
}

/// Wa × Ws for the selection: the single value for single-select types,
/// the mean across selections for true multi-select.
fn weighted_anchor(
    input: &AnswerInput,
    option_by_key: &HashMap<VersionKey, &QuestionOption>,
    question_weight: Score,
    is_single_select: bool,
) -> Option<Score> {
    let weighted: Vec<Score> = input
        .selected_options
        .iter()
        .filter_map(|selection| {
            option_by_key
                .get(&selection.key())
                .and_then(|o| o.wa)
                .map(|wa| wa * question_weight)
        })
        .collect();

    if weighted.is_empty() {
        return None;
    }
    if is_single_select || weighted.len() == 1 {
        return Some(weighted[0]);
    }
    let sum: Score = weighted.iter().copied().sum();
    Some(sum / Decimal::from(weighted.len() as i64))
}

/// The most a question can contribute to `max_score`.
fn question_max_score(question: &Question, is_quiz: bool) -> Score {
    let scored: Vec<&QuestionOption> = question
        .live_options()
        .filter(|o| o.score.is_some())
        .collect();
    if scored.is_empty() {
        return Decimal::ZERO;
    }

    let has_correctness = is_quiz && scored.iter().any(|o| o.is_correct.is_some());

    match question.question_type {
        QuestionType::SingleChoice | QuestionType::Radio | QuestionType::Dropdown => {
            if has_correctness {
                scored
                    .iter()
                    .filter(|o| o.is_correct == Some(true))
                    .filter_map(|o| o.score)
                    .max()
                    .unwrap_or(Decimal::ZERO)
            } else {
                scored
                    .iter()
                    .filter_map(|o| o.score)
                    .max()
                    .unwrap_or(Decimal::ZERO)
            }
        }
        QuestionType::MultiChoice | QuestionType::Checkbox => {
            if has_correctness {
                scored
                    .iter()
                    .filter(|o| o.is_correct == Some(true))
                    .filter_map(|o| o.score)
                    .sum()
            } else {
                scored
                    .iter()
                    .filter_map(|o| o.score)
                    .filter(|s| *s > Decimal::ZERO)
                    .sum()
            }
        }
        QuestionType::Likert => scored
            .iter()
            .map(|o| o.score.unwrap_or(Decimal::ZERO))
            .max()
            .unwrap_or(Decimal::ZERO),
        QuestionType::FreeText => Decimal::ZERO,
    }
}

fn normalize_text(value: Option<&str>) -> Option<String> {
    let trimmed = value.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
