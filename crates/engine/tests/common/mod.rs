//! Shared fixtures for the engine integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use candor_core::input::{
    AnswerInput, OptionInput, OptionRef, QuestionInput, SectionInput, SubmitRequest,
    TemplateInput,
};
use candor_core::personality::NullPersonalityCalculator;
use candor_core::submission::{JobApplicationStep, StepStatus, Submission, SubmissionStatus};
use candor_core::template::{QuestionType, Template, TemplateStatus, TemplateType};
use candor_engine::memory::InMemoryStore;
use candor_engine::submission::SubmissionOrchestrator;
use candor_engine::templates::TemplateService;

/// Wire test logging once per binary; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new())
}

pub fn template_service(store: &Arc<InMemoryStore>) -> TemplateService {
    TemplateService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    )
}

pub fn orchestrator(store: &Arc<InMemoryStore>) -> SubmissionOrchestrator {
    SubmissionOrchestrator::new(
        store.clone(),
        store.clone(),
        Arc::new(NullPersonalityCalculator),
    )
}

pub fn dec(n: i64) -> Decimal {
    Decimal::from(n)
}

pub fn option_input(
    name: Option<&str>,
    label: &str,
    is_correct: Option<bool>,
    score: Option<i64>,
) -> OptionInput {
    OptionInput {
        name: name.map(str::to_string),
        order: 1,
        label: label.to_string(),
        is_correct,
        score: score.map(Decimal::from),
        weight: None,
        wa: None,
    }
}

pub fn likert_option(label: &str, wa: i64) -> OptionInput {
    OptionInput {
        name: None,
        order: 1,
        label: label.to_string(),
        is_correct: None,
        score: None,
        weight: None,
        wa: Some(Decimal::from(wa)),
    }
}

pub fn question_input(
    name: Option<&str>,
    order: i32,
    question_type: QuestionType,
    text: &str,
    is_required: bool,
    options: Vec<OptionInput>,
) -> QuestionInput {
    QuestionInput {
        name: name.map(str::to_string),
        order,
        question_type,
        text: text.to_string(),
        is_required,
        weight: None,
        trait_key: None,
        options,
    }
}

pub fn section_input(order: i32, title: &str, questions: Vec<QuestionInput>) -> SectionInput {
    SectionInput {
        id: None,
        order,
        title: title.to_string(),
        description: None,
        questions,
    }
}

pub fn template_input(
    name: &str,
    version: i32,
    template_type: TemplateType,
    sections: Vec<SectionInput>,
) -> TemplateInput {
    TemplateInput {
        name: name.to_string(),
        version,
        template_type,
        status: TemplateStatus::Draft,
        title: None,
        description: None,
        time_limit_seconds: None,
        should_update_version: false,
        sections,
    }
}

/// The onboarding-quiz fixture: one section, one required single-choice
/// question with a correct 10-point option and a 0-point distractor.
pub fn onboarding_quiz_input() -> TemplateInput {
    template_input(
        "onboarding-quiz",
        1,
        TemplateType::Quiz,
        vec![section_input(
            1,
            "General",
            vec![question_input(
                Some("q1"),
                1,
                QuestionType::SingleChoice,
                "Pick the right answer",
                true,
                vec![
                    option_input(Some("q1_a"), "A", Some(true), Some(10)),
                    option_input(Some("q1_b"), "B", Some(false), Some(0)),
                ],
            )],
        )],
    )
}

/// Seed a job application step assigned to the template.
pub fn step_for(store: &Arc<InMemoryStore>, template: &Template) -> Uuid {
    let id = Uuid::new_v4();
    store.put_step(JobApplicationStep {
        id,
        template_name: Some(template.name.clone()),
        template_version: Some(template.version),
        status: StepStatus::InProgress,
        completed_at: None,
    });
    id
}

/// Seed one submission so the template version counts as in use.
pub fn mark_in_use(store: &Arc<InMemoryStore>, template: &Template) -> Uuid {
    let id = Uuid::new_v4();
    store.put_submission(Submission {
        id,
        job_application_step_id: Uuid::new_v4(),
        template_name: template.name.clone(),
        template_version: template.version,
        template_type: template.template_type,
        status: SubmissionStatus::AutoScored,
        started_at: Some(Utc::now()),
        last_saved_at: Some(Utc::now()),
        submitted_at: Some(Utc::now()),
        total_score: None,
        max_score: None,
        personality_result: None,
    });
    id
}

pub fn answer(question: (&str, i32), selections: &[(&str, i32)]) -> AnswerInput {
    AnswerInput {
        question_name: question.0.to_string(),
        question_version: question.1,
        answer_text: None,
        selected_options: selections
            .iter()
            .map(|(name, version)| OptionRef {
                option_name: name.to_string(),
                option_version: *version,
            })
            .collect(),
    }
}

pub fn request(answers: Vec<AnswerInput>) -> SubmitRequest {
    SubmitRequest { answers }
}
