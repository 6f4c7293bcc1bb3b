//! Integration coverage for the section → question → option sync cascade.

mod common;

use assert_matches::assert_matches;

use candor_core::error::CoreError;
use candor_core::template::{QuestionType, TemplateType};
use candor_engine::error::EngineError;

use common::*;

fn quiz_with_two_options() -> candor_core::input::TemplateInput {
    template_input(
        "skills-check",
        1,
        TemplateType::Quiz,
        vec![section_input(
            1,
            "General",
            vec![question_input(
                Some("q1"),
                1,
                QuestionType::SingleChoice,
                "Pick one",
                false,
                vec![
                    option_input(Some("q1_a"), "A", Some(true), Some(10)),
                    option_input(Some("q1_b"), "B", Some(false), Some(0)),
                ],
            )],
        )],
    )
}

#[tokio::test]
async fn resync_of_identical_payload_changes_nothing() {
    let store = store();
    let svc = template_service(&store);
    let created = svc.create(&quiz_with_two_options()).await.unwrap();

    let updated = svc.update(&quiz_with_two_options()).await.unwrap();

    assert_eq!(updated.version, 1);
    let section = &updated.sections[0];
    assert_eq!(section.questions.len(), created.sections[0].questions.len());
    let question = &section.questions[0];
    assert_eq!(question.version, 1);
    assert!(question.is_active);
    assert_eq!(question.options.len(), 2);
    assert!(question.options.iter().all(|o| o.version == 1));
}

#[tokio::test]
async fn not_in_use_option_edit_lands_in_place() {
    let store = store();
    let svc = template_service(&store);
    svc.create(&quiz_with_two_options()).await.unwrap();

    let mut input = quiz_with_two_options();
    input.sections[0].questions[0].options[1].label = "B (none of the above)".to_string();
    let updated = svc.update(&input).await.unwrap();

    let question = &updated.sections[0].questions[0];
    assert_eq!(question.version, 1, "no fork on a not-in-use template");
    let b = question
        .options
        .iter()
        .find(|o| o.name == "q1_b")
        .expect("option kept its name");
    assert_eq!(b.version, 1);
    assert_eq!(b.label, "B (none of the above)");
}

#[tokio::test]
async fn in_use_option_edit_forks_the_owning_question() {
    let store = store();
    let svc = template_service(&store);
    let created = svc.create(&quiz_with_two_options()).await.unwrap();
    mark_in_use(&store, &created);

    let mut input = quiz_with_two_options();
    input.sections[0].questions[0].options[1].label = "B (revised)".to_string();
    let updated = svc.update(&input).await.unwrap();

    let section = &updated.sections[0];
    assert_eq!(section.questions.len(), 2);

    let old = section
        .questions
        .iter()
        .find(|q| q.version == 1)
        .expect("predecessor kept");
    assert!(!old.is_active);
    let old_b = old.options.iter().find(|o| o.name == "q1_b").unwrap();
    assert_eq!(old_b.label, "B", "history is untouched");

    let new = section
        .questions
        .iter()
        .find(|q| q.version == 2)
        .expect("fork present");
    assert!(new.is_active);
    assert_eq!(new.options.len(), 2, "fork carries the full option set");
    let new_b = new.options.iter().find(|o| o.name == "q1_b").unwrap();
    assert_eq!(new_b.version, 2);
    assert_eq!(new_b.label, "B (revised)");
    let new_a = new.options.iter().find(|o| o.name == "q1_a").unwrap();
    assert_eq!(new_a.version, 2);
    assert_eq!(new_a.label, "A");
}

#[tokio::test]
async fn in_use_new_option_folds_into_a_question_fork() {
    let store = store();
    let svc = template_service(&store);
    let created = svc.create(&quiz_with_two_options()).await.unwrap();
    mark_in_use(&store, &created);

    let mut input = quiz_with_two_options();
    input.sections[0].questions[0]
        .options
        .push(option_input(None, "C", Some(false), Some(0)));
    let updated = svc.update(&input).await.unwrap();

    let new = updated.sections[0]
        .questions
        .iter()
        .find(|q| q.version == 2)
        .expect("fork present");
    assert_eq!(new.options.len(), 3);
    let c = new.options.iter().find(|o| o.name == "q1_c").unwrap();
    assert_eq!(c.version, 1, "new lineage starts at version 1");
}

#[tokio::test]
async fn in_use_option_removal_is_rejected_with_no_persisted_change() {
    let store = store();
    let svc = template_service(&store);
    let created = svc.create(&quiz_with_two_options()).await.unwrap();
    mark_in_use(&store, &created);

    let mut input = quiz_with_two_options();
    input.sections[0].questions[0].options.pop();
    let error = svc.update(&input).await.unwrap_err();
    assert_matches!(
        error,
        EngineError::Core(CoreError::InvariantViolation(_))
    );

    let stored = candor_engine::store::TemplateStore::find(&*store, "skills-check", 1)
        .await
        .unwrap()
        .unwrap();
    let question = &stored.sections[0].questions[0];
    assert_eq!(question.options.len(), 2, "nothing was persisted");
    assert_eq!(question.version, 1);
}

#[tokio::test]
async fn not_in_use_option_removal_is_immediate() {
    let store = store();
    let svc = template_service(&store);
    svc.create(&quiz_with_two_options()).await.unwrap();

    let mut input = quiz_with_two_options();
    input.sections[0].questions[0].options.pop();
    let updated = svc.update(&input).await.unwrap();

    let question = &updated.sections[0].questions[0];
    assert_eq!(question.options.len(), 1);
    assert_eq!(question.options[0].name, "q1_a");
}

#[tokio::test]
async fn in_use_new_question_is_a_hard_error() {
    let store = store();
    let svc = template_service(&store);
    let created = svc.create(&quiz_with_two_options()).await.unwrap();
    mark_in_use(&store, &created);

    let mut input = quiz_with_two_options();
    input.sections[0].questions.push(question_input(
        None,
        2,
        QuestionType::FreeText,
        "Anything to add?",
        false,
        Vec::new(),
    ));
    let error = svc.update(&input).await.unwrap_err();
    assert_matches!(
        error,
        EngineError::Core(CoreError::InvariantViolation(_))
    );
}

#[tokio::test]
async fn in_use_question_field_edit_forks_the_question() {
    let store = store();
    let svc = template_service(&store);
    let created = svc.create(&quiz_with_two_options()).await.unwrap();
    mark_in_use(&store, &created);

    let mut input = quiz_with_two_options();
    input.sections[0].questions[0].text = "Pick exactly one".to_string();
    let updated = svc.update(&input).await.unwrap();

    let section = &updated.sections[0];
    let new = section.questions.iter().find(|q| q.version == 2).unwrap();
    assert!(new.is_active);
    assert_eq!(new.text, "Pick exactly one");
    assert_eq!(new.options.len(), 2, "options carried via the pre-fork map");
    assert!(new.options.iter().all(|o| o.version == 2));

    let old = section.questions.iter().find(|q| q.version == 1).unwrap();
    assert!(!old.is_active);
    assert_eq!(old.text, "Pick one");
}

#[tokio::test]
async fn in_use_section_edit_is_a_hard_error_unless_identical() {
    let store = store();
    let svc = template_service(&store);
    let created = svc.create(&quiz_with_two_options()).await.unwrap();
    mark_in_use(&store, &created);

    // Textually identical payload (modulo whitespace) passes silently.
    let mut noop = quiz_with_two_options();
    noop.sections[0].title = " General ".to_string();
    assert!(svc.update(&noop).await.is_ok());

    let mut edit = quiz_with_two_options();
    edit.sections[0].title = "Basics".to_string();
    let error = svc.update(&edit).await.unwrap_err();
    assert_matches!(
        error,
        EngineError::Core(CoreError::InvariantViolation(_))
    );
}

#[tokio::test]
async fn in_use_section_removal_is_rejected() {
    let store = store();
    let svc = template_service(&store);
    let mut input = quiz_with_two_options();
    input.sections.push(section_input(2, "Extras", Vec::new()));
    let created = svc.create(&input).await.unwrap();
    mark_in_use(&store, &created);

    let error = svc.update(&quiz_with_two_options()).await.unwrap_err();
    assert_matches!(
        error,
        EngineError::Core(CoreError::InvariantViolation(_))
    );
}

#[tokio::test]
async fn at_most_one_fork_per_call_and_reinvocation_converges() {
    let store = store();
    let svc = template_service(&store);

    let two_questions = || {
        template_input(
            "skills-check",
            1,
            TemplateType::Quiz,
            vec![section_input(
                1,
                "General",
                vec![
                    question_input(
                        Some("q1"),
                        1,
                        QuestionType::SingleChoice,
                        "First",
                        false,
                        vec![option_input(Some("q1_a"), "A", Some(true), Some(10))],
                    ),
                    question_input(
                        Some("q2"),
                        2,
                        QuestionType::SingleChoice,
                        "Second",
                        false,
                        vec![option_input(Some("q2_a"), "A", Some(true), Some(10))],
                    ),
                ],
            )],
        )
    };
    let created = svc.create(&two_questions()).await.unwrap();
    mark_in_use(&store, &created);

    let mut input = two_questions();
    input.sections[0].questions[0].options[0].label = "A+".to_string();
    input.sections[0].questions[1].options[0].label = "A++".to_string();

    // First pass forks exactly one question.
    let first = svc.update(&input).await.unwrap();
    let forked_after_first = first.sections[0]
        .questions
        .iter()
        .filter(|q| q.version == 2)
        .count();
    assert_eq!(forked_after_first, 1);

    // Second pass picks up the deferred change.
    let second = svc.update(&input).await.unwrap();
    let forked_after_second = second.sections[0]
        .questions
        .iter()
        .filter(|q| q.version == 2)
        .count();
    assert_eq!(forked_after_second, 2);

    // Third pass is a no-op.
    let third = svc.update(&input).await.unwrap();
    assert_eq!(third.sections[0].questions.len(), 4);
    assert!(third.sections[0]
        .questions
        .iter()
        .filter(|q| q.is_active)
        .all(|q| q.version == 2));
}

#[tokio::test]
async fn legacy_prefixed_option_names_still_match() {
    let store = store();
    let svc = template_service(&store);
    svc.create(&quiz_with_two_options()).await.unwrap();

    // Incoming refers to the options without the stored "q1_" prefix.
    let mut input = quiz_with_two_options();
    input.sections[0].questions[0].options[0].name = Some("a".to_string());
    input.sections[0].questions[0].options[1].name = Some("b".to_string());
    let updated = svc.update(&input).await.unwrap();

    let question = &updated.sections[0].questions[0];
    assert_eq!(question.options.len(), 2, "no spurious creations");
    assert!(question.options.iter().any(|o| o.name == "q1_a"));
    assert!(question.options.iter().any(|o| o.name == "q1_b"));
}

#[tokio::test]
async fn not_in_use_question_removal_drops_the_lineage() {
    let store = store();
    let svc = template_service(&store);
    let mut input = quiz_with_two_options();
    input.sections[0].questions.push(question_input(
        Some("q2"),
        2,
        QuestionType::FreeText,
        "Comments",
        false,
        Vec::new(),
    ));
    svc.create(&input).await.unwrap();

    let updated = svc.update(&quiz_with_two_options()).await.unwrap();
    assert_eq!(updated.sections[0].questions.len(), 1);
    assert_eq!(updated.sections[0].questions[0].name, "q1");
}
