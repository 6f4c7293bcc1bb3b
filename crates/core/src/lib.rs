//! Pure domain logic for the candor questionnaire engine.
//!
//! Everything in this crate is synchronous and referentially transparent:
//! entities, versioned keys, change detection, answer scoring, and submission
//! validation. Anything that talks to a store lives in `candor-engine`.

pub mod answer_builder;
pub mod change_detection;
pub mod error;
pub mod input;
pub mod keys;
pub mod naming;
pub mod personality;
pub mod submission;
pub mod submission_checks;
pub mod template;
pub mod types;
