//! Option and question name allocation.
//!
//! Option names are normalized before matching or creation: a blank name is
//! derived from the label under the owning question's prefix, and the
//! placeholder `option_`/`opt_` names that builder UIs emit are qualified
//! with the question name so they cannot collide across questions.

use std::sync::Arc;

use uuid::Uuid;

use candor_core::input::OptionInput;
use candor_core::naming::slugify;
use candor_core::template::Question;

use crate::error::EngineError;
use crate::store::OptionStore;

/// Highest deterministic suffix probed before falling back to a random one.
const MAX_SUFFIX_PROBES: u32 = 50;

pub struct OptionNameNormalizer {
    options: Arc<dyn OptionStore>,
}

impl OptionNameNormalizer {
    pub fn new(options: Arc<dyn OptionStore>) -> Self {
        Self { options }
    }

    /// Normalize an incoming option name against its owning question.
    pub fn normalize_option_name(&self, input: &OptionInput, question: &Question) -> String {
        let name = input.name.as_deref().map(str::trim).unwrap_or("");
        if name.is_empty() {
            return format!("{}_{}", question.name, slugify(input.label.trim()));
        }

        let lower = name.to_ascii_lowercase();
        if lower.starts_with("option_") || lower.starts_with("opt_") {
            return format!("{}_{}", question.name, name);
        }

        name.to_string()
    }

    /// Make a desired name unique among version-1 option rows.
    ///
    /// Probes deterministic `_2`..`_50` suffixes first so repeated imports
    /// allocate stable names.
    pub async fn ensure_unique_option_name_v1(
        &self,
        desired: &str,
    ) -> Result<String, EngineError> {
        let candidate = desired.trim();
        if candidate.is_empty() {
            return Err(EngineError::validation("Option name cannot be empty."));
        }

        if !self.options.name_taken(candidate).await? {
            return Ok(candidate.to_string());
        }

        for i in 2..=MAX_SUFFIX_PROBES {
            let with_suffix = format!("{candidate}_{i}");
            if !self.options.name_taken(&with_suffix).await? {
                return Ok(with_suffix);
            }
        }

        let fragment = Uuid::new_v4().simple().to_string();
        Ok(format!("{candidate}_{}", &fragment[..8]))
    }
}

/// Generated name for a question created without one.
pub fn generate_question_name(template_name: &str, template_version: i32, text: &str) -> String {
    format!(
        "{}_v{}_{}",
        slugify(template_name),
        template_version,
        slugify(text)
    )
}
