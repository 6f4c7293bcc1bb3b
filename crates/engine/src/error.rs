use candor_core::error::CoreError;

use crate::store::StoreError;

/// Failure of an engine operation: either a domain rule or the store.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn invariant(message: impl Into<String>) -> Self {
        CoreError::InvariantViolation(message.into()).into()
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into()).into()
    }

    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        CoreError::not_found(entity, key).into()
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict(message.into()).into()
    }
}
