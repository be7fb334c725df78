//! Error types for the skills crate

use mserver_core::ServerError;
use mserver_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    /// Effect data could not be read
    #[error("Skill data unavailable: {0}")]
    Storage(#[from] StorageError),
}

impl From<SkillError> for ServerError {
    fn from(err: SkillError) -> Self {
        match err {
            SkillError::Storage(inner) => inner.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SkillError>;
