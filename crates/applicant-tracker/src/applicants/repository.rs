use async_trait::async_trait;

use super::domain::{Applicant, ApplicantChanges, ApplicantId, NewApplicant};

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Every read excludes soft-deleted records.
#[async_trait]
pub trait ApplicantRepository: Send + Sync {
    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError>;
    async fn insert(&self, applicant: NewApplicant) -> Result<Applicant, RepositoryError>;
    async fn fetch(&self, id: ApplicantId) -> Result<Option<Applicant>, RepositoryError>;
    async fn list(&self, offset: u64, limit: u32) -> Result<Vec<Applicant>, RepositoryError>;
    /// Fails with `NotFound` when the record vanished since it was last read.
    async fn update(
        &self,
        id: ApplicantId,
        changes: ApplicantChanges,
    ) -> Result<Applicant, RepositoryError>;
    async fn soft_delete(&self, id: ApplicantId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
