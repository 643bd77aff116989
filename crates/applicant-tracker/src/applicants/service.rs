use std::sync::Arc;

use tracing::{error, info};

use super::cache::{CacheLookup, CachePolicy, PageCache, PageCacheAside};
use super::domain::{
    Applicant, ApplicantId, ApplicantPage, ApplicantPatch, ApplicantSubmission, PageRequest,
};
use super::repository::{ApplicantRepository, RepositoryError};
use super::validation::{normalize_submission, patch_changes, ValidationError};

/// Service composing validation, the applicant store and the page cache.
pub struct ApplicantService<R, C> {
    repository: Arc<R>,
    pages: PageCacheAside<C>,
}

impl<R, C> ApplicantService<R, C>
where
    R: ApplicantRepository + 'static,
    C: PageCache + 'static,
{
    pub fn new(repository: Arc<R>, cache: Arc<C>) -> Self {
        Self::with_policy(repository, cache, CachePolicy::default())
    }

    pub fn with_policy(repository: Arc<R>, cache: Arc<C>, policy: CachePolicy) -> Self {
        Self {
            repository,
            pages: PageCacheAside::new(cache, policy),
        }
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.pages.policy()
    }

    /// Validate and store a new applicant.
    pub async fn create(
        &self,
        submission: ApplicantSubmission,
    ) -> Result<Applicant, ApplicantServiceError> {
        let applicant = normalize_submission(submission)?;

        let exists = self
            .repository
            .email_exists(&applicant.email)
            .await
            .map_err(store_failure("Failed to create applicant"))?;
        if exists {
            return Err(ApplicantServiceError::Conflict);
        }

        let created = self
            .repository
            .insert(applicant)
            .await
            .map_err(store_failure("Failed to create applicant"))?;

        self.pages.invalidate().await;
        info!(id = %created.id, "created applicant");
        Ok(created)
    }

    /// Cache-aside read of one page. A cache hit never touches the store; an
    /// unavailable cache is bypassed without writing back.
    pub async fn list(
        &self,
        request: PageRequest,
    ) -> Result<ApplicantPage, ApplicantServiceError> {
        let lookup = self.pages.lookup(request).await;
        let write_back = matches!(lookup, CacheLookup::Miss);

        let data = match lookup {
            CacheLookup::Hit(data) => {
                info!(
                    page = request.page,
                    limit = request.limit,
                    count = data.len(),
                    "cache hit"
                );
                data
            }
            CacheLookup::Miss | CacheLookup::Unavailable => {
                let data = self
                    .repository
                    .list(request.offset(), request.limit)
                    .await
                    .map_err(store_failure("Failed to fetch applicants"))?;

                if write_back {
                    self.pages.store(request, &data).await;
                    info!(
                        page = request.page,
                        limit = request.limit,
                        count = data.len(),
                        "cache miss"
                    );
                }
                data
            }
        };

        Ok(ApplicantPage {
            data,
            page: request.page,
            limit: request.limit,
        })
    }

    pub async fn get(&self, id: ApplicantId) -> Result<Applicant, ApplicantServiceError> {
        self.repository
            .fetch(id)
            .await
            .map_err(store_failure("Failed to fetch applicant"))?
            .ok_or(ApplicantServiceError::NotFound)
    }

    /// Merge the supplied fields into an existing applicant.
    pub async fn update(
        &self,
        id: ApplicantId,
        patch: ApplicantPatch,
    ) -> Result<Applicant, ApplicantServiceError> {
        let current = self.get(id).await?;
        let changes = patch_changes(patch)?;
        if changes.is_empty() {
            return Ok(current);
        }

        let updated = self
            .repository
            .update(id, changes)
            .await
            .map_err(store_failure("Failed to update applicant"))?;

        self.pages.invalidate().await;
        info!(%id, "updated applicant");
        Ok(updated)
    }

    /// Soft-delete an applicant; the row stays in the store.
    pub async fn delete(&self, id: ApplicantId) -> Result<(), ApplicantServiceError> {
        self.get(id).await?;

        self.repository
            .soft_delete(id)
            .await
            .map_err(store_failure("Failed to delete applicant"))?;

        self.pages.invalidate().await;
        info!(%id, "deleted applicant");
        Ok(())
    }
}

/// Keep conflicts and misses typed; log store outages and hide their detail.
fn store_failure(action: &'static str) -> impl FnOnce(RepositoryError) -> ApplicantServiceError {
    move |err| match err {
        RepositoryError::Conflict => ApplicantServiceError::Conflict,
        RepositoryError::NotFound => ApplicantServiceError::NotFound,
        RepositoryError::Unavailable(detail) => {
            error!(%detail, "{action}");
            ApplicantServiceError::Internal(action)
        }
    }
}

/// Error raised by the applicant service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicantServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Email already exists")]
    Conflict,
    #[error("Applicant not found")]
    NotFound,
    #[error("{0}")]
    Internal(&'static str),
}
