use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::applicants::cache::{CacheError, CachePolicy, PageCache};
use crate::applicants::domain::{
    Applicant, ApplicantChanges, ApplicantId, ApplicantSubmission, NewApplicant,
};
use crate::applicants::memory::{InMemoryApplicantRepository, InMemoryPageCache};
use crate::applicants::repository::{ApplicantRepository, RepositoryError};
use crate::applicants::service::ApplicantService;

pub(super) fn submission(name: &str, email: &str) -> ApplicantSubmission {
    ApplicantSubmission {
        name: name.to_string(),
        email: email.to_string(),
        position: "Platform Engineer".to_string(),
        status: None,
        phone: Some("+1234567890".to_string()),
        resume: Some("10 years of distributed systems".to_string()),
        notes: None,
    }
}

/// In-memory store that counts how often the listing path reaches it.
#[derive(Default)]
pub(super) struct CountingRepository {
    inner: InMemoryApplicantRepository,
    list_calls: AtomicUsize,
}

impl CountingRepository {
    pub(super) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApplicantRepository for CountingRepository {
    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        self.inner.email_exists(email).await
    }

    async fn insert(&self, applicant: NewApplicant) -> Result<Applicant, RepositoryError> {
        self.inner.insert(applicant).await
    }

    async fn fetch(&self, id: ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        self.inner.fetch(id).await
    }

    async fn list(&self, offset: u64, limit: u32) -> Result<Vec<Applicant>, RepositoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list(offset, limit).await
    }

    async fn update(
        &self,
        id: ApplicantId,
        changes: ApplicantChanges,
    ) -> Result<Applicant, RepositoryError> {
        self.inner.update(id, changes).await
    }

    async fn soft_delete(&self, id: ApplicantId) -> Result<(), RepositoryError> {
        self.inner.soft_delete(id).await
    }
}

pub(super) struct UnavailableRepository;

#[async_trait]
impl ApplicantRepository for UnavailableRepository {
    async fn email_exists(&self, _email: &str) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn insert(&self, _applicant: NewApplicant) -> Result<Applicant, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn fetch(&self, _id: ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn list(&self, _offset: u64, _limit: u32) -> Result<Vec<Applicant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn update(
        &self,
        _id: ApplicantId,
        _changes: ApplicantChanges,
    ) -> Result<Applicant, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn soft_delete(&self, _id: ApplicantId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Cache whose backend is never reachable.
#[derive(Default)]
pub(super) struct UnavailableCache {
    attempts: AtomicUsize,
}

impl UnavailableCache {
    pub(super) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn refuse(&self) -> CacheError {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        CacheError::Unavailable("connection refused".to_string())
    }
}

#[async_trait]
impl PageCache for UnavailableCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(self.refuse())
    }

    async fn set(&self, _key: &str, _payload: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(self.refuse())
    }

    async fn delete(&self, _keys: &[String]) -> Result<(), CacheError> {
        Err(self.refuse())
    }

    async fn delete_matching(&self, _pattern: &str) -> Result<usize, CacheError> {
        Err(self.refuse())
    }
}

pub(super) type TestService = ApplicantService<CountingRepository, InMemoryPageCache>;

pub(super) fn build_service_with_policy(
    policy: CachePolicy,
) -> (TestService, Arc<CountingRepository>, Arc<InMemoryPageCache>) {
    let repository = Arc::new(CountingRepository::default());
    let cache = Arc::new(InMemoryPageCache::default());
    let service = ApplicantService::with_policy(repository.clone(), cache.clone(), policy);
    (service, repository, cache)
}

pub(super) fn build_service() -> (TestService, Arc<CountingRepository>, Arc<InMemoryPageCache>) {
    build_service_with_policy(CachePolicy::default())
}

pub(super) fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
