//! Applicant records: intake validation, storage, the cached listing path and
//! the HTTP routes on top of them.
//!
//! The service takes its store and cache as constructor arguments. Postgres and
//! Redis adapters are provided alongside in-memory ones for local runs and tests.

pub mod cache;
pub mod domain;
pub mod memory;
pub mod pg_store;
pub mod redis_cache;
pub mod repository;
pub mod router;
pub mod schema;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use cache::{
    page_key, well_known_keys, CacheError, CacheLookup, CachePolicy, InvalidationPolicy,
    PageCache, PageCacheAside,
};
pub use domain::{
    Applicant, ApplicantChanges, ApplicantId, ApplicantPage, ApplicantPatch, ApplicantStatus,
    ApplicantSubmission, NewApplicant, PageRequest,
};
pub use memory::{InMemoryApplicantRepository, InMemoryPageCache};
pub use pg_store::{connect_pool, PgApplicantRepository};
pub use redis_cache::RedisPageCache;
pub use repository::{ApplicantRepository, RepositoryError};
pub use router::applicant_router;
pub use service::{ApplicantService, ApplicantServiceError};
pub use validation::{
    sanitize, validate_email, validate_phone, validate_status, ValidationError,
};
