use std::sync::Arc;

use super::common::*;
use crate::applicants::cache::{page_key, CachePolicy, InvalidationPolicy, DEFAULT_PAGE_TTL};
use crate::applicants::domain::{ApplicantId, ApplicantPatch, ApplicantStatus, PageRequest};
use crate::applicants::memory::InMemoryPageCache;
use crate::applicants::service::{ApplicantService, ApplicantServiceError};
use crate::applicants::validation::ValidationError;

#[tokio::test]
async fn create_then_get_returns_stored_record() {
    let (service, _repository, _cache) = build_service();

    let created = service
        .create(submission("Jane Doe", "jane@example.com"))
        .await
        .expect("create succeeds");
    let fetched = service.get(created.id).await.expect("get succeeds");

    assert_eq!(fetched, created);
    assert_eq!(fetched.name, "Jane Doe");
    assert_eq!(fetched.email, "jane@example.com");
    assert_eq!(fetched.position, "Platform Engineer");
    assert_eq!(fetched.status, ApplicantStatus::Pending);
    assert_eq!(fetched.phone.as_deref(), Some("+1234567890"));
    assert!(fetched.deleted_at.is_none());
    assert_eq!(fetched.created_at, fetched.updated_at);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict_after_normalization() {
    let (service, _repository, _cache) = build_service();

    service
        .create(submission("Jane Doe", "jane@example.com"))
        .await
        .expect("first create succeeds");

    match service
        .create(submission("Jane Again", "  JANE@Example.com "))
        .await
    {
        Err(ApplicantServiceError::Conflict) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_duplicate_creates_yield_one_conflict() {
    let (service, _repository, _cache) = build_service();
    let service = Arc::new(service);

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.create(submission("A", "race@example.com")).await })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.create(submission("B", "race@example.com")).await })
    };

    let results = [
        first.await.expect("task joins"),
        second.await.expect("task joins"),
    ];
    let successes = results.iter().filter(|result| result.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|result| matches!(result, Err(ApplicantServiceError::Conflict)))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
}

#[tokio::test]
async fn validation_fails_before_the_store_is_touched() {
    let service = ApplicantService::new(
        Arc::new(UnavailableRepository),
        Arc::new(InMemoryPageCache::default()),
    );

    match service
        .create(submission("Jane Doe", "not-an-email"))
        .await
    {
        Err(ApplicantServiceError::Validation(ValidationError::InvalidEmail)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }

    let mut invalid_status = submission("Jane Doe", "jane@example.com");
    invalid_status.status = Some("ghosted".to_string());
    match service.create(invalid_status).await {
        Err(ApplicantServiceError::Validation(ValidationError::InvalidStatus)) => {}
        other => panic!("expected invalid status, got {other:?}"),
    }
}

#[tokio::test]
async fn store_outage_surfaces_as_internal() {
    let service = ApplicantService::new(
        Arc::new(UnavailableRepository),
        Arc::new(InMemoryPageCache::default()),
    );

    match service
        .create(submission("Jane Doe", "jane@example.com"))
        .await
    {
        Err(ApplicantServiceError::Internal(message)) => {
            assert_eq!(message, "Failed to create applicant");
        }
        other => panic!("expected internal error, got {other:?}"),
    }

    match service.list(PageRequest::default()).await {
        Err(err @ ApplicantServiceError::Internal(_)) => {
            assert_eq!(err.to_string(), "Failed to fetch applicants");
        }
        other => panic!("expected internal error, got {other:?}"),
    }
}

#[tokio::test]
async fn second_identical_list_is_served_from_cache() {
    let (service, repository, cache) = build_service();
    service
        .create(submission("Jane Doe", "jane@example.com"))
        .await
        .expect("create succeeds");

    let request = PageRequest::default();
    let first = service.list(request).await.expect("first list");
    assert_eq!(repository.list_calls(), 1);
    assert!(cache.contains(&page_key(request)));

    let second = service.list(request).await.expect("second list");
    assert_eq!(repository.list_calls(), 1, "cache hit must not query store");
    assert_eq!(first, second);
    assert_eq!(second.page, 1);
    assert_eq!(second.limit, 10);
    assert_eq!(second.data.len(), 1);
}

#[tokio::test]
async fn unavailable_cache_falls_back_to_store() {
    let repository = Arc::new(CountingRepository::default());
    let cache = Arc::new(UnavailableCache::default());
    let service = ApplicantService::new(repository.clone(), cache.clone());

    service
        .create(submission("Jane Doe", "jane@example.com"))
        .await
        .expect("create succeeds despite cache outage");

    let page = service
        .list(PageRequest::default())
        .await
        .expect("list succeeds");
    service
        .list(PageRequest::default())
        .await
        .expect("list succeeds");

    assert_eq!(page.data.len(), 1);
    assert_eq!(repository.list_calls(), 2);
    // invalidate on create, then one read per list and no write-back
    assert_eq!(cache.attempts(), 3);
}

#[tokio::test]
async fn writes_invalidate_the_first_page() {
    let (service, repository, _cache) = build_service();
    let created = service
        .create(submission("Jane Doe", "jane@example.com"))
        .await
        .expect("create succeeds");

    let request = PageRequest::default();
    service.list(request).await.expect("warm cache");

    let updated = service
        .update(
            created.id,
            ApplicantPatch {
                status: Some("interviewed".to_string()),
                ..ApplicantPatch::default()
            },
        )
        .await
        .expect("update succeeds");
    assert_eq!(updated.status, ApplicantStatus::Interviewed);

    let after_update = service.list(request).await.expect("list after update");
    assert_eq!(after_update.data[0].status, ApplicantStatus::Interviewed);
    assert_eq!(repository.list_calls(), 2);

    service.delete(created.id).await.expect("delete succeeds");
    let after_delete = service.list(request).await.expect("list after delete");
    assert!(after_delete.data.is_empty());
}

#[tokio::test]
async fn well_known_policy_leaves_other_pages_stale_until_expiry() {
    let (service, _repository, _cache) = build_service();
    service
        .create(submission("First", "first@example.com"))
        .await
        .expect("create");
    let second = service
        .create(submission("Second", "second@example.com"))
        .await
        .expect("create");

    let second_page = PageRequest::new(2, 1);
    let before = service.list(second_page).await.expect("list");
    assert_eq!(before.data[0].name, "Second");

    service
        .update(
            second.id,
            ApplicantPatch {
                name: Some("Renamed".to_string()),
                ..ApplicantPatch::default()
            },
        )
        .await
        .expect("update");

    let after = service.list(second_page).await.expect("list");
    assert_eq!(after.data[0].name, "Second", "page 2 is not invalidated");
}

#[tokio::test]
async fn all_pages_policy_drops_every_cached_page() {
    let (service, _repository, cache) = build_service_with_policy(CachePolicy {
        ttl: DEFAULT_PAGE_TTL,
        invalidation: InvalidationPolicy::AllPages,
    });
    service
        .create(submission("First", "first@example.com"))
        .await
        .expect("create");
    let second = service
        .create(submission("Second", "second@example.com"))
        .await
        .expect("create");

    let second_page = PageRequest::new(2, 1);
    service.list(second_page).await.expect("list");
    assert!(cache.contains(&page_key(second_page)));

    service
        .update(
            second.id,
            ApplicantPatch {
                name: Some("Renamed".to_string()),
                ..ApplicantPatch::default()
            },
        )
        .await
        .expect("update");

    assert!(!cache.contains(&page_key(second_page)));
    let after = service.list(second_page).await.expect("list");
    assert_eq!(after.data[0].name, "Renamed");
}

#[tokio::test]
async fn deleted_applicants_are_not_found() {
    let (service, _repository, _cache) = build_service();
    let created = service
        .create(submission("Jane Doe", "jane@example.com"))
        .await
        .expect("create succeeds");

    service.delete(created.id).await.expect("delete succeeds");

    assert!(matches!(
        service.get(created.id).await,
        Err(ApplicantServiceError::NotFound)
    ));
    assert!(matches!(
        service.delete(created.id).await,
        Err(ApplicantServiceError::NotFound)
    ));

    service
        .create(submission("Jane Returns", "jane@example.com"))
        .await
        .expect("email is free again after soft delete");
}

#[tokio::test]
async fn missing_ids_are_not_found_rather_than_internal() {
    let (service, _repository, _cache) = build_service();
    let missing = ApplicantId(404);

    assert!(matches!(
        service.get(missing).await,
        Err(ApplicantServiceError::NotFound)
    ));
    assert!(matches!(
        service.update(missing, ApplicantPatch::default()).await,
        Err(ApplicantServiceError::NotFound)
    ));
    assert!(matches!(
        service.delete(missing).await,
        Err(ApplicantServiceError::NotFound)
    ));
}

#[tokio::test]
async fn update_merges_supplied_fields_only() {
    let (service, _repository, _cache) = build_service();
    let created = service
        .create(submission("Jane Doe", "jane@example.com"))
        .await
        .expect("create succeeds");

    let updated = service
        .update(
            created.id,
            ApplicantPatch {
                notes: Some("strong system design round".to_string()),
                name: Some(String::new()),
                ..ApplicantPatch::default()
            },
        )
        .await
        .expect("update succeeds");

    assert_eq!(updated.name, "Jane Doe");
    assert_eq!(updated.email, created.email);
    assert_eq!(updated.notes.as_deref(), Some("strong system design round"));
    assert!(updated.updated_at >= created.updated_at);

    let unchanged = service
        .update(created.id, ApplicantPatch::default())
        .await
        .expect("empty patch succeeds");
    assert_eq!(unchanged, updated);

    match service
        .update(
            created.id,
            ApplicantPatch {
                status: Some("ghosted".to_string()),
                ..ApplicantPatch::default()
            },
        )
        .await
    {
        Err(ApplicantServiceError::Validation(ValidationError::InvalidStatus)) => {}
        other => panic!("expected invalid status, got {other:?}"),
    }
}

#[tokio::test]
async fn update_into_taken_email_conflicts() {
    let (service, _repository, _cache) = build_service();
    service
        .create(submission("Jane Doe", "jane@example.com"))
        .await
        .expect("create");
    let john = service
        .create(submission("John Roe", "john@example.com"))
        .await
        .expect("create");

    match service
        .update(
            john.id,
            ApplicantPatch {
                email: Some("jane@example.com".to_string()),
                ..ApplicantPatch::default()
            },
        )
        .await
    {
        Err(ApplicantServiceError::Conflict) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn update_normalizes_email_before_the_uniqueness_check() {
    let (service, _repository, _cache) = build_service();
    service
        .create(submission("Jane Doe", "jane@example.com"))
        .await
        .expect("create");
    let john = service
        .create(submission("John Roe", "john@example.com"))
        .await
        .expect("create");

    match service
        .update(
            john.id,
            ApplicantPatch {
                email: Some(" JANE@Example.COM ".to_string()),
                name: Some("   ".to_string()),
                ..ApplicantPatch::default()
            },
        )
        .await
    {
        Err(ApplicantServiceError::Conflict) => {}
        other => panic!("expected conflict, got {other:?}"),
    }

    let renamed = service
        .update(
            john.id,
            ApplicantPatch {
                email: Some("  John.Roe@Example.com ".to_string()),
                name: Some("   ".to_string()),
                ..ApplicantPatch::default()
            },
        )
        .await
        .expect("update succeeds");
    assert_eq!(renamed.email, "john.roe@example.com");
    assert_eq!(renamed.name, "John Roe");
}
