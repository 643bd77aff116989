//! Process-local adapters used by `--in-memory` runs and the test suite.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;

use super::cache::{CacheError, PageCache};
use super::domain::{Applicant, ApplicantChanges, ApplicantId, NewApplicant};
use super::repository::{ApplicantRepository, RepositoryError};

#[derive(Default)]
struct MemoryTable {
    last_id: i64,
    rows: BTreeMap<ApplicantId, Applicant>,
}

impl MemoryTable {
    fn email_taken(&self, email: &str, except: Option<ApplicantId>) -> bool {
        self.rows.values().any(|row| {
            row.deleted_at.is_none() && row.email == email && Some(row.id) != except
        })
    }

    fn active(&self, id: ApplicantId) -> Option<&Applicant> {
        self.rows.get(&id).filter(|row| row.deleted_at.is_none())
    }
}

/// Single-table store that keeps soft-deleted rows, like the Postgres adapter.
#[derive(Default, Clone)]
pub struct InMemoryApplicantRepository {
    table: Arc<Mutex<MemoryTable>>,
}

impl InMemoryApplicantRepository {
    /// Number of stored rows, soft-deleted ones included.
    pub fn stored_rows(&self) -> usize {
        self.table.lock().expect("repository mutex poisoned").rows.len()
    }
}

#[async_trait]
impl ApplicantRepository for InMemoryApplicantRepository {
    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        let guard = self.table.lock().expect("repository mutex poisoned");
        Ok(guard.email_taken(email, None))
    }

    async fn insert(&self, applicant: NewApplicant) -> Result<Applicant, RepositoryError> {
        let mut guard = self.table.lock().expect("repository mutex poisoned");
        if guard.email_taken(&applicant.email, None) {
            return Err(RepositoryError::Conflict);
        }

        guard.last_id += 1;
        let now = Utc::now();
        let record = Applicant {
            id: ApplicantId(guard.last_id),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            name: applicant.name,
            email: applicant.email,
            position: applicant.position,
            status: applicant.status,
            phone: applicant.phone,
            resume: applicant.resume,
            notes: applicant.notes,
        };
        guard.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn fetch(&self, id: ApplicantId) -> Result<Option<Applicant>, RepositoryError> {
        let guard = self.table.lock().expect("repository mutex poisoned");
        Ok(guard.active(id).cloned())
    }

    async fn list(&self, offset: u64, limit: u32) -> Result<Vec<Applicant>, RepositoryError> {
        let guard = self.table.lock().expect("repository mutex poisoned");
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(guard
            .rows
            .values()
            .filter(|row| row.deleted_at.is_none())
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: ApplicantId,
        changes: ApplicantChanges,
    ) -> Result<Applicant, RepositoryError> {
        let mut guard = self.table.lock().expect("repository mutex poisoned");
        if guard.active(id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        if let Some(email) = &changes.email {
            if guard.email_taken(email, Some(id)) {
                return Err(RepositoryError::Conflict);
            }
        }

        let record = guard.rows.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        changes.apply_to(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn soft_delete(&self, id: ApplicantId) -> Result<(), RepositoryError> {
        let mut guard = self.table.lock().expect("repository mutex poisoned");
        match guard.rows.get_mut(&id) {
            Some(record) if record.deleted_at.is_none() => {
                record.deleted_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}

/// TTL-aware key/value map. Expired entries are dropped on read.
#[derive(Default, Clone)]
pub struct InMemoryPageCache {
    entries: Arc<Mutex<HashMap<String, (String, Instant)>>>,
}

impl InMemoryPageCache {
    pub fn contains(&self, key: &str) -> bool {
        let guard = self.entries.lock().expect("cache mutex poisoned");
        guard
            .get(key)
            .is_some_and(|(_, expires_at)| *expires_at > Instant::now())
    }
}

fn glob_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[async_trait]
impl PageCache for InMemoryPageCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        let expired = match guard.get(key) {
            Some((payload, expires_at)) if *expires_at > Instant::now() => {
                return Ok(Some(payload.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            guard.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<(), CacheError> {
        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        guard.insert(key.to_string(), (payload, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        for key in keys {
            guard.remove(key);
        }
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> Result<usize, CacheError> {
        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        let before = guard.len();
        guard.retain(|key, _| !glob_matches(pattern, key));
        Ok(before - guard.len())
    }
}
