use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    InsertOutcome, NewUrl, OwnerId, Result, ShortCode, StoreError, UrlRecord,
    store::{UrlStore, UrlTransaction, validate_batch},
};

#[derive(Debug, Default)]
struct Tables {
    by_code: HashMap<ShortCode, UrlRecord>,
    by_url: HashMap<String, ShortCode>,
}

impl Tables {
    fn existing_for_url(&self, original_url: &str) -> Option<UrlRecord> {
        self.by_url
            .get(original_url)
            .and_then(|code| self.by_code.get(code))
            .cloned()
    }

    fn conflicts_with(&self, url: &NewUrl) -> bool {
        self.by_url.contains_key(&url.original_url) || self.by_code.contains_key(&url.code)
    }

    fn put(&mut self, record: UrlRecord) {
        self.by_url
            .insert(record.original_url.clone(), record.code.clone());
        self.by_code.insert(record.code.clone(), record);
    }
}

#[derive(Debug, Default)]
struct Faults {
    fail_on_begin: bool,
    fail_on_commit: bool,
    fail_on_rollback: bool,
    fail_on_codes: HashSet<ShortCode>,
    mark_delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct Counters {
    begins: AtomicUsize,
    marks: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

/// In-memory URL store.
///
/// Provides the same interface as the PostgreSQL implementation. Deletion
/// transactions stage their marks privately and only publish them on commit;
/// a single writer permit serializes them. Faults can be injected for tests.
#[derive(Clone, Default)]
pub struct InMemoryUrlStore {
    tables: Arc<RwLock<Tables>>,
    writer: Arc<Mutex<()>>,
    faults: Arc<RwLock<Faults>>,
    counters: Arc<Counters>,
}

impl InMemoryUrlStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored records, deleted ones included.
    pub async fn record_count(&self) -> usize {
        self.tables.read().await.by_code.len()
    }

    /// Configures `begin` to fail.
    pub async fn set_fail_on_begin(&self, fail: bool) {
        self.faults.write().await.fail_on_begin = fail;
    }

    /// Configures `commit` to fail. The staged marks are discarded.
    pub async fn set_fail_on_commit(&self, fail: bool) {
        self.faults.write().await.fail_on_commit = fail;
    }

    /// Configures `rollback` to fail.
    pub async fn set_fail_on_rollback(&self, fail: bool) {
        self.faults.write().await.fail_on_rollback = fail;
    }

    /// Makes every `mark_deleted` of the given code fail.
    pub async fn fail_on_code(&self, code: impl Into<ShortCode>) {
        self.faults.write().await.fail_on_codes.insert(code.into());
    }

    /// Delays every `mark_deleted` call, to widen race windows in tests.
    pub async fn set_mark_delay(&self, delay: Option<Duration>) {
        self.faults.write().await.mark_delay = delay;
    }

    /// Number of transactions opened so far.
    pub fn begin_count(&self) -> usize {
        self.counters.begins.load(Ordering::SeqCst)
    }

    /// Number of `mark_deleted` calls so far.
    pub fn mark_count(&self) -> usize {
        self.counters.marks.load(Ordering::SeqCst)
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.counters.commits.load(Ordering::SeqCst)
    }

    /// Number of successful rollbacks so far.
    pub fn rollback_count(&self) -> usize {
        self.counters.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UrlStore for InMemoryUrlStore {
    type Tx = InMemoryTransaction;

    async fn insert(&self, url: NewUrl) -> Result<InsertOutcome> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.existing_for_url(&url.original_url) {
            return Ok(InsertOutcome::Exists(existing));
        }

        // Same code for a different URL
        if tables.by_code.contains_key(&url.code) {
            return Err(StoreError::Conflict {
                original_url: url.original_url,
                code: url.code,
            });
        }

        let record = url.into_record();
        tables.put(record.clone());
        Ok(InsertOutcome::Created(record))
    }

    async fn insert_batch(&self, urls: Vec<NewUrl>) -> Result<Vec<UrlRecord>> {
        validate_batch(&urls)?;

        let mut tables = self.tables.write().await;

        if let Some(conflict) = urls.iter().find(|url| tables.conflicts_with(url)) {
            return Err(StoreError::Conflict {
                original_url: conflict.original_url.clone(),
                code: conflict.code.clone(),
            });
        }

        let records: Vec<UrlRecord> = urls.into_iter().map(NewUrl::into_record).collect();
        for record in &records {
            tables.put(record.clone());
        }

        Ok(records)
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        Ok(self.tables.read().await.by_code.get(code).cloned())
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<UrlRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<_> = tables
            .by_code
            .values()
            .filter(|record| &record.owner == owner && !record.deleted)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.code.cmp(&b.code)));
        Ok(records)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn begin(&self) -> Result<InMemoryTransaction> {
        if self.faults.read().await.fail_on_begin {
            return Err(StoreError::Unavailable(
                "simulated failure opening transaction".to_string(),
            ));
        }

        let permit = self.writer.clone().lock_owned().await;
        self.counters.begins.fetch_add(1, Ordering::SeqCst);

        Ok(InMemoryTransaction {
            tables: self.tables.clone(),
            faults: self.faults.clone(),
            counters: self.counters.clone(),
            staged: Mutex::new(HashSet::new()),
            _permit: permit,
        })
    }
}

/// Deletion transaction over an [`InMemoryUrlStore`].
pub struct InMemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<RwLock<Faults>>,
    counters: Arc<Counters>,
    staged: Mutex<HashSet<ShortCode>>,
    _permit: OwnedMutexGuard<()>,
}

#[async_trait]
impl UrlTransaction for InMemoryTransaction {
    async fn mark_deleted(&self, owner: &OwnerId, code: &ShortCode) -> Result<u64> {
        self.counters.marks.fetch_add(1, Ordering::SeqCst);

        let (delay, fail) = {
            let faults = self.faults.read().await;
            (faults.mark_delay, faults.fail_on_codes.contains(code))
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(StoreError::Unavailable(format!(
                "simulated failure marking {code} deleted"
            )));
        }

        let matched = self
            .tables
            .read()
            .await
            .by_code
            .get(code)
            .is_some_and(|record| &record.owner == owner);
        if !matched {
            return Ok(0);
        }

        self.staged.lock().await.insert(code.clone());
        Ok(1)
    }

    async fn commit(self) -> Result<()> {
        if self.faults.read().await.fail_on_commit {
            return Err(StoreError::Unavailable(
                "simulated failure committing transaction".to_string(),
            ));
        }

        let staged = self.staged.into_inner();
        let mut tables = self.tables.write().await;
        for code in &staged {
            if let Some(record) = tables.by_code.get_mut(code) {
                record.deleted = true;
            }
        }

        self.counters.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        if self.faults.read().await.fail_on_rollback {
            return Err(StoreError::Unavailable(
                "simulated failure rolling back transaction".to_string(),
            ));
        }

        self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UrlStoreExt;

    fn new_url(original: &str, code: &str, owner: &str) -> NewUrl {
        NewUrl::new(original, code, format!("corr-{code}"), OwnerId::new(owner))
    }

    async fn seeded_store() -> InMemoryUrlStore {
        let store = InMemoryUrlStore::new();
        store
            .insert_batch(vec![
                new_url("https://a.example", "abc", "userA"),
                new_url("https://d.example", "def", "userA"),
                new_url("https://x.example", "xyz", "userB"),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = InMemoryUrlStore::new();
        let outcome = store
            .insert(new_url("https://a.example", "abc", "userA"))
            .await
            .unwrap();
        assert!(outcome.is_created());

        let record = store.get(&ShortCode::new("abc")).await.unwrap().unwrap();
        assert_eq!(record.original_url, "https://a.example");
        assert_eq!(record.owner, OwnerId::new("userA"));
        assert!(!record.deleted);
    }

    #[tokio::test]
    async fn insert_existing_url_returns_existing_record() {
        let store = InMemoryUrlStore::new();
        store
            .insert(new_url("https://a.example", "abc", "userA"))
            .await
            .unwrap();

        let outcome = store
            .insert(new_url("https://a.example", "abc", "userB"))
            .await
            .unwrap();
        assert!(!outcome.is_created());
        assert_eq!(outcome.record().owner, OwnerId::new("userA"));
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn insert_code_collision_is_a_conflict() {
        let store = InMemoryUrlStore::new();
        store
            .insert(new_url("https://a.example", "abc", "userA"))
            .await
            .unwrap();

        let result = store
            .insert(new_url("https://other.example", "abc", "userA"))
            .await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn insert_batch_is_all_or_nothing() {
        let store = InMemoryUrlStore::new();
        store
            .insert(new_url("https://a.example", "abc", "userA"))
            .await
            .unwrap();

        let result = store
            .insert_batch(vec![
                new_url("https://new.example", "new", "userA"),
                new_url("https://a.example", "abc", "userA"),
            ])
            .await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert!(!store.contains(&ShortCode::new("new")).await.unwrap());
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn list_by_owner_skips_other_owners_and_deleted() {
        let store = seeded_store().await;

        let tx = store.begin().await.unwrap();
        tx.mark_deleted(&OwnerId::new("userA"), &ShortCode::new("def"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let listed = store.list_by_owner(&OwnerId::new("userA")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].code, ShortCode::new("abc"));
    }

    #[tokio::test]
    async fn commit_publishes_staged_marks() {
        let store = seeded_store().await;
        let owner = OwnerId::new("userA");

        let tx = store.begin().await.unwrap();
        assert_eq!(
            tx.mark_deleted(&owner, &ShortCode::new("abc")).await.unwrap(),
            1
        );

        // Not visible before commit
        assert_eq!(
            store.is_deleted(&ShortCode::new("abc")).await.unwrap(),
            Some(false)
        );

        tx.commit().await.unwrap();
        assert_eq!(
            store.is_deleted(&ShortCode::new("abc")).await.unwrap(),
            Some(true)
        );
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_staged_marks() {
        let store = seeded_store().await;

        let tx = store.begin().await.unwrap();
        tx.mark_deleted(&OwnerId::new("userA"), &ShortCode::new("abc"))
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(
            store.is_deleted(&ShortCode::new("abc")).await.unwrap(),
            Some(false)
        );
        assert_eq!(store.rollback_count(), 1);
    }

    #[tokio::test]
    async fn mark_foreign_or_unknown_code_matches_nothing() {
        let store = seeded_store().await;

        let tx = store.begin().await.unwrap();
        let foreign = tx
            .mark_deleted(&OwnerId::new("userB"), &ShortCode::new("abc"))
            .await
            .unwrap();
        let unknown = tx
            .mark_deleted(&OwnerId::new("userA"), &ShortCode::new("nope"))
            .await
            .unwrap();
        assert_eq!(foreign, 0);
        assert_eq!(unknown, 0);
        tx.commit().await.unwrap();

        assert_eq!(
            store.is_deleted(&ShortCode::new("abc")).await.unwrap(),
            Some(false)
        );
    }

    #[tokio::test]
    async fn injected_mark_failure() {
        let store = seeded_store().await;
        store.fail_on_code("abc").await;

        let tx = store.begin().await.unwrap();
        let result = tx
            .mark_deleted(&OwnerId::new("userA"), &ShortCode::new("abc"))
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn failed_commit_leaves_records_live() {
        let store = seeded_store().await;
        store.set_fail_on_commit(true).await;

        let tx = store.begin().await.unwrap();
        tx.mark_deleted(&OwnerId::new("userA"), &ShortCode::new("abc"))
            .await
            .unwrap();
        assert!(tx.commit().await.is_err());

        assert_eq!(
            store.is_deleted(&ShortCode::new("abc")).await.unwrap(),
            Some(false)
        );
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn begin_waits_for_open_transaction() {
        let store = seeded_store().await;

        let first = store.begin().await.unwrap();
        let second = tokio::time::timeout(Duration::from_millis(50), store.begin()).await;
        assert!(second.is_err(), "second writer must wait");

        first.commit().await.unwrap();
        let second = tokio::time::timeout(Duration::from_millis(500), store.begin()).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn begin_failure() {
        let store = InMemoryUrlStore::new();
        store.set_fail_on_begin(true).await;

        assert!(store.begin().await.is_err());
        assert_eq!(store.begin_count(), 0);
    }
}
