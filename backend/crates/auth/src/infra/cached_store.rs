//! Cached Credential Store
//!
//! Read-through/write-through wrapper around a [`CredentialStore`]. This is
//! the only cache caller and owns the single key under which the whole
//! collection lives.
//!
//! Policies:
//! - read: cache hit wins; miss loads from the store and repopulates.
//! - write: the store is persisted first; the cache is updated only after
//!   a successful persist, so a failed write leaves the cache stale-but-valid.
//! - mutate: read-modify-write cycles run behind an async lock, so two
//!   concurrent mutations cannot overwrite each other's records. A mutation
//!   that fails after persistence started invalidates the cached collection
//!   instead of serving diverged state.

use std::time::Duration;

use platform::cache::TtlCache;
use tokio::sync::Mutex;

use crate::domain::entity::account::AccountCollection;
use crate::domain::repository::CredentialStore;
use crate::error::AuthResult;

/// Cache key for the credential collection
pub const USERS_CACHE_KEY: &str = "users_data";

/// Credential store with a TTL cache in front
pub struct CachedCredentialStore<S> {
    store: S,
    cache: TtlCache<String, AccountCollection>,
    ttl: Duration,
    write_lock: Mutex<()>,
}

impl<S> CachedCredentialStore<S>
where
    S: CredentialStore + Sync,
{
    /// Wrap a store with the given cache TTL
    pub fn new(store: S, ttl: Duration) -> Self {
        Self {
            store,
            cache: TtlCache::new(),
            ttl,
            write_lock: Mutex::new(()),
        }
    }

    /// Read the collection, serving from cache when possible
    pub async fn read(&self) -> AuthResult<AccountCollection> {
        if let Some(cached) = self.cache.get(&USERS_CACHE_KEY.to_string()) {
            return Ok(cached);
        }

        let accounts = self.store.load_all().await?;
        self.cache
            .set(USERS_CACHE_KEY.to_string(), accounts.clone(), self.ttl);
        Ok(accounts)
    }

    /// Persist the collection, then refresh the cache
    ///
    /// On persistence failure the cache is left untouched: it still holds
    /// the last successfully written state.
    pub async fn write(&self, accounts: &AccountCollection) -> AuthResult<()> {
        self.store.save_all(accounts).await?;
        self.cache
            .set(USERS_CACHE_KEY.to_string(), accounts.clone(), self.ttl);
        Ok(())
    }

    /// Run a read-modify-write cycle atomically with respect to other
    /// mutations
    ///
    /// The closure sees the current collection and may mutate it; on `Ok`
    /// the collection is written through. A closure error writes nothing.
    /// A write error invalidates the cached collection before propagating,
    /// so no handler can keep serving state a failed operation produced.
    pub async fn mutate<F, T>(&self, f: F) -> AuthResult<T>
    where
        F: FnOnce(&mut AccountCollection) -> AuthResult<T> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;

        let mut accounts = self.read().await?;
        let out = f(&mut accounts)?;

        match self.write(&accounts).await {
            Ok(()) => Ok(out),
            Err(e) => {
                self.invalidate();
                Err(e)
            }
        }
    }

    /// Drop the cached collection; the next read repopulates from the store
    pub fn invalidate(&self) {
        self.cache.remove(&USERS_CACHE_KEY.to_string());
    }

    /// Drop every cache entry
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Peek at the cached collection without falling back to the store
    pub fn cached(&self) -> Option<AccountCollection> {
        self.cache.get(&USERS_CACHE_KEY.to_string())
    }

    /// Number of entries currently in the cache
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Direct access to the underlying store (diagnostics)
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::account::Account;
    use crate::domain::value_object::{
        account_password::{AccountPassword, RawPassword},
        email::Email,
        totp_secret::TotpSecret,
    };
    use crate::error::AuthError;
    use crate::infra::file_store::JsonFileStore;
    use std::sync::Arc;

    fn sample_account(identity: &str) -> Account {
        let email = Email::new(identity).unwrap();
        let raw = RawPassword::new("longpassword1".to_string()).unwrap();
        let hash = AccountPassword::from_raw(&raw, None).unwrap();
        Account::new(
            email,
            None,
            hash,
            TotpSecret::generate(),
            "data:image/png;base64,Zg==".to_string(),
        )
    }

    fn cached_store(
        dir: &tempfile::TempDir,
        ttl: Duration,
    ) -> CachedCredentialStore<JsonFileStore> {
        let store = JsonFileStore::new(dir.path().join("users.json"));
        CachedCredentialStore::new(store, ttl)
    }

    #[tokio::test]
    async fn test_write_through_then_read_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cached = cached_store(&dir, Duration::from_secs(60));

        let mut accounts = AccountCollection::new();
        accounts.insert(sample_account("a@x.com"));
        cached.write(&accounts).await.unwrap();

        // Remove the backing file: a read must still succeed from cache
        tokio::fs::remove_file(dir.path().join("users.json"))
            .await
            .unwrap();

        let read = cached.read().await.unwrap();
        assert_eq!(read, accounts);
    }

    #[tokio::test]
    async fn test_invalidate_repopulates_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let cached = cached_store(&dir, Duration::from_secs(60));

        let mut accounts = AccountCollection::new();
        accounts.insert(sample_account("a@x.com"));
        cached.write(&accounts).await.unwrap();

        // Grow the store behind the cache's back
        let direct = JsonFileStore::new(dir.path().join("users.json"));
        let mut on_disk = direct.load_all().await.unwrap();
        on_disk.insert(sample_account("b@x.com"));
        direct.save_all(&on_disk).await.unwrap();

        // Cached view is still the old one until invalidation
        assert_eq!(cached.read().await.unwrap().len(), 1);
        cached.invalidate();
        assert_eq!(cached.read().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_expired_cache_falls_back_to_store() {
        let dir = tempfile::tempdir().unwrap();
        let cached = cached_store(&dir, Duration::from_millis(10));

        let mut accounts = AccountCollection::new();
        accounts.insert(sample_account("a@x.com"));
        cached.write(&accounts).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        // Entry expired: read must reload from the store
        assert!(cached.cached().is_none());
        assert_eq!(cached.read().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mutate_closure_error_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cached = cached_store(&dir, Duration::from_secs(60));

        let mut accounts = AccountCollection::new();
        accounts.insert(sample_account("a@x.com"));
        cached.write(&accounts).await.unwrap();

        let result: AuthResult<()> = cached
            .mutate(|accounts| {
                accounts.insert(sample_account("b@x.com"));
                Err(AuthError::AccountExists)
            })
            .await;

        assert!(matches!(result, Err(AuthError::AccountExists)));
        // Neither the store nor the cache saw the insert
        let direct = JsonFileStore::new(dir.path().join("users.json"));
        assert_eq!(direct.load_all().await.unwrap().len(), 1);
        assert_eq!(cached.read().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_mutations_do_not_lose_updates() {
        let dir = tempfile::tempdir().unwrap();
        let cached = Arc::new(cached_store(&dir, Duration::from_secs(60)));

        let mut handles = Vec::new();
        for i in 0..4 {
            let cached = Arc::clone(&cached);
            handles.push(tokio::spawn(async move {
                cached
                    .mutate(move |accounts| {
                        accounts.insert(sample_account(&format!("user{}@x.com", i)));
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(cached.read().await.unwrap().len(), 4);
    }
}
