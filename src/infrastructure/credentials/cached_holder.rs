use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::CredentialsFactory;
use crate::domain::credentials::{credentials_types, keys, CredentialsHolder, HolderState};
use crate::domain::{Connection, DomainError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    project_id: String,
    connection_id: String,
}

impl CacheKey {
    fn new(project_id: &str, connection_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            connection_id: connection_id.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedHolder {
    holder: Arc<CredentialsHolder>,
    /// Static connection whose keys sign for this holder, for assumed roles
    principal_connection_id: Option<String>,
}

impl CachedHolder {
    fn new(holder: CredentialsHolder, connection: &Connection) -> Self {
        let principal_connection_id = (connection.credentials_type()
            == Some(credentials_types::ASSUMED_ROLE))
        .then(|| {
            connection
                .properties()
                .non_blank(keys::PRINCIPAL_CONNECTION_ID)
                .map(str::to_string)
        })
        .flatten();

        Self {
            holder: Arc::new(holder),
            principal_connection_id,
        }
    }
}

/// Keeps one resolved holder per connection so repeated lookups do not
/// re-assume roles or re-issue sessions
#[derive(Debug)]
pub struct CredentialsHolderCache {
    factory: Arc<CredentialsFactory>,
    cache: Cache<CacheKey, CachedHolder>,
}

impl CredentialsHolderCache {
    pub fn new(factory: Arc<CredentialsFactory>, ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();

        Self { factory, cache }
    }

    /// Cached holder for `connection`, building it on a miss.
    ///
    /// Concurrent misses for the same connection share a single build.
    pub async fn get_or_build(
        &self,
        connection: &Connection,
    ) -> Result<Arc<CredentialsHolder>, DomainError> {
        let key = CacheKey::new(connection.project_id(), connection.id());

        if let Some(cached) = self.cache.get(&key).await {
            if cached.holder.state().await != HolderState::Invalidated {
                tracing::debug!(
                    connection_id = %connection.id(),
                    project_id = %connection.project_id(),
                    "Cache hit for credentials holder"
                );
                return Ok(cached.holder);
            }
            self.cache.invalidate(&key).await;
        }

        tracing::debug!(
            connection_id = %connection.id(),
            project_id = %connection.project_id(),
            "Cache miss, building credentials holder"
        );

        self.cache
            .try_get_with(key, async {
                self.factory
                    .build_for_connection(connection)
                    .await
                    .map(|holder| CachedHolder::new(holder, connection))
            })
            .await
            .map(|cached| cached.holder)
            .map_err(|e| (*e).clone())
    }

    /// Drop the cached holder and mark it unusable for anyone still holding it
    pub async fn invalidate(&self, project_id: &str, connection_id: &str) {
        let key = CacheKey::new(project_id, connection_id);

        if let Some(cached) = self.cache.get(&key).await {
            cached.holder.invalidate().await;
            tracing::info!(
                connection_id = %connection_id,
                project_id = %project_id,
                "Invalidated cached credentials holder"
            );
        }
        self.cache.invalidate(&key).await;
    }

    /// Invalidate every cached assumed-role holder signed by `principal_connection_id`.
    ///
    /// Returns how many holders were dropped.
    pub async fn invalidate_dependents(
        &self,
        project_id: &str,
        principal_connection_id: &str,
    ) -> usize {
        let dependents: Vec<(Arc<CacheKey>, CachedHolder)> = self
            .cache
            .iter()
            .filter(|(key, cached)| {
                key.project_id == project_id
                    && cached.principal_connection_id.as_deref() == Some(principal_connection_id)
            })
            .collect();

        for (key, cached) in &dependents {
            cached.holder.invalidate().await;
            self.cache.invalidate(key.as_ref()).await;
            tracing::info!(
                connection_id = %key.connection_id,
                project_id = %project_id,
                principal_connection_id = %principal_connection_id,
                "Invalidated assumed-role holder after its principal changed"
            );
        }

        dependents.len()
    }

    pub async fn invalidate_all(&self) {
        for (_, cached) in self.cache.iter() {
            cached.holder.invalidate().await;
        }
        self.cache.invalidate_all();
    }

    /// Number of live cached holders
    pub async fn cache_size(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}
