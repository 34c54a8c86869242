//! Credentials holder with refresh-on-demand and lazy expiration

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::CredentialData;
use crate::domain::DomainError;

/// Key material plus the moment it stops being valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredentials {
    pub data: CredentialData,
    pub expiration: Option<DateTime<Utc>>,
}

impl IssuedCredentials {
    pub fn new(data: CredentialData, expiration: Option<DateTime<Utc>>) -> Self {
        Self { data, expiration }
    }
}

/// Re-issues credentials for a holder (re-assume a role, request a new session)
#[async_trait]
pub trait CredentialsRefresher: Send + Sync + Debug {
    async fn refresh(&self) -> Result<IssuedCredentials, DomainError>;
}

/// Observable lifecycle of a holder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolderState {
    Resolved,
    Expired,
    Invalidated,
}

#[derive(Debug)]
struct Snapshot {
    data: Arc<CredentialData>,
    expiration: Option<DateTime<Utc>>,
    invalidated: bool,
}

impl Snapshot {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration.map(|exp| now > exp).unwrap_or(false)
    }

    fn state(&self, now: DateTime<Utc>) -> HolderState {
        if self.invalidated {
            HolderState::Invalidated
        } else if self.is_expired(now) {
            HolderState::Expired
        } else {
            HolderState::Resolved
        }
    }
}

/// Owns the current credentials snapshot of one connection.
///
/// Readers always get a whole `Arc<CredentialData>`; `refresh` swaps the
/// snapshot under the write lock, so a read never mixes keys from two
/// generations. At most one refresh runs at a time per holder.
#[derive(Debug)]
pub struct CredentialsHolder {
    snapshot: RwLock<Snapshot>,
    refresh_lock: Mutex<()>,
    refresher: Option<Arc<dyn CredentialsRefresher>>,
}

impl CredentialsHolder {
    /// Holder for long-lived keys; never expires, refresh has no effect
    pub fn fixed(data: CredentialData) -> Self {
        Self {
            snapshot: RwLock::new(Snapshot {
                data: Arc::new(data),
                expiration: None,
                invalidated: false,
            }),
            refresh_lock: Mutex::new(()),
            refresher: None,
        }
    }

    /// Holder for temporary credentials that can be re-issued
    pub fn refreshable(issued: IssuedCredentials, refresher: Arc<dyn CredentialsRefresher>) -> Self {
        Self {
            snapshot: RwLock::new(Snapshot {
                data: Arc::new(issued.data),
                expiration: issued.expiration,
                invalidated: false,
            }),
            refresh_lock: Mutex::new(()),
            refresher: Some(refresher),
        }
    }

    pub fn is_refreshable(&self) -> bool {
        self.refresher.is_some()
    }

    /// Current credentials; fails once expired or invalidated.
    ///
    /// Callers must not cache the returned data across `refresh` calls.
    pub async fn credentials(&self) -> Result<Arc<CredentialData>, DomainError> {
        let snapshot = self.snapshot.read().await;
        match snapshot.state(Utc::now()) {
            HolderState::Resolved => Ok(snapshot.data.clone()),
            HolderState::Invalidated => Err(DomainError::Invalidated),
            HolderState::Expired => Err(DomainError::Expired {
                expired_at: snapshot.expiration.unwrap_or_else(Utc::now),
            }),
        }
    }

    /// Current credentials, refreshing first when they have expired
    pub async fn fresh_credentials(&self) -> Result<Arc<CredentialData>, DomainError> {
        if self.state().await == HolderState::Expired && self.is_refreshable() {
            self.refresh_inner(true).await?;
        }
        self.credentials().await
    }

    /// Re-issue the credentials in place
    pub async fn refresh(&self) -> Result<(), DomainError> {
        self.refresh_inner(false).await
    }

    pub async fn expiration(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().await.expiration
    }

    pub async fn state(&self) -> HolderState {
        self.snapshot.read().await.state(Utc::now())
    }

    /// Terminal: every later read or refresh fails
    pub async fn invalidate(&self) {
        self.snapshot.write().await.invalidated = true;
    }

    async fn refresh_inner(&self, only_if_expired: bool) -> Result<(), DomainError> {
        let Some(refresher) = &self.refresher else {
            return match self.state().await {
                HolderState::Invalidated => Err(DomainError::Invalidated),
                _ => Ok(()),
            };
        };

        let _guard = self.refresh_lock.lock().await;

        {
            let snapshot = self.snapshot.read().await;
            if snapshot.invalidated {
                return Err(DomainError::Invalidated);
            }
            // Another caller may have refreshed while we waited for the lock
            if only_if_expired && !snapshot.is_expired(Utc::now()) {
                return Ok(());
            }
        }

        tracing::debug!("Refreshing AWS credentials");

        let issued = refresher.refresh().await.inspect_err(|e| {
            tracing::warn!(error = %e, "Failed to refresh AWS credentials");
        })?;

        let mut snapshot = self.snapshot.write().await;
        if snapshot.invalidated {
            return Err(DomainError::Invalidated);
        }
        snapshot.data = Arc::new(issued.data);
        snapshot.expiration = issued.expiration;

        Ok(())
    }
}
