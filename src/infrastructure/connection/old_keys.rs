//! Deferred deletion of access keys replaced by rotation

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::credentials::{keys, mask_key};
use crate::domain::{ConnectionRepository, DomainError, IdentityManagementService};
use crate::infrastructure::credentials::{StaticKeysBuilder, StsSettings};

/// A rotated-out key waiting for its preserve window to pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingKeyDeletion {
    pub access_key_id: String,
    pub connection_id: String,
    pub project_id: String,
    pub delete_after: DateTime<Utc>,
}

/// Outcome of one purge pass
#[derive(Debug, Default)]
pub struct PurgeReport {
    pub deleted: Vec<String>,
    pub dropped: Vec<String>,
    pub failed: Vec<(String, DomainError)>,
}

enum Deletion {
    Deleted,
    /// The connection went back to this key; it must never be deleted
    KeyInUse,
}

#[derive(Debug)]
pub struct OldKeysCleaner {
    connections: Arc<dyn ConnectionRepository>,
    iam: Arc<dyn IdentityManagementService>,
    settings: StsSettings,
    preserve_for: Duration,
    pending: Mutex<Vec<PendingKeyDeletion>>,
}

impl OldKeysCleaner {
    pub fn new(
        connections: Arc<dyn ConnectionRepository>,
        iam: Arc<dyn IdentityManagementService>,
        settings: StsSettings,
        preserve_for: Duration,
    ) -> Self {
        Self {
            connections,
            iam,
            settings,
            preserve_for,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn preserve_for(&self) -> Duration {
        self.preserve_for
    }

    pub async fn schedule_for_deletion(
        &self,
        access_key_id: &str,
        connection_id: &str,
        project_id: &str,
    ) -> PendingKeyDeletion {
        let task = PendingKeyDeletion {
            access_key_id: access_key_id.to_string(),
            connection_id: connection_id.to_string(),
            project_id: project_id.to_string(),
            delete_after: Utc::now() + self.preserve_for,
        };

        tracing::debug!(
            key = %mask_key(access_key_id),
            connection_id = %connection_id,
            delete_after = %task.delete_after,
            "Scheduled old AWS key for deletion"
        );

        self.pending.lock().await.push(task.clone());
        task
    }

    pub async fn pending(&self) -> Vec<PendingKeyDeletion> {
        self.pending.lock().await.clone()
    }

    /// Delete every key whose preserve window ended before `now`.
    ///
    /// Each deletion is signed with the connection's current keys. Failed
    /// deletions stay queued. Tasks whose connection is gone, or whose key is
    /// in use again, are dropped.
    pub async fn purge_due(&self, now: DateTime<Utc>) -> PurgeReport {
        let due = {
            let mut pending = self.pending.lock().await;
            let (due, waiting): (Vec<_>, Vec<_>) =
                pending.drain(..).partition(|t| now > t.delete_after);
            *pending = waiting;
            due
        };

        let mut report = PurgeReport::default();
        let mut retry = Vec::new();

        for task in due {
            match self.delete(&task).await {
                Ok(Deletion::Deleted) => {
                    tracing::info!(key = %mask_key(&task.access_key_id), "Deleted old AWS key after rotation");
                    report.deleted.push(task.access_key_id);
                }
                Ok(Deletion::KeyInUse) => {
                    tracing::warn!(
                        key = %mask_key(&task.access_key_id),
                        connection_id = %task.connection_id,
                        "Old key is in use by the connection again, dropping deletion task"
                    );
                    report.dropped.push(task.access_key_id);
                }
                Err(DomainError::ConnectionNotFound { .. }) => {
                    tracing::warn!(
                        key = %mask_key(&task.access_key_id),
                        connection_id = %task.connection_id,
                        "Connection is gone, dropping old key deletion task"
                    );
                    report.dropped.push(task.access_key_id);
                }
                Err(e) => {
                    tracing::warn!(
                        key = %mask_key(&task.access_key_id),
                        error = %e,
                        "Cannot delete the old AWS key"
                    );
                    report.failed.push((task.access_key_id.clone(), e));
                    retry.push(task);
                }
            }
        }

        if !retry.is_empty() {
            self.pending.lock().await.extend(retry);
        }

        report
    }

    async fn delete(&self, task: &PendingKeyDeletion) -> Result<Deletion, DomainError> {
        let connection = self
            .connections
            .find_connection(&task.project_id, &task.connection_id)
            .await?
            .ok_or_else(|| DomainError::connection_not_found(&task.project_id, &task.connection_id))?;

        let properties = connection.properties();
        if properties.get(keys::ACCESS_KEY_ID) == Some(task.access_key_id.as_str()) {
            return Ok(Deletion::KeyInUse);
        }

        let current = StaticKeysBuilder::credential_data(properties)
            .map_err(|e| DomainError::key_rotation(e.to_string()))?;

        self.iam
            .delete_access_key(
                &current,
                self.settings.region(properties),
                None,
                &task.access_key_id,
            )
            .await
            .map(|()| Deletion::Deleted)
            .map_err(|e| DomainError::key_rotation(e.summary()))
    }
}
