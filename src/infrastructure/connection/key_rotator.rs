use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::old_keys::OldKeysCleaner;
use crate::domain::credentials::{credentials_types, keys, mask_key, CredentialData};
use crate::domain::remote::NewAccessKey;
use crate::domain::{
    Connection, ConnectionRepository, DomainError, IdentityManagementService, ProjectRepository,
    SecurityTokenService,
};
use crate::infrastructure::credentials::{CredentialsHolderCache, StaticKeysBuilder, StsSettings};

/// Timing of the new-key confirmation step
#[derive(Debug, Clone, Copy)]
pub struct RotationTiming {
    pub confirm_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for RotationTiming {
    fn default() -> Self {
        Self {
            confirm_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatedKeys {
    pub user_name: String,
    pub previous_access_key_id: String,
    pub new_access_key_id: String,
    pub previous_key_delete_after: DateTime<Utc>,
}

/// Replaces the long-lived keys of a static connection without a window in
/// which the connection has no working key
#[derive(Debug)]
pub struct KeyRotator {
    projects: Arc<dyn ProjectRepository>,
    connections: Arc<dyn ConnectionRepository>,
    sts: Arc<dyn SecurityTokenService>,
    iam: Arc<dyn IdentityManagementService>,
    cleaner: Arc<OldKeysCleaner>,
    holders: Option<Arc<CredentialsHolderCache>>,
    settings: StsSettings,
    timing: RotationTiming,
}

impl KeyRotator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        connections: Arc<dyn ConnectionRepository>,
        sts: Arc<dyn SecurityTokenService>,
        iam: Arc<dyn IdentityManagementService>,
        cleaner: Arc<OldKeysCleaner>,
        holders: Option<Arc<CredentialsHolderCache>>,
        settings: StsSettings,
        timing: RotationTiming,
    ) -> Self {
        Self {
            projects,
            connections,
            sts,
            iam,
            cleaner,
            holders,
            settings,
            timing,
        }
    }

    pub async fn rotate_connection_keys(
        &self,
        connection_id: &str,
        project_id: &str,
    ) -> Result<RotatedKeys, DomainError> {
        let connection = self.locate(connection_id, project_id).await?;
        let properties = connection.properties();

        if connection.credentials_type() != Some(credentials_types::STATIC) {
            return Err(DomainError::key_rotation(format!(
                "Only access keys can be rotated, the connection '{}' uses the credentials type {}",
                connection_id,
                connection.credentials_type().unwrap_or("null")
            )));
        }

        let previous = StaticKeysBuilder::credential_data(properties)
            .map_err(|e| DomainError::key_rotation(e.to_string()))?;
        let region = self.settings.region(properties).to_string();

        tracing::info!(
            connection_id = %connection_id,
            key = %mask_key(previous.access_key_id()),
            "Key rotation initiated"
        );

        let user_name = self
            .iam
            .get_user_name(&previous, &region)
            .await
            .map_err(|e| DomainError::key_rotation(e.summary()))?;

        let NewAccessKey {
            credentials: new_keys,
            ..
        } = self
            .iam
            .create_access_key(&previous, &region, &user_name)
            .await
            .map_err(|e| DomainError::key_rotation(e.summary()))?;

        // From here on, any failure must remove the new key and leave the stored one alone
        if let Err(e) = self.confirm_and_store(&connection, &new_keys).await {
            self.discard_new_key(&previous, &region, &user_name, new_keys.access_key_id())
                .await;
            return Err(e);
        }

        if let Some(holders) = &self.holders {
            holders.invalidate(project_id, connection_id).await;
            holders.invalidate_dependents(project_id, connection_id).await;
        }

        let pending = self
            .cleaner
            .schedule_for_deletion(previous.access_key_id(), connection_id, project_id)
            .await;

        tracing::info!(
            connection_id = %connection_id,
            previous_key = %mask_key(previous.access_key_id()),
            new_key = %mask_key(new_keys.access_key_id()),
            "Key rotation completed"
        );

        Ok(RotatedKeys {
            user_name,
            previous_access_key_id: previous.access_key_id().to_string(),
            new_access_key_id: new_keys.access_key_id().to_string(),
            previous_key_delete_after: pending.delete_after,
        })
    }

    async fn locate(&self, connection_id: &str, project_id: &str) -> Result<Connection, DomainError> {
        self.projects
            .find_project(project_id)
            .await?
            .ok_or_else(|| {
                DomainError::key_rotation(format!("The project with ID {project_id} was not found."))
            })?;

        self.connections
            .find_connection(project_id, connection_id)
            .await?
            .ok_or_else(|| {
                DomainError::key_rotation(format!(
                    "The AWS Connection with ID {connection_id} was not found."
                ))
            })
    }

    async fn confirm_and_store(
        &self,
        connection: &Connection,
        new_keys: &CredentialData,
    ) -> Result<(), DomainError> {
        self.wait_until_usable(connection, new_keys).await?;

        // Re-read: the connection may have changed or vanished while we waited
        let current = self
            .connections
            .find_connection(connection.project_id(), connection.id())
            .await?
            .ok_or_else(|| {
                DomainError::key_rotation("The connection has been deleted while the keys were rotated")
            })?;

        let updated = current
            .properties()
            .rewritten(keys::ACCESS_KEY_ID, new_keys.access_key_id())
            .with(keys::SECRET_ACCESS_KEY, new_keys.secret_access_key())
            .without(keys::SESSION_TOKEN);

        self.connections
            .update_properties(connection.project_id(), connection.id(), updated)
            .await
            .map_err(|e| DomainError::key_rotation(format!("Failed to store the new key: {e}")))?;

        Ok(())
    }

    /// New IAM keys take a few seconds to propagate
    async fn wait_until_usable(
        &self,
        connection: &Connection,
        new_keys: &CredentialData,
    ) -> Result<(), DomainError> {
        let target = self.settings.target(connection.properties());

        let poll = async {
            loop {
                match self.sts.get_caller_identity(new_keys, &target).await {
                    Ok(_) => return,
                    Err(e) => {
                        tracing::debug!(
                            key = %mask_key(new_keys.access_key_id()),
                            error = %e,
                            "New key is not usable yet"
                        );
                        tokio::time::sleep(self.timing.poll_interval).await;
                    }
                }
            }
        };

        tokio::time::timeout(self.timing.confirm_timeout, poll)
            .await
            .map_err(|_| {
                DomainError::key_rotation(format!(
                    "The new key could not be confirmed within {} seconds",
                    self.timing.confirm_timeout.as_secs()
                ))
            })
    }

    async fn discard_new_key(
        &self,
        previous: &CredentialData,
        region: &str,
        user_name: &str,
        new_access_key_id: &str,
    ) {
        if let Err(e) = self
            .iam
            .delete_access_key(previous, region, Some(user_name.to_string()), new_access_key_id)
            .await
        {
            tracing::warn!(
                key = %mask_key(new_access_key_id),
                error = %e,
                "Failed to delete the new key after an unsuccessful rotation"
            );
        }
    }
}
