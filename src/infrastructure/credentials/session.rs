use async_trait::async_trait;
use std::sync::Arc;

use super::params::{parse_duration, StsSettings, MAX_SESSION_DURATION, MIN_SESSION_DURATION};
use super::static_keys::validate_key_pair;
use crate::domain::credentials::{
    credentials_types, ensure_valid, keys, mask_key, ConnectionProperties, CredentialData,
    CredentialsBuilder, CredentialsHolder, CredentialsRefresher, InvalidProperty,
    IssuedCredentials,
};
use crate::domain::{DomainError, SecurityTokenService, StsTarget};

/// Re-requests a session token with the same long-lived keys
#[derive(Debug)]
struct SessionTokenRefresher {
    sts: Arc<dyn SecurityTokenService>,
    principal: CredentialData,
    target: StsTarget,
    duration_seconds: i32,
}

impl SessionTokenRefresher {
    async fn issue(&self) -> Result<IssuedCredentials, DomainError> {
        self.sts
            .get_session_token(&self.principal, &self.target, self.duration_seconds)
            .await
            .map_err(|e| {
                tracing::warn!(
                    key = %mask_key(self.principal.access_key_id()),
                    error = %e,
                    "GetSessionToken failed"
                );
                DomainError::from_remote(&e)
            })
    }
}

#[async_trait]
impl CredentialsRefresher for SessionTokenRefresher {
    async fn refresh(&self) -> Result<IssuedCredentials, DomainError> {
        self.issue().await
    }
}

/// Temporary session credentials issued for a set of long-lived keys
#[derive(Debug, Clone)]
pub struct SessionCredentialsBuilder {
    sts: Arc<dyn SecurityTokenService>,
    settings: StsSettings,
}

impl SessionCredentialsBuilder {
    pub fn new(sts: Arc<dyn SecurityTokenService>, settings: StsSettings) -> Self {
        Self { sts, settings }
    }

    fn duration_is_required(properties: &ConnectionProperties) -> Option<InvalidProperty> {
        properties
            .non_blank(keys::SESSION_DURATION_SECONDS)
            .is_none()
            .then(|| {
                InvalidProperty::new(
                    keys::SESSION_DURATION_SECONDS,
                    "Please provide the session duration",
                )
            })
    }
}

#[async_trait]
impl CredentialsBuilder for SessionCredentialsBuilder {
    fn credentials_type(&self) -> &'static str {
        credentials_types::SESSION
    }

    fn validate_properties(&self, properties: &ConnectionProperties) -> Vec<InvalidProperty> {
        let mut invalid = validate_key_pair(properties);

        match Self::duration_is_required(properties) {
            Some(missing) => invalid.push(missing),
            None => {
                if let Err(bad) =
                    parse_duration(properties, MIN_SESSION_DURATION, MAX_SESSION_DURATION)
                {
                    invalid.push(bad);
                }
            }
        }

        invalid.extend(self.settings.validate(properties));
        invalid
    }

    async fn construct_credentials_holder(
        &self,
        properties: &ConnectionProperties,
    ) -> Result<CredentialsHolder, DomainError> {
        ensure_valid(self.validate_properties(properties))?;

        let duration_seconds =
            parse_duration(properties, MIN_SESSION_DURATION, MAX_SESSION_DURATION)
                .map_err(|p| DomainError::invalid_field(p.property_name(), p.message()))?
                .unwrap_or(MIN_SESSION_DURATION);

        // Long-lived pair only; a stored session token is ignored
        let principal = CredentialData::new(
            properties.non_blank(keys::ACCESS_KEY_ID).unwrap_or_default(),
            properties.non_blank(keys::SECRET_ACCESS_KEY).unwrap_or_default(),
            None,
        )?;

        let refresher = SessionTokenRefresher {
            sts: self.sts.clone(),
            principal,
            target: self.settings.target(properties),
            duration_seconds,
        };

        let issued = refresher.issue().await?;
        tracing::info!(
            key = %mask_key(refresher.principal.access_key_id()),
            duration_seconds,
            expiration = ?issued.expiration,
            "Issued AWS session credentials"
        );

        Ok(CredentialsHolder::refreshable(issued, Arc::new(refresher)))
    }

    fn describe(&self, properties: &ConnectionProperties) -> String {
        let key = properties
            .non_blank(keys::ACCESS_KEY_ID)
            .map(mask_key)
            .unwrap_or_default();
        let duration = properties
            .non_blank(keys::SESSION_DURATION_SECONDS)
            .unwrap_or("?");
        format!("Session credentials for access key {key}, valid for {duration} seconds")
    }
}
