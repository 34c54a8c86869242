use async_trait::async_trait;
use std::sync::Arc;

use super::external_id::ExternalIdGenerator;
use super::params::{
    is_valid_session_name, parse_duration, RoleArn, StsSettings, MAX_ROLE_SESSION_DURATION,
    MIN_ROLE_SESSION_DURATION,
};
use super::static_keys::StaticKeysBuilder;
use crate::domain::credentials::{
    credentials_types, ensure_valid, keys, mask_key, ConnectionProperties, CredentialData,
    CredentialsBuilder, CredentialsHolder, CredentialsRefresher, InvalidProperty,
    IssuedCredentials,
};
use crate::domain::remote::AssumeRoleRequest;
use crate::domain::{ConnectionRepository, DomainError, SecurityTokenService, StsTarget};

pub const DEFAULT_ROLE_SESSION_NAME: &str = "aws-connector-session";

/// Current keys of the static connection that assumes the role
async fn principal_credentials(
    connections: &dyn ConnectionRepository,
    project_id: &str,
    principal_id: &str,
) -> Result<CredentialData, DomainError> {
    let principal = connections
        .find_connection(project_id, principal_id)
        .await?
        .ok_or_else(|| DomainError::connection_not_found(project_id, principal_id))?;

    if principal.credentials_type() != Some(credentials_types::STATIC) {
        return Err(DomainError::invalid_field(
            keys::PRINCIPAL_CONNECTION_ID,
            format!(
                "The principal connection '{principal_id}' must use access keys to assume a role"
            ),
        ));
    }

    StaticKeysBuilder::credential_data(principal.properties())
}

/// Assumes the role on every call, signing with the principal's keys as
/// currently stored so a rotated principal takes effect on the next refresh
#[derive(Debug)]
struct AssumeRoleRefresher {
    sts: Arc<dyn SecurityTokenService>,
    connections: Arc<dyn ConnectionRepository>,
    project_id: String,
    principal_id: String,
    target: StsTarget,
    request: AssumeRoleRequest,
}

impl AssumeRoleRefresher {
    async fn assume(&self) -> Result<IssuedCredentials, DomainError> {
        let principal =
            principal_credentials(self.connections.as_ref(), &self.project_id, &self.principal_id)
                .await
                .inspect_err(|e| {
                    tracing::debug!(
                        principal_connection_id = %self.principal_id,
                        error = %e,
                        "Failed to get the principal connection to assume the role"
                    );
                })?;

        self.sts
            .assume_role(&principal, &self.target, &self.request)
            .await
            .map_err(|e| {
                tracing::warn!(
                    role_arn = %self.request.role_arn,
                    principal_key = %mask_key(principal.access_key_id()),
                    error = %e,
                    "AssumeRole failed"
                );
                DomainError::from_remote(&e)
            })
    }
}

#[async_trait]
impl CredentialsRefresher for AssumeRoleRefresher {
    async fn refresh(&self) -> Result<IssuedCredentials, DomainError> {
        self.assume().await
    }
}

/// Temporary credentials obtained by assuming an IAM role with the keys of a
/// linked static connection
#[derive(Debug, Clone)]
pub struct AssumedRoleBuilder {
    sts: Arc<dyn SecurityTokenService>,
    connections: Arc<dyn ConnectionRepository>,
    external_ids: ExternalIdGenerator,
    settings: StsSettings,
}

impl AssumedRoleBuilder {
    pub fn new(
        sts: Arc<dyn SecurityTokenService>,
        connections: Arc<dyn ConnectionRepository>,
        external_ids: ExternalIdGenerator,
        settings: StsSettings,
    ) -> Self {
        Self {
            sts,
            connections,
            external_ids,
            settings,
        }
    }

    /// `(project id, principal connection id)` of the connection being resolved
    fn principal_location(
        properties: &ConnectionProperties,
    ) -> Result<(String, String), DomainError> {
        let principal_id = properties
            .non_blank(keys::PRINCIPAL_CONNECTION_ID)
            .unwrap_or_default();
        let project_id = properties.non_blank(keys::PROJECT_ID).ok_or_else(|| {
            DomainError::invalid_field(
                keys::PROJECT_ID,
                "The project owning the connection is unknown",
            )
        })?;

        if properties.non_blank(keys::CONNECTION_ID) == Some(principal_id) {
            return Err(DomainError::invalid_field(
                keys::PRINCIPAL_CONNECTION_ID,
                "A connection cannot assume a role with its own credentials",
            ));
        }

        Ok((project_id.to_string(), principal_id.to_string()))
    }

    async fn external_id(
        &self,
        properties: &ConnectionProperties,
    ) -> Result<Option<String>, DomainError> {
        match (
            properties.non_blank(keys::CONNECTION_ID),
            properties.non_blank(keys::PROJECT_ID),
        ) {
            (Some(connection_id), Some(project_id)) => self
                .external_ids
                .external_id(connection_id, project_id)
                .await
                .map(Some),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl CredentialsBuilder for AssumedRoleBuilder {
    fn credentials_type(&self) -> &'static str {
        credentials_types::ASSUMED_ROLE
    }

    fn validate_properties(&self, properties: &ConnectionProperties) -> Vec<InvalidProperty> {
        let mut invalid = Vec::new();

        if properties.non_blank(keys::PRINCIPAL_CONNECTION_ID).is_none() {
            invalid.push(InvalidProperty::new(
                keys::PRINCIPAL_CONNECTION_ID,
                "Please choose the AWS connection whose keys assume the role",
            ));
        }

        if let Err(reason) = RoleArn::parse(properties.get(keys::ROLE_ARN).unwrap_or_default()) {
            invalid.push(InvalidProperty::new(keys::ROLE_ARN, reason));
        }

        if let Some(name) = properties.non_blank(keys::ROLE_SESSION_NAME) {
            if !is_valid_session_name(name) {
                invalid.push(InvalidProperty::new(
                    keys::ROLE_SESSION_NAME,
                    r"The Session Name is not valid, must satisfy regular expression pattern: [\w+=,.@-]{2,64}",
                ));
            }
        }

        if let Err(bad) =
            parse_duration(properties, MIN_ROLE_SESSION_DURATION, MAX_ROLE_SESSION_DURATION)
        {
            invalid.push(bad);
        }

        invalid.extend(self.settings.validate(properties));
        invalid
    }

    async fn construct_credentials_holder(
        &self,
        properties: &ConnectionProperties,
    ) -> Result<CredentialsHolder, DomainError> {
        ensure_valid(self.validate_properties(properties))?;

        let (project_id, principal_id) = Self::principal_location(properties)?;

        let request = AssumeRoleRequest {
            role_arn: properties
                .non_blank(keys::ROLE_ARN)
                .unwrap_or_default()
                .trim()
                .to_string(),
            session_name: properties
                .non_blank(keys::ROLE_SESSION_NAME)
                .unwrap_or(DEFAULT_ROLE_SESSION_NAME)
                .to_string(),
            external_id: self.external_id(properties).await?,
            duration_seconds: parse_duration(
                properties,
                MIN_ROLE_SESSION_DURATION,
                MAX_ROLE_SESSION_DURATION,
            )
            .map_err(|p| DomainError::invalid_field(p.property_name(), p.message()))?,
        };

        let refresher = AssumeRoleRefresher {
            sts: self.sts.clone(),
            connections: self.connections.clone(),
            project_id,
            principal_id,
            target: self.settings.target(properties),
            request,
        };

        let issued = refresher.assume().await?;
        tracing::info!(
            role_arn = %refresher.request.role_arn,
            session_name = %refresher.request.session_name,
            expiration = ?issued.expiration,
            "Assumed IAM role"
        );

        Ok(CredentialsHolder::refreshable(issued, Arc::new(refresher)))
    }

    fn describe(&self, properties: &ConnectionProperties) -> String {
        let raw = properties.get(keys::ROLE_ARN).unwrap_or_default();
        let role = RoleArn::parse(raw)
            .map(|arn| arn.role_name)
            .unwrap_or_else(|_| raw.to_string());
        format!("Assume {role} role to gain temporary credentials with specified privileges")
    }

    fn default_properties(&self) -> ConnectionProperties {
        ConnectionProperties::new().with(keys::ROLE_SESSION_NAME, DEFAULT_ROLE_SESSION_NAME)
    }
}
