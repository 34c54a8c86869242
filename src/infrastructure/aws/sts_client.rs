use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::config::Credentials;
use aws_sdk_sts::Client;
use aws_smithy_types::retry::RetryConfig;

use super::error::{missing_field, remote_error};
use super::{to_chrono, PROVIDER_NAME};
use crate::domain::credentials::{CredentialData, IssuedCredentials};
use crate::domain::remote::AssumeRoleRequest;
use crate::domain::{CallerIdentity, RemoteError, SecurityTokenService, StsTarget};

const SERVICE: &str = "AWSSecurityTokenService";

/// STS over the AWS SDK. A client is built per call so that only the
/// supplied keys are ever used to sign, never the ambient credential chain.
#[derive(Debug, Clone, Default)]
pub struct AwsSecurityTokenService {
    retry: Option<RetryConfig>,
}

impl AwsSecurityTokenService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    fn client(&self, credentials: &CredentialData, target: &StsTarget) -> Client {
        let mut builder = aws_sdk_sts::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(target.region.clone()))
            .credentials_provider(Credentials::new(
                credentials.access_key_id(),
                credentials.secret_access_key(),
                credentials.session_token().map(str::to_string),
                None,
                PROVIDER_NAME,
            ))
            .retry_config(self.retry.clone().unwrap_or_else(RetryConfig::standard));
        builder.set_endpoint_url(target.endpoint.clone());

        Client::from_conf(builder.build())
    }

    fn issued(
        credentials: Option<&aws_sdk_sts::types::Credentials>,
    ) -> Result<IssuedCredentials, RemoteError> {
        let credentials = credentials.ok_or_else(|| missing_field(SERVICE, "credentials"))?;

        let data = CredentialData::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            Some(credentials.session_token().to_string()),
        )
        .map_err(|e| RemoteError::raw(e.to_string()))?;

        Ok(IssuedCredentials::new(data, to_chrono(credentials.expiration())))
    }
}

#[async_trait]
impl SecurityTokenService for AwsSecurityTokenService {
    async fn get_caller_identity(
        &self,
        credentials: &CredentialData,
        target: &StsTarget,
    ) -> Result<CallerIdentity, RemoteError> {
        let output = self
            .client(credentials, target)
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| remote_error(SERVICE, &e))?;

        Ok(CallerIdentity {
            account_id: output.account().unwrap_or_default().to_string(),
            arn: output.arn().unwrap_or_default().to_string(),
            user_id: output.user_id().unwrap_or_default().to_string(),
        })
    }

    async fn get_session_token(
        &self,
        credentials: &CredentialData,
        target: &StsTarget,
        duration_seconds: i32,
    ) -> Result<IssuedCredentials, RemoteError> {
        let output = self
            .client(credentials, target)
            .get_session_token()
            .duration_seconds(duration_seconds)
            .send()
            .await
            .map_err(|e| remote_error(SERVICE, &e))?;

        Self::issued(output.credentials())
    }

    async fn assume_role(
        &self,
        credentials: &CredentialData,
        target: &StsTarget,
        request: &AssumeRoleRequest,
    ) -> Result<IssuedCredentials, RemoteError> {
        let output = self
            .client(credentials, target)
            .assume_role()
            .role_arn(&request.role_arn)
            .role_session_name(&request.session_name)
            .set_external_id(request.external_id.clone())
            .set_duration_seconds(request.duration_seconds)
            .send()
            .await
            .map_err(|e| remote_error(SERVICE, &e))?;

        Self::issued(output.credentials())
    }
}
