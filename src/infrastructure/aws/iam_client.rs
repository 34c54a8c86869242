use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_iam::config::Credentials;
use aws_sdk_iam::Client;

use super::error::{missing_field, remote_error};
use super::PROVIDER_NAME;
use crate::domain::credentials::CredentialData;
use crate::domain::remote::NewAccessKey;
use crate::domain::{IdentityManagementService, RemoteError};

const SERVICE: &str = "AmazonIdentityManagement";

/// IAM over the AWS SDK, signed with exactly the keys passed to each call
#[derive(Debug, Clone, Default)]
pub struct AwsIdentityManagementService {
    endpoint: Option<String>,
}

impl AwsIdentityManagementService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn client(&self, credentials: &CredentialData, region: &str) -> Client {
        let mut builder = aws_sdk_iam::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                credentials.access_key_id(),
                credentials.secret_access_key(),
                credentials.session_token().map(str::to_string),
                None,
                PROVIDER_NAME,
            ));
        builder.set_endpoint_url(self.endpoint.clone());

        Client::from_conf(builder.build())
    }
}

#[async_trait]
impl IdentityManagementService for AwsIdentityManagementService {
    async fn get_user_name(
        &self,
        credentials: &CredentialData,
        region: &str,
    ) -> Result<String, RemoteError> {
        let output = self
            .client(credentials, region)
            .get_user()
            .send()
            .await
            .map_err(|e| remote_error(SERVICE, &e))?;

        output
            .user()
            .map(|user| user.user_name().to_string())
            .ok_or_else(|| missing_field(SERVICE, "the user"))
    }

    async fn create_access_key(
        &self,
        credentials: &CredentialData,
        region: &str,
        user_name: &str,
    ) -> Result<NewAccessKey, RemoteError> {
        let output = self
            .client(credentials, region)
            .create_access_key()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| remote_error(SERVICE, &e))?;

        let key = output
            .access_key()
            .ok_or_else(|| missing_field(SERVICE, "the access key"))?;

        Ok(NewAccessKey {
            user_name: key.user_name().to_string(),
            credentials: CredentialData::new(key.access_key_id(), key.secret_access_key(), None)
                .map_err(|e| RemoteError::raw(e.to_string()))?,
        })
    }

    async fn delete_access_key(
        &self,
        credentials: &CredentialData,
        region: &str,
        user_name: Option<String>,
        access_key_id: &str,
    ) -> Result<(), RemoteError> {
        self.client(credentials, region)
            .delete_access_key()
            .set_user_name(user_name)
            .access_key_id(access_key_id)
            .send()
            .await
            .map_err(|e| remote_error(SERVICE, &e))?;

        Ok(())
    }
}
