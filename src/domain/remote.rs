//! Remote identity, security-token and identity-management services

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::credentials::{CredentialData, IssuedCredentials};

#[cfg(test)]
use mockall::automock;

/// Failure of a remote call, with the provider's structured metadata when available
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{raw}")]
pub struct RemoteError {
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub raw: String,
}

impl RemoteError {
    pub fn new(
        error_type: Option<String>,
        error_message: Option<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            error_message,
            raw: raw.into(),
        }
    }

    /// Error without provider metadata
    pub fn raw(raw: impl Into<String>) -> Self {
        Self::new(None, None, raw)
    }

    /// Provider error rendered as `"<message> (Service: <svc>; Error Code: <code>)"`
    pub fn service(service: &str, code: &str, message: Option<&str>) -> Self {
        let text = message.unwrap_or("Unknown error");
        Self::new(
            Some(code.to_string()),
            message.map(str::to_string),
            format!("{text} (Service: {service}; Error Code: {code})"),
        )
    }

    /// Human-readable part: everything before the first `(`
    pub fn description(&self) -> String {
        describe_remote_message(&self.raw)
    }

    /// `Error type: <CODE>, message: <msg>` when metadata is present, the raw text otherwise
    pub fn summary(&self) -> String {
        match &self.error_type {
            Some(code) => format!(
                "Error type: <{}>, message: {}",
                code,
                self.error_message.as_deref().unwrap_or("")
            ),
            None => self.raw.clone(),
        }
    }
}

/// Strip the SDK's diagnostic suffix starting at the first `(`; no-op without one
pub fn describe_remote_message(raw: &str) -> String {
    match raw.split_once('(') {
        Some((head, _)) => head.trim_end().to_string(),
        None => raw.to_string(),
    }
}

/// Where to send token-service calls
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StsTarget {
    pub region: String,
    pub endpoint: Option<String>,
}

impl StsTarget {
    pub fn new(region: impl Into<String>, endpoint: Option<String>) -> Self {
        Self {
            region: region.into(),
            endpoint,
        }
    }
}

/// Principal echoed back by the identity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub account_id: String,
    pub arn: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub session_name: String,
    pub external_id: Option<String>,
    pub duration_seconds: Option<i32>,
}

/// Long-lived key pair returned by CreateAccessKey
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessKey {
    pub user_name: String,
    pub credentials: CredentialData,
}

/// Security token service. Every call is signed with exactly `credentials`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecurityTokenService: Send + Sync + std::fmt::Debug {
    async fn get_caller_identity(
        &self,
        credentials: &CredentialData,
        target: &StsTarget,
    ) -> Result<CallerIdentity, RemoteError>;

    async fn get_session_token(
        &self,
        credentials: &CredentialData,
        target: &StsTarget,
        duration_seconds: i32,
    ) -> Result<IssuedCredentials, RemoteError>;

    async fn assume_role(
        &self,
        credentials: &CredentialData,
        target: &StsTarget,
        request: &AssumeRoleRequest,
    ) -> Result<IssuedCredentials, RemoteError>;
}

/// Identity management service used for key rotation
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityManagementService: Send + Sync + std::fmt::Debug {
    /// Name of the IAM user owning `credentials`
    async fn get_user_name(
        &self,
        credentials: &CredentialData,
        region: &str,
    ) -> Result<String, RemoteError>;

    async fn create_access_key(
        &self,
        credentials: &CredentialData,
        region: &str,
        user_name: &str,
    ) -> Result<NewAccessKey, RemoteError>;

    async fn delete_access_key(
        &self,
        credentials: &CredentialData,
        region: &str,
        user_name: Option<String>,
        access_key_id: &str,
    ) -> Result<(), RemoteError>;
}
