use async_trait::async_trait;
use std::fmt::Debug;

use super::{ConnectionProperties, CredentialsHolder, InvalidProperty};
use crate::domain::DomainError;

/// One credential-construction strategy (static keys, session, assumed role, ...)
#[async_trait]
pub trait CredentialsBuilder: Send + Sync + Debug {
    /// Stable tag used as the registry key
    fn credentials_type(&self) -> &'static str;

    /// Check the properties this strategy needs; empty means valid
    fn validate_properties(&self, properties: &ConnectionProperties) -> Vec<InvalidProperty>;

    /// Build a holder; may call the remote token service to pre-resolve credentials
    async fn construct_credentials_holder(
        &self,
        properties: &ConnectionProperties,
    ) -> Result<CredentialsHolder, DomainError>;

    /// One-line summary for audit logs and UI; never contains secret material
    fn describe(&self, properties: &ConnectionProperties) -> String;

    /// Properties this strategy pre-fills for a new connection
    fn default_properties(&self) -> ConnectionProperties {
        ConnectionProperties::new()
    }
}

/// Fail with the last reported problem, if any
pub fn ensure_valid(invalid: Vec<InvalidProperty>) -> Result<(), DomainError> {
    match invalid.into_iter().last() {
        Some(last) => Err(DomainError::invalid_field(
            last.property_name(),
            last.message(),
        )),
        None => Ok(()),
    }
}
