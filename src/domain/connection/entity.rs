use serde::{Deserialize, Serialize};

use crate::domain::credentials::{keys, ConnectionProperties};

const MAX_CONNECTION_ID_LENGTH: usize = 80;

/// Check a user-defined connection id; returns the reason it is invalid
pub fn validate_connection_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("Connection ID cannot be empty".to_string());
    }

    if id.chars().count() > MAX_CONNECTION_ID_LENGTH {
        return Err(format!(
            "Connection ID cannot exceed {MAX_CONNECTION_ID_LENGTH} characters"
        ));
    }

    if !id.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err("Connection ID must start with a latin letter".to_string());
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(
            "Connection ID can only contain alphanumeric characters, hyphens, and underscores"
                .to_string(),
        );
    }

    Ok(())
}

/// A project owning connections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: String,
    external_id: String,
}

impl Project {
    pub fn new(id: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external_id: external_id.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stable public identifier; the first half of every external id
    pub fn external_id(&self) -> &str {
        &self.external_id
    }
}

/// A stored AWS connection: the owning project plus its property bag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    id: String,
    project_id: String,
    properties: ConnectionProperties,
}

impl Connection {
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        properties: ConnectionProperties,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            properties,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn properties(&self) -> &ConnectionProperties {
        &self.properties
    }

    pub fn credentials_type(&self) -> Option<&str> {
        self.properties.credentials_type()
    }

    /// Properties with this connection's identity injected, ready for resolution
    pub fn resolution_properties(&self) -> ConnectionProperties {
        self.properties
            .rewritten(keys::CONNECTION_ID, self.id.clone())
            .with(keys::PROJECT_ID, self.project_id.clone())
    }

    pub fn with_properties(mut self, properties: ConnectionProperties) -> Self {
        self.properties = properties;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_valid() {
        assert!(validate_connection_id("awsConnection_1").is_ok());
        assert!(validate_connection_id("PROJECT_EXT_ID-aws").is_ok());
    }

    #[test]
    fn test_connection_id_invalid() {
        assert!(validate_connection_id("").is_err());
        assert!(validate_connection_id(&"a".repeat(81)).is_err());
        assert!(validate_connection_id("1starts-with-digit").is_err());
        assert!(validate_connection_id("has spaces").is_err());
        assert!(validate_connection_id("has.dots").is_err());
    }

    #[test]
    fn test_resolution_properties_inject_identity() {
        let props = ConnectionProperties::new().with(keys::CREDENTIALS_TYPE, "assumedRole");
        let connection = Connection::new("conn1", "proj1", props);

        let resolved = connection.resolution_properties();

        assert_eq!(resolved.get(keys::CONNECTION_ID), Some("conn1"));
        assert_eq!(resolved.get(keys::PROJECT_ID), Some("proj1"));
        assert!(!connection.properties().contains(keys::CONNECTION_ID));
    }
}
