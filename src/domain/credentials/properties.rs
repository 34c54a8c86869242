//! Connection property bag and field-level diagnostics

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Recognised property keys
pub mod keys {
    pub const CREDENTIALS_TYPE: &str = "credentialsType";
    pub const REGION: &str = "region";
    pub const STS_ENDPOINT: &str = "stsEndpoint";
    pub const ACCESS_KEY_ID: &str = "accessKeyId";
    pub const SECRET_ACCESS_KEY: &str = "secretAccessKey";
    pub const SESSION_TOKEN: &str = "sessionToken";
    pub const SESSION_DURATION_SECONDS: &str = "sessionDurationSeconds";
    pub const ROLE_ARN: &str = "roleArn";
    pub const ROLE_SESSION_NAME: &str = "roleSessionName";
    pub const PRINCIPAL_CONNECTION_ID: &str = "principalConnectionId";
    pub const CONNECTION_ID: &str = "connectionId";
    pub const PROJECT_ID: &str = "projectId";
}

/// Registered credentials type tags
pub mod credentials_types {
    pub const STATIC: &str = "static";
    pub const SESSION: &str = "session";
    pub const ASSUMED_ROLE: &str = "assumedRole";
}

/// String-keyed property bag supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionProperties(HashMap<String, String>);

impl ConnectionProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.0.remove(key);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of `key`, or `None` when absent or blank
    pub fn non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn credentials_type(&self) -> Option<&str> {
        self.get(keys::CREDENTIALS_TYPE)
    }

    /// Copy of these properties with `key` replaced
    pub fn rewritten(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.clone().with(key, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Add every entry of `other` that is not already set
    pub fn merge_missing(&mut self, other: &ConnectionProperties) {
        for (k, v) in other.iter() {
            self.0.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}

impl From<HashMap<String, String>> for ConnectionProperties {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConnectionProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A validation failure tied to one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidProperty {
    property_name: String,
    message: String,
}

impl InvalidProperty {
    pub fn new(property_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            message: message.into(),
        }
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for InvalidProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.property_name, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewritten_leaves_original_untouched() {
        let props = ConnectionProperties::new().with(keys::SECRET_ACCESS_KEY, "secret");
        let copy = props.rewritten(keys::SECRET_ACCESS_KEY, "");

        assert_eq!(props.get(keys::SECRET_ACCESS_KEY), Some("secret"));
        assert_eq!(copy.get(keys::SECRET_ACCESS_KEY), Some(""));
    }

    #[test]
    fn test_non_blank() {
        let props = ConnectionProperties::new()
            .with(keys::REGION, "  ")
            .with(keys::ACCESS_KEY_ID, "AKIA");

        assert_eq!(props.non_blank(keys::REGION), None);
        assert_eq!(props.non_blank(keys::ACCESS_KEY_ID), Some("AKIA"));
        assert_eq!(props.non_blank(keys::ROLE_ARN), None);
    }

    #[test]
    fn test_merge_missing_keeps_existing_values() {
        let mut props = ConnectionProperties::new().with(keys::REGION, "eu-west-1");
        let defaults = ConnectionProperties::new()
            .with(keys::REGION, "us-east-1")
            .with(keys::ROLE_SESSION_NAME, "aws-connector-session");

        props.merge_missing(&defaults);

        assert_eq!(props.get(keys::REGION), Some("eu-west-1"));
        assert_eq!(props.get(keys::ROLE_SESSION_NAME), Some("aws-connector-session"));
    }

    #[test]
    fn test_deserialize_from_json_map() {
        let props: ConnectionProperties =
            serde_json::from_str(r#"{"credentialsType": "static", "region": "us-east-2"}"#)
                .unwrap();
        assert_eq!(props.credentials_type(), Some("static"));
        assert_eq!(props.len(), 2);
    }
}
