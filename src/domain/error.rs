use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::credentials::{keys, InvalidProperty};
use crate::domain::remote::RemoteError;

/// Core domain errors
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Bad or missing input, optionally tied to one property
    #[error("{message}")]
    Configuration {
        field: Option<String>,
        message: String,
    },

    /// Two builders registered for the same credentials type
    #[error(
        "Attempted to register a credentials builder for type \"{credentials_type}\" when another one for this type is already registered"
    )]
    RegistrationConflict { credentials_type: String },

    /// A remote call needed to pre-resolve credentials failed
    #[error("{message}")]
    Resolution {
        message: String,
        error_type: Option<String>,
    },

    #[error("Connection '{connection_id}' was not found in project '{project_id}'")]
    ConnectionNotFound {
        project_id: String,
        connection_id: String,
    },

    #[error("Project with ID: {project_id} was not found")]
    ProjectNotFound { project_id: String },

    #[error("Key rotation failed: {message}")]
    KeyRotation { message: String },

    /// Identity check failed; `description` is the trimmed, user-facing part of `raw`
    #[error("{description}")]
    TestConnection { description: String, raw: String },

    #[error("Credentials expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },

    #[error("Credentials were invalidated and can no longer be used")]
    Invalidated,

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            field: None,
            message: message.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn registration_conflict(credentials_type: impl Into<String>) -> Self {
        Self::RegistrationConflict {
            credentials_type: credentials_type.into(),
        }
    }

    pub fn resolution(message: impl Into<String>, error_type: Option<String>) -> Self {
        Self::Resolution {
            message: message.into(),
            error_type,
        }
    }

    /// Wrap a failed remote call made while resolving credentials
    pub fn from_remote(err: &RemoteError) -> Self {
        Self::resolution(err.summary(), err.error_type.clone())
    }

    pub fn connection_not_found(
        project_id: impl Into<String>,
        connection_id: impl Into<String>,
    ) -> Self {
        Self::ConnectionNotFound {
            project_id: project_id.into(),
            connection_id: connection_id.into(),
        }
    }

    pub fn project_not_found(project_id: impl Into<String>) -> Self {
        Self::ProjectNotFound {
            project_id: project_id.into(),
        }
    }

    pub fn key_rotation(message: impl Into<String>) -> Self {
        Self::KeyRotation {
            message: message.into(),
        }
    }

    pub fn test_connection(description: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::TestConnection {
            description: description.into(),
            raw: raw.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// The offending property, when the error is tied to one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Configuration { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Map the error onto a field diagnostic; untied errors land on the credentials type
    pub fn into_invalid_property(self) -> InvalidProperty {
        let field = self
            .field()
            .filter(|f| !f.is_empty())
            .unwrap_or(keys::CREDENTIALS_TYPE)
            .to_string();
        InvalidProperty::new(field, self.to_string())
    }
}
