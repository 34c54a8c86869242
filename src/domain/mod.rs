//! Domain layer - credential types, holders, connections and remote-service seams

pub mod connection;
pub mod credentials;
pub mod error;
pub mod remote;

pub use connection::{Connection, ConnectionRepository, Project, ProjectRepository};
pub use credentials::{
    ConnectionProperties, CredentialData, CredentialsBuilder, CredentialsHolder, InvalidProperty,
};
pub use error::DomainError;
pub use remote::{
    CallerIdentity, IdentityManagementService, RemoteError, SecurityTokenService, StsTarget,
};
