//! Infrastructure layer - builders, connection services and AWS clients

pub mod aws;
pub mod connection;
pub mod credentials;
pub mod logging;

pub use aws::{AwsIdentityManagementService, AwsSecurityTokenService};
pub use connection::{
    ConnectionTester, InMemoryConnectionRepository, InMemoryProjectRepository, KeyRotator,
    OldKeysCleaner, RotationTiming, TestConnectionResult,
};
pub use credentials::{
    AssumedRoleBuilder, CredentialsFactory, CredentialsHolderCache, ExternalIdGenerator,
    SessionCredentialsBuilder, StaticKeysBuilder, StsEndpointPolicy, StsSettings,
};
pub use logging::init_logging;
