//! AWS Connector
//!
//! Resolves AWS credentials for stored connections:
//! - Static keys, session tokens and assumed roles behind one factory
//! - Connection testing against the token service
//! - Rotation of long-lived static keys

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::{
    ConnectionRepository, DomainError, IdentityManagementService, ProjectRepository,
    SecurityTokenService,
};
use infrastructure::{
    AssumedRoleBuilder, AwsIdentityManagementService, AwsSecurityTokenService, ConnectionTester,
    CredentialsFactory, CredentialsHolderCache, ExternalIdGenerator, InMemoryConnectionRepository,
    InMemoryProjectRepository, KeyRotator, OldKeysCleaner, SessionCredentialsBuilder,
    StaticKeysBuilder,
};

/// Stores and remote services the connector runs against
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub projects: Arc<dyn ProjectRepository>,
    pub connections: Arc<dyn ConnectionRepository>,
    pub sts: Arc<dyn SecurityTokenService>,
    pub iam: Arc<dyn IdentityManagementService>,
}

impl Collaborators {
    /// Real AWS clients over empty in-memory stores
    pub fn aws_in_memory() -> Self {
        Self {
            projects: Arc::new(InMemoryProjectRepository::new()),
            connections: Arc::new(InMemoryConnectionRepository::new()),
            sts: Arc::new(AwsSecurityTokenService::new()),
            iam: Arc::new(AwsIdentityManagementService::new()),
        }
    }
}

/// Wired connector services
#[derive(Debug, Clone)]
pub struct ConnectorServices {
    pub factory: Arc<CredentialsFactory>,
    pub holders: Arc<CredentialsHolderCache>,
    pub tester: Arc<ConnectionTester>,
    pub cleaner: Arc<OldKeysCleaner>,
    pub rotator: Arc<KeyRotator>,
}

/// Register the built-in credentials types and wire the services around them
pub fn create_services(
    config: &AppConfig,
    collaborators: Collaborators,
) -> Result<ConnectorServices, DomainError> {
    let settings = config.sts.settings();
    let Collaborators {
        projects,
        connections,
        sts,
        iam,
    } = collaborators;

    let factory = CredentialsFactory::builder(settings.clone())
        .with_builder(Arc::new(StaticKeysBuilder::new(settings.clone())))?
        .with_builder(Arc::new(SessionCredentialsBuilder::new(
            sts.clone(),
            settings.clone(),
        )))?
        .with_builder(Arc::new(AssumedRoleBuilder::new(
            sts.clone(),
            connections.clone(),
            ExternalIdGenerator::new(projects.clone()),
            settings.clone(),
        )))?
        .build();
    let factory = Arc::new(factory);

    let holders = Arc::new(CredentialsHolderCache::new(
        factory.clone(),
        config.cache.ttl(),
        config.cache.capacity,
    ));

    let tester = Arc::new(ConnectionTester::new(factory.clone(), sts.clone()));

    let cleaner = Arc::new(OldKeysCleaner::new(
        connections.clone(),
        iam.clone(),
        settings.clone(),
        config.rotation.old_key_preserve_time(),
    ));

    let rotator = Arc::new(KeyRotator::new(
        projects,
        connections,
        sts,
        iam,
        cleaner.clone(),
        Some(holders.clone()),
        settings,
        config.rotation.timing(),
    ));

    tracing::info!(
        credentials_types = ?factory.supported_types(),
        "AWS connector services created"
    );

    Ok(ConnectorServices {
        factory,
        holders,
        tester,
        cleaner,
        rotator,
    })
}
