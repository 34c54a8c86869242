//! In-memory project and connection stores

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::credentials::ConnectionProperties;
use crate::domain::{Connection, ConnectionRepository, DomainError, Project, ProjectRepository};

/// In-memory implementation of ProjectRepository
#[derive(Debug, Default)]
pub struct InMemoryProjectRepository {
    projects: Arc<RwLock<HashMap<String, Project>>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(projects: Vec<Project>) -> Self {
        let map = projects
            .into_iter()
            .map(|p| (p.id().to_string(), p))
            .collect();

        Self {
            projects: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn save(&self, project: Project) {
        let mut projects = self.projects.write().await;
        projects.insert(project.id().to_string(), project);
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn find_project(&self, project_id: &str) -> Result<Option<Project>, DomainError> {
        let projects = self.projects.read().await;
        Ok(projects.get(project_id).cloned())
    }
}

type ConnectionKey = (String, String);

/// In-memory implementation of ConnectionRepository, keyed by `(project, connection)`
#[derive(Debug, Default)]
pub struct InMemoryConnectionRepository {
    connections: Arc<RwLock<HashMap<ConnectionKey, Connection>>>,
}

impl InMemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connections(connections: Vec<Connection>) -> Self {
        let map = connections
            .into_iter()
            .map(|c| ((c.project_id().to_string(), c.id().to_string()), c))
            .collect();

        Self {
            connections: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn save(&self, connection: Connection) {
        let mut connections = self.connections.write().await;
        connections.insert(
            (
                connection.project_id().to_string(),
                connection.id().to_string(),
            ),
            connection,
        );
    }

    pub async fn delete(&self, project_id: &str, connection_id: &str) -> bool {
        let mut connections = self.connections.write().await;
        connections
            .remove(&(project_id.to_string(), connection_id.to_string()))
            .is_some()
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn find_connection(
        &self,
        project_id: &str,
        connection_id: &str,
    ) -> Result<Option<Connection>, DomainError> {
        let connections = self.connections.read().await;
        Ok(connections
            .get(&(project_id.to_string(), connection_id.to_string()))
            .cloned())
    }

    async fn update_properties(
        &self,
        project_id: &str,
        connection_id: &str,
        properties: ConnectionProperties,
    ) -> Result<Connection, DomainError> {
        let mut connections = self.connections.write().await;
        let key = (project_id.to_string(), connection_id.to_string());

        let existing = connections
            .remove(&key)
            .ok_or_else(|| DomainError::connection_not_found(project_id, connection_id))?;
        let updated = existing.with_properties(properties);
        connections.insert(key, updated.clone());

        Ok(updated)
    }
}
