use async_trait::async_trait;

use super::{Connection, Project};
use crate::domain::credentials::ConnectionProperties;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Lookup of projects by id
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync + std::fmt::Debug {
    async fn find_project(&self, project_id: &str) -> Result<Option<Project>, DomainError>;
}

/// Persistence of connections, owned by the host
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConnectionRepository: Send + Sync + std::fmt::Debug {
    async fn find_connection(
        &self,
        project_id: &str,
        connection_id: &str,
    ) -> Result<Option<Connection>, DomainError>;

    /// Replace the stored properties of an existing connection
    async fn update_properties(
        &self,
        project_id: &str,
        connection_id: &str,
        properties: ConnectionProperties,
    ) -> Result<Connection, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_project_repository() {
        let mut mock = MockProjectRepository::new();
        mock.expect_find_project()
            .returning(|id| Ok(Some(Project::new(id, format!("{id}_ext")))));

        let project = mock.find_project("proj1").await.unwrap().unwrap();
        assert_eq!(project.external_id(), "proj1_ext");
    }
}
