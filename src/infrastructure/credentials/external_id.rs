use std::sync::Arc;

use crate::domain::{DomainError, ProjectRepository};

/// Derives the cross-account trust id for a connection.
///
/// The value is recomputed on every call so both sides of the trust
/// relationship can reproduce it from `(project, connection)` alone.
#[derive(Debug, Clone)]
pub struct ExternalIdGenerator {
    projects: Arc<dyn ProjectRepository>,
}

impl ExternalIdGenerator {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }

    pub async fn external_id(
        &self,
        connection_id: &str,
        project_id: &str,
    ) -> Result<String, DomainError> {
        let project = self
            .projects
            .find_project(project_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(project_id = %project_id, "Failed to get external id, project not found");
                DomainError::project_not_found(project_id)
            })?;

        Ok(format!("{}-{}", project.external_id(), connection_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connection::MockProjectRepository;
    use crate::domain::Project;

    #[tokio::test]
    async fn test_external_id_is_deterministic() {
        let mut projects = MockProjectRepository::new();
        projects
            .expect_find_project()
            .returning(|id| Ok(Some(Project::new(id, id))));

        let generator = ExternalIdGenerator::new(Arc::new(projects));

        for _ in 0..3 {
            assert_eq!(
                generator.external_id("conn1", "proj1").await.unwrap(),
                "proj1-conn1"
            );
        }
    }

    #[tokio::test]
    async fn test_external_id_uses_project_external_id() {
        let mut projects = MockProjectRepository::new();
        projects
            .expect_find_project()
            .returning(|_| Ok(Some(Project::new("project_internal_42", "Backend"))));

        let generator = ExternalIdGenerator::new(Arc::new(projects));
        assert_eq!(
            generator.external_id("awsMain", "project_internal_42").await.unwrap(),
            "Backend-awsMain"
        );
    }

    #[tokio::test]
    async fn test_missing_project() {
        let mut projects = MockProjectRepository::new();
        projects.expect_find_project().returning(|_| Ok(None));

        let generator = ExternalIdGenerator::new(Arc::new(projects));
        let err = generator.external_id("conn1", "gone").await.unwrap_err();

        assert!(matches!(err, DomainError::ProjectNotFound { ref project_id } if project_id == "gone"));
        assert_eq!(err.to_string(), "Project with ID: gone was not found");
    }
}
