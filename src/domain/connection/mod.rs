//! Connections, their owning projects, and the stores that hold them

mod entity;
mod repository;

pub use entity::{validate_connection_id, Connection, Project};
pub use repository::{ConnectionRepository, ProjectRepository};

#[cfg(test)]
pub use repository::{MockConnectionRepository, MockProjectRepository};
