//! Connection-level services: testing, key rotation and storage

mod key_rotator;
mod old_keys;
mod repository;
mod tester;

pub use key_rotator::{KeyRotator, RotatedKeys, RotationTiming};
pub use old_keys::{OldKeysCleaner, PendingKeyDeletion, PurgeReport};
pub use repository::{InMemoryConnectionRepository, InMemoryProjectRepository};
pub use tester::{ConnectionTester, TestConnectionResult};
