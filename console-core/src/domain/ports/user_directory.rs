//! Port for the user-directory collaborator.
//!
//! The directory is a flat list; supervisors are resolved from it by id
//! during aggregation.

use async_trait::async_trait;

use crate::domain::User;

use super::ApiError;

/// Supplies the users that can be assigned as supervisors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `GET /usuarios`.
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
}

/// Fixture directory with no users.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserDirectory;

#[async_trait]
impl UserDirectory for FixtureUserDirectory {
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(Vec::new())
    }
}
