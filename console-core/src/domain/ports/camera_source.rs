//! Port for the camera collaborator's read-only collection.

use async_trait::async_trait;

use crate::domain::{Camera, ObraId};

use super::ApiError;

/// Supplies the cameras installed across one work site.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CameraSource: Send + Sync {
    /// `GET /camaras?obra={id}`.
    async fn list_cameras(&self, id_obra: ObraId) -> Result<Vec<Camera>, ApiError>;
}

/// Fixture source for sites without cameras.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCameraSource;

#[async_trait]
impl CameraSource for FixtureCameraSource {
    async fn list_cameras(&self, _id_obra: ObraId) -> Result<Vec<Camera>, ApiError> {
        Ok(Vec::new())
    }
}
