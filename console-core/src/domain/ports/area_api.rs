//! Port for reading and writing areas through the REST collaborator.

use async_trait::async_trait;

use crate::domain::{Area, AreaId, NewArea, ObraId, UserId};

use super::ApiError;

/// Area endpoints of the REST API.
///
/// Adapters own transport concerns only; validation and cache invalidation
/// stay in the domain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AreaApi: Send + Sync {
    /// `GET /areas?obra={id}`.
    async fn list_areas(&self, id_obra: ObraId) -> Result<Vec<Area>, ApiError>;

    /// `POST /areas`, returning the created area with its assigned id.
    async fn create_area(&self, draft: &NewArea) -> Result<Area, ApiError>;

    /// `PUT /areas/{id}`, returning the stored area.
    async fn update_area(&self, area: &Area) -> Result<Area, ApiError>;

    /// `DELETE /areas/{id}`.
    async fn delete_area(&self, id_area: AreaId) -> Result<(), ApiError>;

    /// `PUT /areas/{id}/supervisor`, returning the updated area.
    async fn assign_supervisor(
        &self,
        id_area: AreaId,
        id_usuario: Option<UserId>,
    ) -> Result<Area, ApiError>;
}

/// Fixture API for wiring that never touches areas.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAreaApi;

#[async_trait]
impl AreaApi for FixtureAreaApi {
    async fn list_areas(&self, _id_obra: ObraId) -> Result<Vec<Area>, ApiError> {
        Ok(Vec::new())
    }

    async fn create_area(&self, _draft: &NewArea) -> Result<Area, ApiError> {
        Err(ApiError::rejected(
            501_u16,
            "fixture area api does not create areas",
        ))
    }

    async fn update_area(&self, area: &Area) -> Result<Area, ApiError> {
        Err(ApiError::not_found(format!("area {}", area.id_area)))
    }

    async fn delete_area(&self, id_area: AreaId) -> Result<(), ApiError> {
        Err(ApiError::not_found(format!("area {id_area}")))
    }

    async fn assign_supervisor(
        &self,
        id_area: AreaId,
        _id_usuario: Option<UserId>,
    ) -> Result<Area, ApiError> {
        Err(ApiError::not_found(format!("area {id_area}")))
    }
}
