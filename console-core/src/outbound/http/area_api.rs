//! Area endpoints.

use async_trait::async_trait;
use reqwest::Method;

use super::HttpConsoleApi;
use crate::domain::ports::{ApiError, AreaApi};
use crate::domain::{Area, AreaId, NewArea, ObraId, SupervisorAssignment, UserId};

const AREAS: &str = "areas";

#[async_trait]
impl AreaApi for HttpConsoleApi {
    async fn list_areas(&self, id_obra: ObraId) -> Result<Vec<Area>, ApiError> {
        let url = self.site_endpoint(&[AREAS], id_obra.get())?;
        self.get_json(url, "area list").await
    }

    async fn create_area(&self, draft: &NewArea) -> Result<Area, ApiError> {
        let url = self.endpoint(&[AREAS])?;
        self.send_json(Method::POST, url, draft, "created area").await
    }

    async fn update_area(&self, area: &Area) -> Result<Area, ApiError> {
        let id = area.id_area.to_string();
        let url = self.endpoint(&[AREAS, &id])?;
        self.send_json(Method::PUT, url, area, "updated area").await
    }

    async fn delete_area(&self, id_area: AreaId) -> Result<(), ApiError> {
        let id = id_area.to_string();
        let url = self.endpoint(&[AREAS, &id])?;
        self.send_empty(Method::DELETE, url).await
    }

    async fn assign_supervisor(
        &self,
        id_area: AreaId,
        id_usuario: Option<UserId>,
    ) -> Result<Area, ApiError> {
        let id = id_area.to_string();
        let url = self.endpoint(&[AREAS, &id, "supervisor"])?;
        let body = SupervisorAssignment { id_usuario };
        self.send_json(Method::PUT, url, &body, "updated area").await
    }
}
