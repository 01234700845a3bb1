//! Read-only collection endpoints: cameras, reports, and users.

use async_trait::async_trait;

use super::HttpConsoleApi;
use crate::domain::ports::{ApiError, CameraSource, ReportSource, UserDirectory};
use crate::domain::{Camera, ObraId, Report, User};

#[async_trait]
impl CameraSource for HttpConsoleApi {
    async fn list_cameras(&self, id_obra: ObraId) -> Result<Vec<Camera>, ApiError> {
        let url = self.site_endpoint(&["camaras"], id_obra.get())?;
        self.get_json(url, "camera list").await
    }
}

#[async_trait]
impl ReportSource for HttpConsoleApi {
    async fn list_reports(&self, id_obra: ObraId) -> Result<Vec<Report>, ApiError> {
        let url = self.site_endpoint(&["reportes"], id_obra.get())?;
        self.get_json(url, "report list").await
    }
}

#[async_trait]
impl UserDirectory for HttpConsoleApi {
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let url = self.endpoint(&["usuarios"])?;
        self.get_json(url, "user list").await
    }
}
