//! Loaders binding each store to its collaborator port.

use std::sync::Arc;

use async_trait::async_trait;

use super::{CollectionLoader, Unscoped};
use crate::domain::ports::{AreaApi, CameraSource, ReportSource, UserDirectory};
use crate::domain::{Area, Camera, FetchError, ObraId, Report, User};

/// Loads the areas of one work site.
#[derive(Clone)]
pub struct AreaLoader(Arc<dyn AreaApi>);

impl AreaLoader {
    /// Wrap the area port.
    pub fn new(api: Arc<dyn AreaApi>) -> Self {
        Self(api)
    }
}

#[async_trait]
impl CollectionLoader<Area, ObraId> for AreaLoader {
    async fn load(&self, scope: &ObraId) -> Result<Vec<Area>, FetchError> {
        self.0.list_areas(*scope).await.map_err(FetchError::from)
    }
}

/// Loads the cameras of one work site.
#[derive(Clone)]
pub struct CameraLoader(Arc<dyn CameraSource>);

impl CameraLoader {
    /// Wrap the camera port.
    pub fn new(source: Arc<dyn CameraSource>) -> Self {
        Self(source)
    }
}

#[async_trait]
impl CollectionLoader<Camera, ObraId> for CameraLoader {
    async fn load(&self, scope: &ObraId) -> Result<Vec<Camera>, FetchError> {
        self.0.list_cameras(*scope).await.map_err(FetchError::from)
    }
}

/// Loads the reports of one work site.
#[derive(Clone)]
pub struct ReportLoader(Arc<dyn ReportSource>);

impl ReportLoader {
    /// Wrap the report port.
    pub fn new(source: Arc<dyn ReportSource>) -> Self {
        Self(source)
    }
}

#[async_trait]
impl CollectionLoader<Report, ObraId> for ReportLoader {
    async fn load(&self, scope: &ObraId) -> Result<Vec<Report>, FetchError> {
        self.0.list_reports(*scope).await.map_err(FetchError::from)
    }
}

/// Loads the user directory.
#[derive(Clone)]
pub struct UserLoader(Arc<dyn UserDirectory>);

impl UserLoader {
    /// Wrap the directory port.
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self(directory)
    }
}

#[async_trait]
impl CollectionLoader<User, Unscoped> for UserLoader {
    async fn load(&self, _scope: &Unscoped) -> Result<Vec<User>, FetchError> {
        self.0.list_users().await.map_err(FetchError::from)
    }
}
