//! In-memory stand-in for the REST collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::ports::{ApiError, AreaApi, CameraSource, ReportSource, UserDirectory};
use crate::domain::{Area, AreaId, Camera, NewArea, ObraId, Report, User, UserId};

/// Operations the in-memory API counts and can fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// `GET /areas`.
    ListAreas,
    /// `POST /areas`.
    CreateArea,
    /// `PUT /areas/{id}`.
    UpdateArea,
    /// `DELETE /areas/{id}`.
    DeleteArea,
    /// `PUT /areas/{id}/supervisor`.
    AssignSupervisor,
    /// `GET /camaras`.
    ListCameras,
    /// `GET /reportes`.
    ListReports,
    /// `GET /usuarios`.
    ListUsers,
}

#[derive(Debug, Default)]
struct ApiState {
    areas: Vec<Area>,
    cameras: HashMap<ObraId, Vec<Camera>>,
    reports: HashMap<ObraId, Vec<Report>>,
    users: Vec<User>,
    next_id: i64,
    calls: HashMap<ApiOperation, usize>,
    failures: HashMap<ApiOperation, ApiError>,
    mutation_gate: Option<Arc<Notify>>,
}

/// Backend double implementing every collaborator port over shared vectors.
#[derive(Debug, Default)]
pub struct InMemoryApi {
    state: Mutex<ApiState>,
}

impl InMemoryApi {
    /// API seeded with `areas`; new ids continue after the largest one.
    pub fn with_areas(areas: Vec<Area>) -> Self {
        let next_id = areas
            .iter()
            .map(|area| area.id_area.get())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            state: Mutex::new(ApiState {
                areas,
                next_id,
                ..ApiState::default()
            }),
        }
    }

    /// Set the cameras returned for `id_obra`.
    pub fn set_cameras(&self, id_obra: ObraId, cameras: Vec<Camera>) {
        self.lock().cameras.insert(id_obra, cameras);
    }

    /// Set the reports returned for `id_obra`.
    pub fn set_reports(&self, id_obra: ObraId, reports: Vec<Report>) {
        self.lock().reports.insert(id_obra, reports);
    }

    /// Set the user directory.
    pub fn set_users(&self, users: Vec<User>) {
        self.lock().users = users;
    }

    /// Replace the stored areas without going through the API.
    pub fn set_areas(&self, areas: Vec<Area>) {
        self.lock().areas = areas;
    }

    /// Fail the next call to `operation` with `error`.
    pub fn fail_next(&self, operation: ApiOperation, error: ApiError) {
        self.lock().failures.insert(operation, error);
    }

    /// Number of calls made to `operation`.
    pub fn calls(&self, operation: ApiOperation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Hold every later mutation until the returned handle is notified.
    ///
    /// Each `notify_one` releases one pending mutation.
    pub fn hold_mutations(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().mutation_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Areas currently stored, across every work site.
    pub fn areas(&self) -> Vec<Area> {
        self.lock().areas.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ApiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, operation: ApiOperation) -> Result<(), ApiError> {
        let mut state = self.lock();
        *state.calls.entry(operation).or_insert(0) += 1;
        state.failures.remove(&operation).map_or(Ok(()), Err)
    }

    async fn mutation(&self, operation: ApiOperation) -> Result<(), ApiError> {
        self.record(operation)?;
        let gate = self.lock().mutation_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(())
    }
}

#[async_trait]
impl AreaApi for InMemoryApi {
    async fn list_areas(&self, id_obra: ObraId) -> Result<Vec<Area>, ApiError> {
        self.record(ApiOperation::ListAreas)?;
        Ok(self
            .lock()
            .areas
            .iter()
            .filter(|area| area.id_obra == id_obra)
            .cloned()
            .collect())
    }

    async fn create_area(&self, draft: &NewArea) -> Result<Area, ApiError> {
        self.mutation(ApiOperation::CreateArea).await?;
        let mut state = self.lock();
        let area = Area {
            id_area: AreaId::new(state.next_id),
            nombre: draft.nombre.clone(),
            descripcion: draft.descripcion.clone(),
            id_obra: draft.id_obra,
            id_usuario: draft.id_usuario,
        };
        state.next_id += 1;
        state.areas.push(area.clone());
        Ok(area)
    }

    async fn update_area(&self, area: &Area) -> Result<Area, ApiError> {
        self.mutation(ApiOperation::UpdateArea).await?;
        let mut state = self.lock();
        let stored = state
            .areas
            .iter_mut()
            .find(|stored| stored.id_area == area.id_area)
            .ok_or_else(|| ApiError::not_found(format!("area {}", area.id_area)))?;
        *stored = area.clone();
        Ok(area.clone())
    }

    async fn delete_area(&self, id_area: AreaId) -> Result<(), ApiError> {
        self.mutation(ApiOperation::DeleteArea).await?;
        let mut state = self.lock();
        let before = state.areas.len();
        state.areas.retain(|area| area.id_area != id_area);
        if state.areas.len() == before {
            return Err(ApiError::not_found(format!("area {id_area}")));
        }
        Ok(())
    }

    async fn assign_supervisor(
        &self,
        id_area: AreaId,
        id_usuario: Option<UserId>,
    ) -> Result<Area, ApiError> {
        self.mutation(ApiOperation::AssignSupervisor).await?;
        let mut state = self.lock();
        let stored = state
            .areas
            .iter_mut()
            .find(|stored| stored.id_area == id_area)
            .ok_or_else(|| ApiError::not_found(format!("area {id_area}")))?;
        stored.id_usuario = id_usuario;
        Ok(stored.clone())
    }
}

#[async_trait]
impl CameraSource for InMemoryApi {
    async fn list_cameras(&self, id_obra: ObraId) -> Result<Vec<Camera>, ApiError> {
        self.record(ApiOperation::ListCameras)?;
        Ok(self.lock().cameras.get(&id_obra).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ReportSource for InMemoryApi {
    async fn list_reports(&self, id_obra: ObraId) -> Result<Vec<Report>, ApiError> {
        self.record(ApiOperation::ListReports)?;
        Ok(self.lock().reports.get(&id_obra).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl UserDirectory for InMemoryApi {
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.record(ApiOperation::ListUsers)?;
        Ok(self.lock().users.clone())
    }
}
