//! Mutation coordinator for areas.
//!
//! Every write follows the same protocol: validate locally, confirm the area
//! is in the cached collection, claim the target so a second submission is
//! rejected while the first is pending, call the API, and on success refetch
//! the owning work site if it is still cached. Failures leave the store
//! untouched; the caller keeps its input and can redisplay it.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::ports::AreaApi;
use super::store::AreaStore;
use super::{Area, AreaId, MutationError, NavigationHandle, NewArea, ObraId, UserId};

/// Entity a mutation is pending for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationTarget {
    /// A create for the given work site.
    Create(ObraId),
    /// A write to an existing area.
    Area(AreaId),
}

impl fmt::Display for MutationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(id_obra) => write!(f, "new area in work site {id_obra}"),
            Self::Area(id_area) => write!(f, "area {id_area}"),
        }
    }
}

type Pending = Arc<Mutex<HashSet<MutationTarget>>>;

fn lock(pending: &Pending) -> MutexGuard<'_, HashSet<MutationTarget>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases a claimed target when the mutation finishes or is dropped.
struct Claim {
    pending: Pending,
    target: MutationTarget,
}

impl Drop for Claim {
    fn drop(&mut self) {
        lock(&self.pending).remove(&self.target);
    }
}

/// Wraps the area writes and keeps the Area store consistent with them.
#[derive(Clone)]
pub struct AreaMutations {
    api: Arc<dyn AreaApi>,
    areas: Arc<AreaStore>,
    navigation: NavigationHandle,
    pending: Pending,
}

impl fmt::Debug for AreaMutations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AreaMutations")
            .field("areas", &self.areas)
            .field("pending", &*lock(&self.pending))
            .finish_non_exhaustive()
    }
}

impl AreaMutations {
    /// Coordinator writing through `api` and refreshing `areas`.
    pub fn new(
        api: Arc<dyn AreaApi>,
        areas: Arc<AreaStore>,
        navigation: NavigationHandle,
    ) -> Self {
        Self {
            api,
            areas,
            navigation,
            pending: Arc::default(),
        }
    }

    /// Whether a mutation for `target` is outstanding.
    pub fn is_pending(&self, target: MutationTarget) -> bool {
        lock(&self.pending).contains(&target)
    }

    /// Create an area from `draft`.
    ///
    /// # Errors
    ///
    /// [`MutationError::Invalid`] for a blank name or invalid work site,
    /// [`MutationError::InFlight`] while another create for the same site is
    /// pending, or the API failure.
    pub async fn create(&self, draft: &NewArea) -> Result<Area, MutationError> {
        draft
            .validate()
            .map_err(|err| MutationError::invalid(err.to_string()))?;
        let _claim = self.claim(MutationTarget::Create(draft.id_obra))?;

        let created = self.api.create_area(draft).await.map_err(|err| {
            warn!(id_obra = %draft.id_obra, error = %err, "area create failed");
            MutationError::from(err)
        })?;
        info!(id_area = %created.id_area, id_obra = %created.id_obra, "area created");

        self.refresh(draft.id_obra).await;
        Ok(created)
    }

    /// Replace the editable fields of `area`.
    ///
    /// # Errors
    ///
    /// [`MutationError::Invalid`] for a blank name or a changed work site,
    /// [`MutationError::NotFound`] when the area is not cached,
    /// [`MutationError::InFlight`] while another write to the area is
    /// pending, or the API failure.
    pub async fn update(&self, area: &Area) -> Result<Area, MutationError> {
        area.validate()
            .map_err(|err| MutationError::invalid(err.to_string()))?;
        let cached = self.cached(area.id_area)?;
        if area.id_obra != cached.id_obra {
            return Err(MutationError::invalid(format!(
                "area {} belongs to work site {}, not {}",
                area.id_area, cached.id_obra, area.id_obra
            )));
        }
        let _claim = self.claim(MutationTarget::Area(area.id_area))?;

        let updated = self.api.update_area(area).await.map_err(|err| {
            warn!(id_area = %area.id_area, error = %err, "area update failed");
            MutationError::from(err)
        })?;
        info!(id_area = %updated.id_area, "area updated");

        self.refresh(cached.id_obra).await;
        Ok(updated)
    }

    /// Delete `id_area` and evict it from navigation.
    ///
    /// # Errors
    ///
    /// [`MutationError::NotFound`] when the area is not cached,
    /// [`MutationError::InFlight`] while another write to the area is
    /// pending, or the API failure.
    pub async fn delete(&self, id_area: AreaId) -> Result<(), MutationError> {
        let cached = self.cached(id_area)?;
        let _claim = self.claim(MutationTarget::Area(id_area))?;

        self.api.delete_area(id_area).await.map_err(|err| {
            warn!(%id_area, error = %err, "area delete failed");
            MutationError::from(err)
        })?;
        info!(%id_area, "area deleted");

        if self.navigation.evict(id_area) {
            debug!(%id_area, "deleted area evicted from navigation");
        }
        self.refresh(cached.id_obra).await;
        Ok(())
    }

    /// Assign or clear the supervisor of `id_area`.
    ///
    /// # Errors
    ///
    /// [`MutationError::NotFound`] when the area is not cached,
    /// [`MutationError::InFlight`] while another write to the area is
    /// pending, or the API failure.
    pub async fn assign_supervisor(
        &self,
        id_area: AreaId,
        id_usuario: Option<UserId>,
    ) -> Result<Area, MutationError> {
        let cached = self.cached(id_area)?;
        let _claim = self.claim(MutationTarget::Area(id_area))?;

        let updated = self
            .api
            .assign_supervisor(id_area, id_usuario)
            .await
            .map_err(|err| {
                warn!(%id_area, error = %err, "supervisor assignment failed");
                MutationError::from(err)
            })?;
        info!(%id_area, supervisor = ?id_usuario.map(UserId::get), "supervisor assigned");

        self.refresh(cached.id_obra).await;
        Ok(updated)
    }

    fn cached(&self, id_area: AreaId) -> Result<Area, MutationError> {
        self.areas
            .find_cached(|area| area.id_area == id_area)
            .map(|(_, area)| area)
            .ok_or_else(|| MutationError::not_found(id_area))
    }

    fn claim(&self, target: MutationTarget) -> Result<Claim, MutationError> {
        if !lock(&self.pending).insert(target) {
            debug!(%target, "mutation rejected; target busy");
            return Err(MutationError::in_flight(target.to_string()));
        }
        Ok(Claim {
            pending: Arc::clone(&self.pending),
            target,
        })
    }

    async fn refresh(&self, id_obra: ObraId) {
        match self.areas.refresh(&id_obra).await {
            None => debug!(%id_obra, "work site no longer cached; refetch skipped"),
            Some(Ok(_)) => {}
            Some(Err(error)) if error.is_reportable() => {
                warn!(%id_obra, %error, "area refetch after mutation failed");
            }
            Some(Err(error)) => debug!(%id_obra, %error, "area refetch abandoned"),
        }
    }
}

#[cfg(test)]
mod tests;
