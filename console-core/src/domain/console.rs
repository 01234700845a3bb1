//! Console facade: one work site, four stores, one navigator.
//!
//! The console owns the active work-site scope. Refetches are driven by
//! explicit invalidation signals that [`AreaConsole::sync`] drains in a single
//! step, and every [`AreaConsole::render`] reads the stores' current
//! snapshots, so late results for a previous scope never reach a frame.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mockable::Clock;
use serde::Serialize;
use tracing::{debug, info};

use super::ports::{AreaApi, CameraSource, ReportSource, UserDirectory};
use super::store::{AreaStore, CameraStore, ReportStore, UserStore};
use super::{
    Area, AreaId, AreaLoader, AreaMutations, AreaView, CameraLoader, EntityStore, FetchError,
    Mode, MutationError, NavigationHandle, NewArea, ObraId, ReportLoader, Unscoped, UserId,
    UserLoader, Viewer, VisibilityFilter, aggregate,
};

/// Collections the console keeps cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Areas of the active work site.
    Areas,
    /// Cameras of the active work site.
    Cameras,
    /// Reports of the active work site.
    Reports,
    /// The user directory.
    Users,
}

impl Collection {
    /// Every collection, in render order.
    pub const ALL: [Self; 4] = [Self::Areas, Self::Cameras, Self::Reports, Self::Users];
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Areas => "areas",
            Self::Cameras => "cameras",
            Self::Reports => "reports",
            Self::Users => "users",
        })
    }
}

/// Non-blocking notice that a collection failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    /// Collection whose last fetch failed.
    pub collection: Collection,
    /// Human-readable failure.
    pub message: String,
}

impl Banner {
    fn from_error(collection: Collection, error: &FetchError) -> Option<Self> {
        error.is_reportable().then(|| Self {
            collection,
            message: error.to_string(),
        })
    }
}

/// Everything a view needs to draw the console once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleFrame {
    /// Active work site.
    pub scope: Option<ObraId>,
    /// Navigation mode after reconciliation.
    pub mode: Mode,
    /// Areas visible to the viewer that match the search.
    pub rows: Vec<AreaView>,
    /// The selected area, if it is visible to the viewer.
    pub selected: Option<AreaView>,
    /// Whether any collection is loading.
    pub loading: bool,
    /// One banner per collection whose last fetch failed.
    pub banners: Vec<Banner>,
    /// Area that navigation dropped because it disappeared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evicted: Option<AreaId>,
}

/// Collaborator ports the console loads from and writes to.
#[derive(Clone)]
pub struct ConsolePorts {
    /// Area reads and writes.
    pub areas: Arc<dyn AreaApi>,
    /// Camera reads.
    pub cameras: Arc<dyn CameraSource>,
    /// Report reads.
    pub reports: Arc<dyn ReportSource>,
    /// User directory reads.
    pub users: Arc<dyn UserDirectory>,
}

impl ConsolePorts {
    /// Use one backend for every port.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: AreaApi + CameraSource + ReportSource + UserDirectory + 'static,
    {
        Self {
            areas: backend.clone(),
            cameras: backend.clone(),
            reports: backend.clone(),
            users: backend,
        }
    }
}

/// Facade wiring stores, navigation, and the mutation coordinator.
pub struct AreaConsole {
    areas: Arc<AreaStore>,
    cameras: Arc<CameraStore>,
    reports: Arc<ReportStore>,
    users: Arc<UserStore>,
    navigation: NavigationHandle,
    mutations: AreaMutations,
    scope: Mutex<Option<ObraId>>,
    signals: Mutex<HashSet<Collection>>,
}

impl fmt::Debug for AreaConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AreaConsole")
            .field("scope", &self.scope())
            .field("navigation", &self.navigation)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AreaConsole {
    /// Console with empty stores and no active work site.
    pub fn new(ports: ConsolePorts, clock: Arc<dyn Clock>) -> Self {
        let areas = Arc::new(EntityStore::new(
            "areas",
            Arc::new(AreaLoader::new(Arc::clone(&ports.areas))),
            Arc::clone(&clock),
        ));
        let cameras = Arc::new(EntityStore::new(
            "cameras",
            Arc::new(CameraLoader::new(ports.cameras)),
            Arc::clone(&clock),
        ));
        let reports = Arc::new(EntityStore::new(
            "reports",
            Arc::new(ReportLoader::new(ports.reports)),
            Arc::clone(&clock),
        ));
        let users = Arc::new(EntityStore::new(
            "users",
            Arc::new(UserLoader::new(ports.users)),
            clock,
        ));
        let navigation = NavigationHandle::new();
        let mutations = AreaMutations::new(ports.areas, Arc::clone(&areas), navigation.clone());
        Self {
            areas,
            cameras,
            reports,
            users,
            navigation,
            mutations,
            scope: Mutex::new(None),
            signals: Mutex::new(HashSet::new()),
        }
    }

    /// Active work site.
    pub fn scope(&self) -> Option<ObraId> {
        *lock(&self.scope)
    }

    /// Area store.
    pub fn areas(&self) -> &AreaStore {
        &self.areas
    }

    /// Shared navigator.
    pub const fn navigation(&self) -> &NavigationHandle {
        &self.navigation
    }

    /// Mutation coordinator bound to the area store.
    pub const fn mutations(&self) -> &AreaMutations {
        &self.mutations
    }

    /// Switch to `id_obra`.
    ///
    /// Other work sites are released from the scoped stores, so requests
    /// still outstanding for them are ignored when they land. Navigation
    /// returns to the list.
    pub fn open_site(&self, id_obra: ObraId) {
        let previous = lock(&self.scope).replace(id_obra);
        self.areas.retain(&id_obra);
        self.cameras.retain(&id_obra);
        self.reports.retain(&id_obra);
        self.navigation.with(|nav| nav.reset());
        info!(%id_obra, previous = ?previous.map(ObraId::get), "work site opened");
    }

    /// Record that `collection` must be refetched on the next [`Self::sync`].
    pub fn request_invalidation(&self, collection: Collection) {
        lock(&self.signals).insert(collection);
    }

    /// Drain pending invalidation signals and load every collection.
    ///
    /// Scoped collections are skipped while no work site is open. Returns a
    /// banner for each collection that failed in this round.
    pub async fn sync(&self) -> Vec<Banner> {
        let scope = self.scope();
        let signals: Vec<Collection> = lock(&self.signals).drain().collect();
        for collection in &signals {
            self.invalidate(*collection, scope);
        }
        if !signals.is_empty() {
            debug!(?signals, "invalidation signals consumed");
        }

        let (areas, cameras, reports, users) = tokio::join!(
            fetch_scoped(&self.areas, scope),
            fetch_scoped(&self.cameras, scope),
            fetch_scoped(&self.reports, scope),
            self.users.fetch_all(&Unscoped),
        );

        [
            (Collection::Areas, areas.err()),
            (Collection::Cameras, cameras.err()),
            (Collection::Reports, reports.err()),
            (Collection::Users, users.err()),
        ]
        .into_iter()
        .filter_map(|(collection, error)| {
            error.and_then(|err| Banner::from_error(collection, &err))
        })
        .collect()
    }

    /// Build a frame for `viewer` from the current snapshots.
    ///
    /// When the area collection is loaded, navigation is reconciled against
    /// the areas the viewer may see; a selection that vanished falls back to
    /// the list.
    pub fn render(&self, viewer: Viewer, search: &str) -> ConsoleFrame {
        let scope = self.scope();
        let area_snapshot = scope.and_then(|id| self.areas.snapshot(&id));
        let areas = area_snapshot.as_ref().map_or(&[][..], |s| s.items());
        let cameras = scope.and_then(|id| self.cameras.snapshot(&id));
        let reports = scope.and_then(|id| self.reports.snapshot(&id));
        let users = self.users.snapshot(&Unscoped);

        let views = aggregate(
            areas,
            cameras.as_ref().map_or(&[][..], |s| s.items()),
            reports.as_ref().map_or(&[][..], |s| s.items()),
            users.as_ref().map_or(&[][..], |s| s.items()),
        );
        let visibility = VisibilityFilter::for_viewer(viewer, search);

        let evicted = if area_snapshot.is_some() {
            let visible: HashSet<AreaId> = areas
                .iter()
                .filter(|area| visibility.can_see(area))
                .map(|area| area.id_area)
                .collect();
            self.navigation
                .with(|nav| nav.reconcile(|id| visible.contains(&id)))
                .map(|missing| missing.id_area)
        } else {
            None
        };

        let navigator = self.navigation.current();
        let selected = navigator.selected_area_id().and_then(|id| {
            views
                .iter()
                .find(|view| view.area.id_area == id && visibility.can_see(&view.area))
                .cloned()
        });

        ConsoleFrame {
            scope,
            mode: navigator.mode(),
            rows: visibility.apply(&views),
            selected,
            loading: self.loading(scope),
            banners: self.banners(scope),
            evicted,
        }
    }

    /// Create an area and close the create form.
    ///
    /// # Errors
    ///
    /// [`MutationError::Forbidden`] for supervisors,
    /// [`MutationError::Invalid`] when the draft targets a work site other
    /// than the open one, otherwise see [`AreaMutations::create`].
    pub async fn submit_create(
        &self,
        viewer: Viewer,
        draft: &NewArea,
    ) -> Result<Area, MutationError> {
        ensure_can_mutate(viewer)?;
        if self.scope() != Some(draft.id_obra) {
            return Err(MutationError::invalid(format!(
                "work site {} is not open",
                draft.id_obra
            )));
        }
        let created = self.mutations.create(draft).await?;
        self.after_submit();
        Ok(created)
    }

    /// Save an edited area and close the edit form.
    ///
    /// # Errors
    ///
    /// [`MutationError::Forbidden`] for supervisors,
    /// [`MutationError::NotFound`] when the area is not in the open work
    /// site, otherwise see [`AreaMutations::update`].
    pub async fn submit_edit(&self, viewer: Viewer, area: &Area) -> Result<Area, MutationError> {
        ensure_can_mutate(viewer)?;
        self.ensure_in_scope(area.id_area)?;
        let updated = self.mutations.update(area).await?;
        self.after_submit();
        Ok(updated)
    }

    /// Delete `id_area`; navigation lands on the list.
    ///
    /// # Errors
    ///
    /// [`MutationError::Forbidden`] for supervisors,
    /// [`MutationError::NotFound`] when the area is not in the open work
    /// site, otherwise see [`AreaMutations::delete`].
    pub async fn confirm_delete(
        &self,
        viewer: Viewer,
        id_area: AreaId,
    ) -> Result<(), MutationError> {
        ensure_can_mutate(viewer)?;
        self.ensure_in_scope(id_area)?;
        self.mutations.delete(id_area).await?;
        self.navigation.with(|nav| {
            // Eviction already closed a confirmation for this id.
            if matches!(nav.mode(), Mode::DeleteConfirm(_)) {
                nav.delete_succeeded().ok();
            }
        });
        Ok(())
    }

    /// Assign or clear the supervisor of `id_area`.
    ///
    /// # Errors
    ///
    /// [`MutationError::Forbidden`] for supervisors,
    /// [`MutationError::NotFound`] when the area is not in the open work
    /// site, otherwise see [`AreaMutations::assign_supervisor`].
    pub async fn assign_supervisor(
        &self,
        viewer: Viewer,
        id_area: AreaId,
        id_usuario: Option<UserId>,
    ) -> Result<Area, MutationError> {
        ensure_can_mutate(viewer)?;
        self.ensure_in_scope(id_area)?;
        self.mutations.assign_supervisor(id_area, id_usuario).await
    }

    fn ensure_in_scope(&self, id_area: AreaId) -> Result<(), MutationError> {
        let scope = self.scope();
        let in_scope = scope
            .and_then(|id| self.areas.snapshot(&id))
            .is_some_and(|snapshot| {
                snapshot
                    .items()
                    .iter()
                    .any(|area| area.id_area == id_area)
            });
        if in_scope {
            return Ok(());
        }
        debug!(
            %id_area,
            scope = ?scope.map(ObraId::get),
            "area is outside the open work site"
        );
        Err(MutationError::not_found(id_area))
    }

    fn after_submit(&self) {
        if let Err(err) = self.navigation.with(|nav| nav.submit_succeeded()) {
            debug!(error = %err, "submit finished without an open form");
        }
    }

    fn invalidate(&self, collection: Collection, scope: Option<ObraId>) {
        match (collection, scope) {
            (Collection::Areas, Some(id)) => self.areas.invalidate(&id),
            (Collection::Cameras, Some(id)) => self.cameras.invalidate(&id),
            (Collection::Reports, Some(id)) => self.reports.invalidate(&id),
            (Collection::Users, _) => self.users.invalidate(&Unscoped),
            (_, None) => {}
        }
    }

    fn loading(&self, scope: Option<ObraId>) -> bool {
        let scoped = scope.is_some_and(|id| {
            self.areas.status(&id).loading
                || self.cameras.status(&id).loading
                || self.reports.status(&id).loading
        });
        scoped || self.users.status(&Unscoped).loading
    }

    fn banners(&self, scope: Option<ObraId>) -> Vec<Banner> {
        Collection::ALL
            .into_iter()
            .filter_map(|collection| {
                let status = match (collection, scope) {
                    (Collection::Areas, Some(id)) => self.areas.status(&id),
                    (Collection::Cameras, Some(id)) => self.cameras.status(&id),
                    (Collection::Reports, Some(id)) => self.reports.status(&id),
                    (Collection::Users, _) => self.users.status(&Unscoped),
                    (_, None) => return None,
                };
                status
                    .last_error
                    .and_then(|err| Banner::from_error(collection, &err))
            })
            .collect()
    }
}

fn ensure_can_mutate(viewer: Viewer) -> Result<(), MutationError> {
    if viewer.can_mutate() {
        return Ok(());
    }
    Err(MutationError::forbidden(format!(
        "{} cannot change areas",
        viewer.role
    )))
}

async fn fetch_scoped<T>(
    store: &EntityStore<T, ObraId>,
    scope: Option<ObraId>,
) -> Result<(), FetchError>
where
    T: Send + Sync + 'static,
{
    match scope {
        Some(id) => store.fetch_all(&id).await.map(|_| ()),
        None => Ok(()),
    }
}
