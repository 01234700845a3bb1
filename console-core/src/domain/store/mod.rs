//! Scope-keyed cached collections.
//!
//! An [`EntityStore`] owns one collection type (areas, cameras, reports, or
//! users) and caches it per scope key. Concurrent fetches for the same scope
//! share one request; invalidation marks the snapshot stale and drops
//! interest in whatever request is still outstanding.
//!
//! ## Ordering
//! Every request carries a ticket. A result commits only while its ticket is
//! still the slot's in-flight ticket, so a request issued before an
//! invalidation (or for a scope that has since been released) can never
//! overwrite a newer snapshot. The state lock is never held across an await.

mod loaders;

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use mockable::Clock;
use tracing::{debug, warn};

use super::{Area, Camera, FetchError, ObraId, Report, User};

pub use self::loaders::{AreaLoader, CameraLoader, ReportLoader, UserLoader};

/// Cached areas keyed by work site.
pub type AreaStore = EntityStore<Area, ObraId>;
/// Cached cameras keyed by work site.
pub type CameraStore = EntityStore<Camera, ObraId>;
/// Cached reports keyed by work site.
pub type ReportStore = EntityStore<Report, ObraId>;
/// The user directory, cached under a single key.
pub type UserStore = EntityStore<User, Unscoped>;

/// Scope key for collections that are not partitioned by work site.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unscoped;

impl fmt::Display for Unscoped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("all")
    }
}

/// Loads one scope of a collection from its collaborator.
#[async_trait]
pub trait CollectionLoader<T, K>: Send + Sync {
    /// Fetch every record in `scope`.
    async fn load(&self, scope: &K) -> Result<Vec<T>, FetchError>;
}

/// Immutable view of a committed collection.
///
/// Cloning is cheap: the items are shared.
#[derive(Debug)]
pub struct Snapshot<T> {
    items: Arc<Vec<T>>,
    fetched_at: DateTime<Utc>,
    version: u64,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            fetched_at: self.fetched_at,
            version: self.version,
        }
    }
}

impl<T> Snapshot<T> {
    /// Committed records in server order.
    pub fn items(&self) -> &[T] {
        self.items.as_slice()
    }

    /// When the records were committed.
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Store-wide commit counter at the time of this snapshot.
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Observable state of one scope, used for loading indicators and banners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatus {
    /// Version of the current snapshot, if one was ever committed.
    pub version: Option<u64>,
    /// Whether the snapshot was invalidated and not yet refetched.
    pub stale: bool,
    /// Whether a request is outstanding.
    pub loading: bool,
    /// Failure of the most recent settled request.
    pub last_error: Option<FetchError>,
    /// Commit time of the current snapshot.
    pub fetched_at: Option<DateTime<Utc>>,
}

type SharedFetch<T> = Shared<BoxFuture<'static, Result<Arc<Vec<T>>, FetchError>>>;

struct InFlight<T> {
    ticket: u64,
    request: SharedFetch<T>,
}

struct Slot<T> {
    snapshot: Option<Snapshot<T>>,
    stale: bool,
    last_error: Option<FetchError>,
    in_flight: Option<InFlight<T>>,
    last_settled: Option<u64>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            snapshot: None,
            stale: false,
            last_error: None,
            in_flight: None,
            last_settled: None,
        }
    }
}

struct StoreState<T, K> {
    slots: HashMap<K, Slot<T>>,
    next_ticket: u64,
    next_version: u64,
}

#[derive(Debug, Clone, Copy)]
enum Presence {
    CreateSlot,
    ExistingSlot,
}

enum Begin<T> {
    Cached(Snapshot<T>),
    Released,
    Await { ticket: u64, request: SharedFetch<T> },
}

enum Settled<T> {
    Done(Result<Snapshot<T>, FetchError>),
    Superseded,
}

/// Cached, versioned collection of `T` partitioned by scope key `K`.
pub struct EntityStore<T, K> {
    name: &'static str,
    loader: Arc<dyn CollectionLoader<T, K>>,
    clock: Arc<dyn Clock>,
    state: Mutex<StoreState<T, K>>,
}

impl<T, K> fmt::Debug for EntityStore<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T, K> EntityStore<T, K>
where
    T: Send + Sync + 'static,
    K: Clone + Eq + Hash + fmt::Display + Send + Sync + 'static,
{
    /// Create an empty store named `name` for log fields.
    pub fn new(
        name: &'static str,
        loader: Arc<dyn CollectionLoader<T, K>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name,
            loader,
            clock,
            state: Mutex::new(StoreState {
                slots: HashMap::new(),
                next_ticket: 1,
                next_version: 1,
            }),
        }
    }

    /// Name used in log fields and banners.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Return the cached snapshot for `scope`, loading it when absent or
    /// stale.
    ///
    /// Concurrent callers for the same scope share one request. A caller
    /// whose request is superseded by an invalidation waits for the newer
    /// request instead.
    ///
    /// # Errors
    ///
    /// Returns the loader's [`FetchError`] (the previous snapshot stays in
    /// place), or [`FetchError::Abandoned`] when the scope was released by
    /// [`EntityStore::retain`] while the request was outstanding.
    pub async fn fetch_all(&self, scope: &K) -> Result<Snapshot<T>, FetchError> {
        self.load(scope, Presence::CreateSlot).await
    }

    /// Invalidate `scope` and load it again, but only while it is cached.
    ///
    /// Returns `None` without issuing a request when `scope` was never
    /// loaded or has been released by [`EntityStore::retain`], so a refresh
    /// can never bring a released scope back.
    pub async fn refresh(&self, scope: &K) -> Option<Result<Snapshot<T>, FetchError>> {
        if !self.mark_stale(scope) {
            debug!(store = self.name, %scope, "refresh skipped; scope not cached");
            return None;
        }
        Some(self.load(scope, Presence::ExistingSlot).await)
    }

    async fn load(&self, scope: &K, presence: Presence) -> Result<Snapshot<T>, FetchError> {
        loop {
            let (ticket, request) = match self.begin(scope, presence) {
                Begin::Cached(snapshot) => return Ok(snapshot),
                Begin::Released => return Err(FetchError::abandoned(scope.to_string())),
                Begin::Await { ticket, request } => (ticket, request),
            };
            let outcome = request.await;
            match self.settle(scope, ticket, outcome) {
                Settled::Done(result) => return result,
                Settled::Superseded => {
                    debug!(store = self.name, %scope, ticket, "fetch superseded; retrying");
                }
            }
        }
    }

    /// Mark `scope` stale and drop interest in its outstanding request.
    ///
    /// Readers keep seeing the stale snapshot until the next fetch commits.
    pub fn invalidate(&self, scope: &K) {
        self.mark_stale(scope);
    }

    /// Invalidate every cached scope.
    pub fn invalidate_all(&self) {
        let mut state = self.lock();
        for slot in state.slots.values_mut() {
            slot.stale = true;
            slot.in_flight = None;
            slot.last_settled = None;
        }
        debug!(store = self.name, "all scopes invalidated");
    }

    /// Drop every scope except `scope`.
    ///
    /// Requests outstanding for the dropped scopes settle as
    /// [`FetchError::Abandoned`] and never commit.
    pub fn retain(&self, scope: &K) {
        let mut state = self.lock();
        let before = state.slots.len();
        state.slots.retain(|key, _| key == scope);
        let released = before - state.slots.len();
        if released > 0 {
            debug!(store = self.name, %scope, released, "released other scopes");
        }
    }

    /// Current snapshot for `scope`, stale or not, without loading.
    pub fn snapshot(&self, scope: &K) -> Option<Snapshot<T>> {
        self.lock()
            .slots
            .get(scope)
            .and_then(|slot| slot.snapshot.clone())
    }

    /// Loading, staleness, and error state for `scope`.
    pub fn status(&self, scope: &K) -> StoreStatus {
        let state = self.lock();
        let Some(slot) = state.slots.get(scope) else {
            return StoreStatus::default();
        };
        StoreStatus {
            version: slot.snapshot.as_ref().map(Snapshot::version),
            stale: slot.stale,
            loading: slot.in_flight.is_some(),
            last_error: slot.last_error.clone(),
            fetched_at: slot.snapshot.as_ref().map(Snapshot::fetched_at),
        }
    }

    /// First cached record matching `predicate`, with the scope holding it.
    pub fn find_cached<P>(&self, predicate: P) -> Option<(K, T)>
    where
        P: Fn(&T) -> bool,
        T: Clone,
    {
        let state = self.lock();
        state.slots.iter().find_map(|(scope, slot)| {
            slot.snapshot
                .as_ref()
                .and_then(|snapshot| snapshot.items().iter().find(|&item| predicate(item)))
                .map(|item| (scope.clone(), item.clone()))
        })
    }

    fn mark_stale(&self, scope: &K) -> bool {
        let mut state = self.lock();
        let Some(slot) = state.slots.get_mut(scope) else {
            return false;
        };
        slot.stale = true;
        slot.in_flight = None;
        slot.last_settled = None;
        debug!(store = self.name, %scope, "scope invalidated");
        true
    }

    fn begin(&self, scope: &K, presence: Presence) -> Begin<T> {
        let mut state = self.lock();
        let ticket = state.next_ticket;
        let slot = match presence {
            Presence::CreateSlot => state.slots.entry(scope.clone()).or_default(),
            Presence::ExistingSlot => match state.slots.get_mut(scope) {
                Some(slot) => slot,
                None => return Begin::Released,
            },
        };

        if let Some(snapshot) = slot.snapshot.as_ref().filter(|_| !slot.stale) {
            return Begin::Cached(snapshot.clone());
        }
        if let Some(in_flight) = &slot.in_flight {
            return Begin::Await {
                ticket: in_flight.ticket,
                request: in_flight.request.clone(),
            };
        }

        let loader = Arc::clone(&self.loader);
        let key = scope.clone();
        let request = async move { loader.load(&key).await.map(Arc::new) }
            .boxed()
            .shared();
        slot.in_flight = Some(InFlight {
            ticket,
            request: request.clone(),
        });
        state.next_ticket += 1;
        debug!(store = self.name, %scope, ticket, "fetch started");
        Begin::Await { ticket, request }
    }

    fn settle(
        &self,
        scope: &K,
        ticket: u64,
        outcome: Result<Arc<Vec<T>>, FetchError>,
    ) -> Settled<T> {
        let mut state = self.lock();
        let version = state.next_version;
        let Some(slot) = state.slots.get_mut(scope) else {
            debug!(store = self.name, %scope, ticket, "result for released scope ignored");
            return Settled::Done(Err(FetchError::abandoned(scope.to_string())));
        };

        let owns_slot = slot
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.ticket == ticket);
        if !owns_slot {
            if slot.last_settled != Some(ticket) {
                return Settled::Superseded;
            }
            // Another caller sharing this request already committed it.
            return Settled::Done(match outcome {
                Ok(_) => slot
                    .snapshot
                    .clone()
                    .ok_or_else(|| FetchError::abandoned(scope.to_string())),
                Err(error) => Err(error),
            });
        }

        slot.in_flight = None;
        slot.last_settled = Some(ticket);
        match outcome {
            Ok(items) => {
                let snapshot = Snapshot {
                    items,
                    fetched_at: self.clock.utc(),
                    version,
                };
                slot.snapshot = Some(snapshot.clone());
                slot.stale = false;
                slot.last_error = None;
                state.next_version += 1;
                debug!(
                    store = self.name,
                    %scope,
                    ticket,
                    version,
                    count = snapshot.len(),
                    "snapshot committed"
                );
                Settled::Done(Ok(snapshot))
            }
            Err(error) => {
                slot.last_error = Some(error.clone());
                warn!(store = self.name, %scope, ticket, %error, "collection fetch failed");
                Settled::Done(Err(error))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState<T, K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests;
