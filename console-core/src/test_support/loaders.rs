//! Collection loaders whose answers tests control.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::{CollectionLoader, FetchError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Loader returning the current fixture items and counting requests.
#[derive(Debug, Default)]
pub struct CountingLoader<T> {
    items: Mutex<Vec<T>>,
    failure: Mutex<Option<FetchError>>,
    calls: AtomicUsize,
}

impl<T: Clone> CountingLoader<T> {
    /// Loader that answers every scope with `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replace the items returned by later requests.
    pub fn set_items(&self, items: Vec<T>) {
        *lock(&self.items) = items;
    }

    /// Fail the next request with `error`.
    pub fn fail_next(&self, error: FetchError) {
        *lock(&self.failure) = Some(error);
    }

    /// Number of requests issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T, K> CollectionLoader<T, K> for CountingLoader<T>
where
    T: Clone + Send + Sync,
    K: Sync,
{
    async fn load(&self, _scope: &K) -> Result<Vec<T>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = lock(&self.failure).take() {
            return Err(error);
        }
        Ok(lock(&self.items).clone())
    }
}

type Gate<T> = oneshot::Receiver<Result<Vec<T>, FetchError>>;

/// Loader whose requests resolve only when the test releases them.
///
/// Each request takes the oldest queued gate, so the order in which gates are
/// queued decides which request receives which answer.
#[derive(Debug, Default)]
pub struct GatedLoader<T> {
    gates: Mutex<VecDeque<Gate<T>>>,
    calls: AtomicUsize,
}

impl<T> GatedLoader<T> {
    /// Loader with no queued gates.
    pub fn new() -> Self {
        Self {
            gates: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a gate for the next request and return its release handle.
    pub fn gate(&self) -> oneshot::Sender<Result<Vec<T>, FetchError>> {
        let (release, gate) = oneshot::channel();
        lock(&self.gates).push_back(gate);
        release
    }

    /// Number of requests issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T, K> CollectionLoader<T, K> for GatedLoader<T>
where
    T: Send + Sync,
    K: Sync,
{
    async fn load(&self, _scope: &K) -> Result<Vec<T>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.gates).pop_front();
        let Some(gate) = gate else {
            return Err(FetchError::transport("no gate queued for request"));
        };
        gate.await
            .unwrap_or_else(|_| Err(FetchError::transport("gate dropped before release")))
    }
}
