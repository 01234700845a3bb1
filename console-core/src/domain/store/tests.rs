//! Caching, coalescing, and ordering behaviour of [`EntityStore`].

use std::sync::Arc;

use futures_util::poll;
use rstest::{fixture, rstest};

use super::*;
use crate::test_support::{CountingLoader, GatedLoader, fixture_clock, fixture_timestamp};

type NumberStore = EntityStore<u32, ObraId>;

const SITE: ObraId = ObraId::new(1);
const OTHER_SITE: ObraId = ObraId::new(2);

#[fixture]
fn counting() -> Arc<CountingLoader<u32>> {
    Arc::new(CountingLoader::new(vec![1, 2, 3]))
}

#[fixture]
fn gated() -> Arc<GatedLoader<u32>> {
    Arc::new(GatedLoader::new())
}

fn store_over(loader: Arc<dyn CollectionLoader<u32, ObraId>>) -> NumberStore {
    EntityStore::new("numbers", loader, fixture_clock())
}

#[rstest]
#[tokio::test]
async fn repeated_fetches_share_the_cached_snapshot(counting: Arc<CountingLoader<u32>>) {
    let store = store_over(counting.clone());

    let first = store.fetch_all(&SITE).await.expect("first fetch");
    let second = store.fetch_all(&SITE).await.expect("second fetch");

    assert_eq!(counting.calls(), 1);
    assert_eq!(first.items(), second.items());
    assert_eq!(first.version(), second.version());
    assert_eq!(first.fetched_at(), fixture_timestamp());
}

#[rstest]
#[tokio::test]
async fn concurrent_fetches_coalesce_into_one_request(gated: Arc<GatedLoader<u32>>) {
    let release = gated.gate();
    let store = store_over(gated.clone());

    let first = store.fetch_all(&SITE);
    let second = store.fetch_all(&SITE);
    tokio::pin!(first);
    tokio::pin!(second);
    assert!(poll!(first.as_mut()).is_pending());
    assert!(poll!(second.as_mut()).is_pending());
    assert!(store.status(&SITE).loading);

    release.send(Ok(vec![7])).expect("request is waiting");
    let (first, second) = tokio::join!(first, second);

    assert_eq!(gated.calls(), 1);
    assert_eq!(first.expect("first").items(), [7]);
    assert_eq!(second.expect("second").items(), [7]);
}

#[rstest]
#[tokio::test]
async fn invalidation_forces_a_refetch_without_hiding_the_stale_snapshot(
    counting: Arc<CountingLoader<u32>>,
) {
    let store = store_over(counting.clone());
    let original = store.fetch_all(&SITE).await.expect("initial fetch");

    counting.set_items(vec![4]);
    store.invalidate(&SITE);

    let stale = store.snapshot(&SITE).expect("stale snapshot stays readable");
    assert_eq!(stale.items(), original.items());
    assert!(store.status(&SITE).stale);

    let fresh = store.fetch_all(&SITE).await.expect("refetch");
    assert_eq!(fresh.items(), [4]);
    assert!(fresh.version() > original.version());
    assert_eq!(counting.calls(), 2);
    assert!(!store.status(&SITE).stale);
}

#[rstest]
#[tokio::test]
async fn late_result_from_before_an_invalidation_is_discarded(gated: Arc<GatedLoader<u32>>) {
    let early_release = gated.gate();
    let late_release = gated.gate();
    let store = store_over(gated.clone());

    let early = store.fetch_all(&SITE);
    tokio::pin!(early);
    assert!(poll!(early.as_mut()).is_pending());

    store.invalidate(&SITE);
    let late = store.fetch_all(&SITE);
    tokio::pin!(late);
    assert!(poll!(late.as_mut()).is_pending());

    late_release.send(Ok(vec![2])).expect("late request waiting");
    let late = late.await.expect("late fetch");
    assert_eq!(late.items(), [2]);

    early_release.send(Ok(vec![1])).expect("early request waiting");
    let early = early.await.expect("early caller resolves");

    assert_eq!(early.items(), [2], "superseded caller sees the newer snapshot");
    let current = store.snapshot(&SITE).expect("snapshot present");
    assert_eq!(current.items(), [2]);
    assert_eq!(current.version(), late.version());
}

#[rstest]
#[tokio::test]
async fn superseded_caller_waits_for_the_newer_request(gated: Arc<GatedLoader<u32>>) {
    let early_release = gated.gate();
    let late_release = gated.gate();
    let store = store_over(gated.clone());

    let early = store.fetch_all(&SITE);
    tokio::pin!(early);
    assert!(poll!(early.as_mut()).is_pending());
    store.invalidate(&SITE);
    let late = store.fetch_all(&SITE);
    tokio::pin!(late);
    assert!(poll!(late.as_mut()).is_pending());

    early_release.send(Ok(vec![1])).expect("early request waiting");
    assert!(
        poll!(early.as_mut()).is_pending(),
        "early caller joins the newer request"
    );
    assert!(store.snapshot(&SITE).is_none());

    late_release.send(Ok(vec![2])).expect("late request waiting");
    let (early, late) = tokio::join!(early, late);
    assert_eq!(early.expect("early").items(), [2]);
    assert_eq!(late.expect("late").items(), [2]);
    assert_eq!(gated.calls(), 2);
}

#[rstest]
#[tokio::test]
async fn failed_fetch_keeps_the_last_good_snapshot(counting: Arc<CountingLoader<u32>>) {
    let store = store_over(counting.clone());
    let good = store.fetch_all(&SITE).await.expect("initial fetch");

    store.invalidate(&SITE);
    counting.fail_next(FetchError::timeout("30s"));
    let err = store.fetch_all(&SITE).await.expect_err("refetch fails");

    assert_eq!(err, FetchError::timeout("30s"));
    let status = store.status(&SITE);
    assert_eq!(status.last_error, Some(FetchError::timeout("30s")));
    assert_eq!(status.version, Some(good.version()));
    assert_eq!(
        store.snapshot(&SITE).expect("kept").items(),
        good.items()
    );

    store.fetch_all(&SITE).await.expect("retry succeeds");
    assert_eq!(store.status(&SITE).last_error, None);
}

#[rstest]
#[tokio::test]
async fn released_scope_ignores_its_late_result(gated: Arc<GatedLoader<u32>>) {
    let release = gated.gate();
    let store = store_over(gated.clone());

    let pending = store.fetch_all(&SITE);
    tokio::pin!(pending);
    assert!(poll!(pending.as_mut()).is_pending());

    store.retain(&OTHER_SITE);
    release.send(Ok(vec![9])).expect("request waiting");
    let err = pending.await.expect_err("scope was released");

    assert_eq!(err, FetchError::abandoned("1"));
    assert!(store.snapshot(&SITE).is_none());
    assert_eq!(store.status(&SITE), StoreStatus::default());
}

#[rstest]
#[tokio::test]
async fn refresh_reloads_a_cached_scope(counting: Arc<CountingLoader<u32>>) {
    let store = store_over(counting.clone());
    store.fetch_all(&SITE).await.expect("initial fetch");
    counting.set_items(vec![4]);

    let refreshed = store
        .refresh(&SITE)
        .await
        .expect("scope is cached")
        .expect("refetch succeeds");

    assert_eq!(refreshed.items(), [4]);
    assert_eq!(counting.calls(), 2);
}

#[rstest]
#[tokio::test]
async fn refresh_never_brings_back_a_released_scope(counting: Arc<CountingLoader<u32>>) {
    let store = store_over(counting.clone());
    store.fetch_all(&SITE).await.expect("site");
    store.retain(&OTHER_SITE);

    assert!(store.refresh(&SITE).await.is_none());

    assert_eq!(counting.calls(), 1);
    assert!(store.snapshot(&SITE).is_none());
    assert!(store.find_cached(|_| true).is_none());
}

#[rstest]
#[tokio::test]
async fn refresh_released_mid_flight_is_abandoned(gated: Arc<GatedLoader<u32>>) {
    let first = gated.gate();
    let second = gated.gate();
    let store = store_over(gated.clone());
    first.send(Ok(vec![1])).expect("first request waiting");
    store.fetch_all(&SITE).await.expect("initial fetch");

    let pending = store.refresh(&SITE);
    tokio::pin!(pending);
    assert!(poll!(pending.as_mut()).is_pending());

    store.retain(&OTHER_SITE);
    second.send(Ok(vec![2])).expect("refetch waiting");
    let outcome = pending.await.expect("scope was cached when the refresh began");

    assert_eq!(outcome.expect_err("released"), FetchError::abandoned("1"));
    assert!(store.snapshot(&SITE).is_none());
}

#[rstest]
#[tokio::test]
async fn retain_keeps_only_the_named_scope(counting: Arc<CountingLoader<u32>>) {
    let store = store_over(counting.clone());
    store.fetch_all(&SITE).await.expect("site");
    store.fetch_all(&OTHER_SITE).await.expect("other site");

    store.retain(&OTHER_SITE);

    assert!(store.snapshot(&SITE).is_none());
    assert!(store.snapshot(&OTHER_SITE).is_some());
}

#[rstest]
#[tokio::test]
async fn invalidate_all_marks_every_scope_stale(counting: Arc<CountingLoader<u32>>) {
    let store = store_over(counting.clone());
    store.fetch_all(&SITE).await.expect("site");
    store.fetch_all(&OTHER_SITE).await.expect("other site");

    store.invalidate_all();

    assert!(store.status(&SITE).stale);
    assert!(store.status(&OTHER_SITE).stale);
    store.fetch_all(&SITE).await.expect("refetch");
    assert_eq!(counting.calls(), 3);
}

#[rstest]
#[tokio::test]
async fn find_cached_reports_the_scope_holding_the_match(counting: Arc<CountingLoader<u32>>) {
    let store = store_over(counting.clone());
    store.fetch_all(&SITE).await.expect("site");

    assert_eq!(store.find_cached(|n| *n == 2), Some((SITE, 2)));
    assert_eq!(store.find_cached(|n| *n == 42), None);
}

#[rstest]
fn unknown_scope_reports_an_empty_status(counting: Arc<CountingLoader<u32>>) {
    let store = store_over(counting);
    assert_eq!(store.status(&SITE), StoreStatus::default());
    assert!(store.snapshot(&SITE).is_none());
}

#[rstest]
#[tokio::test]
async fn versions_increase_across_scopes(counting: Arc<CountingLoader<u32>>) {
    let store = store_over(counting);
    let first = store.fetch_all(&SITE).await.expect("site");
    let second = store.fetch_all(&OTHER_SITE).await.expect("other site");
    assert!(second.version() > first.version());
}
