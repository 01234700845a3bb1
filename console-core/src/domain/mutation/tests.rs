//! Coordinator protocol: validation, claims, refresh, and eviction.

use std::sync::Arc;

use futures_util::poll;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{ApiError, MockAreaApi};
use crate::domain::store::AreaLoader;
use crate::domain::{EntityStore, Mode};
use crate::test_support::{ApiOperation, InMemoryApi, area, fixture_clock};

const SITE: ObraId = ObraId::new(3);

struct Harness {
    api: Arc<InMemoryApi>,
    areas: Arc<AreaStore>,
    navigation: NavigationHandle,
    mutations: AreaMutations,
}

fn wire(api: Arc<dyn AreaApi>) -> (Arc<AreaStore>, NavigationHandle, AreaMutations) {
    let areas = Arc::new(EntityStore::new(
        "areas",
        Arc::new(AreaLoader::new(Arc::clone(&api))),
        fixture_clock(),
    ));
    let navigation = NavigationHandle::new();
    let mutations = AreaMutations::new(api, Arc::clone(&areas), navigation.clone());
    (areas, navigation, mutations)
}

#[fixture]
async fn harness() -> Harness {
    let api = Arc::new(InMemoryApi::with_areas(vec![
        area(1, "Torre A", 3, Some(10)),
        area(5, "Torre E", 3, None),
    ]));
    let (areas, navigation, mutations) = wire(api.clone());
    areas.fetch_all(&SITE).await.expect("seed areas");
    Harness {
        api,
        areas,
        navigation,
        mutations,
    }
}

fn cached_ids(areas: &AreaStore) -> Vec<i64> {
    areas
        .snapshot(&SITE)
        .map(|snapshot| {
            snapshot
                .items()
                .iter()
                .map(|area| area.id_area.get())
                .collect()
        })
        .unwrap_or_default()
}

#[rstest]
#[tokio::test]
async fn blank_update_is_rejected_before_any_network_call() {
    let mut api = MockAreaApi::new();
    api.expect_list_areas()
        .times(1)
        .returning(|_| Ok(vec![area(1, "Torre A", 3, None)]));
    api.expect_update_area().times(0);
    let (areas, _, mutations) = wire(Arc::new(api));
    let before = areas.fetch_all(&SITE).await.expect("seed");

    let mut edited = area(1, "Torre A", 3, None);
    edited.nombre = String::new();
    let err = mutations.update(&edited).await.expect_err("blank name");

    assert!(matches!(err, MutationError::Invalid { .. }));
    let after = areas.snapshot(&SITE).expect("snapshot kept");
    assert_eq!(after.version(), before.version());
    assert_eq!(after.items(), before.items());
    assert_eq!(edited.nombre, "", "caller keeps its input");
}

#[rstest]
#[tokio::test]
async fn update_cannot_move_an_area_to_another_work_site() {
    let mut api = MockAreaApi::new();
    api.expect_list_areas()
        .times(1)
        .returning(|_| Ok(vec![area(1, "Torre A", 3, None)]));
    api.expect_update_area().times(0);
    let (areas, _, mutations) = wire(Arc::new(api));
    let before = areas.fetch_all(&SITE).await.expect("seed");

    let err = mutations
        .update(&area(1, "Torre A", 99, None))
        .await
        .expect_err("work site is fixed");

    assert!(matches!(err, MutationError::Invalid { .. }));
    assert!(!mutations.is_pending(MutationTarget::Area(AreaId::new(1))));
    let after = areas.snapshot(&SITE).expect("snapshot kept");
    assert_eq!(after.version(), before.version());
}

#[rstest]
#[tokio::test]
async fn update_of_an_uncached_area_is_rejected() {
    let mut api = MockAreaApi::new();
    api.expect_list_areas().times(1).returning(|_| Ok(Vec::new()));
    api.expect_update_area().times(0);
    let (areas, _, mutations) = wire(Arc::new(api));
    areas.fetch_all(&SITE).await.expect("seed");

    let err = mutations
        .update(&area(9, "Fantasma", 3, None))
        .await
        .expect_err("area 9 is not cached");
    assert_eq!(err, MutationError::not_found(AreaId::new(9)));
}

#[rstest]
#[tokio::test]
async fn deleting_the_viewed_area_returns_to_the_list(#[future] harness: Harness) {
    let h = harness.await;
    h.navigation
        .with(|nav| nav.select(AreaId::new(5)))
        .expect("select");

    h.mutations.delete(AreaId::new(5)).await.expect("delete");

    assert_eq!(h.navigation.mode(), Mode::List);
    assert_eq!(cached_ids(&h.areas), vec![1]);
}

#[rstest]
#[tokio::test]
async fn successful_create_refetches_the_site(#[future] harness: Harness) {
    let h = harness.await;
    let draft = NewArea::new(SITE, "Torre F").with_descripcion("Nueva ala");

    let created = h.mutations.create(&draft).await.expect("create");

    assert_eq!(created.nombre, "Torre F");
    assert_eq!(h.api.calls(ApiOperation::ListAreas), 2);
    assert!(cached_ids(&h.areas).contains(&created.id_area.get()));
}

#[rstest]
#[tokio::test]
async fn create_without_a_valid_site_never_reaches_the_api(#[future] harness: Harness) {
    let h = harness.await;
    let err = h
        .mutations
        .create(&NewArea::new(ObraId::new(0), "Torre F"))
        .await
        .expect_err("site 0 is invalid");

    assert!(matches!(err, MutationError::Invalid { .. }));
    assert_eq!(h.api.calls(ApiOperation::CreateArea), 0);
}

#[rstest]
#[tokio::test]
async fn rejected_update_leaves_the_store_untouched(#[future] harness: Harness) {
    let h = harness.await;
    let before = h.areas.snapshot(&SITE).expect("seeded");
    h.api.fail_next(
        ApiOperation::UpdateArea,
        ApiError::rejected(409_u16, "el nombre ya existe"),
    );

    let err = h
        .mutations
        .update(&area(1, "Torre E", 3, Some(10)))
        .await
        .expect_err("server rejects");

    assert_eq!(err, MutationError::rejected(409_u16, "el nombre ya existe"));
    assert_eq!(h.api.calls(ApiOperation::ListAreas), 1);
    let after = h.areas.snapshot(&SITE).expect("still seeded");
    assert_eq!(after.version(), before.version());
    assert!(!h.mutations.is_pending(MutationTarget::Area(AreaId::new(1))));
}

#[rstest]
#[tokio::test]
async fn second_write_to_a_busy_area_is_rejected(#[future] harness: Harness) {
    let h = harness.await;
    let release = h.api.hold_mutations();
    let edit = area(1, "Torre A1", 3, Some(10));

    let first = h.mutations.update(&edit);
    tokio::pin!(first);
    assert!(poll!(first.as_mut()).is_pending());

    let err = h
        .mutations
        .assign_supervisor(AreaId::new(1), None)
        .await
        .expect_err("area 1 is busy");
    assert_eq!(
        err,
        MutationError::in_flight(MutationTarget::Area(AreaId::new(1)).to_string())
    );

    release.notify_one();
    first.await.expect("first update completes");
    assert!(!h.mutations.is_pending(MutationTarget::Area(AreaId::new(1))));
}

#[rstest]
#[tokio::test]
async fn second_create_for_the_same_site_is_rejected(#[future] harness: Harness) {
    let h = harness.await;
    let release = h.api.hold_mutations();
    let draft = NewArea::new(SITE, "Torre F");

    let first = h.mutations.create(&draft);
    tokio::pin!(first);
    assert!(poll!(first.as_mut()).is_pending());
    assert!(h.mutations.is_pending(MutationTarget::Create(SITE)));

    let err = h
        .mutations
        .create(&NewArea::new(SITE, "Torre G"))
        .await
        .expect_err("a create for site 3 is pending");
    assert_eq!(
        err,
        MutationError::in_flight(MutationTarget::Create(SITE).to_string())
    );

    release.notify_one();
    first.await.expect("first create completes");
    assert_eq!(h.api.calls(ApiOperation::CreateArea), 1);
    assert!(!h.mutations.is_pending(MutationTarget::Create(SITE)));
}

#[rstest]
#[tokio::test]
async fn mutation_finishing_after_a_site_switch_leaves_the_old_site_released(
    #[future] harness: Harness,
) {
    let h = harness.await;
    let release = h.api.hold_mutations();

    let edit = area(1, "Torre A2", 3, Some(10));
    let pending = h.mutations.update(&edit);
    tokio::pin!(pending);
    assert!(poll!(pending.as_mut()).is_pending());

    h.areas.retain(&ObraId::new(4));
    release.notify_one();
    pending.await.expect("update itself succeeded");

    assert_eq!(h.api.calls(ApiOperation::ListAreas), 1);
    assert!(h.areas.snapshot(&SITE).is_none());
    assert!(h.areas.find_cached(|area| area.id_area == AreaId::new(1)).is_none());
    assert_eq!(
        h.mutations.delete(AreaId::new(1)).await,
        Err(MutationError::not_found(AreaId::new(1)))
    );
}

#[rstest]
#[tokio::test]
async fn abandoned_mutation_releases_its_claim(#[future] harness: Harness) {
    let h = harness.await;
    let _release = h.api.hold_mutations();
    {
        let pending = h.mutations.delete(AreaId::new(5));
        tokio::pin!(pending);
        assert!(poll!(pending.as_mut()).is_pending());
        assert!(h.mutations.is_pending(MutationTarget::Area(AreaId::new(5))));
    }
    assert!(!h.mutations.is_pending(MutationTarget::Area(AreaId::new(5))));
}

#[rstest]
#[tokio::test]
async fn supervisor_assignment_is_visible_after_refresh(#[future] harness: Harness) {
    let h = harness.await;

    let updated = h
        .mutations
        .assign_supervisor(AreaId::new(5), Some(UserId::new(11)))
        .await
        .expect("assign");

    assert_eq!(updated.id_usuario, Some(UserId::new(11)));
    let (_, cached) = h
        .areas
        .find_cached(|area| area.id_area == AreaId::new(5))
        .expect("area 5 cached");
    assert_eq!(cached.id_usuario, Some(UserId::new(11)));
}

#[rstest]
#[tokio::test]
async fn failed_refetch_does_not_fail_the_mutation(#[future] harness: Harness) {
    let h = harness.await;
    h.api
        .fail_next(ApiOperation::ListAreas, ApiError::timeout("refetch"));

    h.mutations
        .update(&area(1, "Torre A1", 3, Some(10)))
        .await
        .expect("update itself succeeded");

    let status = h.areas.status(&SITE);
    assert!(status.stale);
    assert_eq!(status.last_error, Some(crate::domain::FetchError::timeout("refetch")));
}
