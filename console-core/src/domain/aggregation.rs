//! Join of areas with their cameras, reports, and supervisor.
//!
//! Aggregation is a pure function of the four collections: it is recomputed
//! on every render and never cached, so the derived counts can never drift
//! from the snapshots they were built from.

use std::collections::HashMap;

use serde::Serialize;

use super::{Area, AreaId, BelongsToArea, Camera, Report, User, UserId};

/// An [`Area`] with its supervisor resolved and its cameras and reports
/// counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaView {
    /// The underlying area, serialised inline.
    #[serde(flatten)]
    pub area: Area,
    /// Directory entry for `area.id_usuario`, when it resolves.
    pub supervisor: Option<User>,
    /// Cameras whose `id_area` matches.
    pub camaras_count: usize,
    /// Reports whose `id_area` matches.
    pub reportes_count: usize,
}

impl AsRef<Area> for AreaView {
    fn as_ref(&self) -> &Area {
        &self.area
    }
}

/// Pre-built lookups so the join is linear in the total input size.
struct AreaIndex<'a> {
    cameras: HashMap<AreaId, usize>,
    reports: HashMap<AreaId, usize>,
    users: HashMap<UserId, &'a User>,
}

impl<'a> AreaIndex<'a> {
    fn build(cameras: &[Camera], reports: &[Report], users: &'a [User]) -> Self {
        Self {
            cameras: count_by_area(cameras),
            reports: count_by_area(reports),
            users: users.iter().map(|user| (user.id_usuario, user)).collect(),
        }
    }

    fn view(&self, area: &Area) -> AreaView {
        AreaView {
            area: area.clone(),
            supervisor: area
                .id_usuario
                .and_then(|id| self.users.get(&id))
                .map(|user| (*user).clone()),
            camaras_count: self.cameras.get(&area.id_area).copied().unwrap_or(0),
            reportes_count: self.reports.get(&area.id_area).copied().unwrap_or(0),
        }
    }
}

fn count_by_area<R: BelongsToArea>(records: &[R]) -> HashMap<AreaId, usize> {
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry(record.area_id()).or_insert(0) += 1;
    }
    counts
}

/// Join `areas` with the other collections by `id_area` and `id_usuario`.
///
/// The output has one view per input area, in input order. A supervisor id
/// that is missing from `users` resolves to `None`.
///
/// # Examples
///
/// ```
/// use console_core::domain::{Area, AreaId, Camera, ObraId, aggregate};
///
/// let areas = vec![Area {
///     id_area: AreaId::new(1),
///     nombre: "Torre A".to_owned(),
///     descripcion: None,
///     id_obra: ObraId::new(3),
///     id_usuario: None,
/// }];
/// let cameras = vec![Camera::in_area(AreaId::new(1))];
///
/// let views = aggregate(&areas, &cameras, &[], &[]);
/// assert_eq!(views[0].camaras_count, 1);
/// ```
pub fn aggregate(
    areas: &[Area],
    cameras: &[Camera],
    reports: &[Report],
    users: &[User],
) -> Vec<AreaView> {
    let index = AreaIndex::build(cameras, reports, users);
    areas.iter().map(|area| index.view(area)).collect()
}
