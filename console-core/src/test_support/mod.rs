//! Test utilities for the console core.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and behind the `test-support` feature.

mod api;
mod loaders;

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{Area, AreaId, Camera, ObraId, Report, User, UserId};

pub use self::api::{ApiOperation, InMemoryApi};
pub use self::loaders::{CountingLoader, GatedLoader};

/// Timestamp every fixture clock reports.
///
/// # Panics
///
/// Panics if the constant date is not representable, which cannot happen.
pub fn fixture_timestamp() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).single() {
        Some(timestamp) => timestamp,
        None => panic!("valid fixture timestamp"),
    }
}

/// Clock frozen at [`fixture_timestamp`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureClock;

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        fixture_timestamp()
    }
}

/// [`FixtureClock`] behind the trait object the stores expect.
pub fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock)
}

/// Area fixture.
pub fn area(id_area: i64, nombre: &str, id_obra: i64, id_usuario: Option<i64>) -> Area {
    Area {
        id_area: AreaId::new(id_area),
        nombre: nombre.to_owned(),
        descripcion: None,
        id_obra: ObraId::new(id_obra),
        id_usuario: id_usuario.map(UserId::new),
    }
}

/// Cameras attached to the given areas, one per entry.
pub fn cameras(id_areas: &[i64]) -> Vec<Camera> {
    id_areas
        .iter()
        .map(|id| Camera::in_area(AreaId::new(*id)))
        .collect()
}

/// Reports attached to the given areas, one per entry.
pub fn reports(id_areas: &[i64]) -> Vec<Report> {
    id_areas
        .iter()
        .map(|id| Report::in_area(AreaId::new(*id)))
        .collect()
}

/// Directory user fixture.
pub fn user(id_usuario: i64, nombres: &str, apellidos: &str) -> User {
    User::new(UserId::new(id_usuario), nombres, apellidos)
}
