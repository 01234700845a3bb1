//! Read-only records that reference an area by foreign key.
//!
//! Cameras and reports are owned by separate collaborators. This core only
//! counts them per area, so the records carry `id_area` plus whatever
//! identifying fields the API happens to supply.

use serde::{Deserialize, Serialize};

use super::AreaId;

/// Records that belong to exactly one area through `id_area`.
pub trait BelongsToArea {
    /// Area the record is attached to.
    fn area_id(&self) -> AreaId;
}

/// Camera attached to an area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    /// Camera identifier, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_camara: Option<i64>,
    /// Owning area.
    pub id_area: AreaId,
    /// Camera label, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
}

impl Camera {
    /// Camera known only by its owning area.
    pub const fn in_area(id_area: AreaId) -> Self {
        Self {
            id_camara: None,
            id_area,
            nombre: None,
        }
    }
}

impl BelongsToArea for Camera {
    fn area_id(&self) -> AreaId {
        self.id_area
    }
}

/// Report filed against an area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Report identifier, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_reporte: Option<i64>,
    /// Owning area.
    pub id_area: AreaId,
    /// Report title, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
}

impl Report {
    /// Report known only by its owning area.
    pub const fn in_area(id_area: AreaId) -> Self {
        Self {
            id_reporte: None,
            id_area,
            titulo: None,
        }
    }
}

impl BelongsToArea for Report {
    fn area_id(&self) -> AreaId {
        self.id_area
    }
}
