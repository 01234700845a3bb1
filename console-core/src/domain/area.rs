//! Area entity and the drafts submitted through the mutation coordinator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AreaId, ObraId, UserId};

/// Organisational subdivision of a work site.
///
/// ## Invariants
/// - `id_area` and `id_obra` never change once the server has assigned them.
/// - `nombre` is non-empty after trimming for every area that passed
///   validation on its way to the server.
///
/// Field names are part of the collaborator contract and serialise verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    /// Server-assigned identifier.
    pub id_area: AreaId,
    /// Display name.
    pub nombre: String,
    /// Optional free-text description.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Owning work site.
    pub id_obra: ObraId,
    /// Supervising user, if one is assigned.
    #[serde(default)]
    pub id_usuario: Option<UserId>,
}

impl AsRef<Self> for Area {
    fn as_ref(&self) -> &Self {
        self
    }
}

impl Area {
    /// Check the fields an update may carry.
    ///
    /// # Errors
    ///
    /// Returns [`AreaValidationError::EmptyName`] when `nombre` is blank.
    pub fn validate(&self) -> Result<(), AreaValidationError> {
        validate_name(&self.nombre)
    }
}

/// Create payload: an [`Area`] without its server-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArea {
    /// Display name.
    pub nombre: String,
    /// Optional free-text description.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Owning work site.
    pub id_obra: ObraId,
    /// Supervising user, if one is assigned at creation.
    #[serde(default)]
    pub id_usuario: Option<UserId>,
}

impl NewArea {
    /// Build a draft with only the required fields set.
    pub fn new(id_obra: ObraId, nombre: impl Into<String>) -> Self {
        Self {
            nombre: nombre.into(),
            descripcion: None,
            id_obra,
            id_usuario: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_descripcion(mut self, descripcion: impl Into<String>) -> Self {
        self.descripcion = Some(descripcion.into());
        self
    }

    /// Assign a supervisor at creation time.
    #[must_use]
    pub fn with_supervisor(mut self, id_usuario: UserId) -> Self {
        self.id_usuario = Some(id_usuario);
        self
    }

    /// Check the required fields before submission.
    ///
    /// # Errors
    ///
    /// Returns [`AreaValidationError::EmptyName`] for a blank name and
    /// [`AreaValidationError::InvalidObra`] for a non-positive work site.
    pub fn validate(&self) -> Result<(), AreaValidationError> {
        validate_name(&self.nombre)?;
        if !self.id_obra.is_valid() {
            return Err(AreaValidationError::InvalidObra {
                id_obra: self.id_obra,
            });
        }
        Ok(())
    }
}

/// Body of `PUT /areas/{id}/supervisor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorAssignment {
    /// New supervisor, or `None` to clear the assignment.
    pub id_usuario: Option<UserId>,
}

/// Local validation failures raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AreaValidationError {
    /// `nombre` is empty once trimmed.
    #[error("area name must not be empty")]
    EmptyName,
    /// `id_obra` does not refer to a persisted work site.
    #[error("work site id {id_obra} is not valid")]
    InvalidObra {
        /// Rejected work site id.
        id_obra: ObraId,
    },
}

fn validate_name(nombre: &str) -> Result<(), AreaValidationError> {
    if nombre.trim().is_empty() {
        return Err(AreaValidationError::EmptyName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Validation and payload-shape coverage.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn blank_names_are_rejected(#[case] nombre: &str) {
        let draft = NewArea::new(ObraId::new(3), nombre);
        assert_eq!(draft.validate(), Err(AreaValidationError::EmptyName));
    }

    #[rstest]
    fn create_requires_a_persisted_work_site() {
        let draft = NewArea::new(ObraId::new(0), "Sótano");
        assert_eq!(
            draft.validate(),
            Err(AreaValidationError::InvalidObra {
                id_obra: ObraId::new(0)
            })
        );
    }

    #[rstest]
    fn area_decodes_null_supervisor_and_missing_description() {
        let area: Area = serde_json::from_value(json!({
            "id_area": 2,
            "nombre": "Torre B",
            "id_obra": 4,
            "id_usuario": null
        }))
        .expect("area decodes");

        assert_eq!(area.id_usuario, None);
        assert_eq!(area.descripcion, None);
        assert!(area.validate().is_ok());
    }

    #[rstest]
    fn new_area_payload_omits_the_identifier() {
        let draft = NewArea::new(ObraId::new(4), "Torre C")
            .with_descripcion("Fachada norte")
            .with_supervisor(UserId::new(10));
        let value = serde_json::to_value(&draft).expect("draft serialises");

        assert_eq!(
            value,
            json!({
                "nombre": "Torre C",
                "descripcion": "Fachada norte",
                "id_obra": 4,
                "id_usuario": 10
            })
        );
    }
}
