//! Users from the directory collaborator and the viewer's role.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::UserId;

/// Directory entry for a user who may supervise areas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id_usuario: UserId,
    /// Given names.
    #[serde(default)]
    pub nombres: String,
    /// Family names.
    #[serde(default)]
    pub apellidos: String,
}

impl User {
    /// Build a directory entry.
    pub fn new(
        id_usuario: UserId,
        nombres: impl Into<String>,
        apellidos: impl Into<String>,
    ) -> Self {
        Self {
            id_usuario,
            nombres: nombres.into(),
            apellidos: apellidos.into(),
        }
    }

    /// Name shown wherever the supervisor is displayed.
    pub fn full_name(&self) -> String {
        let nombres = self.nombres.trim();
        let apellidos = self.apellidos.trim();
        match (nombres.is_empty(), apellidos.is_empty()) {
            (false, false) => format!("{nombres} {apellidos}"),
            (false, true) => nombres.to_owned(),
            (true, false) => apellidos.to_owned(),
            (true, true) => format!("#{}", self.id_usuario),
        }
    }
}

/// Role of the person using the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Sees and manages every area of the work site.
    #[serde(alias = "coordinador")]
    Coordinator,
    /// Sees only the areas assigned to them.
    Supervisor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinator => f.write_str("coordinator"),
            Self::Supervisor => f.write_str("supervisor"),
        }
    }
}

/// Identity the console renders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    /// Role granted to the user.
    pub role: Role,
    /// The user's own id.
    pub user_id: UserId,
}

impl Viewer {
    /// Viewer with unrestricted visibility.
    pub const fn coordinator(user_id: UserId) -> Self {
        Self {
            role: Role::Coordinator,
            user_id,
        }
    }

    /// Viewer restricted to their assigned areas.
    pub const fn supervisor(user_id: UserId) -> Self {
        Self {
            role: Role::Supervisor,
            user_id,
        }
    }

    /// Whether the viewer may create, edit, or delete areas.
    pub const fn can_mutate(&self) -> bool {
        matches!(self.role, Role::Coordinator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Ana", "Pérez", "Ana Pérez")]
    #[case(" Ana ", "", "Ana")]
    #[case("", "Pérez", "Pérez")]
    #[case("", "  ", "#10")]
    fn full_name_skips_blank_parts(
        #[case] nombres: &str,
        #[case] apellidos: &str,
        #[case] expected: &str,
    ) {
        let user = User::new(UserId::new(10), nombres, apellidos);
        assert_eq!(user.full_name(), expected);
    }

    #[rstest]
    #[case("\"coordinador\"", Role::Coordinator)]
    #[case("\"coordinator\"", Role::Coordinator)]
    #[case("\"supervisor\"", Role::Supervisor)]
    fn role_accepts_both_spellings(#[case] raw: &str, #[case] expected: Role) {
        let role: Role = serde_json::from_str(raw).expect("role decodes");
        assert_eq!(role, expected);
    }

    #[rstest]
    fn only_coordinators_mutate() {
        assert!(Viewer::coordinator(UserId::new(1)).can_mutate());
        assert!(!Viewer::supervisor(UserId::new(1)).can_mutate());
    }
}
