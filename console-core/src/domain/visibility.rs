//! Role-scoped visibility and text search over areas.

use super::{Area, Role, UserId, Viewer};

/// Narrows collections of area-bearing items for one viewer and search term.
///
/// Supervisors only ever see the areas assigned to them; the search term then
/// matches `nombre` or `descripcion` case-insensitively. A blank term matches
/// everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityFilter {
    role: Role,
    current_user_id: UserId,
    needle: Option<String>,
}

impl VisibilityFilter {
    /// Build a filter; `search` is trimmed and lower-cased once here.
    pub fn new(role: Role, current_user_id: UserId, search: &str) -> Self {
        let trimmed = search.trim();
        Self {
            role,
            current_user_id,
            needle: (!trimmed.is_empty()).then(|| trimmed.to_lowercase()),
        }
    }

    /// Filter for `viewer`.
    pub fn for_viewer(viewer: Viewer, search: &str) -> Self {
        Self::new(viewer.role, viewer.user_id, search)
    }

    /// Whether the role alone lets the viewer see `area`.
    pub fn can_see(&self, area: &Area) -> bool {
        match self.role {
            Role::Coordinator => true,
            Role::Supervisor => area.id_usuario == Some(self.current_user_id),
        }
    }

    /// Whether `area` passes both the role check and the search term.
    pub fn matches(&self, area: &Area) -> bool {
        self.can_see(area) && self.matches_search(area)
    }

    /// Keep the items that pass, preserving input order.
    pub fn apply<'a, I, A>(&self, items: I) -> Vec<A>
    where
        I: IntoIterator<Item = &'a A>,
        A: AsRef<Area> + Clone + 'a,
    {
        items
            .into_iter()
            .filter(|item| self.matches((*item).as_ref()))
            .cloned()
            .collect()
    }

    fn matches_search(&self, area: &Area) -> bool {
        let Some(needle) = self.needle.as_deref() else {
            return true;
        };
        let in_name = area.nombre.to_lowercase().contains(needle);
        in_name
            || area
                .descripcion
                .as_deref()
                .is_some_and(|descripcion| descripcion.to_lowercase().contains(needle))
    }
}

/// Areas visible to `role`/`current_user_id` that match `search_term`.
///
/// # Examples
///
/// ```
/// use console_core::domain::{Area, AreaId, ObraId, Role, UserId, filter};
///
/// let areas = vec![Area {
///     id_area: AreaId::new(1),
///     nombre: "Torre A".to_owned(),
///     descripcion: Some("Fachada norte".to_owned()),
///     id_obra: ObraId::new(3),
///     id_usuario: None,
/// }];
///
/// let hits = filter(&areas, Role::Coordinator, UserId::new(1), "FACHADA");
/// assert_eq!(hits.len(), 1);
/// ```
pub fn filter<A>(areas: &[A], role: Role, current_user_id: UserId, search_term: &str) -> Vec<A>
where
    A: AsRef<Area> + Clone,
{
    VisibilityFilter::new(role, current_user_id, search_term).apply(areas)
}
