//! Master-detail navigation state machine.
//!
//! ```text
//! List --select(id)--> Detail(id) --back--> List
//! List|Detail --request_create--> CreateModal --submit|cancel--> previous
//! List|Detail --request_edit(id)--> EditModal(id) --submit|cancel--> previous
//! List|Detail --request_delete(id)--> DeleteConfirm(id) --deleted--> List
//!                                                      --cancel--> previous
//! ```
//!
//! Any other request is rejected and leaves the state unchanged. When the
//! store no longer holds the referenced area, [`Navigator::reconcile`] falls
//! back to `List`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::{AreaId, NotFoundError};

/// Screen the console is showing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "mode", content = "id_area", rename_all = "snake_case")]
pub enum Mode {
    /// Area list.
    #[default]
    List,
    /// Single-area view.
    Detail(AreaId),
    /// Create form.
    CreateModal,
    /// Edit form for one area.
    EditModal(AreaId),
    /// Delete confirmation for one area.
    DeleteConfirm(AreaId),
}

impl Mode {
    /// Area the mode refers to, if any.
    pub const fn area_id(self) -> Option<AreaId> {
        match self {
            Self::Detail(id) | Self::EditModal(id) | Self::DeleteConfirm(id) => Some(id),
            Self::List | Self::CreateModal => None,
        }
    }

    /// Whether the mode is one of the modals.
    pub const fn is_modal(self) -> bool {
        matches!(
            self,
            Self::CreateModal | Self::EditModal(_) | Self::DeleteConfirm(_)
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("list"),
            Self::Detail(id) => write!(f, "detail({id})"),
            Self::CreateModal => f.write_str("create modal"),
            Self::EditModal(id) => write!(f, "edit modal({id})"),
            Self::DeleteConfirm(id) => write!(f, "delete confirmation({id})"),
        }
    }
}

/// Rejected navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// The request is not allowed from the current mode.
    #[error("cannot {action} from {from}")]
    InvalidTransition {
        /// Mode at the time of the request.
        from: Mode,
        /// Requested action.
        action: &'static str,
    },
}

/// Navigation state: the current mode plus the mode a modal returns to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Navigator {
    mode: Mode,
    return_to: Option<Mode>,
}

impl Navigator {
    /// Navigator showing the list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Mode a modal returns to on submit or cancel.
    pub const fn return_to(&self) -> Option<Mode> {
        self.return_to
    }

    /// Area currently selected, including the one behind an open modal.
    pub fn selected_area_id(&self) -> Option<AreaId> {
        self.mode
            .area_id()
            .or_else(|| self.return_to.and_then(Mode::area_id))
    }

    /// `List → Detail(id)`.
    ///
    /// # Errors
    ///
    /// [`NavigationError::InvalidTransition`] outside the list.
    pub fn select(&mut self, id_area: AreaId) -> Result<Mode, NavigationError> {
        match self.mode {
            Mode::List => Ok(self.enter(Mode::Detail(id_area))),
            from => Err(invalid(from, "select an area")),
        }
    }

    /// `Detail → List`.
    ///
    /// # Errors
    ///
    /// [`NavigationError::InvalidTransition`] outside a detail view.
    pub fn back(&mut self) -> Result<Mode, NavigationError> {
        match self.mode {
            Mode::Detail(_) => Ok(self.enter(Mode::List)),
            from => Err(invalid(from, "go back")),
        }
    }

    /// Open the create form.
    ///
    /// # Errors
    ///
    /// [`NavigationError::InvalidTransition`] when a modal is already open.
    pub fn request_create(&mut self) -> Result<Mode, NavigationError> {
        self.open_modal(Mode::CreateModal, "open the create form")
    }

    /// Open the edit form for `id_area`.
    ///
    /// # Errors
    ///
    /// [`NavigationError::InvalidTransition`] when a modal is already open.
    pub fn request_edit(&mut self, id_area: AreaId) -> Result<Mode, NavigationError> {
        self.open_modal(Mode::EditModal(id_area), "open the edit form")
    }

    /// Ask for delete confirmation of `id_area`.
    ///
    /// # Errors
    ///
    /// [`NavigationError::InvalidTransition`] when a modal is already open.
    pub fn request_delete(&mut self, id_area: AreaId) -> Result<Mode, NavigationError> {
        self.open_modal(Mode::DeleteConfirm(id_area), "confirm a delete")
    }

    /// Close the open modal without changes.
    ///
    /// # Errors
    ///
    /// [`NavigationError::InvalidTransition`] when no modal is open.
    pub fn cancel(&mut self) -> Result<Mode, NavigationError> {
        if !self.mode.is_modal() {
            return Err(invalid(self.mode, "cancel"));
        }
        Ok(self.close_modal())
    }

    /// A create or edit submission succeeded.
    ///
    /// # Errors
    ///
    /// [`NavigationError::InvalidTransition`] unless a create or edit form is
    /// open.
    pub fn submit_succeeded(&mut self) -> Result<Mode, NavigationError> {
        match self.mode {
            Mode::CreateModal | Mode::EditModal(_) => Ok(self.close_modal()),
            from => Err(invalid(from, "submit a form")),
        }
    }

    /// A confirmed delete succeeded; always lands on the list.
    ///
    /// # Errors
    ///
    /// [`NavigationError::InvalidTransition`] unless a delete confirmation is
    /// open.
    pub fn delete_succeeded(&mut self) -> Result<Mode, NavigationError> {
        match self.mode {
            Mode::DeleteConfirm(_) => {
                self.return_to = None;
                Ok(self.enter(Mode::List))
            }
            from => Err(invalid(from, "finish a delete")),
        }
    }

    /// Drop every reference to `id_area`. Returns whether the mode changed.
    pub fn evict(&mut self, id_area: AreaId) -> bool {
        if self.return_to.and_then(Mode::area_id) == Some(id_area) {
            self.return_to = Some(Mode::List);
        }
        if self.mode.area_id() == Some(id_area) {
            self.return_to = None;
            self.enter(Mode::List);
            return true;
        }
        false
    }

    /// Fall back to `List` when the referenced area is no longer present.
    ///
    /// `present` answers whether an area is still in the store (and visible
    /// to the viewer). A remembered return mode pointing at a missing area is
    /// reset to `List` as well.
    pub fn reconcile<F>(&mut self, present: F) -> Option<NotFoundError>
    where
        F: Fn(AreaId) -> bool,
    {
        let mut missing = None;
        if let Some(id_area) = self.return_to.and_then(Mode::area_id)
            && !present(id_area)
        {
            self.return_to = Some(Mode::List);
            missing = Some(NotFoundError { id_area });
        }
        if let Some(id_area) = self.mode.area_id()
            && !present(id_area)
        {
            self.return_to = None;
            self.enter(Mode::List);
            missing = Some(NotFoundError { id_area });
        }
        if let Some(err) = &missing {
            debug!(id_area = %err.id_area, "navigation target disappeared; back to list");
        }
        missing
    }

    /// Return to the list and forget any remembered mode.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn enter(&mut self, mode: Mode) -> Mode {
        self.mode = mode;
        mode
    }

    fn open_modal(&mut self, modal: Mode, action: &'static str) -> Result<Mode, NavigationError> {
        match self.mode {
            from @ (Mode::List | Mode::Detail(_)) => {
                self.return_to = Some(from);
                Ok(self.enter(modal))
            }
            from => Err(invalid(from, action)),
        }
    }

    fn close_modal(&mut self) -> Mode {
        let previous = self.return_to.take().unwrap_or_default();
        self.enter(previous)
    }
}

const fn invalid(from: Mode, action: &'static str) -> NavigationError {
    NavigationError::InvalidTransition { from, action }
}

/// Navigator shared between the console and the mutation coordinator.
#[derive(Debug, Default, Clone)]
pub struct NavigationHandle(Arc<Mutex<Navigator>>);

impl NavigationHandle {
    /// Handle around a fresh [`Navigator`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to the navigator.
    pub fn with<R>(&self, f: impl FnOnce(&mut Navigator) -> R) -> R {
        f(&mut self.lock())
    }

    /// Copy of the current state.
    pub fn current(&self) -> Navigator {
        self.lock().clone()
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.lock().mode()
    }

    /// See [`Navigator::evict`].
    pub fn evict(&self, id_area: AreaId) -> bool {
        self.lock().evict(id_area)
    }

    fn lock(&self) -> MutexGuard<'_, Navigator> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
