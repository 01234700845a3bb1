//! Domain entities, services, and ports of the area console.
//!
//! Purpose: keep the canonical collections, the derived per-area views, and
//! the navigation state consistent while reads and writes interleave. Every
//! collaborator is reached through a port in [`ports`]; nothing here knows
//! about HTTP.
//!
//! Public surface:
//! - [`EntityStore`] — scope-keyed cached collection with coalesced fetches.
//! - [`aggregate`] — joins areas with cameras, reports, and users.
//! - [`filter`] — role and search narrowing.
//! - [`Navigator`] — list/detail/modal state machine.
//! - [`AreaMutations`] — create, update, delete, and supervisor assignment.
//! - [`AreaConsole`] — facade that wires the pieces for one viewer.

pub mod aggregation;
pub mod area;
pub mod console;
pub mod error;
pub mod ids;
pub mod linked;
pub mod mutation;
pub mod navigation;
pub mod ports;
pub mod store;
pub mod user;
pub mod visibility;

pub use self::aggregation::{AreaView, aggregate};
pub use self::area::{Area, AreaValidationError, NewArea, SupervisorAssignment};
pub use self::console::{AreaConsole, Banner, Collection, ConsoleFrame, ConsolePorts};
pub use self::error::{FetchError, MutationError, NotFoundError};
pub use self::ids::{AreaId, ObraId, UserId};
pub use self::linked::{BelongsToArea, Camera, Report};
pub use self::mutation::{AreaMutations, MutationTarget};
pub use self::navigation::{Mode, NavigationError, NavigationHandle, Navigator};
pub use self::store::{
    AreaLoader, AreaStore, CameraLoader, CameraStore, CollectionLoader, EntityStore, ReportLoader,
    ReportStore, Snapshot, StoreStatus, Unscoped, UserLoader, UserStore,
};
pub use self::user::{Role, User, Viewer};
pub use self::visibility::{VisibilityFilter, filter};
