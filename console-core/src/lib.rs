//! Client-side domain cache for the work-site area console.
//!
//! The crate keeps the canonical Area, Camera, Report, and user collections
//! in scope-keyed stores, joins them into per-area view models, narrows them
//! by viewer role, and drives the list/detail/modal navigation state. All
//! writes go through the mutation coordinator, which refetches the Area
//! collection after every successful change.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{ConsoleSettings, SettingsError};
