//! Error taxonomy of the cache layer.
//!
//! Read failures ([`FetchError`]) are recoverable and local to the affected
//! view: stores keep their last good snapshot. Write failures
//! ([`MutationError`]) are always returned to the caller that issued them.
//! A missing navigation target ([`NotFoundError`]) is resolved by returning
//! to the list and is never shown to the user.

use thiserror::Error;

use super::AreaId;
use super::ports::{ApiError, define_port_error};

define_port_error! {
    /// Failure to (re)load a cached collection.
    pub enum FetchError {
        /// The request never produced an HTTP response.
        Transport { message: String } => "collection fetch failed: {message}",
        /// The request or the server timed out.
        Timeout { message: String } => "collection fetch timed out: {message}",
        /// The server refused the read.
        Rejected { status: u16, message: String } =>
            "collection fetch rejected ({status}): {message}",
        /// The payload did not decode.
        Decode { message: String } => "collection payload could not be decoded: {message}",
        /// The scope was released while the request was in flight.
        Abandoned { scope: String } => "fetch for scope {scope} abandoned after a scope change",
    }
}

impl FetchError {
    /// Whether the error belongs in a banner. Abandoned results are ignored.
    pub const fn is_reportable(&self) -> bool {
        !matches!(self, Self::Abandoned { .. })
    }
}

impl From<ApiError> for FetchError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Transport { message } => Self::Transport { message },
            ApiError::Timeout { message } => Self::Timeout { message },
            ApiError::NotFound { message } => Self::Rejected {
                status: 404,
                message,
            },
            ApiError::Rejected { status, message } => Self::Rejected { status, message },
            ApiError::Decode { message } => Self::Decode { message },
        }
    }
}

define_port_error! {
    /// Failure of a create, update, delete, or supervisor assignment.
    pub enum MutationError {
        /// Input failed local validation; nothing was sent.
        Invalid { message: String } => "area input rejected: {message}",
        /// The target area is not in the cached collection.
        NotFound { id_area: AreaId } => "area {id_area} is not in the current collection",
        /// Another mutation for the same target has not finished.
        InFlight { target: String } => "a change to {target} is still in progress",
        /// The viewer's role does not allow changes.
        Forbidden { message: String } => "change not permitted: {message}",
        /// The server refused the change.
        Rejected { status: u16, message: String } => "change rejected ({status}): {message}",
        /// The request never produced an HTTP response.
        Transport { message: String } => "change could not be sent: {message}",
        /// The request or the server timed out.
        Timeout { message: String } => "change timed out: {message}",
        /// The server's answer did not decode.
        Decode { message: String } => "change response could not be decoded: {message}",
    }
}

impl From<ApiError> for MutationError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Transport { message } => Self::Transport { message },
            ApiError::Timeout { message } => Self::Timeout { message },
            ApiError::NotFound { message } => Self::Rejected {
                status: 404,
                message,
            },
            ApiError::Rejected { status, message } => Self::Rejected { status, message },
            ApiError::Decode { message } => Self::Decode { message },
        }
    }
}

/// Navigation referenced an area that is no longer in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("area {id_area} is no longer available")]
pub struct NotFoundError {
    /// The evicted area.
    pub id_area: AreaId,
}
