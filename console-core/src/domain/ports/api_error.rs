//! Error surfaced by every REST collaborator port.

use super::define_port_error;

define_port_error! {
    /// Failures reported by the API adapters.
    pub enum ApiError {
        /// The request never produced an HTTP response.
        Transport { message: String } => "api transport failure: {message}",
        /// The request or the server timed out.
        Timeout { message: String } => "api request timed out: {message}",
        /// The addressed resource does not exist.
        NotFound { message: String } => "api resource not found: {message}",
        /// The server answered with a non-success status.
        Rejected { status: u16, message: String } => "api rejected request ({status}): {message}",
        /// The response body did not match the expected shape.
        Decode { message: String } => "api payload could not be decoded: {message}",
    }
}

impl ApiError {
    /// Server or transport detail suitable for an inline form error.
    pub fn detail(&self) -> &str {
        match self {
            Self::Transport { message }
            | Self::Timeout { message }
            | Self::NotFound { message }
            | Self::Rejected { message, .. }
            | Self::Decode { message } => message.as_str(),
        }
    }
}
