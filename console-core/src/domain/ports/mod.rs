//! Domain ports for the REST collaborators.

mod macros;
pub(crate) use macros::define_port_error;

mod api_error;
mod area_api;
mod camera_source;
mod report_source;
mod user_directory;

pub use api_error::ApiError;
#[cfg(test)]
pub use area_api::MockAreaApi;
pub use area_api::{AreaApi, FixtureAreaApi};
#[cfg(test)]
pub use camera_source::MockCameraSource;
pub use camera_source::{CameraSource, FixtureCameraSource};
#[cfg(test)]
pub use report_source::MockReportSource;
pub use report_source::{FixtureReportSource, ReportSource};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{FixtureUserDirectory, UserDirectory};
