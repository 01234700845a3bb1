//! Port for the report collaborator's read-only collection.

use async_trait::async_trait;

use crate::domain::{ObraId, Report};

use super::ApiError;

/// Supplies the reports filed across one work site.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// `GET /reportes?obra={id}`.
    async fn list_reports(&self, id_obra: ObraId) -> Result<Vec<Report>, ApiError>;
}

/// Fixture source for sites without reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReportSource;

#[async_trait]
impl ReportSource for FixtureReportSource {
    async fn list_reports(&self, _id_obra: ObraId) -> Result<Vec<Report>, ApiError> {
        Ok(Vec::new())
    }
}
