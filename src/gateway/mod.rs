pub mod client;
pub mod error;
pub mod types;

use std::future::Future;

use crate::model::{CertificationDefinition, Employee, Report, ReportRequest};

pub use client::HttpGateway;
pub use error::GatewayError;
pub use types::{CleanupSummary, ReportArtifact, ReportStatusSummary};

/// Operations the client needs from the remote report service.
///
/// [`HttpGateway`] talks to the real service; tests plug in in-memory
/// implementations.
pub trait ReportGateway: Send + Sync {
    fn list_employees(&self) -> impl Future<Output = Result<Vec<Employee>, GatewayError>> + Send;

    fn list_departments(&self) -> impl Future<Output = Result<Vec<String>, GatewayError>> + Send;

    fn list_reports(&self) -> impl Future<Output = Result<Vec<Report>, GatewayError>> + Send;

    fn generate_report(
        &self,
        request: &ReportRequest,
    ) -> impl Future<Output = Result<Report, GatewayError>> + Send;

    fn get_report(
        &self,
        report_id: &str,
    ) -> impl Future<Output = Result<Report, GatewayError>> + Send;

    fn get_report_status(
        &self,
        report_id: &str,
    ) -> impl Future<Output = Result<ReportStatusSummary, GatewayError>> + Send;

    fn download_report(
        &self,
        report_id: &str,
    ) -> impl Future<Output = Result<ReportArtifact, GatewayError>> + Send;

    fn delete_report(&self, report_id: &str)
    -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn cleanup_stuck_reports(
        &self,
    ) -> impl Future<Output = Result<CleanupSummary, GatewayError>> + Send;

    fn list_certification_definitions(
        &self,
    ) -> impl Future<Output = Result<Vec<CertificationDefinition>, GatewayError>> + Send;

    fn available_certifications_for_employees(
        &self,
        employee_ids: &[String],
    ) -> impl Future<Output = Result<Vec<CertificationDefinition>, GatewayError>> + Send;
}
