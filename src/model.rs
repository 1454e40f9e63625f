//! Entities exchanged with the report service.
//!
//! Field names follow the service's camelCase JSON. Employees and
//! certification definitions are read-only snapshots; reports are the
//! only entities whose state the client tracks over time.

use std::fmt;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// An employee as listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub position: String,
    /// Kept as the raw server string; only ever displayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<String>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A certification that can be used to narrow a report request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity_period_months: Option<u32>,
}

fn default_active() -> bool {
    true
}

/// Lifecycle status of a report job.
///
/// QUEUED → IN_PROGRESS → COMPLETED | FAILED. Transitions happen on the
/// server; the client only observes them through refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 4] = [
        ReportStatus::Queued,
        ReportStatus::InProgress,
        ReportStatus::Completed,
        ReportStatus::Failed,
    ];

    /// COMPLETED and FAILED never change again on the server.
    pub fn is_settled(self) -> bool {
        matches!(self, ReportStatus::Completed | ReportStatus::Failed)
    }

    /// Coarse progress percentage, matching what the service reports.
    pub fn progress(self) -> u8 {
        match self {
            ReportStatus::Queued => 0,
            ReportStatus::InProgress => 50,
            ReportStatus::Completed => 100,
            ReportStatus::Failed => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Queued => "QUEUED",
            ReportStatus::InProgress => "IN_PROGRESS",
            ReportStatus::Completed => "COMPLETED",
            ReportStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of report to render.
///
/// The service stores the type as a free string, so unknown values are
/// preserved verbatim instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReportType {
    Certification,
    EmployeeDemographics,
    Other(String),
}

impl ReportType {
    pub fn as_str(&self) -> &str {
        match self {
            ReportType::Certification => "CERTIFICATION",
            ReportType::EmployeeDemographics => "EMPLOYEE_DEMOGRAPHICS",
            ReportType::Other(raw) => raw,
        }
    }
}

impl From<String> for ReportType {
    fn from(raw: String) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "CERTIFICATION" => ReportType::Certification,
            "EMPLOYEE_DEMOGRAPHICS" => ReportType::EmployeeDemographics,
            _ => ReportType::Other(raw),
        }
    }
}

impl From<&str> for ReportType {
    fn from(raw: &str) -> Self {
        ReportType::from(raw.to_string())
    }
}

impl From<ReportType> for String {
    fn from(kind: ReportType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A report job tracked by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Server-side string rendering of the original request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    pub created_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
}

impl Report {
    /// Human readable status line, mirroring the service's status endpoint.
    pub fn status_message(&self) -> String {
        match self.status {
            ReportStatus::Queued => "Report is queued for processing".to_string(),
            ReportStatus::InProgress => "Generating report...".to_string(),
            ReportStatus::Completed => "Report generated successfully".to_string(),
            ReportStatus::Failed => format!(
                "Report generation failed: {}",
                self.error_message.as_deref().unwrap_or("Unknown error")
            ),
        }
    }
}

/// Body of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub employee_ids: Vec<String>,
    pub report_type: ReportType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl ReportRequest {
    pub fn new(employee_ids: Vec<String>, report_type: ReportType) -> Self {
        Self {
            employee_ids,
            report_type,
            certification_ids: None,
            start_date: None,
            end_date: None,
        }
    }
}

/// Optional certification date window for a report request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// `days_ago` days back from `today`, both ends inclusive. `None` when
    /// the start would fall outside the representable calendar.
    pub fn last_days(days_ago: u32, today: NaiveDate) -> Option<Self> {
        let start = today.checked_sub_days(Days::new(u64::from(days_ago)))?;
        Some(Self {
            start: Some(start),
            end: Some(today),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Both bounds set and ordered, or at most one bound set.
    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }

    /// Inclusive number of days covered when both bounds are set.
    pub fn days(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((end - start).num_days() + 1),
            _ => None,
        }
    }
}
