//! Recovery of a generation request from a report's `parameters` string.
//!
//! The service stores the original request as its debug rendering, e.g.
//! `ReportRequestDto{reportType='CERTIFICATION', employeeIds=[2, 5]}`.
//! This is pattern extraction over a format nobody promised to keep stable,
//! so everything that depends on it goes through [`recover_request`].

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ReportError;
use crate::model::{Report, ReportRequest, ReportType};

static EMPLOYEE_IDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"employeeIds=\[([^\]]*)\]").expect("valid regex"));

static CERTIFICATION_IDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"certificationIds=\[([^\]]*)\]").expect("valid regex"));

static REPORT_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"reportType='([^']*)'").expect("valid regex"));

/// Fields that could be read back from a parameters string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredParameters {
    pub employee_ids: Vec<String>,
    pub certification_ids: Vec<String>,
    pub report_type: Option<ReportType>,
}

fn split_ids(list: &str) -> Vec<String> {
    list.split(',')
        .map(|id| id.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|id| !id.is_empty() && *id != "null")
        .map(str::to_string)
        .collect()
}

fn capture_list(re: &Regex, raw: &str) -> Vec<String> {
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| split_ids(m.as_str()))
        .unwrap_or_default()
}

/// Extracts whatever can be read from `raw`. Never fails; an empty
/// `employee_ids` means nothing usable was found.
pub fn parse_parameters(raw: &str) -> RecoveredParameters {
    let report_type = REPORT_TYPE_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty() && *t != "null")
        .map(ReportType::from);

    RecoveredParameters {
        employee_ids: capture_list(&EMPLOYEE_IDS_RE, raw),
        certification_ids: capture_list(&CERTIFICATION_IDS_RE, raw),
        report_type,
    }
}

/// Rebuilds the request that produced `report`.
///
/// The report type comes from the parameters when present, otherwise from
/// the report itself. Fails with [`ReportError::MalformedParameters`] when
/// no employee id can be recovered.
pub fn recover_request(report: &Report) -> Result<ReportRequest, ReportError> {
    let raw = report.parameters.as_deref().unwrap_or_default();
    if raw.trim().is_empty() {
        return Err(ReportError::MalformedParameters {
            report_id: report.id.clone(),
            reason: "report has no stored parameters".into(),
        });
    }

    let recovered = parse_parameters(raw);
    if recovered.employee_ids.is_empty() {
        return Err(ReportError::MalformedParameters {
            report_id: report.id.clone(),
            reason: "no employee ids found in parameters".into(),
        });
    }

    let mut request = ReportRequest::new(
        recovered.employee_ids,
        recovered
            .report_type
            .unwrap_or_else(|| report.report_type.clone()),
    );
    if !recovered.certification_ids.is_empty() {
        request.certification_ids = Some(recovered.certification_ids);
    }
    Ok(request)
}
