use std::fmt;

use crate::error::ReportError;
use crate::model::{Report, ReportStatus};

/// Client-initiated operations on an existing report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    Refresh,
    Download,
    Delete,
    Regenerate,
}

impl ReportAction {
    /// Past participle used in error messages ("cannot be deleted").
    pub fn verb(self) -> &'static str {
        match self {
            ReportAction::Refresh => "refreshed",
            ReportAction::Download => "downloaded",
            ReportAction::Delete => "deleted",
            ReportAction::Regenerate => "regenerated",
        }
    }
}

impl fmt::Display for ReportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportAction::Refresh => write!(f, "REFRESH"),
            ReportAction::Download => write!(f, "DOWNLOAD"),
            ReportAction::Delete => write!(f, "DELETE"),
            ReportAction::Regenerate => write!(f, "REGENERATE"),
        }
    }
}

/// Which actions each report status admits.
///
/// An IN_PROGRESS report may still be writing its artifact on the server,
/// so it can only be refreshed (or downloaded, which the server gates
/// itself). Every other status admits every action.
pub struct LifecycleRules;

impl LifecycleRules {
    pub fn permits(status: ReportStatus, action: ReportAction) -> bool {
        match action {
            ReportAction::Refresh | ReportAction::Download => true,
            ReportAction::Delete | ReportAction::Regenerate => status != ReportStatus::InProgress,
        }
    }

    pub fn check(report: &Report, action: ReportAction) -> Result<(), ReportError> {
        if Self::permits(report.status, action) {
            Ok(())
        } else {
            Err(ReportError::InvalidState {
                report_id: report.id.clone(),
                status: report.status,
                action: action.verb(),
            })
        }
    }

    /// Actions offered for a report in `status`, in display order.
    pub fn available(status: ReportStatus) -> Vec<ReportAction> {
        [
            ReportAction::Refresh,
            ReportAction::Download,
            ReportAction::Delete,
            ReportAction::Regenerate,
        ]
        .into_iter()
        .filter(|action| match action {
            // Downloading only makes sense once the artifact exists.
            ReportAction::Download => status == ReportStatus::Completed,
            other => Self::permits(status, *other),
        })
        .collect()
    }
}
