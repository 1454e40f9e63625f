use thiserror::Error;

use crate::gateway::GatewayError;
use crate::model::ReportStatus;

#[derive(Debug, Error)]
pub enum ReportError {
    /// A local precondition failed; nothing was sent to the service.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Transport(GatewayError),

    #[error("Report not found: {0}")]
    NotFound(String),

    #[error("Could not recover the original request of report {report_id}: {reason}")]
    MalformedParameters { report_id: String, reason: String },

    #[error("A delete of report {0} is already in progress")]
    DeleteInProgress(String),

    #[error("A regeneration of report {0} is already in progress")]
    RegenerateInProgress(String),

    #[error("Report {report_id} is {status} and cannot be {action}")]
    InvalidState {
        report_id: String,
        status: ReportStatus,
        action: &'static str,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ReportError {
    /// Maps a gateway failure for an operation on `report_id`, turning a
    /// remote 404 into [`ReportError::NotFound`].
    pub fn for_report(report_id: &str, err: GatewayError) -> Self {
        if err.is_not_found() {
            ReportError::NotFound(report_id.to_string())
        } else {
            ReportError::Transport(err)
        }
    }
}

impl From<GatewayError> for ReportError {
    fn from(err: GatewayError) -> Self {
        ReportError::Transport(err)
    }
}
