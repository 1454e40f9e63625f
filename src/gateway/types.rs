//! Tipos de dados específicos do protocolo com o serviço de relatórios.
//!
//! As entidades de domínio vivem em [`crate::model`]; aqui ficam apenas as
//! formas de resposta que não têm uso fora do gateway, e o artefato binário
//! devolvido pelo download.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::model::ReportStatus;

/// Resposta de `POST /reports/cleanup/stuck`.
///
/// O serviço usa `cleanedReports`; `cleanedCount` também é aceito.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    #[serde(alias = "cleanedCount", default)]
    pub cleaned_reports: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Resultado informativo de uma limpeza de relatórios travados.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupSummary {
    pub cleaned_count: u32,
}

impl From<CleanupResponse> for CleanupSummary {
    fn from(response: CleanupResponse) -> Self {
        Self {
            cleaned_count: response.cleaned_reports,
        }
    }
}

/// Resposta de `GET /reports/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatusSummary {
    pub report_id: String,
    pub status: ReportStatus,
    /// Percentual aproximado (0, 50 ou 100).
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub message: String,
}

/// Conteúdo binário de um relatório concluído.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    /// Nome sugerido pelo cabeçalho `Content-Disposition`, ou `report-{id}.pdf`.
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ReportArtifact {
    pub fn default_file_name(report_id: &str) -> String {
        format!("report-{report_id}.pdf")
    }
}

/// Extrai o nome do arquivo de um cabeçalho `Content-Disposition`.
pub fn file_name_from_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
