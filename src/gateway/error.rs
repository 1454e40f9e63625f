//! Tipos de erro para o gateway HTTP do serviço de relatórios.
//!
//! Define [`GatewayError`] com variantes para respostas de erro da API,
//! falhas de rede e respostas que não puderam ser decodificadas. Usa
//! `thiserror` para derivar `Display` e `Error`.

use reqwest::StatusCode;
use thiserror::Error;

/// Erros que podem ocorrer ao falar com o serviço de relatórios.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// O serviço respondeu com status diferente de 2xx.
    /// `message` traz o texto do corpo da resposta quando existir.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// O corpo da resposta não corresponde ao formato esperado.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A URL base configurada não é utilizável.
    #[error("invalid service URL: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// Código HTTP associado ao erro, quando houver.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Api { status, .. } => Some(*status),
            GatewayError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    /// Monta um [`GatewayError::Api`] a partir do status e do corpo bruto.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        GatewayError::Api {
            status: status.as_u16(),
            message: error_message(status, body),
        }
    }
}

// Prefere o campo `error`/`message` de um corpo JSON, depois o texto bruto,
// e por fim uma mensagem genérica derivada do status.
fn error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str::<serde_json::Value>(body)
    {
        for key in ["error", "message"] {
            if let Some(serde_json::Value::String(text)) = fields.get(key)
                && !text.trim().is_empty()
            {
                return text.trim().to_string();
            }
        }
    }
    if !body.is_empty() {
        return body.to_string();
    }
    match status.canonical_reason() {
        Some(reason) => format!("request failed: {} {reason}", status.as_u16()),
        None => format!("request failed with status {}", status.as_u16()),
    }
}
