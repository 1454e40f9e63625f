//! Configuração do cliente carregada a partir de `certreport.toml`.
//!
//! A struct [`ClientConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `CERTREPORT_API_URL` tem precedência sobre o arquivo.

use serde::Deserialize;
use std::path::Path;

use crate::error::ReportError;
use crate::model::ReportType;
use crate::pagination::DEFAULT_PAGE_SIZE;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "certreport.toml";

/// Variável de ambiente que sobrepõe `api_url`.
pub const API_URL_ENV: &str = "CERTREPORT_API_URL";

/// Configuração de nível superior carregada de `certreport.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// URL base da API do serviço de relatórios.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Tempo máximo para estabelecer a conexão, em segundos.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Tempo máximo de uma requisição completa, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Itens por página nas listas paginadas.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Intervalo entre consultas de status ao acompanhar um relatório.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Número máximo de consultas antes de desistir de acompanhar.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Tipo de relatório usado quando nenhum é informado.
    #[serde(default = "default_report_type")]
    pub default_report_type: ReportType,
}

// Valor padrão para a URL da API: serviço local na porta 8080.
fn default_api_url() -> String {
    "http://localhost:8080/api".to_string()
}

// Valor padrão para o timeout de conexão: 10s.
fn default_connect_timeout_secs() -> u64 {
    10
}

// Valor padrão para o timeout de requisição: 60s.
fn default_request_timeout_secs() -> u64 {
    60
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

// Valor padrão para o intervalo de consulta: 2000ms.
fn default_poll_interval_ms() -> u64 {
    2000
}

// 150 consultas de 2s cobrem a janela de 5 minutos.
fn default_max_poll_attempts() -> u32 {
    150
}

fn default_report_type() -> ReportType {
    ReportType::Certification
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            page_size: default_page_size(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            default_report_type: default_report_type(),
        }
    }
}

impl ClientConfig {
    /// Carrega a configuração de `certreport.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self, ReportError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho explícito, aplicando a
    /// variável de ambiente por cima.
    pub fn load_from(path: &Path) -> Result<Self, ReportError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<ClientConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração para a URL.
        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.is_empty()
        {
            config.api_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ReportError> {
        if self.api_url.trim().is_empty() {
            return Err(ReportError::Config("api_url must not be empty".into()));
        }
        if self.page_size == 0 {
            return Err(ReportError::Config("page_size must be at least 1".into()));
        }
        Ok(())
    }
}
