//! Interface de linha de comando do certreport baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] e flags globais
//! (--api-url, --verbose).

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::{ReportStatus, ReportType};
use crate::pagination::PAGE_SIZE_OPTIONS;

/// certreport: cliente de geração de relatórios de certificação.
#[derive(Debug, Parser)]
#[command(name = "certreport", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// URL base do serviço de relatórios (sobrepõe o arquivo de config).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Tipo de relatório aceito pela CLI, mapeado para [`ReportType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportTypeArg {
    /// Certificações dos funcionários selecionados.
    Certification,
    /// Dados demográficos dos funcionários selecionados.
    EmployeeDemographics,
}

impl From<ReportTypeArg> for ReportType {
    fn from(arg: ReportTypeArg) -> Self {
        match arg {
            ReportTypeArg::Certification => ReportType::Certification,
            ReportTypeArg::EmployeeDemographics => ReportType::EmployeeDemographics,
        }
    }
}

/// Filtro de status aceito por `reports --status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Queued,
    InProgress,
    Completed,
    Failed,
}

impl From<StatusArg> for ReportStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Queued => ReportStatus::Queued,
            StatusArg::InProgress => ReportStatus::InProgress,
            StatusArg::Completed => ReportStatus::Completed,
            StatusArg::Failed => ReportStatus::Failed,
        }
    }
}

/// Busca, filtro de categoria e paginação comuns às listagens.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Termo de busca (sem diferenciar maiúsculas).
    #[arg(long, short)]
    pub search: Option<String>,

    /// Página a exibir (começa em 1).
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Itens por página (30, 50 ou 100).
    #[arg(long, value_parser = parse_page_size)]
    pub page_size: Option<usize>,
}

// Aceita apenas os tamanhos de página oferecidos pela interface.
fn parse_page_size(raw: &str) -> Result<usize, String> {
    let size: usize = raw.parse().map_err(|e| format!("{e}"))?;
    if PAGE_SIZE_OPTIONS.contains(&size) {
        Ok(size)
    } else {
        Err(format!("must be one of {PAGE_SIZE_OPTIONS:?}"))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lista os funcionários.
    Employees {
        #[command(flatten)]
        list: ListArgs,

        /// Mostra apenas um departamento.
        #[arg(long)]
        department: Option<String>,
    },

    /// Lista os departamentos usados no filtro de funcionários.
    Departments,

    /// Lista as certificações elegíveis para os funcionários informados.
    Certifications {
        #[command(flatten)]
        list: ListArgs,

        /// Funcionário cuja elegibilidade é considerada (repetível).
        #[arg(long = "employee", short = 'e')]
        employees: Vec<String>,

        /// Mostra apenas uma categoria.
        #[arg(long)]
        category: Option<String>,
    },

    /// Lista os relatórios, mais recentes primeiro.
    Reports {
        #[command(flatten)]
        list: ListArgs,

        /// Mostra apenas relatórios com este status.
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },

    /// Solicita a geração de um relatório.
    Generate {
        /// Funcionário incluído no relatório (repetível, ao menos um).
        #[arg(long = "employee", short = 'e')]
        employees: Vec<String>,

        /// Certificação incluída no relatório (repetível).
        #[arg(long = "certification", short = 'c')]
        certifications: Vec<String>,

        /// Data inicial (AAAA-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Data final (AAAA-MM-DD).
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Atalho para os últimos N dias até hoje.
        #[arg(long, conflicts_with_all = ["start", "end"])]
        last_days: Option<u32>,

        /// Tipo de relatório; padrão vem da configuração.
        #[arg(long = "type", value_enum)]
        report_type: Option<ReportTypeArg>,

        /// Acompanha o relatório até ele terminar.
        #[arg(long, default_value_t = false)]
        watch: bool,
    },

    /// Mostra o status atual de um relatório.
    Status {
        report_id: String,
    },

    /// Acompanha um relatório até ele concluir ou falhar.
    Watch {
        report_id: String,
    },

    /// Baixa o PDF de um relatório concluído.
    Download {
        report_id: String,

        /// Caminho de destino; padrão é o nome sugerido pelo serviço.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Exclui um relatório.
    Delete {
        report_id: String,
    },

    /// Gera novamente um relatório a partir dos parâmetros originais.
    Regenerate {
        report_id: String,
    },

    /// Limpa relatórios travados em QUEUED/IN_PROGRESS.
    Cleanup,
}
