//! Interface de terminal do certreport: spinners e tabelas coloridas.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`WatchProgress`] acompanha visualmente
//! um relatório enquanto ele é gerado.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::gateway::ReportStatusSummary;
use crate::lifecycle::LifecycleRules;
use crate::model::{CertificationDefinition, Employee, Report, ReportStatus};
use crate::pagination::PageView;

/// Estilo associado a cada status de relatório.
pub fn status_style(status: ReportStatus) -> Style {
    match status {
        ReportStatus::Completed => Style::new().green().bold(),
        ReportStatus::Failed => Style::new().red().bold(),
        ReportStatus::InProgress => Style::new().cyan(),
        ReportStatus::Queued => Style::new().yellow(),
    }
}

/// Indicador visual de progresso para o acompanhamento de um relatório.
///
/// Exibe um spinner enquanto o relatório está na fila ou em execução e
/// uma mensagem colorida quando ele conclui (verde) ou falha (vermelho).
pub struct WatchProgress {
    // Barra de progresso/spinner do indicatif.
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl WatchProgress {
    /// Inicia o spinner para o relatório informado.
    pub fn start(report_id: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Watching report {report_id}"));
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Atualiza a mensagem do spinner com o status mais recente.
    pub fn update(&self, report: &Report) {
        self.pb.set_message(format!(
            "{} [{}%] {}",
            status_style(report.status).apply_to(report.status),
            report.status.progress(),
            report.status_message()
        ));
    }

    /// Finaliza o spinner e exibe o resultado.
    pub fn finish(&self, report: &Report) {
        self.pb.finish_and_clear();
        match report.status {
            ReportStatus::Completed => println!(
                "  {} Report {} completed{}",
                self.green.apply_to("✓"),
                report.id,
                report
                    .page_count
                    .map(|pages| format!(" ({pages} pages)"))
                    .unwrap_or_default()
            ),
            ReportStatus::Failed => println!(
                "  {} Report {} failed: {}",
                self.red.apply_to("✗"),
                report.id,
                report.status_message()
            ),
            _ => println!(
                "  {} Stopped watching report {} while {}",
                self.yellow.apply_to("…"),
                report.id,
                report.status
            ),
        }
    }

    /// Encerra o spinner sem resultado (ex.: erro de rede).
    pub fn abandon(&self) {
        self.pb.finish_and_clear();
    }
}

fn print_pager<T>(page: &PageView<T>, current: usize) {
    let dim = Style::new().dim();
    if page.total_items == 0 {
        println!("{}", dim.apply_to("(no results)"));
        return;
    }
    println!(
        "{}",
        dim.apply_to(format!(
            "Showing {}-{} of {} (page {}/{})",
            page.start_index + 1,
            page.end_index,
            page.total_items,
            current,
            page.total_pages.max(1)
        ))
    );
}

/// Imprime uma página de funcionários.
pub fn print_employees(page: &PageView<Employee>, current: usize) {
    let header = Style::new().bold();
    println!(
        "{}",
        header.apply_to(format!(
            "{:<12} {:<28} {:<20} {:<24}",
            "ID", "NAME", "DEPARTMENT", "POSITION"
        ))
    );
    for employee in &page.items {
        println!(
            "{:<12} {:<28} {:<20} {:<24}",
            employee.id,
            employee.full_name(),
            employee.department,
            employee.position
        );
    }
    print_pager(page, current);
}

/// Imprime uma página de definições de certificação.
pub fn print_certifications(page: &PageView<CertificationDefinition>, current: usize) {
    let header = Style::new().bold();
    println!(
        "{}",
        header.apply_to(format!("{:<12} {:<36} {:<20} {:>8}", "ID", "NAME", "CATEGORY", "HOURS"))
    );
    for certification in &page.items {
        let hours = certification
            .total_duration_hours
            .map(|h| format!("{h:.1}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<12} {:<36} {:<20} {:>8}",
            certification.id, certification.name, certification.category, hours
        );
    }
    print_pager(page, current);
}

/// Ações oferecidas para um relatório, em minúsculas (`refresh,download`).
pub fn action_list(status: ReportStatus) -> String {
    LifecycleRules::available(status)
        .iter()
        .map(|action| action.to_string().to_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}

/// Imprime uma página de relatórios com o status colorido.
pub fn print_reports(page: &PageView<Report>, current: usize) {
    let header = Style::new().bold();
    println!(
        "{}",
        header.apply_to(format!(
            "{:<12} {:<32} {:<22} {:<12} {:<19} {}",
            "ID", "NAME", "TYPE", "STATUS", "CREATED", "ACTIONS"
        ))
    );
    for report in &page.items {
        let status = format!("{:<12}", report.status.as_str());
        println!(
            "{:<12} {:<32} {:<22} {} {:<19} {}",
            report.id,
            report.name,
            report.report_type.as_str(),
            status_style(report.status).apply_to(status),
            report.created_at.format("%Y-%m-%d %H:%M:%S"),
            action_list(report.status)
        );
    }
    print_pager(page, current);
}

/// Imprime um resumo de status de relatório.
pub fn print_status(summary: &ReportStatusSummary) {
    println!(
        "{} {} [{}%] {}",
        summary.report_id,
        status_style(summary.status).apply_to(summary.status),
        summary.progress,
        summary.message
    );
    if let Some(completed_at) = summary.completed_at {
        println!("  completed at {}", completed_at.format("%Y-%m-%d %H:%M:%S"));
    }
}

/// Mensagem de sucesso em verde.
pub fn success(message: impl std::fmt::Display) {
    println!("  {} {message}", Style::new().green().bold().apply_to("✓"));
}

/// Mensagem de erro em vermelho na saída de erro.
pub fn failure(message: impl std::fmt::Display) {
    eprintln!("  {} {message}", Style::new().red().bold().apply_to("✗"));
}
