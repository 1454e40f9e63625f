use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use certreport::cli::{Cli, Command, ListArgs};
use certreport::filter::FilterQuery;
use certreport::gateway::HttpGateway;
use certreport::model::{DateRange, ReportRequest};
use certreport::{ClientConfig, ReportOrchestrator, View, ui};

type Orchestrator = ReportOrchestrator<HttpGateway>;

fn init_tracing(verbose: bool) {
    let default = if verbose { "certreport=debug" } else { "certreport=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn apply_list_args(orch: &Orchestrator, view: View, list: &ListArgs, category: Option<String>) {
    if let Some(page_size) = list.page_size {
        orch.set_page_size(view, page_size);
    }
    let mut query = FilterQuery::search(list.search.clone().unwrap_or_default());
    query.category = category;
    orch.set_filter(view, query);
    orch.set_page(view, list.page);
}

async fn watch(orch: &Orchestrator, report_id: &str) -> Result<()> {
    let progress = ui::WatchProgress::start(report_id);
    match orch.watch_report(report_id, |report| progress.update(report)).await {
        Ok(report) => {
            progress.finish(&report);
            Ok(())
        }
        Err(err) => {
            progress.abandon();
            Err(err.into())
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::load().context("failed to load configuration")?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    debug!(api_url = %config.api_url, "using report service");
    let gateway = HttpGateway::from_config(&config).context("failed to build HTTP client")?;
    let orch = ReportOrchestrator::new(gateway, config);

    match cli.command {
        Command::Employees { list, department } => {
            orch.load_employees().await?;
            apply_list_args(&orch, View::Employees, &list, department);
            ui::print_employees(&orch.employee_page(), orch.page(View::Employees));
        }
        Command::Departments => {
            orch.load_departments().await?;
            for department in orch.departments() {
                println!("{department}");
            }
        }
        Command::Certifications {
            list,
            employees,
            category,
        } => {
            for employee_id in &employees {
                orch.select_employee(employee_id).await?;
            }
            if employees.is_empty() {
                orch.refresh_available_certifications().await?;
            }
            apply_list_args(&orch, View::Certifications, &list, category);
            ui::print_certifications(&orch.certification_page(), orch.page(View::Certifications));
        }
        Command::Reports { list, status } => {
            orch.load_reports().await?;
            let category = status.map(|s| certreport::ReportStatus::from(s).as_str().to_string());
            apply_list_args(&orch, View::Reports, &list, category);
            ui::print_reports(&orch.report_page(), orch.page(View::Reports));
        }
        Command::Generate {
            employees,
            certifications,
            start,
            end,
            last_days,
            report_type,
            watch: follow,
        } => {
            let mut request = ReportRequest::new(
                employees,
                report_type
                    .map(Into::into)
                    .unwrap_or_else(|| orch.config().default_report_type.clone()),
            );
            if !certifications.is_empty() {
                request.certification_ids = Some(certifications);
            }
            let range = match last_days {
                Some(days) => DateRange::last_days(days, chrono::Local::now().date_naive())
                    .with_context(|| format!("--last-days {days} reaches before the calendar start"))?,
                None => DateRange { start, end },
            };
            request.start_date = range.start;
            request.end_date = range.end;

            let report = orch.generate_report(request).await?;
            ui::success(format!("Report {} submitted ({})", report.id, report.status));
            if follow {
                watch(&orch, &report.id).await?;
            }
        }
        Command::Status { report_id } => {
            let summary = orch.status_summary(&report_id).await?;
            ui::print_status(&summary);
        }
        Command::Watch { report_id } => {
            watch(&orch, &report_id).await?;
        }
        Command::Download { report_id, output } => {
            let artifact = orch.download(&report_id).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(&artifact.file_name));
            tokio::fs::write(&path, &artifact.bytes)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            ui::success(format!(
                "Saved {} ({} bytes)",
                path.display(),
                artifact.bytes.len()
            ));
        }
        Command::Delete { report_id } => {
            orch.load_reports().await?;
            orch.delete_report(&report_id).await?;
            ui::success(format!("Report {report_id} deleted"));
        }
        Command::Regenerate { report_id } => {
            orch.load_reports().await?;
            let report = orch.regenerate_report(&report_id).await?;
            ui::success(format!(
                "Report {report_id} regenerated as {} ({})",
                report.id, report.status
            ));
        }
        Command::Cleanup => {
            let summary = orch.cleanup_stuck_reports().await?;
            ui::success(format!("Cleaned up {} stuck report(s)", summary.cleaned_count));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        ui::failure(format!("{err:#}"));
        std::process::exit(1);
    }
}
