use crate::infra::parse_date;
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use marketing_survey::admin::{AdminDashboard, AdminGate, DashboardStats, ExportScope};
use marketing_survey::config::AppConfig;
use marketing_survey::error::AppError;
use marketing_survey::survey::report::seoul_time;
use marketing_survey::survey::{marketing_score, FileSurveyStore, ScoreBand, SurveyResult};
use marketing_survey::telemetry;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AdminArgs {
    /// Admin password (checked against ADMIN_PASSWORD)
    #[arg(long)]
    pub(crate) password: String,
    /// Survey directory to read instead of the configured SURVEY_DIR
    #[arg(long)]
    pub(crate) dir: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) command: AdminCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum AdminCommand {
    /// List submitted surveys, newest first, with summary statistics
    List {
        /// Only show surveys whose store, owner, type, or area contains this text
        #[arg(long)]
        query: Option<String>,
    },
    /// Print every answer of one survey
    Show { id: String },
    /// Write the survey list as a spreadsheet-ready CSV file
    Export {
        /// Output path (defaults to survey_results_<date>.csv in the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Export only surveys matching this search text
        #[arg(long)]
        query: Option<String>,
        /// Date used in the default file name (defaults to today in KST)
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Permanently delete one survey
    Delete { id: String },
    /// Re-fetch the list on the refresh period and print the statistics each time
    Watch {
        /// Number of refresh periods to observe
        #[arg(long, default_value_t = 3)]
        rounds: u32,
    },
}

pub(crate) async fn run_admin(args: AdminArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let dir = args.dir.unwrap_or_else(|| config.survey.dir.clone());
    let dashboard = AdminDashboard::with_refresh_period(
        Arc::new(FileSurveyStore::new(dir)),
        AdminGate::new(config.admin.password.clone()),
        config.admin.refresh_period,
    );
    dashboard.login(&args.password)?;

    match args.command {
        AdminCommand::List { query } => {
            if let Some(query) = query {
                dashboard.set_search(query);
            }
            let shown = dashboard.filtered();
            for result in &shown {
                println!("{}", listing_line(result));
            }
            println!(
                "\n{} shown | {}",
                shown.len(),
                render_stats(&dashboard.stats())
            );
        }
        AdminCommand::Show { id } => {
            dashboard.select(&id)?;
            if let Some(rows) = dashboard.selected_detail() {
                for (label, value) in rows {
                    println!("{label}: {value}");
                }
            }
        }
        AdminCommand::Export { out, query, today } => {
            let scope = match query {
                Some(query) => {
                    dashboard.set_search(query);
                    ExportScope::Filtered
                }
                None => ExportScope::All,
            };
            let today = today.unwrap_or_else(|| seoul_time(Utc::now()).date());
            let export = dashboard.export_csv(scope, today)?;
            let path = out.unwrap_or_else(|| PathBuf::from(&export.file_name));
            std::fs::write(&path, export.body.as_bytes())?;
            println!("{} surveys written to {}", export.row_count(), path.display());
        }
        AdminCommand::Delete { id } => {
            dashboard.delete(&id)?;
            println!("deleted {id}");
        }
        AdminCommand::Watch { rounds } => {
            println!("{}", render_stats(&dashboard.stats()));
            dashboard.enable_auto_refresh()?;
            for _ in 0..rounds {
                tokio::time::sleep(config.admin.refresh_period).await;
                let refreshed = dashboard
                    .refreshed_at()
                    .map(|at| seoul_time(at).format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("[{refreshed}] {}", render_stats(&dashboard.stats()));
            }
            dashboard.logout();
        }
    }

    Ok(())
}

pub(crate) fn listing_line(result: &SurveyResult) -> String {
    let record = &result.record;
    let score = marketing_score(record);
    format!(
        "{} | {} ({}) | {} | {}% {} | {}",
        seoul_time(result.submitted_at).format("%Y-%m-%d %H:%M"),
        record.store_name,
        record.store_type,
        record.owner_name,
        score,
        ScoreBand::from_score(score).label(),
        result.id
    )
}

pub(crate) fn render_stats(stats: &DashboardStats) -> String {
    format!(
        "{} surveys | average {}% | max {}% | min {}%",
        stats.count, stats.average, stats.max, stats.min
    )
}
