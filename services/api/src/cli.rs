use crate::admin::{run_admin, AdminArgs};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use marketing_survey::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Marketing Survey",
    about = "Run the marketing consulting survey service and its admin tools",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect, export, or delete submitted surveys
    Admin(AdminArgs),
    /// Walk a sample respondent through the survey and print the admin view
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Admin(args) => run_admin(args).await,
        Command::Demo(args) => run_demo(args),
    }
}
