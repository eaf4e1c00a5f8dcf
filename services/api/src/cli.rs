use crate::demo::{
    run_demo, run_scenario_export, run_scenario_run, DemoArgs, ScenarioExportArgs, ScenarioRunArgs,
};
use crate::server;
use care_pathways::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Care Pathways Scenario Engine",
    about = "Run and export abortion care pathway scenarios from the command line",
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
    /// Run or export scenarios without the HTTP service
    Scenario {
        #[command(subcommand)]
        command: ScenarioCommand,
    },
    /// Run a CLI demo over the illustrative scenario
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ScenarioCommand {
    /// Calculate one scenario and print its results
    Run(ScenarioRunArgs),
    /// Render the verification R script for one scenario
    Export(ScenarioExportArgs),
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
        Command::Scenario {
            command: ScenarioCommand::Run(args),
        } => run_scenario_run(args),
        Command::Scenario {
            command: ScenarioCommand::Export(args),
        } => run_scenario_export(args),
        Command::Demo(args) => run_demo(args),
    }
}
