use crate::demo::{run_coverage_demo, run_discount_check, CoverageDemoArgs, DiscountCheckArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use voice_twin::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Voice Twin API",
    about = "Run the Voice Twin backend or exercise its pricing and coverage logic from the command line",
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
    /// Evaluate a discount code against the seeded catalog
    Discount {
        #[command(subcommand)]
        command: DiscountCommand,
    },
    /// Render a sample-coverage matrix for a questionnaire
    Coverage {
        #[command(subcommand)]
        command: CoverageCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DiscountCommand {
    /// Validate a code and print the computed price
    Check(DiscountCheckArgs),
}

#[derive(Subcommand, Debug)]
enum CoverageCommand {
    /// Print the per-section completion report
    Report(CoverageDemoArgs),
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
        Command::Discount {
            command: DiscountCommand::Check(args),
        } => run_discount_check(args),
        Command::Coverage {
            command: CoverageCommand::Report(args),
        } => run_coverage_demo(args),
    }
}
