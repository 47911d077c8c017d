use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use weidash::cli::compare::CompareArgs;
use weidash::cli::performance::PerformanceArgs;
use weidash::core::log::init_logging;
use weidash::core::{Horizon, Region, ReturnColumn, TargetCurrency};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display multi-horizon returns for every tracked index
    Performance {
        /// Display currency: LOCAL or a three-letter code (USD, EUR, ...)
        #[arg(long)]
        currency: Option<TargetCurrency>,
        /// Start of the custom return window (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// End of the custom return window (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Only show indices of this region
        #[arg(long)]
        region: Option<Region>,
        /// Sort by a return column: 1D, 1W, MTD, YTD, 1Y, 3Y, 5Y or Custom
        #[arg(long)]
        sort_by: Option<ReturnColumn>,
        /// Sort ascending instead of descending
        #[arg(long)]
        ascending: bool,
        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare indices rebased to 100 at the start of a horizon
    Compare {
        /// Index names; defaults to S&P 500, Euro Stoxx 50 and DAX (Germany)
        indices: Vec<String>,
        /// Display currency: LOCAL or a three-letter code (USD, EUR, ...)
        #[arg(long)]
        currency: Option<TargetCurrency>,
        /// Comparison horizon
        #[arg(long, default_value = "1Y")]
        horizon: Horizon,
        /// Print the rebased series as JSON
        #[arg(long)]
        json: bool,
    },
}

impl From<Commands> for weidash::AppCommand {
    fn from(cmd: Commands) -> weidash::AppCommand {
        match cmd {
            Commands::Performance {
                currency,
                start,
                end,
                region,
                sort_by,
                ascending,
                json,
            } => weidash::AppCommand::Performance(PerformanceArgs {
                currency,
                start,
                end,
                region,
                sort_by,
                ascending,
                json,
            }),
            Commands::Compare {
                indices,
                currency,
                horizon,
                json,
            } => weidash::AppCommand::Compare(CompareArgs {
                indices,
                currency,
                horizon,
                json,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => weidash::cli::setup::setup(),
        Some(cmd) => weidash::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
