mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analyze::AnalyzeArgs;
use commands::compare::CompareArgs;
use commands::curve::CurveArgs;
use commands::returns::{IrrArgs, NpvArgs};
use commands::viability::ViabilityArgs;

/// Advance pricing for music catalog deals
#[derive(Parser)]
#[command(
    name = "pricer",
    version,
    about = "Advance pricing for music catalog deals",
    long_about = "Prices label investments in artist catalogs with decimal precision. \
                  Projects streaming revenue from genre decay curves, recoups the \
                  advance under royalty, distribution or profit-split terms, and \
                  solves for the largest investment meeting the payback window \
                  and target IRR."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a deal: payback and IRR investments plus label metrics
    Analyze(AnalyzeArgs),
    /// Evaluate a chosen advance and marketing spend
    Viability(ViabilityArgs),
    /// Price the same catalog under every deal type
    Compare(CompareArgs),
    /// Expand annual decay anchors into a weekly curve
    Curve(CurveArgs),
    /// NPV of a cash-flow series across discount rates
    Npv(NpvArgs),
    /// IRR, MOIC and payback period of a cash-flow series
    Irr(IrrArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args),
        Commands::Viability(args) => commands::viability::run_viability(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Curve(args) => commands::curve::run_curve(args),
        Commands::Npv(args) => commands::returns::run_npv(args),
        Commands::Irr(args) => commands::returns::run_irr(args),
        Commands::Version => {
            println!("pricer {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
