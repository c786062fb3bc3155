use std::io::Write;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::error::Result;
use crate::logging;
use crate::output::write_report;
use crate::scenario;

#[derive(Debug, Parser)]
#[command(
    name = "glitchless-demo",
    about = "Run glitch-free propagation scenarios and print every observer notification",
    version
)]
pub struct Cli {
    /// Tracing filter directive. Falls back to RUST_LOG, then `warn`.
    #[arg(long, global = true)]
    pub log: Option<String>,

    /// Log line format written to stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// airplaneMode / wifi / cellular toggles joined with `and`.
    Network(NetworkArgs),

    /// A root summed with a map over itself.
    Sum(SumArgs),

    /// Two maps of one root joined again through flat_map.
    Diamond(DiamondArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct NetworkArgs {
    /// Initial airplane mode state.
    #[arg(long, action = ArgAction::Set, default_value_t = false)]
    pub airplane_mode: bool,

    /// Initial wifi state.
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub wifi: bool,

    /// Initial cellular state.
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub cellular: bool,

    /// Airplane mode values sent in order.
    #[arg(long, value_delimiter = ',', default_values_t = [true, false])]
    pub toggles: Vec<bool>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct SumArgs {
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub initial: i64,

    /// Root values sent in order.
    #[arg(long, value_delimiter = ',', default_values_t = [2], allow_hyphen_values = true)]
    pub sends: Vec<i64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct DiamondArgs {
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub initial: i64,

    /// Root values sent in order.
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = [1, 2, 3],
        allow_hyphen_values = true
    )]
    pub sends: Vec<i64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log.as_deref(), cli.log_format)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}

/// Runs the selected scenario and writes its report to `out`.
///
/// Logging is installed by [`run_from_env`], so this can be called any
/// number of times in one process.
pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    match cli.command {
        Commands::Network(args) => {
            let report = scenario::network(&args);
            write_report(&report, args.format, out)
        }
        Commands::Sum(args) => {
            let report = scenario::sum(&args);
            write_report(&report, args.format, out)
        }
        Commands::Diamond(args) => {
            let report = scenario::diamond(&args);
            write_report(&report, args.format, out)
        }
    }
}
