// mergeguard - validated two-table merges driven by TOML job files

mod exit_codes;
mod report;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "mergeguard")]
#[command(about = "Validated merges: declared cardinality, provenance sets, row-count invariants")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a merge job
    #[command(after_help = "\
Examples:
  mergeguard run orders.merge.toml
  mergeguard run orders.merge.toml --json
  mergeguard run orders.merge.toml --output stats.json --quiet

Exit codes:
  0 ok, 1 join failure, 2 usage, 3 invalid job, 4 I/O,
  5 pre-condition failed, 6 provenance check failed, 7 row-count invariant violated")]
    Run {
        /// Path to the merge job TOML file
        job: PathBuf,

        /// Print JSON stats to stdout
        #[arg(long)]
        json: bool,

        /// Write JSON stats to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Suppress the report on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Validate a merge job without reading its tables
    #[command(after_help = "\
Examples:
  mergeguard validate orders.merge.toml")]
    Validate {
        /// Path to the merge job TOML file
        job: PathBuf,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also land here and succeed
            let _ = e.print();
            return ExitCode::from(if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS });
        }
    };

    let result = match cli.command {
        Commands::Run { job, json, output, quiet } => run::cmd_run(job, json, output, quiet),
        Commands::Validate { job } => run::cmd_validate(job),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
